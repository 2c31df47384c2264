//! Build script for mdquery-hooks
//!
//! Compiles the C hook library used by the integration tests into a shared
//! object under OUT_DIR and exposes its path as `MDQUERY_HOOKS_FIXTURE`.

use std::env;
use std::path::PathBuf;

fn main() {
    println!("cargo:rerun-if-changed=build.rs");
    println!("cargo:rerun-if-changed=tests/fixtures/hooks_fixture.c");
    println!("cargo:rerun-if-changed=../mdquery-interposer/include/mdquery_interposer.h");

    let target_os = env::var("CARGO_CFG_TARGET_OS").unwrap_or_default();
    let target_family = env::var("CARGO_CFG_TARGET_FAMILY").unwrap_or_default();
    if target_family != "unix" {
        println!("cargo:warning=Hook library fixture is only built on unix targets");
        return;
    }

    let manifest_dir = PathBuf::from(env::var("CARGO_MANIFEST_DIR").unwrap());
    let out_dir = PathBuf::from(env::var("OUT_DIR").unwrap());
    let source = manifest_dir.join("tests").join("fixtures").join("hooks_fixture.c");
    let include = manifest_dir
        .parent()
        .unwrap()
        .join("mdquery-interposer")
        .join("include");

    let (flag, file_name) = if target_os == "macos" {
        ("-dynamiclib", "libhooks_fixture.dylib")
    } else {
        ("-shared", "libhooks_fixture.so")
    };
    let output = out_dir.join(file_name);

    // Reuse cc's compiler detection, but link a shared object instead of an archive
    let compiler = cc::Build::new()
        .cargo_metadata(false)
        .pic(true)
        .get_compiler();

    let status = compiler
        .to_command()
        .arg(flag)
        .arg("-I")
        .arg(&include)
        .arg(&source)
        .arg("-o")
        .arg(&output)
        .status();

    match status {
        Ok(status) if status.success() => {
            println!("cargo:rustc-env=MDQUERY_HOOKS_FIXTURE={}", output.display());
        }
        Ok(status) => {
            println!("cargo:warning=Hook library fixture failed to build: {}", status);
        }
        Err(e) => {
            println!("cargo:warning=Could not run C compiler for hook library fixture: {}", e);
        }
    }
}
