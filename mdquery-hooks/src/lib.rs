//! MDQuery Hooks
//!
//! Application layer on top of `mdquery-interposer`. It adds:
//! - Declarative hooks from a TOML/JSON configuration file
//! - Hooks exported as C functions by a dynamic library
//! - A logging creation observer
//!
//! # Example Usage
//!
//! ```no_run
//! use mdquery_hooks::{install, load_config};
//! use mdquery_interposer::HookRegistry;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("hooks.toml")).unwrap();
//! let report = install(&config, HookRegistry::global()).unwrap();
//! println!("Installed: {:?}", report);
//! ```

pub mod config;
pub mod dylib;
pub mod install;

pub use config::{load_config, CreationConfig, HooksConfig, LibraryConfig, LogLevel};
pub use dylib::{HookLibrary, LibraryBatchingHook, LibraryCreationHook};
pub use install::{install, uninstall, CreationLogger, HookSource, InstallReport};
