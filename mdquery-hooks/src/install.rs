//! Turning a hook configuration into registered hooks
//!
//! Every hook is built before anything is registered, so a bad symbol or a
//! missing library leaves the registry untouched. Only the slots the
//! configuration names are replaced; the others keep whatever they hold.

use crate::config::HooksConfig;
use crate::dylib::HookLibrary;
use anyhow::Result;
use mdquery_interposer::{BatchingOverride, CreationObserver, HookRegistry, QueryHandle};
use std::fmt;
use std::path::PathBuf;

/// Creation observer that logs every created query
#[derive(Debug, Clone, Copy)]
pub struct CreationLogger {
    level: log::Level,
}

impl CreationLogger {
    pub fn new(level: log::Level) -> Self {
        Self { level }
    }
}

impl CreationObserver for CreationLogger {
    fn query_created(&self, query: QueryHandle<'_>) {
        log::log!(self.level, "Query created: {:?}", query);
    }
}

/// Where an installed hook came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HookSource {
    /// Built-in creation logger
    Logger,
    /// Declarative `[batching]` patch
    Patch,
    /// Function exported by a hook library
    Library { path: PathBuf, symbol: String },
}

impl fmt::Display for HookSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HookSource::Logger => write!(f, "creation logger"),
            HookSource::Patch => write!(f, "batching patch"),
            HookSource::Library { path, symbol } => write!(f, "{} from {:?}", symbol, path),
        }
    }
}

/// What `install` registered, per slot
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InstallReport {
    pub creation: Option<HookSource>,
    pub batching: Option<HookSource>,
}

/// Build the hooks described by `config` and register them into `registry`
///
/// A library symbol takes precedence over the declarative hook for the same
/// slot. An empty batching patch installs nothing.
pub fn install(config: &HooksConfig, registry: &HookRegistry) -> Result<InstallReport> {
    config.validate()?;

    let library = config
        .library
        .as_ref()
        .map(|library| HookLibrary::open(&library.path))
        .transpose()?;
    let symbols = config.library.as_ref();

    let creation: Option<(Box<dyn CreationObserver>, HookSource)> =
        match (&library, symbols.and_then(|s| s.creation_symbol.as_deref())) {
            (Some(library), Some(symbol)) => Some((
                Box::new(library.creation_hook(symbol)?) as Box<dyn CreationObserver>,
                HookSource::Library {
                    path: library.path().to_path_buf(),
                    symbol: symbol.to_string(),
                },
            )),
            _ if config.creation.log => {
                let logger = CreationLogger::new(config.creation.level.into());
                Some((Box::new(logger) as Box<dyn CreationObserver>, HookSource::Logger))
            }
            _ => None,
        };

    let batching: Option<(Box<dyn BatchingOverride>, HookSource)> =
        match (&library, symbols.and_then(|s| s.batching_symbol.as_deref())) {
            (Some(library), Some(symbol)) => Some((
                Box::new(library.batching_hook(symbol)?) as Box<dyn BatchingOverride>,
                HookSource::Library {
                    path: library.path().to_path_buf(),
                    symbol: symbol.to_string(),
                },
            )),
            _ => match config.batching {
                Some(patch) if !patch.is_empty() => {
                    Some((Box::new(patch) as Box<dyn BatchingOverride>, HookSource::Patch))
                }
                _ => None,
            },
        };

    let mut report = InstallReport::default();

    if let Some((observer, source)) = creation {
        registry.creation().register(Some(observer));
        log::info!("Installed creation observer: {}", source);
        report.creation = Some(source);
    }

    if let Some((hook, source)) = batching {
        registry.batching().register(Some(hook));
        log::info!("Installed batching override: {}", source);
        report.batching = Some(source);
    }

    if report == InstallReport::default() {
        log::warn!("Hooks configuration installed nothing");
    }

    Ok(report)
}

/// Clear both slots of `registry`
pub fn uninstall(registry: &HookRegistry) {
    registry.clear_all();
    log::info!("Uninstalled all hooks");
}
