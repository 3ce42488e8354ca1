use crate::error::InitError;
use crate::layer::EdgeLogLayer;
use crate::logger::EdgeLogger;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::Registry;

/// Configuration of the global subscriber installed by
/// [`init_tracing_with_config`].
///
/// **Fields**
/// - `min_level`: least severe `tracing` level forwarded to the logger.
/// - `enable_stdout`: if `true`, a `tracing_subscriber::fmt::Layer` is
///   added next to [`EdgeLogLayer`] so events are also printed locally.
#[derive(Clone, Debug)]
pub struct LayerConfig {
    pub min_level: tracing::Level,
    pub enable_stdout: bool,
}

impl Default for LayerConfig {
    fn default() -> Self {
        Self {
            min_level: tracing::Level::DEBUG,
            enable_stdout: false,
        }
    }
}

/// Install a global `tracing` subscriber that forwards events to `logger`.
///
/// **Returns**
/// - `Err(InitError::AlreadyInstalled)` if the process already has a
///   global subscriber; the logger itself remains usable directly.
pub fn init_tracing_with_config(logger: EdgeLogger, config: LayerConfig) -> Result<(), InitError> {
    let layer = EdgeLogLayer::with_min_level(logger, config.min_level);

    // The two subscriber shapes have different types, so install each
    // branch separately.
    if config.enable_stdout {
        let fmt_layer = tracing_subscriber::fmt::layer();
        let subscriber = Registry::default().with(layer).with(fmt_layer);
        tracing::subscriber::set_global_default(subscriber)?;
    } else {
        let subscriber = Registry::default().with(layer);
        tracing::subscriber::set_global_default(subscriber)?;
    }
    Ok(())
}

/// Equivalent to [`init_tracing_with_config`] with [`LayerConfig::default`].
pub fn init_tracing(logger: EdgeLogger) -> Result<(), InitError> {
    init_tracing_with_config(logger, LayerConfig::default())
}
