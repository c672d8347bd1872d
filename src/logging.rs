use anyhow::Result;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Install the stderr logger.
///
/// `--log-level` wins over `RUST_LOG`; without either only warnings are
/// shown, so the interactive session stays readable.
pub fn init_logger(log_level: Option<&str>) -> Result<()> {
    let filter = match log_level {
        Some(level) => EnvFilter::try_new(level)?,
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .try_init()?;

    Ok(())
}
