use anyhow::{Result, anyhow};
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::Layer;
use tracing_subscriber::Registry;
use tracing_subscriber::fmt;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Level used when `RUST_LOG` is not set.
fn default_level(verbosity: u8, quiet: bool) -> LevelFilter {
    if quiet {
        return LevelFilter::ERROR;
    }
    match verbosity {
        0 => LevelFilter::WARN,
        1 => LevelFilter::INFO,
        2 => LevelFilter::DEBUG,
        _ => LevelFilter::TRACE,
    }
}

/// Install the global subscriber, logging to stderr.
///
/// `RUST_LOG` takes precedence over the `-v`/`-q` flags.
pub fn configure_logger(verbosity: u8, quiet: bool) -> Result<()> {
    let console_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_filter(
            EnvFilter::builder()
                .with_default_directive(default_level(verbosity, quiet).into())
                .from_env_lossy(),
        );

    Registry::default()
        .with(console_layer)
        .try_init()
        .map_err(|e| anyhow!("failed to install logger: {}", e))?;

    Ok(())
}
