//! Command-line front end

pub mod context;
pub mod hooks;
pub mod manual;
pub mod rebase;
pub mod step;
pub mod style;

use anstream::eprintln;
use style::{Stylize, arrow};
use tortilla::config::LogConfig;
use tortilla::rebase::ProgressCallback;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Progress lines printed under the current command's heading
pub struct CliProgress {
    indent: &'static str,
}

impl CliProgress {
    /// Two-space indented lines
    pub const fn compact() -> Self {
        Self { indent: "  " }
    }
}

impl ProgressCallback for CliProgress {
    fn on_message(&self, message: &str) {
        eprintln!("{}{} {}", self.indent, arrow(), message.muted());
    }
}

/// Install the stderr subscriber: `RUST_LOG` wins, then `--verbose`, then
/// the configured level
pub fn init_logging(config: &LogConfig, verbose: bool) {
    let level = if verbose {
        "debug".to_string()
    } else {
        config.level.clone()
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    // Keep a subscriber installed earlier
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .try_init();
}
