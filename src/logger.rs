//! # Logging Infrastructure
//!
//! Structured logging for the face swapper using the `tracing` ecosystem,
//! plus a small appender for the plain-text error logs users can attach to
//! bug reports.
//!
//! ## Log Levels
//!
//! - **ERROR**: Failed swaps, provisioning failures
//! - **WARN**: Execution context fallback, multiple faces detected
//! - **INFO**: Model loading, completed swaps, session changes
//! - **DEBUG**: Detection counts, timings, tensor shapes
//!
//! ## Environment Configuration
//!
//! Set the `RUST_LOG` environment variable to control log output:
//! - `RUST_LOG=faceswapper=debug` - Show all logs from this application
//! - `RUST_LOG=warn` - Show only warnings and errors globally
//! - `RUST_LOG=faceswapper::faces=debug,warn` - Debug inference, warn others

use chrono::Local;
use once_cell::sync::Lazy;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Initialize the global logger.
///
/// Falls back to `faceswapper=debug,warn` when `RUST_LOG` is unset. The
/// subscriber is installed exactly once; later calls are no-ops, so tests
/// and `main` can both call this freely.
pub fn init_logger() -> Result<(), Box<dyn std::error::Error>> {
    static INIT: Lazy<()> = Lazy::new(|| {
        let env_filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new("faceswapper=debug,warn"));

        // try_init: another subscriber may already be installed in tests
        let _ = tracing_subscriber::registry()
            .with(env_filter)
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_level(true)
                    .with_line_number(true),
            )
            .try_init();
    });

    Lazy::force(&INIT);
    Ok(())
}

/// Append one timestamped line to a plain-text error log.
///
/// Lines look like `[2024-05-01 12:00:00] swap: No such file`. The file is
/// created on first use and never truncated.
pub fn append_error_log(path: &Path, context: &str, message: &str) -> std::io::Result<()> {
    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    writeln!(
        file,
        "[{}] {}: {}",
        Local::now().format("%Y-%m-%d %H:%M:%S"),
        context,
        message
    )
}

/// Convenience re-export of log macros
///
/// ```rust
/// use faceswapper::logger::log;
///
/// log::info!("Loaded source image: {}", "face.png");
/// log::warn!("Accelerated context unavailable, using default");
/// ```
pub mod log {
    pub use tracing::{debug, error, info, warn};
}
