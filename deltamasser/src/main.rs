use std::fs;
use std::path::Path;
use std::process::ExitCode;

use clap::Parser;
use tracing::{debug, error};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use deltamasser::{DeltaMasser, DeltaMasserError};

fn configure_log(log_file: Option<&Path>) -> Result<Option<WorkerGuard>, DeltaMasserError> {
    let (file_layer, guard) = match log_file {
        Some(path) => {
            let (writer, guard) = tracing_appender::non_blocking(fs::File::create(path)?);
            let layer = fmt::layer()
                .compact()
                .with_ansi(false)
                .with_timer(fmt::time::ChronoLocal::rfc_3339())
                .with_writer(writer)
                .with_filter(
                    EnvFilter::builder()
                        .with_default_directive(tracing::Level::DEBUG.into())
                        .from_env_lossy(),
                );
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    let subscriber = tracing_subscriber::registry()
        .with(
            fmt::layer()
                .compact()
                .with_timer(fmt::time::ChronoLocal::rfc_3339())
                .with_writer(std::io::stderr)
                .with_filter(
                    EnvFilter::builder()
                        .with_default_directive(tracing::Level::INFO.into())
                        .from_env_lossy(),
                ),
        )
        .with(file_layer);

    match tracing::subscriber::set_global_default(subscriber) {
        Ok(()) => {
            // Records from crates still using `log` go through the same subscriber
            if let Err(e) = tracing_log::LogTracer::init() {
                debug!("Not forwarding `log` records: {e}");
            }
        }
        Err(e) => debug!("Keeping the existing subscriber: {e}"),
    }
    Ok(guard)
}

fn main() -> ExitCode {
    let args = DeltaMasser::parse();
    let driver = match args.configure() {
        Ok(driver) => driver,
        Err(e) => {
            eprintln!("{e}");
            return ExitCode::FAILURE;
        }
    };
    let _guard = match configure_log(driver.log_file.as_deref()) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("Failed to open the log file: {e}");
            return ExitCode::FAILURE;
        }
    };
    match driver.main() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_configure_log_with_logger_installed() {
        // A `log` logger is already in place, so only the subscriber is installed
        tracing_log::LogTracer::init().unwrap();
        assert!(configure_log(None).unwrap().is_none());
        // and a second subscriber is refused without failing
        assert!(configure_log(None).unwrap().is_none());
    }
}
