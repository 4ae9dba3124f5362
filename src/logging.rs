//! Tracing subscriber setup.
//!
//! Output goes to one place, chosen with `--log`: nowhere, stdout, stderr
//! (default) or an append-mode file. The level comes from `RUST_LOG` when set,
//! otherwise from `--verbose` or the configured `log_level`.

use anyhow::{Context, Result};
use std::fs::OpenOptions;
use std::path::PathBuf;
use std::sync::Mutex;
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, fmt};

/// Where log lines are written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogTarget {
    Off,
    Stdout,
    Stderr,
    File(PathBuf),
}

impl LogTarget {
    /// Parse the `--log` argument: `0`/`off`, `1`/`stdout`, `2`/`stderr`, or a
    /// file name.
    pub fn parse(value: &str) -> Self {
        match value {
            "0" | "off" => LogTarget::Off,
            "1" | "stdout" => LogTarget::Stdout,
            "2" | "stderr" | "" => LogTarget::Stderr,
            filename => LogTarget::File(PathBuf::from(filename)),
        }
    }
}

/// Filter directive used when `RUST_LOG` is not set.
pub fn default_directive(verbose: bool, log_level: &str) -> String {
    if verbose {
        "debug".to_string()
    } else if log_level.trim().is_empty() {
        "info".to_string()
    } else {
        log_level.trim().to_lowercase()
    }
}

/// Install the global subscriber.
pub fn init(target: &LogTarget, directive: &str, pretty: bool) -> Result<()> {
    let writer = match target {
        LogTarget::Off => return Ok(()),
        LogTarget::Stdout => BoxMakeWriter::new(std::io::stdout),
        LogTarget::Stderr => BoxMakeWriter::new(std::io::stderr),
        LogTarget::File(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("opening log file {}", path.display()))?;
            BoxMakeWriter::new(Mutex::new(file))
        }
    };

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(directive))
        .with_context(|| format!("invalid log level {:?}", directive))?;

    let layer = fmt::layer()
        .with_writer(writer)
        .with_ansi(!matches!(target, LogTarget::File(_)));
    let layer = if pretty {
        layer.pretty().boxed()
    } else {
        layer.boxed()
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(layer)
        .try_init()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_targets() {
        assert_eq!(LogTarget::parse("0"), LogTarget::Off);
        assert_eq!(LogTarget::parse("off"), LogTarget::Off);
        assert_eq!(LogTarget::parse("1"), LogTarget::Stdout);
        assert_eq!(LogTarget::parse("stderr"), LogTarget::Stderr);
        assert_eq!(
            LogTarget::parse("todo.log"),
            LogTarget::File(PathBuf::from("todo.log"))
        );
    }

    #[test]
    fn verbose_overrides_configured_level() {
        assert_eq!(default_directive(true, "warn"), "debug");
        assert_eq!(default_directive(false, "WARN"), "warn");
        assert_eq!(default_directive(false, " "), "info");
    }

    #[test]
    fn off_installs_nothing() {
        assert!(init(&LogTarget::Off, "info", false).is_ok());
    }
}
