//! # Structured Logging
//!
//! One `tracing` subscriber for the whole peer, writing to stderr so stdout
//! stays clean for `tessera-node history` output.
//!
//! The contract crates log asset IDs, organizations and transaction IDs as
//! structured fields. Prices and private attributes are never logged, at any
//! level.

use std::io::IsTerminal;

use anyhow::{Context, Result};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Crates whose level follows `--log-level`.
const TESSERA_TARGETS: [&str; 3] = ["tessera_node", "tessera_contracts", "tessera_protocol"];

/// Request spans from `TraceLayer`, at `info` whatever `--log-level` says.
const HTTP_DIRECTIVE: &str = "tower_http=info";

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum LogFormat {
    /// Human-readable output, colored on a terminal.
    Pretty,
    /// One JSON object per event, with the enclosing span's fields.
    Json,
}

/// Everything `init_logging` needs, resolved from the CLI.
#[derive(Debug, Clone)]
pub struct LogSettings {
    pub format: LogFormat,
    /// `EnvFilter` directives used when `RUST_LOG` is unset.
    pub directives: String,
    pub ansi: bool,
}

impl LogSettings {
    /// Settings for `level` applied to the Tessera crates.
    pub fn new(format: LogFormat, level: &str) -> Self {
        Self {
            format,
            directives: directives_for(level),
            ansi: format == LogFormat::Pretty && std::io::stderr().is_terminal(),
        }
    }
}

/// `tessera_node=<level>,tessera_contracts=<level>,...,tower_http=info`
pub fn directives_for(level: &str) -> String {
    let mut parts: Vec<String> = TESSERA_TARGETS
        .iter()
        .map(|target| format!("{target}={level}"))
        .collect();
    parts.push(HTTP_DIRECTIVE.to_string());
    parts.join(",")
}

/// Parse directives strictly, so a typo in `--log-level` fails at startup.
fn parse_filter(directives: &str) -> Result<EnvFilter> {
    EnvFilter::try_new(directives).with_context(|| format!("invalid log directives: {directives}"))
}

/// Install the global subscriber. `RUST_LOG`, when set, replaces the
/// directives in `settings`.
pub fn init_logging(settings: &LogSettings) -> Result<()> {
    let (filter, source) = match std::env::var(EnvFilter::DEFAULT_ENV) {
        Ok(env) if !env.trim().is_empty() => (parse_filter(&env)?, "RUST_LOG"),
        _ => (parse_filter(&settings.directives)?, "--log-level"),
    };

    let registry = tracing_subscriber::registry().with(filter);
    let installed = match settings.format {
        LogFormat::Pretty => registry
            .with(
                fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_ansi(settings.ansi)
                    .with_target(true),
            )
            .try_init(),
        LogFormat::Json => registry
            .with(
                fmt::layer()
                    .json()
                    .with_writer(std::io::stderr)
                    .flatten_event(true)
                    .with_current_span(true)
                    .with_span_list(false),
            )
            .try_init(),
    };
    installed.context("a global tracing subscriber is already installed")?;

    tracing::debug!(format = ?settings.format, filter = source, "logging initialized");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::ValueEnum;

    #[test]
    fn level_applies_to_every_tessera_crate() {
        let directives = directives_for("debug");
        for target in TESSERA_TARGETS {
            assert!(directives.contains(&format!("{target}=debug")));
        }
        assert!(directives.ends_with(HTTP_DIRECTIVE));
        assert!(parse_filter(&directives).is_ok());
    }

    #[test]
    fn unknown_level_is_rejected() {
        assert!(parse_filter(&directives_for("loud")).is_err());
    }

    #[test]
    fn json_output_never_uses_ansi() {
        let settings = LogSettings::new(LogFormat::Json, "info");
        assert!(!settings.ansi);
        assert_eq!(settings.format, LogFormat::Json);
    }

    #[test]
    fn format_names() {
        assert_eq!(LogFormat::from_str("json", true), Ok(LogFormat::Json));
        assert_eq!(LogFormat::from_str("PRETTY", true), Ok(LogFormat::Pretty));
        assert!(LogFormat::from_str("xml", true).is_err());
    }
}
