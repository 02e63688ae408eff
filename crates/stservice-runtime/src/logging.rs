//! Logging setup for the stservice runtime.
//!
//! Logging is driven entirely by the `[logging]` section of the
//! configuration. The controller opens one `dispatch` span per message, so
//! turning on `span_events.new` and `span_events.close` shows each message's
//! path through the tiers together with its duration.
//!
//! ```toml
//! [logging]
//! level = "info"
//! format = "compact"
//! output = "stderr"
//!
//! [logging.filters]
//! stservice_framework = "trace"
//!
//! [logging.span_events]
//! new = true
//! close = true
//! ```
//!
//! `RUST_LOG`, when set, replaces the configured base level; per-module
//! filters are always added on top.

use std::ffi::OsStr;
use std::path::Path;

use tracing::{Subscriber, warn};
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::prelude::*;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::util::TryInitError;
use tracing_subscriber::{EnvFilter, Layer, fmt};

use crate::config::{LogFormat, LogOutput, LoggingConfig, SpanEventConfig};

/// Installs the global subscriber described by `config`.
///
/// Does nothing if a global subscriber is already installed.
pub fn init_from_config(config: &LoggingConfig) {
    let _ = LoggingBuilder::from_config(config).try_init();
}

/// Translates the configured span events into `fmt` span flags.
fn fmt_span(events: &SpanEventConfig) -> FmtSpan {
    [
        (events.new, FmtSpan::NEW),
        (events.enter, FmtSpan::ENTER),
        (events.exit, FmtSpan::EXIT),
        (events.close, FmtSpan::CLOSE),
    ]
    .into_iter()
    .filter(|(enabled, _)| *enabled)
    .fold(FmtSpan::NONE, |acc, (_, flag)| acc | flag)
}

/// A subscriber assembled from a [`LoggingConfig`], ready to install.
pub struct LoggingBuilder {
    config: LoggingConfig,
}

impl LoggingBuilder {
    /// Prepares a subscriber for the given configuration.
    pub fn from_config(config: &LoggingConfig) -> Self {
        Self {
            config: config.clone(),
        }
    }

    /// Returns the filter directives this builder installs, in order.
    ///
    /// The first entry is the base level; `RUST_LOG`, when set, replaces it.
    pub fn directives(&self) -> Vec<String> {
        std::iter::once(self.config.level.as_str().to_string())
            .chain(
                self.config
                    .filters
                    .iter()
                    .map(|(module, level)| format!("{module}={}", level.as_str())),
            )
            .collect()
    }

    fn build_filter(&self) -> EnvFilter {
        let mut directives = self.directives().into_iter();
        let base = directives.next().unwrap_or_default();

        let mut filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(base));
        for directive in directives {
            if let Ok(d) = directive.parse() {
                filter = filter.add_directive(d);
            }
        }
        filter
    }

    /// Picks the writer for the configured output.
    ///
    /// Returns `false` as the second element when file output was requested
    /// without a path and stdout is used instead.
    fn make_writer(&self) -> (BoxMakeWriter, bool) {
        match (self.config.output, self.config.file_path.as_deref()) {
            (LogOutput::Stdout, _) => (BoxMakeWriter::new(std::io::stdout), true),
            (LogOutput::Stderr, _) => (BoxMakeWriter::new(std::io::stderr), true),
            (LogOutput::File, Some(path)) => {
                let appender = tracing_appender::rolling::never(
                    path.parent().unwrap_or_else(|| Path::new(".")),
                    path.file_name().unwrap_or_else(|| OsStr::new("stservice.log")),
                );
                (BoxMakeWriter::new(appender), true)
            }
            (LogOutput::File, None) => (BoxMakeWriter::new(std::io::stdout), false),
        }
    }

    fn fmt_layer<S>(&self, writer: BoxMakeWriter) -> Box<dyn Layer<S> + Send + Sync>
    where
        S: Subscriber + for<'a> LookupSpan<'a>,
    {
        let layer = fmt::layer()
            .with_writer(writer)
            .with_span_events(fmt_span(&self.config.span_events))
            .with_thread_ids(self.config.thread_ids)
            .with_file(self.config.file_location)
            .with_line_number(self.config.file_location);

        match self.config.format {
            LogFormat::Compact => layer.compact().boxed(),
            LogFormat::Full => layer.boxed(),
            LogFormat::Pretty => layer.pretty().boxed(),
            #[cfg(feature = "json-log")]
            LogFormat::Json => layer.json().boxed(),
            #[cfg(not(feature = "json-log"))]
            LogFormat::Json => layer.boxed(),
        }
    }

    /// Installs the subscriber globally.
    ///
    /// Fails if another global subscriber is already installed.
    pub fn try_init(self) -> Result<(), TryInitError> {
        let (writer, has_file) = self.make_writer();

        tracing_subscriber::registry()
            .with(self.fmt_layer(writer))
            .with(self.build_filter())
            .try_init()?;

        if !has_file {
            warn!("File output requested but no file path configured, logging to stdout");
        }
        if cfg!(not(feature = "json-log")) && self.config.format == LogFormat::Json {
            warn!("JSON log format requires the `json-log` feature, using full format");
        }
        Ok(())
    }
}
