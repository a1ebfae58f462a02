use crate::app;
use crate::args;

use args::{LOG_GOOGLE_NAME, LOG_LEVEL, VERBOSITY};
use clap::ArgMatches;
use googlelog::drain::Builder;
use googlelog::shipper::Shipper;
use googlelog::Client;
use serde_json::json;
use slog::{o, Drain, Duplicate, Level, Logger, OwnedKVList, Record};
use slog_async::Async;
use slog_term::{CompactFormat, TermDecorator};
use std::{fmt::Display, result::Result};

#[derive(Clone)]
struct FallbackToStderr<D: Drain> {
    drain: D,
}

impl<D: Drain> Drain for FallbackToStderr<D>
where
    D::Err: Display,
{
    type Ok = ();
    type Err = ();
    fn log(&self, record: &Record, logger_values: &OwnedKVList) -> Result<(), ()> {
        if let Err(err) = self.drain.log(record, logger_values) {
            eprintln!("A drain could not log to its destination: {}", err);
        }
        Ok(())
    }

    #[inline]
    fn is_enabled(&self, level: Level) -> bool {
        self.drain.is_enabled(level)
    }
}

pub(crate) fn min_log_level(arg_matches: &ArgMatches) -> Result<Level, String> {
    let min_log_level = match arg_matches.get_count(VERBOSITY) {
        0 => Level::Warning,
        1 => Level::Info,
        2 => Level::Debug,
        _ => Level::Trace,
    };

    Ok(match arg_matches.value_of(LOG_LEVEL) {
        Some(level) => match level
            .parse::<args::LogLevelType>()
            .map_err(|e| format!("invalid --{} '{}': {}", LOG_LEVEL, level, e))?
        {
            args::LogLevelType::error => Level::Error,
            args::LogLevelType::warn => Level::Warning,
            args::LogLevelType::info => Level::Info,
            args::LogLevelType::debug => Level::Debug,
            args::LogLevelType::trace => Level::Trace,
        },
        None => min_log_level,
    })
}

/// Creates the terminal logger, duplicated into Google Cloud Logging when `--log-google-name` is
/// given. The returned shipper has to be run for those entries to leave the process.
pub fn create_logger(
    arg_matches: &ArgMatches,
    client: &Client,
) -> Result<(Logger, Option<Shipper>), String> {
    let min_log_level = min_log_level(arg_matches)?;

    let decorator = TermDecorator::new().stderr().build();
    let term_drain = CompactFormat::new(decorator)
        .build()
        .filter_level(min_log_level)
        .map(|drain| FallbackToStderr { drain })
        .fuse();

    let (drain, shipper) = match arg_matches.value_of(LOG_GOOGLE_NAME) {
        Some(log_name) => {
            let (google_drain, shipper) = Builder::new(client.logger(log_name))
                .with_log_level_label("level")
                .with_default_labels(json!({
                    "application": app::NAME,
                    "version": app::VERSION,
                }))
                .map_err(|e| format!("could not initialize Google logger: {}", e))?
                .build_with_async_shipper();
            let google_drain = google_drain.map(|drain| FallbackToStderr { drain });
            let both = Duplicate::new(google_drain, term_drain).fuse();
            (
                Async::new(both.filter_level(min_log_level).fuse())
                    .build()
                    .fuse(),
                Some(shipper),
            )
        }
        None => (Async::new(term_drain).build().fuse(), None),
    };

    let root = Logger::root(drain, o!());
    Ok((root.new(o!()), shipper))
}
