use crate::app;
use clap::{Arg, ArgAction, Command};
use strum::{EnumString, VariantNames};

pub const PROJECT: &str = "project";
pub const API_BASE: &str = "api-base";
pub const ACCESS_TOKEN: &str = "access-token";
pub const ANONYMOUS: &str = "anonymous";
pub const VERBOSITY: &str = "verbose";
pub const LOG_LEVEL: &str = "log-level";
pub const LOG_GOOGLE_NAME: &str = "log-google-name";

pub const CMD_WRITE: &str = "write";
pub const CMD_BATCH: &str = "batch";
pub const CMD_READ: &str = "read";
pub const CMD_DELETE: &str = "delete";

pub const LOG: &str = "LOG";
pub const MESSAGE: &str = "MESSAGE";
pub const JSON: &str = "json";
pub const SEVERITY: &str = "severity";
pub const LABEL: &str = "label";
pub const INSERT_ID: &str = "insert-id";
pub const FILE: &str = "file";
pub const FILTER: &str = "filter";
pub const ORDER: &str = "order";
pub const PAGE_SIZE: &str = "page-size";
pub const MAX_PAGES: &str = "max-pages";

#[derive(EnumString, VariantNames, Debug, Clone, Copy, PartialEq, Eq)]
#[allow(non_camel_case_types)]
pub enum LogLevelType {
    error,
    warn,
    info,
    debug,
    trace,
}

#[derive(EnumString, VariantNames, Debug, Clone, Copy, PartialEq, Eq)]
#[allow(non_camel_case_types)]
pub enum OrderType {
    asc,
    desc,
}

fn log_arg() -> Arg<'static> {
    Arg::new(LOG)
        .help("The log id, e.g. 'my-app' for projects/<project>/logs/my-app")
        .required(true)
        .index(1)
}

pub(crate) fn clap_app() -> Command<'static> {
    Command::new(app::NAME)
        .version(app::VERSION)
        .long_version(app::long_version())
        .about("Write, batch, read and delete Google Cloud Logging entries")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(
            Arg::new(VERBOSITY)
                .short('v')
                .action(ArgAction::Count)
                .global(true)
                .help("verbosity level"),
        )
        .arg(
            Arg::new(LOG_LEVEL)
                .long(LOG_LEVEL)
                .value_name("LEVEL")
                .help("Sets the log level of the tool's own diagnostics, overriding -v")
                .possible_values(LogLevelType::VARIANTS)
                .env("CLOUDLOG_LOG_LEVEL")
                .global(true)
                .takes_value(true),
        )
        .arg(
            Arg::new(PROJECT)
                .long(PROJECT)
                .value_name("PROJECT_ID")
                .help("Sets the Google Cloud project the logs belong to")
                .env("GOOGLE_CLOUD_PROJECT")
                .global(true)
                .takes_value(true),
        )
        .arg(
            Arg::new(API_BASE)
                .long(API_BASE)
                .value_name("URL")
                .help("Sets the base URL of the Logging API, e.g. to point to an emulator")
                .default_value(googlelog::http::DEFAULT_SERVICE_ENDPOINT)
                .env("CLOUDLOG_API_BASE")
                .global(true)
                .takes_value(true),
        )
        .arg(
            Arg::new(ACCESS_TOKEN)
                .long(ACCESS_TOKEN)
                .value_name("TOKEN")
                .help("Uses a fixed bearer token instead of asking the metadata server for one")
                .env("CLOUDLOG_ACCESS_TOKEN")
                .hide_env_values(true)
                .conflicts_with(ANONYMOUS)
                .global(true)
                .takes_value(true),
        )
        .arg(
            Arg::new(ANONYMOUS)
                .long(ANONYMOUS)
                .help("Sends requests without credentials")
                .global(true),
        )
        .arg(
            Arg::new(LOG_GOOGLE_NAME)
                .long(LOG_GOOGLE_NAME)
                .value_name("LOG")
                .help("Also ships the tool's own diagnostics to this log in Google Cloud Logging")
                .env("CLOUDLOG_LOG_GOOGLE_NAME")
                .global(true)
                .takes_value(true),
        )
        .subcommand(
            Command::new(CMD_WRITE)
                .about("Writes a single entry")
                .arg(log_arg())
                .arg(
                    Arg::new(MESSAGE)
                        .help("The text of the entry, or a JSON object with --json")
                        .required(true)
                        .index(2),
                )
                .arg(
                    Arg::new(JSON)
                        .long(JSON)
                        .help("Sends MESSAGE as a structured (jsonPayload) entry"),
                )
                .arg(
                    Arg::new(SEVERITY)
                        .long(SEVERITY)
                        .value_name("SEVERITY")
                        .help("Sets the severity, e.g. INFO or ERROR")
                        .takes_value(true),
                )
                .arg(
                    Arg::new(LABEL)
                        .long(LABEL)
                        .value_name("KEY=VALUE")
                        .help("Adds a label to the entry, may be repeated")
                        .multiple_occurrences(true)
                        .takes_value(true),
                )
                .arg(
                    Arg::new(INSERT_ID)
                        .long(INSERT_ID)
                        .value_name("ID")
                        .help("Sets the insert id used for deduplication")
                        .takes_value(true),
                ),
        )
        .subcommand(
            Command::new(CMD_BATCH)
                .about("Writes one entry per line of input in a single request")
                .arg(log_arg())
                .arg(
                    Arg::new(FILE)
                        .long(FILE)
                        .value_name("PATH")
                        .help("Reads the lines from PATH instead of standard input")
                        .takes_value(true),
                ),
        )
        .subcommand(
            Command::new(CMD_READ)
                .about("Lists the entries of a log")
                .arg(log_arg())
                .arg(
                    Arg::new(FILTER)
                        .long(FILTER)
                        .value_name("FILTER")
                        .help("An advanced logs filter, combined with the log name")
                        .takes_value(true),
                )
                .arg(
                    Arg::new(ORDER)
                        .long(ORDER)
                        .value_name("ORDER")
                        .help("Sort by timestamp, ascending or descending")
                        .possible_values(OrderType::VARIANTS)
                        .takes_value(true),
                )
                .arg(
                    Arg::new(PAGE_SIZE)
                        .long(PAGE_SIZE)
                        .value_name("N")
                        .help("Sets the number of entries fetched per request")
                        .takes_value(true),
                )
                .arg(
                    Arg::new(MAX_PAGES)
                        .long(MAX_PAGES)
                        .value_name("N")
                        .help("Stops after fetching N pages")
                        .takes_value(true),
                ),
        )
        .subcommand(
            Command::new(CMD_DELETE)
                .about("Deletes a log and all its entries")
                .arg(log_arg()),
        )
}
