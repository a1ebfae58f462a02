use crate::args::{
    self, ACCESS_TOKEN, ANONYMOUS, API_BASE, FILE, FILTER, INSERT_ID, JSON, LABEL, LOG,
    MAX_PAGES, MESSAGE, ORDER, PAGE_SIZE, PROJECT, SEVERITY,
};

use chrono::SecondsFormat;
use clap::ArgMatches;
use googlelog::{
    Client, Credentials, Entry, EntryOptions, HttpApi, ListOptions, Payload, PendingEntry,
    Severity, ASCENDING, DESCENDING,
};
use serde_json::Value;
use slog::{debug, info, Logger};
use std::collections::BTreeMap;
use thiserror::Error;
use tokio::io::AsyncReadExt;

#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Api(#[from] googlelog::Error),
    #[error("invalid value for {arg}: {reason}")]
    InvalidArgument { arg: &'static str, reason: String },
    #[error("could not read {source_name}: {source}")]
    Io {
        source_name: String,
        source: std::io::Error,
    },
}

fn invalid(arg: &'static str, reason: impl Into<String>) -> Error {
    Error::InvalidArgument {
        arg,
        reason: reason.into(),
    }
}

/// Picks the credentials from the global options: none with `--anonymous`, a fixed token with
/// `--access-token`, otherwise tokens from the metadata server.
pub fn make_credentials(m: &ArgMatches) -> Credentials {
    if m.is_present(ANONYMOUS) {
        return Credentials::Anonymous;
    }
    match m.value_of(ACCESS_TOKEN) {
        Some(token) => Credentials::AccessToken(token.to_string()),
        None => Credentials::metadata_server(),
    }
}

pub fn make_client(m: &ArgMatches) -> Result<Client, Error> {
    let project = m
        .value_of(PROJECT)
        .ok_or_else(|| invalid("--project", "a project is required"))?;
    let api_base = m
        .value_of(API_BASE)
        .unwrap_or(googlelog::http::DEFAULT_SERVICE_ENDPOINT);
    let api = HttpApi::with_api_base(make_credentials(m), api_base)?;
    Ok(Client::new(project, api))
}

/// Runs the selected subcommand against `client`.
pub async fn dispatch(log: &Logger, client: &Client, m: &ArgMatches) -> Result<(), Error> {
    match m.subcommand() {
        Some((args::CMD_WRITE, sub)) => write(log, client, sub).await,
        Some((args::CMD_BATCH, sub)) => batch(log, client, sub).await,
        Some((args::CMD_READ, sub)) => {
            for line in read(log, client, sub).await? {
                println!("{}", line);
            }
            Ok(())
        }
        Some((args::CMD_DELETE, sub)) => delete(log, client, sub).await,
        Some((other, _)) => Err(invalid("command", format!("unknown command '{}'", other))),
        None => Err(invalid("command", "no command given")),
    }
}

fn log_name(m: &ArgMatches) -> Result<&str, Error> {
    m.value_of(LOG)
        .ok_or_else(|| invalid("LOG", "a log name is required"))
}

/// Splits a `KEY=VALUE` label. The value may contain further `=` signs.
pub fn parse_label(label: &str) -> Result<(String, String), Error> {
    match label.split_once('=') {
        Some((key, value)) if !key.is_empty() => Ok((key.to_string(), value.to_string())),
        _ => Err(invalid(
            "--label",
            format!("'{}' is not of the form KEY=VALUE", label),
        )),
    }
}

fn entry_options(m: &ArgMatches) -> Result<EntryOptions, Error> {
    let mut options = EntryOptions::new();

    if let Some(labels) = m.values_of(LABEL) {
        let labels = labels.map(parse_label).collect::<Result<Vec<_>, _>>()?;
        options = options.with_labels(labels);
    }
    if let Some(severity) = m.value_of(SEVERITY) {
        let severity = severity
            .parse::<Severity>()
            .map_err(|_| invalid("--severity", format!("unknown severity '{}'", severity)))?;
        options = options.with_severity(severity);
    }
    if let Some(insert_id) = m.value_of(INSERT_ID) {
        options = options.with_insert_id(insert_id);
    }

    Ok(options)
}

pub async fn write(log: &Logger, client: &Client, m: &ArgMatches) -> Result<(), Error> {
    let logger = client.logger(log_name(m)?);
    let message = m
        .value_of(MESSAGE)
        .ok_or_else(|| invalid("MESSAGE", "a message is required"))?;
    let options = entry_options(m)?;

    let payload = if m.is_present(JSON) {
        let value: Value = serde_json::from_str(message)
            .map_err(|e| invalid("MESSAGE", format!("not valid JSON: {}", e)))?;
        Payload::Json(value)
    } else {
        Payload::Text(message.to_string())
    };

    debug!(log, "Writing entry"; "log" => logger.full_name(), "kind" => payload.kind());
    logger.log(payload, options).await?;
    info!(log, "Wrote 1 entry"; "log" => logger.full_name());
    Ok(())
}

/// Turns an input line into an entry: JSON objects become structured entries, anything else
/// is sent as text. Blank lines yield nothing.
pub fn parse_line(line: &str) -> Option<PendingEntry> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return None;
    }
    let payload = match serde_json::from_str::<Value>(trimmed) {
        Ok(value @ Value::Object(_)) => Payload::Json(value),
        _ => Payload::Text(line.trim_end_matches(['\r', '\n']).to_string()),
    };
    Some(PendingEntry::new(payload, EntryOptions::new()))
}

async fn read_input(m: &ArgMatches) -> Result<String, Error> {
    match m.value_of(FILE) {
        Some(path) => tokio::fs::read_to_string(path)
            .await
            .map_err(|source| Error::Io {
                source_name: path.to_string(),
                source,
            }),
        None => {
            let mut input = String::new();
            tokio::io::stdin()
                .read_to_string(&mut input)
                .await
                .map_err(|source| Error::Io {
                    source_name: "standard input".to_string(),
                    source,
                })?;
            Ok(input)
        }
    }
}

pub async fn batch(log: &Logger, client: &Client, m: &ArgMatches) -> Result<(), Error> {
    let input = read_input(m).await?;
    commit_lines(log, client, log_name(m)?, &input).await
}

/// Writes the entries of `input` to `log_name` in a single request.
pub async fn commit_lines(
    log: &Logger,
    client: &Client,
    log_name: &str,
    input: &str,
) -> Result<(), Error> {
    let logger = client.logger(log_name);
    let mut batch = logger.batch();
    for entry in input.lines().filter_map(parse_line) {
        batch.push(entry);
    }

    if batch.is_empty() {
        info!(log, "Nothing to write"; "log" => logger.full_name());
        return Ok(());
    }

    let count = batch.len();
    batch.commit().await?;
    info!(log, "Wrote {} entries", count; "log" => logger.full_name());
    Ok(())
}

fn list_options(m: &ArgMatches) -> Result<ListOptions, Error> {
    let mut options = ListOptions::new();
    if let Some(filter) = m.value_of(FILTER) {
        options = options.with_filter(filter);
    }
    if let Some(order) = m.value_of(ORDER) {
        let order = match order
            .parse::<args::OrderType>()
            .map_err(|_| invalid("--order", format!("unknown order '{}'", order)))?
        {
            args::OrderType::asc => ASCENDING,
            args::OrderType::desc => DESCENDING,
        };
        options = options.with_order_by(order);
    }
    if let Some(page_size) = m.value_of(PAGE_SIZE) {
        let page_size = page_size
            .parse::<i32>()
            .ok()
            .filter(|size| *size > 0)
            .ok_or_else(|| invalid("--page-size", "expected a positive number"))?;
        options = options.with_page_size(page_size);
    }
    Ok(options)
}

fn max_pages(m: &ArgMatches) -> Result<Option<usize>, Error> {
    m.value_of(MAX_PAGES)
        .map(|pages| {
            pages
                .parse::<usize>()
                .map_err(|_| invalid("--max-pages", "expected a number"))
        })
        .transpose()
}

/// Fetches the entries of the log, one rendered line per entry.
pub async fn read(log: &Logger, client: &Client, m: &ArgMatches) -> Result<Vec<String>, Error> {
    let logger = client.logger(log_name(m)?);
    let max_pages = max_pages(m)?;
    let mut pager = logger.list_entries(list_options(m)?);

    let mut lines = Vec::new();
    let mut pages = 0;
    while max_pages.map_or(true, |max| pages < max) {
        match pager.next_page().await? {
            Some(entries) => lines.extend(entries.iter().map(render_entry)),
            None => break,
        }
        pages += 1;
    }

    debug!(log, "Listed entries";
        "log" => logger.full_name(),
        "pages" => pages,
        "entries" => lines.len(),
    );
    if let Some(token) = pager.next_page_token() {
        info!(log, "More entries available"; "next-page-token" => token);
    }
    Ok(lines)
}

/// `<timestamp> <severity> <payload>`, followed by the labels when there are any.
pub fn render_entry(entry: &Entry) -> String {
    let timestamp = entry
        .timestamp
        .map(|ts| ts.to_rfc3339_opts(SecondsFormat::AutoSi, true))
        .unwrap_or_else(|| "-".to_string());
    let severity = entry.severity.unwrap_or(Severity::Default);
    let payload = match &entry.payload {
        Some(Payload::Text(text)) => text.clone(),
        Some(Payload::Json(value)) | Some(Payload::Proto(value)) => value.to_string(),
        None => String::new(),
    };

    let mut line = format!("{} {} {}", timestamp, severity, payload);
    if !entry.labels.is_empty() {
        let labels: BTreeMap<_, _> = entry.labels.iter().collect();
        let labels = labels
            .into_iter()
            .map(|(k, v)| format!("{}={}", k, v))
            .collect::<Vec<_>>()
            .join(",");
        line.push_str(&format!(" [{}]", labels));
    }
    line
}

pub async fn delete(log: &Logger, client: &Client, m: &ArgMatches) -> Result<(), Error> {
    let logger = client.logger(log_name(m)?);
    logger.delete().await?;
    info!(log, "Deleted log"; "log" => logger.full_name());
    Ok(())
}
