#[macro_use]
extern crate lazy_static;

extern crate clap;

mod app;
mod args;
mod commands;
mod logging;

use clap::ArgMatches;
use slog::{debug, info, o};
use std::process;

async fn run(arg_matches: ArgMatches) -> Result<(), String> {
    let client = commands::make_client(&arg_matches).map_err(|e| e.to_string())?;
    let (root_logger, google_shipper) = logging::create_logger(&arg_matches, &client)?;
    let log = root_logger.new(o!("module" => "main"));

    debug!(log, "Starting {}", app::NAME;
        "version" => app::VERSION,
        "googlelog-version" => app::googlelog_version(),
        "project" => client.project(),
    );

    // If diagnostics need to be sent to Google, we need a task to bridge
    // between the sync channel of the drain and the async channel of the
    // shipper, and a task that does the calls to the Google Logging API.
    let shipped = match google_shipper {
        Some(mut shipper) => {
            let bridge = shipper
                .yield_bridge()
                .ok_or_else(|| "the log shipper bridge was already taken".to_string())?;
            let bridged = tokio::task::spawn_blocking(move || {
                bridge.run_sync_to_async_bridge();
            });
            let shipping = tokio::task::spawn(async move {
                shipper.run_log_shipper().await;
            });
            info!(log, "Started Google Logger");
            Some((bridged, shipping))
        }
        None => None,
    };

    let result = commands::dispatch(&log, &client, &arg_matches)
        .await
        .map_err(|e| e.to_string());

    // The bridge ends once every handle on the drain is gone, the shipper
    // once the bridge is gone. Waiting for both flushes what was logged.
    drop(log);
    drop(root_logger);
    if let Some((bridged, shipping)) = shipped {
        let _ = bridged.await;
        let _ = shipping.await;
    }

    result
}

#[tokio::main]
async fn main() {
    let arg_matches = args::clap_app().get_matches();
    if let Err(e) = run(arg_matches).await {
        eprintln!("\nError: {}", e);
        process::exit(1);
    };
}
