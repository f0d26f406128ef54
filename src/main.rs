use std::path::Path;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use tracing_subscriber::EnvFilter;

use docdrop::config;
use docdrop::queue::{load_incoming, spawn_worker, QueueController};
use docdrop::submit::HttpSubmitClient;

fn main() -> ExitCode {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .init();

    tracing::info!("{} starting v{}", config::APP_NAME, config::APP_VERSION);

    let paths: Vec<String> = std::env::args().skip(1).collect();
    if paths.is_empty() {
        eprintln!("Usage: docdrop <file.pdf> [more.pdf ...]");
        return ExitCode::FAILURE;
    }

    let mut files = Vec::new();
    for path in &paths {
        match load_incoming(Path::new(path)) {
            Ok(file) => files.push(file),
            Err(e) => tracing::warn!(path = %path, error = %e, "Skipping unreadable file"),
        }
    }

    let client = HttpSubmitClient::from_env();
    tracing::info!(endpoint = %client.base_url(), "Using extraction service");

    let controller = Arc::new(QueueController::new(Box::new(client)));
    let worker = spawn_worker(controller.clone());

    if let Err(e) = controller.enqueue(files) {
        eprintln!("{e}");
        return ExitCode::FAILURE;
    }

    // Wait for the worker to settle the whole queue.
    loop {
        match controller.is_settled() {
            Ok(true) => break,
            Ok(false) => std::thread::sleep(Duration::from_millis(100)),
            Err(e) => {
                eprintln!("{e}");
                return ExitCode::FAILURE;
            }
        }
    }
    drop(worker);

    print_report(&controller)
}

/// Walk the queue, printing each entry's row and detail pane; export
/// finished results into the downloads dir when requested.
fn print_report(controller: &QueueController) -> ExitCode {
    let rows = match controller.file_rows() {
        Ok(rows) => rows,
        Err(e) => {
            eprintln!("{e}");
            return ExitCode::FAILURE;
        }
    };

    let export_dir = std::env::var("DOCDROP_DOWNLOAD_DIR")
        .ok()
        .map(|_| config::downloads_dir());

    for row in &rows {
        println!("{}  [{}]", row.file_name, row.status_label);

        let Ok(pane) = controller.activate(&row.id) else {
            continue;
        };
        if let Some(area) = &pane.json_area {
            println!("{}", area.text);
        }
        if !pane.timing_label.is_empty() {
            println!("{}", pane.timing_label);
        }
        if pane.download_visible {
            if let Some(dir) = &export_dir {
                match controller.download_active(dir) {
                    Ok(path) => println!("Saved {}", path.display()),
                    Err(e) => tracing::warn!(error = %e, "Export failed"),
                }
            }
        }
        println!();
    }
    ExitCode::SUCCESS
}
