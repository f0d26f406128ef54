use std::path::PathBuf;

/// Application-level constants
pub const APP_NAME: &str = "Docdrop";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Base URL of the extraction service.
/// Overridable via DOCDROP_ENDPOINT; the service exposes POST /process.
pub fn default_endpoint() -> String {
    std::env::var("DOCDROP_ENDPOINT").unwrap_or_else(|_| "http://localhost:8000".to_string())
}

/// HTTP timeout for a single submission, in seconds.
/// Extraction of a large scan can take minutes, so the default is generous.
pub fn default_timeout_secs() -> u64 {
    std::env::var("DOCDROP_TIMEOUT_SECS")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(300)
}

/// Default tracing filter — reqwest/hyper chatter stays out of the log.
pub fn default_log_filter() -> String {
    "info,reqwest=warn,hyper=warn".to_string()
}

/// Where exported extraction results land.
/// DOCDROP_DOWNLOAD_DIR wins, then the platform download dir, then home.
pub fn downloads_dir() -> PathBuf {
    if let Ok(dir) = std::env::var("DOCDROP_DOWNLOAD_DIR") {
        return PathBuf::from(dir);
    }
    dirs::download_dir()
        .unwrap_or_else(|| dirs::home_dir().expect("Cannot determine home directory"))
}
