use dotenvy::dotenv;
use std::env;
use std::path::PathBuf;

/// Freshness and eviction defaults match the dashboard's query tuning:
/// 5 minutes before a cached read goes stale, 10 minutes before an
/// unobserved entry is collected.
const DEFAULT_STALE_TIME_MS: u64 = 5 * 60 * 1000;
const DEFAULT_GC_TIME_MS: u64 = 10 * 60 * 1000;

#[derive(Debug, Clone)]
pub struct Config {
    /// Base URL of the salon REST backend, e.g. `http://localhost:4000/api`.
    pub api_base_url: String,
    /// WebSocket endpoint of the attendance broadcast server. When unset it
    /// is derived from `api_base_url` (strip the `/api` suffix, ws scheme).
    /// `None` means the live channel is unavailable and listeners no-op.
    pub socket_url: Option<String>,
    pub stale_time_ms: u64,
    pub gc_time_ms: u64,
    /// Automatic retries for a failed query call (transport failures only).
    pub retry: u32,
    /// Where the signed-in fast-path hint is persisted between runs.
    pub session_hint_path: PathBuf,
}

impl Config {
    pub fn from_env() -> Self {
        dotenv().ok();

        let api_base_url = env::var("API_BASE_URL").expect("API_BASE_URL must be set");
        let socket_url = env::var("SOCKET_URL")
            .ok()
            .or_else(|| derive_socket_url(&api_base_url));

        Self {
            socket_url,
            stale_time_ms: env::var("STALE_TIME_MS")
                .unwrap_or_else(|_| DEFAULT_STALE_TIME_MS.to_string())
                .parse()
                .unwrap(),
            gc_time_ms: env::var("GC_TIME_MS")
                .unwrap_or_else(|_| DEFAULT_GC_TIME_MS.to_string())
                .parse()
                .unwrap(),
            retry: env::var("RETRY")
                .unwrap_or_else(|_| "1".to_string())
                .parse()
                .unwrap(),
            session_hint_path: env::var("SESSION_HINT_PATH")
                .unwrap_or_else(|_| ".parlour-session".to_string())
                .into(),
            api_base_url,
        }
    }

    /// Config with defaults for a given backend, handy for tests and tools.
    pub fn new(api_base_url: impl Into<String>) -> Self {
        let api_base_url = api_base_url.into();
        Self {
            socket_url: derive_socket_url(&api_base_url),
            stale_time_ms: DEFAULT_STALE_TIME_MS,
            gc_time_ms: DEFAULT_GC_TIME_MS,
            retry: 1,
            session_hint_path: ".parlour-session".into(),
            api_base_url,
        }
    }
}

/// The broadcast server lives next to the REST backend, one path level up:
/// `http://host:port/api` -> `ws://host:port`.
fn derive_socket_url(api_base_url: &str) -> Option<String> {
    let trimmed = api_base_url.trim_end_matches('/').trim_end_matches("/api");
    if let Some(rest) = trimmed.strip_prefix("https://") {
        Some(format!("wss://{rest}"))
    } else if let Some(rest) = trimmed.strip_prefix("http://") {
        Some(format!("ws://{rest}"))
    } else {
        None
    }
}
