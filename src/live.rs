//! Live update listener.
//!
//! A background task holds one WebSocket to the server and reacts to
//! attendance broadcasts by marking the affected cache entries stale.
//! It never applies event payloads directly: freshness always comes from
//! a refetch of the canonical endpoints, so a lost or duplicated event
//! costs at most one extra round trip.

use std::time::Duration;

use futures_util::StreamExt;
use serde_json::Value;
use tokio::task::JoinHandle;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, info, warn};

use crate::cache::{keys, QueryCache};
use crate::error::ClientError;

/// Broadcast emitted whenever any employee checks in or out.
pub const ATTENDANCE_EVENT: &str = "attendance-update";

const RECONNECT_DELAY: Duration = Duration::from_secs(5);

/// Handle to the background listener task. Dropping it (or calling
/// [`disconnect`](Self::disconnect)) tears the connection down.
pub struct AttendanceListener {
    task: JoinHandle<()>,
}

impl AttendanceListener {
    /// Spawn the listener. `cookie_header` carries the session cookies so
    /// the socket authenticates the same way REST calls do. A missing
    /// socket URL degrades to polling-by-staleness: the listener becomes a
    /// no-op and cached data still refreshes through the stale-time path.
    pub fn spawn(
        socket_url: Option<String>,
        cookie_header: Option<String>,
        cache: QueryCache,
    ) -> Self {
        let Some(url) = socket_url else {
            warn!("no socket url configured, live attendance updates disabled");
            return Self {
                task: tokio::spawn(async {}),
            };
        };
        let task = tokio::spawn(run(url, cookie_header, cache));
        Self { task }
    }

    pub fn disconnect(self) {
        self.task.abort();
        info!("attendance listener stopped");
    }
}

impl Drop for AttendanceListener {
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn run(url: String, cookie_header: Option<String>, cache: QueryCache) {
    loop {
        match connect(&url, cookie_header.as_deref()).await {
            Ok(mut stream) => {
                info!(%url, "attendance listener connected");
                while let Some(message) = stream.next().await {
                    match message {
                        Ok(Message::Text(text)) => {
                            if is_attendance_event(&text) {
                                debug!("attendance update received, marking caches stale");
                                cache.invalidate(&keys::employees_today());
                                cache.invalidate(&keys::attendance());
                            }
                        }
                        Ok(Message::Close(_)) => break,
                        Ok(_) => {}
                        Err(error) => {
                            warn!(error = %error, "attendance channel read failed");
                            break;
                        }
                    }
                }
                warn!(%url, "attendance channel closed, reconnecting");
            }
            Err(error) => {
                warn!(%url, error = %error, "attendance channel connect failed");
            }
        }
        tokio::time::sleep(RECONNECT_DELAY).await;
    }
}

type SocketStream =
    tokio_tungstenite::WebSocketStream<tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>>;

async fn connect(url: &str, cookie_header: Option<&str>) -> Result<SocketStream, ClientError> {
    let mut request = url
        .into_client_request()
        .map_err(|err| ClientError::Channel(err.to_string()))?;
    if let Some(cookies) = cookie_header {
        let value = cookies
            .parse()
            .map_err(|_| ClientError::Channel("session cookies are not a valid header".into()))?;
        request.headers_mut().insert("Cookie", value);
    }
    let (stream, _) = connect_async(request)
        .await
        .map_err(|err| ClientError::Channel(err.to_string()))?;
    Ok(stream)
}

/// The server sends either the bare event name or a JSON object carrying
/// it under `event`. Anything else is ignored.
fn is_attendance_event(text: &str) -> bool {
    if text == ATTENDANCE_EVENT {
        return true;
    }
    serde_json::from_str::<Value>(text)
        .ok()
        .and_then(|value| {
            value
                .get("event")
                .and_then(Value::as_str)
                .map(|event| event == ATTENDANCE_EVENT)
        })
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recognises_bare_and_wrapped_event_shapes() {
        assert!(is_attendance_event("attendance-update"));
        assert!(is_attendance_event(r#"{"event":"attendance-update","employeeId":"u1"}"#));
        assert!(!is_attendance_event("task-update"));
        assert!(!is_attendance_event(r#"{"event":"task-update"}"#));
        assert!(!is_attendance_event("{not json"));
    }

    #[tokio::test]
    async fn missing_socket_url_degrades_to_noop() {
        let cache = QueryCache::new(Duration::from_secs(300), Duration::from_secs(600));
        let listener = AttendanceListener::spawn(None, None, cache);
        listener.disconnect();
    }
}
