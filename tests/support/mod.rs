//! Scripted backend for integration tests: a minimal HTTP/1.1 server
//! speaking the dashboard's envelope protocol, with per-route hit counting
//! so tests can assert how often the client actually touched the network.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use chrono::Utc;
use serde_json::{json, Value};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;

pub const ADMIN_EMAIL: &str = "ana@salon.test";
pub const EMPLOYEE_EMAIL: &str = "bo@salon.test";
pub const PASSWORD: &str = "password1";

#[derive(Default)]
struct ServerState {
    hits: HashMap<String, usize>,
    user: Option<Value>,
    today: Vec<Value>,
    tasks: Vec<Value>,
    employees: Vec<Value>,
    next_id: usize,
}

pub struct StubServer {
    pub base_url: String,
    state: Arc<Mutex<ServerState>>,
    task: JoinHandle<()>,
}

impl StubServer {
    pub async fn start() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let state = Arc::new(Mutex::new(ServerState {
            employees: vec![
                json!({"_id": "u1", "name": "Ana", "email": ADMIN_EMAIL, "role": "ADMIN"}),
                json!({"_id": "u2", "name": "Bo", "email": EMPLOYEE_EMAIL, "role": "EMPLOYEE"}),
            ],
            tasks: vec![
                json!({
                    "_id": "t1", "title": "Restock towels", "description": "front shelf",
                    "assignedTo": "u2", "status": "PENDING"
                }),
                json!({
                    "_id": "t2", "title": "Close out register", "description": "evening",
                    "assignedTo": "u2", "status": "COMPLETED"
                }),
            ],
            ..ServerState::default()
        }));

        let accept_state = Arc::clone(&state);
        let task = tokio::spawn(async move {
            loop {
                let Ok((socket, _)) = listener.accept().await else {
                    break;
                };
                let state = Arc::clone(&accept_state);
                tokio::spawn(handle(socket, state));
            }
        });

        Self {
            base_url: format!("http://{addr}/api"),
            state,
            task,
        }
    }

    /// How many times `"METHOD /api/path"` was served.
    pub fn hits(&self, route: &str) -> usize {
        self.state
            .lock()
            .unwrap()
            .hits
            .get(route)
            .copied()
            .unwrap_or(0)
    }

    pub fn present_today(&self) -> usize {
        self.state
            .lock()
            .unwrap()
            .today
            .iter()
            .filter(|log| !log["checkIn"].is_null())
            .count()
    }
}

impl Drop for StubServer {
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn handle(mut socket: TcpStream, state: Arc<Mutex<ServerState>>) {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 1024];
    let header_end = loop {
        let Ok(n) = socket.read(&mut chunk).await else {
            return;
        };
        if n == 0 {
            return;
        }
        buf.extend_from_slice(&chunk[..n]);
        if let Some(pos) = find_header_end(&buf) {
            break pos;
        }
    };

    let header_text = String::from_utf8_lossy(&buf[..header_end]).to_string();
    let mut lines = header_text.lines();
    let request_line = lines.next().unwrap_or_default().to_string();
    let mut parts = request_line.split_whitespace();
    let method = parts.next().unwrap_or_default().to_string();
    let path = parts.next().unwrap_or_default().to_string();

    let mut cookie = String::new();
    let mut content_length = 0usize;
    for line in lines {
        let Some((name, value)) = line.split_once(':') else {
            continue;
        };
        match name.to_ascii_lowercase().as_str() {
            "cookie" => cookie = value.trim().to_string(),
            "content-length" => content_length = value.trim().parse().unwrap_or(0),
            _ => {}
        }
    }

    let body_start = header_end + 4;
    while buf.len() < body_start + content_length {
        let Ok(n) = socket.read(&mut chunk).await else {
            return;
        };
        if n == 0 {
            break;
        }
        buf.extend_from_slice(&chunk[..n]);
    }
    let body: Value =
        serde_json::from_slice(&buf[body_start..body_start + content_length.min(buf.len() - body_start)])
            .unwrap_or(Value::Null);

    let (status, cookies, payload) = route(&state, &method, &path, &cookie, body);

    let body_text = payload.to_string();
    let mut response = format!(
        "HTTP/1.1 {status}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n",
        body_text.len()
    );
    for cookie in cookies {
        response.push_str(&format!("Set-Cookie: {cookie}\r\n"));
    }
    response.push_str("\r\n");
    response.push_str(&body_text);
    let _ = socket.write_all(response.as_bytes()).await;
    let _ = socket.shutdown().await;
}

fn find_header_end(buf: &[u8]) -> Option<usize> {
    buf.windows(4).position(|window| window == b"\r\n\r\n")
}

fn route(
    state: &Arc<Mutex<ServerState>>,
    method: &str,
    path: &str,
    cookie: &str,
    body: Value,
) -> (&'static str, Vec<String>, Value) {
    let mut state = state.lock().unwrap();
    *state.hits.entry(format!("{method} {path}")).or_insert(0) += 1;

    let authed = cookie.contains("token=test-token");
    let ok = |content: Value| ("200 OK", Vec::new(), json!({"success": true, "content": content}));
    let fail = |status: &'static str, message: &str| {
        (
            status,
            Vec::new(),
            json!({"success": false, "message": message}),
        )
    };

    match (method, path) {
        ("POST", "/api/auth/login") => {
            let email = body["email"].as_str().unwrap_or_default().to_string();
            let password = body["password"].as_str().unwrap_or_default();
            if password != PASSWORD {
                return fail("401 Unauthorized", "invalid credentials");
            }
            let user = state
                .employees
                .iter()
                .find(|employee| employee["email"] == email.as_str())
                .cloned();
            let Some(user) = user else {
                return fail("401 Unauthorized", "invalid credentials");
            };
            let role = user["role"].as_str().unwrap_or("EMPLOYEE").to_string();
            state.user = Some(user);
            (
                "200 OK",
                vec![
                    "token=test-token; Path=/".to_string(),
                    format!("role={role}; Path=/"),
                ],
                json!({"success": true}),
            )
        }
        ("GET", "/api/auth/check-session") => {
            match (&state.user, authed) {
                (Some(user), true) => ok(user.clone()),
                _ => fail("401 Unauthorized", "unauthorized"),
            }
        }
        ("POST", "/api/auth/logout") => {
            state.user = None;
            (
                "200 OK",
                vec![
                    "token=; Path=/; Max-Age=0".to_string(),
                    "role=; Path=/; Max-Age=0".to_string(),
                ],
                json!({"success": true}),
            )
        }
        _ if !authed => fail("401 Unauthorized", "unauthorized"),
        ("GET", "/api/tasks") => {
            let tasks = state.tasks.clone();
            ok(Value::Array(tasks))
        }
        ("GET", "/api/tasks/employee") => {
            let mine: Vec<Value> = state
                .tasks
                .iter()
                .filter(|task| task["assignedTo"] == json!("u2"))
                .cloned()
                .collect();
            ok(Value::Array(mine))
        }
        ("POST", "/api/tasks/create") => {
            state.next_id += 1;
            let mut task = body;
            task["_id"] = json!(format!("t{}", 100 + state.next_id));
            state.tasks.push(task.clone());
            ok(task)
        }
        ("GET", "/api/users") => {
            let employees = state.employees.clone();
            ok(Value::Array(employees))
        }
        ("GET", "/api/attendance") | ("GET", "/api/attendance/employees") => {
            let today = state.today.clone();
            ok(Value::Array(today))
        }
        ("GET", "/api/attendance/employee") => {
            let employee = state.user.as_ref().map(|user| user["_id"].clone());
            let mine: Vec<Value> = state
                .today
                .iter()
                .filter(|log| Some(&log["employee"]) == employee.as_ref())
                .cloned()
                .collect();
            ok(Value::Array(mine))
        }
        ("POST", "/api/attendance/check-in") => {
            let Some(user) = state.user.clone() else {
                return fail("401 Unauthorized", "unauthorized");
            };
            state.next_id += 1;
            let log = json!({
                "_id": format!("a{}", state.next_id),
                "employee": user["_id"],
                "checkIn": Utc::now().to_rfc3339(),
                "checkOut": null,
            });
            state.today.push(log.clone());
            ok(log)
        }
        ("POST", "/api/attendance/check-out") => {
            let open = state
                .today
                .iter_mut()
                .find(|log| !log["checkIn"].is_null() && log["checkOut"].is_null());
            match open {
                Some(log) => {
                    log["checkOut"] = json!(Utc::now().to_rfc3339());
                    let log = log.clone();
                    ok(log)
                }
                None => fail("400 Bad Request", "No active check-in found"),
            }
        }
        _ => fail("404 Not Found", "not found"),
    }
}
