//! Minimal HTTP/1.1 file server for integration tests.
//!
//! Serves in-memory bodies by path, can answer with a fixed error status or
//! cut a body short, and counts requests per path. One request per connection.

use std::collections::HashMap;
use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

#[derive(Debug, Clone)]
enum Route {
    Body(Vec<u8>),
    Status(u16),
    /// Announces the full length, sends `sent` bytes, then closes.
    Truncated { body: Vec<u8>, sent: usize },
}

#[derive(Default)]
struct State {
    routes: Mutex<HashMap<String, Route>>,
    hits: Mutex<HashMap<String, usize>>,
}

pub struct FileServer {
    base: String,
    state: Arc<State>,
}

impl FileServer {
    /// Starts the server in a background thread. It runs until the process exits.
    pub fn start() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
        let port = listener.local_addr().unwrap().port();
        let state = Arc::new(State::default());
        let shared = Arc::clone(&state);
        thread::spawn(move || {
            for stream in listener.incoming().flatten() {
                let state = Arc::clone(&shared);
                thread::spawn(move || handle(stream, &state));
            }
        });
        Self {
            base: format!("http://127.0.0.1:{}", port),
            state,
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base, path)
    }

    pub fn serve(&self, path: &str, body: &[u8]) -> String {
        self.route(path, Route::Body(body.to_vec()))
    }

    pub fn fail(&self, path: &str, status: u16) -> String {
        self.route(path, Route::Status(status))
    }

    pub fn truncate(&self, path: &str, body: &[u8], sent: usize) -> String {
        self.route(
            path,
            Route::Truncated {
                body: body.to_vec(),
                sent,
            },
        )
    }

    /// Requests received for `path` so far.
    pub fn hits(&self, path: &str) -> usize {
        self.state
            .hits
            .lock()
            .unwrap()
            .get(path)
            .copied()
            .unwrap_or(0)
    }

    fn route(&self, path: &str, route: Route) -> String {
        self.state
            .routes
            .lock()
            .unwrap()
            .insert(path.to_string(), route);
        self.url(path)
    }
}

fn handle(mut stream: TcpStream, state: &State) {
    let _ = stream.set_read_timeout(Some(Duration::from_secs(2)));
    let _ = stream.set_write_timeout(Some(Duration::from_secs(2)));
    let mut buf = [0u8; 8192];
    let n = match stream.read(&mut buf) {
        Ok(0) | Err(_) => return,
        Ok(n) => n,
    };
    let Some(path) = request_path(&buf[..n]) else {
        let _ = stream.write_all(b"HTTP/1.1 400 Bad Request\r\nConnection: close\r\n\r\n");
        return;
    };

    *state.hits.lock().unwrap().entry(path.clone()).or_insert(0) += 1;
    let route = state.routes.lock().unwrap().get(&path).cloned();

    match route {
        Some(Route::Body(body)) => {
            let _ = stream.write_all(header("200 OK", body.len()).as_bytes());
            let _ = stream.write_all(&body);
        }
        Some(Route::Truncated { body, sent }) => {
            let _ = stream.write_all(header("200 OK", body.len()).as_bytes());
            let _ = stream.write_all(&body[..sent.min(body.len())]);
            let _ = stream.flush();
        }
        Some(Route::Status(code)) => {
            let _ = stream.write_all(header(&format!("{} Error", code), 0).as_bytes());
        }
        None => {
            let _ = stream.write_all(header("404 Not Found", 0).as_bytes());
        }
    }
}

fn header(status: &str, len: usize) -> String {
    format!(
        "HTTP/1.1 {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
        status, len
    )
}

/// Path of `GET /path HTTP/1.1`.
fn request_path(request: &[u8]) -> Option<String> {
    let text = std::str::from_utf8(request).ok()?;
    let mut parts = text.lines().next()?.split_whitespace();
    let _method = parts.next()?;
    parts.next().map(str::to_string)
}
