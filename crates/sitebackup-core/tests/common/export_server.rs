//! Minimal HTTP/1.1 server standing in for the remote export endpoint.
//!
//! Answers every request with one canned response and records the request
//! head so tests can check the request line and the Authorization header.

#![allow(dead_code)]

use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

#[derive(Debug, Clone)]
pub enum Behavior {
    /// Send status + body, then close.
    Respond { status: u16, body: Vec<u8> },
    /// Accept the connection and never answer.
    Stall,
    /// Send headers and the first `sent` bytes of `body`, then hang.
    StallMidBody { body: Vec<u8>, sent: usize },
    /// Advertise `body.len()` but close after `sent` bytes.
    Truncate { body: Vec<u8>, sent: usize },
    /// Redirect to `location` (path on the same server is fine).
    Redirect { location: String },
}

pub struct ExportServer {
    /// Base URL without trailing slash, e.g. "http://127.0.0.1:12345".
    pub base_url: String,
    requests: Arc<Mutex<Vec<String>>>,
}

impl ExportServer {
    /// Raw request heads received so far.
    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }
}

/// Starts a server in a background thread. It runs until the process exits.
pub fn start(behavior: Behavior) -> ExportServer {
    start_chain(vec![behavior])
}

/// Like `start`, but the n-th connection gets the n-th behavior (last one repeats).
pub fn start_chain(behaviors: Vec<Behavior>) -> ExportServer {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let port = listener.local_addr().unwrap().port();
    let requests = Arc::new(Mutex::new(Vec::new()));
    let recorded = Arc::clone(&requests);
    thread::spawn(move || {
        for (i, stream) in listener.incoming().flatten().enumerate() {
            let behavior = behaviors[i.min(behaviors.len() - 1)].clone();
            let recorded = Arc::clone(&recorded);
            thread::spawn(move || handle(stream, behavior, &recorded));
        }
    });
    ExportServer {
        base_url: format!("http://127.0.0.1:{}", port),
        requests,
    }
}

/// A URL on which nothing listens.
pub fn closed_port_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let port = listener.local_addr().unwrap().port();
    drop(listener);
    format!("http://127.0.0.1:{}", port)
}

fn handle(mut stream: TcpStream, behavior: Behavior, recorded: &Mutex<Vec<String>>) {
    let _ = stream.set_read_timeout(Some(Duration::from_secs(2)));
    let _ = stream.set_write_timeout(Some(Duration::from_secs(2)));
    let head = match read_head(&mut stream) {
        Some(h) => h,
        None => return,
    };
    recorded.lock().unwrap().push(head);

    match behavior {
        Behavior::Respond { status, body } => {
            let response = format!(
                "HTTP/1.1 {} {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
                status,
                reason(status),
                body.len()
            );
            let _ = stream.write_all(response.as_bytes());
            let _ = stream.write_all(&body);
        }
        Behavior::Stall => {
            thread::sleep(Duration::from_secs(10));
        }
        Behavior::StallMidBody { body, sent } => {
            let response = format!(
                "HTTP/1.1 200 OK\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
                body.len()
            );
            let _ = stream.write_all(response.as_bytes());
            let _ = stream.write_all(&body[..sent]);
            let _ = stream.flush();
            thread::sleep(Duration::from_secs(10));
        }
        Behavior::Truncate { body, sent } => {
            let response = format!(
                "HTTP/1.1 200 OK\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
                body.len()
            );
            let _ = stream.write_all(response.as_bytes());
            let _ = stream.write_all(&body[..sent]);
        }
        Behavior::Redirect { location } => {
            let response = format!(
                "HTTP/1.1 302 Found\r\nLocation: {}\r\nContent-Length: 0\r\nConnection: close\r\n\r\n",
                location
            );
            let _ = stream.write_all(response.as_bytes());
        }
    }
}

/// Reads until the blank line ending the request head.
fn read_head(stream: &mut TcpStream) -> Option<String> {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];
    while !buf.windows(4).any(|w| w == b"\r\n\r\n") {
        match stream.read(&mut chunk) {
            Ok(0) | Err(_) => return None,
            Ok(n) => buf.extend_from_slice(&chunk[..n]),
        }
    }
    String::from_utf8(buf).ok()
}

fn reason(status: u16) -> &'static str {
    match status {
        200 => "OK",
        204 => "No Content",
        299 => "OK",
        300 => "Multiple Choices",
        401 => "Unauthorized",
        403 => "Forbidden",
        404 => "Not Found",
        500 => "Internal Server Error",
        _ => "Status",
    }
}
