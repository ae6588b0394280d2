//! In-process HTTP stub server shared by stage tests. Not part of the
//! public API; only compiled under `#[cfg(test)]`.

use std::io::{Read, Write};
use std::net::TcpListener;

pub struct StubServer {
    pub base_url: String,
}

/// Starts a background thread that answers every connection with the same
/// fixed response. Good enough for tests that make one or two sequential
/// requests against a single stage.
pub fn spawn(status_line: &'static str, body: &'static str) -> StubServer {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind stub server");
    let addr = listener.local_addr().expect("stub server local addr");

    std::thread::spawn(move || {
        for stream in listener.incoming() {
            let mut stream = match stream {
                Ok(s) => s,
                Err(_) => continue,
            };
            let mut buf = [0u8; 2048];
            let _ = stream.read(&mut buf);
            let response = format!(
                "{status_line}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                body.len()
            );
            let _ = stream.write_all(response.as_bytes());
            let _ = stream.flush();
        }
    });

    StubServer {
        base_url: format!("http://{addr}"),
    }
}

/// Like [`spawn`] but for an arbitrary binary body (e.g. a zip archive).
pub fn spawn_bytes(status_line: &'static str, body: &'static [u8]) -> StubServer {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind stub server");
    let addr = listener.local_addr().expect("stub server local addr");

    std::thread::spawn(move || {
        for stream in listener.incoming() {
            let mut stream = match stream {
                Ok(s) => s,
                Err(_) => continue,
            };
            let mut buf = [0u8; 2048];
            let _ = stream.read(&mut buf);
            let header = format!(
                "{status_line}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
                body.len()
            );
            let _ = stream.write_all(header.as_bytes());
            let _ = stream.write_all(body);
            let _ = stream.flush();
        }
    });

    StubServer {
        base_url: format!("http://{addr}"),
    }
}

/// Like [`spawn`] but also sends an extra response header, e.g. `x-jenkins`.
pub fn spawn_with_header(
    status_line: &'static str,
    header: &'static str,
    body: &'static str,
) -> StubServer {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind stub server");
    let addr = listener.local_addr().expect("stub server local addr");

    std::thread::spawn(move || {
        for stream in listener.incoming() {
            let mut stream = match stream {
                Ok(s) => s,
                Err(_) => continue,
            };
            let mut buf = [0u8; 2048];
            let _ = stream.read(&mut buf);
            let response = format!(
                "{status_line}\r\n{header}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                body.len()
            );
            let _ = stream.write_all(response.as_bytes());
            let _ = stream.flush();
        }
    });

    StubServer {
        base_url: format!("http://{addr}"),
    }
}
