// Copyright © 2023 Shokunin (職人) Static Site Generator. All rights reserved.
// SPDX-License-Identifier: Apache-2.0 OR MIT

use std::io::prelude::*;
use std::net::{TcpListener, TcpStream};
use std::path::Path;

/// ## Function: `start` - Start a web server to serve the output directory.
///
/// Binds a `TcpListener` at `server_address` and serves every incoming
/// connection from `document_root`.
///
/// # Errors
///
/// Returns an error if the listener fails to bind to `server_address`.
pub fn start(server_address: &str, document_root: &str) -> std::io::Result<()> {
    let listener = TcpListener::bind(server_address)?;
    println!("❯ Server is now running at http://{}", server_address);
    println!("  Done.\n");

    for stream in listener.incoming() {
        match stream {
            Ok(stream) => {
                if let Err(e) = handle_connection(stream, document_root) {
                    eprintln!("Error handling connection: {}", e);
                }
            }
            Err(e) => {
                eprintln!("Error: {}", e);
            }
        }
    }
    Ok(())
}

/// ## Function: `handle_connection` - Handle a single connection.
///
/// Parses the request line, resolves it against `document_root` (rejecting
/// any path that escapes it after canonicalization), and writes back
/// either the file's contents or a 404 fallback from `404/index.html`.
///
/// # Errors
///
/// Returns an error if the connection cannot be read from or written to.
pub fn handle_connection(mut stream: TcpStream, document_root: &str) -> std::io::Result<()> {
    let mut buffer = [0; 1024];
    let bytes_read = stream.read(&mut buffer)?;
    if bytes_read == 0 {
        return Ok(());
    }

    let request = String::from_utf8_lossy(&buffer[..bytes_read]);
    let request_line = request.lines().next().unwrap_or("");
    let mut request_parts = request_line.split_whitespace();

    let (_method, path, _version) = match (
        request_parts.next(),
        request_parts.next(),
        request_parts.next(),
    ) {
        (Some(method), Some(path), Some(version)) => (method, path, version),
        _ => {
            eprintln!("Malformed request line: {}", request_line);
            return Ok(());
        }
    };

    let requested_file = match path {
        "/" => "index.html".to_string(),
        p if p.ends_with('/') => format!("{}index.html", &p[1..]),
        p => p[1..].to_string(), // Remove the leading "/"
    };

    let document_root = Path::new(&document_root);
    let requested_path = document_root.join(&requested_file);
    let canonical_document_root = document_root.canonicalize()?;

    // Canonicalize paths and check for directory traversal attempts; a
    // missing file canonicalizes against its existing parent instead of
    // erroring, so a plain 404 can still be served.
    let canonical_requested_path = requested_path
        .canonicalize()
        .unwrap_or_else(|_| requested_path.clone());

    if !canonical_requested_path.starts_with(&canonical_document_root) {
        eprintln!(
            "Possible directory traversal attempt: {}",
            requested_file
        );
        return Ok(());
    }

    let (status_line, contents) = if canonical_requested_path.is_file() {
        (
            "HTTP/1.1 200 OK\r\n\r\n",
            std::fs::read(&canonical_requested_path).unwrap_or_default(),
        )
    } else {
        (
            "HTTP/1.1 404 NOT FOUND\r\n\r\n",
            std::fs::read(canonical_document_root.join("404/index.html"))
                .unwrap_or_else(|_| b"File not found".to_vec()),
        )
    };

    stream.write_all(status_line.as_bytes())?;
    stream.write_all(&contents)?;
    stream.flush()?;
    Ok(())
}
