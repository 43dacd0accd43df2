//! Shared helpers for integration tests: fixture workbooks and a local
//! HTTP server answering with scripted status codes.
#![allow(dead_code)]

use rust_xlsxwriter::Workbook;
use std::path::Path;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

pub const HEADERS: [&str; 6] = ["ID/SKU", "Name", "Brand", "Category", "Description", "Price"];

/// One fixture product; `sku` is written as a number when it parses as one.
pub struct FixtureRow {
    pub sku: &'static str,
    pub name: &'static str,
    pub brand: &'static str,
    pub category: &'static str,
    pub description: String,
    pub price: f64,
}

impl FixtureRow {
    pub fn new(sku: &'static str, category: &'static str, description: impl Into<String>) -> Self {
        Self {
            sku,
            name: "Phone Case",
            brand: "Acme",
            category,
            description: description.into(),
            price: 9.5,
        }
    }
}

/// Write a single-sheet `Products` workbook with [`HEADERS`].
pub fn write_fixture(path: &Path, rows: &[FixtureRow]) {
    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();
    sheet.set_name("Products").unwrap();

    for (col, header) in HEADERS.iter().enumerate() {
        sheet.write_string(0, col as u16, *header).unwrap();
    }
    for (idx, row) in rows.iter().enumerate() {
        let r = idx as u32 + 1;
        match row.sku.parse::<f64>() {
            Ok(n) => sheet.write_number(r, 0, n).unwrap(),
            Err(_) => sheet.write_string(r, 0, row.sku).unwrap(),
        };
        sheet.write_string(r, 1, row.name).unwrap();
        sheet.write_string(r, 2, row.brand).unwrap();
        sheet.write_string(r, 3, row.category).unwrap();
        if !row.description.is_empty() {
            sheet.write_string(r, 4, &row.description).unwrap();
        }
        sheet.write_number(r, 5, row.price).unwrap();
    }

    workbook.save(path).unwrap();
}

/// Start a server on an ephemeral port and return its base URL.
///
/// `GET/HEAD /status/<code>` answers `<code>` with an empty body;
/// `/hang` accepts the request and never answers.
pub async fn spawn_status_server() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        loop {
            let Ok((stream, _)) = listener.accept().await else {
                break;
            };
            tokio::spawn(handle(stream));
        }
    });

    format!("http://{addr}")
}

async fn handle(mut stream: TcpStream) {
    let mut buf = vec![0u8; 4096];
    let Ok(n) = stream.read(&mut buf).await else {
        return;
    };
    let request = String::from_utf8_lossy(&buf[..n]);
    let path = request
        .lines()
        .next()
        .and_then(|line| line.split_whitespace().nth(1))
        .unwrap_or("/")
        .to_string();

    if path == "/hang" {
        tokio::time::sleep(Duration::from_secs(30)).await;
        return;
    }

    let code: u16 = path
        .strip_prefix("/status/")
        .and_then(|rest| rest.split('/').next())
        .and_then(|code| code.parse().ok())
        .unwrap_or(404);

    let mut response = format!("HTTP/1.1 {code} Scripted\r\nContent-Length: 0\r\nConnection: close\r\n");
    if (300..400).contains(&code) {
        response.push_str("Location: /status/200\r\n");
    }
    response.push_str("\r\n");

    let _ = stream.write_all(response.as_bytes()).await;
    let _ = stream.shutdown().await;
}

/// A URL on a port nothing listens on.
pub async fn refused_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{addr}/status/200")
}
