//! Tests for the HTTP chunk transport against a minimal local blob server.

use std::sync::Arc;

use reqwest::header::CONTENT_RANGE;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

use rangeserve::range::parse_range_header;
use rangeserve::{
    ChunkTransport, HttpChunkTransport, HttpConfig, NoopNotifier, RangeStatus, RangedError,
    RangedResponse, StreamConfig,
};

fn blob() -> Vec<u8> {
    (0..5000u32).map(|i| (i % 199) as u8).collect()
}

/// Answer each connection like a blob store honoring single byte ranges.
async fn serve(listener: TcpListener, data: Arc<Vec<u8>>, honor_range: bool) {
    loop {
        let Ok((mut socket, _)) = listener.accept().await else {
            return;
        };
        let data = data.clone();
        tokio::spawn(async move {
            let mut request = Vec::new();
            let mut buf = [0u8; 1024];
            while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                match socket.read(&mut buf).await {
                    Ok(0) | Err(_) => return,
                    Ok(n) => request.extend_from_slice(&buf[..n]),
                }
            }
            let request = String::from_utf8_lossy(&request).to_string();
            let path = request.split_whitespace().nth(1).unwrap_or("/").to_string();
            let range = request
                .lines()
                .find_map(|line| {
                    let (name, value) = line.split_once(':')?;
                    name.eq_ignore_ascii_case("range").then(|| value.trim().to_string())
                });

            let size = data.len() as u64;
            let (head, body): (String, Vec<u8>) = if path == "/missing" {
                ("HTTP/1.1 404 Not Found\r\nContent-Length: 0\r\n".to_string(), Vec::new())
            } else {
                match range.and_then(|r| parse_range_header(&r, Some(size))) {
                    Some(parsed) if honor_range => {
                        let range = parsed.resolve(size);
                        if range.start >= size {
                            (
                                format!(
                                    "HTTP/1.1 416 Range Not Satisfiable\r\nContent-Range: bytes */{}\r\nContent-Length: 0\r\n",
                                    size
                                ),
                                Vec::new(),
                            )
                        } else {
                            let stop = range.stop.min(size);
                            let body = &data[range.start as usize..stop as usize];
                            (
                                format!(
                                    "HTTP/1.1 206 Partial Content\r\nContent-Range: bytes {}-{}/{}\r\nContent-Length: {}\r\n",
                                    range.start,
                                    stop - 1,
                                    size,
                                    body.len()
                                ),
                                body.to_vec(),
                            )
                        }
                    }
                    _ => (
                        format!("HTTP/1.1 200 OK\r\nContent-Length: {}\r\n", size),
                        data.to_vec(),
                    ),
                }
            };

            let _ = socket.write_all(head.as_bytes()).await;
            let _ = socket.write_all(b"Connection: close\r\n\r\n").await;
            let _ = socket.write_all(&body).await;
            let _ = socket.shutdown().await;
        });
    }
}

async fn start_server(honor_range: bool) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(serve(listener, Arc::new(blob()), honor_range));
    format!("http://{}", addr)
}

#[tokio::test]
async fn fetches_partial_content() {
    let base = start_server(true).await;
    let transport = HttpChunkTransport::new(format!("{}/blob", base), &HttpConfig::default()).unwrap();

    let chunk = transport.fetch(100, 199).await.unwrap();
    assert_eq!(chunk.total_size, 5000);
    assert_eq!(chunk.data.as_ref(), &blob()[100..200]);

    let tail = transport.fetch(4990, 5500).await.unwrap();
    assert_eq!(tail.data.as_ref(), &blob()[4990..]);
    assert_eq!(transport.transferred_bytes(), 110);
}

#[tokio::test]
async fn reports_unsatisfiable_start() {
    let base = start_server(true).await;
    let transport = HttpChunkTransport::new(format!("{}/blob", base), &HttpConfig::default()).unwrap();
    assert!(matches!(
        transport.fetch(6000, 6099).await,
        Err(RangedError::RangeNotSatisfiable { size: 5000 })
    ));
}

#[tokio::test]
async fn reports_missing_blob() {
    let base = start_server(true).await;
    let transport = HttpChunkTransport::new(format!("{}/missing", base), &HttpConfig::default()).unwrap();
    let error = transport.fetch(0, 99).await.unwrap_err();
    assert!(matches!(error, RangedError::NotFound { .. }));
    assert!(error.is_source_unavailable());
}

#[tokio::test]
async fn slices_full_responses_from_servers_ignoring_range() {
    let base = start_server(false).await;
    let transport = HttpChunkTransport::new(format!("{}/blob", base), &HttpConfig::default()).unwrap();
    let chunk = transport.fetch(10, 19).await.unwrap();
    assert_eq!(chunk.total_size, 5000);
    assert_eq!(chunk.data.as_ref(), &blob()[10..20]);
}

#[tokio::test]
async fn streams_suffix_range_from_url() {
    let base = start_server(true).await;
    let config = StreamConfig {
        block_size: 64,
        ..StreamConfig::with_source_id("remote")
    };
    let mut response = RangedResponse::from_url(
        &format!("{}/blob", base),
        &HttpConfig::default(),
        Some("bytes=-150"),
        &config,
        Arc::new(NoopNotifier),
    )
    .await
    .unwrap();

    assert_eq!(response.status(), RangeStatus::Partial);
    assert_eq!(response.plan().header(&CONTENT_RANGE), Some("bytes 4850-4999/5000"));

    let mut body = Vec::new();
    while let Some(block) = response.next_block().await.unwrap() {
        body.extend_from_slice(&block);
    }
    assert_eq!(body, blob()[4850..].to_vec());
}
