use std::net::SocketAddr;

use subway::{app, Config, Server};
use tempfile::TempDir;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::sync::oneshot;
use tokio::time::{sleep, Duration};

const TEST_HTML: &str = "<html><body>test page</body></html>";

fn test_config(dir: &TempDir) -> Config {
    let mut config = Config::default();
    config.server.port = 0;
    config.logging.access_log = false;
    config.static_files.root = dir.path().to_string_lossy().into_owned();
    config
}

fn site() -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    std::fs::create_dir_all(dir.path().join("public")).unwrap();
    std::fs::write(dir.path().join("public/test.html"), TEST_HTML).unwrap();
    std::fs::write(dir.path().join("public/about.html"), "about").unwrap();
    dir
}

type Running = (SocketAddr, oneshot::Sender<()>, tokio::task::JoinHandle<subway::Result<()>>);

async fn start(dir: &TempDir) -> Running {
    start_with(test_config(dir)).await
}

async fn start_with(config: Config) -> Running {
    let routes = app::build_routes(&config).unwrap();
    let server = Server::bind(&config, routes).unwrap();
    let addr = server.local_addr().unwrap();
    let (tx, rx) = oneshot::channel::<()>();
    let handle = tokio::spawn(server.run_until(async {
        let _ = rx.await;
    }));
    (addr, tx, handle)
}

async fn send(addr: SocketAddr, method: &str, target: &str) -> String {
    let mut stream = TcpStream::connect(addr).await.unwrap();
    let request = format!(
        "{method} {target} HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n"
    );
    stream.write_all(request.as_bytes()).await.unwrap();
    let mut buf = Vec::new();
    stream.read_to_end(&mut buf).await.unwrap();
    String::from_utf8(buf).unwrap()
}

fn header<'a>(response: &'a str, name: &str) -> Option<&'a str> {
    let head = response.split("\r\n\r\n").next()?;
    head.lines().skip(1).find_map(|line| {
        let (key, value) = line.split_once(':')?;
        key.eq_ignore_ascii_case(name).then(|| value.trim())
    })
}

fn body(response: &str) -> &str {
    response.split_once("\r\n\r\n").map_or("", |(_, body)| body)
}

#[tokio::test]
async fn test_serves_example_routes() {
    let dir = site();
    let (addr, _tx, _handle) = start(&dir).await;

    let response = send(addr, "GET", "/?utm=1").await;
    assert!(response.starts_with("HTTP/1.1 302"), "{response}");
    assert_eq!(header(&response, "location"), Some("/public/test.html"));

    let response = send(addr, "OPTIONS", "/anything").await;
    assert!(response.starts_with("HTTP/1.1 200"), "{response}");
    assert_eq!(header(&response, "access-control-allow-origin"), Some("*"));
    assert_eq!(
        header(&response, "access-control-allow-methods"),
        Some("GET, POST, PUT, DELETE")
    );

    let response = send(addr, "GET", "/api/2024-01-01").await;
    assert!(response.starts_with("HTTP/1.1 200"), "{response}");
    assert_eq!(header(&response, "content-type"), Some("application/json"));
    assert_eq!(body(&response), r#"{"time":1704067200000}"#);

    let response = send(addr, "GET", "/public/test.html").await;
    assert!(response.starts_with("HTTP/1.1 200"), "{response}");
    assert_eq!(header(&response, "content-type"), Some("text/html"));
    assert_eq!(
        header(&response, "content-length"),
        Some(TEST_HTML.len().to_string().as_str())
    );
    assert_eq!(body(&response), TEST_HTML);

    let response = send(addr, "GET", "/public/about").await;
    assert!(response.starts_with("HTTP/1.1 200"), "{response}");
    assert_eq!(body(&response), "about");
}

#[tokio::test]
async fn test_error_statuses() {
    let dir = site();
    let (addr, _tx, _handle) = start(&dir).await;

    let response = send(addr, "GET", "/does/not/exist").await;
    assert!(response.starts_with("HTTP/1.1 404"), "{response}");
    assert!(body(&response).contains("/does/not/exist"));

    let response = send(addr, "GET", "/public/missing.txt").await;
    assert!(response.starts_with("HTTP/1.1 404"), "{response}");
    assert!(body(&response).contains("/public/missing.txt"));

    let response = send(addr, "GET", "/bad%zzpath").await;
    assert!(response.starts_with("HTTP/1.1 400"), "{response}");
}

#[tokio::test]
async fn test_run_until_stops_on_shutdown() {
    let dir = site();
    let (_addr, tx, handle) = start(&dir).await;

    tx.send(()).unwrap();
    handle.await.unwrap().unwrap();
}

#[tokio::test]
async fn test_slow_download_outlasts_timeouts() {
    const SIZE: usize = 4 * 1024 * 1024;
    let dir = site();
    let payload: Vec<u8> = (0..SIZE).map(|i| (i % 251) as u8).collect();
    std::fs::write(dir.path().join("public/big.bin"), &payload).unwrap();

    let mut config = test_config(&dir);
    config.performance.read_timeout = 1;
    config.performance.write_timeout = 1;
    config.performance.keep_alive_timeout = 1;
    let (addr, _tx, _handle) = start_with(config).await;

    let mut stream = TcpStream::connect(addr).await.unwrap();
    stream
        .write_all(b"GET /public/big.bin HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n")
        .await
        .unwrap();

    // 64 KiB every 50 ms keeps the transfer going for about three seconds
    let mut received = Vec::with_capacity(SIZE + 1024);
    let mut chunk = vec![0u8; 64 * 1024];
    loop {
        let n = stream.read(&mut chunk).await.unwrap();
        if n == 0 {
            break;
        }
        received.extend_from_slice(&chunk[..n]);
        sleep(Duration::from_millis(50)).await;
    }

    let head_end = received
        .windows(4)
        .position(|w| w == b"\r\n\r\n")
        .unwrap()
        + 4;
    let head = String::from_utf8_lossy(&received[..head_end]).into_owned();
    assert!(head.starts_with("HTTP/1.1 200"), "{head}");
    assert_eq!(header(&head, "content-length"), Some(SIZE.to_string().as_str()));
    assert_eq!(received.len() - head_end, SIZE);
    assert!(received[head_end..] == payload[..]);
}
