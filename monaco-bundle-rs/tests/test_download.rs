use flate2::write::GzEncoder;
use flate2::Compression;
use monaco_bundle_rs::download::{download_monaco, DownloadOptions, DownloadProgress};
use monaco_bundle_rs::error::{DownloadError, NpmError};
use monaco_bundle_rs::npm::NpmRegistry;
use sha1::{Digest, Sha1};
use std::collections::HashMap;
use std::fs;
use std::io::{BufRead, BufReader, Write};
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

struct TestHttpServer {
    addr: SocketAddr,
    running: Arc<AtomicBool>,
    handle: Option<thread::JoinHandle<()>>,
}

impl TestHttpServer {
    /// Binds first so routes can embed the server's own address.
    fn bind() -> TcpListener {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        listener.set_nonblocking(true).unwrap();
        listener
    }

    fn start(listener: TcpListener, routes: Vec<(String, Vec<u8>)>) -> Self {
        let addr = listener.local_addr().unwrap();
        let routes: Arc<HashMap<String, Vec<u8>>> = Arc::new(routes.into_iter().collect());
        let running = Arc::new(AtomicBool::new(true));
        let running_clone = running.clone();
        let handle = thread::spawn(move || {
            while running_clone.load(Ordering::SeqCst) {
                match listener.accept() {
                    Ok((stream, _)) => handle_connection(stream, &routes),
                    Err(err) if err.kind() == std::io::ErrorKind::WouldBlock => {
                        thread::sleep(Duration::from_millis(5));
                    }
                    Err(_) => break,
                }
            }
        });
        Self {
            addr,
            running,
            handle: Some(handle),
        }
    }

    fn origin(&self) -> String {
        format!("http://{}", self.addr)
    }
}

impl Drop for TestHttpServer {
    fn drop(&mut self) {
        self.running.store(false, Ordering::SeqCst);
        let _ = TcpStream::connect(self.addr);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

fn handle_connection(mut stream: TcpStream, routes: &HashMap<String, Vec<u8>>) {
    stream.set_nonblocking(false).ok();
    let Ok(reader_stream) = stream.try_clone() else {
        return;
    };
    let mut reader = BufReader::new(reader_stream);

    let mut request_line = String::new();
    if reader.read_line(&mut request_line).is_err() {
        return;
    }
    let path = request_line.split_whitespace().nth(1).unwrap_or("/").to_string();
    loop {
        let mut header_line = String::new();
        if reader.read_line(&mut header_line).is_err() {
            return;
        }
        if header_line == "\r\n" || header_line == "\n" || header_line.is_empty() {
            break;
        }
    }

    let (status, body) = match routes.get(&path) {
        Some(body) => ("200 OK", body.clone()),
        None => ("404 Not Found", b"\"Not Found\"".to_vec()),
    };
    let head = format!(
        "HTTP/1.1 {status}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
        body.len()
    );
    let _ = stream.write_all(head.as_bytes());
    let _ = stream.write_all(&body);
    let _ = stream.flush();
}

fn package_tgz(version: &str) -> Vec<u8> {
    let mut builder = tar::Builder::new(GzEncoder::new(Vec::new(), Compression::default()));
    let files = [
        (
            "package/package.json".to_string(),
            format!(r#"{{"name": "monaco-editor", "version": "{version}"}}"#),
        ),
        (
            "package/esm/vs/editor/editor.main.js".to_string(),
            "import * as nls from '../nls.js';\n".to_string(),
        ),
    ];
    for (name, content) in &files {
        let mut header = tar::Header::new_gnu();
        header.set_size(content.len() as u64);
        header.set_mode(0o644);
        header.set_cksum();
        builder
            .append_data(&mut header, name, content.as_bytes())
            .unwrap();
    }
    builder.into_inner().unwrap().finish().unwrap()
}

/// Serves `monaco-editor@<version>` under both `<version>` and `latest`.
fn registry_server(version: &str, tgz: Vec<u8>, shasum: Option<&str>) -> TestHttpServer {
    let listener = TestHttpServer::bind();
    let origin = format!("http://{}", listener.local_addr().unwrap());
    let tarball_path = format!("/monaco-editor/-/monaco-editor-{version}.tgz");
    let shasum = shasum
        .map(str::to_string)
        .unwrap_or_else(|| format!("{:x}", Sha1::digest(&tgz)));
    let info = serde_json::json!({
        "_id": format!("monaco-editor@{version}"),
        "name": "monaco-editor",
        "version": version,
        "dist": {
            "shasum": shasum,
            "tarball": format!("{origin}{tarball_path}"),
        }
    })
    .to_string()
    .into_bytes();

    TestHttpServer::start(
        listener,
        vec![
            (format!("/monaco-editor/{version}"), info.clone()),
            ("/monaco-editor/latest".to_string(), info),
            (tarball_path, tgz),
        ],
    )
}

fn options(dir: &Path, version: Option<&str>, overwrite: bool) -> DownloadOptions {
    DownloadOptions {
        version: version.map(str::to_string),
        dir: Some(dir.to_path_buf()),
        overwrite,
    }
}

#[tokio::test]
async fn test_download_extracts_into_version_dir() {
    let tgz = package_tgz("0.52.2");
    let size = tgz.len() as u64;
    let server = registry_server("0.52.2", tgz, None);
    let registry = NpmRegistry::new(&server.origin());
    let dir = tempfile::tempdir().unwrap();

    let mut updates: Vec<DownloadProgress> = Vec::new();
    let report = download_monaco(&registry, &options(dir.path(), None, false), |p| {
        updates.push(*p)
    })
    .await
    .unwrap();

    let version_dir = dir.path().join("0.52.2");
    assert_eq!(report.version_dir, version_dir);
    assert_eq!(report.package.version, "0.52.2");
    assert_eq!(report.bytes, size);
    assert!(version_dir.join("package.json").is_file());
    assert!(version_dir.join("esm/vs/editor/editor.main.js").is_file());
    assert!(!dir.path().join("0.52.2.tgz").exists());

    let last = updates.last().unwrap();
    assert_eq!(last.received, size);
    assert_eq!(last.total, Some(size));
    assert_eq!(last.percent, 100.0);
}

#[tokio::test]
async fn test_download_creates_missing_dir() {
    let server = registry_server("0.45.0", package_tgz("0.45.0"), None);
    let registry = NpmRegistry::new(&server.origin());
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path().join("nested").join("tmp");

    download_monaco(&registry, &options(&root, Some("0.45.0"), false), |_| {})
        .await
        .unwrap();
    assert!(root.join("0.45.0/package.json").is_file());
}

#[tokio::test]
async fn test_checksum_mismatch_is_rejected() {
    let server = registry_server(
        "0.52.2",
        package_tgz("0.52.2"),
        Some("0000000000000000000000000000000000000000"),
    );
    let registry = NpmRegistry::new(&server.origin());
    let dir = tempfile::tempdir().unwrap();

    let err = download_monaco(&registry, &options(dir.path(), Some("0.52.2"), false), |_| {})
        .await
        .unwrap_err();
    assert!(matches!(err, DownloadError::Checksum { .. }));
    assert!(!dir.path().join("0.52.2").exists());
}

#[tokio::test]
async fn test_existing_version_requires_overwrite() {
    let server = registry_server("0.52.2", package_tgz("0.52.2"), None);
    let registry = NpmRegistry::new(&server.origin());
    let dir = tempfile::tempdir().unwrap();
    let version_dir = dir.path().join("0.52.2");
    fs::create_dir_all(&version_dir).unwrap();
    fs::write(version_dir.join("stale.js"), "").unwrap();

    let err = download_monaco(&registry, &options(dir.path(), Some("0.52.2"), false), |_| {})
        .await
        .unwrap_err();
    assert!(matches!(err, DownloadError::VersionExists(ref v) if v == "0.52.2"));

    download_monaco(&registry, &options(dir.path(), Some("0.52.2"), true), |_| {})
        .await
        .unwrap();
    assert!(!version_dir.join("stale.js").exists());
    assert!(version_dir.join("package.json").is_file());
}

#[tokio::test]
async fn test_registry_error_message() {
    let listener = TestHttpServer::bind();
    let server = TestHttpServer::start(
        listener,
        vec![(
            "/monaco-editor/9.9.9".to_string(),
            b"\"version not found: 9.9.9\"".to_vec(),
        )],
    );
    let registry = NpmRegistry::new(&server.origin());
    let dir = tempfile::tempdir().unwrap();

    let err = download_monaco(&registry, &options(dir.path(), Some("9.9.9"), false), |_| {})
        .await
        .unwrap_err();
    match err {
        DownloadError::Npm(NpmError::Registry { message, .. }) => {
            assert_eq!(message, "version not found: 9.9.9")
        }
        other => panic!("unexpected error: {other:?}"),
    }
}
