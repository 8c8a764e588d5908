//! Client and server talking over real loopback TCP.

use findlib_core::{CacheError, Discoverer, FsScan, NoCache, ResultCache, Source};
use findlib_daemon::{CacheClient, CacheHandler, CacheStore, Server};
use findlib_proto::{
    encode_frame, read_frame, DiscoveryQuery, FileChange, Frame, FrameResponse, Request,
    Response, Status,
};
use std::io::Write;
use std::net::{SocketAddr, TcpStream};
use std::path::Path;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

const TIMEOUT: Duration = Duration::from_secs(2);

/// Start a daemon on an ephemeral port in a background thread.
fn spawn_daemon() -> (SocketAddr, Arc<CacheStore>, thread::JoinHandle<()>) {
    let store = Arc::new(CacheStore::new());
    let handler = Arc::new(CacheHandler::new(Arc::clone(&store)));
    let (tx, rx) = std::sync::mpsc::channel();

    let join = thread::spawn(move || {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()
            .unwrap();
        runtime.block_on(async move {
            let server = Server::bind("127.0.0.1:0".parse().unwrap()).await.unwrap();
            tx.send(server.local_addr().unwrap()).unwrap();
            server.run(handler).await.unwrap();
        });
    });

    let addr = rx.recv_timeout(Duration::from_secs(10)).unwrap();
    (addr, store, join)
}

fn touch(path: &Path) -> String {
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(path, b"").unwrap();
    path.to_string_lossy().into_owned()
}

#[test]
fn get_set_and_file_tracking() {
    let (addr, store, join) = spawn_daemon();
    let client = CacheClient::new(addr, TIMEOUT);

    let dir = tempfile::tempdir().unwrap();
    let file = touch(&dir.path().join("lib/libpcre.so"));
    let query = DiscoveryQuery::new("pcre", Some("ver.major == 8"));

    assert_eq!(client.get(&query).unwrap(), None);
    client.set(&query, &[file.clone()]).unwrap();
    assert_eq!(client.get(&query).unwrap(), Some(vec![file.clone()]));
    assert_eq!(
        client.get(&DiscoveryQuery::new("pcre", None)).unwrap(),
        None
    );

    assert_eq!(client.file_changed(&file).unwrap(), FileChange::Changed);
    assert_eq!(client.file_changed(&file).unwrap(), FileChange::Unchanged);
    assert_eq!(
        client.file_changed("/no/such/file.so").unwrap(),
        FileChange::Unknown
    );

    let stats = client.stats().unwrap();
    assert_eq!(stats.entries, 1);
    assert_eq!(stats.tracked_files, 1);
    assert_eq!(store.len(), 1);

    client.shutdown().unwrap();
    join.join().unwrap();
}

#[test]
fn store_primes_mtimes_so_next_lookup_hits() {
    let (addr, _store, join) = spawn_daemon();
    let client = CacheClient::new(addr, TIMEOUT);

    let dir = tempfile::tempdir().unwrap();
    let a = touch(&dir.path().join("libz.so"));
    let b = touch(&dir.path().join("zlib.h"));
    let query = DiscoveryQuery::new("z", None);

    client.store(&query, &[a.clone(), b.clone()]).unwrap();
    assert_eq!(client.lookup(&query).unwrap(), Some(vec![a.clone(), b]));

    // Removing one file invalidates the whole entry.
    std::fs::remove_file(&a).unwrap();
    assert_eq!(client.lookup(&query).unwrap(), None);

    client.shutdown().unwrap();
    join.join().unwrap();
}

#[test]
fn discoverer_uses_daemon_between_runs() {
    let (addr, store, join) = spawn_daemon();

    let root = tempfile::tempdir().unwrap();
    let header = touch(&root.path().join("include/zstd.h"));
    let scan = FsScan::new(vec![root.path().to_path_buf()], root.path().join("ld.so.conf.d"));

    let discoverer = Discoverer::new(
        Box::new(findlib_core::ShellRunner),
        Box::new(CacheClient::new(addr, TIMEOUT)),
    )
    .with_backends(Vec::new())
    .with_fs_scan(Some(scan));

    let first = discoverer.discover("zstd", None).unwrap();
    assert_eq!(first.source, Source::Filesystem);
    assert_eq!(store.len(), 1);

    let second = discoverer.discover("zstd", None).unwrap();
    assert_eq!(second.source, Source::Cache);
    assert_eq!(second.files, first.files);
    assert_eq!(
        discoverer.header_file("zstd", None).unwrap(),
        Some(std::path::PathBuf::from(header))
    );

    CacheClient::new(addr, TIMEOUT).shutdown().unwrap();
    join.join().unwrap();

    // With the daemon gone, discovery still works uncached.
    let third = discoverer.discover("zstd", None).unwrap();
    assert_eq!(third.source, Source::Filesystem);

    let uncached = Discoverer::new(Box::new(findlib_core::ShellRunner), Box::new(NoCache))
        .with_backends(Vec::new())
        .with_fs_scan(None);
    assert_eq!(uncached.discover("zstd", None).unwrap().source, Source::None);
}

#[test]
fn malformed_frames_get_fail_responses() {
    let (addr, _store, join) = spawn_daemon();

    // Valid length prefix, garbage payload.
    let mut stream = TcpStream::connect(addr).unwrap();
    stream.set_read_timeout(Some(TIMEOUT)).unwrap();
    let payload = b"not json";
    stream
        .write_all(&u32::try_from(payload.len()).unwrap().to_le_bytes())
        .unwrap();
    stream.write_all(payload).unwrap();
    let reply: FrameResponse = read_frame(&mut stream).unwrap();
    assert_eq!(reply.response.status(), Status::Fail);

    // Unknown discriminator with a proper hello.
    let mut stream = TcpStream::connect(addr).unwrap();
    stream.set_read_timeout(Some(TIMEOUT)).unwrap();
    let frame = serde_json_frame(
        r#"{"hello":{"proto_schema_version":1,"client_version":"t"},"request":{"request":"frobnicate"}}"#,
    );
    stream.write_all(&frame).unwrap();
    let reply: FrameResponse = read_frame(&mut stream).unwrap();
    match reply.response {
        Response::Fail { message, .. } => assert_eq!(message, "Unknown request: frobnicate"),
        other => panic!("unexpected response: {other:?}"),
    }

    // Wrong protocol version.
    let client_err = {
        let mut stream = TcpStream::connect(addr).unwrap();
        stream.set_read_timeout(Some(TIMEOUT)).unwrap();
        let frame = serde_json_frame(
            r#"{"hello":{"proto_schema_version":999,"client_version":"t"},"request":{"request":"stats"}}"#,
        );
        stream.write_all(&frame).unwrap();
        let reply: FrameResponse = read_frame(&mut stream).unwrap();
        reply.response
    };
    assert!(matches!(client_err, Response::Fail { ref code, .. } if code == "PROTO_VERSION_MISMATCH"));

    let client = CacheClient::new(addr, TIMEOUT);
    client.shutdown().unwrap();
    join.join().unwrap();
    assert!(matches!(client.stats(), Err(CacheError::Io(_))));
}

#[test]
fn frame_split_across_writes_is_reassembled() {
    let (addr, _store, join) = spawn_daemon();

    let encoded = encode_frame(&Frame::new("t", Request::Ping { nonce: 42 })).unwrap();
    let (prefix, payload) = encoded.split_at(4);
    let (head, tail) = payload.split_at(payload.len() / 2);

    let mut stream = TcpStream::connect(addr).unwrap();
    stream.set_nodelay(true).unwrap();
    stream.set_read_timeout(Some(TIMEOUT)).unwrap();
    for chunk in [&prefix[..2], &prefix[2..], head, tail] {
        stream.write_all(chunk).unwrap();
        stream.flush().unwrap();
        thread::sleep(Duration::from_millis(50));
    }

    let reply: FrameResponse = read_frame(&mut stream).unwrap();
    assert_eq!(reply.response, Response::pong(42));

    CacheClient::new(addr, TIMEOUT).shutdown().unwrap();
    join.join().unwrap();
}

/// Length-prefix a raw JSON payload.
fn serde_json_frame(json: &str) -> Vec<u8> {
    let value: serde_json::Value = serde_json::from_str(json).unwrap();
    encode_frame(&value).unwrap()
}
