//! Tests for the socket listener.

use std::io;
use std::net::TcpStream;
use std::sync::{Arc, Mutex, mpsc};
use std::time::Duration;

use rstest::{fixture, rstest};

use syscheck_config::SocketEndpoint;

use super::framing::FramingError;
use super::listener::SocketListener;
use super::test_utils::wait_for_count;
use super::{Connection, ConnectionHandler, CountingHandler, ListenerError, read_command_line};

/// Reports how the first command line read from each client ended.
struct LineReader {
    outcomes: Mutex<mpsc::Sender<Result<Option<String>, FramingError>>>,
}

impl ConnectionHandler for LineReader {
    fn handle(&self, mut connection: Box<dyn Connection>) {
        let outcome = read_command_line(&mut connection);
        let _ = self.outcomes.lock().expect("outcome lock").send(outcome);
    }
}

#[fixture]
fn tcp_endpoint() -> SocketEndpoint {
    SocketEndpoint::tcp("127.0.0.1", 0)
}

#[rstest]
fn tcp_listener_accepts_connections(tcp_endpoint: SocketEndpoint) {
    let listener = SocketListener::bind(&tcp_endpoint).expect("bind tcp listener");
    let addr = listener
        .local_addr()
        .expect("listener should report local address");
    let (count, handler) = CountingHandler::new();
    let handler: Arc<dyn ConnectionHandler> = handler;
    let handle = listener.start(handler).expect("start listener");

    TcpStream::connect(addr).expect("connect first client");
    TcpStream::connect(addr).expect("connect second client");

    assert!(wait_for_count(&count, 2), "expected two connections");
    handle.shutdown();
    handle.join().expect("join listener");
}

#[rstest]
fn silent_clients_are_cut_off_after_the_read_timeout(tcp_endpoint: SocketEndpoint) {
    let listener = SocketListener::bind_with_timeout(&tcp_endpoint, Duration::from_millis(100))
        .expect("bind tcp listener");
    let addr = listener.local_addr().expect("local address");
    let (sender, outcomes) = mpsc::channel();
    let handle = listener
        .start(Arc::new(LineReader {
            outcomes: Mutex::new(sender),
        }))
        .expect("start listener");

    // Connected but never writes nor closes.
    let _silent = TcpStream::connect(addr).expect("connect client");

    let outcome = outcomes
        .recv_timeout(Duration::from_secs(2))
        .expect("handler must give up on a silent client");
    assert!(
        matches!(
            &outcome,
            Err(FramingError::Io(error))
                if matches!(error.kind(), io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut)
        ),
        "unexpected outcome: {outcome:?}"
    );
    handle.shutdown();
    handle.join().expect("join listener");
}

#[rstest]
fn clients_that_write_within_the_timeout_are_served(tcp_endpoint: SocketEndpoint) {
    let listener = SocketListener::bind_with_timeout(&tcp_endpoint, Duration::from_millis(500))
        .expect("bind tcp listener");
    let addr = listener.local_addr().expect("local address");
    let (sender, outcomes) = mpsc::channel();
    let handle = listener
        .start(Arc::new(LineReader {
            outcomes: Mutex::new(sender),
        }))
        .expect("start listener");

    let mut client = TcpStream::connect(addr).expect("connect client");
    io::Write::write_all(&mut client, b"restart\n").expect("write line");

    let outcome = outcomes
        .recv_timeout(Duration::from_secs(2))
        .expect("handler reads the line");
    assert_eq!(outcome.expect("line read").as_deref(), Some("restart"));
    handle.shutdown();
    handle.join().expect("join listener");
}

#[rstest]
fn bound_listener_reports_its_endpoint(tcp_endpoint: SocketEndpoint) {
    let listener = SocketListener::bind(&tcp_endpoint).expect("bind tcp listener");
    assert_eq!(listener.endpoint(), &tcp_endpoint);
}

#[cfg(unix)]
#[fixture]
fn unix_tempdir() -> tempfile::TempDir {
    tempfile::tempdir().expect("temp dir")
}

#[cfg(unix)]
fn unix_endpoint(path: &std::path::Path) -> SocketEndpoint {
    SocketEndpoint::unix(path.to_str().expect("utf8 path"))
}

#[cfg(unix)]
#[rstest]
fn unix_listener_replaces_stale_socket_files(unix_tempdir: tempfile::TempDir) {
    let path = unix_tempdir.path().join("syscheckd.sock");
    {
        let _stale = std::os::unix::net::UnixListener::bind(&path).expect("bind stale listener");
    }
    assert!(path.exists(), "stale socket should remain");

    let listener = SocketListener::bind(&unix_endpoint(&path)).expect("bind new listener");
    assert!(listener.local_addr().is_none());
    let (count, handler) = CountingHandler::new();
    let handle = listener.start(handler).expect("start listener");

    std::os::unix::net::UnixStream::connect(&path).expect("connect unix client");
    assert!(wait_for_count(&count, 1), "expected one connection");

    handle.shutdown();
    handle.join().expect("join listener");
    assert!(
        !path.exists(),
        "listener should remove unix socket on shutdown"
    );
}

#[cfg(unix)]
#[rstest]
fn unix_listener_rejects_in_use_socket(unix_tempdir: tempfile::TempDir) {
    let path = unix_tempdir.path().join("syscheckd.sock");
    let _existing = std::os::unix::net::UnixListener::bind(&path).expect("bind existing listener");

    let error = SocketListener::bind(&unix_endpoint(&path)).expect_err("should fail bind");
    assert!(matches!(error, ListenerError::InUse { .. }));
}

#[cfg(unix)]
#[rstest]
fn unix_listener_refuses_to_replace_regular_files(unix_tempdir: tempfile::TempDir) {
    let path = unix_tempdir.path().join("syscheckd.sock");
    std::fs::write(&path, b"not a socket").expect("write regular file");

    let error = SocketListener::bind(&unix_endpoint(&path)).expect_err("should fail bind");
    assert!(matches!(error, ListenerError::NotASocket { .. }));
    assert!(path.exists(), "regular file must be left alone");
}
