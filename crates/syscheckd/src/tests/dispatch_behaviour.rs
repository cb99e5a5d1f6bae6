//! Behavioural tests for control commands served over the socket.

use std::cell::RefCell;
use std::io::{Read, Write};
use std::net::{Shutdown, SocketAddr, TcpStream};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use rstest::fixture;
use rstest_bdd_macros::{given, scenario, then, when};

use syscheck_config::{MonitorSettings, SocketEndpoint};

use crate::collaborators::{Collaborators, RestartTrigger, SyncChannel};
use crate::dispatch::{CommandRouter, ControlConnectionHandler};
use crate::store::SectionStore;
use crate::transport::{ListenerHandle, SocketListener};

use super::support::SAMPLE_SECTIONS;

#[derive(Default)]
struct RecordingSync {
    messages: Mutex<Vec<String>>,
}

impl SyncChannel for RecordingSync {
    fn push_sync_message(&self, message: &str) {
        self.messages
            .lock()
            .expect("sync mutex poisoned")
            .push(message.to_owned());
    }
}

#[derive(Default)]
struct CountingRestart {
    requests: AtomicUsize,
}

impl RestartTrigger for CountingRestart {
    fn trigger_restart(&self) {
        self.requests.fetch_add(1, Ordering::SeqCst);
    }
}

struct DispatchWorld {
    sync: Arc<RecordingSync>,
    restart: Arc<CountingRestart>,
    listener: Option<ListenerHandle>,
    address: Option<SocketAddr>,
    reply: Option<String>,
}

impl DispatchWorld {
    fn new() -> Self {
        Self {
            sync: Arc::new(RecordingSync::default()),
            restart: Arc::new(CountingRestart::default()),
            listener: None,
            address: None,
            reply: None,
        }
    }

    fn start_listener(&mut self) {
        let settings = MonitorSettings::parse(SAMPLE_SECTIONS).expect("sample sections parse");
        let collaborators = Collaborators::new(
            Arc::new(SectionStore::new(settings)),
            Arc::clone(&self.sync) as Arc<dyn SyncChannel>,
            Arc::clone(&self.restart) as Arc<dyn RestartTrigger>,
        );
        let handler = Arc::new(ControlConnectionHandler::new(CommandRouter::new(
            collaborators,
        )));
        let listener =
            SocketListener::bind(&SocketEndpoint::tcp("127.0.0.1", 0)).expect("bind listener");
        self.address = listener.local_addr();
        self.listener = Some(listener.start(handler).expect("start listener"));
    }

    fn send_line(&mut self, line: &str) {
        let addr = self.address.expect("listener started");
        let mut stream = TcpStream::connect(addr).expect("connect");
        stream
            .set_read_timeout(Some(Duration::from_secs(2)))
            .expect("set read timeout");
        stream.write_all(line.as_bytes()).expect("write command");
        stream.write_all(b"\n").expect("write newline");
        stream.shutdown(Shutdown::Write).expect("half close");

        let mut reply = String::new();
        stream.read_to_string(&mut reply).expect("read reply");
        self.reply = Some(reply);
    }

    fn reply(&self) -> &str {
        self.reply.as_deref().expect("a command was sent")
    }
}

impl Drop for DispatchWorld {
    fn drop(&mut self) {
        if let Some(handle) = self.listener.take() {
            handle.shutdown();
            let _ = handle.join();
        }
    }
}

#[fixture]
fn world() -> RefCell<DispatchWorld> {
    RefCell::new(DispatchWorld::new())
}

#[given("a control socket serving the sample sections")]
fn given_control_socket(world: &RefCell<DispatchWorld>) {
    world.borrow_mut().start_listener();
}

#[when(r#"the client sends "{line}""#)]
fn when_client_sends(world: &RefCell<DispatchWorld>, line: String) {
    world.borrow_mut().send_line(strip_quotes(&line));
}

#[when("the client sends an empty command")]
fn when_client_sends_empty(world: &RefCell<DispatchWorld>) {
    world.borrow_mut().send_line("");
}

#[then(r#"the reply is "{expected}""#)]
fn then_reply_is(world: &RefCell<DispatchWorld>, expected: String) {
    let expected = format!("{}\n", strip_quotes(&expected));
    assert_eq!(world.borrow().reply(), expected);
}

#[then(r#"the reply is an ok reply for the "{section}" section"#)]
fn then_ok_section(world: &RefCell<DispatchWorld>, section: String) {
    let section = strip_quotes(&section);
    let world = world.borrow();
    let payload = world
        .reply()
        .strip_prefix("ok ")
        .and_then(|rest| rest.strip_suffix('\n'))
        .unwrap_or_else(|| panic!("expected an ok reply, got {:?}", world.reply()));
    let tree: serde_json::Value = serde_json::from_str(payload).expect("payload is JSON");
    assert!(
        tree.get(section).is_some(),
        "expected the {section} section, got {payload}"
    );
}

#[then("no reply is written")]
fn then_no_reply(world: &RefCell<DispatchWorld>) {
    assert_eq!(world.borrow().reply(), "");
}

#[then(r#"the sync channel received "{payload}""#)]
fn then_sync_received(world: &RefCell<DispatchWorld>, payload: String) {
    let world = world.borrow();
    let messages = world.sync.messages.lock().expect("sync mutex poisoned");
    assert_eq!(*messages, vec![strip_quotes(&payload).to_owned()]);
}

#[then("a restart was requested {count} time")]
fn then_restart_count(world: &RefCell<DispatchWorld>, count: usize) {
    assert_eq!(world.borrow().restart.requests.load(Ordering::SeqCst), count);
}

/// Strips surrounding double quotes from a string if present.
fn strip_quotes(s: &str) -> &str {
    s.trim_matches('"')
}

#[scenario(path = "tests/features/control_getconfig.feature")]
fn control_getconfig(#[from(world)] world: RefCell<DispatchWorld>) {
    drop(world);
}

#[scenario(path = "tests/features/control_notifications.feature")]
fn control_notifications(#[from(world)] world: RefCell<DispatchWorld>) {
    drop(world);
}

#[scenario(path = "tests/features/control_errors.feature")]
fn control_errors(#[from(world)] world: RefCell<DispatchWorld>) {
    drop(world);
}
