//! Scripted installer session for orchestration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use rauc_client_core::{
    CompletionCallback, Endpoint, Error, EventClass, EventSink, InstallContext,
    InstallerConnector, InstallerSession, Progress, PropertyChanges, Result, ResultCode,
    SessionEvent, StatusCallback,
};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc as std_mpsc;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;

/// Events a scripted installer emits for a bundle, with a delay before each.
pub type Script = Arc<dyn Fn(&str) -> Vec<(Duration, SessionEvent)> + Send + Sync>;

/// Build a [`Script`] from a closure.
pub fn script<F>(f: F) -> Script
where
    F: Fn(&str) -> Vec<(Duration, SessionEvent)> + Send + Sync + 'static,
{
    Arc::new(f)
}

/// Connector whose sessions replay a script once `install` is called.
pub struct ScriptedConnector {
    script: Script,
    fail_connect: bool,
    pub connects: AtomicUsize,
    pub disconnects: Arc<AtomicUsize>,
}

impl ScriptedConnector {
    pub fn new(script: Script) -> Self {
        Self {
            script,
            fail_connect: false,
            connects: AtomicUsize::new(0),
            disconnects: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn unreachable() -> Self {
        Self {
            fail_connect: true,
            ..Self::new(script(|_| Vec::new()))
        }
    }
}

#[async_trait]
impl InstallerConnector for ScriptedConnector {
    async fn connect(
        &self,
        _endpoint: &Endpoint,
        executor: Handle,
    ) -> Result<Box<dyn InstallerSession>> {
        self.connects.fetch_add(1, Ordering::SeqCst);
        if self.fail_connect {
            return Err(Error::Connection("The name is not activatable".to_string()));
        }
        Ok(Box::new(ScriptedSession {
            script: self.script.clone(),
            executor,
            sinks: Mutex::new(HashMap::new()),
            pumps: Mutex::new(Vec::new()),
            disconnects: self.disconnects.clone(),
        }))
    }
}

struct ScriptedSession {
    script: Script,
    executor: Handle,
    sinks: Mutex<HashMap<EventClass, EventSink>>,
    pumps: Mutex<Vec<JoinHandle<()>>>,
    disconnects: Arc<AtomicUsize>,
}

#[async_trait]
impl InstallerSession for ScriptedSession {
    async fn subscribe(&mut self, class: EventClass, sink: EventSink) -> Result<()> {
        self.sinks.lock().unwrap().insert(class, sink);
        Ok(())
    }

    async fn install(&self, bundle: &str) -> Result<()> {
        let steps = (self.script)(bundle);
        let sinks = std::mem::take(&mut *self.sinks.lock().unwrap());
        let pump = self.executor.spawn(async move {
            for (delay, event) in steps {
                if !delay.is_zero() {
                    tokio::time::sleep(delay).await;
                }
                if let Some(sink) = sinks.get(&event.class()) {
                    let _ = sink.send(event);
                }
            }
        });
        self.pumps.lock().unwrap().push(pump);
        Ok(())
    }

    fn disconnect_all(&mut self) {
        self.sinks.lock().unwrap().clear();
        for pump in self.pumps.lock().unwrap().drain(..) {
            pump.abort();
        }
        self.disconnects.fetch_add(1, Ordering::SeqCst);
    }
}

pub fn operation(name: &str) -> SessionEvent {
    SessionEvent::PropertiesChanged(PropertyChanges {
        operation: Some(name.to_string()),
        ..Default::default()
    })
}

pub fn progress(percentage: i32, message: &str) -> SessionEvent {
    SessionEvent::PropertiesChanged(PropertyChanges {
        progress: Some(Progress {
            percentage,
            message: message.to_string(),
            depth: 1,
        }),
        ..Default::default()
    })
}

pub fn last_error(message: &str) -> SessionEvent {
    SessionEvent::PropertiesChanged(PropertyChanges {
        last_error: Some(message.to_string()),
        ..Default::default()
    })
}

/// What a caller saw from one install.
#[derive(Debug, Default)]
pub struct Observed {
    pub statuses: Vec<String>,
    pub status_calls: usize,
    pub completions: Vec<ResultCode>,
}

/// Callbacks that record into a shared [`Observed`] and signal completion.
pub fn recording_callbacks() -> (
    StatusCallback,
    CompletionCallback,
    Arc<Mutex<Observed>>,
    std_mpsc::Receiver<ResultCode>,
) {
    let observed = Arc::new(Mutex::new(Observed::default()));
    let (done_tx, done_rx) = std_mpsc::channel();

    let status_sink = observed.clone();
    let on_status: StatusCallback = Arc::new(move |ctx: &InstallContext| {
        let mut observed = status_sink.lock().unwrap();
        observed.status_calls += 1;
        observed.statuses.extend(ctx.drain_status());
    });

    let complete_sink = observed.clone();
    let on_complete: CompletionCallback = Box::new(move |ctx: &InstallContext| {
        let result = ctx.result();
        let mut observed = complete_sink.lock().unwrap();
        observed.statuses.extend(ctx.drain_status());
        observed.completions.push(result);
        let _ = done_tx.send(result);
    });

    (on_status, on_complete, observed, done_rx)
}

pub const WAIT: Duration = Duration::from_secs(10);
