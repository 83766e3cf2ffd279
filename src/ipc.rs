//! Host protocol - newline-delimited JSON over the standard streams.
//!
//! Commands arrive on stdin, events leave on stdout. Every event funnels
//! through one channel into a single writer thread, so each line is one
//! atomic write no matter which thread produced it. stderr stays free for
//! diagnostics.

use serde::{Deserialize, Serialize};
use std::io::Write;

/// Commands from the host process.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "cmd", rename_all = "snake_case")]
pub enum Command {
    Reset,
    SetAiOutput {
        #[serde(default)]
        output: String,
        #[serde(default)]
        context: String,
    },
    GetBuffer,
    Shutdown,
    Ping,
    Trigger,
    SetLiveMode {
        #[serde(default)]
        enabled: bool,
    },
}

/// Events sent to the host process.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum Event {
    Started {
        pid: u32,
    },
    WindowChange {
        old_window: String,
        new_window: String,
        is_private: bool,
    },
    Trigger {
        #[serde(rename = "type")]
        kind: TriggerKind,
        buffer: String,
        char_count: u64,
        window: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        last_ai_output: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        extension_context: Option<String>,
    },
    ResetAck,
    AiOutputSet,
    Buffer {
        buffer: String,
        raw_count: u64,
        window: String,
    },
    Pong,
    ShutdownAck,
    LiveModeSet {
        enabled: bool,
    },
    Error {
        message: String,
    },
    Stopped,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TriggerKind {
    Backtick,
    Extension,
    Live,
}

/// Cloneable handle for emitting events from any thread.
#[derive(Clone)]
pub struct EventSender(flume::Sender<Event>);

impl EventSender {
    pub fn send(&self, event: Event) {
        // A closed channel means we are shutting down; nothing to report
        let _ = self.0.send(event);
    }

    pub fn error(&self, message: impl Into<String>) {
        self.send(Event::Error {
            message: message.into(),
        });
    }
}

pub fn channel() -> (EventSender, flume::Receiver<Event>) {
    let (tx, rx) = flume::unbounded();
    (EventSender(tx), rx)
}

/// Writer loop: one encoded line per event. Exits after `stopped` so the
/// main thread can join it even while other components still hold senders.
pub fn run_writer(rx: flume::Receiver<Event>) {
    let stdout = std::io::stdout();
    while let Ok(event) = rx.recv() {
        let done = matches!(event, Event::Stopped);
        match serde_json::to_string(&event) {
            Ok(line) => {
                let mut out = stdout.lock();
                let _ = writeln!(out, "{line}");
                let _ = out.flush();
            }
            Err(e) => eprintln!("[IPC] encode failed: {e}"),
        }
        if done {
            break;
        }
    }
}
