//! Keystroke monitor engine
//!
//! Reconstructs typed text across foreground applications, journals
//! completed fragments on typing pauses, and emits trigger events when the
//! user asks for (or pauses long enough to earn) an AI suggestion.
//!
//! Concurrency layout: one synchronous hook callback, a window-poll loop, a
//! pause-poll loop, one live-timer thread and the stdin command loop all
//! share [`MonitorState`] behind a single mutex. File writes and stdout
//! events always happen outside the lock.

pub mod journal;
pub mod keys;
pub mod live;
pub mod trigger;
pub mod window;

pub use journal::Journal;
pub use keys::KeyAction;
pub use live::{run_live_timer, TimerMsg};

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, MutexGuard};
use std::time::Instant;

use crate::config::Config;
use crate::ipc::{Command, Event, EventSender};
use crate::state::{MonitorState, SharedState};

/// Handle bundling everything the hook, loops and command dispatch need.
/// Cheap to clone - all components share the same underlying state.
#[derive(Clone)]
pub struct Monitor {
    pub config: Arc<Config>,
    pub state: SharedState,
    pub journal: Arc<Journal>,
    pub events: EventSender,
    pub timer: flume::Sender<TimerMsg>,
    pub running: Arc<AtomicBool>,
    pub verbose: bool,
}

impl Monitor {
    pub fn new(config: Arc<Config>, events: EventSender, timer: flume::Sender<TimerMsg>) -> Self {
        let journal = Arc::new(Journal::new(config.log_file.clone().into(), &config.limits));
        Self {
            state: MonitorState::shared(&config),
            journal,
            events,
            timer,
            running: Arc::new(AtomicBool::new(true)),
            verbose: false,
            config,
        }
    }

    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    pub(crate) fn lock(&self) -> MutexGuard<'_, MonitorState> {
        self.state.lock().unwrap()
    }

    /// Dispatch one host command. Every command gets an acknowledging event.
    pub fn handle_command(&self, cmd: Command) {
        if self.verbose {
            eprintln!("[CMD] {:?}", cmd);
        }
        match cmd {
            Command::Reset => {
                let mut s = self.lock();
                s.reset_buffer();
                s.pending_text.clear();
                s.pending_window.clear();
                drop(s);
                self.events.send(Event::ResetAck);
            }
            Command::SetAiOutput { output, context } => {
                let mut s = self.lock();
                s.last_ai_output = output;
                s.extension_context = context;
                drop(s);
                self.events.send(Event::AiOutputSet);
            }
            Command::GetBuffer => {
                let s = self.lock();
                let event = Event::Buffer {
                    buffer: s.buffer_text(),
                    raw_count: s.raw_count,
                    window: s.window_title.clone(),
                };
                drop(s);
                self.events.send(event);
            }
            Command::Shutdown => {
                self.flush_pending_sync();
                self.running.store(false, Ordering::SeqCst);
                self.events.send(Event::ShutdownAck);
            }
            Command::Ping => self.events.send(Event::Pong),
            Command::Trigger => trigger::handle_trigger(self, Instant::now()),
            Command::SetLiveMode { enabled } => live::set_enabled(self, enabled),
        }
    }

    /// Synchronous flush of the pending fragment (shutdown path). Uses the
    /// same ownership transfer as the async flushes, so an in-flight pause
    /// save cannot double-write.
    pub fn flush_pending_sync(&self) {
        let taken = self.lock().take_pending();
        if let Some((text, win)) = taken {
            if let Err(e) = self.journal.save(&text, &win) {
                self.events.error(format!("journal save failed: {e}"));
            }
        }
    }
}
