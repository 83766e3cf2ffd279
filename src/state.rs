//! Shared monitor state - the single source of truth for the hook thread,
//! the poll loops and the live timer.
//!
//! Everything a keystroke touches lives behind one mutex. Critical sections
//! stay small: snapshot, mutate, release - all I/O (journal writes, window
//! queries, stdout events) happens after the lock is dropped.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Instant;

use crate::config::Config;

pub struct MonitorState {
    // ------------------------------------------------------------------
    // Typing buffer
    // ------------------------------------------------------------------
    /// Reconstructed text since the last window switch or reset
    pub buffer: VecDeque<char>,
    /// Physical key events since the last reset (telemetry only)
    pub raw_count: u64,

    // ------------------------------------------------------------------
    // Window tracking
    // ------------------------------------------------------------------
    pub window_title: String,
    pub window_process: String,
    pub is_private: bool,
    /// Keystrokes since the last in-hook window re-check
    pub key_counter: u32,

    // ------------------------------------------------------------------
    // Trigger state
    // ------------------------------------------------------------------
    pub last_trigger: Option<Instant>,
    /// Any character/backspace/enter since the last trigger breaks the
    /// double-trigger chain
    pub typed_since_trigger: bool,

    // ------------------------------------------------------------------
    // Extension context (supplied by the host after a generation)
    // ------------------------------------------------------------------
    pub last_ai_output: String,
    pub extension_context: String,

    // ------------------------------------------------------------------
    // Pending journal fragment
    // ------------------------------------------------------------------
    pub pending_text: String,
    pub pending_window: String,
    pub last_keystroke: Option<Instant>,

    // ------------------------------------------------------------------
    // Live mode
    // ------------------------------------------------------------------
    pub live_enabled: bool,
    /// A live suggestion has fired and not yet been invalidated by typing
    pub live_pending: bool,
    /// Bumped on every arm/cancel; a timer firing with a stale generation
    /// is a no-op
    pub live_generation: u64,
    pub speed_samples: VecDeque<f64>,
    pub adaptive_threshold: f64,
    pub last_key_time: Option<Instant>,

    max_buffer_chars: usize,
    max_samples: usize,
}

pub type SharedState = Arc<Mutex<MonitorState>>;

impl MonitorState {
    pub fn new(config: &Config) -> Self {
        Self {
            buffer: VecDeque::new(),
            raw_count: 0,
            window_title: String::new(),
            window_process: String::new(),
            is_private: false,
            key_counter: 0,
            last_trigger: None,
            typed_since_trigger: true,
            last_ai_output: String::new(),
            extension_context: String::new(),
            pending_text: String::new(),
            pending_window: String::new(),
            last_keystroke: None,
            live_enabled: false,
            live_pending: false,
            live_generation: 0,
            speed_samples: VecDeque::new(),
            adaptive_threshold: config.timing.pause_threshold_secs,
            last_key_time: None,
            max_buffer_chars: config.limits.max_buffer_chars,
            max_samples: config.live.max_samples,
        }
    }

    pub fn shared(config: &Config) -> SharedState {
        Arc::new(Mutex::new(Self::new(config)))
    }

    /// Append a character, dropping the oldest once the cap is reached.
    pub fn push_char(&mut self, c: char) {
        if self.buffer.len() >= self.max_buffer_chars {
            self.buffer.pop_front();
        }
        self.buffer.push_back(c);
    }

    pub fn buffer_text(&self) -> String {
        self.buffer.iter().collect()
    }

    /// Last `max` characters of the buffer.
    pub fn buffer_tail(&self, max: usize) -> String {
        let skip = self.buffer.len().saturating_sub(max);
        self.buffer.iter().skip(skip).collect()
    }

    /// Record an inter-keystroke interval in the rolling cadence window.
    pub fn push_speed_sample(&mut self, secs: f64) {
        if self.speed_samples.len() >= self.max_samples {
            self.speed_samples.pop_front();
        }
        self.speed_samples.push_back(secs);
    }

    /// Clear the typing buffer and trigger/extension state (window switch,
    /// host reset).
    pub fn reset_buffer(&mut self) {
        self.buffer.clear();
        self.raw_count = 0;
        self.typed_since_trigger = true;
        self.last_ai_output.clear();
        self.extension_context.clear();
    }

    /// Take ownership of the pending fragment, leaving it empty. Whoever
    /// takes it is the only writer allowed to journal it - this is what
    /// keeps a window-change flush and a pause flush from saving the same
    /// text twice.
    pub fn take_pending(&mut self) -> Option<(String, String)> {
        if self.pending_text.is_empty() {
            return None;
        }
        Some((
            std::mem::take(&mut self.pending_text),
            std::mem::take(&mut self.pending_window),
        ))
    }
}
