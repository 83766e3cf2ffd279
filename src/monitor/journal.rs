//! Typed-text journal - accumulates the current fragment and persists it to
//! a capped rolling JSON file on pauses, window switches and shutdown.

use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use std::thread;
use std::time::Instant;

use anyhow::{Context, Result};
use chrono::Local;
use serde::{Deserialize, Serialize};

use super::Monitor;
use crate::config::LimitsConfig;

/// Window strings in entries are clipped to this many characters.
const MAX_WINDOW_CHARS: usize = 200;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JournalEntry {
    pub timestamp: String,
    pub text: String,
    pub window: String,
}

pub struct Journal {
    path: PathBuf,
    max_entries: usize,
    max_entry_chars: usize,
}

impl Journal {
    pub fn new(path: PathBuf, limits: &LimitsConfig) -> Self {
        Self {
            path,
            max_entries: limits.max_log_entries,
            max_entry_chars: limits.max_entry_chars,
        }
    }

    /// Append one entry, keeping only the newest `max_entries`.
    ///
    /// The file is read, extended and rewritten wholesale. Not crash-atomic:
    /// a crash mid-rewrite can lose the tail of the journal.
    pub fn save(&self, text: &str, window: &str) -> Result<()> {
        let text = text.trim();
        if text.is_empty() {
            return Ok(());
        }
        let text: String = text.chars().take(self.max_entry_chars).collect();
        let window: String = window.chars().take(MAX_WINDOW_CHARS).collect();

        let mut entries = self.read_entries();
        entries.push(JournalEntry {
            timestamp: Local::now().to_rfc3339(),
            text,
            window,
        });
        if entries.len() > self.max_entries {
            let excess = entries.len() - self.max_entries;
            entries.drain(..excess);
        }

        let encoded = serde_json::to_string(&entries)?;
        fs::write(&self.path, encoded)
            .with_context(|| format!("writing {}", self.path.display()))?;
        Ok(())
    }

    /// Current journal contents. A missing or unparsable file reads as
    /// empty - the next save starts the journal over.
    pub fn read_entries(&self) -> Vec<JournalEntry> {
        fs::read_to_string(&self.path)
            .ok()
            .and_then(|s| serde_json::from_str(&s).ok())
            .unwrap_or_default()
    }
}

/// Fire-and-forget save. The caller has already taken ownership of the
/// fragment, so the worst a failure costs is this one entry; the error is
/// reported to the host.
pub fn save_async(monitor: &Monitor, text: String, window: String) {
    let journal = Arc::clone(&monitor.journal);
    let events = monitor.events.clone();
    thread::spawn(move || {
        if let Err(e) = journal.save(&text, &window) {
            events.error(format!("journal save failed: {e}"));
        }
    });
}

/// Append a character to the pending fragment. Hitting the entry cap
/// segments the fragment: the full part is flushed asynchronously and a
/// fresh one starts with this character.
pub fn add_char(monitor: &Monitor, c: char, now: Instant) {
    let full = {
        let mut s = monitor.lock();
        let full = if s.pending_text.chars().count() >= monitor.config.limits.max_entry_chars {
            s.take_pending()
        } else {
            None
        };
        s.pending_text.push(c);
        s.pending_window = s.window_title.clone();
        s.last_keystroke = Some(now);
        full
    };
    if let Some((text, win)) = full {
        save_async(monitor, text, win);
    }
}

/// Backspace: trim the last pending character (no-op when empty) and
/// restamp the keystroke time.
pub fn remove_char(monitor: &Monitor, now: Instant) {
    let mut s = monitor.lock();
    s.pending_text.pop();
    s.last_keystroke = Some(now);
}

/// Pause poll: if typing has been quiet past the threshold, take the
/// fragment and flush it. Taking under the lock makes back-to-back polls
/// (or a racing window-change flush) see an empty fragment.
pub fn check_pause(monitor: &Monitor, now: Instant) {
    let taken = {
        let mut s = monitor.lock();
        match s.last_keystroke {
            Some(last)
                if now.duration_since(last).as_secs_f64()
                    >= monitor.config.timing.pause_threshold_secs =>
            {
                s.take_pending()
            }
            _ => None,
        }
    };
    if let Some((text, win)) = taken {
        if monitor.verbose {
            eprintln!("[JOURNAL] pause flush ({} chars)", text.chars().count());
        }
        save_async(monitor, text, win);
    }
}
