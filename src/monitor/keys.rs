//! Global key hook
//!
//! `rdev::listen` delivers every keystroke synchronously on its own thread.
//! The handler must stay fast - it mutates state under the lock and hands
//! all I/O to other threads. The backtick key is the manual trigger and is
//! never appended to the buffer.

use std::thread;
use std::time::Instant;

use rdev::{listen, Event as RawEvent, EventType, Key};

use super::{journal, live, trigger, window, Monitor};

/// What a raw key event means to the reconstruction buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyAction {
    Char(char),
    Backspace,
    Enter,
    Trigger,
}

/// Map a raw hook event to an action. Releases, modifiers, navigation keys
/// and multi-char sequences are ignored.
pub fn classify(event: &RawEvent) -> Option<KeyAction> {
    let key = match event.event_type {
        EventType::KeyPress(key) => key,
        _ => return None,
    };

    match key {
        Key::Backspace => Some(KeyAction::Backspace),
        Key::Return | Key::KpReturn => Some(KeyAction::Enter),
        Key::Space => Some(KeyAction::Char(' ')),
        Key::Tab => Some(KeyAction::Char('\t')),
        _ => {
            let name = event.name.as_deref()?;
            let mut chars = name.chars();
            let c = chars.next()?;
            if chars.next().is_some() || c.is_control() {
                return None;
            }
            if c == '`' {
                Some(KeyAction::Trigger)
            } else {
                Some(KeyAction::Char(c))
            }
        }
    }
}

/// Process one keystroke. Ordering inside the hook thread is the only
/// ordering guarantee the engine has, so everything per-key happens here:
/// window re-check, privacy gate, cadence update, buffer edit, journal
/// feed, live-timer arm/cancel.
pub fn handle_key(monitor: &Monitor, action: KeyAction, now: Instant) {
    let recheck = {
        let mut s = monitor.lock();
        s.key_counter += 1;
        if s.key_counter >= monitor.config.timing.window_check_keystrokes {
            s.key_counter = 0;
            true
        } else {
            false
        }
    };
    if recheck {
        window::check_change(monitor);
    }

    // Private window: capture nothing, not even the trigger key
    if monitor.lock().is_private {
        return;
    }

    live::update_speed(monitor, now);

    match action {
        KeyAction::Char(c) => {
            {
                let mut s = monitor.lock();
                s.push_char(c);
                s.raw_count += 1;
                s.typed_since_trigger = true;
                s.live_pending = false;
            }
            journal::add_char(monitor, c, now);
            live::arm_timer(monitor);
        }
        KeyAction::Backspace => {
            {
                let mut s = monitor.lock();
                s.buffer.pop_back();
                s.raw_count += 1;
                s.typed_since_trigger = true;
                s.live_pending = false;
            }
            journal::remove_char(monitor, now);
            live::arm_timer(monitor);
        }
        KeyAction::Enter => {
            {
                let mut s = monitor.lock();
                s.push_char('\n');
                s.raw_count += 1;
                s.typed_since_trigger = true;
                s.live_pending = false;
            }
            journal::add_char(monitor, '\n', now);
            // A completed line is not mid-thought
            live::cancel_timer(monitor);
        }
        KeyAction::Trigger => trigger::handle_trigger(monitor, now),
    }
}

/// Start the hook thread. `listen` blocks for the life of the process, so
/// the handle is only joinable if the hook itself fails.
pub fn start_listener(monitor: Monitor) -> thread::JoinHandle<()> {
    thread::spawn(move || {
        let events = monitor.events.clone();
        let callback = move |event: RawEvent| {
            if !monitor.is_running() {
                return;
            }
            if let Some(action) = classify(&event) {
                handle_key(&monitor, action, Instant::now());
            }
        };
        if let Err(e) = listen(callback) {
            events.error(format!("key hook failed: {e:?}"));
        }
    })
}
