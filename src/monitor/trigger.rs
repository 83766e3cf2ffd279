//! Manual trigger classification.
//!
//! A lone trigger is a one-shot fix/continue request ("backtick"). A second
//! trigger inside the chain window with nothing typed in between is an
//! "extension": the host should continue from its own last output, so the
//! event replays `last_ai_output` and `extension_context` verbatim.

use std::time::Instant;

use super::Monitor;
use crate::ipc::{Event, TriggerKind};

/// Two triggers this close, with no typing between, chain into an extension.
const EXTENSION_WINDOW_SECS: f64 = 2.0;

pub fn handle_trigger(monitor: &Monitor, now: Instant) {
    let event = {
        let mut s = monitor.lock();

        let is_extension = s
            .last_trigger
            .is_some_and(|t| now.duration_since(t).as_secs_f64() < EXTENSION_WINDOW_SECS)
            && !s.typed_since_trigger;

        s.last_trigger = Some(now);
        s.typed_since_trigger = false;

        let (kind, last_ai_output, extension_context) = if is_extension {
            (
                TriggerKind::Extension,
                Some(s.last_ai_output.clone()),
                Some(s.extension_context.clone()),
            )
        } else {
            (TriggerKind::Backtick, None, None)
        };

        Event::Trigger {
            kind,
            buffer: s.buffer_tail(monitor.config.limits.max_trigger_chars),
            char_count: s.raw_count,
            window: s.window_title.clone(),
            last_ai_output,
            extension_context,
        }
    };
    monitor.events.send(event);
}
