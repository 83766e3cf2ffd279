//! Adaptive live-mode controller
//!
//! Tracks typing cadence and fires a suggestion trigger once the user has
//! paused for a threshold proportional to their own typing speed: fast
//! typists get short pauses, slow typists get long ones.
//!
//! The timer is one long-lived thread fed arm/cancel messages over a
//! channel. A generation number travels with every arm; the keystroke path
//! bumps it when the pause window should restart, so a timeout that raced a
//! keystroke fires with a stale generation and does nothing.

use std::time::{Duration, Instant};

use flume::{Receiver, RecvTimeoutError};

use super::Monitor;
use crate::ipc::{Event, TriggerKind};

/// Intervals above this are thinking pauses, not typing cadence.
const SAMPLE_CEILING_SECS: f64 = 2.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerMsg {
    Arm { delay: Duration, generation: u64 },
    Cancel,
    Shutdown,
}

/// Fold this keystroke's inter-key interval into the cadence window and
/// recompute the adaptive threshold once enough samples exist.
pub fn update_speed(monitor: &Monitor, now: Instant) {
    let live = &monitor.config.live;
    let mut s = monitor.lock();

    if let Some(last) = s.last_key_time {
        let interval = now.duration_since(last).as_secs_f64();
        if interval < SAMPLE_CEILING_SECS {
            s.push_speed_sample(interval);
            if s.speed_samples.len() >= live.min_samples {
                let mean =
                    s.speed_samples.iter().sum::<f64>() / s.speed_samples.len() as f64;
                s.adaptive_threshold = (mean * live.adaptive_multiplier)
                    .clamp(live.adaptive_min_secs, live.adaptive_max_secs);
            }
        }
    }
    s.last_key_time = Some(now);
}

/// Restart the pause timer with the current adaptive threshold. Called on
/// every buffer-extending keystroke; a no-op while live mode is off.
pub fn arm_timer(monitor: &Monitor) {
    let (delay, generation) = {
        let mut s = monitor.lock();
        if !s.live_enabled {
            return;
        }
        s.live_pending = false;
        s.live_generation += 1;
        (Duration::from_secs_f64(s.adaptive_threshold), s.live_generation)
    };
    let _ = monitor.timer.send(TimerMsg::Arm { delay, generation });
}

/// Cancel any armed timer (enter key, mode disable).
pub fn cancel_timer(monitor: &Monitor) {
    monitor.lock().live_generation += 1;
    let _ = monitor.timer.send(TimerMsg::Cancel);
}

pub fn set_enabled(monitor: &Monitor, enabled: bool) {
    monitor.lock().live_enabled = enabled;
    if !enabled {
        cancel_timer(monitor);
    }
    monitor.events.send(Event::LiveModeSet { enabled });
}

/// Timer expiry. Emits one live trigger if the arm that scheduled it is
/// still current and the buffer is worth suggesting against.
pub fn fire(monitor: &Monitor, generation: u64) {
    let event = {
        let mut s = monitor.lock();
        if generation != s.live_generation || !s.live_enabled || s.live_pending {
            return;
        }
        if s.buffer.len() < monitor.config.live.min_chars {
            return;
        }
        s.live_pending = true;
        Event::Trigger {
            kind: TriggerKind::Live,
            buffer: s.buffer_tail(monitor.config.limits.max_trigger_chars),
            char_count: s.raw_count,
            window: s.window_title.clone(),
            last_ai_output: None,
            extension_context: None,
        }
    };
    if monitor.verbose {
        eprintln!("[LIVE] fired (generation {generation})");
    }
    monitor.events.send(event);
}

/// Timer thread: disarmed until an arm arrives, then waits out the delay
/// unless re-armed or cancelled first.
pub fn run_live_timer(monitor: Monitor, rx: Receiver<TimerMsg>) {
    loop {
        match rx.recv() {
            Ok(TimerMsg::Arm { delay, generation }) => {
                let mut generation = generation;
                let mut deadline = Instant::now() + delay;
                loop {
                    match rx.recv_deadline(deadline) {
                        Ok(TimerMsg::Arm {
                            delay,
                            generation: g,
                        }) => {
                            generation = g;
                            deadline = Instant::now() + delay;
                        }
                        Ok(TimerMsg::Cancel) => break,
                        Ok(TimerMsg::Shutdown) | Err(RecvTimeoutError::Disconnected) => return,
                        Err(RecvTimeoutError::Timeout) => {
                            fire(&monitor, generation);
                            break;
                        }
                    }
                }
            }
            Ok(TimerMsg::Cancel) => {}
            Ok(TimerMsg::Shutdown) | Err(_) => return,
        }
    }
}
