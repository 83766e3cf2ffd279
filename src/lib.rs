//! keycue - system-wide keystroke capture that cues AI suggestions.
//!
//! Watches typing across foreground applications, reconstructs the intended
//! text (backspace-aware), journals completed fragments, and tells a host
//! process over stdin/stdout JSON when the user wants - or has paused long
//! enough to earn - an AI suggestion. Sensitive windows (banking, password
//! managers, login pages) are never captured.

pub mod config;
pub mod ipc;
pub mod monitor;
pub mod state;
