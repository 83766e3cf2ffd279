//! Foreground-window tracking and privacy filtering.
//!
//! The OS query lives behind [`active_window`]; everything that mutates
//! state goes through [`apply_window`], which the poll loop, the in-hook
//! re-check and the tests all share.

use super::{journal, Monitor};
use crate::config::PrivacyConfig;
use crate::ipc::Event;

/// Substring denylist check, case-insensitive. App patterns match the
/// process name or the title; keyword patterns match the title only.
pub fn is_private(privacy: &PrivacyConfig, title: &str, process: &str) -> bool {
    let title = title.to_lowercase();
    let process = process.to_lowercase();

    privacy
        .apps
        .iter()
        .any(|app| process.contains(app.as_str()) || title.contains(app.as_str()))
        || privacy
            .title_keywords
            .iter()
            .any(|kw| title.contains(kw.as_str()))
}

/// Poll the OS and apply the result. Returns whether the window changed.
pub fn check_change(monitor: &Monitor) -> bool {
    let (title, process) = active_window();
    apply_window(monitor, title, process)
}

/// Update state for a (possibly unchanged) foreground window. On a change:
/// flush the pending fragment, reset the typing buffer and trigger state,
/// reclassify privacy, notify the host.
pub fn apply_window(monitor: &Monitor, title: String, process: String) -> bool {
    let (old_window, flush, private) = {
        let mut s = monitor.lock();
        if title == s.window_title && process == s.window_process {
            return false;
        }

        let flush = s.take_pending();
        let old_window = std::mem::replace(&mut s.window_title, title.clone());
        s.window_process = process;
        s.is_private = is_private(&monitor.config.privacy, &s.window_title, &s.window_process);
        s.reset_buffer();
        (old_window, flush, s.is_private)
    };

    if let Some((text, win)) = flush {
        journal::save_async(monitor, text, win);
    }

    if monitor.verbose {
        eprintln!("[WINDOW] {:?} (private: {})", title, private);
    }
    monitor.events.send(Event::WindowChange {
        old_window,
        new_window: title,
        is_private: private,
    });
    true
}

/// Current foreground window as `(title, process_name)`.
///
/// Any failure yields `("", "")`: an unknown window is still captured (the
/// classifier fails open), but entries carry the empty tag so the host can
/// filter them.
#[cfg(target_os = "windows")]
pub fn active_window() -> (String, String) {
    use windows::Win32::UI::WindowsAndMessaging::{
        GetForegroundWindow, GetWindowTextW, GetWindowThreadProcessId,
    };

    unsafe {
        let hwnd = GetForegroundWindow();
        if hwnd.0 == 0 {
            return (String::new(), String::new());
        }

        let mut title_buf = [0u16; 512];
        let len = GetWindowTextW(hwnd, &mut title_buf);
        let title = String::from_utf16_lossy(&title_buf[..len.max(0) as usize]);

        let mut pid = 0u32;
        GetWindowThreadProcessId(hwnd, Some(&mut pid));
        let process = if pid != 0 {
            process_name(pid).unwrap_or_default()
        } else {
            String::new()
        };

        (title, process)
    }
}

#[cfg(target_os = "windows")]
fn process_name(pid: u32) -> Option<String> {
    use windows::core::PWSTR;
    use windows::Win32::Foundation::CloseHandle;
    use windows::Win32::System::Threading::{
        OpenProcess, QueryFullProcessImageNameW, PROCESS_NAME_WIN32,
        PROCESS_QUERY_LIMITED_INFORMATION,
    };

    unsafe {
        let handle = OpenProcess(PROCESS_QUERY_LIMITED_INFORMATION, false, pid).ok()?;
        let mut path = [0u16; 1024];
        let mut size = path.len() as u32;
        let result = QueryFullProcessImageNameW(
            handle,
            PROCESS_NAME_WIN32,
            PWSTR(path.as_mut_ptr()),
            &mut size,
        );
        let _ = CloseHandle(handle);
        result.ok()?;

        let full = String::from_utf16_lossy(&path[..size as usize]);
        let name = full.rsplit(['\\', '/']).next()?.to_lowercase();
        Some(name)
    }
}

#[cfg(not(target_os = "windows"))]
pub fn active_window() -> (String, String) {
    (String::new(), String::new())
}
