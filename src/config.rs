use serde::Deserialize;
use std::fs;
use std::path::Path;

#[derive(Debug, Deserialize)]
pub struct Config {
    /// Journal file path (capped rolling JSON array)
    #[serde(default = "default_log_file")]
    pub log_file: String,
    #[serde(default)]
    pub limits: LimitsConfig,
    #[serde(default)]
    pub timing: TimingConfig,
    #[serde(default)]
    pub live: LiveConfig,
    #[serde(default)]
    pub privacy: PrivacyConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_file: default_log_file(),
            limits: LimitsConfig::default(),
            timing: TimingConfig::default(),
            live: LiveConfig::default(),
            privacy: PrivacyConfig::default(),
        }
    }
}

fn default_log_file() -> String {
    "keylog.json".into()
}

// ============================================================================
// Limits Config
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct LimitsConfig {
    /// Max characters kept in the typing buffer (oldest dropped past this)
    #[serde(default = "default_max_buffer_chars")]
    pub max_buffer_chars: usize,

    /// Max entries kept in the journal file
    #[serde(default = "default_max_log_entries")]
    pub max_log_entries: usize,

    /// Max characters per journal entry (longer fragments are segmented)
    #[serde(default = "default_max_entry_chars")]
    pub max_entry_chars: usize,

    /// Max buffer characters attached to a trigger event
    #[serde(default = "default_max_trigger_chars")]
    pub max_trigger_chars: usize,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_buffer_chars: default_max_buffer_chars(),
            max_log_entries: default_max_log_entries(),
            max_entry_chars: default_max_entry_chars(),
            max_trigger_chars: default_max_trigger_chars(),
        }
    }
}

fn default_max_buffer_chars() -> usize {
    10_000
}
fn default_max_log_entries() -> usize {
    500
}
fn default_max_entry_chars() -> usize {
    2_000
}
fn default_max_trigger_chars() -> usize {
    5_000
}

// ============================================================================
// Timing Config
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct TimingConfig {
    /// Seconds of typing silence before the pending fragment is journaled
    #[serde(default = "default_pause_threshold")]
    pub pause_threshold_secs: f64,

    /// Re-check the foreground window from inside the hook every N keystrokes
    #[serde(default = "default_window_check_keystrokes")]
    pub window_check_keystrokes: u32,

    /// Seconds between pause-poll ticks
    #[serde(default = "default_pause_poll")]
    pub pause_poll_secs: f64,

    /// Seconds between foreground-window polls
    #[serde(default = "default_window_poll")]
    pub window_poll_secs: f64,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            pause_threshold_secs: default_pause_threshold(),
            window_check_keystrokes: default_window_check_keystrokes(),
            pause_poll_secs: default_pause_poll(),
            window_poll_secs: default_window_poll(),
        }
    }
}

fn default_pause_threshold() -> f64 {
    1.0
}
fn default_window_check_keystrokes() -> u32 {
    100
}
fn default_pause_poll() -> f64 {
    0.5
}
fn default_window_poll() -> f64 {
    1.0
}

// ============================================================================
// Live Mode Config
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct LiveConfig {
    /// Minimum buffer length before a live suggestion can fire
    #[serde(default = "default_live_min_chars")]
    pub min_chars: usize,

    /// Adaptive pause floor (fast typist)
    #[serde(default = "default_adaptive_min")]
    pub adaptive_min_secs: f64,

    /// Adaptive pause ceiling (slow typist)
    #[serde(default = "default_adaptive_max")]
    pub adaptive_max_secs: f64,

    /// Mean inter-keystroke interval times this gives the pause threshold
    #[serde(default = "default_adaptive_multiplier")]
    pub adaptive_multiplier: f64,

    /// Samples required before the threshold adapts
    #[serde(default = "default_min_samples")]
    pub min_samples: usize,

    /// Rolling window of interval samples
    #[serde(default = "default_max_samples")]
    pub max_samples: usize,
}

impl Default for LiveConfig {
    fn default() -> Self {
        Self {
            min_chars: default_live_min_chars(),
            adaptive_min_secs: default_adaptive_min(),
            adaptive_max_secs: default_adaptive_max(),
            adaptive_multiplier: default_adaptive_multiplier(),
            min_samples: default_min_samples(),
            max_samples: default_max_samples(),
        }
    }
}

fn default_live_min_chars() -> usize {
    3
}
fn default_adaptive_min() -> f64 {
    0.5
}
fn default_adaptive_max() -> f64 {
    2.0
}
fn default_adaptive_multiplier() -> f64 {
    5.0
}
fn default_min_samples() -> usize {
    10
}
fn default_max_samples() -> usize {
    50
}

// ============================================================================
// Privacy Config
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct PrivacyConfig {
    /// Substrings matched against the process name or window title
    #[serde(default = "default_private_apps")]
    pub apps: Vec<String>,

    /// Substrings matched against the window title only
    #[serde(default = "default_private_keywords")]
    pub title_keywords: Vec<String>,
}

impl Default for PrivacyConfig {
    fn default() -> Self {
        Self {
            apps: default_private_apps(),
            title_keywords: default_private_keywords(),
        }
    }
}

impl PrivacyConfig {
    /// Lowercase all patterns so matching stays case-insensitive with
    /// user-supplied lists too.
    pub fn normalize(&mut self) {
        for entry in self.apps.iter_mut().chain(self.title_keywords.iter_mut()) {
            *entry = entry.to_lowercase();
        }
    }
}

fn default_private_apps() -> Vec<String> {
    [
        "google pay",
        "gpay",
        "phonepe",
        "paytm",
        "paypal",
        "bank",
        "banking",
        "netbanking",
        "hdfc",
        "icici",
        "sbi",
        "axis",
        "lastpass",
        "1password",
        "bitwarden",
        "keepass",
        "dashlane",
        "password",
        "credential",
        "vault",
        "authenticator",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

fn default_private_keywords() -> Vec<String> {
    [
        "password",
        "sign in",
        "login",
        "credential",
        "payment",
        "banking",
        "bank account",
        "credit card",
        "debit card",
        "cvv",
        "pin",
        "otp",
        "verification code",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

impl Config {
    pub fn load(path: &Path) -> Self {
        let mut config = if path.exists() {
            fs::read_to_string(path)
                .ok()
                .and_then(|s| match toml::from_str(&s) {
                    Ok(c) => Some(c),
                    Err(e) => {
                        eprintln!(
                            "[CONFIG] {} is invalid ({}), using defaults",
                            path.display(),
                            e
                        );
                        None
                    }
                })
                .unwrap_or_default()
        } else {
            Config::default()
        };

        config.privacy.normalize();
        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_original_limits() {
        let config = Config::default();
        assert_eq!(config.limits.max_buffer_chars, 10_000);
        assert_eq!(config.limits.max_log_entries, 500);
        assert_eq!(config.limits.max_entry_chars, 2_000);
        assert_eq!(config.limits.max_trigger_chars, 5_000);
        assert_eq!(config.timing.window_check_keystrokes, 100);
        assert_eq!(config.live.min_chars, 3);
    }

    #[test]
    fn test_adaptive_bounds_ordered() {
        let config = Config::default();
        assert!(config.live.adaptive_min_secs < config.live.adaptive_max_secs);
    }

    #[test]
    fn test_partial_toml_fills_defaults() {
        let config: Config = toml::from_str(
            r#"
            log_file = "elsewhere.json"

            [timing]
            pause_threshold_secs = 2.5
            "#,
        )
        .unwrap();
        assert_eq!(config.log_file, "elsewhere.json");
        assert_eq!(config.timing.pause_threshold_secs, 2.5);
        assert_eq!(config.timing.window_poll_secs, 1.0);
        assert_eq!(config.limits.max_buffer_chars, 10_000);
    }

    #[test]
    fn test_normalize_lowercases_patterns() {
        let mut privacy = PrivacyConfig {
            apps: vec!["PayPal".into()],
            title_keywords: vec!["Sign In".into()],
        };
        privacy.normalize();
        assert_eq!(privacy.apps, vec!["paypal"]);
        assert_eq!(privacy.title_keywords, vec!["sign in"]);
    }
}
