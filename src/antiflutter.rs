use chrono::{DateTime, Duration, Utc};

/// Minimum interval between user toggles, in milliseconds.
pub const TOGGLE_COOLDOWN_MS: i64 = 1_000;

/// Cooldown gate for the start/stop toggle.
/// - A toggle flips `live` and opens a cooldown window measured from the call.
/// - Toggles inside the window are ignored and do not extend it.
/// - `reset` clears both flags at once, cooldown included.
///
/// The window is not tied to connection progress; a link may still be closing
/// when it ends.
#[derive(Debug, Clone)]
pub struct ToggleGuard {
    cooldown: Duration,
    live: bool,
    cooldown_until: Option<DateTime<Utc>>,
}

impl ToggleGuard {
    /// `cooldown_ms` < 0 is treated as 0 (no cooldown).
    pub fn new(cooldown_ms: i64) -> Self {
        Self {
            cooldown: Duration::milliseconds(cooldown_ms.max(0)),
            live: false,
            cooldown_until: None,
        }
    }

    pub fn live(&self) -> bool {
        self.live
    }

    pub fn cooldown_active(&self, now: DateTime<Utc>) -> bool {
        matches!(self.cooldown_until, Some(until) if now < until)
    }

    /// End of the current window, if one was started and not yet expired.
    pub fn cooldown_deadline(&self) -> Option<DateTime<Utc>> {
        self.cooldown_until
    }

    /// Returns true if the live flag flipped.
    pub fn toggle(&mut self, now: DateTime<Utc>) -> bool {
        if self.cooldown_active(now) {
            tracing::debug!("toggle ignored during cooldown");
            return false;
        }
        self.live = !self.live;
        self.cooldown_until = Some(now + self.cooldown);
        true
    }

    /// Timer expiry. Returns true if a window was cleared.
    pub fn expire(&mut self, now: DateTime<Utc>) -> bool {
        match self.cooldown_until {
            Some(until) if now >= until => {
                self.cooldown_until = None;
                true
            }
            _ => false,
        }
    }

    pub fn reset(&mut self) {
        self.live = false;
        self.cooldown_until = None;
    }
}

impl Default for ToggleGuard {
    fn default() -> Self {
        Self::new(TOGGLE_COOLDOWN_MS)
    }
}
