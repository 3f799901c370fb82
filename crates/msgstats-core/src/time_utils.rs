use chrono::DateTime;
use chrono_tz::Tz;
use tracing::{debug, warn};

use crate::error::{Result, StatsError};

// ── System timezone detection ─────────────────────────────────────────────────

/// Detect the IANA timezone name of the running system.
///
/// Uses the `iana-time-zone` crate directly – no subprocess calls.
/// Falls back to `"UTC"` if detection fails.
pub fn get_system_timezone() -> String {
    iana_time_zone::get_timezone().unwrap_or_else(|_| "UTC".to_string())
}

// ── TimezoneHandler ───────────────────────────────────────────────────────────

/// Converts epoch timestamps into local date/times for one configured zone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimezoneHandler {
    tz: Tz,
}

impl TimezoneHandler {
    /// Create a handler for the given IANA timezone name.
    ///
    /// If `tz_name` is not a recognised IANA timezone, falls back to UTC
    /// and logs a warning.
    pub fn new(tz_name: &str) -> Self {
        let tz = tz_name.parse::<Tz>().unwrap_or_else(|_| {
            warn!(
                "TimezoneHandler: unrecognised timezone \"{}\", falling back to UTC",
                tz_name
            );
            Tz::UTC
        });
        Self { tz }
    }

    /// Wrap an already-parsed zone.
    pub fn with_tz(tz: Tz) -> Self {
        Self { tz }
    }

    /// Resolve a user-supplied setting.
    ///
    /// `"auto"` selects the host timezone (UTC when detection fails or the
    /// host reports a name chrono-tz does not know). Any other value must be
    /// a valid IANA identifier.
    pub fn from_setting(setting: &str) -> Result<Self> {
        if setting.eq_ignore_ascii_case("auto") {
            let detected = get_system_timezone();
            debug!(timezone = %detected, "using system timezone");
            return Ok(Self::new(&detected));
        }
        setting
            .parse::<Tz>()
            .map(Self::with_tz)
            .map_err(|_| StatsError::InvalidTimezone(setting.to_string()))
    }

    /// Validate that `tz_name` is a recognised IANA timezone identifier.
    pub fn validate_timezone(tz_name: &str) -> bool {
        tz_name.parse::<Tz>().is_ok()
    }

    /// Interpret Unix epoch seconds as a date/time in the configured zone.
    pub fn localize(&self, epoch_secs: i64) -> Result<DateTime<Tz>> {
        DateTime::from_timestamp(epoch_secs, 0)
            .map(|utc| utc.with_timezone(&self.tz))
            .ok_or_else(|| {
                StatsError::malformed(format!("timestamp {} is out of range", epoch_secs))
            })
    }

    /// The configured zone.
    pub fn tz(&self) -> Tz {
        self.tz
    }

    /// IANA name of the configured zone.
    pub fn name(&self) -> &'static str {
        self.tz.name()
    }
}

impl Default for TimezoneHandler {
    fn default() -> Self {
        Self::with_tz(Tz::UTC)
    }
}

// ── Tests ──────────────────────────────────────────────────────────────────────
