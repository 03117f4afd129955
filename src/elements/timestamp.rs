use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, SecondsFormat, TimeZone, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::TimestampError;

/// Point in time expressed as milliseconds since the Unix epoch.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Timestamp(i64);

impl Timestamp {
    pub const ZERO: Timestamp = Timestamp(0);

    /// 9999-12-31T23:59:59.999Z
    pub const MAX: Timestamp = Timestamp(253_402_300_799_999);

    pub fn now() -> Self {
        Self::from_datetime(&Utc::now())
    }

    pub fn from_datetime(datetime: &DateTime<Utc>) -> Self {
        Self(datetime.timestamp_millis())
    }

    pub const fn from_millis(millis: i64) -> Self {
        Self(millis)
    }

    pub const fn as_millis(&self) -> i64 {
        self.0
    }

    /// A usable epoch timestamp lies strictly after the epoch and no later than `Timestamp::MAX`.
    pub fn is_valid_epoch(&self) -> bool {
        Self::ZERO < *self && *self <= Self::MAX
    }

    pub fn as_utc(&self) -> Option<DateTime<Utc>> {
        Utc.timestamp_millis_opt(self.0).single()
    }

    pub fn to_rfc3339(&self) -> String {
        self.as_utc()
            .map(|dt| dt.to_rfc3339_opts(SecondsFormat::Secs, true))
            .unwrap_or_else(|| self.0.to_string())
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.as_utc() {
            Some(dt) if !f.alternate() => write!(f, "{}", dt.to_rfc3339_opts(SecondsFormat::Millis, true)),
            _ => write!(f, "{}", self.0),
        }
    }
}

impl From<DateTime<Utc>> for Timestamp {
    fn from(datetime: DateTime<Utc>) -> Self {
        Self::from_datetime(&datetime)
    }
}

static MILLIS_FORM: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^-?\d+$").expect("failed to create millis timestamp regex"));

impl FromStr for Timestamp {
    type Err = TimestampError;

    fn from_str(rep: &str) -> Result<Self, Self::Err> {
        let rep = rep.trim();
        if MILLIS_FORM.is_match(rep) {
            return i64::from_str(rep).map(Self).map_err(|err| TimestampError::Parse {
                rep: rep.to_string(),
                reason: err.to_string(),
            });
        }

        DateTime::parse_from_rfc3339(rep)
            .map(|dt| Self::from_datetime(&dt.with_timezone(&Utc)))
            .map_err(|err| TimestampError::Parse { rep: rep.to_string(), reason: err.to_string() })
    }
}
