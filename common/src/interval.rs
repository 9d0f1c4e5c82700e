// Run interval parsing and formatting
//
// Intervals are written as one or more `<integer><unit>` segments, units being
// `h`, `m`, `s` and `ms` (e.g. "10m", "1h30m", "1500ms").

use crate::errors::ValidationError;
use chrono::Duration;
use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

const MS_PER_SECOND: i64 = 1_000;
const MS_PER_MINUTE: i64 = 60 * MS_PER_SECOND;
const MS_PER_HOUR: i64 = 60 * MS_PER_MINUTE;

/// Longest accepted interval: 100 years of 365 days
pub const MAX_INTERVAL_MS: i64 = 100 * 365 * 24 * MS_PER_HOUR;

fn segment_regex() -> &'static Regex {
    static SEGMENT: OnceLock<Regex> = OnceLock::new();
    SEGMENT.get_or_init(|| Regex::new(r"(\d+)(ms|h|m|s)").expect("interval segment regex is valid"))
}

/// Positive duration between two runs of a job
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RunInterval(Duration);

impl RunInterval {
    /// Build an interval from a millisecond count; rejects zero and negatives
    pub fn from_millis(millis: i64) -> Result<Self, ValidationError> {
        if millis <= 0 {
            return Err(ValidationError::InvalidInterval {
                input: format!("{}ms", millis),
                reason: "interval must be positive".to_string(),
            });
        }
        if millis > MAX_INTERVAL_MS {
            return Err(ValidationError::InvalidInterval {
                input: format!("{}ms", millis),
                reason: "interval must not exceed 100 years".to_string(),
            });
        }
        Ok(Self(Duration::milliseconds(millis)))
    }

    pub fn as_duration(&self) -> Duration {
        self.0
    }

    pub fn as_millis(&self) -> i64 {
        self.0.num_milliseconds()
    }

    /// `factor · interval`, rounded to the millisecond
    pub fn scaled(&self, factor: f64) -> Duration {
        Duration::milliseconds((self.as_millis() as f64 * factor).round() as i64)
    }
}

impl FromStr for RunInterval {
    type Err = ValidationError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let invalid = |reason: &str| ValidationError::InvalidInterval {
            input: input.to_string(),
            reason: reason.to_string(),
        };

        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(invalid("interval is empty"));
        }

        let mut total: i64 = 0;
        let mut consumed = 0;
        for cap in segment_regex().captures_iter(trimmed) {
            let whole = cap.get(0).map(|m| m.range()).unwrap_or(0..0);
            if whole.start != consumed {
                return Err(invalid("unexpected characters"));
            }
            consumed = whole.end;

            let amount: i64 = cap[1].parse().map_err(|_| invalid("amount out of range"))?;
            let unit = match &cap[2] {
                "h" => MS_PER_HOUR,
                "m" => MS_PER_MINUTE,
                "s" => MS_PER_SECOND,
                _ => 1,
            };
            total = amount
                .checked_mul(unit)
                .and_then(|ms| total.checked_add(ms))
                .ok_or_else(|| invalid("amount out of range"))?;
        }

        if consumed != trimmed.len() {
            return Err(invalid("expected segments like 10m, 1h30m or 500ms"));
        }
        if total == 0 {
            return Err(invalid("interval must be positive"));
        }
        if total > MAX_INTERVAL_MS {
            return Err(invalid("interval must not exceed 100 years"));
        }

        Ok(Self(Duration::milliseconds(total)))
    }
}

impl fmt::Display for RunInterval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut rest = self.as_millis();
        for (unit, suffix) in [
            (MS_PER_HOUR, "h"),
            (MS_PER_MINUTE, "m"),
            (MS_PER_SECOND, "s"),
            (1, "ms"),
        ] {
            if rest >= unit {
                write!(f, "{}{}", rest / unit, suffix)?;
                rest %= unit;
            }
        }
        Ok(())
    }
}

impl Serialize for RunInterval {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for RunInterval {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_single_segments() {
        assert_eq!("10m".parse::<RunInterval>().unwrap().as_millis(), 600_000);
        assert_eq!("2h".parse::<RunInterval>().unwrap().as_millis(), 7_200_000);
        assert_eq!("45s".parse::<RunInterval>().unwrap().as_millis(), 45_000);
        assert_eq!("250ms".parse::<RunInterval>().unwrap().as_millis(), 250);
    }

    #[test]
    fn test_parse_compound() {
        let interval: RunInterval = "1h30m15s".parse().unwrap();
        assert_eq!(interval.as_millis(), 5_415_000);
    }

    #[test]
    fn test_rejects_malformed() {
        for input in ["", "10", "m", "10x", "1h 30m", "-5m", "10m!", "abc"] {
            assert!(input.parse::<RunInterval>().is_err(), "{input:?} should fail");
        }
    }

    #[test]
    fn test_rejects_zero() {
        assert!("0s".parse::<RunInterval>().is_err());
        assert!(RunInterval::from_millis(0).is_err());
        assert!(RunInterval::from_millis(-10).is_err());
    }

    #[test]
    fn test_rejects_oversized() {
        assert!("9999999999h".parse::<RunInterval>().is_err());
        assert!("876001h".parse::<RunInterval>().is_err());
        assert!(RunInterval::from_millis(MAX_INTERVAL_MS + 1).is_err());
        assert!(RunInterval::from_millis(i64::MAX).is_err());

        assert_eq!("876000h".parse::<RunInterval>().unwrap().as_millis(), MAX_INTERVAL_MS);
        assert!(RunInterval::from_millis(MAX_INTERVAL_MS).is_ok());
    }

    #[test]
    fn test_display_is_canonical() {
        let interval: RunInterval = "90m".parse().unwrap();
        assert_eq!(interval.to_string(), "1h30m");
        assert_eq!(RunInterval::from_millis(1_500).unwrap().to_string(), "1s500ms");
    }

    #[test]
    fn test_scaled() {
        let interval: RunInterval = "10m".parse().unwrap();
        assert_eq!(interval.scaled(0.9), Duration::seconds(540));
        assert_eq!(interval.scaled(1.1), Duration::seconds(660));
    }

    #[test]
    fn test_serde_as_string() {
        let interval: RunInterval = serde_json::from_str("\"10m\"").unwrap();
        assert_eq!(serde_json::to_string(&interval).unwrap(), "\"10m\"");
        assert!(serde_json::from_str::<RunInterval>("\"nope\"").is_err());
    }
}
