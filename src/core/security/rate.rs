//! Rate limit strings.
//!
//! Accepts `N/unit` and `N per unit` where unit is second, minute, hour or
//! day (plural and case-insensitive).

use std::fmt;
use std::num::NonZeroU32;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Window unit of a rate limit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RatePeriod {
    Second,
    Minute,
    Hour,
    Day,
}

impl RatePeriod {
    fn from_unit(unit: &str) -> Option<Self> {
        match unit.strip_suffix('s').unwrap_or(unit) {
            "second" | "sec" => Some(Self::Second),
            "minute" | "min" => Some(Self::Minute),
            "hour" => Some(Self::Hour),
            "day" => Some(Self::Day),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Second => "second",
            Self::Minute => "minute",
            Self::Hour => "hour",
            Self::Day => "day",
        }
    }

    pub fn duration(self) -> Duration {
        match self {
            Self::Second => Duration::from_secs(1),
            Self::Minute => Duration::from_secs(60),
            Self::Hour => Duration::from_secs(60 * 60),
            Self::Day => Duration::from_secs(24 * 60 * 60),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RateLimitParseError {
    #[error("expected '<count>/<unit>', got '{0}'")]
    Format(String),

    #[error("request count must be a positive integer, got '{0}'")]
    Count(String),

    #[error("unknown time unit '{0}'")]
    Unit(String),
}

/// `requests` per `period`, per caller address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RateLimit {
    requests: NonZeroU32,
    period: RatePeriod,
}

impl RateLimit {
    pub fn new(requests: NonZeroU32, period: RatePeriod) -> Self {
        Self { requests, period }
    }

    pub fn requests(&self) -> u32 {
        self.requests.get()
    }

    pub fn requests_nonzero(&self) -> NonZeroU32 {
        self.requests
    }

    pub fn period(&self) -> RatePeriod {
        self.period
    }
}

impl Default for RateLimit {
    fn default() -> Self {
        Self {
            requests: NonZeroU32::new(100).unwrap_or(NonZeroU32::MIN),
            period: RatePeriod::Minute,
        }
    }
}

impl FromStr for RateLimit {
    type Err = RateLimitParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase();
        let (count, unit) = normalized
            .split_once('/')
            .or_else(|| normalized.split_once(" per "))
            .ok_or_else(|| RateLimitParseError::Format(s.to_string()))?;

        let count = count.trim();
        let requests = count
            .parse::<u32>()
            .ok()
            .and_then(NonZeroU32::new)
            .ok_or_else(|| RateLimitParseError::Count(count.to_string()))?;

        let unit = unit.trim();
        let period =
            RatePeriod::from_unit(unit).ok_or_else(|| RateLimitParseError::Unit(unit.to_string()))?;

        Ok(Self { requests, period })
    }
}

impl fmt::Display for RateLimit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.requests, self.period.as_str())
    }
}

impl TryFrom<String> for RateLimit {
    type Error = RateLimitParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<RateLimit> for String {
    fn from(value: RateLimit) -> Self {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_formats() {
        let cases = [
            ("100/minute", 100, RatePeriod::Minute),
            ("5/second", 5, RatePeriod::Second),
            ("1000/hours", 1000, RatePeriod::Hour),
            ("10 per day", 10, RatePeriod::Day),
            (" 30 / Minutes ", 30, RatePeriod::Minute),
        ];
        for (input, requests, period) in cases {
            let limit: RateLimit = input.parse().unwrap();
            assert_eq!(limit.requests(), requests, "{input}");
            assert_eq!(limit.period(), period, "{input}");
        }
    }

    #[test]
    fn test_parse_errors() {
        assert!(matches!("100".parse::<RateLimit>(), Err(RateLimitParseError::Format(_))));
        assert!(matches!("0/minute".parse::<RateLimit>(), Err(RateLimitParseError::Count(_))));
        assert!(matches!("x/minute".parse::<RateLimit>(), Err(RateLimitParseError::Count(_))));
        assert!(matches!("5/fortnight".parse::<RateLimit>(), Err(RateLimitParseError::Unit(_))));
    }

    #[test]
    fn test_display_and_serde() {
        let limit: RateLimit = "10 per seconds".parse().unwrap();
        assert_eq!(limit.to_string(), "10/second");
        assert_eq!(serde_json::to_value(limit).unwrap(), "10/second");
        let back: RateLimit = serde_json::from_str("\"10/second\"").unwrap();
        assert_eq!(back, limit);
    }
}
