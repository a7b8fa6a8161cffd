// Copyright 2024 TiKV Project Authors. Licensed under Apache-2.0.

use std::{collections::HashMap, fmt, str::FromStr, time::Duration};

use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

use crate::metapb::StoreLabel;

/// Label-property rule forbidding leadership transfer to matching stores.
pub const REJECT_LEADER: &str = "reject-leader";

/// Tunable thresholds the filters consult. Implemented by [`Config`]; tests
/// and embedders may supply their own.
pub trait Options: Send + Sync {
    fn max_store_down_time(&self) -> Duration;
    fn max_pending_peer_count(&self) -> u64;
    fn max_snapshot_count(&self) -> u64;
    fn low_space_ratio(&self) -> f64;
    /// Whether the store labels match the named label-property rule.
    fn check_label_property(&self, rule: &str, labels: &[StoreLabel]) -> bool;
}

/// A duration that reads and writes as `"1d2h3m4s5ms"`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord)]
pub struct ReadableDuration(pub Duration);

impl From<ReadableDuration> for Duration {
    fn from(d: ReadableDuration) -> Duration {
        d.0
    }
}

impl ReadableDuration {
    pub const fn millis(ms: u64) -> ReadableDuration {
        ReadableDuration(Duration::from_millis(ms))
    }

    pub const fn secs(secs: u64) -> ReadableDuration {
        ReadableDuration(Duration::from_secs(secs))
    }

    pub const fn minutes(m: u64) -> ReadableDuration {
        ReadableDuration::secs(m * 60)
    }

    pub const fn hours(h: u64) -> ReadableDuration {
        ReadableDuration::minutes(h * 60)
    }

    pub fn as_secs(&self) -> u64 {
        self.0.as_secs()
    }
}

const UNITS: [(u64, &str); 5] = [
    (24 * 60 * 60 * 1_000, "d"),
    (60 * 60 * 1_000, "h"),
    (60 * 1_000, "m"),
    (1_000, "s"),
    (1, "ms"),
];

impl fmt::Display for ReadableDuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut ms = self.0.as_millis() as u64;
        if ms == 0 {
            return write!(f, "0s");
        }
        for (unit, suffix) in UNITS {
            if ms >= unit {
                write!(f, "{}{}", ms / unit, suffix)?;
                ms %= unit;
            }
        }
        Ok(())
    }
}

impl FromStr for ReadableDuration {
    type Err = String;

    fn from_str(s: &str) -> Result<ReadableDuration, String> {
        let s = s.trim();
        if s.is_empty() {
            return Err("duration is empty".to_owned());
        }
        let mut ms = 0u64;
        let mut num = 0u64;
        let mut has_num = false;
        let mut chars = s.chars().peekable();
        while let Some(c) = chars.next() {
            if let Some(d) = c.to_digit(10) {
                num = num * 10 + u64::from(d);
                has_num = true;
                continue;
            }
            if !has_num {
                return Err(format!("expect a number before unit in {:?}", s));
            }
            let unit = match c {
                'd' => 24 * 60 * 60 * 1_000,
                'h' => 60 * 60 * 1_000,
                'm' => {
                    if chars.peek() == Some(&'s') {
                        chars.next();
                        1
                    } else {
                        60 * 1_000
                    }
                }
                's' => 1_000,
                _ => return Err(format!("unknown unit {:?} in duration {:?}", c, s)),
            };
            ms += num * unit;
            num = 0;
            has_num = false;
        }
        if has_num {
            return Err(format!("trailing number without unit in {:?}", s));
        }
        Ok(ReadableDuration(Duration::from_millis(ms)))
    }
}

impl Serialize for ReadableDuration {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for ReadableDuration {
    fn deserialize<D>(deserializer: D) -> Result<ReadableDuration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(de::Error::custom)
    }
}

/// One key/value pair of a label-property rule.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub struct LabelProperty {
    pub key: String,
    pub value: String,
}

#[derive(Clone, Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("low-space-ratio {0} must be within (0, 1]")]
    LowSpaceRatio(f64),
}

/// Scheduling thresholds, loadable from toml.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
#[serde(default, rename_all = "kebab-case")]
pub struct Config {
    pub max_store_down_time: ReadableDuration,
    pub max_pending_peer_count: u64,
    pub max_snapshot_count: u64,
    pub low_space_ratio: f64,
    /// Rule name -> label pairs. A store matches a rule when any configured
    /// pair appears among its labels.
    pub label_property: HashMap<String, Vec<LabelProperty>>,
}

impl Default for Config {
    fn default() -> Config {
        Config {
            max_store_down_time: ReadableDuration::minutes(30),
            max_pending_peer_count: 16,
            max_snapshot_count: 3,
            low_space_ratio: 0.8,
            label_property: HashMap::new(),
        }
    }
}

impl Config {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.low_space_ratio > 0.0 && self.low_space_ratio <= 1.0) {
            return Err(ConfigError::LowSpaceRatio(self.low_space_ratio));
        }
        Ok(())
    }
}

impl Options for Config {
    fn max_store_down_time(&self) -> Duration {
        self.max_store_down_time.0
    }

    fn max_pending_peer_count(&self) -> u64 {
        self.max_pending_peer_count
    }

    fn max_snapshot_count(&self) -> u64 {
        self.max_snapshot_count
    }

    fn low_space_ratio(&self) -> f64 {
        self.low_space_ratio
    }

    fn check_label_property(&self, rule: &str, labels: &[StoreLabel]) -> bool {
        self.label_property.get(rule).map_or(false, |props| {
            props.iter().any(|p| {
                labels
                    .iter()
                    .any(|l| l.key.eq_ignore_ascii_case(&p.key) && l.value == p.value)
            })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_readable_duration_display() {
        assert_eq!(ReadableDuration::secs(0).to_string(), "0s");
        assert_eq!(ReadableDuration::secs(30).to_string(), "30s");
        assert_eq!(ReadableDuration::minutes(30).to_string(), "30m");
        assert_eq!(ReadableDuration::hours(25).to_string(), "1d1h");
        assert_eq!(ReadableDuration::millis(90_500).to_string(), "1m30s500ms");
    }

    #[test]
    fn test_readable_duration_parse() {
        assert_eq!("30m".parse(), Ok(ReadableDuration::minutes(30)));
        assert_eq!("1h30m".parse(), Ok(ReadableDuration::minutes(90)));
        assert_eq!("500ms".parse(), Ok(ReadableDuration::millis(500)));
        assert_eq!("1d".parse(), Ok(ReadableDuration::hours(24)));
        assert!("".parse::<ReadableDuration>().is_err());
        assert!("h".parse::<ReadableDuration>().is_err());
        assert!("30".parse::<ReadableDuration>().is_err());
        assert!("30x".parse::<ReadableDuration>().is_err());
    }

    #[test]
    fn test_config_toml_round_trip() {
        let text = r#"
            max-store-down-time = "1h"
            max-pending-peer-count = 8
            max-snapshot-count = 5
            low-space-ratio = 0.75

            [[label-property.reject-leader]]
            key = "zone"
            value = "z1"
        "#;
        let config: Config = toml::from_str(text).unwrap();
        assert_eq!(config.max_store_down_time, ReadableDuration::hours(1));
        assert_eq!(config.max_pending_peer_count, 8);
        assert_eq!(config.max_snapshot_count, 5);
        assert_eq!(config.low_space_ratio, 0.75);
        assert_eq!(config.label_property[REJECT_LEADER].len(), 1);

        let rendered = toml::to_string(&config).unwrap();
        let reparsed: Config = toml::from_str(&rendered).unwrap();
        assert_eq!(reparsed, config);
    }

    #[test]
    fn test_config_defaults_and_validate() {
        let config = Config::default();
        assert_eq!(config.max_store_down_time, ReadableDuration::minutes(30));
        assert_eq!(config.max_pending_peer_count, 16);
        assert_eq!(config.max_snapshot_count, 3);
        assert_eq!(config.low_space_ratio, 0.8);
        config.validate().unwrap();

        let mut bad = config.clone();
        bad.low_space_ratio = 0.0;
        assert_eq!(bad.validate(), Err(ConfigError::LowSpaceRatio(0.0)));
        bad.low_space_ratio = 1.5;
        assert!(bad.validate().is_err());
    }

    #[test]
    fn test_check_label_property() {
        let mut config = Config::default();
        config.label_property.insert(
            REJECT_LEADER.to_owned(),
            vec![LabelProperty {
                key: "zone".to_owned(),
                value: "z1".to_owned(),
            }],
        );

        let matching = vec![StoreLabel::new("Zone", "z1"), StoreLabel::new("host", "h1")];
        let other = vec![StoreLabel::new("zone", "z2")];
        assert!(config.check_label_property(REJECT_LEADER, &matching));
        assert!(!config.check_label_property(REJECT_LEADER, &other));
        assert!(!config.check_label_property("unknown-rule", &matching));
    }
}
