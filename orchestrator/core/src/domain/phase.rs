// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Day/night phase of a pulse. Recomputed on every invocation; nothing persists.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Timelike, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Day,
    Night,
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unrecognized phase '{0}' (expected 'day' or 'night')")]
pub struct UnknownPhase(pub String);

impl Phase {
    /// `[day_start, night_start)` is day; every other hour is night.
    pub fn for_hour(hour: u32, day_start: u32, night_start: u32) -> Self {
        if (day_start..night_start).contains(&hour) {
            Phase::Day
        } else {
            Phase::Night
        }
    }

    pub fn at(now: DateTime<Utc>, day_start: u32, night_start: u32) -> Self {
        Self::for_hour(now.hour(), day_start, night_start)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Day => "day",
            Phase::Night => "night",
        }
    }
}

impl FromStr for Phase {
    type Err = UnknownPhase;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "day" => Ok(Phase::Day),
            "night" => Ok(Phase::Night),
            _ => Err(UnknownPhase(s.to_string())),
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn day_interval_is_half_open() {
        assert_eq!(Phase::for_hour(7, 8, 20), Phase::Night);
        assert_eq!(Phase::for_hour(8, 8, 20), Phase::Day);
        assert_eq!(Phase::for_hour(19, 8, 20), Phase::Day);
        assert_eq!(Phase::for_hour(20, 8, 20), Phase::Night);
        assert_eq!(Phase::for_hour(0, 8, 20), Phase::Night);
    }

    #[test]
    fn parses_case_insensitively() {
        assert_eq!("NIGHT".parse::<Phase>(), Ok(Phase::Night));
        assert_eq!("dusk".parse::<Phase>(), Err(UnknownPhase("dusk".into())));
    }
}
