// Copyright 2025 Fernando Borretti
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use std::fmt::Display;
use std::fmt::Formatter;
use std::str::FromStr;

use crate::error::ErrorKind;
use crate::error::ErrorReport;
use crate::error::Fallible;

/// A recall quality rating, from 0 (total blackout) to 5 (perfect recall).
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Debug)]
pub struct Quality(u8);

impl Quality {
    pub const MIN: u8 = 0;
    pub const MAX: u8 = 5;

    pub fn new(value: i64) -> Fallible<Self> {
        if (i64::from(Self::MIN)..=i64::from(Self::MAX)).contains(&value) {
            Ok(Self(value as u8))
        } else {
            Err(invalid(value))
        }
    }

    pub fn value(self) -> u8 {
        self.0
    }
}

fn invalid(value: impl Display) -> ErrorReport {
    ErrorReport::with_kind(
        ErrorKind::InvalidRating,
        format!(
            "rating must be between {} and {}, got {value}.",
            Quality::MIN,
            Quality::MAX
        ),
    )
}

impl TryFrom<i64> for Quality {
    type Error = ErrorReport;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        Quality::new(value)
    }
}

impl FromStr for Quality {
    type Err = ErrorReport;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        match s.parse::<i64>() {
            Ok(value) => Quality::new(value),
            Err(_) => Err(invalid(format!("{s:?}"))),
        }
    }
}

impl Display for Quality {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts_closed_range() -> Fallible<()> {
        for value in 0..=5 {
            assert_eq!(Quality::new(value)?.value() as i64, value);
        }
        Ok(())
    }

    #[test]
    fn test_rejects_out_of_range() {
        for value in [-1, 6, 100, i64::MIN, i64::MAX] {
            let err = Quality::new(value).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::InvalidRating);
        }
    }

    #[test]
    fn test_parse() -> Fallible<()> {
        assert_eq!(" 4\n".parse::<Quality>()?, Quality::new(4)?);
        let err = "four".parse::<Quality>().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidRating);
        let err = "7".parse::<Quality>().unwrap_err();
        assert_eq!(err.to_string(), "error: rating must be between 0 and 5, got 7.");
        Ok(())
    }
}
