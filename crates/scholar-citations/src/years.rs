//! Year selection: a single year or a closed `start:end` range.

use crate::error::ConfigError;
use chrono::Datelike;
use std::fmt;
use std::str::FromStr;

/// Years whose publications (and citation columns) a run covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum YearSpec {
    Single(u16),
    Range { start: u16, end: u16 },
}

impl YearSpec {
    /// The current calendar year, used when `--year` is omitted.
    pub fn current() -> Self {
        let year = chrono::Local::now().year();
        Self::Single(u16::try_from(year).unwrap_or(u16::MAX))
    }

    /// Expand into the ordered list of years as strings.
    pub fn expand(&self) -> Vec<String> {
        match *self {
            Self::Single(year) => vec![year.to_string()],
            Self::Range { start, end } => (start..=end).map(|y| y.to_string()).collect(),
        }
    }
}

impl FromStr for YearSpec {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let spec = s.trim();
        match spec.split_once(':') {
            None => Ok(Self::Single(parse_year(spec)?)),
            Some((start, end)) => {
                let start = parse_year(start.trim())?;
                let end = parse_year(end.trim())?;
                if start > end {
                    return Err(ConfigError::InvertedRange {
                        spec: spec.to_string(),
                        start,
                        end,
                    });
                }
                Ok(Self::Range { start, end })
            }
        }
    }
}

impl fmt::Display for YearSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Single(year) => write!(f, "{year}"),
            Self::Range { start, end } => write!(f, "{start}:{end}"),
        }
    }
}

fn parse_year(raw: &str) -> Result<u16, ConfigError> {
    if raw.len() != 4 || !raw.bytes().all(|b| b.is_ascii_digit()) {
        return Err(ConfigError::InvalidYear(raw.to_string()));
    }
    raw.parse()
        .map_err(|_| ConfigError::InvalidYear(raw.to_string()))
}
