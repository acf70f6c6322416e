//! ACTUS cycle notation.
//!
//! A cycle is a string of the form `nU[+-]` where `n` is a positive integer,
//! `U` is one of `D W M Q H Y`, and the optional suffix selects the stub
//! convention (`-` short stub, `+` long stub). Examples: `3M`, `1Y`, `6M+`.
//!
//! # Examples
//!
//! ```
//! use actus_core::types::cycle::{Cycle, CycleUnit, StubConvention};
//!
//! let cycle: Cycle = "6M-".parse().unwrap();
//! assert_eq!(cycle.multiplier(), 6);
//! assert_eq!(cycle.unit(), CycleUnit::Month);
//! assert_eq!(cycle.stub(), StubConvention::Short);
//! assert_eq!(cycle.to_string(), "6M-");
//! ```

use std::fmt;
use std::str::FromStr;

use super::enums::EndOfMonthConvention;
use super::error::CycleError;
use super::time::ActusDateTime;

/// Period unit of a cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CycleUnit {
    /// Calendar days (`D`).
    Day,
    /// Calendar weeks (`W`).
    Week,
    /// Calendar months (`M`).
    Month,
    /// Quarters, i.e. three months (`Q`).
    Quarter,
    /// Half-years, i.e. six months (`H`).
    HalfYear,
    /// Years (`Y`).
    Year,
}

impl CycleUnit {
    /// Single-letter ACTUS code.
    pub fn code(&self) -> char {
        match self {
            CycleUnit::Day => 'D',
            CycleUnit::Week => 'W',
            CycleUnit::Month => 'M',
            CycleUnit::Quarter => 'Q',
            CycleUnit::HalfYear => 'H',
            CycleUnit::Year => 'Y',
        }
    }

    /// Number of months per unit; `None` for day- and week-based units.
    pub fn months(&self) -> Option<u32> {
        match self {
            CycleUnit::Day | CycleUnit::Week => None,
            CycleUnit::Month => Some(1),
            CycleUnit::Quarter => Some(3),
            CycleUnit::HalfYear => Some(6),
            CycleUnit::Year => Some(12),
        }
    }

    /// True for month-based units (M/Q/H/Y), where the end-of-month
    /// convention applies.
    pub fn is_month_based(&self) -> bool {
        self.months().is_some()
    }
}

/// Stub convention for a schedule whose end is not on-cycle.
///
/// Short keeps the last on-cycle date and appends the end as an extra short
/// period; Long merges the final partial period into the preceding one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StubConvention {
    /// `-` suffix (default): short final stub.
    Short,
    /// `+` suffix: long final stub.
    Long,
}

/// A parsed ACTUS cycle expression.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Cycle {
    multiplier: u32,
    unit: CycleUnit,
    stub: Option<StubConvention>,
}

impl Cycle {
    /// Creates a cycle from components. `multiplier` must be positive.
    pub fn new(multiplier: u32, unit: CycleUnit, stub: Option<StubConvention>) -> Result<Self, CycleError> {
        if multiplier == 0 {
            return Err(CycleError::InvalidCycle(format!("0{}", unit.code())));
        }
        Ok(Cycle {
            multiplier,
            unit,
            stub,
        })
    }

    /// Period multiplier `n`.
    pub fn multiplier(&self) -> u32 {
        self.multiplier
    }

    /// Period unit.
    pub fn unit(&self) -> CycleUnit {
        self.unit
    }

    /// Effective stub convention (short unless `+` was given).
    pub fn stub(&self) -> StubConvention {
        self.stub.unwrap_or(StubConvention::Short)
    }

    /// The date `anchor + k * period`.
    ///
    /// Dates are always computed from the anchor, never by incrementing the
    /// previous date, so day clamping cannot drift: Jan 30 + 2x1M is Mar 30,
    /// not Mar 28. The end-of-month convention applies only to month-based
    /// units and only when the anchor is the last day of its month.
    pub fn date_at(
        &self,
        anchor: ActusDateTime,
        k: u32,
        eom: EndOfMonthConvention,
    ) -> ActusDateTime {
        match self.unit.months() {
            None => {
                let step = match self.unit {
                    CycleUnit::Day => 1,
                    _ => 7,
                };
                anchor.add_days(i64::from(k) * i64::from(self.multiplier) * step)
            }
            Some(months) => {
                let shifted = anchor.add_months((k * self.multiplier * months) as i32);
                if eom == EndOfMonthConvention::EndOfMonth && anchor.is_end_of_month() {
                    shifted.end_of_month()
                } else {
                    shifted
                }
            }
        }
    }
}

impl FromStr for Cycle {
    type Err = CycleError;

    /// Parses `nU[+-]`; anything else is `InvalidCycle`.
    fn from_str(s: &str) -> Result<Self, CycleError> {
        let invalid = || CycleError::InvalidCycle(s.to_string());

        let digits_end = s.find(|c: char| !c.is_ascii_digit()).ok_or_else(invalid)?;
        if digits_end == 0 {
            return Err(invalid());
        }
        let multiplier: u32 = s[..digits_end].parse().map_err(|_| invalid())?;

        let mut rest = s[digits_end..].chars();
        let unit = match rest.next() {
            Some('D') => CycleUnit::Day,
            Some('W') => CycleUnit::Week,
            Some('M') => CycleUnit::Month,
            Some('Q') => CycleUnit::Quarter,
            Some('H') => CycleUnit::HalfYear,
            Some('Y') => CycleUnit::Year,
            _ => return Err(invalid()),
        };
        let stub = match rest.next() {
            None => None,
            Some('-') => Some(StubConvention::Short),
            Some('+') => Some(StubConvention::Long),
            Some(_) => return Err(invalid()),
        };
        if rest.next().is_some() {
            return Err(invalid());
        }
        Cycle::new(multiplier, unit, stub).map_err(|_| invalid())
    }
}

impl fmt::Display for Cycle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.multiplier, self.unit.code())?;
        match self.stub {
            Some(StubConvention::Short) => write!(f, "-"),
            Some(StubConvention::Long) => write!(f, "+"),
            None => Ok(()),
        }
    }
}

#[cfg(feature = "serde")]
mod serde_impl {
    use super::Cycle;
    use serde::{de, Deserialize, Deserializer, Serialize, Serializer};

    impl Serialize for Cycle {
        fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
        where
            S: Serializer,
        {
            serializer.serialize_str(&self.to_string())
        }
    }

    impl<'de> Deserialize<'de> for Cycle {
        fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
        where
            D: Deserializer<'de>,
        {
            let s = String::deserialize(deserializer)?;
            s.parse().map_err(de::Error::custom)
        }
    }
}
