//! Module defining `Interval` and `Region`.
//!
//! A `Region` is an ordered list of inclusive `[low, high]` intervals, one per
//! spatial dimension. It is the only value passed between nodes during
//! region propagation.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum RegionError {
    #[error("Region must have at least one dimension.")]
    Empty,

    #[error("Invalid interval [{low}, {high}]: low bound exceeds high bound.")]
    InvalidInterval { low: i64, high: i64 },

    #[error("Cannot parse '{0}' as a region. Expected 'low:high' per dimension, separated by commas.")]
    Parse(String),
}

/// Inclusive interval of positions along one spatial dimension.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "[i64; 2]", into = "[i64; 2]")]
pub struct Interval {
    low: i64,
    high: i64,
}

impl Interval {
    pub fn new(low: i64, high: i64) -> Result<Self, RegionError> {
        if low > high {
            return Err(RegionError::InvalidInterval { low, high });
        }
        Ok(Self { low, high })
    }

    /// Builds an interval the caller has already checked.
    pub(crate) fn from_ordered(low: i64, high: i64) -> Self {
        debug_assert!(low <= high);
        Self { low, high }
    }

    pub fn low(&self) -> i64 {
        self.low
    }

    pub fn high(&self) -> i64 {
        self.high
    }

    /// Distance between the bounds (`high - low`). Never overflows.
    pub fn span(&self) -> u64 {
        self.high.abs_diff(self.low)
    }

    /// Smallest interval covering both `self` and `other`.
    pub fn union(&self, other: &Interval) -> Interval {
        Interval { low: self.low.min(other.low), high: self.high.max(other.high) }
    }

    pub fn contains(&self, other: &Interval) -> bool {
        self.low <= other.low && other.high <= self.high
    }
}

impl TryFrom<[i64; 2]> for Interval {
    type Error = RegionError;

    fn try_from([low, high]: [i64; 2]) -> Result<Self, Self::Error> {
        Interval::new(low, high)
    }
}

impl From<Interval> for [i64; 2] {
    fn from(interval: Interval) -> Self {
        [interval.low, interval.high]
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}]", self.low, self.high)
    }
}

impl FromStr for Interval {
    type Err = RegionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parse_err = || RegionError::Parse(s.to_string());
        let (low, high) = s.trim().split_once(':').ok_or_else(parse_err)?;
        let low = low.trim().parse::<i64>().map_err(|_| parse_err())?;
        let high = high.trim().parse::<i64>().map_err(|_| parse_err())?;
        Interval::new(low, high)
    }
}

/// Ordered sequence of intervals, one per spatial dimension.
///
/// Always non-empty and every interval satisfies `low <= high`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "Vec<Interval>", into = "Vec<Interval>")]
pub struct Region {
    intervals: Vec<Interval>,
}

impl Region {
    pub fn new(intervals: Vec<Interval>) -> Result<Self, RegionError> {
        if intervals.is_empty() {
            return Err(RegionError::Empty);
        }
        Ok(Self { intervals })
    }

    /// Builds a region from `(low, high)` pairs.
    ///
    /// ```
    /// use lazyasg::region::Region;
    ///
    /// let region = Region::from_bounds(&[(-2, 386), (-2, 386)]).unwrap();
    /// assert_eq!(region.dims(), 2);
    /// assert_eq!(region.to_string(), "[[-2, 386], [-2, 386]]");
    /// ```
    pub fn from_bounds(bounds: &[(i64, i64)]) -> Result<Self, RegionError> {
        let intervals = bounds
            .iter()
            .map(|&(low, high)| Interval::new(low, high))
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(intervals)
    }

    /// Used by derivation rules, which preserve ordering by construction.
    pub(crate) fn from_ordered(intervals: Vec<Interval>) -> Self {
        debug_assert!(!intervals.is_empty());
        Self { intervals }
    }

    pub fn dims(&self) -> usize {
        self.intervals.len()
    }

    pub fn intervals(&self) -> &[Interval] {
        &self.intervals
    }

    /// `(low, high)` pairs, mostly handy in assertions.
    pub fn bounds(&self) -> Vec<(i64, i64)> {
        self.intervals.iter().map(|i| (i.low, i.high)).collect()
    }

    /// Per-dimension `high - low`.
    pub fn spans(&self) -> Vec<u64> {
        self.intervals.iter().map(Interval::span).collect()
    }

    /// Coordinate-wise union. `None` when the dimensionalities differ.
    pub fn union(&self, other: &Region) -> Option<Region> {
        if self.dims() != other.dims() {
            return None;
        }
        let intervals = self
            .intervals
            .iter()
            .zip(&other.intervals)
            .map(|(a, b)| a.union(b))
            .collect();
        Some(Region { intervals })
    }

    /// True if every interval of `other` lies inside the matching interval of `self`.
    pub fn contains(&self, other: &Region) -> bool {
        self.dims() == other.dims()
            && self.intervals.iter().zip(&other.intervals).all(|(a, b)| a.contains(b))
    }
}

impl TryFrom<Vec<Interval>> for Region {
    type Error = RegionError;

    fn try_from(intervals: Vec<Interval>) -> Result<Self, Self::Error> {
        Region::new(intervals)
    }
}

impl From<Region> for Vec<Interval> {
    fn from(region: Region) -> Self {
        region.intervals
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for (i, interval) in self.intervals.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{interval}")?;
        }
        write!(f, "]")
    }
}

impl FromStr for Region {
    type Err = RegionError;

    /// Parses `"low:high,low:high,..."`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let intervals = s
            .split(',')
            .map(str::parse::<Interval>)
            .collect::<Result<Vec<_>, _>>()?;
        Region::new(intervals)
    }
}
