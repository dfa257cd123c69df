//! Exact routing scores.

use super::RoutingPolicyError;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// Fraction of an agent's profile keywords found in a request.
///
/// Stored as an exact ratio and compared by cross-multiplication, so equal
/// scores from differently sized profiles compare equal.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Confidence {
    matched: u32,
    total: u32,
}

impl Confidence {
    /// A score of zero.
    pub const ZERO: Self = Self {
        matched: 0,
        total: 1,
    };

    /// Creates the score `matched / total`, clamped to `0..=1`.
    ///
    /// An empty `total` yields [`Self::ZERO`].
    #[must_use]
    pub const fn new(matched: u32, total: u32) -> Self {
        if total == 0 {
            return Self::ZERO;
        }
        let clamped = if matched > total { total } else { matched };
        Self {
            matched: clamped,
            total,
        }
    }

    /// Creates a score from whole percent.
    ///
    /// # Errors
    ///
    /// Returns [`RoutingPolicyError::ConfidenceOutOfRange`] above 100.
    pub const fn from_percent(percent: u32) -> Result<Self, RoutingPolicyError> {
        if percent > 100 {
            return Err(RoutingPolicyError::ConfidenceOutOfRange(percent));
        }
        Ok(Self::new(percent, 100))
    }

    /// Returns whether the score is above zero.
    #[must_use]
    pub const fn is_positive(self) -> bool {
        self.matched > 0
    }

    /// Returns the numerator.
    #[must_use]
    pub const fn matched(self) -> u32 {
        self.matched
    }

    /// Returns the denominator.
    #[must_use]
    pub const fn total(self) -> u32 {
        self.total
    }

    /// Returns the score as a float for display.
    #[must_use]
    #[expect(clippy::float_arithmetic, reason = "display-only conversion of an exact ratio")]
    pub fn as_f64(self) -> f64 {
        f64::from(self.matched) / f64::from(self.total)
    }
}

impl PartialEq for Confidence {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Confidence {}

impl PartialOrd for Confidence {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Confidence {
    fn cmp(&self, other: &Self) -> Ordering {
        let lhs = u64::from(self.matched) * u64::from(other.total);
        let rhs = u64::from(other.matched) * u64::from(self.total);
        lhs.cmp(&rhs)
    }
}

impl fmt::Display for Confidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.matched, self.total)
    }
}
