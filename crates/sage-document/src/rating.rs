//! Risk ratings and the 5x5 scoring matrix.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::patch::Patch;

/// How bad the outcome is if the hazard occurs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    /// First-aid level, no lasting effect.
    Negligible,
    /// Minor injury or short recovery.
    Minor,
    /// Lost-time injury or reportable event.
    Serious,
    /// Permanent impairment or major damage.
    Severe,
    /// Fatality or irreversible loss.
    Catastrophic,
}

impl Severity {
    /// Matrix weight, 1 through 5.
    #[inline]
    #[must_use]
    pub fn weight(self) -> u8 {
        match self {
            Severity::Negligible => 1,
            Severity::Minor => 2,
            Severity::Serious => 3,
            Severity::Severe => 4,
            Severity::Catastrophic => 5,
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Severity::Negligible => "negligible",
            Severity::Minor => "minor",
            Severity::Serious => "serious",
            Severity::Severe => "severe",
            Severity::Catastrophic => "catastrophic",
        };
        f.write_str(label)
    }
}

impl FromStr for Severity {
    type Err = ParseRatingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "negligible" => Ok(Severity::Negligible),
            "minor" => Ok(Severity::Minor),
            "serious" => Ok(Severity::Serious),
            "severe" => Ok(Severity::Severe),
            "catastrophic" => Ok(Severity::Catastrophic),
            _ => Err(ParseRatingError {
                kind: "severity",
                value: s.to_owned(),
            }),
        }
    }
}

/// How likely the hazard is to occur.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Likelihood {
    /// Conceivable but not expected over the life of the activity.
    Rare,
    /// Could happen, has not been seen here.
    Unlikely,
    /// Known to happen occasionally.
    Possible,
    /// Expected to happen at some point.
    Likely,
    /// Happens regularly without intervention.
    AlmostCertain,
}

impl Likelihood {
    /// Matrix weight, 1 through 5.
    #[inline]
    #[must_use]
    pub fn weight(self) -> u8 {
        match self {
            Likelihood::Rare => 1,
            Likelihood::Unlikely => 2,
            Likelihood::Possible => 3,
            Likelihood::Likely => 4,
            Likelihood::AlmostCertain => 5,
        }
    }
}

impl fmt::Display for Likelihood {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Likelihood::Rare => "rare",
            Likelihood::Unlikely => "unlikely",
            Likelihood::Possible => "possible",
            Likelihood::Likely => "likely",
            Likelihood::AlmostCertain => "almost certain",
        };
        f.write_str(label)
    }
}

impl FromStr for Likelihood {
    type Err = ParseRatingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "rare" => Ok(Likelihood::Rare),
            "unlikely" => Ok(Likelihood::Unlikely),
            "possible" => Ok(Likelihood::Possible),
            "likely" => Ok(Likelihood::Likely),
            "almost certain" | "almost_certain" => Ok(Likelihood::AlmostCertain),
            _ => Err(ParseRatingError {
                kind: "likelihood",
                value: s.to_owned(),
            }),
        }
    }
}

/// A severity or likelihood string that matches no known level.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseRatingError {
    kind: &'static str,
    value: String,
}

impl fmt::Display for ParseRatingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown {} level {:?}", self.kind, self.value)
    }
}

impl std::error::Error for ParseRatingError {}

/// Banded outcome of the 5x5 matrix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    /// Score 1-4: manage through routine procedures.
    Low,
    /// Score 5-9: needs specific monitoring.
    Moderate,
    /// Score 10-16: needs senior sign-off and follow-up actions.
    High,
    /// Score 17-25: stop work until reduced.
    Critical,
}

impl RiskLevel {
    /// Bands a raw matrix score (severity weight times likelihood weight).
    #[must_use]
    pub fn from_score(score: u8) -> Self {
        match score {
            0..=4 => RiskLevel::Low,
            5..=9 => RiskLevel::Moderate,
            10..=16 => RiskLevel::High,
            _ => RiskLevel::Critical,
        }
    }

    /// True for the bands that demand follow-up actions.
    #[inline]
    #[must_use]
    pub fn requires_action(self) -> bool {
        matches!(self, RiskLevel::High | RiskLevel::Critical)
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            RiskLevel::Low => "low",
            RiskLevel::Moderate => "moderate",
            RiskLevel::High => "high",
            RiskLevel::Critical => "critical",
        };
        f.write_str(label)
    }
}

/// One hazard rating, either initial or residual.
///
/// Severity and likelihood are captured independently because they are
/// usually discussed in separate breaths; the rating only scores once
/// both halves are present.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RiskRating {
    /// Outcome severity, once assessed.
    pub severity: Option<Severity>,
    /// Occurrence likelihood, once assessed.
    pub likelihood: Option<Likelihood>,
}

impl RiskRating {
    /// A rating with both halves filled in.
    #[must_use]
    pub fn new(severity: Severity, likelihood: Likelihood) -> Self {
        Self {
            severity: Some(severity),
            likelihood: Some(likelihood),
        }
    }

    /// True when neither half has been assessed.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.severity.is_none() && self.likelihood.is_none()
    }

    /// True once both halves have been assessed.
    #[inline]
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.severity.is_some() && self.likelihood.is_some()
    }

    /// Matrix outcome, available once the rating is complete.
    #[must_use]
    pub fn level(&self) -> Option<RiskLevel> {
        let severity = self.severity?;
        let likelihood = self.likelihood?;
        Some(RiskLevel::from_score(
            severity.weight() * likelihood.weight(),
        ))
    }
}

/// Which of a hazard's two ratings an update addresses.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RatingStage {
    /// The pre-control rating.
    #[default]
    Initial,
    /// The rating with controls in place.
    Residual,
}

impl fmt::Display for RatingStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RatingStage::Initial => f.write_str("initial"),
            RatingStage::Residual => f.write_str("residual"),
        }
    }
}

/// Partial update for one rating.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RatingPatch {
    /// Severity change, if any.
    #[serde(skip_serializing_if = "Patch::is_keep")]
    pub severity: Patch<Severity>,
    /// Likelihood change, if any.
    #[serde(skip_serializing_if = "Patch::is_keep")]
    pub likelihood: Patch<Likelihood>,
}

impl RatingPatch {
    /// True when the patch would change nothing.
    #[must_use]
    pub fn is_noop(&self) -> bool {
        self.severity.is_keep() && self.likelihood.is_keep()
    }

    /// Applies the patch in place.
    pub fn apply(&self, rating: &mut RiskRating) {
        self.severity.apply_to(&mut rating.severity);
        self.likelihood.apply_to(&mut rating.likelihood);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matrix_corners() {
        assert_eq!(
            RiskRating::new(Severity::Negligible, Likelihood::Rare).level(),
            Some(RiskLevel::Low)
        );
        assert_eq!(
            RiskRating::new(Severity::Catastrophic, Likelihood::AlmostCertain).level(),
            Some(RiskLevel::Critical)
        );
    }

    #[test]
    fn matrix_bands() {
        // 3 * 3 = 9 sits at the top of moderate.
        assert_eq!(
            RiskRating::new(Severity::Serious, Likelihood::Possible).level(),
            Some(RiskLevel::Moderate)
        );
        // 4 * 4 = 16 is still high, 5 * 4 = 20 tips into critical.
        assert_eq!(
            RiskRating::new(Severity::Severe, Likelihood::Likely).level(),
            Some(RiskLevel::High)
        );
        assert_eq!(
            RiskRating::new(Severity::Catastrophic, Likelihood::Likely).level(),
            Some(RiskLevel::Critical)
        );
    }

    #[test]
    fn incomplete_rating_has_no_level() {
        let rating = RiskRating {
            severity: Some(Severity::Severe),
            likelihood: None,
        };
        assert_eq!(rating.level(), None);
        assert!(!rating.is_complete());
        assert!(!rating.is_empty());
    }

    #[test]
    fn patch_fills_one_half_at_a_time() {
        let mut rating = RiskRating::default();
        RatingPatch {
            severity: Patch::Set(Severity::Serious),
            likelihood: Patch::Keep,
        }
        .apply(&mut rating);
        assert!(!rating.is_complete());

        RatingPatch {
            severity: Patch::Keep,
            likelihood: Patch::Set(Likelihood::Likely),
        }
        .apply(&mut rating);
        assert_eq!(rating.level(), Some(RiskLevel::High));
    }

    #[test]
    fn likelihood_parses_spaced_and_snake_forms() {
        assert_eq!(
            "Almost Certain".parse::<Likelihood>().unwrap(),
            Likelihood::AlmostCertain
        );
        assert_eq!(
            "almost_certain".parse::<Likelihood>().unwrap(),
            Likelihood::AlmostCertain
        );
        assert!("sometimes".parse::<Likelihood>().is_err());
    }

    #[test]
    fn high_and_critical_require_action() {
        assert!(!RiskLevel::Moderate.requires_action());
        assert!(RiskLevel::High.requires_action());
        assert!(RiskLevel::Critical.requires_action());
    }
}
