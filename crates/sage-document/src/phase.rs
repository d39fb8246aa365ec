//! Document kinds and their guided phase sequences.
//!
//! A facilitation session walks a document through a fixed sequence of
//! phases. The sequence depends on the document kind; the gate that
//! decides whether a phase is complete lives upstream, this module only
//! knows the order.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// What sort of assessment a document is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentKind {
    /// Full risk assessment with initial and residual ratings.
    RiskAssessment,
    /// Job hazard analysis, rated informally during control discussion.
    JobHazardAnalysis,
    /// Incident investigation built around a timeline of events.
    IncidentInvestigation,
}

impl DocumentKind {
    /// The phases of this kind, in facilitation order. Always ends in
    /// [`Phase::Complete`].
    #[must_use]
    pub fn phases(self) -> &'static [Phase] {
        match self {
            DocumentKind::RiskAssessment => &[
                Phase::ProcessSteps,
                Phase::HazardIdentification,
                Phase::RiskRating,
                Phase::ControlDiscussion,
                Phase::ResidualRisk,
                Phase::Actions,
                Phase::Complete,
            ],
            DocumentKind::JobHazardAnalysis => &[
                Phase::ProcessSteps,
                Phase::HazardIdentification,
                Phase::ControlDiscussion,
                Phase::Actions,
                Phase::Complete,
            ],
            DocumentKind::IncidentInvestigation => &[
                Phase::Timeline,
                Phase::CauseAnalysis,
                Phase::CorrectiveActions,
                Phase::Complete,
            ],
        }
    }

    /// The phase a fresh document of this kind starts in.
    #[must_use]
    pub fn first_phase(self) -> Phase {
        self.phases()[0]
    }
}

impl fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            DocumentKind::RiskAssessment => "risk_assessment",
            DocumentKind::JobHazardAnalysis => "job_hazard_analysis",
            DocumentKind::IncidentInvestigation => "incident_investigation",
        };
        f.write_str(label)
    }
}

impl FromStr for DocumentKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "risk_assessment" | "ra" => Ok(DocumentKind::RiskAssessment),
            "job_hazard_analysis" | "jha" => Ok(DocumentKind::JobHazardAnalysis),
            "incident_investigation" | "incident" => Ok(DocumentKind::IncidentInvestigation),
            other => Err(format!("unknown document kind {other:?}")),
        }
    }
}

/// One stage of a guided session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// Walk through the steps of the work.
    ProcessSteps,
    /// Identify hazards step by step.
    HazardIdentification,
    /// Score each hazard before controls.
    RiskRating,
    /// Discuss existing and proposed controls.
    ControlDiscussion,
    /// Score each hazard with controls in place.
    ResidualRisk,
    /// Agree follow-up actions.
    Actions,
    /// Reconstruct the incident timeline.
    Timeline,
    /// Identify contributing causes.
    CauseAnalysis,
    /// Agree corrective actions.
    CorrectiveActions,
    /// Nothing left to facilitate.
    Complete,
}

impl Phase {
    /// True once the session has nothing left to do.
    #[inline]
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, Phase::Complete)
    }

    /// The phase that follows this one for the given kind.
    ///
    /// Returns `None` at `Complete`, and also when the phase does not
    /// belong to the kind's sequence at all (a persisted document from
    /// an older template, say).
    #[must_use]
    pub fn next_in(self, kind: DocumentKind) -> Option<Phase> {
        let phases = kind.phases();
        let position = phases.iter().position(|phase| *phase == self)?;
        phases.get(position + 1).copied()
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Phase::ProcessSteps => "process_steps",
            Phase::HazardIdentification => "hazard_identification",
            Phase::RiskRating => "risk_rating",
            Phase::ControlDiscussion => "control_discussion",
            Phase::ResidualRisk => "residual_risk",
            Phase::Actions => "actions",
            Phase::Timeline => "timeline",
            Phase::CauseAnalysis => "cause_analysis",
            Phase::CorrectiveActions => "corrective_actions",
            Phase::Complete => "complete",
        };
        f.write_str(label)
    }
}

impl FromStr for Phase {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "process_steps" => Ok(Phase::ProcessSteps),
            "hazard_identification" => Ok(Phase::HazardIdentification),
            "risk_rating" => Ok(Phase::RiskRating),
            "control_discussion" => Ok(Phase::ControlDiscussion),
            "residual_risk" => Ok(Phase::ResidualRisk),
            "actions" => Ok(Phase::Actions),
            "timeline" => Ok(Phase::Timeline),
            "cause_analysis" => Ok(Phase::CauseAnalysis),
            "corrective_actions" => Ok(Phase::CorrectiveActions),
            "complete" => Ok(Phase::Complete),
            other => Err(format!("unknown phase {other:?}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_kind_ends_in_complete() {
        for kind in [
            DocumentKind::RiskAssessment,
            DocumentKind::JobHazardAnalysis,
            DocumentKind::IncidentInvestigation,
        ] {
            assert_eq!(kind.phases().last(), Some(&Phase::Complete));
        }
    }

    #[test]
    fn next_walks_the_sequence() {
        let kind = DocumentKind::RiskAssessment;
        let mut phase = kind.first_phase();
        let mut visited = vec![phase];
        while let Some(next) = phase.next_in(kind) {
            visited.push(next);
            phase = next;
        }
        assert_eq!(visited, kind.phases());
    }

    #[test]
    fn complete_has_no_successor() {
        assert_eq!(Phase::Complete.next_in(DocumentKind::RiskAssessment), None);
    }

    #[test]
    fn foreign_phase_has_no_successor() {
        // A JHA never rates residual risk.
        assert_eq!(
            Phase::ResidualRisk.next_in(DocumentKind::JobHazardAnalysis),
            None
        );
    }
}
