//! Engine policy knobs.

/// Tunable behavior of the command applier.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EngineConfig {
    /// What deleting a step does to the hazards still attached to it.
    pub step_delete: StepDeletePolicy,
}

/// Policy for `DELETE` commands aimed at a step that still has hazards.
///
/// The three document kinds disagree on this in practice, so it is an
/// explicit choice rather than a hard-coded cascade.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum StepDeletePolicy {
    /// Delete the step together with its hazards, their controls, and
    /// the actions keyed to those hazards.
    #[default]
    Cascade,
    /// Refuse to delete a step while any hazard is attached, so nothing
    /// is orphaned or silently lost.
    RefuseNonEmpty,
}
