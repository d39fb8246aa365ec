//! The editing session: one open document, one undo slot.
//!
//! Everything the UI layer calls lives here. All methods take `&mut
//! self`, so one session can never interleave two batches; the cached
//! document is replaced only by a post-batch refetch or a post-undo
//! restore, never patched locally.

use std::sync::Arc;

use tracing::{debug, info, warn};

use sage_command::{compile_batch, Command, CompiledBatch, Intent, ParserOutput};
use sage_document::{Document, DocumentId, EntityId, HazardId, Phase, StepId};
use sage_phase::{advance, jump, phase_complete, unmet_requirements};
use sage_store::DocumentStore;

use crate::apply::apply_one;
use crate::config::EngineConfig;
use crate::error::EngineError;
use crate::report::{BatchReport, CommandFailure};
use crate::undo::{Snapshot, UndoSlot};

/// The result of a phase move.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PhaseChange {
    /// The phase the session now shows.
    pub phase: Phase,
    /// False when the store write failed and the phase is only held
    /// locally; the UI must not claim it is saved.
    pub durable: bool,
}

/// A sibling scope for direct reordering, the drag/keyboard pathway
/// that bypasses the command parser.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReorderScope {
    /// The document's steps.
    Steps,
    /// The hazards of one step.
    Hazards(StepId),
    /// The controls of one hazard.
    Controls(HazardId),
    /// The document's action list.
    Actions,
}

/// A guided editing session over one document.
#[derive(Debug)]
pub struct EditorSession<S> {
    store: Arc<S>,
    document: Document,
    config: EngineConfig,
    undo: UndoSlot,
}

impl<S: DocumentStore> EditorSession<S> {
    /// Opens a session on an existing document with default policy.
    pub async fn open(store: Arc<S>, document: DocumentId) -> Result<Self, EngineError> {
        Self::open_with_config(store, document, EngineConfig::default()).await
    }

    /// Opens a session with explicit policy.
    pub async fn open_with_config(
        store: Arc<S>,
        document: DocumentId,
        config: EngineConfig,
    ) -> Result<Self, EngineError> {
        let document = store.fetch_document(document).await?;
        info!(document = %document.id, kind = %document.kind, "session opened");
        Ok(Self {
            store,
            document,
            config,
            undo: UndoSlot::default(),
        })
    }

    /// The cached document. Authoritative as of the last refetch.
    #[must_use]
    pub fn document(&self) -> &Document {
        &self.document
    }

    /// True when the last batch can still be undone.
    #[must_use]
    pub fn can_undo(&self) -> bool {
        self.undo.is_armed()
    }

    /// The summary tagging the undoable batch, for the undo affordance.
    #[must_use]
    pub fn undo_summary(&self) -> Option<&str> {
        self.undo.snapshot().and_then(|s| s.summary.as_deref())
    }

    /// Moves the session to a different document. The undo slot is
    /// cleared unconditionally; a batch from the old document must
    /// never restore over the new one.
    pub async fn switch_to(&mut self, document: DocumentId) -> Result<(), EngineError> {
        self.undo.clear();
        self.document = self.store.fetch_document(document).await?;
        info!(document = %self.document.id, "session switched document");
        Ok(())
    }

    /// Compiles collaborator output and applies it as one batch.
    pub async fn apply_parser_output(
        &mut self,
        output: ParserOutput,
    ) -> Result<BatchReport, EngineError> {
        self.apply_batch(compile_batch(output)).await
    }

    /// Applies one already-compiled command outside a batch.
    pub async fn apply_command(&mut self, command: Command) -> Result<BatchReport, EngineError> {
        self.apply_batch(CompiledBatch {
            commands: vec![command],
            summary: None,
            dropped: Vec::new(),
        })
        .await
    }

    /// Applies a batch best-effort, strictly in order, and refetches.
    ///
    /// Per-command failures are recorded in the report and never abort
    /// the batch. The only `Err` paths are losing sync with the store:
    /// the post-batch refetch failing. A clarification round applies
    /// nothing and leaves the undo slot exactly as it was.
    pub async fn apply_batch(&mut self, batch: CompiledBatch) -> Result<BatchReport, EngineError> {
        let CompiledBatch {
            commands,
            summary,
            dropped,
        } = batch;

        for drop in &dropped {
            warn!(index = drop.index, reason = %drop.reason, "command dropped at validation");
        }

        let mut report = BatchReport {
            summary: summary.clone(),
            dropped: dropped.len(),
            ..BatchReport::default()
        };

        // A clarify command anywhere makes the whole batch a question;
        // the engine keeps no partial state across a clarify round.
        if commands.iter().any(|c| c.intent == Intent::Clarify) {
            report.clarification = Some(
                commands
                    .iter()
                    .find_map(Command::clarification_prompt)
                    .unwrap_or("the assistant needs more detail to proceed")
                    .to_owned(),
            );
            info!("batch needs clarification, nothing applied");
            return Ok(report);
        }

        if commands.is_empty() {
            info!(dropped = report.dropped, "batch empty after validation, nothing applied");
            return Ok(report);
        }

        // Snapshot before the first write. Overwrites whatever was
        // undoable; only the most recent batch can be undone.
        self.undo.arm(Snapshot::of(&self.document, summary));
        info!(
            document = %self.document.id,
            commands = commands.len(),
            dropped = report.dropped,
            "applying batch"
        );

        report.attempted = commands.len();
        for (index, command) in commands.iter().enumerate() {
            debug!(index, intent = %command.intent, target = %command.target, "dispatching");
            match apply_one(self.store.as_ref(), &self.document, &self.config, command).await {
                Ok(()) => report.applied += 1,
                Err(reason) => {
                    warn!(index, %reason, "command skipped, batch continues");
                    report.failures.push(CommandFailure {
                        index,
                        intent: command.intent,
                        target: command.target,
                        reason,
                    });
                }
            }
        }

        self.refresh().await?;
        // Compare against the snapshot rather than trusting the counts:
        // a bundle can land some sub-edits and still count as zero
        // applied commands.
        report.mutated = self
            .undo
            .snapshot()
            .is_some_and(|snapshot| !self.document.content_eq(&snapshot.document));
        info!(
            applied = report.applied,
            failed = report.failures.len(),
            mutated = report.mutated,
            "batch settled"
        );
        Ok(report)
    }

    /// Restores the pre-batch snapshot wholesale and refetches.
    ///
    /// On restore failure the slot is kept so the caller can retry; on
    /// success it is consumed, so undo is strictly single-level.
    pub async fn undo_last_batch(&mut self) -> Result<&Document, EngineError> {
        let Some(snapshot) = self.undo.snapshot() else {
            return Err(EngineError::NothingToUndo);
        };
        let document = snapshot.document.clone();
        info!(document = %document.id, "undoing last batch");

        self.store
            .replace_document(document)
            .await
            .map_err(|source| EngineError::RestoreFailed { source })?;
        self.undo.clear();
        self.refresh().await?;
        Ok(&self.document)
    }

    /// Persists a new order for one sibling scope and refetches. Used
    /// by drag and keyboard reordering; does not touch the undo slot.
    pub async fn reorder(
        &mut self,
        scope: ReorderScope,
        ordered: Vec<EntityId>,
    ) -> Result<(), EngineError> {
        let id = self.document.id;
        match scope {
            ReorderScope::Steps => self.store.reorder_steps(id, ordered).await?,
            ReorderScope::Hazards(step) => self.store.reorder_hazards(id, step, ordered).await?,
            ReorderScope::Controls(hazard) => {
                self.store.reorder_controls(id, hazard, ordered).await?;
            }
            ReorderScope::Actions => self.store.reorder_actions(id, ordered).await?,
        }
        self.refresh().await
    }

    /// Advances one phase forward if the current phase is complete.
    ///
    /// The new phase is shown locally even when persisting it fails;
    /// `durable` tells the caller whether the store agrees.
    pub async fn advance_phase(&mut self) -> Result<PhaseChange, EngineError> {
        let next = advance(&self.document)?;
        self.persist_phase(next).await
    }

    /// Jumps to a phase. Backward is always allowed; forward requires
    /// every skipped phase to be complete.
    pub async fn jump_to_phase(&mut self, to: Phase) -> Result<PhaseChange, EngineError> {
        let target = jump(&self.document, to)?;
        self.persist_phase(target).await
    }

    /// True when the current phase has nothing left to do.
    #[must_use]
    pub fn phase_ready(&self) -> bool {
        phase_complete(&self.document, self.document.current_phase)
    }

    /// What still blocks the current phase, for display.
    #[must_use]
    pub fn phase_blockers(&self) -> Vec<String> {
        unmet_requirements(&self.document, self.document.current_phase)
    }

    async fn persist_phase(&mut self, phase: Phase) -> Result<PhaseChange, EngineError> {
        match self.store.set_phase(self.document.id, phase).await {
            Ok(()) => {
                self.refresh().await?;
                info!(%phase, "phase persisted");
                Ok(PhaseChange {
                    phase,
                    durable: true,
                })
            }
            Err(source) => {
                // Non-fatal: show the phase locally, admit it is not
                // saved. The next successful write will catch up.
                warn!(%phase, error = %source, "phase persist failed, holding locally");
                self.document.current_phase = phase;
                Ok(PhaseChange {
                    phase,
                    durable: false,
                })
            }
        }
    }

    async fn refresh(&mut self) -> Result<(), EngineError> {
        self.document = self
            .store
            .fetch_document(self.document.id)
            .await
            .map_err(|source| EngineError::RefreshFailed { source })?;
        Ok(())
    }
}
