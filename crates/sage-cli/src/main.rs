//! `sage` - drive the mutation engine from the shell.
//!
//! A development harness, not a product UI: documents live in a JSON
//! file, batches arrive as collaborator-shaped JSON, and every run
//! seeds an in-memory store, replays the file into it, applies, and
//! writes the result back. The pre-batch snapshot lands next to the
//! document file so the undo subcommand can restore it later.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use sage_command::ParserOutput;
use sage_document::{Document, DocumentKind, Phase};
use sage_engine::{BatchOutcome, BatchReport, EditorSession, EngineConfig, StepDeletePolicy};
use sage_store::{DocumentStore, MemoryStore};

#[derive(Parser)]
#[command(name = "sage", version, about = "Guided editor engine for safety assessments")]
struct Cli {
    #[command(subcommand)]
    command: Cmd,
}

#[derive(Subcommand)]
enum Cmd {
    /// Write a fresh document file.
    Seed {
        /// Where to write the document.
        file: PathBuf,
        /// Document kind: risk_assessment, job_hazard_analysis,
        /// incident_investigation.
        #[arg(long, default_value = "risk_assessment")]
        kind: DocumentKind,
        /// Document title.
        #[arg(long, default_value = "Untitled assessment")]
        title: String,
        /// Start from the canned two-step example instead of empty.
        #[arg(long)]
        sample: bool,
    },
    /// Print the document tree and phase readiness.
    Show {
        /// The document file.
        file: PathBuf,
    },
    /// Apply a batch of collaborator JSON to the document.
    Apply {
        /// The document file, updated in place.
        file: PathBuf,
        /// File holding the collaborator response (envelope or bare
        /// command array).
        batch: PathBuf,
        /// Refuse to delete steps that still have hazards.
        #[arg(long)]
        refuse_step_cascade: bool,
    },
    /// Restore the snapshot taken before the last apply.
    Undo {
        /// The document file.
        file: PathBuf,
    },
    /// Inspect or move the guided-session phase.
    Phase {
        /// The document file.
        file: PathBuf,
        /// Advance one phase forward.
        #[arg(long, conflicts_with = "jump")]
        advance: bool,
        /// Jump straight to a phase.
        #[arg(long)]
        jump: Option<Phase>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    match Cli::parse().command {
        Cmd::Seed {
            file,
            kind,
            title,
            sample,
        } => seed(&file, kind, title, sample),
        Cmd::Show { file } => {
            let document = load(&file)?;
            print_tree(&document);
            Ok(())
        }
        Cmd::Apply {
            file,
            batch,
            refuse_step_cascade,
        } => apply(&file, &batch, refuse_step_cascade).await,
        Cmd::Undo { file } => undo(&file).await,
        Cmd::Phase { file, advance, jump } => phase(&file, advance, jump).await,
    }
}

fn seed(file: &Path, kind: DocumentKind, title: String, sample: bool) -> Result<()> {
    let document = if sample {
        sage_test_utils::two_step_document()
    } else {
        Document::new(kind, title)
    };
    save(file, &document)?;
    println!("seeded {} document {}", document.kind, document.id);
    Ok(())
}

async fn apply(file: &Path, batch: &Path, refuse_step_cascade: bool) -> Result<()> {
    let document = load(file)?;
    let snapshot = document.clone();
    let id = document.id;

    let store = Arc::new(MemoryStore::new());
    store.seed(document).await;

    let config = EngineConfig {
        step_delete: if refuse_step_cascade {
            StepDeletePolicy::RefuseNonEmpty
        } else {
            StepDeletePolicy::Cascade
        },
    };
    let mut session = EditorSession::open_with_config(store, id, config).await?;

    let text = fs::read_to_string(batch)
        .with_context(|| format!("reading batch {}", batch.display()))?;
    let output = ParserOutput::from_json(&text)
        .or_else(|_| ParserOutput::from_command_array(&text))
        .context("batch file is neither a response envelope nor a command array")?;

    let report = session.apply_parser_output(output).await?;
    print_report(&report);

    if report.changed_document() {
        save(&undo_path(file), &snapshot)?;
        save(file, session.document())?;
        println!("document updated; snapshot retained for undo");
    }
    Ok(())
}

async fn undo(file: &Path) -> Result<()> {
    let snapshot_file = undo_path(file);
    if !snapshot_file.exists() {
        bail!("nothing to undo: no snapshot next to {}", file.display());
    }
    let current = load(file)?;
    let snapshot: Document = load(&snapshot_file)?;
    if snapshot.id != current.id {
        bail!("snapshot belongs to a different document, refusing to restore");
    }

    let store = MemoryStore::new();
    store.seed(current).await;
    let restored = store.replace_document(snapshot).await?;
    save(file, &restored)?;
    fs::remove_file(&snapshot_file)
        .with_context(|| format!("removing {}", snapshot_file.display()))?;
    println!("restored document to its pre-batch state");
    Ok(())
}

async fn phase(file: &Path, advance: bool, jump: Option<Phase>) -> Result<()> {
    let document = load(file)?;
    let id = document.id;
    let store = Arc::new(MemoryStore::new());
    store.seed(document).await;
    let mut session = EditorSession::open(Arc::clone(&store), id).await?;

    let change = if advance {
        Some(session.advance_phase().await?)
    } else if let Some(to) = jump {
        Some(session.jump_to_phase(to).await?)
    } else {
        None
    };

    if let Some(change) = change {
        println!(
            "phase is now {}{}",
            change.phase,
            if change.durable { "" } else { " (not yet saved)" }
        );
        save(file, session.document())?;
    } else {
        println!("current phase: {}", session.document().current_phase);
        let blockers = session.phase_blockers();
        if blockers.is_empty() {
            println!("phase is complete, ready to advance");
        } else {
            println!("blocked by:");
            for blocker in blockers {
                println!("  - {blocker}");
            }
        }
    }
    Ok(())
}

fn print_report(report: &BatchReport) {
    match report.outcome() {
        BatchOutcome::ClarificationNeeded => {
            println!("clarification needed:");
            println!(
                "  {}",
                report.clarification.as_deref().unwrap_or("(no prompt)")
            );
            println!("answer by re-running the instruction with more detail");
            return;
        }
        BatchOutcome::Applied => println!("all {} commands applied", report.applied),
        BatchOutcome::PartiallyApplied => println!(
            "{} of {} commands applied, {} could not be applied",
            report.applied,
            report.attempted + report.dropped,
            report.not_applied()
        ),
        BatchOutcome::NothingApplied => println!("nothing changed"),
    }
    if let Some(summary) = &report.summary {
        println!("summary: {summary}");
    }
    for failure in &report.failures {
        println!(
            "  command {} ({} {}): {}",
            failure.index, failure.intent, failure.target, failure.reason
        );
    }
}

fn print_tree(document: &Document) {
    println!(
        "{} ({}), phase {}, revision {}",
        document.title, document.kind, document.current_phase, document.revision
    );
    for step in &document.steps {
        println!("  [{}] {}", step.order_index, step.activity);
        for hazard in &step.hazards {
            let rating = hazard
                .effective_rating()
                .level()
                .map_or_else(|| "unrated".to_owned(), |level| level.to_string());
            println!(
                "      [{}] {} ({}; {})",
                hazard.order_index,
                hazard.label,
                hazard.category_code.as_deref().unwrap_or("uncategorized"),
                rating
            );
            for control in &hazard.controls {
                println!(
                    "          [{}] {} ({})",
                    control.order_index,
                    control.description,
                    if control.existing { "existing" } else { "proposed" }
                );
            }
        }
    }
    if !document.actions.is_empty() {
        println!("  actions:");
        for action in &document.actions {
            println!(
                "    [{}] {} (owner: {}, due: {})",
                action.order_index,
                action.description,
                action.owner.as_deref().unwrap_or("unassigned"),
                action
                    .due_date
                    .map_or_else(|| "unset".to_owned(), |d| d.to_string())
            );
        }
    }
}

fn load(file: &Path) -> Result<Document> {
    let text =
        fs::read_to_string(file).with_context(|| format!("reading {}", file.display()))?;
    serde_json::from_str(&text).with_context(|| format!("parsing {}", file.display()))
}

fn save(file: &Path, document: &Document) -> Result<()> {
    let mut text = serde_json::to_string_pretty(document)?;
    text.push('\n');
    fs::write(file, text).with_context(|| format!("writing {}", file.display()))
}

fn undo_path(file: &Path) -> PathBuf {
    let mut path = file.as_os_str().to_owned();
    path.push(".undo");
    PathBuf::from(path)
}
