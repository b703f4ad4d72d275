//! stagehand-eval-worker - Subprocess for dry-run rule evaluation.
//!
//! This binary is spawned by front-ends to answer "what would the engine
//! do against this context" without touching extension state. It loads
//! the rule directories, runs one planning round, and prints the winning
//! change set as JSON.
//!
//! Usage: stagehand-eval-worker <rules_dir> [context_file]
//!
//! The optional context file is JSON; omitted fields fall back to the
//! host OS and current wall-clock time with no documents open.

#![cfg_attr(target_os = "windows", windows_subsystem = "windows")]

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use tracing_subscriber::filter::EnvFilter;

use stagehand_core::engine::DocumentView;
use stagehand_core::rules::{default_custom_dir, load_rules};
use stagehand_core::{Engine, EvalContext, PlannedChange};
use stagehand_types::OsKind;

/// Extension id of the controller itself; never a valid target.
const CONTROLLER_ID: &str = "stagehand";

/// Context snapshot handed in by the spawning process.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct WorkerContext {
    current_url: Option<String>,
    open_urls: Vec<String>,
    scene: Option<String>,
    os: Option<OsKind>,
    now: Option<chrono::NaiveDateTime>,
}

impl WorkerContext {
    fn into_eval_context(self) -> EvalContext {
        let mut ctx = EvalContext::new();

        ctx.current_document = self.current_url.as_deref().map(DocumentView::new);
        ctx.open_documents = self.open_urls.iter().map(DocumentView::new).collect();
        // The active document counts as open even if the caller listed
        // only background tabs.
        if let Some(current) = &ctx.current_document {
            if !ctx.open_documents.contains(current) {
                ctx.open_documents.push(current.clone());
            }
        }
        ctx.active_scene = self.scene;
        if let Some(os) = self.os {
            ctx.os = os;
        }
        if let Some(now) = self.now {
            ctx.now = now;
        }

        ctx
    }
}

#[derive(Debug, Serialize)]
struct WorkerOutput {
    rule_count: usize,
    plan: Vec<PlannedChange>,
    elapsed_ms: u128,
}

/// Initialize logging, writing to STAGEHAND_LOG_PATH if set, otherwise stderr.
fn init_logging() {
    let filter = EnvFilter::builder()
        .with_default_directive(tracing::Level::INFO.into())
        .from_env_lossy();

    // If STAGEHAND_LOG_PATH is set, append to that file (shared with main app)
    if let Ok(path) = std::env::var("STAGEHAND_LOG_PATH") {
        if let Ok(file) = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
        {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_target(true)
                .with_ansi(false)
                .with_writer(file)
                .init();
            return;
        }
    }

    // Fallback to stderr
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    // Separate process, needs its own subscriber
    init_logging();

    let args: Vec<String> = std::env::args().collect();
    if args.len() < 2 {
        tracing::error!("Usage: stagehand-eval-worker <rules_dir> [context_file]");
        std::process::exit(1);
    }

    let rules_dir = PathBuf::from(&args[1]);
    let context_file = args.get(2).map(PathBuf::from);

    let ctx = match context_file {
        Some(path) => match load_context(&path) {
            Ok(ctx) => ctx,
            Err(e) => {
                tracing::error!(path = %path.display(), error = %e, "Failed to load context file");
                std::process::exit(1);
            }
        },
        None => EvalContext::new(),
    };

    let custom_dir = default_custom_dir();
    let book = match load_rules(Some(&rules_dir), custom_dir.as_deref()) {
        Ok(book) => book,
        Err(e) => {
            tracing::error!(error = %e, "Failed to load rule directories");
            std::process::exit(1);
        }
    };

    let timer = std::time::Instant::now();

    let mut engine = Engine::new(CONTROLLER_ID, book);
    let output = WorkerOutput {
        rule_count: engine.book().rule_count(),
        plan: engine.plan_round(&ctx),
        elapsed_ms: timer.elapsed().as_millis(),
    };

    // JSON to stdout for the spawning process
    match serde_json::to_string(&output) {
        Ok(json) => println!("{json}"),
        Err(e) => {
            tracing::error!(error = %e, "Failed to serialize plan");
            std::process::exit(1);
        }
    }
}

fn load_context(path: &std::path::Path) -> Result<EvalContext, String> {
    let contents =
        std::fs::read_to_string(path).map_err(|e| format!("failed to read context: {e}"))?;
    let worker_ctx: WorkerContext =
        serde_json::from_str(&contents).map_err(|e| format!("invalid context JSON: {e}"))?;
    Ok(worker_ctx.into_eval_context())
}
