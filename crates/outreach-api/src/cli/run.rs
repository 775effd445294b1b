//! CLI run operations: start, resume, status, list.

use anyhow::{Context, Result};
use comfy_table::{presets, Cell, Color, ContentArrangement, Table};
use console::style;
use uuid::Uuid;

use outreach_core::pipeline::engine::{EngineError, RunOutcome, RunRequest};
use outreach_core::repository::RunRepository;
use outreach_types::run::{Disposition, RunStatus};
use outreach_types::state::OutreachState;

use crate::state::AppState;

// ---------------------------------------------------------------------------
// Start
// ---------------------------------------------------------------------------

pub async fn start_run(
    state: &AppState,
    message: String,
    url: Option<String>,
    brief: Option<String>,
    json: bool,
) -> Result<()> {
    let request = RunRequest {
        message,
        source_url: url,
        brief: brief.unwrap_or_else(|| state.default_brief.clone()),
    };

    match state.engine.start(request).await {
        Ok(outcome) => print_outcome(&outcome, json),
        Err(EngineError::StageFailed {
            run_id,
            stage,
            error,
        }) => {
            if json {
                let out = serde_json::json!({
                    "run_id": run_id.to_string(),
                    "status": "failed",
                    "stage": stage.to_string(),
                    "error": error,
                });
                println!("{}", serde_json::to_string_pretty(&out)?);
            } else {
                println!();
                println!(
                    "  {} Run {} failed at stage '{}'",
                    style("✗").red().bold(),
                    style(short_id(&run_id)).cyan(),
                    stage
                );
                println!("  {}", style(&error).red());
                println!();
            }
            anyhow::bail!("run failed: {error}");
        }
        Err(e) => Err(e.into()),
    }
}

// ---------------------------------------------------------------------------
// Resume
// ---------------------------------------------------------------------------

pub async fn resume_run(
    state: &AppState,
    run_id_str: &str,
    decision: &str,
    json: bool,
) -> Result<()> {
    let run_id: Uuid = run_id_str
        .parse()
        .with_context(|| format!("Invalid run ID: '{run_id_str}'"))?;

    let outcome = state
        .engine
        .resume(run_id, decision)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to resume run: {e}"))?;

    print_outcome(&outcome, json)
}

// ---------------------------------------------------------------------------
// Status
// ---------------------------------------------------------------------------

pub async fn show_status(state: &AppState, run_id_str: &str, json: bool) -> Result<()> {
    let run_id: Uuid = run_id_str
        .parse()
        .with_context(|| format!("Invalid run ID: '{run_id_str}'"))?;

    let (run, run_state) = state
        .engine
        .checkpoint()
        .restore(run_id)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to load run: {e}"))?;

    if json {
        let out = serde_json::json!({
            "run_id": run.id.to_string(),
            "status": run.status.to_string(),
            "stage": run.stage.map(|s| s.to_string()),
            "disposition": run.disposition.map(|d| d.to_string()),
            "prompt": run.prompt,
            "error": run.error,
            "started_at": run.started_at.to_rfc3339(),
            "completed_at": run.completed_at.map(|t| t.to_rfc3339()),
            "state": run.state,
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    println!();
    println!(
        "  {} Run {}",
        style("Outreach:").bold(),
        style(short_id(&run.id)).cyan()
    );
    println!("  Status: {}", styled_status(run.status));
    if let Some(stage) = run.stage {
        println!("  Stage: {stage}");
    }
    if let Some(disposition) = run.disposition {
        println!("  Outcome: {}", styled_disposition(disposition));
    }
    println!("  Started: {}", run.started_at.format("%Y-%m-%d %H:%M:%S"));
    if let Some(completed) = run.completed_at {
        println!("  Completed: {}", completed.format("%Y-%m-%d %H:%M:%S"));
    }
    if let Some(ref err) = run.error {
        println!("  Error: {}", style(err).red());
    }

    print_conversation(&run_state);

    if run.status == RunStatus::Suspended {
        if let Some(ref prompt) = run.prompt {
            println!("  {}", style(prompt).yellow());
        }
        if let Some(ref draft) = run_state.draft {
            println!();
            for line in draft.lines() {
                println!("    {}", style(line).dim());
            }
        }
        println!();
        println!(
            "  Decide with: {}",
            style(format!("outreach resume {} yes", run.id)).dim()
        );
    }
    println!();

    Ok(())
}

fn print_conversation(run_state: &OutreachState) {
    if run_state.conversation.is_empty() {
        return;
    }
    println!();
    for entry in &run_state.conversation {
        let role = match entry.role {
            outreach_types::state::Role::Human => style("human").cyan(),
            outreach_types::state::Role::Assistant => style("agent").green(),
        };
        println!("  [{role}] {}", entry.text);
    }
}

// ---------------------------------------------------------------------------
// List
// ---------------------------------------------------------------------------

pub async fn list_runs(
    state: &AppState,
    limit: u32,
    suspended_only: bool,
    json: bool,
) -> Result<()> {
    let repo = state.engine.checkpoint().repo();
    let runs = if suspended_only {
        repo.list_suspended()
            .await
            .map_err(|e| anyhow::anyhow!("Failed to list runs: {e}"))?
    } else {
        repo.list_runs(limit)
            .await
            .map_err(|e| anyhow::anyhow!("Failed to list runs: {e}"))?
    };

    if json {
        let out: Vec<_> = runs
            .iter()
            .map(|r| {
                serde_json::json!({
                    "run_id": r.id.to_string(),
                    "status": r.status.to_string(),
                    "stage": r.stage.map(|s| s.to_string()),
                    "disposition": r.disposition.map(|d| d.to_string()),
                    "started_at": r.started_at.to_rfc3339(),
                    "completed_at": r.completed_at.map(|t| t.to_rfc3339()),
                })
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    if runs.is_empty() {
        println!();
        println!("  No runs found.");
        println!(
            "  Start one with: {}",
            style("outreach start <job-url>").dim()
        );
        println!();
        return Ok(());
    }

    let mut table = Table::new();
    table
        .load_preset(presets::UTF8_FULL_CONDENSED)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec![
            Cell::new("Run ID").fg(Color::Cyan),
            Cell::new("Status"),
            Cell::new("Stage"),
            Cell::new("Outcome"),
            Cell::new("Started"),
        ]);

    for r in &runs {
        table.add_row(vec![
            Cell::new(short_id(&r.id)),
            status_cell(r.status),
            Cell::new(r.stage.map(|s| s.to_string()).unwrap_or_else(|| "-".to_string())),
            Cell::new(
                r.disposition
                    .map(|d| d.to_string())
                    .unwrap_or_else(|| "-".to_string()),
            ),
            Cell::new(r.started_at.format("%Y-%m-%d %H:%M").to_string()),
        ]);
    }

    println!();
    println!("{table}");
    println!();

    Ok(())
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn print_outcome(outcome: &RunOutcome, json: bool) -> Result<()> {
    match outcome {
        RunOutcome::Suspended { run_id, payload } => {
            if json {
                let out = serde_json::json!({
                    "run_id": run_id.to_string(),
                    "status": "suspended",
                    "prompt": payload.prompt,
                    "draft": payload.draft,
                });
                println!("{}", serde_json::to_string_pretty(&out)?);
            } else {
                println!();
                println!(
                    "  {} Run {} is awaiting your review",
                    style("⏸").yellow().bold(),
                    style(short_id(run_id)).cyan()
                );
                println!();
                for line in payload.draft.lines() {
                    println!("    {}", style(line).dim());
                }
                println!();
                println!("  {}", style(&payload.prompt).yellow());
                println!();
                println!(
                    "  Approve with: {}",
                    style(format!("outreach resume {run_id} yes")).dim()
                );
                println!(
                    "  Reject with:  {}",
                    style(format!("outreach resume {run_id} no")).dim()
                );
                println!();
            }
        }
        RunOutcome::Completed {
            run_id,
            disposition,
            state,
        } => {
            if json {
                let out = serde_json::json!({
                    "run_id": run_id.to_string(),
                    "status": "completed",
                    "disposition": disposition.to_string(),
                    "conversation": state.conversation,
                });
                println!("{}", serde_json::to_string_pretty(&out)?);
            } else {
                println!();
                println!(
                    "  {} Run {} completed: {}",
                    style("✓").green().bold(),
                    style(short_id(run_id)).cyan(),
                    styled_disposition(*disposition)
                );
                if let Some(last) = state.conversation.last() {
                    println!("  {}", style(&last.text).dim());
                }
                println!();
            }
        }
    }
    Ok(())
}

fn short_id(id: &Uuid) -> String {
    id.to_string().chars().take(8).collect()
}

fn styled_status(status: RunStatus) -> String {
    match status {
        RunStatus::Running => style("running").blue().to_string(),
        RunStatus::Suspended => style("suspended").magenta().to_string(),
        RunStatus::Completed => style("completed").green().to_string(),
        RunStatus::Failed => style("failed").red().to_string(),
    }
}

fn status_cell(status: RunStatus) -> Cell {
    match status {
        RunStatus::Running => Cell::new("running").fg(Color::Blue),
        RunStatus::Suspended => Cell::new("suspended").fg(Color::Magenta),
        RunStatus::Completed => Cell::new("completed").fg(Color::Green),
        RunStatus::Failed => Cell::new("failed").fg(Color::Red),
    }
}

fn styled_disposition(disposition: Disposition) -> String {
    match disposition {
        Disposition::Sent => style("sent").green().to_string(),
        Disposition::SendFailed => style("send failed").red().to_string(),
        Disposition::Rejected => style("rejected").yellow().to_string(),
        Disposition::NoRecipient => style("no recipient").yellow().to_string(),
    }
}
