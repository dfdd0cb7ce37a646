// src/lib.rs

pub mod cli;
pub mod config;
pub mod errors;
pub mod exec;
pub mod executor;
pub mod logging;
pub mod logstore;
pub mod service;
pub mod task;
pub mod types;

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Result, bail};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::cli::CliArgs;
use crate::config::{ConfigFile, default_config_path, load_and_validate, load_or_default};
use crate::exec::{TaskUpdate, channel_observer};
use crate::service::{ScriptService, SubmitRequest};
use crate::task::Task;
use crate::types::TaskStatus;

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - config loading
/// - the executor and script service
/// - a push-update reporter
/// - polling until every submitted task is terminal
/// - Ctrl-C handling
pub async fn run(args: CliArgs) -> Result<()> {
    let cfg = match &args.config {
        Some(path) => load_and_validate(PathBuf::from(path))?,
        None => load_or_default(default_config_path())?,
    };

    if args.dry_run {
        print_dry_run(&cfg);
        return Ok(());
    }

    let poll_interval = cfg
        .config
        .poll_interval()
        .map_err(|e| anyhow::anyhow!("poll_interval: {e}"))?;

    let service = ScriptService::from_config(&cfg)?;

    // Push updates: log status changes as they happen.
    let (update_tx, update_rx) = mpsc::unbounded_channel::<TaskUpdate>();
    let observer = channel_observer(update_tx);
    let reporter = tokio::spawn(report_updates(update_rx));

    let started = service.submit_all(build_requests(&args), Some(observer))?;
    let task_ids: Vec<String> = started
        .into_iter()
        .map(|task| {
            info!(task_id = %task.id, cmd = %task.command, "task started");
            task.id
        })
        .collect();

    let finished = tokio::select! {
        tasks = wait_for_all(&service, &task_ids, poll_interval) => tasks,
        res = tokio::signal::ctrl_c() => {
            if let Err(e) = res {
                warn!(error = %e, "failed to listen for Ctrl+C");
            }
            warn!("interrupted; running tasks are left to finish on their own");
            reporter.abort();
            bail!("interrupted before all tasks finished");
        }
    };
    reporter.abort();

    if args.json {
        println!("{}", serde_json::to_string_pretty(&finished)?);
    } else {
        for task in &finished {
            print_task_report(&service, task)?;
        }
    }

    let failed = finished
        .iter()
        .filter(|t| t.status == TaskStatus::Failed)
        .count();
    if failed > 0 {
        bail!("{failed} of {} task(s) failed", finished.len());
    }
    Ok(())
}

/// One submission per `--script`, plus the trailing command if any. Falls
/// back to the default catalog script when nothing was named.
fn build_requests(args: &CliArgs) -> Vec<SubmitRequest> {
    let owner = args.owner.clone().unwrap_or_default();

    let mut requests: Vec<SubmitRequest> = args
        .scripts
        .iter()
        .map(|name| SubmitRequest::script(owner.clone(), name.clone()))
        .collect();

    if let Some((program, rest)) = args.command.split_first() {
        requests.push(SubmitRequest::executable(
            owner.clone(),
            program,
            rest.to_vec(),
        ));
    }

    if requests.is_empty() {
        requests.push(SubmitRequest {
            owner,
            ..SubmitRequest::default()
        });
    }
    requests
}

/// Poll until every task is terminal (or gone) and return final snapshots.
async fn wait_for_all(service: &ScriptService, task_ids: &[String], interval: Duration) -> Vec<Task> {
    loop {
        let snapshots: Vec<Task> = task_ids
            .iter()
            .filter_map(|id| service.task(id).ok())
            .collect();

        if snapshots.iter().all(Task::is_terminal) {
            return snapshots;
        }

        tokio::time::sleep(interval).await;
    }
}

async fn report_updates(mut rx: mpsc::UnboundedReceiver<TaskUpdate>) {
    let mut last_status: std::collections::HashMap<String, TaskStatus> = Default::default();

    while let Some(update) = rx.recv().await {
        let task = &update.task;
        let changed = last_status.insert(update.task_id.clone(), task.status) != Some(task.status);

        if changed {
            info!(
                task_id = %update.task_id,
                status = %task.status,
                progress = task.progress,
                "task status changed"
            );
        } else {
            debug!(task_id = %update.task_id, progress = task.progress, "task progress");
        }
    }
}

fn print_task_report(service: &ScriptService, task: &Task) -> Result<()> {
    println!(
        "== task {} [{}] owner={} exit={} progress={}%",
        task.id,
        task.status,
        task.owner,
        task.exit_code
            .map(|c| c.to_string())
            .unwrap_or_else(|| "-".to_string()),
        task.progress
    );
    println!("   cmd: {}", task.command);
    if let Some(d) = task.duration() {
        println!("   duration: {} ms", d.num_milliseconds());
    }
    println!("   log: {}", task.log_path.display());
    let logs = service.logs(&task.id)?;
    for line in logs.lines() {
        println!("   | {line}");
    }
    Ok(())
}

/// Simple dry-run output: print effective settings and the script catalog.
fn print_dry_run(cfg: &ConfigFile) {
    println!("scriptexec dry-run");
    println!("  config.logs_dir = {}", cfg.config.logs_dir.display());
    println!("  config.max_tasks = {}", cfg.config.max_tasks);
    println!(
        "  config.progress = {}% per line, capped at {}%",
        cfg.config.progress_step, cfg.config.progress_cap
    );
    println!("  config.poll_interval = {}", cfg.config.poll_interval);
    println!();

    println!("scripts ({}):", cfg.script.len());
    for (name, script) in cfg.script.iter() {
        println!("  - {name}");
        println!("      path: {}", script.path.display());
        if !script.args.is_empty() {
            println!("      args: {:?}", script.args);
        }
        if let Some(ref description) = script.description {
            println!("      description: {description}");
        }
    }

    debug!("dry-run complete (no execution)");
}
