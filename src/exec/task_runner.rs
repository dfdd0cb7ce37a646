// src/exec/task_runner.rs

//! Per-task worker: runs one process and drives its record to a terminal
//! state.

use std::io::Write;
use std::process::Stdio;
use std::sync::Arc;

use anyhow::{Context, Result, anyhow};
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncReadExt, BufReader};
use tokio::process::Command;
use tracing::{debug, error, info, trace, warn};

use crate::exec::observer::{Observer, notify};
use crate::exec::progress::ProgressPolicy;
use crate::logstore::{self, LogStore};
use crate::task::TaskRegistry;
use crate::types::TaskId;

type LogWriter = Box<dyn Write + Send>;

/// Shared handles a worker needs. Cheap to clone.
#[derive(Debug, Clone)]
pub struct WorkerContext {
    pub registry: Arc<TaskRegistry>,
    pub logs: Arc<dyn LogStore>,
    pub progress: ProgressPolicy,
}

/// Run the process for an already-`running` task until it exits.
///
/// Every error raised while launching, streaming or waiting is caught here
/// and turned into a `failed` record with progress 100: nothing propagates
/// to whoever started the task.
pub async fn run_task(ctx: WorkerContext, task_id: TaskId, observer: Option<Observer>) {
    let mut log: Option<LogWriter> = None;

    if let Err(err) = run_task_inner(&ctx, &task_id, observer.as_ref(), &mut log).await {
        let message = format!("{err:#}");
        error!(task_id = %task_id, error = %message, "task execution error");

        write_failure_block(&ctx, &task_id, &mut log, &message);

        let snapshot = ctx.registry.mutate(&task_id, |task| {
            task.fail(message);
            task.clone()
        });
        if let Err(e) = notify(observer.as_ref(), &task_id, snapshot) {
            warn!(task_id = %task_id, error = %e, "observer failed on terminal update");
        }
    }
}

async fn run_task_inner(
    ctx: &WorkerContext,
    task_id: &TaskId,
    observer: Option<&Observer>,
    log: &mut Option<LogWriter>,
) -> Result<()> {
    let task = ctx
        .registry
        .get(task_id)
        .ok_or_else(|| anyhow!("task '{task_id}' is no longer in the registry"))?;
    notify(observer, task_id, Some(task.clone()))?;

    info!(task_id = %task_id, owner = %task.owner, cmd = %task.command, "starting task process");

    let mut child = Command::new(&task.command.program)
        .args(&task.command.args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .with_context(|| format!("spawning process '{}'", task.command.program.display()))?;

    debug!(task_id = %task_id, pid = ?child.id(), "process spawned");

    let stdout = child
        .stdout
        .take()
        .context("process stdout was not captured")?;

    // Drain stderr concurrently so a chatty process cannot block on a full
    // pipe while we are still reading stdout.
    let stderr_reader = tokio::spawn(read_all(child.stderr.take()));

    let writer = log.insert(ctx.logs.open_write(&task.log_path)?);

    let mut reader = BufReader::new(stdout);
    let mut buf = Vec::new();
    let mut lines_seen = 0usize;

    loop {
        buf.clear();
        let n = reader
            .read_until(b'\n', &mut buf)
            .await
            .context("reading process stdout")?;
        if n == 0 {
            break;
        }

        let line = String::from_utf8_lossy(&buf);
        logstore::append(writer.as_mut(), &line)
            .with_context(|| format!("writing log file {:?}", task.log_path))?;

        lines_seen += 1;
        let progress = ctx.progress.for_lines(lines_seen);
        let snapshot = ctx.registry.mutate(task_id, |t| {
            t.record_output(&line, progress);
            t.clone()
        });
        trace!(task_id = %task_id, lines_seen, progress, "stdout line captured");
        notify(observer, task_id, snapshot)?;
    }

    let status = child
        .wait()
        .await
        .with_context(|| format!("waiting for process of task '{task_id}'"))?;
    let exit_code = status.code().unwrap_or(-1);

    let stderr = match stderr_reader.await {
        Ok(text) => text,
        Err(e) => {
            warn!(task_id = %task_id, error = %e, "stderr reader did not finish cleanly");
            String::new()
        }
    };

    info!(
        task_id = %task_id,
        exit_code,
        success = exit_code == 0,
        lines = lines_seen,
        "task process exited"
    );

    // The log always leads the record: once a poller sees a terminal status
    // the log, error block included, is already complete.
    if exit_code != 0 {
        if let Err(e) = logstore::append(writer.as_mut(), &logstore::error_block(&stderr)) {
            warn!(task_id = %task_id, error = %e, "failed to append error block to log");
        }
    }

    let snapshot = ctx.registry.mutate(task_id, |t| {
        t.complete(exit_code, stderr);
        t.clone()
    });
    if let Err(e) = notify(observer, task_id, snapshot) {
        warn!(task_id = %task_id, error = %e, "observer failed on terminal update");
    }

    Ok(())
}

/// Best-effort error block for a failure that happened outside the normal
/// exit path. Opens the log first if the worker never got that far.
fn write_failure_block(
    ctx: &WorkerContext,
    task_id: &TaskId,
    log: &mut Option<LogWriter>,
    message: &str,
) {
    if log.is_none() {
        let Some(path) = ctx.registry.get(task_id).map(|t| t.log_path) else {
            return;
        };
        match ctx.logs.open_write(&path) {
            Ok(writer) => *log = Some(writer),
            Err(e) => {
                warn!(task_id = %task_id, error = %format!("{e:#}"), "log unavailable for error block");
                return;
            }
        }
    }

    if let Some(writer) = log.as_mut() {
        if let Err(e) = logstore::append(writer.as_mut(), &logstore::error_block(message)) {
            warn!(task_id = %task_id, error = %e, "failed to append error block to log");
        }
    }
}

async fn read_all<R: AsyncRead + Unpin>(stream: Option<R>) -> String {
    let Some(mut stream) = stream else {
        return String::new();
    };
    let mut bytes = Vec::new();
    if let Err(e) = stream.read_to_end(&mut bytes).await {
        debug!(error = %e, "stopped reading stream early");
    }
    String::from_utf8_lossy(&bytes).into_owned()
}
