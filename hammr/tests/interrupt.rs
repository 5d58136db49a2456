#![cfg(unix)]

use std::io::{BufRead as _, BufReader};
use std::net::TcpListener;
use std::process::{Child, Command, Stdio};
use std::sync::mpsc;
use std::thread;
use std::time::{Duration, Instant};

use anyhow::Context as _;
use nix::sys::signal::{Signal, kill};
use nix::unistd::Pid;
use serde::Deserialize;

const READY_LINE: &str = "starting workers";

#[derive(Debug, Deserialize)]
struct SummaryLine {
    kind: String,
    concurrency: usize,
    workers_reported: usize,
    stopped_early: bool,
    elapsed_secs: f64,
}

struct Running {
    child: Child,
    stderr: thread::JoinHandle<Vec<String>>,
}

/// Spawn hammr with info logs and wait until its workers are up.
fn spawn_until_ready(args: &[&str], dir: &std::path::Path) -> anyhow::Result<Running> {
    let mut child = Command::new(env!("CARGO_BIN_EXE_hammr"))
        .args(args)
        .arg("-v")
        .current_dir(dir)
        .env_remove("HAMMR_CONFIG")
        .env_remove("RUST_LOG")
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .context("spawn hammr")?;

    let stderr = child.stderr.take().context("stderr not piped")?;
    let (ready_tx, ready_rx) = mpsc::channel();
    let stderr = thread::spawn(move || {
        let mut lines = Vec::new();
        for line in BufReader::new(stderr).lines().map_while(Result::ok) {
            if line.contains(READY_LINE) {
                let _ = ready_tx.send(());
            }
            lines.push(line);
        }
        lines
    });

    if ready_rx.recv_timeout(Duration::from_secs(10)).is_err() {
        let _ = child.kill();
        let _ = child.wait();
        let lines = stderr.join().unwrap_or_default();
        anyhow::bail!("hammr never started its workers:\n{}", lines.join("\n"));
    }
    // The Ctrl-C listener is spawned before the workers; give it a moment to register.
    thread::sleep(Duration::from_millis(300));

    Ok(Running { child, stderr })
}

fn interrupt(child: &Child) -> anyhow::Result<()> {
    let pid = i32::try_from(child.id()).context("pid out of range")?;
    kill(Pid::from_raw(pid), Signal::SIGINT).context("send SIGINT")
}

#[tokio::test]
async fn ctrl_c_reports_partial_run() -> anyhow::Result<()> {
    let dir = tempfile::tempdir().context("create temp dir")?;

    tokio::task::spawn_blocking(move || {
        let started = Instant::now();
        let running = spawn_until_ready(
            &["-a", "noop", "-c", "4", "-d", "60", "--output", "json"],
            dir.path(),
        )?;

        interrupt(&running.child)?;
        let out = running
            .child
            .wait_with_output()
            .context("wait for hammr")?;
        let wall = started.elapsed();
        let stderr = running.stderr.join().unwrap_or_default().join("\n");

        let stdout = String::from_utf8_lossy(&out.stdout).to_string();
        anyhow::ensure!(
            out.status.code() == Some(0),
            "hammr exited with {}\nstdout:\n{stdout}\nstderr:\n{stderr}",
            out.status
        );
        anyhow::ensure!(wall < Duration::from_secs(20), "run took {wall:?}");
        anyhow::ensure!(
            stderr.contains("interrupted") && !stderr.contains('\u{1b}'),
            "expected a plain interrupt warning on redirected stderr:\n{stderr:?}"
        );

        let line = stdout
            .lines()
            .find(|l| !l.trim().is_empty())
            .with_context(|| format!("no summary line\nstderr:\n{stderr}"))?;
        let summary: SummaryLine =
            serde_json::from_str(line).with_context(|| format!("bad summary: {line}"))?;
        anyhow::ensure!(summary.kind == "summary", "kind: {summary:?}");
        anyhow::ensure!(summary.stopped_early, "not stopped early: {summary:?}");
        anyhow::ensure!(summary.concurrency == 4, "concurrency: {summary:?}");
        anyhow::ensure!(summary.workers_reported == 4, "workers: {summary:?}");
        anyhow::ensure!(summary.elapsed_secs < 20.0, "elapsed: {summary:?}");
        Ok(())
    })
    .await
    .context("spawn_blocking join")?
}

#[tokio::test]
async fn second_ctrl_c_exits_while_requests_hang() -> anyhow::Result<()> {
    // Accepts connections through the backlog but never answers.
    let silent = TcpListener::bind("127.0.0.1:0").context("bind silent listener")?;
    let addr = silent.local_addr().context("listener addr")?;
    let dir = tempfile::tempdir().context("create temp dir")?;
    std::fs::write(
        dir.path().join("conf.yaml"),
        format!("conf:\n  validatorNodes: [\"{addr}\"]\n"),
    )
    .context("write conf.yaml")?;

    tokio::task::spawn_blocking(move || {
        let running = spawn_until_ready(
            &["-a", "http", "-c", "2", "-d", "60", "--output", "json"],
            dir.path(),
        )?;

        interrupt(&running.child)?;
        thread::sleep(Duration::from_millis(500));
        let mut child = running.child;
        anyhow::ensure!(
            child.try_wait().context("poll hammr")?.is_none(),
            "hammr exited before its requests timed out"
        );

        let interrupted_at = Instant::now();
        interrupt(&child)?;
        let out = child.wait_with_output().context("wait for hammr")?;
        let waited = interrupted_at.elapsed();
        let stderr = running.stderr.join().unwrap_or_default().join("\n");
        drop(silent);

        let stdout = String::from_utf8_lossy(&out.stdout).to_string();
        anyhow::ensure!(
            out.status.code() == Some(130),
            "hammr exited with {}\nstdout:\n{stdout}\nstderr:\n{stderr}",
            out.status
        );
        anyhow::ensure!(waited < Duration::from_secs(5), "exit took {waited:?}");
        anyhow::ensure!(stdout.trim().is_empty(), "unexpected report:\n{stdout}");
        anyhow::ensure!(
            stderr.contains("interrupted again"),
            "missing abort message:\n{stderr}"
        );
        Ok(())
    })
    .await
    .context("spawn_blocking join")?
}
