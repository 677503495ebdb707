//! External tool invocation
//!
//! Every subprocess is killed if the awaiting task is dropped, so aborting a
//! task on shutdown never leaves a stray `aplay` behind.

use std::ffi::OsStr;
use std::process::{ExitStatus, Stdio};
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::debug;

/// Exit status and diagnostics of a finished tool
#[derive(Debug)]
pub struct Finished {
    pub status: ExitStatus,
    pub stderr: String,
}

impl Finished {
    pub fn success(&self) -> bool {
        self.status.success()
    }
}

/// Run `program` to completion, optionally feeding `stdin`, capturing stderr.
pub async fn run<I, S>(program: &str, args: I, stdin: Option<&[u8]>) -> std::io::Result<Finished>
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    let mut command = Command::new(program);
    command
        .args(args)
        .stdin(if stdin.is_some() {
            Stdio::piped()
        } else {
            Stdio::null()
        })
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    debug!("Spawning {:?}", command.as_std());
    let mut child = command.spawn()?;

    if let (Some(input), Some(mut pipe)) = (stdin, child.stdin.take()) {
        // A tool that exits without reading its input is judged by its exit status
        match pipe.write_all(input).await {
            Err(e) if e.kind() != std::io::ErrorKind::BrokenPipe => return Err(e),
            _ => {}
        }
        drop(pipe);
    }

    let output = child.wait_with_output().await?;
    Ok(Finished {
        status: output.status,
        stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
    })
}
