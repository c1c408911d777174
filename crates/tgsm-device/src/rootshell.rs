use std::{io, process::Stdio, time::Duration};

use tokio::{
    io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines},
    process::{Child, ChildStdin, ChildStdout, Command},
};
use tracing::warn;

use crate::{config, DeviceHandle};

const ESCALATION_DEADLINE: Duration = Duration::from_secs(10);

/// One interactive privileged shell bound to a device, scoped to a single
/// command batch. Never reused across batches.
struct RootShell {
    child: Child,
    stdin: Option<ChildStdin>,
    lines: Lines<BufReader<ChildStdout>>,
}

impl RootShell {
    async fn spawn(handle: &DeviceHandle) -> io::Result<Self> {
        let addr = handle.addr();
        let mut child = Command::new(config::adb_path())
            .args(["-s", addr.as_str(), "shell"])
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            // Failures surface as absent stdout; callers parse defensively.
            .stderr(Stdio::null())
            .spawn()?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| io::Error::other("shell stdin unavailable"))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| io::Error::other("shell stdout unavailable"))?;

        Ok(Self {
            child,
            stdin: Some(stdin),
            lines: BufReader::new(stdout).lines(),
        })
    }

    async fn write_line(&mut self, line: &str) -> io::Result<()> {
        let stdin = self
            .stdin
            .as_mut()
            .ok_or_else(|| io::Error::other("shell stdin already closed"))?;
        stdin.write_all(line.as_bytes()).await?;
        stdin.write_all(b"\n").await?;
        stdin.flush().await?;
        Ok(())
    }

    async fn next_line(&mut self, timeout: Duration) -> io::Result<Option<String>> {
        match tokio::time::timeout(timeout, self.lines.next_line()).await {
            Ok(result) => result,
            // Quiet interval, not an error.
            Err(_) => Ok(None),
        }
    }

    /// Request privilege escalation and poll for the prompt marker. On
    /// timeout the batch proceeds without confirmed escalation; commands
    /// may then fail silently at the OS level.
    async fn escalate(&mut self, output: &mut String) -> io::Result<()> {
        self.write_line("su").await?;
        tokio::time::sleep(config::SHELL_PROMPT_POLL).await;

        let deadline = tokio::time::Instant::now() + ESCALATION_DEADLINE;
        loop {
            match self.next_line(config::SHELL_PROMPT_POLL).await? {
                Some(line) => {
                    let is_prompt = line.contains('#');
                    output.push_str(&line);
                    output.push('\n');
                    if is_prompt {
                        return Ok(());
                    }
                }
                None => return Ok(()),
            }
            if tokio::time::Instant::now() >= deadline {
                warn!("root prompt not observed, proceeding without confirmed escalation");
                return Ok(());
            }
        }
    }

    /// Write one command and collect output until quiescence: an interval
    /// with no new data, an empty line, or EOF ends the command. This is a
    /// timing heuristic, not a structural end-of-output signal.
    async fn run_command(&mut self, cmd: &str, output: &mut String) -> io::Result<()> {
        self.write_line(cmd).await?;
        tokio::time::sleep(config::SHELL_COMMAND_SETTLE).await;

        loop {
            match self.next_line(config::SHELL_QUIESCENCE_READ).await? {
                Some(line) => {
                    if line.trim().is_empty() {
                        return Ok(());
                    }
                    output.push_str(&line);
                    output.push('\n');
                }
                None => return Ok(()),
            }
        }
    }

    async fn shutdown(&mut self) -> io::Result<()> {
        // Close the privilege shell, then the outer shell.
        self.write_line("exit").await?;
        self.write_line("exit").await?;
        self.stdin.take();
        let _ = tokio::time::timeout(config::SHELL_EXIT_WAIT, self.child.wait()).await;
        Ok(())
    }

    async fn terminate(&mut self) {
        let _ = self.child.start_kill();
        let _ = tokio::time::timeout(config::SHELL_EXIT_WAIT, self.child.wait()).await;
    }
}

async fn drive_batch(shell: &mut RootShell, commands: &[&str], output: &mut String) -> io::Result<()> {
    shell.escalate(output).await?;
    for cmd in commands {
        shell.run_command(cmd, output).await?;
    }
    shell.shutdown().await
}

/// Execute an ordered batch of privileged commands and return their
/// concatenated output. `false` only on spawn/communication errors; a
/// command's own failure shows only as absent output. The spawned shell is
/// terminated on every exit path.
pub async fn run_root_batch(handle: &DeviceHandle, commands: &[&str]) -> (bool, String) {
    let mut shell = match RootShell::spawn(handle).await {
        Ok(shell) => shell,
        Err(err) => {
            warn!("failed to spawn device shell: {err}");
            return (false, String::new());
        }
    };

    let mut output = String::new();
    let result = drive_batch(&mut shell, commands, &mut output).await;

    // Unconditional: the process must not outlive the batch.
    shell.terminate().await;

    match result {
        Ok(()) => (true, output.trim().to_string()),
        Err(err) => {
            warn!("root shell batch failed: {err}");
            (false, String::new())
        }
    }
}
