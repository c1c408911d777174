use std::{fmt, io, process::Stdio};

use tokio::process::Command;
use tracing::{info, warn};

use crate::config;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BootstrapAction {
    StartedNewContainer,
}

#[derive(Debug, Default)]
pub struct ContainerStatus {
    pub running: bool,
    pub name: Option<String>,
    pub id: Option<String>,
    pub action: Option<BootstrapAction>,
}

#[derive(Debug)]
pub enum BootstrapError {
    LaunchFailed(String),
    Io(String),
}

impl fmt::Display for BootstrapError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BootstrapError::LaunchFailed(detail) => {
                write!(f, "failed to launch android container: {detail}")
            }
            BootstrapError::Io(detail) => write!(f, "container runtime error: {detail}"),
        }
    }
}

impl std::error::Error for BootstrapError {}

pub(crate) async fn run_shell_command(command: &str) -> io::Result<(bool, i32, String, String)> {
    let mut cmd = Command::new("sh");
    cmd.arg("-lc")
        .arg(command)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());
    let output = cmd.output().await?;

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    let code = output.status.code().unwrap_or(-1);
    Ok((output.status.success(), code, stdout, stderr))
}

async fn docker_available() -> bool {
    let cmd = format!("{} --version", config::docker_path());
    match run_shell_command(&cmd).await {
        Ok((ok, _, _, _)) => ok,
        Err(_) => false,
    }
}

pub fn match_container_name(names: &str) -> Option<String> {
    names
        .lines()
        .map(str::trim)
        .find(|line| !line.is_empty() && (line.contains("redroid") || line.contains("android")))
        .map(str::to_string)
}

async fn find_running_container() -> io::Result<Option<(String, Option<String>)>> {
    let docker = config::docker_path();
    let (ok, _, stdout, stderr) =
        run_shell_command(&format!("{docker} ps --format '{{{{.Names}}}}'")).await?;
    if !ok {
        warn!("docker ps failed: {}", stderr.trim());
        return Ok(None);
    }
    let Some(name) = match_container_name(&stdout) else {
        return Ok(None);
    };

    let id_cmd = format!("{docker} ps --filter name={name} --format '{{{{.ID}}}}'");
    let id = match run_shell_command(&id_cmd).await {
        Ok((true, _, stdout, _)) => {
            let id = stdout.trim().to_string();
            if id.is_empty() {
                None
            } else {
                Some(id)
            }
        }
        _ => None,
    };
    Ok(Some((name, id)))
}

pub fn launch_command() -> String {
    format!(
        "{} run -itd --rm --privileged --pull always --name {} -v {} -p {} {}",
        config::docker_path(),
        config::CONTAINER_NAME,
        config::container_data_mount(),
        config::CONTAINER_PORT_MAPPING,
        config::CONTAINER_IMAGE,
    )
}

async fn launch_container() -> Result<(), BootstrapError> {
    let cmd = launch_command();
    info!("launching android container: {cmd}");
    let (ok, code, _, stderr) = run_shell_command(&cmd)
        .await
        .map_err(|e| BootstrapError::Io(e.to_string()))?;
    if !ok {
        return Err(BootstrapError::LaunchFailed(format!(
            "exit {code}: {}",
            stderr.trim()
        )));
    }
    info!(
        "container started, waiting {}s for boot",
        config::CONTAINER_WARMUP.as_secs()
    );
    tokio::time::sleep(config::CONTAINER_WARMUP).await;
    Ok(())
}

/// Ensure the emulated device environment is running. Without a container
/// runtime an externally provided environment is assumed present and no
/// launch is attempted.
pub async fn ensure_running() -> Result<ContainerStatus, BootstrapError> {
    if !docker_available().await {
        info!("docker unavailable, assuming externally provided android environment");
        return Ok(ContainerStatus {
            running: true,
            name: Some("android".into()),
            id: None,
            action: None,
        });
    }

    match find_running_container().await {
        Ok(Some((name, id))) => {
            info!("found running container: {name}");
            return Ok(ContainerStatus {
                running: true,
                name: Some(name),
                id,
                action: None,
            });
        }
        Ok(None) => info!("no running android container found"),
        Err(err) => warn!("container check failed: {err}"),
    }

    launch_container().await?;
    Ok(ContainerStatus {
        running: true,
        name: Some(config::CONTAINER_NAME.into()),
        id: None,
        action: Some(BootstrapAction::StartedNewContainer),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matches_redroid_and_android_names() {
        assert_eq!(
            match_container_name("redroid12\nother\n"),
            Some("redroid12".into())
        );
        assert_eq!(
            match_container_name("db\nandroid-ci\n"),
            Some("android-ci".into())
        );
        assert_eq!(match_container_name("postgres\nnginx\n"), None);
        assert_eq!(match_container_name("\n  \n"), None);
    }

    #[test]
    fn launch_command_carries_fixed_image_and_ports() {
        let cmd = launch_command();
        assert!(cmd.contains("--name redroid12"));
        assert!(cmd.contains("-p 5555:5555"));
        assert!(cmd.contains("redroid/redroid:12.0.0_64only-latest"));
        assert!(cmd.contains(":/data"));
    }
}
