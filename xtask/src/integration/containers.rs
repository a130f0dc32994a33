//! DynamoDB Local container lifecycle.
//!
//! Pure functions build the runtime arguments; the async functions run
//! them.

use std::time::Duration;

use aws_sdk_dynamodb::Client;
use tokio::process::Command;

use super::error::{IntegrationError, Result};

/// Container runtime (Docker or Podman).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ContainerRuntime {
    #[default]
    Docker,
    Podman,
}

/// Specification for a container.
#[derive(Debug, Clone)]
pub struct ContainerSpec {
    pub name: &'static str,
    pub image: &'static str,
    pub port: u16,
    pub command: Option<&'static str>,
}

/// DynamoDB Local, in-memory so every run starts empty.
pub const DYNAMODB_SPEC: ContainerSpec = ContainerSpec {
    name: "itemstore-dynamodb",
    image: "amazon/dynamodb-local:latest",
    port: 8000,
    command: Some("-jar DynamoDBLocal.jar -sharedDb -inMemory"),
};

/// Builds arguments for `docker run` / `podman run`.
pub fn container_run_args(spec: &ContainerSpec) -> Vec<String> {
    let mut args = vec![
        "run".to_string(),
        "--name".to_string(),
        spec.name.to_string(),
        "-d".to_string(),
        "-p".to_string(),
        format!("{}:{}", spec.port, spec.port),
        spec.image.to_string(),
    ];

    if let Some(cmd) = spec.command {
        args.extend(cmd.split_whitespace().map(String::from));
    }

    args
}

/// Returns the command name for the container runtime.
pub fn runtime_command(runtime: ContainerRuntime) -> &'static str {
    match runtime {
        ContainerRuntime::Docker => "docker",
        ContainerRuntime::Podman => "podman",
    }
}

/// Detects which container runtime is available, Docker first.
pub async fn detect_runtime() -> Result<ContainerRuntime> {
    for runtime in [ContainerRuntime::Docker, ContainerRuntime::Podman] {
        let output = Command::new(runtime_command(runtime))
            .arg("--version")
            .output()
            .await;

        if let Ok(output) = output {
            if output.status.success() {
                return Ok(runtime);
            }
        }
    }

    Err(IntegrationError::DockerNotAvailable(
        "Neither docker nor podman found in PATH".to_string(),
    ))
}

/// True when a container with `name` is running.
pub async fn is_running(runtime: ContainerRuntime, name: &str) -> Result<bool> {
    let output = Command::new(runtime_command(runtime))
        .args(["ps", "-q", "-f", &format!("name={}", name)])
        .output()
        .await?;

    Ok(!String::from_utf8_lossy(&output.stdout).trim().is_empty())
}

/// Stops and removes a container.
///
/// Errors are ignored since the container might not exist.
pub async fn stop_container(runtime: ContainerRuntime, name: &str) {
    let cmd = runtime_command(runtime);
    let _ = Command::new(cmd).args(["stop", name]).output().await;
    let _ = Command::new(cmd).args(["rm", name]).output().await;
}

/// Starts a container, replacing any stopped one with the same name.
pub async fn start_container(runtime: ContainerRuntime, spec: &ContainerSpec) -> Result<()> {
    stop_container(runtime, spec.name).await;

    let args = container_run_args(spec);
    let output = Command::new(runtime_command(runtime))
        .args(&args)
        .output()
        .await?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(IntegrationError::ContainerFailed(format!(
            "Failed to start container '{}': {}",
            spec.name, stderr
        )));
    }

    Ok(())
}

/// Polls DynamoDB Local with `ListTables` until it answers or `timeout`
/// passes.
pub async fn wait_for_dynamodb(client: &Client, name: &str, timeout: Duration) -> Result<()> {
    let start = std::time::Instant::now();
    let poll_interval = Duration::from_millis(500);

    while start.elapsed() < timeout {
        if client.list_tables().limit(1).send().await.is_ok() {
            return Ok(());
        }
        tokio::time::sleep(poll_interval).await;
    }

    Err(IntegrationError::ContainerNotHealthy {
        name: name.to_string(),
        timeout_secs: timeout.as_secs(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_container_run_args() {
        let args = container_run_args(&DYNAMODB_SPEC);

        assert_eq!(&args[..4], ["run", "--name", "itemstore-dynamodb", "-d"]);
        assert!(args.contains(&"8000:8000".to_string()));
        assert!(args.contains(&"amazon/dynamodb-local:latest".to_string()));
        assert!(args.contains(&"-inMemory".to_string()));
        assert_eq!(args.last().map(String::as_str), Some("-inMemory"));
    }

    #[test]
    fn test_runtime_command() {
        assert_eq!(runtime_command(ContainerRuntime::Docker), "docker");
        assert_eq!(runtime_command(ContainerRuntime::Podman), "podman");
    }
}
