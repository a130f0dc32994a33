//! Integration test infrastructure.
//!
//! Runs the ignored DynamoDB tests of the `itemstore` crate against
//! DynamoDB Local.
//!
//! # Usage
//!
//! ```bash
//! # Start DynamoDB Local, create the test table, run the tests, clean up
//! cargo xtask integration
//!
//! # Skip container management (assumes DynamoDB Local is already running)
//! cargo xtask integration --no-docker
//!
//! # Leave the table and container behind for inspection
//! cargo xtask integration --keep-table --keep-containers
//! ```

mod containers;
pub mod error;

pub use error::{IntegrationError, Result};

use std::time::Duration;

use containers::{ContainerRuntime, DYNAMODB_SPEC};

use crate::dynamodb::{self, AwsConfig};
use crate::prelude::*;

const LOCAL_ENDPOINT: &str = "http://localhost:8000";
const LOCAL_REGION: &str = "eu-central-1";

/// Integration test command.
#[derive(Debug, clap::Parser)]
#[command(long_about = "Run the DynamoDB integration tests against DynamoDB Local.

This command starts a DynamoDB Local container, creates a test table,
runs the ignored tests of the itemstore crate with the matching
environment, then drops the table and stops the container.")]
pub struct IntegrationCommand {
    /// Table to create for the run.
    #[arg(long, default_value = "itemstore-test")]
    pub table_name: String,

    /// Skip Docker container management (assume DynamoDB Local is running).
    #[arg(long)]
    pub no_docker: bool,

    /// Keep containers running after tests complete.
    #[arg(long)]
    pub keep_containers: bool,

    /// Keep the test table after tests complete.
    #[arg(long)]
    pub keep_table: bool,

    /// Timeout in seconds for container health checks.
    #[arg(long, default_value = "30")]
    pub health_timeout: u64,
}

/// Environment handed to `cargo test`.
pub fn test_environment(table_name: &str) -> Vec<(&'static str, String)> {
    vec![
        ("AWS_ENDPOINT_URL", LOCAL_ENDPOINT.to_string()),
        ("AWS_REGION", LOCAL_REGION.to_string()),
        ("AWS_ACCESS_KEY_ID", "test".to_string()),
        ("AWS_SECRET_ACCESS_KEY", "test".to_string()),
        ("DYNAMODB_TABLE_NAME", table_name.to_string()),
    ]
}

/// Main entry point for integration command.
pub async fn run(command: IntegrationCommand, global: crate::Global) -> Result<()> {
    if !global.is_silent() {
        aprintln!("{}", p_b("Integration Tests"));
        aprintln!();
    }

    let env = test_environment(&command.table_name);
    let aws_config = AwsConfig::local(LOCAL_ENDPOINT, LOCAL_REGION);

    let runtime = if command.no_docker {
        if !global.is_silent() {
            aprintln!(
                "{} {}",
                p_y("⚠️"),
                "Skipping DynamoDB container management (--no-docker)"
            );
        }
        None
    } else {
        Some(containers::detect_runtime().await?)
    };

    let mut container_started = false;
    if let Some(rt) = runtime {
        container_started = start_dynamodb_container(rt, &global).await?;
    }

    let client = dynamodb::create_client(&aws_config).await?;
    containers::wait_for_dynamodb(
        &client,
        DYNAMODB_SPEC.name,
        Duration::from_secs(command.health_timeout),
    )
    .await?;

    if !global.is_silent() {
        aprintln!("{} {}", p_b("📦"), "Setting up test table...");
    }
    dynamodb::ensure_table(&client, &command.table_name).await?;

    let passed = run_tests(&env, &global).await?;

    if command.keep_table {
        if !global.is_silent() {
            aprintln!("{} Table '{}' left in place (--keep-table)", p_y("⚠️"), command.table_name);
        }
    } else {
        dynamodb::drop_table(&client, &command.table_name).await?;
    }

    if let Some(rt) = runtime {
        if command.keep_containers {
            if container_started && !global.is_silent() {
                aprintln!("{} {}", p_y("⚠️"), "Container left running (--keep-containers)");
            }
        } else if container_started {
            if !global.is_silent() {
                aprintln!("{} {}", p_b("🐳"), "Stopping DynamoDB Local container...");
            }
            containers::stop_container(rt, DYNAMODB_SPEC.name).await;
        }
    }

    aprintln!();
    if passed {
        aprintln!("{} {}", p_g("✅"), p_g("All integration tests passed!"));
        Ok(())
    } else {
        aprintln!("{} {}", p_r("❌"), p_r("Some integration tests failed"));
        Err(IntegrationError::TestFailed(
            "itemstore integration tests failed".to_string(),
        ))
    }
}

/// Runs the ignored tests of the itemstore crate.
async fn run_tests(env: &[(&'static str, String)], global: &crate::Global) -> Result<bool> {
    if !global.is_silent() {
        aprintln!("{} {}", p_b("🔧"), p_b("Running DynamoDB integration tests..."));
    }

    let mut cmd = tokio::process::Command::new("cargo");
    cmd.args([
        "test",
        "-p",
        "itemstore",
        "--features",
        "dynamodb",
        "--",
        "--ignored",
    ]);
    if global.is_verbose() {
        cmd.arg("--nocapture");
    }
    for (key, value) in env {
        cmd.env(key, value);
    }

    let status = cmd.status().await?;
    Ok(status.success())
}

/// Starts DynamoDB Local unless it is already running. Returns whether this
/// run started it.
async fn start_dynamodb_container(runtime: ContainerRuntime, global: &crate::Global) -> Result<bool> {
    if containers::is_running(runtime, DYNAMODB_SPEC.name).await? {
        if !global.is_silent() {
            aprintln!("{} {}", p_y("⚠️"), "DynamoDB Local container already running");
        }
        return Ok(false);
    }

    if !global.is_silent() {
        aprintln!("{} {}", p_b("🐳"), "Starting DynamoDB Local container...");
    }
    containers::start_container(runtime, &DYNAMODB_SPEC).await?;

    if !global.is_silent() {
        aprintln!("{} {}", p_g("✅"), "DynamoDB Local started");
    }
    Ok(true)
}
