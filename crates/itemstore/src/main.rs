//! itemctl - inspect and edit items and locks in an itemstore table.

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use serde_json::Value;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use itemstore::storage::dynamodb::DynamoDbStore;
use itemstore::{ItemKey, ItemLock, JsonItem, Repository, RepositoryConfig};

/// itemctl - inspect and edit items and locks in an itemstore table
#[derive(Debug, Parser)]
#[command(name = "itemctl")]
#[command(version, about, long_about = None)]
struct Cli {
    /// DynamoDB table name
    #[arg(long, env = "DYNAMODB_TABLE_NAME", default_value = itemstore::config::DEFAULT_TABLE_NAME)]
    table_name: String,

    /// AWS region
    #[arg(long, env = "AWS_REGION", default_value = itemstore::config::DEFAULT_REGION)]
    region: String,

    /// Custom endpoint, e.g. http://localhost:8000 for DynamoDB Local
    #[arg(long, env = "AWS_ENDPOINT_URL")]
    endpoint_url: Option<String>,

    /// Lock lease duration in seconds
    #[arg(long, env = "LOCK_LEASE_SECONDS", default_value_t = 300)]
    lease_seconds: u64,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Create or replace an item from a JSON object.
    Put {
        object_type: String,
        id: String,
        /// Item attributes as a JSON object.
        json: String,
    },
    /// Print one item.
    Get { object_type: String, id: String },
    /// Delete one item. Deleting a missing item succeeds.
    Delete { object_type: String, id: String },
    /// Print every item of an object type.
    Query { object_type: String },
    /// Lock an item and print the lock.
    Lock { object_type: String, id: String },
    /// Renew a lock printed by `lock` and print the renewed lock.
    Renew {
        /// Lock as printed by `lock`.
        lock: String,
    },
    /// Remove a lock without checking ownership.
    Unlock {
        /// Lock as printed by `lock`.
        lock: String,
    },
    /// Remove a lock only if it is still held.
    Release {
        /// Lock as printed by `lock`.
        lock: String,
    },
}

impl Cli {
    fn config(&self) -> RepositoryConfig {
        let mut config = RepositoryConfig::from_vars(|_| None)
            .with_table_name(&self.table_name)
            .with_region(&self.region)
            .with_lease_duration(std::time::Duration::from_secs(self.lease_seconds));
        if let Some(url) = &self.endpoint_url {
            config = config.with_endpoint_url(url);
        }
        config
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "itemstore=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let repo = Repository::dynamodb(cli.config());
    run(&repo, cli.command).await
}

async fn run(repo: &Repository<DynamoDbStore>, command: Command) -> Result<()> {
    match command {
        Command::Put {
            object_type,
            id,
            json,
        } => {
            let key = ItemKey::new(id, object_type)?;
            let attributes = match serde_json::from_str(&json).context("Invalid item JSON")? {
                Value::Object(map) => map,
                other => bail!("Item must be a JSON object, got {other}"),
            };
            let item = JsonItem::new(key, attributes);
            repo.add(&item).await?;
            print_json(&item.to_json())
        }
        Command::Get { object_type, id } => {
            let item: JsonItem = repo.get(&ItemKey::new(id, object_type)?).await?;
            print_json(&item.to_json())
        }
        Command::Delete { object_type, id } => {
            repo.delete(&ItemKey::new(id, object_type)?).await?;
            Ok(())
        }
        Command::Query { object_type } => {
            let items: Vec<JsonItem> = repo.query(&object_type).await?;
            let items: Vec<Value> = items.iter().map(JsonItem::to_json).collect();
            print_json(&items)
        }
        Command::Lock { object_type, id } => {
            let lock = repo.lock(&ItemKey::new(id, object_type)?).await?;
            print_json(&lock)
        }
        Command::Renew { lock } => {
            let mut lock = parse_lock(&lock)?;
            let renewed = repo.renew(&mut lock).await?;
            print_json(&renewed)
        }
        Command::Unlock { lock } => {
            repo.unlock(&parse_lock(&lock)?).await?;
            Ok(())
        }
        Command::Release { lock } => {
            repo.release(&parse_lock(&lock)?).await?;
            Ok(())
        }
    }
}

fn parse_lock(json: &str) -> Result<ItemLock> {
    serde_json::from_str(json).context("Invalid lock JSON")
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
