use std::time::Duration;

use anyhow::Result;
use chrono::Utc;
use log::{info, warn};
use serde_json::{Value, json};

use crate::collectors::rig::RigCollector;
use crate::config::AppConfig;
use crate::models::{CollectionResult, Endpoint, RawResult, RetryPolicy};
use crate::storage::{RigStorage, spawn_writer};

/// Handles the polling-related CLI commands.
pub struct RigCommandHandler;

impl RigCommandHandler {
    /// One cycle against one rig, result printed as JSON on stdout.
    pub fn run_poll(host: String, port: u16, retry: u32, pretty: bool) -> Result<()> {
        let collector = RigCollector::new(Endpoint::new(host, port));
        let results = collector.collect(RetryPolicy::new(retry));
        let json = results_to_json(&results);
        if pretty {
            println!("{}", serde_json::to_string_pretty(&json)?);
        } else {
            println!("{json}");
        }
        Ok(())
    }

    /// Continuous fleet polling until Ctrl-C.
    pub async fn run_watch(config: AppConfig) -> Result<()> {
        if config.rigs.is_empty() {
            anyhow::bail!(
                "no rigs configured; add [[rigs]] entries to the configuration file"
            );
        }

        let storage = RigStorage::new(&config.database)?;
        let (writer, writer_task) = spawn_writer(storage);
        let policy = RetryPolicy::new(config.retry);
        let mut ticker = tokio::time::interval(Duration::from_secs(config.interval_secs));

        info!(
            "Watching {} rigs every {}s",
            config.rigs.len(),
            config.interval_secs
        );

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let run_time = Utc::now();
                    let mut cycles = Vec::with_capacity(config.rigs.len());
                    for rig in &config.rigs {
                        let endpoint = rig.endpoint();
                        let writer = writer.clone();
                        // Cycles are blocking socket work; keep them off the
                        // async workers so one dead rig never delays the rest.
                        cycles.push(tokio::task::spawn_blocking(move || {
                            RigCollector::new(endpoint).run(run_time, policy, &writer);
                        }));
                    }
                    for cycle in cycles {
                        if let Err(err) = cycle.await {
                            warn!("Polling task failed: {err}");
                        }
                    }
                }
                _ = tokio::signal::ctrl_c() => {
                    info!("Shutting down");
                    break;
                }
            }
        }

        drop(writer);
        writer_task.await?;
        Ok(())
    }

    /// Creates the database schema and exits.
    pub fn run_init_db(database: &str) -> Result<()> {
        RigStorage::new(database)?;
        info!("Database initialized at {database}");
        Ok(())
    }
}

/// Maps a result set onto one JSON object per cycle: decoded values verbatim,
/// null for absent commands, and an error marker for malformed ones.
fn results_to_json(results: &CollectionResult) -> Value {
    let mut map = serde_json::Map::new();
    for (command, result) in results.iter() {
        let value = match result {
            RawResult::Value(value) => value.clone(),
            RawResult::Malformed => json!({"error": "malformed response"}),
            RawResult::Absent => Value::Null,
        };
        map.insert(command.name().to_string(), value);
    }
    Value::Object(map)
}
