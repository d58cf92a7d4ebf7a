use anyhow::{Context, Result};
use log::{debug, error, info, warn};
use rusqlite::{Connection, params};
use std::path::Path;
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::collectors::rig::sink::ResultSink;
use crate::models::CycleRecord;
use crate::storage::records::{MinerRecord, PoolRecord, precise_time};
use crate::storage::schema::create_tables;

const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// SQLite-backed consumer for cycle records.
///
/// Owns the connection and the projection into the miner/pool record
/// families. Safe to share across tasks; access is serialized on one
/// connection the same way the rest of the storage layer does it.
pub struct RigStorage {
    conn: Arc<Mutex<Connection>>,
}

impl RigStorage {
    pub fn new<P: AsRef<Path>>(db_path: P) -> Result<Self> {
        // Ensure the parent directory exists
        if let Some(parent) = db_path.as_ref().parent() {
            std::fs::create_dir_all(parent).context("Failed to create database directory")?;
        }

        let conn = Connection::open(db_path).context("Failed to open database connection")?;

        // Enable WAL mode for better concurrent access (ignore errors for in-memory DBs)
        let _ = conn.pragma_update(None, "journal_mode", "WAL");

        conn.busy_timeout(std::time::Duration::from_secs(5))
            .context("Failed to set busy timeout")?;

        create_tables(&conn).context("Failed to create database tables")?;

        info!("Rig storage initialized");
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Persists one cycle: the time-dimension row, one miner row (NULL-filled
    /// when the cycle was degraded), and one pool row per reported pool.
    pub fn store_cycle(&self, record: &CycleRecord) -> Result<()> {
        let miner = MinerRecord::from_cycle(record);
        let pools = PoolRecord::from_cycle(record);
        let time = record.run_time.format(TIME_FORMAT).to_string();
        let precise = precise_time().format(TIME_FORMAT).to_string();

        let mut conn = self.conn.lock().unwrap();
        let tx = conn.transaction()?;

        tx.execute(
            "INSERT OR IGNORE INTO hashrate (time) VALUES (?1)",
            params![time],
        )?;

        tx.execute(
            "INSERT OR REPLACE INTO miner (
                time, host, port, precise_time,
                elapsed, mhs_av, mhs_5s, mhs_1m, mhs_5m, mhs_15m, mhs,
                found_blocks, getworks, accepted, rejected, hardware_errors,
                utility, discarded, stale, get_failures, local_work,
                remote_failures, network_blocks, total_mh, work_utility,
                difficulty_accepted, difficulty_rejected, difficulty_stale,
                best_share, device_hardware, device_rejected, pool_rejected,
                pool_stale, last_getwork
            ) VALUES (
                ?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14,
                ?15, ?16, ?17, ?18, ?19, ?20, ?21, ?22, ?23, ?24, ?25, ?26,
                ?27, ?28, ?29, ?30, ?31, ?32, ?33, ?34
            )",
            params![
                time,
                record.endpoint.host,
                record.endpoint.port,
                precise,
                miner.elapsed,
                miner.mhs_av,
                miner.mhs_5s,
                miner.mhs_1m,
                miner.mhs_5m,
                miner.mhs_15m,
                miner.mhs,
                miner.found_blocks,
                miner.getworks,
                miner.accepted,
                miner.rejected,
                miner.hardware_errors,
                miner.utility,
                miner.discarded,
                miner.stale,
                miner.get_failures,
                miner.local_work,
                miner.remote_failures,
                miner.network_blocks,
                miner.total_mh,
                miner.work_utility,
                miner.difficulty_accepted,
                miner.difficulty_rejected,
                miner.difficulty_stale,
                miner.best_share,
                miner.device_hardware,
                miner.device_rejected,
                miner.pool_rejected,
                miner.pool_stale,
                miner.last_getwork,
            ],
        )?;

        for pool in &pools {
            tx.execute(
                "INSERT OR REPLACE INTO pool (
                    time, host, port, precise_time, pool_id, pool, url, status,
                    priority, quota, long_poll, getworks, accepted, rejected,
                    works, discarded, stale, get_failures, remote_failures,
                    user, last_share_time, diff1_shares, proxy_type, proxy,
                    difficulty_accepted, difficulty_rejected, difficulty_stale,
                    last_share_difficulty, has_stratum, stratum_active,
                    stratum_url, has_gbt, best_share, pool_rejected, pool_stale
                ) VALUES (
                    ?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13,
                    ?14, ?15, ?16, ?17, ?18, ?19, ?20, ?21, ?22, ?23, ?24,
                    ?25, ?26, ?27, ?28, ?29, ?30, ?31, ?32, ?33, ?34, ?35
                )",
                params![
                    time,
                    record.endpoint.host,
                    record.endpoint.port,
                    precise,
                    pool.pool_id,
                    pool.pool,
                    pool.url,
                    pool.status,
                    pool.priority,
                    pool.quota,
                    pool.long_poll,
                    pool.getworks,
                    pool.accepted,
                    pool.rejected,
                    pool.works,
                    pool.discarded,
                    pool.stale,
                    pool.get_failures,
                    pool.remote_failures,
                    pool.user,
                    pool.last_share_time,
                    pool.diff1_shares,
                    pool.proxy_type,
                    pool.proxy,
                    pool.difficulty_accepted,
                    pool.difficulty_rejected,
                    pool.difficulty_stale,
                    pool.last_share_difficulty,
                    pool.has_stratum,
                    pool.stratum_active,
                    pool.stratum_url,
                    pool.has_gbt,
                    pool.best_share,
                    pool.pool_rejected,
                    pool.pool_stale,
                ],
            )?;
        }

        tx.commit()?;

        debug!(
            "Stored cycle for {} at {time} ({} pool rows)",
            record.endpoint,
            pools.len()
        );
        Ok(())
    }

    /// Number of miner rows recorded for an endpoint.
    pub fn miner_row_count(&self, host: &str, port: u16) -> Result<i64> {
        let conn = self.conn.lock().unwrap();
        let count = conn.query_row(
            "SELECT COUNT(*) FROM miner WHERE host = ?1 AND port = ?2",
            params![host, port],
            |row| row.get(0),
        )?;
        Ok(count)
    }
}

/// Cloneable, thread-safe sink handle feeding the storage writer task.
#[derive(Clone)]
pub struct StorageWriter {
    tx: mpsc::UnboundedSender<CycleRecord>,
}

impl ResultSink for StorageWriter {
    fn submit(&self, record: CycleRecord) {
        if self.tx.send(record).is_err() {
            warn!("Storage writer is gone; dropping cycle record");
        }
    }
}

/// Spawns the writer task draining cycle records into storage.
///
/// The task ends once every `StorageWriter` clone has been dropped and the
/// channel has drained.
pub fn spawn_writer(storage: RigStorage) -> (StorageWriter, JoinHandle<()>) {
    let (tx, mut rx) = mpsc::unbounded_channel::<CycleRecord>();
    let handle = tokio::spawn(async move {
        while let Some(record) = rx.recv().await {
            if let Err(err) = storage.store_cycle(&record) {
                error!("Failed to store cycle for {}: {err:#}", record.endpoint);
            }
        }
        debug!("Storage writer drained, shutting down");
    });
    (StorageWriter { tx }, handle)
}
