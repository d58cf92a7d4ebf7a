use anyhow::Result;
use rusqlite::Connection;

pub fn create_tables(conn: &Connection) -> Result<()> {
    // Shared time dimension: one row per fleet-wide run timestamp
    conn.execute(
        "CREATE TABLE IF NOT EXISTS hashrate (
            time DATETIME NOT NULL,
            PRIMARY KEY (time)
        )",
        [],
    )?;

    // Miner family: one row per (run, endpoint) carrying the summary fields.
    // Degraded cycles still get a row; every telemetry column is nullable.
    conn.execute(
        "CREATE TABLE IF NOT EXISTS miner (
            time DATETIME NOT NULL,
            host TEXT NOT NULL,
            port INTEGER NOT NULL,
            precise_time DATETIME,
            elapsed INTEGER,
            mhs_av REAL,
            mhs_5s REAL,
            mhs_1m REAL,
            mhs_5m REAL,
            mhs_15m REAL,
            mhs REAL,
            found_blocks INTEGER,
            getworks INTEGER,
            accepted INTEGER,
            rejected INTEGER,
            hardware_errors INTEGER,
            utility REAL,
            discarded INTEGER,
            stale INTEGER,
            get_failures INTEGER,
            local_work INTEGER,
            remote_failures INTEGER,
            network_blocks INTEGER,
            total_mh REAL,
            work_utility REAL,
            difficulty_accepted REAL,
            difficulty_rejected REAL,
            difficulty_stale REAL,
            best_share INTEGER,
            device_hardware REAL,
            device_rejected REAL,
            pool_rejected REAL,
            pool_stale REAL,
            last_getwork INTEGER,
            PRIMARY KEY (time, host, port)
        )",
        [],
    )?;

    // Pool family: additionally keyed by the pool's index on the rig
    conn.execute(
        "CREATE TABLE IF NOT EXISTS pool (
            time DATETIME NOT NULL,
            host TEXT NOT NULL,
            port INTEGER NOT NULL,
            precise_time DATETIME,
            pool_id INTEGER NOT NULL,
            pool INTEGER,
            url TEXT,
            status TEXT,
            priority INTEGER,
            quota INTEGER,
            long_poll TEXT,
            getworks INTEGER,
            accepted INTEGER,
            rejected INTEGER,
            works INTEGER,
            discarded INTEGER,
            stale INTEGER,
            get_failures INTEGER,
            remote_failures INTEGER,
            user TEXT,
            last_share_time INTEGER,
            diff1_shares INTEGER,
            proxy_type TEXT,
            proxy TEXT,
            difficulty_accepted REAL,
            difficulty_rejected REAL,
            difficulty_stale REAL,
            last_share_difficulty REAL,
            has_stratum BOOLEAN,
            stratum_active BOOLEAN,
            stratum_url TEXT,
            has_gbt BOOLEAN,
            best_share INTEGER,
            pool_rejected REAL,
            pool_stale REAL,
            PRIMARY KEY (time, host, port, pool_id)
        )",
        [],
    )?;

    create_indexes(conn)?;

    Ok(())
}

fn create_indexes(conn: &Connection) -> Result<()> {
    // Index on host for per-rig history queries
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_miner_host
         ON miner(host, port)",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_pool_host
         ON pool(host, port)",
        [],
    )?;

    Ok(())
}
