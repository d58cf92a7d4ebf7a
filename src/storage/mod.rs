pub mod records;
pub mod rig_storage;
pub mod schema;

pub use records::{MinerRecord, PoolRecord};
pub use rig_storage::{RigStorage, StorageWriter, spawn_writer};
