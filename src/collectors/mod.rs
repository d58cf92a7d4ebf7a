pub mod rig;

pub use rig::RigCollector;
