pub mod commands;
pub mod rig_commands;

pub use commands::Cli;
pub use rig_commands::RigCommandHandler;
