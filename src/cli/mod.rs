pub mod commands;

pub use commands::{Cli, Commands, index_snapshot, run};
