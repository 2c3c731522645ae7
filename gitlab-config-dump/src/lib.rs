pub mod cli;
pub mod gitlab;
pub mod load_config;

pub use cli::{run, Cli, Commands};
