pub mod api;
pub mod cli;
pub mod config;
pub mod error;
pub mod model;
pub mod pipeline;
pub mod render;
pub mod sources;
pub mod store;

pub use cli::{Cli, Commands};
pub use config::Config;
pub use error::{Error, Result};
