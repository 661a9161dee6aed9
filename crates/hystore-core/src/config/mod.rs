//! Configuration for the hystore client
//!
//! An optional `hystore.toml` in the user's config directory tunes the HTTP
//! client and may replace the built-in default repository set.

pub mod parser;
pub mod paths;
pub mod schema;

pub use parser::{load_config, parse_config_file, parse_config_str, to_toml};
pub use paths::{CONFIG_FILE_NAME, STATE_FILE_NAME, default_config_dir};
pub use schema::{HyStoreConfig, NetworkConfig, RepositoriesConfig};
