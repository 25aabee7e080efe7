// Configuration management module
// TOML settings plus a printable view of the effective configuration

pub mod display;
pub mod settings;


pub use display::show_config;
pub use settings::{CONFIG_FILE_NAME, Config, ConfigError, OllamaConfig, RagConfig};

/// Get the default configuration directory path
#[inline]
pub fn get_config_dir() -> Result<std::path::PathBuf, ConfigError> {
    Config::default_dir()
}
