use config::{Config, ConfigError, Environment, File, FileFormat};
use dotenv::dotenv;
use serde::Deserialize;
use std::collections::HashMap;
use std::env;

const DEFAULT_SETTINGS_FILE: &str = "linkbot.toml";

#[derive(Debug, Deserialize)]
pub struct Settings {
    pub database_url: String,
    #[serde(default)]
    pub rabbitmq_url: String,
    #[serde(default = "default_health_port")]
    pub health_port: u16,
    #[serde(default = "default_num_consumers")]
    pub num_consumers: u32,
    #[serde(default)]
    pub sql_log: bool,
    /// Channel name -> chat-platform channel id
    #[serde(default)]
    pub channels: HashMap<String, i64>,
}

fn default_health_port() -> u16 {
    8080
}

fn default_num_consumers() -> u32 {
    1
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        // Load environment variables from .env file
        dotenv().ok();

        let path = env::var("APP_SETTINGS").unwrap_or_else(|_| DEFAULT_SETTINGS_FILE.to_string());
        Self::load(&path)
    }

    /// Reads `path` (if it exists) and then overrides it from the environment,
    /// e.g. `APP_DATABASE_URL=postgres://...` sets `database_url`.
    pub fn load(path: &str) -> Result<Self, ConfigError> {
        let mut s = Config::new();
        s.merge(File::new(path, FileFormat::Toml).required(false))?;
        s.merge(Environment::with_prefix("APP"))?;
        s.try_into()
    }

    pub fn channel_directory(&self) -> ChannelDirectory {
        ChannelDirectory::new(&self.channels)
    }
}

/// Channel names and ids in both directions, built once from the settings.
#[derive(Debug, Clone, Default)]
pub struct ChannelDirectory {
    by_name: HashMap<String, i64>,
    by_id: HashMap<i64, String>,
}

impl ChannelDirectory {
    pub fn new(channels: &HashMap<String, i64>) -> Self {
        Self {
            by_name: channels.clone(),
            by_id: channels.iter().map(|(name, id)| (*id, name.clone())).collect(),
        }
    }

    pub fn id_of(&self, name: &str) -> Option<i64> {
        self.by_name.get(name).copied()
    }

    pub fn name_of(&self, id: i64) -> Option<&str> {
        self.by_id.get(&id).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }
}
