//! Shared configuration layer. Services overlay an optional `configuration`
//! file with `APP__`-prefixed environment variables; a local `.env` file is
//! read first so development overrides behave like real env vars.

use crate::error::AppError;
use serde::Deserialize;

const CONFIG_FILE: &str = "configuration";
const ENV_PREFIX: &str = "APP";
const ENV_SEPARATOR: &str = "__";

/// Settings every service shares regardless of domain.
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_port() -> u16 {
    8080
}

impl Config {
    pub fn load() -> Result<Self, AppError> {
        dotenvy::dotenv().ok();

        let settings = config::Config::builder()
            .add_source(config::File::with_name(CONFIG_FILE).required(false))
            .add_source(config::Environment::with_prefix(ENV_PREFIX).separator(ENV_SEPARATOR))
            .build()?;

        Ok(settings.try_deserialize()?)
    }
}
