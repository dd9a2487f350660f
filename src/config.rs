use crate::error::{BadEnvVarSnafu, ParsePortSnafu, RosterResult, UnknownStoreBackendSnafu};
use dotenvy::var;
use secrecy::{ExposeSecret, SecretString};
use snafu::ResultExt;
use std::{str::FromStr, sync::Arc};

pub mod images;

use images::ImageConfig;

const DEFAULT_SERVER_IP: &str = "127.0.0.1:8080";

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum StoreBackend {
    Postgres,
    Memory,
}

impl FromStr for StoreBackend {
    type Err = crate::error::RosterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "postgres" | "postgresql" | "pg" => Ok(Self::Postgres),
            "memory" | "in-memory" => Ok(Self::Memory),
            _ => UnknownStoreBackendSnafu { found: s }.fail(),
        }
    }
}

#[derive(Clone, Debug)]
pub struct RuntimeConfiguration {
    server_ip: String,
    store_backend: StoreBackend,
    images: Arc<ImageConfig>,
}

impl RuntimeConfiguration {
    pub fn new() -> RosterResult<Self> {
        let store_backend = match var("ROSTER_STORE") {
            Ok(backend) => backend.parse()?,
            Err(_) => StoreBackend::Postgres,
        };
        let images = var("ROSTER_IMAGE_HOSTS")
            .map_or_else(|_| ImageConfig::default(), |hosts| ImageConfig::from_list(&hosts));

        Ok(Self {
            server_ip: var("ROSTER_SERVER_IP").unwrap_or_else(|_| DEFAULT_SERVER_IP.to_string()),
            store_backend,
            images: Arc::new(images),
        })
    }

    pub fn server_ip(&self) -> &str {
        &self.server_ip
    }

    pub const fn store_backend(&self) -> StoreBackend {
        self.store_backend
    }

    pub fn images(&self) -> Arc<ImageConfig> {
        self.images.clone()
    }
}

impl Default for RuntimeConfiguration {
    fn default() -> Self {
        Self {
            server_ip: DEFAULT_SERVER_IP.to_string(),
            store_backend: StoreBackend::Memory,
            images: Arc::new(ImageConfig::default()),
        }
    }
}

#[derive(Debug)]
pub struct DbConfig {
    user: String,
    password: SecretString,
    path: String,
    port: u16,
    database: String,
}

impl DbConfig {
    pub fn new() -> RosterResult<Self> {
        let get_env_var = |name| var(name).context(BadEnvVarSnafu { name });

        Ok(Self {
            user: get_env_var("DB_USER")?,
            password: SecretString::from(get_env_var("DB_PASSWORD")?),
            path: get_env_var("DB_PATH")?,
            port: get_env_var("DB_PORT")?.parse().context(ParsePortSnafu)?,
            database: get_env_var("DB_NAME")?,
        })
    }

    pub fn get_db_path(&self) -> String {
        format!(
            "postgres://{}:{}@{}:{}/{}",
            self.user,
            self.password.expose_secret(),
            self.path,
            self.port,
            self.database
        )
    }
}
