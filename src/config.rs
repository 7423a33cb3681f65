use std::{env, net::SocketAddr};

use axum::http::HeaderValue;
use thiserror::Error;

pub const DEFAULT_TABLE_NAME: &str = "animal-happiness-data";
pub const DEFAULT_REGION: &str = "us-east-1";
pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 8001;

#[derive(Debug, Clone)]
pub struct Config {
    pub table: TableConfig,
    pub bind_addr: String,
    pub bind_port: u16,
    pub api_key: Option<String>,
    pub cors: CorsConfig,
    pub transport: Transport,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableConfig {
    pub name: String,
    pub region: String,
    pub endpoint: Option<String>,
    pub backend: StoreBackend,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    DynamoDb,
    Memory,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transport {
    Listener,
    Function,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AllowedOrigins {
    Any,
    List(Vec<HeaderValue>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CorsConfig {
    pub allowed_origins: AllowedOrigins,
    pub allow_credentials: bool,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allowed_origins: AllowedOrigins::Any,
            allow_credentials: true,
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("PORT must be a valid u16")]
    InvalidPort,
    #[error("invalid bind address or port")]
    InvalidSocket,
    #[error("STORE_BACKEND must be one of: dynamodb, memory")]
    InvalidBackend,
    #[error("TRANSPORT must be one of: listener, function")]
    InvalidTransport,
    #[error("CORS_ALLOW_ORIGINS contains an invalid origin: {0}")]
    InvalidOrigin(String),
    #[error("{0} must be true or false")]
    InvalidFlag(&'static str),
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary key lookup. Blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let table = TableConfig {
            name: read("TABLE_NAME")
                .or_else(|| read("DYNAMODB_TABLE_NAME_ANIMAL"))
                .unwrap_or_else(|| DEFAULT_TABLE_NAME.to_string()),
            region: read("REGION")
                .or_else(|| read("AWS_REGION"))
                .unwrap_or_else(|| DEFAULT_REGION.to_string()),
            endpoint: read("TABLE_ENDPOINT"),
            backend: match read("STORE_BACKEND").as_deref() {
                None | Some("dynamodb") => StoreBackend::DynamoDb,
                Some("memory") => StoreBackend::Memory,
                Some(_) => return Err(ConfigError::InvalidBackend),
            },
        };

        let bind_addr = read("HOST").unwrap_or_else(|| DEFAULT_HOST.to_string());
        let bind_port = read("PORT")
            .map(|value| value.parse::<u16>().map_err(|_| ConfigError::InvalidPort))
            .transpose()?
            .unwrap_or(DEFAULT_PORT);

        let allowed_origins = match read("CORS_ALLOW_ORIGINS") {
            None => AllowedOrigins::Any,
            Some(value) => parse_origins(&value)?,
        };
        let allow_credentials = read("CORS_ALLOW_CREDENTIALS")
            .map(|value| parse_flag("CORS_ALLOW_CREDENTIALS", &value))
            .transpose()?
            .unwrap_or(true);

        let transport = match read("TRANSPORT").as_deref() {
            Some("listener") => Transport::Listener,
            Some("function") => Transport::Function,
            Some(_) => return Err(ConfigError::InvalidTransport),
            None if read("AWS_LAMBDA_RUNTIME_API").is_some() => Transport::Function,
            None => Transport::Listener,
        };

        let config = Self {
            table,
            bind_addr,
            bind_port,
            api_key: read("API_KEY"),
            cors: CorsConfig {
                allowed_origins,
                allow_credentials,
            },
            transport,
        };

        if config.transport == Transport::Listener {
            let _ = config.bind_socket()?;
        }
        Ok(config)
    }

    pub fn bind_socket(&self) -> Result<SocketAddr, ConfigError> {
        format!("{}:{}", self.bind_addr, self.bind_port)
            .parse::<SocketAddr>()
            .map_err(|_| ConfigError::InvalidSocket)
    }
}

fn parse_origins(value: &str) -> Result<AllowedOrigins, ConfigError> {
    let entries: Vec<&str> = value
        .split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .collect();

    if entries.is_empty() || entries.contains(&"*") {
        return Ok(AllowedOrigins::Any);
    }

    entries
        .into_iter()
        .map(|entry| {
            HeaderValue::from_str(entry).map_err(|_| ConfigError::InvalidOrigin(entry.to_string()))
        })
        .collect::<Result<Vec<_>, _>>()
        .map(AllowedOrigins::List)
}

fn parse_flag(key: &'static str, value: &str) -> Result<bool, ConfigError> {
    match value.to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" => Ok(true),
        "false" | "0" | "no" => Ok(false),
        _ => Err(ConfigError::InvalidFlag(key)),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn from_pairs(pairs: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn parse_defaults() {
        let config = from_pairs(&[]).expect("config should parse");
        assert_eq!(config.table.name, "animal-happiness-data");
        assert_eq!(config.table.region, "us-east-1");
        assert_eq!(config.table.backend, StoreBackend::DynamoDb);
        assert_eq!(config.table.endpoint, None);
        assert_eq!(config.bind_addr, "0.0.0.0");
        assert_eq!(config.bind_port, 8001);
        assert_eq!(config.api_key, None);
        assert_eq!(config.cors, CorsConfig::default());
        assert_eq!(config.transport, Transport::Listener);
    }

    #[test]
    fn primary_names_win_over_aliases() {
        let config = from_pairs(&[
            ("TABLE_NAME", "primary"),
            ("DYNAMODB_TABLE_NAME_ANIMAL", "alias"),
            ("AWS_REGION", "eu-west-1"),
        ])
        .expect("config should parse");
        assert_eq!(config.table.name, "primary");
        assert_eq!(config.table.region, "eu-west-1");
    }

    #[test]
    fn invalid_port_fails() {
        let err = from_pairs(&[("PORT", "eighty")]).expect_err("expected invalid port");
        assert!(matches!(err, ConfigError::InvalidPort));
    }

    #[test]
    fn invalid_host_fails_for_listener() {
        let err = from_pairs(&[("HOST", "not an address")]).expect_err("expected bad socket");
        assert!(matches!(err, ConfigError::InvalidSocket));
    }

    #[test]
    fn lambda_runtime_selects_function_transport() {
        let config = from_pairs(&[("AWS_LAMBDA_RUNTIME_API", "127.0.0.1:9001")])
            .expect("config should parse");
        assert_eq!(config.transport, Transport::Function);

        let config = from_pairs(&[
            ("AWS_LAMBDA_RUNTIME_API", "127.0.0.1:9001"),
            ("TRANSPORT", "listener"),
        ])
        .expect("config should parse");
        assert_eq!(config.transport, Transport::Listener);
    }

    #[test]
    fn cors_origins_parse_as_list() {
        let config = from_pairs(&[
            ("CORS_ALLOW_ORIGINS", "https://a.example, https://b.example"),
            ("CORS_ALLOW_CREDENTIALS", "false"),
        ])
        .expect("config should parse");
        assert_eq!(
            config.cors.allowed_origins,
            AllowedOrigins::List(vec![
                HeaderValue::from_static("https://a.example"),
                HeaderValue::from_static("https://b.example"),
            ])
        );
        assert!(!config.cors.allow_credentials);
    }

    #[test]
    fn wildcard_in_origin_list_means_any() {
        let config = from_pairs(&[("CORS_ALLOW_ORIGINS", "https://a.example,*")])
            .expect("config should parse");
        assert_eq!(config.cors.allowed_origins, AllowedOrigins::Any);
    }

    #[test]
    fn unknown_backend_fails() {
        let err = from_pairs(&[("STORE_BACKEND", "postgres")]).expect_err("expected error");
        assert!(matches!(err, ConfigError::InvalidBackend));
    }

    #[test]
    fn bad_flag_fails() {
        let err = from_pairs(&[("CORS_ALLOW_CREDENTIALS", "maybe")]).expect_err("expected error");
        assert!(matches!(err, ConfigError::InvalidFlag("CORS_ALLOW_CREDENTIALS")));
    }
}
