use std::net::SocketAddr;
use std::path::Path;

use config::{Config, ConfigError, Environment, File, FileFormat};
use serde::Deserialize;
use url::Url;

pub const ENV_PREFIX: &str = "DBML_REFS";
pub const ENV_SEPARATOR: &str = "__";

#[derive(Deserialize, Debug, PartialEq, Eq, Clone, Default)]
pub struct DbmlRefsConfig {
    #[serde(default)]
    pub frontend: Frontend,
    #[serde(default)]
    pub upstream: Upstream,
}

#[derive(Deserialize, Debug, PartialEq, Eq, Default, Clone)]
pub struct Frontend {
    #[serde(default)]
    pub http: HttpFrontend,
}

#[derive(Deserialize, Debug, PartialEq, Eq, Clone)]
#[serde(default)]
pub struct HttpFrontend {
    pub bind_host: String,
    pub bind_port: u16,
    /// `*` or a comma-separated list of origins
    pub cors_allowed_origins: String,
}

impl Default for HttpFrontend {
    fn default() -> Self {
        Self {
            bind_host: "127.0.0.1".to_string(),
            bind_port: 8080,
            cors_allowed_origins: "*".to_string(),
        }
    }
}

impl HttpFrontend {
    pub fn socket_addr(&self) -> Result<SocketAddr, std::net::AddrParseError> {
        format!("{}:{}", self.bind_host, self.bind_port).parse()
    }

    /// Explicitly allowed origins, or `None` when any origin is allowed
    pub fn cors_origins(&self) -> Option<Vec<&str>> {
        if self.cors_allowed_origins.trim() == "*" {
            return None;
        }

        Some(
            self.cors_allowed_origins
                .split(',')
                .map(str::trim)
                .filter(|origin| !origin.is_empty())
                .collect(),
        )
    }
}

// An origin is `scheme://host[:port]` with nothing after it, which is exactly what
// `Url::origin` serializes to
fn is_http_origin(origin: &str) -> bool {
    match Url::parse(origin) {
        Ok(url) => {
            (url.scheme() == "http" || url.scheme() == "https")
                && url.has_host()
                && url.origin().ascii_serialization().eq_ignore_ascii_case(origin)
        }
        Err(_) => false,
    }
}

/// Where the raw DBML comes from
#[derive(Deserialize, Debug, PartialEq, Eq, Clone)]
#[serde(default)]
pub struct Upstream {
    /// Schema extraction service, called with the target as a `url` query parameter.
    /// When unset, the target URL is fetched directly.
    pub endpoint: Option<String>,
    pub timeout_seconds: u64,
    pub user_agent: String,
}

impl Default for Upstream {
    fn default() -> Self {
        Self {
            endpoint: None,
            timeout_seconds: 30,
            user_agent: format!("dbml-refs/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

pub fn validate_config(config: DbmlRefsConfig) -> Result<DbmlRefsConfig, ConfigError> {
    if let Some(endpoint) = &config.upstream.endpoint {
        match Url::parse(endpoint) {
            Ok(url) if url.scheme() == "http" || url.scheme() == "https" => {}
            _ => {
                return Err(ConfigError::Message(format!(
                    "upstream.endpoint must be an absolute http(s) URL, got {endpoint:?}"
                )))
            }
        }
    }

    if config.upstream.timeout_seconds == 0 {
        return Err(ConfigError::Message(
            "upstream.timeout_seconds must be greater than 0".to_string(),
        ));
    }

    if let Some(origins) = config.frontend.http.cors_origins() {
        if let Some(origin) = origins.into_iter().find(|o| !is_http_origin(o)) {
            return Err(ConfigError::Message(format!(
                "frontend.http.cors_allowed_origins must be \"*\" or a list of http(s) \
                 origins such as https://app.example.com, got {origin:?}"
            )));
        }
    }

    if let Err(e) = config.frontend.http.socket_addr() {
        return Err(ConfigError::Message(format!(
            "Invalid HTTP listen address {}:{}: {e}",
            config.frontend.http.bind_host, config.frontend.http.bind_port
        )));
    }

    Ok(config)
}

/// Load the config from an optional TOML file, with `DBML_REFS__`-prefixed environment
/// variables taking precedence (e.g. `DBML_REFS__FRONTEND__HTTP__BIND_PORT=9000`).
pub fn load_config(path: Option<&Path>) -> Result<DbmlRefsConfig, ConfigError> {
    let mut builder = Config::builder();

    if let Some(path) = path {
        builder = builder.add_source(File::from(path).format(FileFormat::Toml));
    }

    builder
        .add_source(Environment::with_prefix(ENV_PREFIX).separator(ENV_SEPARATOR))
        .build()?
        .try_deserialize()
        .and_then(validate_config)
}

// Load a config from a string (to test our structs are defined correctly)
pub fn load_config_from_string(
    config_str: &str,
    skip_validation: bool,
) -> Result<DbmlRefsConfig, ConfigError> {
    let config =
        Config::builder().add_source(File::from_str(config_str, FileFormat::Toml));

    if skip_validation {
        config.build()?.try_deserialize()
    } else {
        config.build()?.try_deserialize().and_then(validate_config)
    }
}
