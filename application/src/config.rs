//! [`Config`]-related definitions.

use std::time;

use config::{builder::DefaultState, ConfigBuilder, ConfigError};
use derive_more::{Display, Error, From};
use http::{
    header::{InvalidHeaderName, InvalidHeaderValue},
    method::InvalidMethod,
    HeaderName, Method,
};
use serde::Deserialize;
use service::domain::csrf;
use smart_default::SmartDefault;

use crate::{
    cookie::SessionCookie,
    middleware::{CorsPolicy, CsrfGuard},
};

/// Application configuration.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Server configuration.
    pub server: Server,

    /// Service configuration.
    pub service: Service,

    /// Postgres configuration.
    pub postgres: Postgres,

    /// Redis configuration.
    pub redis: Redis,

    /// Log configuration.
    pub log: Log,
}

impl Config {
    /// Creates a new [`Config`] by:
    /// - loading it from the provided `path` (if any);
    /// - merging it with the environment variables (if any);
    /// - using default values for missing fields.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn new(path: impl AsRef<str>) -> Result<Self, ConfigError> {
        ConfigBuilder::<DefaultState>::default()
            .add_source(config::File::with_name(path.as_ref()).required(false))
            .add_source(config::Environment::with_prefix("CONF").separator("."))
            .build()?
            .try_deserialize()
    }
}

/// Server configuration.
#[derive(Clone, Debug, Deserialize, SmartDefault)]
#[serde(default)]
pub struct Server {
    /// Host to bind the server to.
    #[default("0.0.0.0".to_owned())]
    pub host: String,

    /// Port to bind the server to.
    #[default(8080)]
    pub port: u16,

    /// [CORS] configuration.
    ///
    /// [CORS]: https://developer.mozilla.org/en-US/docs/Web/HTTP/CORS
    pub cors: Cors,

    /// CSRF protection configuration.
    pub csrf: Csrf,

    /// Session cookie configuration.
    pub cookie: Cookie,
}

/// [CORS] configuration.
///
/// [CORS]: https://developer.mozilla.org/en-US/docs/Web/HTTP/CORS
#[derive(Clone, Debug, Deserialize, SmartDefault)]
#[serde(default)]
pub struct Cors {
    /// Allowed origin.
    #[default("http://localhost:3000".to_owned())]
    pub origin: String,

    /// Allowed HTTP methods.
    #[default(strings(&["GET", "POST", "PUT", "PATCH", "DELETE", "OPTIONS"]))]
    pub methods: Vec<String>,

    /// Allowed request headers.
    #[default(strings(&["Content-Type", "X-CSRF-Token"]))]
    pub headers: Vec<String>,

    /// Whether credentials (cookies) are allowed.
    #[default(true)]
    pub credentials: bool,
}

impl TryFrom<Cors> for CorsPolicy {
    type Error = InvalidValue;

    fn try_from(value: Cors) -> Result<Self, Self::Error> {
        let Cors {
            origin,
            methods,
            headers,
            credentials,
        } = value;

        let methods = methods
            .iter()
            .map(|m| Method::from_bytes(m.as_bytes()))
            .collect::<Result<Vec<_>, _>>()?;
        let headers = headers
            .iter()
            .map(|h| HeaderName::from_bytes(h.as_bytes()))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self::new(&origin, &methods, &headers, credentials)?)
    }
}

/// CSRF protection configuration.
#[derive(Clone, Debug, Deserialize, SmartDefault)]
#[serde(default)]
pub struct Csrf {
    /// HTTP methods requiring a CSRF token.
    #[default(strings(&["POST", "PUT", "PATCH", "DELETE"]))]
    pub methods: Vec<String>,

    /// Paths exempt from the CSRF check.
    #[default(strings(&["/api/v1/auth/signup", "/api/v1/auth/login"]))]
    pub exempt: Vec<String>,
}

impl Csrf {
    /// Builds the [`CsrfGuard`] verifying tokens with the provided
    /// [`csrf::Codec`].
    ///
    /// # Errors
    ///
    /// If any of the configured methods is invalid.
    pub fn guard(
        self,
        codec: csrf::Codec,
        cookie: SessionCookie,
    ) -> Result<CsrfGuard, InvalidValue> {
        let Self { methods, exempt } = self;

        let methods = methods
            .iter()
            .map(|m| Method::from_bytes(m.as_bytes()))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(CsrfGuard::new(codec, cookie, methods, exempt))
    }
}

/// Session cookie configuration.
#[derive(Clone, Debug, Deserialize, SmartDefault)]
#[serde(default)]
pub struct Cookie {
    /// Name of the cookie.
    #[default("Session_cookie".to_owned())]
    pub name: String,

    /// Whether the cookie is sent over HTTPS only.
    #[default(true)]
    pub secure: bool,
}

impl From<Cookie> for SessionCookie {
    fn from(value: Cookie) -> Self {
        let Cookie { name, secure } = value;
        Self::new(name, secure)
    }
}

/// Invalid HTTP value in the [`Config`].
#[derive(Debug, Display, Error, From)]
pub enum InvalidValue {
    /// Invalid HTTP method.
    #[display("invalid HTTP method: {_0}")]
    Method(InvalidMethod),

    /// Invalid header name.
    #[display("invalid header name: {_0}")]
    HeaderName(InvalidHeaderName),

    /// Invalid header value.
    #[display("invalid header value: {_0}")]
    HeaderValue(InvalidHeaderValue),
}

/// Service configuration.
#[derive(Clone, Debug, Deserialize, SmartDefault)]
#[serde(default)]
pub struct Service {
    /// Lifetime of a session.
    #[default(time::Duration::from_secs(30 * 24 * 60 * 60))]
    #[serde(with = "humantime_serde")]
    pub session_ttl: time::Duration,

    /// Secret signing CSRF tokens.
    #[default("secret".to_owned())]
    pub csrf_secret: String,

    /// Lifetime of a CSRF token.
    #[default(time::Duration::from_secs(60 * 60))]
    #[serde(with = "humantime_serde")]
    pub csrf_ttl: time::Duration,
}

impl From<Service> for service::Config {
    fn from(value: Service) -> Self {
        let Service {
            session_ttl,
            csrf_secret,
            csrf_ttl,
        } = value;
        Self {
            session_ttl,
            csrf: csrf::Codec::new(csrf_secret),
            csrf_ttl,
        }
    }
}

/// Postgres configuration.
#[derive(Clone, Debug, Deserialize, SmartDefault)]
#[serde(default)]
pub struct Postgres {
    /// Host to connect to.
    #[default("127.0.0.1".to_owned())]
    pub host: String,

    /// Port to connect to.
    #[default(5432)]
    pub port: u16,

    /// User to connect as.
    #[default("postgres".to_owned())]
    pub user: String,

    /// Password to connect with.
    #[default("postgres".to_owned())]
    pub password: String,

    /// Database name to connect to.
    #[default("postgres".to_owned())]
    pub dbname: String,
}

impl From<Postgres> for service::infra::postgres::Config {
    fn from(value: Postgres) -> Self {
        let Postgres {
            host,
            port,
            user,
            password,
            dbname,
        } = value;

        Self {
            host: Some(host),
            port: Some(port),
            user: Some(user),
            password: Some(password),
            dbname: Some(dbname),
            ..Self::default()
        }
    }
}

/// Redis configuration.
#[derive(Clone, Debug, Deserialize, SmartDefault)]
#[serde(default)]
pub struct Redis {
    /// Host to connect to.
    #[default("127.0.0.1".to_owned())]
    pub host: String,

    /// Port to connect to.
    #[default(6379)]
    pub port: u16,

    /// Password to connect with, if any.
    pub password: Option<String>,

    /// Index of the logical database.
    pub db: u8,

    /// Number of pooled clients.
    #[default(4)]
    pub pool_size: usize,
}

impl From<Redis> for service::infra::redis::Config {
    fn from(value: Redis) -> Self {
        let Redis {
            host,
            port,
            password,
            db,
            pool_size: _,
        } = value;

        Self {
            server: service::infra::redis::ServerConfig::new_centralized(
                host, port,
            ),
            password,
            database: Some(db),
            ..Self::default()
        }
    }
}

/// Log configuration.
#[derive(Clone, Copy, Debug, Default, Deserialize)]
#[serde(default)]
pub struct Log {
    /// Log level.
    pub level: LogLevel,
}

/// Log level.
#[derive(Clone, Copy, Debug, Default, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LogLevel {
    /// Designates very low priority, often extremely verbose, information.
    Trace,

    /// Designates lower priority information.
    Debug,

    /// Designates useful information.
    #[default]
    Info,

    /// Designates hazardous situations.
    Warn,

    /// Designates very serious errors.
    Error,
}

impl From<LogLevel> for tracing::Level {
    fn from(value: LogLevel) -> Self {
        match value {
            LogLevel::Trace => Self::TRACE,
            LogLevel::Debug => Self::DEBUG,
            LogLevel::Info => Self::INFO,
            LogLevel::Warn => Self::WARN,
            LogLevel::Error => Self::ERROR,
        }
    }
}

/// Converts the provided string slices into owned [`String`]s.
fn strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|&v| v.to_owned()).collect()
}

#[cfg(test)]
mod spec {
    use std::time::Duration;

    use super::{Config, CorsPolicy};

    #[test]
    fn defaults_without_sources() {
        let Config {
            server,
            service,
            redis,
            ..
        } = Config::new("does-not-exist.toml").unwrap();

        assert_eq!(server.port, 8080);
        assert_eq!(server.cookie.name, "Session_cookie");
        assert!(server.cookie.secure);
        assert_eq!(server.cors.origin, "http://localhost:3000");
        assert_eq!(server.csrf.methods, ["POST", "PUT", "PATCH", "DELETE"]);
        assert_eq!(
            server.csrf.exempt,
            ["/api/v1/auth/signup", "/api/v1/auth/login"],
        );
        assert_eq!(service.session_ttl, Duration::from_secs(2_592_000));
        assert_eq!(service.csrf_ttl, Duration::from_secs(3600));
        assert_eq!(redis.port, 6379);
        assert_eq!(redis.db, 0);
        assert!(redis.password.is_none());
    }

    #[test]
    fn builds_cors_policy_from_defaults() {
        let config = Config::default();

        assert!(CorsPolicy::try_from(config.server.cors).is_ok());
    }

    #[test]
    fn rejects_invalid_methods() {
        let mut cors = Config::default().server.cors;
        cors.methods.push("NOT A METHOD".to_owned());

        assert!(CorsPolicy::try_from(cors).is_err());
    }
}
