use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_BASE_OFFSET: u64 = 103;
pub const DEFAULT_MAX_PHOTO_BYTES: usize = 5 * 1024 * 1024;
pub const DEFAULT_ENDPOINT: &str = "http://127.0.0.1:3000/api/apply";
const DEFAULT_SUBMIT_TIMEOUT_SECS: u64 = 15;

/// Distinguishes runtime behavior for different stages of the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnvironment {
    Development,
    Test,
    Production,
}

impl AppEnvironment {
    fn from_str(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "prod" | "production" => Self::Production,
            "test" | "ci" => Self::Test,
            _ => Self::Development,
        }
    }
}

/// Top-level configuration for the waitlist service and its submission client.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub server: ServerConfig,
    pub telemetry: TelemetryConfig,
    pub intake: IntakeConfig,
    pub client: ClientConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let environment = AppEnvironment::from_str(
            &env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
        );

        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("APP_PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse::<u16>()
            .map_err(|_| ConfigError::InvalidPort)?;

        let log_level = env::var("APP_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        let base_offset = parse_var("WAITLIST_BASE_OFFSET", DEFAULT_BASE_OFFSET)?;
        let photo_dir = env::var("WAITLIST_PHOTO_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("profile-photos"));
        let max_photo_bytes = parse_var("WAITLIST_MAX_PHOTO_BYTES", DEFAULT_MAX_PHOTO_BYTES)?;

        let endpoint = env::var("WAITLIST_ENDPOINT").unwrap_or_else(|_| DEFAULT_ENDPOINT.to_string());
        let timeout_secs = parse_var("WAITLIST_SUBMIT_TIMEOUT_SECS", DEFAULT_SUBMIT_TIMEOUT_SECS)?;
        if timeout_secs == 0 {
            return Err(ConfigError::InvalidNumber {
                variable: "WAITLIST_SUBMIT_TIMEOUT_SECS",
                value: "0".to_string(),
            });
        }

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig { log_level },
            intake: IntakeConfig {
                base_offset,
                photo_dir,
                max_photo_bytes,
            },
            client: ClientConfig {
                endpoint,
                timeout: Duration::from_secs(timeout_secs),
            },
        })
    }
}

fn parse_var<T: std::str::FromStr>(variable: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(variable) {
        Ok(value) => value
            .trim()
            .parse::<T>()
            .map_err(|_| ConfigError::InvalidNumber { variable, value }),
        Err(_) => Ok(default),
    }
}

/// Settings controlling the HTTP server binding.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        if self.host.eq_ignore_ascii_case("localhost") {
            return Ok(SocketAddr::new(IpAddr::from([127, 0, 0, 1]), self.port));
        }

        let ip: IpAddr = self
            .host
            .parse()
            .map_err(|source| ConfigError::InvalidHost { source })?;

        Ok(SocketAddr::new(ip, self.port))
    }
}

/// Tracing controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
}

/// Server-side intake dials: waitlist offset and photo storage.
#[derive(Debug, Clone)]
pub struct IntakeConfig {
    pub base_offset: u64,
    pub photo_dir: PathBuf,
    pub max_photo_bytes: usize,
}

/// Where and how patiently the submission client talks to the intake endpoint.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub endpoint: String,
    pub timeout: Duration,
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    InvalidNumber { variable: &'static str, value: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidNumber { variable, value } => {
                write!(f, "{variable} must be a positive integer (found '{value}')")
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidPort | ConfigError::InvalidNumber { .. } => None,
            ConfigError::InvalidHost { source } => Some(source),
        }
    }
}
