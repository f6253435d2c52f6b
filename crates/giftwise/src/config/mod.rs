use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;

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

/// Top-level configuration for the application.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub server: ServerConfig,
    pub telemetry: TelemetryConfig,
    pub assessment: AssessmentConfig,
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
        let ansi = parse_flag("APP_LOG_ANSI", environment == AppEnvironment::Development)?;

        let assessment = AssessmentConfig::from_env()?;

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig { log_level, ansi },
            assessment,
        })
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
    pub ansi: bool,
}

/// Longest result validity window accepted from the environment.
pub const MAX_RESULT_VALIDITY_DAYS: u32 = 36_500;

/// Scoring and result-retention dials for the gifts assessment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssessmentConfig {
    pub minimum_answers_per_gift: usize,
    pub result_validity_days: u32,
    pub near_expiration_days: u32,
    pub very_near_expiration_days: u32,
    pub discard_malformed_answers: bool,
}

impl Default for AssessmentConfig {
    fn default() -> Self {
        Self {
            minimum_answers_per_gift: 3,
            result_validity_days: 90,
            near_expiration_days: 14,
            very_near_expiration_days: 3,
            discard_malformed_answers: false,
        }
    }
}

impl AssessmentConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let config = Self {
            minimum_answers_per_gift: parse_number(
                "GIFTS_MIN_ANSWERS_PER_GIFT",
                defaults.minimum_answers_per_gift,
            )?,
            result_validity_days: parse_number(
                "GIFTS_RESULT_VALIDITY_DAYS",
                defaults.result_validity_days,
            )?,
            near_expiration_days: parse_number(
                "GIFTS_NEAR_EXPIRATION_DAYS",
                defaults.near_expiration_days,
            )?,
            very_near_expiration_days: parse_number(
                "GIFTS_VERY_NEAR_EXPIRATION_DAYS",
                defaults.very_near_expiration_days,
            )?,
            discard_malformed_answers: parse_flag(
                "GIFTS_DISCARD_MALFORMED_ANSWERS",
                defaults.discard_malformed_answers,
            )?,
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.result_validity_days > MAX_RESULT_VALIDITY_DAYS {
            return Err(ConfigError::ValidityTooLong {
                days: self.result_validity_days,
                max: MAX_RESULT_VALIDITY_DAYS,
            });
        }

        if self.result_validity_days == 0
            || self.very_near_expiration_days > self.near_expiration_days
            || self.near_expiration_days > self.result_validity_days
        {
            return Err(ConfigError::InconsistentExpiration {
                validity_days: self.result_validity_days,
                near_days: self.near_expiration_days,
                very_near_days: self.very_near_expiration_days,
            });
        }

        Ok(())
    }
}

fn parse_number<T: FromStr>(variable: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(variable) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|_| ConfigError::InvalidNumber { variable, value: raw }),
        Err(_) => Ok(default),
    }
}

fn parse_flag(variable: &'static str, default: bool) -> Result<bool, ConfigError> {
    let Ok(raw) = env::var(variable) else {
        return Ok(default);
    };

    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidFlag { variable, value: raw }),
    }
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost {
        source: std::net::AddrParseError,
    },
    InvalidNumber {
        variable: &'static str,
        value: String,
    },
    InvalidFlag {
        variable: &'static str,
        value: String,
    },
    InconsistentExpiration {
        validity_days: u32,
        near_days: u32,
        very_near_days: u32,
    },
    ValidityTooLong {
        days: u32,
        max: u32,
    },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidNumber { variable, value } => {
                write!(f, "{variable} must be a non-negative integer (found '{value}')")
            }
            ConfigError::InvalidFlag { variable, value } => {
                write!(f, "{variable} must be true or false (found '{value}')")
            }
            ConfigError::InconsistentExpiration {
                validity_days,
                near_days,
                very_near_days,
            } => write!(
                f,
                "expiration thresholds must satisfy very_near ({very_near_days}) <= near ({near_days}) <= validity ({validity_days}) days with a non-zero validity"
            ),
            ConfigError::ValidityTooLong { days, max } => write!(
                f,
                "GIFTS_RESULT_VALIDITY_DAYS must be at most {max} (found {days})"
            ),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidHost { source } => Some(source),
            ConfigError::InvalidPort
            | ConfigError::InvalidNumber { .. }
            | ConfigError::InvalidFlag { .. }
            | ConfigError::InconsistentExpiration { .. }
            | ConfigError::ValidityTooLong { .. } => None,
        }
    }
}
