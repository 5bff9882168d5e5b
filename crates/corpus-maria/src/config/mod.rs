use crate::academy::money::Money;
use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;

const DEFAULT_WHATSAPP_PHONE: &str = "5499910633";
const DEFAULT_ENROLLMENT_FEE_CENTS: u64 = 8_000;
const DEFAULT_MONTHLY_TUITION_CENTS: u64 = 10_000;
const DEFAULT_SESSION_TTL_MINUTES: i64 = 480;

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
    pub academy: AcademyConfig,
    pub admin: AdminConfig,
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

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig { log_level },
            academy: AcademyConfig::from_env()?,
            admin: AdminConfig::from_env()?,
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
}

/// Academy-specific values shown to families and used for fee arithmetic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AcademyConfig {
    pub whatsapp_phone: String,
    pub enrollment_fee: Money,
    pub monthly_tuition: Money,
    pub schedule_csv: Option<PathBuf>,
}

impl Default for AcademyConfig {
    fn default() -> Self {
        Self {
            whatsapp_phone: DEFAULT_WHATSAPP_PHONE.to_string(),
            enrollment_fee: Money::from_cents(DEFAULT_ENROLLMENT_FEE_CENTS),
            monthly_tuition: Money::from_cents(DEFAULT_MONTHLY_TUITION_CENTS),
            schedule_csv: None,
        }
    }
}

impl AcademyConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let whatsapp_phone: String = env::var("ACADEMY_WHATSAPP_PHONE")
            .unwrap_or_else(|_| DEFAULT_WHATSAPP_PHONE.to_string())
            .chars()
            .filter(char::is_ascii_digit)
            .collect();
        if whatsapp_phone.is_empty() {
            return Err(ConfigError::InvalidWhatsappPhone);
        }

        let enrollment_fee = cents_var("ACADEMY_ENROLLMENT_FEE_CENTS", DEFAULT_ENROLLMENT_FEE_CENTS)?;
        let monthly_tuition =
            cents_var("ACADEMY_MONTHLY_TUITION_CENTS", DEFAULT_MONTHLY_TUITION_CENTS)?;
        let schedule_csv = env::var("ACADEMY_SCHEDULE_CSV")
            .ok()
            .filter(|value| !value.trim().is_empty())
            .map(PathBuf::from);

        Ok(Self {
            whatsapp_phone,
            enrollment_fee,
            monthly_tuition,
            schedule_csv,
        })
    }
}

/// Back-office credentials. Login is refused while no password is configured.
#[derive(Clone)]
pub struct AdminConfig {
    pub email: Option<String>,
    pub password: Option<String>,
    pub session_ttl_minutes: i64,
}

impl fmt::Debug for AdminConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AdminConfig")
            .field("email", &self.email)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("session_ttl_minutes", &self.session_ttl_minutes)
            .finish()
    }
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            email: None,
            password: None,
            session_ttl_minutes: DEFAULT_SESSION_TTL_MINUTES,
        }
    }
}

impl AdminConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let email = non_empty_var("ADMIN_EMAIL");
        let password = non_empty_var("ADMIN_PASSWORD");
        let session_ttl_minutes = match env::var("ADMIN_SESSION_TTL_MINUTES") {
            Ok(raw) => raw
                .trim()
                .parse::<i64>()
                .ok()
                .filter(|minutes| *minutes > 0)
                .ok_or(ConfigError::InvalidSessionTtl)?,
            Err(_) => DEFAULT_SESSION_TTL_MINUTES,
        };

        Ok(Self {
            email,
            password,
            session_ttl_minutes,
        })
    }

    pub fn login_enabled(&self) -> bool {
        self.email.is_some() && self.password.is_some()
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn cents_var(name: &'static str, default: u64) -> Result<Money, ConfigError> {
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse::<u64>()
            .map(Money::from_cents)
            .map_err(|_| ConfigError::InvalidAmount { variable: name }),
        Err(_) => Ok(Money::from_cents(default)),
    }
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    InvalidAmount { variable: &'static str },
    InvalidWhatsappPhone,
    InvalidSessionTtl,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidAmount { variable } => {
                write!(f, "{variable} must be a whole number of cents")
            }
            ConfigError::InvalidWhatsappPhone => {
                write!(f, "ACADEMY_WHATSAPP_PHONE must contain at least one digit")
            }
            ConfigError::InvalidSessionTtl => {
                write!(f, "ADMIN_SESSION_TTL_MINUTES must be a positive integer")
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidHost { source } => Some(source),
            ConfigError::InvalidPort
            | ConfigError::InvalidAmount { .. }
            | ConfigError::InvalidWhatsappPhone
            | ConfigError::InvalidSessionTtl => None,
        }
    }
}
