use std::{env, fmt::Display, str::FromStr};

use chrono::Duration;
use log::*;
use order_common::{
    helpers::{env_flag, to_hex},
    Money,
    Secret,
};
use order_engine::{DEFAULT_COMMISSION_RATE_BPS, DEFAULT_UNIT_PRICE};
use rand::RngCore;

use crate::errors::ServerError;

const DEFAULT_ORDERS_HOST: &str = "127.0.0.1";
const DEFAULT_ORDERS_PORT: u16 = 8370;
const DEFAULT_DB_MAX_CONNECTIONS: u32 = 25;
const DEFAULT_TOKEN_LIFETIME_HOURS: i64 = 24;
const MIN_JWT_SECRET_LENGTH: usize = 32;

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    pub db_max_connections: u32,
    pub auth: AuthConfig,
    /// If true, the X-Forwarded-For header will be used to determine the client's IP address in the access log,
    /// rather than the connection's remote address.
    pub use_x_forwarded_for: bool,
    /// The price charged for one unit of any product.
    pub unit_price: Money,
    /// The commission charged on delivered orders, in basis points of the order total.
    pub commission_rate_bps: u32,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_ORDERS_HOST.to_string(),
            port: DEFAULT_ORDERS_PORT,
            database_url: order_engine::db_url(),
            db_max_connections: DEFAULT_DB_MAX_CONNECTIONS,
            auth: AuthConfig::default(),
            use_x_forwarded_for: false,
            unit_price: DEFAULT_UNIT_PRICE,
            commission_rate_bps: DEFAULT_COMMISSION_RATE_BPS,
        }
    }
}

impl ServerConfig {
    pub fn new(host: &str, port: u16) -> Self {
        Self { host: host.to_string(), port, ..Default::default() }
    }

    pub fn from_env_or_default() -> Self {
        let host = env::var("ORDERS_HOST").ok().unwrap_or_else(|| DEFAULT_ORDERS_HOST.into());
        let port = parse_env_or("ORDERS_PORT", DEFAULT_ORDERS_PORT);
        let database_url = order_engine::db_url();
        let db_max_connections = match parse_env_or("ORDERS_DB_MAX_CONNECTIONS", DEFAULT_DB_MAX_CONNECTIONS) {
            0 => {
                warn!("🪛️ ORDERS_DB_MAX_CONNECTIONS cannot be zero. Using {DEFAULT_DB_MAX_CONNECTIONS} instead.");
                DEFAULT_DB_MAX_CONNECTIONS
            },
            n => n,
        };
        let auth = AuthConfig::try_from_env().unwrap_or_else(|e| {
            warn!(
                "🪛️ Could not load the authentication configuration from environment variables. {e}. Reverting to the \
                 default configuration."
            );
            AuthConfig::default()
        });
        let use_x_forwarded_for = env_flag("ORDERS_USE_X_FORWARDED_FOR", false);
        let unit_price = match parse_env_or("ORDERS_UNIT_PRICE", DEFAULT_UNIT_PRICE) {
            p if p.is_negative() => {
                error!("🪛️ ORDERS_UNIT_PRICE cannot be negative. Using the default, {DEFAULT_UNIT_PRICE}, instead.");
                DEFAULT_UNIT_PRICE
            },
            p => p,
        };
        let commission_rate_bps = parse_env_or("ORDERS_COMMISSION_RATE_BPS", DEFAULT_COMMISSION_RATE_BPS);
        info!("🪛️ Unit price is {unit_price}. Commission rate is {commission_rate_bps} bps.");
        Self {
            host,
            port,
            database_url,
            db_max_connections,
            auth,
            use_x_forwarded_for,
            unit_price,
            commission_rate_bps,
        }
    }
}

/// Reads and parses the environment variable `name`. If the variable is unset, `default` is returned quietly. If it is
/// set, but cannot be parsed, an error is logged and `default` is returned.
fn parse_env_or<T>(name: &str, default: T) -> T
where
    T: FromStr + Display,
    T::Err: Display,
{
    match env::var(name) {
        Ok(s) => s.trim().parse::<T>().unwrap_or_else(|e| {
            error!("🪛️ {s} is not a valid value for {name}. {e} Using the default, {default}, instead.");
            default
        }),
        Err(_) => default,
    }
}

//-------------------------------------------------  AuthConfig  ------------------------------------------------------

#[derive(Clone, Debug)]
pub struct AuthConfig {
    /// The shared HS256 secret used to sign and verify access tokens.
    pub jwt_secret: Secret<String>,
    /// How long an issued access token remains valid.
    pub token_lifetime: Duration,
}

impl Default for AuthConfig {
    fn default() -> Self {
        let mut bytes = [0u8; 32];
        rand::thread_rng().fill_bytes(&mut bytes);
        let secret = to_hex(&bytes);
        warn!(
            "🚨️🚨️🚨️ The JWT signing secret has not been set. I'm using a random value for this session. DO NOT operate \
             on production like this since you may lose access to data. 🚨️🚨️🚨️"
        );
        Self { jwt_secret: Secret::new(secret), token_lifetime: Duration::hours(DEFAULT_TOKEN_LIFETIME_HOURS) }
    }
}

impl AuthConfig {
    pub fn new<S: Into<String>>(secret: S, token_lifetime: Duration) -> Self {
        Self { jwt_secret: Secret::new(secret.into()), token_lifetime }
    }

    pub fn try_from_env() -> Result<Self, ServerError> {
        let secret = env::var("ORDERS_JWT_SECRET")
            .map_err(|e| ServerError::ConfigurationError(format!("ORDERS_JWT_SECRET is not available. {e}")))?;
        if secret.len() < MIN_JWT_SECRET_LENGTH {
            return Err(ServerError::ConfigurationError(format!(
                "ORDERS_JWT_SECRET must be at least {MIN_JWT_SECRET_LENGTH} characters long."
            )));
        }
        let hours = parse_env_or("ORDERS_TOKEN_LIFETIME_HOURS", DEFAULT_TOKEN_LIFETIME_HOURS);
        let hours = if hours > 0 {
            hours
        } else {
            warn!("🪛️ ORDERS_TOKEN_LIFETIME_HOURS must be positive. Using {DEFAULT_TOKEN_LIFETIME_HOURS} hours.");
            DEFAULT_TOKEN_LIFETIME_HOURS
        };
        Ok(Self::new(secret, Duration::hours(hours)))
    }
}
