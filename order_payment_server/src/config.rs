use std::{env, fmt::Display, str::FromStr};

use log::*;
use opg_common::{parse_env_or_default, Secret};
use order_payment_engine::DEFAULT_MAX_ITEMS_PER_ORDER;
use rand::{distributions::Alphanumeric, Rng};
use stripe_tools::StripeConfig;

const DEFAULT_OPG_HOST: &str = "127.0.0.1";
const DEFAULT_OPG_PORT: u16 = 5000;
const DEFAULT_DATABASE_URL: &str = "sqlite://data/orders.db";

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    pub environment: Environment,
    pub auth: AuthConfig,
    /// The most line items a customer may put in a single order.
    pub max_items_per_order: usize,
    pub stripe: StripeConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_OPG_HOST.to_string(),
            port: DEFAULT_OPG_PORT,
            database_url: DEFAULT_DATABASE_URL.to_string(),
            environment: Environment::default(),
            auth: AuthConfig::default(),
            max_items_per_order: DEFAULT_MAX_ITEMS_PER_ORDER,
            stripe: StripeConfig::default(),
        }
    }
}

impl ServerConfig {
    pub fn new(host: &str, port: u16) -> Self {
        Self { host: host.to_string(), port, ..Default::default() }
    }

    pub fn from_env_or_default() -> Self {
        let host = env::var("OPG_HOST").ok().unwrap_or_else(|| DEFAULT_OPG_HOST.into());
        let port = parse_env_or_default("OPG_PORT", DEFAULT_OPG_PORT, |m| info!("🪛️ {m}"));
        let database_url = env::var("OPG_DATABASE_URL").ok().unwrap_or_else(|| {
            warn!("🪛️ OPG_DATABASE_URL is not set. Using {DEFAULT_DATABASE_URL}.");
            DEFAULT_DATABASE_URL.to_string()
        });
        let environment = parse_env_or_default("OPG_ENVIRONMENT", Environment::default(), |m| info!("🪛️ {m}"));
        let auth = AuthConfig::try_from_env().unwrap_or_else(|e| {
            error!(
                "🪛️ Could not load the authentication configuration from environment variables. {e}. Using a random \
                 secret for this process. Tokens issued elsewhere will NOT be accepted."
            );
            AuthConfig::random()
        });
        let max_items_per_order =
            parse_env_or_default("OPG_MAX_ITEMS_PER_ORDER", DEFAULT_MAX_ITEMS_PER_ORDER, |m| debug!("🪛️ {m}"));
        let stripe = StripeConfig::new_from_env_or_default();
        Self { host, port, database_url, environment, auth, max_items_per_order, stripe }
    }
}

/// Production deployments hide error details from API responses.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Environment {
    #[default]
    Development,
    Test,
    Production,
}

impl Environment {
    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }
}

impl Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Development => write!(f, "development"),
            Self::Test => write!(f, "test"),
            Self::Production => write!(f, "production"),
        }
    }
}

impl FromStr for Environment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "development" | "dev" => Ok(Self::Development),
            "test" => Ok(Self::Test),
            "production" | "prod" => Ok(Self::Production),
            _ => Err(format!("Unknown environment '{s}'.")),
        }
    }
}

//-------------------------------------------------  AuthConfig  -----------------------------------------------------
#[derive(Clone, Debug, Default)]
pub struct AuthConfig {
    /// The HS256 secret shared with the account service that issues access tokens.
    pub jwt_secret: Secret<String>,
}

impl AuthConfig {
    pub fn new<S: Into<String>>(secret: S) -> Self {
        Self { jwt_secret: Secret::new(secret.into()) }
    }

    /// A configuration with a secret that nobody else knows. Only tokens issued by this process will verify.
    pub fn random() -> Self {
        let secret: String = rand::thread_rng().sample_iter(&Alphanumeric).take(48).map(char::from).collect();
        Self::new(secret)
    }

    pub fn try_from_env() -> Result<Self, String> {
        let secret = env::var("OPG_JWT_SECRET").map_err(|e| format!("OPG_JWT_SECRET is not available. {e}"))?;
        if secret.trim().is_empty() {
            return Err("OPG_JWT_SECRET is empty".into());
        }
        Ok(Self::new(secret))
    }
}
