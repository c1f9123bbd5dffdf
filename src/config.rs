/*
 * Responsibility
 * - 環境変数や設定の読み込み (DATABASE_URL, CORS 許可、JWT secret、認証ポリシーなど)
 * - 設定値のバリデーション (不足なら起動失敗)
 * - 実際の読み取りは from_lookup に寄せる (テストでは HashMap を渡す)
 */
use std::fmt;
use std::net::SocketAddr;
use std::str::FromStr;

use crate::services::auth::token_service::{DEFAULT_TTL_SECONDS, MAX_TTL_SECONDS};

const DEV_JWT_SECRET: &str = "change-me-in-dev";
const DEV_FALLBACK_SUBJECT: &str = "demo@example.com";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnv {
    Development,
    Production,
}

impl AppEnv {
    pub fn parse(value: Option<&str>) -> Self {
        match value
            .unwrap_or("development")
            .to_ascii_lowercase()
            .as_str()
        {
            "production" | "prod" => Self::Production,
            _ => Self::Development,
        }
    }

    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }
}

/// What the authentication middleware does with a bearer token that fails validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthFailMode {
    /// Continue with an empty AuthContext.
    Open,
    /// Reject the request with 401.
    Closed,
}

impl FromStr for AuthFailMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "open" => Ok(Self::Open),
            "closed" => Ok(Self::Closed),
            _ => Err(ConfigError::Invalid("AUTH_FAIL_MODE")),
        }
    }
}

#[derive(Debug, PartialEq, Eq)]
pub enum ConfigError {
    Missing(&'static str),
    Invalid(&'static str),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Missing(key) => write!(f, "missing configuration: {}", key),
            ConfigError::Invalid(key) => write!(f, "invalid configuration: {}", key),
        }
    }
}

impl std::error::Error for ConfigError {}

#[derive(Clone)]
pub struct Config {
    pub addr: SocketAddr,
    pub database_url: String,

    pub app_env: AppEnv,
    pub cors_allowed_origins: Vec<String>,

    pub jwt_secret: String,
    pub access_token_ttl_seconds: u64,
    pub auth_fail_mode: AuthFailMode,

    // 未認証リクエストを解決する固定 identity (None なら 401)
    pub fallback_subject: Option<String>,
    pub seed_demo_data: bool,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Do not print secrets
        f.debug_struct("Config")
            .field("addr", &self.addr)
            .field("app_env", &self.app_env)
            .field("cors_allowed_origins", &self.cors_allowed_origins)
            .field("access_token_ttl_seconds", &self.access_token_ttl_seconds)
            .field("auth_fail_mode", &self.auth_fail_mode)
            .field("fallback_subject", &self.fallback_subject)
            .field("seed_demo_data", &self.seed_demo_data)
            .finish()
    }
}

fn parse_bool(key: &'static str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::Invalid(key)),
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(get: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let port: u16 = match get("PORT") {
            Some(s) => s.parse().map_err(|_| ConfigError::Invalid("PORT"))?,
            None => 8080,
        };

        let addr: SocketAddr = SocketAddr::from_str(&format!("0.0.0.0:{}", port))
            .map_err(|_| ConfigError::Invalid("PORT"))?;

        let database_url = get("DATABASE_URL").ok_or(ConfigError::Missing("DATABASE_URL"))?;

        let app_env = AppEnv::parse(get("APP_ENV").as_deref());

        let cors_allowed_origins = get("CORS_ALLOWED_ORIGINS")
            .unwrap_or_default()
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>();

        // production では dev 用 secret に落とさない
        let jwt_secret = match get("JWT_SECRET") {
            Some(s) => s,
            None if app_env.is_production() => return Err(ConfigError::Missing("JWT_SECRET")),
            None => DEV_JWT_SECRET.to_string(),
        };
        if jwt_secret.is_empty() {
            return Err(ConfigError::Invalid("JWT_SECRET"));
        }

        let access_token_ttl_seconds = match get("ACCESS_TOKEN_TTL_SECONDS") {
            Some(s) => s
                .parse::<u64>()
                .ok()
                .filter(|v| (1..=MAX_TTL_SECONDS).contains(v))
                .ok_or(ConfigError::Invalid("ACCESS_TOKEN_TTL_SECONDS"))?,
            None => DEFAULT_TTL_SECONDS,
        };

        let auth_fail_mode = match get("AUTH_FAIL_MODE") {
            Some(s) => s.parse::<AuthFailMode>()?,
            None => AuthFailMode::Open,
        };

        let fallback_subject = match get("FALLBACK_SUBJECT") {
            Some(s) if s.trim().is_empty() => None,
            Some(s) => Some(s.trim().to_string()),
            None if app_env.is_production() => None,
            None => Some(DEV_FALLBACK_SUBJECT.to_string()),
        };

        let seed_demo_data = match get("SEED_DEMO_DATA") {
            Some(s) => parse_bool("SEED_DEMO_DATA", &s)?,
            None => !app_env.is_production(),
        };

        Ok(Self {
            addr,
            database_url,
            app_env,
            cors_allowed_origins,
            jwt_secret,
            access_token_ttl_seconds,
            auth_fail_mode,
            fallback_subject,
            seed_demo_data,
        })
    }
}
