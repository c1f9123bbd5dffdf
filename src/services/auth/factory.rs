/// Factory: build `TokenService` from application `Config`.
use std::sync::Arc;

use crate::config::Config;
use crate::services::auth::TokenService;

/// The key is derived here, once per process.
pub fn build_token_service(config: &Config) -> Arc<TokenService> {
    let tokens = TokenService::from_secret(&config.jwt_secret, config.access_token_ttl_seconds);
    tracing::info!(
        key_source = ?tokens.key_source(),
        ttl_seconds = tokens.ttl_seconds(),
        "token service ready"
    );
    Arc::new(tokens)
}
