//! Bearer token（HS256 JWT）検証 → AuthContext を extensions に入れる
//!
//! 全リクエストに対して 1 回だけ、resource の処理より前に走る。
//!
//! 状態遷移 (リクエスト毎):
//! - NoHeader → HeaderPresent → TokenParsed → SignatureValid → Authenticated
//! - HeaderPresent / TokenParsed / SignatureValid での失敗は Unauthenticated へ
//! - どちらの終端でもリクエストは下流へ流す。違いは AuthContext が埋まっているかどうかだけ
//!
//! AuthFailMode::Closed のときだけ、「提示された token が不正」なリクエストを 401 で止める。
//! ヘッダ無し / Bearer 形式でないものは Closed でも空の AuthContext で通す。

use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    extract::State,
    http::{HeaderMap, Request, header},
    middleware::{self, Next},
    response::Response,
};
use thiserror::Error;

use crate::api::v1::extractors::AuthContext;
use crate::config::AuthFailMode;
use crate::error::AppError;
use crate::repos::error::RepoError;
use crate::services::auth::{Identity, IdentityStore, TokenError, TokenService};

/// Token-level failures. Never surfaced to the caller in open mode.
#[derive(Debug, Error)]
pub enum AuthnFailure {
    #[error(transparent)]
    Token(#[from] TokenError),
    #[error("unknown subject")]
    UnknownSubject,
    #[error("identity store failure: {0}")]
    Store(#[from] RepoError),
}

/// Everything the middleware needs; cheap to clone.
#[derive(Clone)]
pub struct Authenticator {
    tokens: Arc<TokenService>,
    identities: Arc<dyn IdentityStore>,
    fail_mode: AuthFailMode,
}

impl std::fmt::Debug for Authenticator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Authenticator")
            .field("tokens", &self.tokens)
            .field("identities", &self.identities.backend_name())
            .field("fail_mode", &self.fail_mode)
            .finish()
    }
}

impl Authenticator {
    pub fn new(
        tokens: Arc<TokenService>,
        identities: Arc<dyn IdentityStore>,
        fail_mode: AuthFailMode,
    ) -> Self {
        Self {
            tokens,
            identities,
            fail_mode,
        }
    }

    /// `Ok(None)` when no bearer token was presented.
    pub async fn authenticate(&self, headers: &HeaderMap) -> Result<Option<Identity>, AuthnFailure> {
        let Some(token) = bearer_token(headers) else {
            return Ok(None);
        };

        let verified = self.tokens.validate(token)?;
        tracing::debug!(
            subject = %verified.subject,
            issued_at = verified.issued_at,
            expires_at = verified.expires_at,
            "access token verified"
        );

        let identity = self
            .identities
            .load(&verified.subject)
            .await?
            .ok_or(AuthnFailure::UnknownSubject)?;

        Ok(Some(identity))
    }
}

/// `Authorization: Bearer <token>` の token 部分。形式外・空は None
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .filter(|t| !t.trim().is_empty())
}

/// Router 全体に認証 middleware を適用する。
///
/// 例：
/// ```ignore
/// let app = middleware::auth::access::apply(app, state.authenticator());
/// ```
pub fn apply<S>(router: Router<S>, authn: Authenticator) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    // axum 0.8 の from_fn は State extractor を受け取れないため、`from_fn_with_state` で明示的に state を渡す
    router.layer(middleware::from_fn_with_state(authn, access_middleware))
}

async fn access_middleware(
    State(authn): State<Authenticator>,
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    // 既に identity が入っていれば上書きしない
    if req
        .extensions()
        .get::<AuthContext>()
        .is_some_and(AuthContext::is_authenticated)
    {
        return Ok(next.run(req).await);
    }

    let mut auth_ctx = AuthContext::anonymous();

    match authn.authenticate(req.headers()).await {
        Ok(Some(identity)) => {
            tracing::debug!(subject = identity.subject_id(), "request authenticated");
            auth_ctx.set_identity(identity);
        }
        Ok(None) => {
            tracing::debug!("no bearer token; continuing unauthenticated");
        }
        Err(AuthnFailure::Store(err)) => {
            tracing::error!(
                error = ?err,
                backend = authn.identities.backend_name(),
                "identity lookup failed"
            );
            if authn.fail_mode == AuthFailMode::Closed {
                return Err(AppError::Internal);
            }
        }
        Err(err) => {
            tracing::warn!(error = %err, "access token rejected");
            if authn.fail_mode == AuthFailMode::Closed {
                return Err(AppError::Unauthorized("invalid access token"));
            }
        }
    }

    // middleware → extractor への受け渡し
    req.extensions_mut().insert(auth_ctx);

    Ok(next.run(req).await)
}
