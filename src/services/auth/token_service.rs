use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::{DateTime, TimeDelta, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{error, warn};

use crate::error::AppError;
use crate::services::auth::identity::Identity;
use crate::services::auth::signing_key::{KeySource, SigningKey};

/// 24h
pub const DEFAULT_TTL_SECONDS: u64 = 86_400;
/// 30 days
pub const MAX_TTL_SECONDS: u64 = 30 * 86_400;

/// Why a presented token was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TokenError {
    #[error("malformed token")]
    Malformed,
    #[error("token signature does not verify")]
    SignatureInvalid,
    #[error("token expired")]
    Expired,
}

impl From<jsonwebtoken::errors::Error> for TokenError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        match err.kind() {
            ErrorKind::InvalidSignature => TokenError::SignatureInvalid,
            // Header names an algorithm we did not sign with: cannot verify against our key.
            ErrorKind::InvalidAlgorithm | ErrorKind::MissingAlgorithm => {
                TokenError::SignatureInvalid
            }
            ErrorKind::ExpiredSignature => TokenError::Expired,
            _ => TokenError::Malformed,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct TokenClaims {
    sub: String,
    iat: i64,
    exp: i64,
}

/// A freshly signed token together with the claims it carries.
#[derive(Debug, Clone)]
pub struct IssuedToken {
    token: String,
    subject: String,
    issued_at: DateTime<Utc>,
    expires_at: DateTime<Utc>,
}

impl IssuedToken {
    #[cfg(test)]
    pub fn as_str(&self) -> &str {
        &self.token
    }

    pub fn into_string(self) -> String {
        self.token
    }

    pub fn subject(&self) -> &str {
        &self.subject
    }

    pub fn issued_at(&self) -> DateTime<Utc> {
        self.issued_at
    }

    pub fn expires_at(&self) -> DateTime<Utc> {
        self.expires_at
    }
}

/// Claims of a token whose signature and expiry have been checked.
///
/// `subject` is only a candidate: callers still resolve it against the identity store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedToken {
    pub subject: String,
    pub issued_at: i64,
    pub expires_at: i64,
}

/// HS256 issuer/verifier. Sole holder of the signing key.
#[derive(Clone)]
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    key_source: KeySource,
    ttl_seconds: u64,
}

impl std::fmt::Debug for TokenService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Do not print key material
        f.debug_struct("TokenService")
            .field("key_source", &self.key_source)
            .field("ttl_seconds", &self.ttl_seconds)
            .finish()
    }
}

impl TokenService {
    pub fn new(key: &SigningKey, ttl_seconds: u64) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        // exp は validate_at で注入された時刻に対して自前で判定する
        validation.validate_exp = false;
        validation.validate_aud = false;
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "sub"]);

        Self {
            encoding_key: EncodingKey::from_secret(key.as_bytes()),
            decoding_key: DecodingKey::from_secret(key.as_bytes()),
            validation,
            key_source: key.source(),
            ttl_seconds,
        }
    }

    /// Derive the key from the configured secret (base64 first, raw UTF-8 fallback).
    pub fn from_secret(secret: &str, ttl_seconds: u64) -> Self {
        let key = SigningKey::derive(secret);
        if key.is_weak() {
            warn!(
                source = ?key.source(),
                len = key.as_bytes().len(),
                "JWT signing key is shorter than 32 bytes"
            );
        }
        Self::new(&key, ttl_seconds)
    }

    pub fn ttl_seconds(&self) -> u64 {
        self.ttl_seconds
    }

    pub fn key_source(&self) -> KeySource {
        self.key_source
    }

    pub fn generate(&self, identity: &Identity) -> Result<IssuedToken, AppError> {
        self.generate_at(identity, Utc::now())
    }

    pub fn generate_at(
        &self,
        identity: &Identity,
        now: DateTime<Utc>,
    ) -> Result<IssuedToken, AppError> {
        let expires_at = i64::try_from(self.ttl_seconds)
            .ok()
            .and_then(TimeDelta::try_seconds)
            .and_then(|ttl| now.checked_add_signed(ttl))
            .ok_or_else(|| {
                error!(ttl_seconds = self.ttl_seconds, "token lifetime out of range");
                AppError::Internal
            })?;
        let iat = now.timestamp();
        let exp = expires_at.timestamp();

        let claims = TokenClaims {
            sub: identity.subject_id().to_string(),
            iat,
            exp,
        };

        let mut header = Header::new(Algorithm::HS256);
        header.typ = Some("JWT".to_string());
        let token = jsonwebtoken::encode(&header, &claims, &self.encoding_key).map_err(|e| {
            error!(error = %e, "failed to sign JWT");
            AppError::Internal
        })?;

        Ok(IssuedToken {
            token,
            subject: claims.sub,
            issued_at: now,
            expires_at,
        })
    }

    pub fn validate(&self, token: &str) -> Result<VerifiedToken, TokenError> {
        self.validate_at(token, Utc::now())
    }

    /// Structure → signature → expiry, in that order.
    pub fn validate_at(&self, token: &str, now: DateTime<Utc>) -> Result<VerifiedToken, TokenError> {
        check_segments(token)?;
        let data =
            jsonwebtoken::decode::<TokenClaims>(token, &self.decoding_key, &self.validation)?;
        let claims = data.claims;

        if claims.sub.trim().is_empty() {
            return Err(TokenError::Malformed);
        }
        if now.timestamp() >= claims.exp {
            return Err(TokenError::Expired);
        }

        Ok(VerifiedToken {
            subject: claims.sub,
            issued_at: claims.iat,
            expires_at: claims.exp,
        })
    }
}

/// header / payload が読めることを先に確かめる。
/// 3 つ目の区切り以降はすべて署名として扱い、読めなければ SignatureInvalid
fn check_segments(token: &str) -> Result<(), TokenError> {
    let mut segments = token.splitn(3, '.');
    let (Some(header), Some(payload), Some(signature)) =
        (segments.next(), segments.next(), segments.next())
    else {
        return Err(TokenError::Malformed);
    };

    let header = URL_SAFE_NO_PAD
        .decode(header)
        .map_err(|_| TokenError::Malformed)?;
    serde_json::from_slice::<Header>(&header).map_err(|_| TokenError::Malformed)?;

    let payload = URL_SAFE_NO_PAD
        .decode(payload)
        .map_err(|_| TokenError::Malformed)?;
    serde_json::from_slice::<TokenClaims>(&payload).map_err(|_| TokenError::Malformed)?;

    if signature.is_empty() || URL_SAFE_NO_PAD.decode(signature).is_err() {
        return Err(TokenError::SignatureInvalid);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use serde_json::json;

    const SECRET: &str = "YW4tZXhhbXBsZS1zaWduaW5nLXNlY3JldC0zMi1ieXRl";

    fn service() -> TokenService {
        TokenService::from_secret(SECRET, DEFAULT_TTL_SECONDS)
    }

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 1, 9, 0, 0).unwrap()
    }

    fn demo() -> Identity {
        Identity::new("demo@example.com", 1)
    }

    fn segment_json(token: &str, index: usize) -> serde_json::Value {
        let part = token.split('.').nth(index).unwrap();
        let bytes = URL_SAFE_NO_PAD.decode(part).unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[test]
    fn generated_token_validates_to_subject() {
        let svc = service();
        for subject in ["demo@example.com", "other@example.com", "a+b@example.org"] {
            let issued = svc.generate_at(&Identity::new(subject, 42), t0()).unwrap();
            let verified = svc
                .validate_at(issued.as_str(), t0() + Duration::seconds(1))
                .unwrap();
            assert_eq!(verified.subject, subject);
        }
    }

    #[test]
    fn wire_format_is_hs256_jwt_with_24h_expiry() {
        let issued = service().generate_at(&demo(), t0()).unwrap();
        assert_eq!(issued.as_str().split('.').count(), 3);

        let header = segment_json(issued.as_str(), 0);
        assert_eq!(header["alg"], "HS256");
        assert_eq!(header["typ"], "JWT");

        let payload = segment_json(issued.as_str(), 1);
        let iat = t0().timestamp();
        assert_eq!(payload, json!({"sub": "demo@example.com", "iat": iat, "exp": iat + 86_400}));
        assert_eq!(issued.expires_at() - issued.issued_at(), Duration::hours(24));
    }

    #[test]
    fn valid_just_before_expiry() {
        let svc = service();
        let issued = svc.generate_at(&demo(), t0()).unwrap();
        let at = t0() + Duration::hours(23) + Duration::minutes(59);
        assert!(svc.validate_at(issued.as_str(), at).is_ok());
    }

    #[test]
    fn expired_after_24h() {
        let svc = service();
        let issued = svc.generate_at(&demo(), t0()).unwrap();

        let at = t0() + Duration::hours(24) + Duration::seconds(1);
        assert_eq!(svc.validate_at(issued.as_str(), at), Err(TokenError::Expired));

        // now == exp is already expired
        let at = t0() + Duration::hours(24);
        assert_eq!(svc.validate_at(issued.as_str(), at), Err(TokenError::Expired));
    }

    #[test]
    fn any_flipped_signature_bit_is_rejected() {
        let svc = service();
        let issued = svc.generate_at(&demo(), t0()).unwrap();
        let (signing_input, signature) = issued.as_str().rsplit_once('.').unwrap();
        let sig = URL_SAFE_NO_PAD.decode(signature).unwrap();

        for byte in 0..sig.len() {
            for bit in 0..8 {
                let mut tampered = sig.clone();
                tampered[byte] ^= 1 << bit;
                let token = format!("{signing_input}.{}", URL_SAFE_NO_PAD.encode(&tampered));
                assert_eq!(
                    svc.validate_at(&token, t0()),
                    Err(TokenError::SignatureInvalid),
                    "byte {byte} bit {bit}"
                );
            }
        }
    }

    #[test]
    fn any_flipped_bit_in_signature_text_is_rejected() {
        let svc = service();
        let issued = svc.generate_at(&demo(), t0()).unwrap();
        let (signing_input, signature) = issued.as_str().rsplit_once('.').unwrap();

        for index in 0..signature.len() {
            // 7 bits keep the character ASCII, so the token stays a valid &str
            for bit in 0..7 {
                let mut bytes = signature.as_bytes().to_vec();
                bytes[index] ^= 1 << bit;
                let tampered = String::from_utf8(bytes).unwrap();
                let token = format!("{signing_input}.{tampered}");
                assert_eq!(
                    svc.validate_at(&token, t0()),
                    Err(TokenError::SignatureInvalid),
                    "char {index} bit {bit} -> {tampered:?}"
                );
            }
        }
    }

    #[test]
    fn missing_signature_is_rejected() {
        let svc = service();
        let issued = svc.generate_at(&demo(), t0()).unwrap();
        let (signing_input, _) = issued.as_str().rsplit_once('.').unwrap();
        assert_eq!(
            svc.validate_at(&format!("{signing_input}."), t0()),
            Err(TokenError::SignatureInvalid)
        );
    }

    #[test]
    fn out_of_range_ttl_is_an_error_not_a_panic() {
        for ttl in [10_000_000_000_000_000, i64::MAX as u64, u64::MAX] {
            let svc = TokenService::from_secret(SECRET, ttl);
            assert!(
                matches!(svc.generate_at(&demo(), t0()), Err(AppError::Internal)),
                "ttl {ttl}"
            );
        }
    }

    #[test]
    fn longest_allowed_ttl_still_issues_valid_tokens() {
        let svc = TokenService::from_secret(SECRET, MAX_TTL_SECONDS);
        let issued = svc.generate_at(&demo(), t0()).unwrap();
        assert_eq!(issued.expires_at() - issued.issued_at(), Duration::days(30));
        assert!(svc.validate_at(issued.as_str(), t0()).is_ok());
    }

    #[test]
    fn tampered_payload_is_rejected() {
        let svc = service();
        let issued = svc.generate_at(&demo(), t0()).unwrap();
        let parts: Vec<&str> = issued.as_str().split('.').collect();
        let forged = URL_SAFE_NO_PAD.encode(
            json!({"sub": "other@example.com", "iat": t0().timestamp(), "exp": t0().timestamp() + 86_400})
                .to_string(),
        );
        let token = format!("{}.{}.{}", parts[0], forged, parts[2]);
        assert_eq!(svc.validate_at(&token, t0()), Err(TokenError::SignatureInvalid));
    }

    #[test]
    fn token_from_other_key_is_rejected() {
        let issued = service().generate_at(&demo(), t0()).unwrap();

        // textually identical secret, but used as raw bytes
        let raw = TokenService::new(&SigningKey::from_raw(SECRET), DEFAULT_TTL_SECONDS);
        assert_eq!(raw.key_source(), KeySource::RawUtf8);
        assert_eq!(
            raw.validate_at(issued.as_str(), t0()),
            Err(TokenError::SignatureInvalid)
        );
    }

    #[test]
    fn raw_secret_path_round_trips() {
        let svc = TokenService::from_secret("change-me-in-dev", DEFAULT_TTL_SECONDS);
        assert_eq!(svc.key_source(), KeySource::RawUtf8);

        let issued = svc.generate_at(&demo(), t0()).unwrap();
        let verified = svc.validate_at(issued.as_str(), t0()).unwrap();
        assert_eq!(verified.subject, "demo@example.com");

        assert_eq!(
            service().validate_at(issued.as_str(), t0()),
            Err(TokenError::SignatureInvalid)
        );
    }

    #[test]
    fn structurally_broken_tokens_are_malformed() {
        let svc = service();
        for token in ["", "abc", "a.b", "a.b.c", "!!!.???.***", "Bearer x.y.z"] {
            assert_eq!(
                svc.validate_at(token, t0()),
                Err(TokenError::Malformed),
                "{token:?}"
            );
        }
    }

    #[test]
    fn missing_subject_claim_is_malformed() {
        let key = SigningKey::derive(SECRET);
        let claims = json!({"iat": t0().timestamp(), "exp": t0().timestamp() + 60});
        let token = jsonwebtoken::encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(key.as_bytes()),
        )
        .unwrap();

        assert_eq!(service().validate_at(&token, t0()), Err(TokenError::Malformed));
    }

    #[test]
    fn other_algorithm_is_rejected() {
        let key = SigningKey::derive(SECRET);
        let claims = json!({
            "sub": "demo@example.com",
            "iat": t0().timestamp(),
            "exp": t0().timestamp() + 60,
        });
        let token = jsonwebtoken::encode(
            &Header::new(Algorithm::HS512),
            &claims,
            &EncodingKey::from_secret(key.as_bytes()),
        )
        .unwrap();

        assert_eq!(
            service().validate_at(&token, t0()),
            Err(TokenError::SignatureInvalid)
        );
    }

    #[test]
    fn ttl_follows_configuration() {
        let svc = TokenService::from_secret(SECRET, 600);
        let issued = svc.generate_at(&demo(), t0()).unwrap();
        assert!(svc.validate_at(issued.as_str(), t0() + Duration::seconds(599)).is_ok());
        assert_eq!(
            svc.validate_at(issued.as_str(), t0() + Duration::seconds(600)),
            Err(TokenError::Expired)
        );
    }
}
