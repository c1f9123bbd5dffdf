/*
 * Responsibility
 * - Handler から見える「リクエスト単位の認証コンテキスト」の型
 * - middleware が生成して request extensions に格納し、handler/service はこの型だけを受け取る
 *
 * Notes
 * - リクエスト毎に 1 つだけ作られ、リクエスト終了とともに破棄される (リクエスト間で共有しない)
 * - identity が一度入ったら上書きしない (2 回目の set は no-op)
 * - token 検証や identity 解決は middleware/services 側の責務
 */
use crate::services::auth::Identity;

#[derive(Debug, Clone, Default)]
pub struct AuthContext {
    identity: Option<Identity>,
}

impl AuthContext {
    /// No valid token was presented.
    pub fn anonymous() -> Self {
        Self { identity: None }
    }

    #[cfg(test)]
    pub fn authenticated(identity: Identity) -> Self {
        Self {
            identity: Some(identity),
        }
    }

    pub fn identity(&self) -> Option<&Identity> {
        self.identity.as_ref()
    }

    pub fn is_authenticated(&self) -> bool {
        self.identity.is_some()
    }

    /// Returns `false` (and keeps the existing identity) when already populated.
    pub fn set_identity(&mut self, identity: Identity) -> bool {
        if self.identity.is_some() {
            return false;
        }
        self.identity = Some(identity);
        true
    }
}
