/*
 * Responsibility
 * - 認証済み主体 (Identity) と権限 (Capability) の型
 * - subject_id (= email) が一意キー。user_id は DB 内部 ID で、表示/クエリ用の付帯情報
 * - 一度解決されたら、そのリクエストの間は不変
 */
use std::collections::BTreeSet;

/// Coarse-grained capability attached to an identity.
///
/// Only `User` is granted today; ownership checks are done separately by the guard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Capability {
    User,
}

impl Capability {
    pub fn as_str(&self) -> &'static str {
        match self {
            Capability::User => "USER",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    subject_id: String,
    user_id: i64,
    capabilities: BTreeSet<Capability>,
}

impl Identity {
    /// A regular account: granted `Capability::User`.
    pub fn new(subject_id: impl Into<String>, user_id: i64) -> Self {
        Self::with_capabilities(subject_id, user_id, [Capability::User])
    }

    pub fn with_capabilities(
        subject_id: impl Into<String>,
        user_id: i64,
        capabilities: impl IntoIterator<Item = Capability>,
    ) -> Self {
        Self {
            subject_id: subject_id.into(),
            user_id,
            capabilities: capabilities.into_iter().collect(),
        }
    }

    pub fn subject_id(&self) -> &str {
        &self.subject_id
    }

    pub fn user_id(&self) -> i64 {
        self.user_id
    }

    pub fn capabilities(&self) -> &BTreeSet<Capability> {
        &self.capabilities
    }

    pub fn has(&self, capability: Capability) -> bool {
        self.capabilities.contains(&capability)
    }
}
