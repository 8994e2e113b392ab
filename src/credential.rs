//! Bearer credential used for outbound upstream calls.
//!
//! The store is the only piece of shared mutable state in the bridge. Every
//! write replaces the whole `Credential` value, so readers observe either the
//! previous token or the new one.

use std::fmt;
use std::sync::Arc;
use tokio::sync::RwLock;

const MASK: &str = "****";
const VISIBLE_CHARS: usize = 4;

/// An immutable bearer token.
///
/// `Debug` and `Display` only ever show the masked form.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(Arc<str>);

impl Credential {
    /// Wrap a token. Returns `None` for an empty token.
    pub fn new(token: impl AsRef<str>) -> Option<Self> {
        let token = token.as_ref();
        if token.is_empty() {
            None
        } else {
            Some(Self(Arc::from(token)))
        }
    }

    /// The raw token, for building the `Authorization` header.
    pub fn expose(&self) -> &str {
        &self.0
    }

    /// First and last four characters with the middle redacted.
    pub fn masked(&self) -> String {
        mask_token(&self.0)
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Credential").field(&self.masked()).finish()
    }
}

impl fmt::Display for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.masked())
    }
}

/// Mask a token as `abcd****wxyz`; tokens of eight characters or fewer are
/// fully redacted.
pub fn mask_token(token: &str) -> String {
    let chars: Vec<char> = token.chars().collect();
    if chars.len() <= VISIBLE_CHARS * 2 {
        return MASK.to_string();
    }

    let head: String = chars[..VISIBLE_CHARS].iter().collect();
    let tail: String = chars[chars.len() - VISIBLE_CHARS..].iter().collect();
    format!("{head}{MASK}{tail}")
}

/// Process-wide credential cell shared by the dispatcher and `set_credential`.
#[derive(Clone, Default)]
pub struct CredentialStore {
    current: Arc<RwLock<Option<Credential>>>,
}

impl CredentialStore {
    /// Create a store holding an optional initial credential.
    pub fn new(initial: Option<Credential>) -> Self {
        Self {
            current: Arc::new(RwLock::new(initial)),
        }
    }

    /// Snapshot of the current credential.
    pub async fn get(&self) -> Option<Credential> {
        self.current.read().await.clone()
    }

    /// Replace the credential, returning the previous one.
    ///
    /// An empty token clears the store.
    pub async fn set(&self, token: &str) -> Option<Credential> {
        let next = Credential::new(token);
        let mut current = self.current.write().await;
        std::mem::replace(&mut *current, next)
    }

    pub async fn is_configured(&self) -> bool {
        self.current.read().await.is_some()
    }
}

impl fmt::Debug for CredentialStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialStore").finish_non_exhaustive()
    }
}
