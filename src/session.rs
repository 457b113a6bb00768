use std::collections::HashMap;

use log::error;
use parking_lot::RwLock;

use crate::auth::Token;
use crate::user::Role;

/// What a token resolves to: the identity captured at login.
/// The role is copied from the credential store at login time and
/// never re-resolved, so later credential changes don't affect
/// live sessions.
#[derive(Debug, Clone)]
pub struct Session {
    pub username: String,
    pub role: Role,
}

/// In-memory session registry. Sessions live until revoked - there
/// is no expiry, so entries accumulate for the process lifetime.
#[derive(Debug)]
pub struct Sessions {
    sessions: RwLock<HashMap<Token, Session>>,
}

impl Sessions {
    pub fn new() -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
        }
    }

    pub fn create(&self, username: &str, role: Role) -> Result<Token, ()> {
        let token = Token::generate().map_err(|e| {
            error!("couldn't generate session token: {e}");
        })?;

        self.sessions.write().insert(
            token.clone(),
            Session {
                username: username.into(),
                role,
            },
        );

        Ok(token)
    }

    pub fn resolve(&self, token: &Token) -> Option<Session> {
        self.sessions.read().get(token).cloned()
    }

    /// Idempotent - revoking an unknown token is not an error.
    pub fn revoke(&self, token: &Token) {
        self.sessions.write().remove(token);
    }
}
