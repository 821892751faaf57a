//! Session collaborator
//!
//! The pipeline only needs to know whether someone is signed in and who. An
//! absent identity never fails an operation: uploads are filed under
//! [`UNKNOWN_USER`] and listings query with an empty identifier.

use parking_lot::RwLock;

/// User id attached to uploads when nobody is signed in
pub const UNKNOWN_USER: &str = "unknown";

pub trait SessionProvider: Send + Sync {
    fn is_signed_in(&self) -> bool;

    fn current_user_id(&self) -> Option<String>;

    /// Identifier to file new garments under
    fn upload_user_id(&self) -> String {
        self.current_user_id()
            .unwrap_or_else(|| UNKNOWN_USER.to_string())
    }

    /// Identifier to list or delete garments with
    fn listing_user_id(&self) -> String {
        self.current_user_id().unwrap_or_default()
    }
}

/// Session backed by a fixed, replaceable user id
#[derive(Debug, Default)]
pub struct StaticSession {
    user_id: RwLock<Option<String>>,
}

impl StaticSession {
    pub fn new(user_id: Option<String>) -> Self {
        Self {
            user_id: RwLock::new(user_id.filter(|id| !id.is_empty())),
        }
    }

    pub fn anonymous() -> Self {
        Self::default()
    }

    /// Ensure a session exists for this identity, replacing any previous one
    pub fn sign_in<S: Into<String>>(&self, user_id: S) {
        let user_id = user_id.into();
        *self.user_id.write() = if user_id.is_empty() {
            None
        } else {
            Some(user_id)
        };
    }

    pub fn sign_out(&self) {
        *self.user_id.write() = None;
    }
}

impl SessionProvider for StaticSession {
    fn is_signed_in(&self) -> bool {
        self.user_id.read().is_some()
    }

    fn current_user_id(&self) -> Option<String> {
        self.user_id.read().clone()
    }
}
