//! Session-scoped credential persistence.
//!
//! Tokens and the user record are stored in one JSON file per session id
//! under a shared base directory, so two isolated contexts never observe
//! each other's data even on the same storage medium. Writes go through a
//! temp file and a rename; readers never observe a partial write.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::{fs, io};

/// The signed-in user, as returned by the login endpoint.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct UserRecord {
    pub id: String,
    pub username: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
}

/// The stored token pair. The access token rides on every outbound call;
/// the refresh token is touched only by the renewal flow.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CredentialPair {
    pub access_token: Option<String>,
    pub refresh_token: Option<String>,
}

impl CredentialPair {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.access_token.is_none() && self.refresh_token.is_none()
    }
}

/// One browser-context-equivalent session: an opaque id, the user it belongs
/// to, and when it was created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionRecord {
    pub session_id: String,
    pub user: UserRecord,
    pub created_at: DateTime<Utc>,
}

/// On-disk shape of one session file.
#[derive(Serialize, Deserialize, Debug, Default)]
#[serde(rename_all = "camelCase")]
struct StoredSession {
    access_token: Option<String>,
    refresh_token: Option<String>,
    user: Option<UserRecord>,
    created_at: Option<DateTime<Utc>>,
}

/// File-backed store, keyed by an opaque session id generated once per
/// store instance.
#[derive(Debug, Clone)]
pub struct CredentialStore {
    base_dir: PathBuf,
    session_id: String,
}

impl CredentialStore {
    /// Create a store with a fresh session id.
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self::with_session_id(base_dir, uuid::Uuid::new_v4().to_string())
    }

    /// Create a store bound to an existing session id.
    pub fn with_session_id(base_dir: impl Into<PathBuf>, session_id: String) -> Self {
        Self {
            base_dir: base_dir.into(),
            session_id,
        }
    }

    /// Default base directory under the user's home, shared by every session.
    pub fn default_dir() -> Option<PathBuf> {
        home::home_dir().map(|dir| dir.join(".afis-console").join("sessions"))
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    fn session_path(&self) -> PathBuf {
        self.base_dir.join(format!("{}.json", self.session_id))
    }

    /// Persist the token pair, overwriting prior values atomically.
    ///
    /// An absent access token forces the refresh token out too: a cleared
    /// access token must never leave a usable refresh token behind.
    pub fn save(&self, pair: &CredentialPair) -> io::Result<()> {
        let mut stored = self.read_session();
        if pair.access_token.is_none() {
            stored.access_token = None;
            stored.refresh_token = None;
        } else {
            stored.access_token = pair.access_token.clone();
            stored.refresh_token = pair.refresh_token.clone();
        }
        self.write_session(&stored)
    }

    /// Load the stored pair. Never errors: a missing, corrupt, or unreadable
    /// session file yields an empty pair.
    pub fn load(&self) -> CredentialPair {
        let stored = self.read_session();
        CredentialPair {
            access_token: stored.access_token,
            refresh_token: stored.refresh_token,
        }
    }

    /// Remove tokens and the user record. Idempotent.
    pub fn clear(&self) -> io::Result<()> {
        match fs::remove_file(self.session_path()) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e),
        }
    }

    /// Persist the session's user record, stamping the session creation time
    /// on first write.
    pub fn save_user(&self, user: &UserRecord) -> io::Result<()> {
        let mut stored = self.read_session();
        stored.user = Some(user.clone());
        if stored.created_at.is_none() {
            stored.created_at = Some(Utc::now());
        }
        self.write_session(&stored)
    }

    /// The stored user record, if any.
    pub fn load_user(&self) -> Option<UserRecord> {
        self.read_session().user
    }

    /// The full session record, present once a user has been stored.
    pub fn session(&self) -> Option<SessionRecord> {
        let stored = self.read_session();
        Some(SessionRecord {
            session_id: self.session_id.clone(),
            user: stored.user?,
            created_at: stored.created_at.unwrap_or_else(Utc::now),
        })
    }

    fn read_session(&self) -> StoredSession {
        read_session_file(&self.session_path())
    }

    fn write_session(&self, stored: &StoredSession) -> io::Result<()> {
        fs::create_dir_all(&self.base_dir)?;
        let json = serde_json::to_string_pretty(stored)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        // Write-then-rename so readers see either the old file or the new
        // one, never a torn write.
        let tmp_path = self
            .base_dir
            .join(format!("{}.json.tmp", self.session_id));
        fs::write(&tmp_path, json)?;
        fs::rename(&tmp_path, self.session_path())
    }
}

fn read_session_file(path: &Path) -> StoredSession {
    let Ok(buf) = fs::read(path) else {
        return StoredSession::default();
    };
    serde_json::from_slice(&buf).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use std::io::Write;
    use tempfile::tempdir;

    fn user(id: &str) -> UserRecord {
        UserRecord {
            id: id.to_string(),
            username: format!("examiner-{id}"),
            full_name: None,
            role: Some("examiner".to_string()),
        }
    }

    #[test]
    /// Loading a saved pair should return the same pair.
    fn load_recovers_saved_pair() {
        let dir = tempdir().unwrap();
        let store = CredentialStore::new(dir.path());

        let pair = CredentialPair {
            access_token: Some("access".to_string()),
            refresh_token: Some("refresh".to_string()),
        };
        store.save(&pair).unwrap();

        assert_eq!(store.load(), pair);
    }

    #[test]
    /// Saving without an access token clears the refresh token too.
    fn cleared_access_token_implies_cleared_refresh_token() {
        let dir = tempdir().unwrap();
        let store = CredentialStore::new(dir.path());

        store
            .save(&CredentialPair {
                access_token: None,
                refresh_token: Some("refresh".to_string()),
            })
            .unwrap();

        assert!(store.load().is_empty());
    }

    #[test]
    /// Two session ids sharing a base directory never observe each other.
    fn sessions_are_isolated_on_a_shared_medium() {
        let dir = tempdir().unwrap();
        let store_a = CredentialStore::new(dir.path());
        let store_b = CredentialStore::new(dir.path());

        store_a.save_user(&user("a")).unwrap();
        store_b.save_user(&user("b")).unwrap();

        assert_eq!(store_a.load_user().unwrap().id, "a");
        assert_eq!(store_b.load_user().unwrap().id, "b");

        store_a.clear().unwrap();
        assert!(store_a.load_user().is_none());
        assert_eq!(store_b.load_user().unwrap().id, "b");
    }

    #[test]
    /// Clear removes tokens and user, and can be called twice.
    fn clear_is_idempotent() {
        let dir = tempdir().unwrap();
        let store = CredentialStore::new(dir.path());

        store
            .save(&CredentialPair {
                access_token: Some("access".to_string()),
                refresh_token: Some("refresh".to_string()),
            })
            .unwrap();
        store.save_user(&user("a")).unwrap();

        store.clear().unwrap();
        store.clear().unwrap();

        assert!(store.load().is_empty());
        assert!(store.load_user().is_none());
    }

    #[test]
    /// A corrupt session file reads back as an empty pair, never an error.
    fn corrupt_file_yields_empty_pair() {
        let dir = tempdir().unwrap();
        let store = CredentialStore::with_session_id(dir.path(), "s1".to_string());

        let mut file = File::create(dir.path().join("s1.json")).unwrap();
        writeln!(file, "not json").unwrap();

        assert!(store.load().is_empty());
        assert!(store.load_user().is_none());
    }

    #[test]
    /// Saving tokens must not discard a previously stored user record.
    fn token_save_preserves_user() {
        let dir = tempdir().unwrap();
        let store = CredentialStore::new(dir.path());

        store.save_user(&user("a")).unwrap();
        store
            .save(&CredentialPair {
                access_token: Some("access".to_string()),
                refresh_token: Some("refresh".to_string()),
            })
            .unwrap();

        assert_eq!(store.load_user().unwrap().id, "a");
    }

    #[test]
    /// The session record carries the id, user, and creation time.
    fn session_record_is_built_from_stored_state() {
        let dir = tempdir().unwrap();
        let store = CredentialStore::new(dir.path());

        assert!(store.session().is_none());

        store.save_user(&user("a")).unwrap();
        let session = store.session().unwrap();
        assert_eq!(session.session_id, store.session_id());
        assert_eq!(session.user.id, "a");
    }
}
