//! Display profile derived from the stored session.
//!
//! Enrichment is a static lookup by username, deliberately independent of
//! the user directory: the role used for authorization is assigned by the
//! login resolver, while the role shown here comes from this table and can
//! disagree with whatever role the directory stores for the same username.

use crate::session::{LoadedSession, SessionStore};
use crate::storage::Storage;
use anyhow::Result;

pub const ROLE_ADMIN: &str = "admin";
pub const ROLE_USER: &str = "user";

/// Username granted the fixed administrator profile.
pub const ADMIN_USERNAME: &str = "admin";

/// Second reserved username with a fixed sample profile.
pub const SAMPLE_USERNAME: &str = "user_a";

/// In-memory view of a session, recomputed on every load.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Profile {
    pub token: String,
    pub name: String,
    pub id: String,
    pub role: String,
    pub title: String,
    pub department: String,
    pub phone: String,
    pub email: String,
}

/// Build the display profile for a username.
pub fn profile_for(username: &str, token: &str) -> Profile {
    match username {
        ADMIN_USERNAME => Profile {
            token: token.to_string(),
            name: "Administrator Utama".to_string(),
            id: "00001".to_string(),
            role: ROLE_ADMIN.to_string(),
            title: "Pimpinan Proyek".to_string(),
            department: "Manajemen".to_string(),
            phone: "+62 800-0000-0000".to_string(),
            email: "admin@toolbox.com".to_string(),
        },
        SAMPLE_USERNAME => Profile {
            token: token.to_string(),
            name: "Si A".to_string(),
            id: "12345".to_string(),
            role: ROLE_USER.to_string(),
            title: "Spesialis Proyek".to_string(),
            department: "IT Solutions".to_string(),
            phone: "+62 811-2345-6789".to_string(),
            email: "si.a@toolbox.com".to_string(),
        },
        _ => Profile {
            token: token.to_string(),
            name: "Pengguna Umum".to_string(),
            id: "00000".to_string(),
            role: ROLE_USER.to_string(),
            title: "Staff".to_string(),
            department: "Umum".to_string(),
            phone: "N/A".to_string(),
            email: format!("{}@toolbox.com", username),
        },
    }
}

/// Outcome of deriving a profile from the session store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Derived {
    pub profile: Option<Profile>,
    /// A corrupt stored record was found and cleared during this read.
    pub cleared_corrupt: bool,
}

/// Derive the in-memory profile from the persisted session, if any.
/// A corrupt record has already been cleared by the time this returns.
pub fn derive<S: Storage>(sessions: &mut SessionStore<S>) -> Result<Derived> {
    Ok(match sessions.load()? {
        LoadedSession::Present(record) => Derived {
            profile: Some(profile_for(&record.username, &record.token)),
            cleared_corrupt: false,
        },
        LoadedSession::Absent => Derived {
            profile: None,
            cleared_corrupt: false,
        },
        LoadedSession::Corrupt => Derived {
            profile: None,
            cleared_corrupt: true,
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::SessionRecord;
    use crate::storage::testing::MemStorage;
    use crate::storage::SESSION_KEY;

    #[test]
    fn test_admin_profile() {
        let profile = profile_for("admin", "valid_token_7");
        assert_eq!(profile.role, ROLE_ADMIN);
        assert_eq!(profile.name, "Administrator Utama");
        assert_eq!(profile.id, "00001");
        assert_eq!(profile.email, "admin@toolbox.com");
        assert_eq!(profile.token, "valid_token_7");
    }

    #[test]
    fn test_sample_profile() {
        let profile = profile_for("user_a", "t");
        assert_eq!(profile.role, ROLE_USER);
        assert_eq!(profile.name, "Si A");
        assert_eq!(profile.department, "IT Solutions");
        assert_eq!(profile.email, "si.a@toolbox.com");
    }

    #[test]
    fn test_everyone_else_is_a_generic_user() {
        for username in ["budi", "siti", "Admin", "ADMIN", "user_b"] {
            let profile = profile_for(username, "t");
            assert_eq!(profile.role, ROLE_USER, "username {}", username);
            assert_eq!(profile.email, format!("{}@toolbox.com", username));
            assert_eq!(profile.name, "Pengguna Umum");
        }
    }

    #[test]
    fn test_derive_without_session() {
        let mut sessions = SessionStore::new(MemStorage::new());
        let derived = derive(&mut sessions).unwrap();
        assert_eq!(derived.profile, None);
        assert!(!derived.cleared_corrupt);
    }

    #[test]
    fn test_derive_from_stored_record() {
        let mut sessions = SessionStore::new(MemStorage::new());
        sessions
            .save(&SessionRecord {
                username: "budi".to_string(),
                token: "valid_token_9".to_string(),
            })
            .unwrap();
        let profile = derive(&mut sessions).unwrap().profile.unwrap();
        assert_eq!(profile.email, "budi@toolbox.com");
        assert_eq!(profile.token, "valid_token_9");
    }

    #[test]
    fn test_derive_clears_corrupt_record() {
        let storage = MemStorage::with(SESSION_KEY, "{broken");
        let mut sessions = SessionStore::new(storage);
        let derived = derive(&mut sessions).unwrap();
        assert_eq!(derived.profile, None);
        assert!(derived.cleared_corrupt);

        // The record is gone; the next derivation is a plain logged-out read.
        let derived = derive(&mut sessions).unwrap();
        assert_eq!(derived.profile, None);
        assert!(!derived.cleared_corrupt);
    }
}
