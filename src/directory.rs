//! The managed user directory and the admin CRUD over it.
//!
//! Entries are persisted as one ordered JSON array under the `app_users`
//! key, written back whole after every mutation. Field names keep the
//! camelCase shape of existing `app_users` documents. Passwords are stored
//! in plaintext, a local-demo concession and not a pattern to copy.

use crate::config::ValidationError;
use crate::profile::{ROLE_ADMIN, ROLE_USER};
use crate::storage::{Storage, USERS_KEY};
use anyhow::Result;
use serde::{Deserialize, Serialize};

/// One managed user's administrative record, including credential.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserEntry {
    pub id: String,
    pub username: String,
    pub full_name: String,
    #[serde(default)]
    pub email: String,
    pub role: String,
    pub position: String,
    pub department: String,
    pub phone_number: String,
    pub password: String,
}

/// Form payload for create and edit. On edit, a blank password means
/// "keep the stored password"; the admin is not forced to re-enter it.
#[derive(Debug, Clone, Default)]
pub struct UserForm {
    pub username: String,
    pub full_name: String,
    pub email: String,
    pub role: String,
    pub position: String,
    pub department: String,
    pub phone_number: String,
    pub password: String,
}

impl UserForm {
    /// Pre-fill an edit form from an existing entry, with the password
    /// cleared so an untouched field preserves the stored one.
    pub fn from_entry(entry: &UserEntry) -> Self {
        Self {
            username: entry.username.clone(),
            full_name: entry.full_name.clone(),
            email: entry.email.clone(),
            role: entry.role.clone(),
            position: entry.position.clone(),
            department: entry.department.clone(),
            phone_number: entry.phone_number.clone(),
            password: String::new(),
        }
    }

    /// Validate required fields, collecting every problem rather than
    /// stopping at the first. Email is optional; password is required only
    /// when creating.
    pub fn validate(&self, editing: bool) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();

        let required = [
            ("username", &self.username),
            ("fullName", &self.full_name),
            ("position", &self.position),
            ("department", &self.department),
            ("phoneNumber", &self.phone_number),
        ];
        for (field, value) in required {
            if value.trim().is_empty() {
                errors.push(ValidationError {
                    field: field.to_string(),
                    message: "Required field is empty".to_string(),
                });
            }
        }

        if !editing && self.password.is_empty() {
            errors.push(ValidationError {
                field: "password".to_string(),
                message: "Required when creating a user".to_string(),
            });
        }

        if self.role != ROLE_ADMIN && self.role != ROLE_USER {
            errors.push(ValidationError {
                field: "role".to_string(),
                message: format!("Must be '{}' or '{}', got '{}'", ROLE_ADMIN, ROLE_USER, self.role),
            });
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

pub struct UserDirectory<S: Storage> {
    storage: S,
}

impl<S: Storage> UserDirectory<S> {
    pub fn new(storage: S) -> Self {
        Self { storage }
    }

    /// Load the full directory. An unreadable document resets to an empty
    /// collection rather than failing the caller.
    pub fn load(&mut self) -> Result<Vec<UserEntry>> {
        match self.storage.get(USERS_KEY)? {
            None => Ok(Vec::new()),
            Some(raw) => Ok(serde_json::from_str(&raw).unwrap_or_default()),
        }
    }

    fn save(&mut self, users: &[UserEntry]) -> Result<()> {
        let raw = serde_json::to_string(users)?;
        self.storage.set(USERS_KEY, &raw)
    }

    /// Append a new entry under a fresh immutable id. The form must already
    /// be validated.
    pub fn create(&mut self, form: &UserForm) -> Result<UserEntry> {
        let mut users = self.load()?;
        let entry = UserEntry {
            id: uuid::Uuid::new_v4().to_string(),
            username: form.username.clone(),
            full_name: form.full_name.clone(),
            email: form.email.clone(),
            role: form.role.clone(),
            position: form.position.clone(),
            department: form.department.clone(),
            phone_number: form.phone_number.clone(),
            password: form.password.clone(),
        };
        users.push(entry.clone());
        self.save(&users)?;
        Ok(entry)
    }

    /// Merge submitted fields into the entry matched by id. A blank
    /// password keeps the stored one; everything else is overwritten.
    /// Returns `None` when no entry carries the id.
    pub fn update(&mut self, id: &str, form: &UserForm) -> Result<Option<UserEntry>> {
        let mut users = self.load()?;
        let Some(slot) = users.iter_mut().find(|u| u.id == id) else {
            return Ok(None);
        };

        let password = if form.password.is_empty() {
            slot.password.clone()
        } else {
            form.password.clone()
        };
        *slot = UserEntry {
            id: id.to_string(),
            username: form.username.clone(),
            full_name: form.full_name.clone(),
            email: form.email.clone(),
            role: form.role.clone(),
            position: form.position.clone(),
            department: form.department.clone(),
            phone_number: form.phone_number.clone(),
            password,
        };
        let updated = slot.clone();
        self.save(&users)?;
        Ok(Some(updated))
    }

    /// Remove the entry matched by id, preserving the order of the rest.
    /// Returns whether anything was removed.
    pub fn delete(&mut self, id: &str) -> Result<bool> {
        let mut users = self.load()?;
        let before = users.len();
        users.retain(|u| u.id != id);
        if users.len() == before {
            return Ok(false);
        }
        self.save(&users)?;
        Ok(true)
    }
}

/// The entry showcased on the user dashboard: the first `user`-role entry,
/// else the first entry. The dashboard subject is picked from the
/// directory, not from the logged-in session.
pub fn primary_user(users: &[UserEntry]) -> Option<&UserEntry> {
    users.iter().find(|u| u.role == ROLE_USER).or_else(|| users.first())
}
