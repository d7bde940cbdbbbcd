use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Append-only JSON Lines log of portal events for one session of the
/// process. One file per launch under the audit directory.
pub struct Audit {
    pub path: PathBuf,
    session_id: String,
    file: File,
}

#[derive(Serialize)]
struct Event<'a> {
    ts: DateTime<Utc>,
    session_id: &'a str,
    #[serde(rename = "type")]
    event_type: &'a str,
    #[serde(flatten)]
    data: serde_json::Value,
}

impl Audit {
    pub fn new(path: &Path, session_id: &str) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let file = OpenOptions::new().create(true).append(true).open(path)?;

        Ok(Self {
            path: path.to_path_buf(),
            session_id: session_id.to_string(),
            file,
        })
    }

    pub fn log(&mut self, event_type: &str, data: serde_json::Value) -> Result<()> {
        let event = Event {
            ts: Utc::now(),
            session_id: &self.session_id,
            event_type,
            data,
        };
        let line = serde_json::to_string(&event)?;
        writeln!(self.file, "{}", line)?;
        self.file.flush()?;
        Ok(())
    }

    pub fn login_ok(&mut self, username: &str, role: &str) -> Result<()> {
        self.log(
            "login_ok",
            serde_json::json!({ "username": username, "role": role }),
        )
    }

    pub fn login_failed(&mut self, username: &str, reason: &str) -> Result<()> {
        self.log(
            "login_failed",
            serde_json::json!({ "username": username, "reason": reason }),
        )
    }

    pub fn logout(&mut self, username: &str) -> Result<()> {
        self.log("logout", serde_json::json!({ "username": username }))
    }

    /// A corrupt stored session record was dropped during a read.
    pub fn session_cleared(&mut self) -> Result<()> {
        self.log("session_cleared", serde_json::json!({}))
    }

    /// Log a guard decision for a navigation.
    pub fn access(
        &mut self,
        route: &str,
        decision: &str,
        required_role: Option<&str>,
    ) -> Result<()> {
        self.log(
            "access",
            serde_json::json!({
                "route": route,
                "decision": decision,
                "required_role": required_role,
            }),
        )
    }

    pub fn user_created(&mut self, id: &str, username: &str, duplicate: bool) -> Result<()> {
        self.log(
            "user_created",
            serde_json::json!({
                "id": id,
                "username": username,
                "duplicate_username": duplicate,
            }),
        )
    }

    pub fn user_updated(&mut self, id: &str, username: &str) -> Result<()> {
        self.log(
            "user_updated",
            serde_json::json!({ "id": id, "username": username }),
        )
    }

    pub fn user_deleted(&mut self, id: &str) -> Result<()> {
        self.log("user_deleted", serde_json::json!({ "id": id }))
    }

    pub fn note_saved(&mut self, date_key: &str, stored: bool) -> Result<()> {
        self.log(
            "note_saved",
            serde_json::json!({ "date": date_key, "stored": stored }),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_events_are_json_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("audit").join("s1.jsonl");
        let mut audit = Audit::new(&path, "s1").unwrap();

        audit.login_ok("admin", "admin").unwrap();
        audit.access("/admin/dashboard", "granted", Some("admin")).unwrap();
        audit.logout("admin").unwrap();

        let raw = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = raw.lines().collect();
        assert_eq!(lines.len(), 3);

        let first: serde_json::Value = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(first["type"], "login_ok");
        assert_eq!(first["session_id"], "s1");
        assert_eq!(first["username"], "admin");
        assert!(first["ts"].is_string());

        let second: serde_json::Value = serde_json::from_str(lines[1]).unwrap();
        assert_eq!(second["decision"], "granted");
        assert_eq!(second["required_role"], "admin");
    }
}
