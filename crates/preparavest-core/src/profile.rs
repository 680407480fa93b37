//! The persisted "current user" record.
//!
//! The record is a single versioned JSON document, replaced atomically on
//! save. Reading is strict: a record with an unknown version, a missing or
//! empty field, or unparseable content is reported as absent rather than
//! partially trusted.

use std::fmt;
use std::io::Write;
use std::path::Path;
use std::str::FromStr;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Version written by [`save_profile`] and accepted by [`load_profile`].
pub const PROFILE_VERSION: u32 = 1;

/// Closed set of user roles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    #[default]
    Standard,
    Admin,
}

impl UserRole {
    /// Map a role as encoded by the backend into a `UserRole`.
    ///
    /// `"admin"`, `"2"` and `2` mean admin; anything else, including a missing
    /// value, is a standard user.
    pub fn normalize(raw: &Value) -> UserRole {
        match raw {
            Value::String(s) => match s.trim().to_lowercase().as_str() {
                "admin" | "2" => UserRole::Admin,
                _ => UserRole::Standard,
            },
            Value::Number(n) if n.as_u64() == Some(2) => UserRole::Admin,
            _ => UserRole::Standard,
        }
    }
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UserRole::Standard => write!(f, "standard"),
            UserRole::Admin => write!(f, "admin"),
        }
    }
}

/// Strict parsing for user input. Backend encodings go through
/// [`UserRole::normalize`] instead.
impl FromStr for UserRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "standard" => Ok(UserRole::Standard),
            "admin" => Ok(UserRole::Admin),
            other => Err(format!("unknown role: {other} (expected standard or admin)")),
        }
    }
}

/// The user taking quizzes. Passed explicitly to whatever needs it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: u64,
    pub name: String,
    pub email: String,
    pub role: UserRole,
}

impl UserProfile {
    pub fn is_admin(&self) -> bool {
        self.role == UserRole::Admin
    }

    fn validate(&self) -> Result<(), String> {
        if self.id == 0 {
            return Err("id must be positive".into());
        }
        if self.name.trim().is_empty() {
            return Err("name is empty".into());
        }
        if self.email.trim().is_empty() {
            return Err("email is empty".into());
        }
        Ok(())
    }
}

#[derive(Serialize)]
struct ProfileRecord<'a> {
    version: u32,
    user: &'a UserProfile,
}

#[derive(Deserialize)]
struct RawRecord {
    version: Option<u32>,
    user: Option<RawUser>,
}

#[derive(Deserialize)]
struct RawUser {
    id: Option<u64>,
    name: Option<String>,
    email: Option<String>,
    #[serde(default)]
    role: Value,
}

/// Write `profile` to `path`, replacing any existing record atomically.
pub fn save_profile(path: &Path, profile: &UserProfile) -> Result<()> {
    profile
        .validate()
        .map_err(|reason| anyhow::anyhow!("refusing to save invalid profile: {reason}"))?;

    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(dir)
        .with_context(|| format!("failed to create {}", dir.display()))?;

    let record = ProfileRecord {
        version: PROFILE_VERSION,
        user: profile,
    };
    let json = serde_json::to_vec_pretty(&record).context("failed to serialize profile")?;

    let mut tmp = tempfile::NamedTempFile::new_in(dir)
        .with_context(|| format!("failed to create temp file in {}", dir.display()))?;
    tmp.write_all(&json)?;
    tmp.as_file().sync_all()?;
    tmp.persist(path)
        .with_context(|| format!("failed to write profile to {}", path.display()))?;
    Ok(())
}

/// Read the profile at `path`.
///
/// Returns `Ok(None)` if the file does not exist or holds an unusable record.
/// Only I/O failures other than "not found" are errors.
pub fn load_profile(path: &Path) -> Result<Option<UserProfile>> {
    let content = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => {
            return Err(e).with_context(|| format!("failed to read profile {}", path.display()))
        }
    };

    match parse_record(&content) {
        Ok(profile) => Ok(Some(profile)),
        Err(reason) => {
            tracing::warn!("ignoring profile {}: {reason}", path.display());
            Ok(None)
        }
    }
}

fn parse_record(content: &str) -> Result<UserProfile, String> {
    let raw: RawRecord = serde_json::from_str(content).map_err(|e| format!("corrupt record: {e}"))?;

    match raw.version {
        Some(PROFILE_VERSION) => {}
        Some(v) => return Err(format!("unsupported version {v}")),
        None => return Err("missing version".into()),
    }

    let user = raw.user.ok_or("missing user")?;
    let profile = UserProfile {
        id: user.id.ok_or("missing id")?,
        name: user.name.ok_or("missing name")?,
        email: user.email.ok_or("missing email")?,
        role: UserRole::normalize(&user.role),
    };
    profile.validate()?;
    Ok(profile)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn ana() -> UserProfile {
        UserProfile {
            id: 7,
            name: "Ana".into(),
            email: "ana@example.com".into(),
            role: UserRole::Standard,
        }
    }

    #[test]
    fn role_normalization() {
        assert_eq!(UserRole::normalize(&json!("admin")), UserRole::Admin);
        assert_eq!(UserRole::normalize(&json!("ADMIN")), UserRole::Admin);
        assert_eq!(UserRole::normalize(&json!("2")), UserRole::Admin);
        assert_eq!(UserRole::normalize(&json!(2)), UserRole::Admin);
        assert_eq!(UserRole::normalize(&json!("1")), UserRole::Standard);
        assert_eq!(UserRole::normalize(&json!(1)), UserRole::Standard);
        assert_eq!(UserRole::normalize(&json!("user")), UserRole::Standard);
        assert_eq!(UserRole::normalize(&Value::Null), UserRole::Standard);
    }

    #[test]
    fn role_parsing_is_strict() {
        assert_eq!("admin".parse::<UserRole>().unwrap(), UserRole::Admin);
        assert_eq!(" Standard ".parse::<UserRole>().unwrap(), UserRole::Standard);
        assert!("adimn".parse::<UserRole>().unwrap_err().contains("adimn"));
        assert!("2".parse::<UserRole>().is_err());
    }

    #[test]
    fn save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("profile.json");
        let mut profile = ana();
        profile.role = UserRole::Admin;

        save_profile(&path, &profile).unwrap();
        let loaded = load_profile(&path).unwrap().unwrap();
        assert_eq!(loaded, profile);
        assert!(loaded.is_admin());

        let raw: Value = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(raw["version"], json!(PROFILE_VERSION));
        assert_eq!(raw["user"]["role"], json!("admin"));
    }

    #[test]
    fn missing_file_is_absent() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load_profile(&dir.path().join("none.json")).unwrap().is_none());
    }

    #[test]
    fn corrupt_or_partial_records_are_absent() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("profile.json");
        let cases = [
            "{not json".to_string(),
            json!({"user": {"id": 1, "name": "A", "email": "a@x"}}).to_string(),
            json!({"version": 2, "user": {"id": 1, "name": "A", "email": "a@x"}}).to_string(),
            json!({"version": 1, "user": {"id": 1, "name": "A"}}).to_string(),
            json!({"version": 1, "user": {"id": 0, "name": "A", "email": "a@x"}}).to_string(),
            json!({"version": 1, "user": {"id": 1, "name": " ", "email": "a@x"}}).to_string(),
            json!({"version": 1}).to_string(),
        ];
        for content in cases {
            std::fs::write(&path, &content).unwrap();
            assert!(load_profile(&path).unwrap().is_none(), "accepted {content}");
        }
    }

    #[test]
    fn legacy_numeric_role_is_normalized_on_read() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("profile.json");
        let content = json!({
            "version": 1,
            "user": {"id": 3, "name": "Bea", "email": "bea@x", "role": 2}
        });
        std::fs::write(&path, content.to_string()).unwrap();
        assert_eq!(load_profile(&path).unwrap().unwrap().role, UserRole::Admin);
    }

    #[test]
    fn invalid_profile_is_not_saved() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("profile.json");
        let mut profile = ana();
        profile.name.clear();
        assert!(save_profile(&path, &profile).is_err());
        assert!(!path.exists());
    }
}
