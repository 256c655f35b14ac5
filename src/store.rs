use anyhow::{Context, Result};
use rusqlite::{params, Connection, OptionalExtension};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::path::{Path, PathBuf};

use crate::models::Session;

/// Fixed key the wizard session lives under.
pub const SESSION_KEY: &str = "hospitour_app_state_v1";

/// Durable local key-value store backed by SQLite.
pub struct Store {
    conn: Connection,
    path: PathBuf,
}

impl Store {
    pub fn open(data_dir: Option<&Path>) -> Result<Self> {
        let dir = match data_dir {
            Some(dir) => dir.to_path_buf(),
            None => default_data_dir(),
        };
        std::fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create data directory: {}", dir.display()))?;
        let path = dir.join("hospitour.db");
        let conn = Connection::open(&path)
            .with_context(|| format!("Failed to open store at {}", path.display()))?;
        let store = Self { conn, path };
        store.init()?;
        Ok(store)
    }

    #[cfg(test)]
    pub fn open_in_memory() -> Result<Self> {
        let store = Self {
            conn: Connection::open_in_memory()?,
            path: PathBuf::from(":memory:"),
        };
        store.init()?;
        Ok(store)
    }

    pub fn path(&self) -> &PathBuf {
        &self.path
    }

    fn init(&self) -> Result<()> {
        self.conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS kv (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL,
                updated_at TEXT NOT NULL DEFAULT (datetime('now'))
            );
            "#,
        )?;
        Ok(())
    }

    // --- Raw key-value operations ---

    pub fn get(&self, key: &str) -> Result<Option<String>> {
        self.conn
            .query_row("SELECT value FROM kv WHERE key = ?1", [key], |row| row.get(0))
            .optional()
            .context("Failed to read from store")
    }

    pub fn set(&self, key: &str, value: &str) -> Result<()> {
        self.conn.execute(
            "INSERT INTO kv (key, value, updated_at) VALUES (?1, ?2, datetime('now'))
             ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
            params![key, value],
        )?;
        Ok(())
    }

    pub fn remove(&self, key: &str) -> Result<()> {
        self.conn.execute("DELETE FROM kv WHERE key = ?1", [key])?;
        Ok(())
    }

    // --- Session operations ---

    /// Overwrite the stored session with a full snapshot.
    pub fn save_session(&self, session: &Session) -> Result<()> {
        let json = serde_json::to_string(session).context("Failed to serialize session")?;
        self.set(SESSION_KEY, &json)
    }

    /// Restore the saved session. Malformed data is logged and treated as
    /// "nothing saved"; it never fails startup.
    pub fn load_session(&self) -> Option<Session> {
        let raw = match self.get(SESSION_KEY) {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(e) => {
                tracing::warn!("Failed to read saved session: {:#}", e);
                return None;
            }
        };
        match parse_session(&raw) {
            Ok(session) => Some(session),
            Err(e) => {
                tracing::warn!("Failed to load save state: {:#}", e);
                None
            }
        }
    }

    pub fn clear_session(&self) -> Result<()> {
        self.remove(SESSION_KEY)
    }
}

pub fn default_data_dir() -> PathBuf {
    if let Some(proj_dirs) = directories::ProjectDirs::from("", "", "hospitour") {
        proj_dirs.data_dir().to_path_buf()
    } else {
        PathBuf::from(".")
    }
}

/// Rebuild a session from a stored payload. Each top-level field is restored
/// on its own, so an older or partial payload still yields a usable session.
pub fn parse_session(raw: &str) -> Result<Session> {
    let value: Value = serde_json::from_str(raw).context("Stored session is not valid JSON")?;
    let Value::Object(fields) = value else {
        anyhow::bail!("Stored session is not a JSON object");
    };

    let mut session = Session::default();
    restore(&fields, "profile", &mut session.profile);
    restore(&fields, "digitalAudit", &mut session.digital_audit);
    restore(&fields, "softSkills", &mut session.soft_skills);
    restore(&fields, "swot", &mut session.swot);
    restore(&fields, "pdpResult", &mut session.pdp_result);
    restore(&fields, "completedSteps", &mut session.completed_steps);

    // Set semantics, in first-seen order.
    let mut seen = Vec::with_capacity(session.completed_steps.len());
    for step in session.completed_steps.drain(..) {
        if !seen.contains(&step) {
            seen.push(step);
        }
    }
    session.completed_steps = seen;

    Ok(session)
}

fn restore<T: DeserializeOwned>(fields: &serde_json::Map<String, Value>, key: &str, slot: &mut T) {
    let Some(value) = fields.get(key) else { return };
    if value.is_null() {
        return;
    }
    match serde_json::from_value::<T>(value.clone()) {
        Ok(decoded) => *slot = decoded,
        Err(e) => tracing::warn!("Ignoring stored '{}': {}", key, e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{
        CustomSkill, GoalType, JiscLevel, PdpResult, SkillCategory, SmartGoal, Step,
    };

    fn populated_session() -> Session {
        let mut session = Session::default();
        session.profile.name = "Alex Morgan".to_string();
        session.profile.career_reason = "I want to lead a team".to_string();
        session.digital_audit.digital_identity = JiscLevel::Proficient;
        session.soft_skills.delegation = 5;
        session.soft_skills.custom.push(CustomSkill {
            id: "revenue_management".to_string(),
            label: "Revenue Management".to_string(),
            desc: "Pricing rooms to demand".to_string(),
            score: 4,
            category: Some(SkillCategory::Digital),
        });
        session.swot.strengths = "- Friendly\n- Calm under pressure".to_string();
        let mut goal = SmartGoal::placeholder("k3j9x0a".to_string());
        goal.goal_type = GoalType::Digital;
        session.pdp_result = Some(PdpResult {
            introduction: "Your plan".to_string(),
            goals: vec![goal],
        });
        session.completed_steps = vec![Step::Profile, Step::Digital, Step::SoftSkills, Step::Swot, Step::Results];
        session
    }

    #[test]
    fn test_session_round_trip() {
        let store = Store::open_in_memory().unwrap();
        let session = populated_session();

        store.save_session(&session).unwrap();
        let loaded = store.load_session().unwrap();

        assert_eq!(loaded.profile, session.profile);
        assert_eq!(loaded.digital_audit, session.digital_audit);
        assert_eq!(loaded.soft_skills, session.soft_skills);
        assert_eq!(loaded.swot, session.swot);
        assert_eq!(loaded.pdp_result, session.pdp_result);
        assert_eq!(loaded.completed_steps, session.completed_steps);
    }

    #[test]
    fn test_save_overwrites_previous_snapshot() {
        let store = Store::open_in_memory().unwrap();
        store.save_session(&populated_session()).unwrap();
        store.save_session(&Session::default()).unwrap();

        assert_eq!(store.load_session().unwrap(), Session::default());
    }

    #[test]
    fn test_load_without_saved_session() {
        let store = Store::open_in_memory().unwrap();
        assert!(store.load_session().is_none());
    }

    #[test]
    fn test_malformed_payload_is_treated_as_absent() {
        let store = Store::open_in_memory().unwrap();
        store.set(SESSION_KEY, "{not json").unwrap();
        assert!(store.load_session().is_none());

        store.set(SESSION_KEY, "[1, 2, 3]").unwrap();
        assert!(store.load_session().is_none());
    }

    #[test]
    fn test_partial_payload_restores_present_fields() {
        let raw = r#"{
            "profile": {"name": "Jo", "mbti": "INTJ-A (Architect)", "leadershipStyle": "Coaching",
                        "careerGoal": "Events Director", "careerReason": "Variety"},
            "softSkills": {"organisation": "high"},
            "completedSteps": ["profile", "digital", "digital"]
        }"#;
        let session = parse_session(raw).unwrap();

        assert_eq!(session.profile.name, "Jo");
        assert_eq!(session.profile.leadership_style, "Coaching");
        // Undecodable field keeps its default.
        assert_eq!(session.soft_skills, Default::default());
        assert_eq!(session.digital_audit, Default::default());
        assert!(session.pdp_result.is_none());
        assert_eq!(session.completed_steps, vec![Step::Profile, Step::Digital]);
    }

    #[test]
    fn test_clear_session() {
        let store = Store::open_in_memory().unwrap();
        store.save_session(&populated_session()).unwrap();
        store.clear_session().unwrap();
        assert!(store.load_session().is_none());
    }

    #[test]
    fn test_open_on_disk_persists_between_handles() {
        let dir = tempfile::TempDir::new().unwrap();
        {
            let store = Store::open(Some(dir.path())).unwrap();
            store.save_session(&populated_session()).unwrap();
        }
        let store = Store::open(Some(dir.path())).unwrap();
        assert_eq!(store.load_session().unwrap().profile.name, "Alex Morgan");
        assert!(store.path().ends_with("hospitour.db"));
    }
}
