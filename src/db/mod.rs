//! Database module - SQLite storage for calibration profiles and sessions

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::coach::{
    CalibrationProfile, CoachState, DrillFeedback, Mode, ProblemZone, ProblemZoneSummary,
    SafetyFlag, SessionProgress,
};
use crate::drills::BodyPart;

/// Active session as persisted between CLI calls
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredSession {
    pub progress: SessionProgress,
    pub flag: Option<SafetyFlag>,
    pub focus: Option<ProblemZoneSummary>,
    pub started_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl StoredSession {
    pub fn new(
        state: CoachState,
        flag: Option<SafetyFlag>,
        focus: Option<ProblemZoneSummary>,
    ) -> Self {
        let now = Utc::now();
        Self {
            progress: SessionProgress::new(state),
            flag,
            focus,
            started_at: now,
            updated_at: now,
        }
    }

    pub fn body_part(&self) -> BodyPart {
        self.progress.state.body_part
    }
}

/// One applied piece of drill feedback
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedbackRecord {
    pub id: Option<i64>,
    pub date: DateTime<Utc>,
    pub body_part: BodyPart,
    pub feedback: DrillFeedback,
    /// Session mode after the feedback was applied
    pub mode_after: Mode,
}

/// Load/save capability the coaching flow is driven through
pub trait Store {
    /// Replace the profile of a body part
    fn save_profile(&self, profile: &CalibrationProfile) -> Result<()>;
    fn load_profile(&self, body_part: BodyPart) -> Result<Option<CalibrationProfile>>;
    /// Replace the active session of a body part
    fn save_session(&self, session: &StoredSession) -> Result<()>;
    fn load_session(&self, body_part: BodyPart) -> Result<Option<StoredSession>>;
    fn log_feedback(&self, record: &FeedbackRecord) -> Result<i64>;
    /// Most recent first
    fn feedback_history(&self, body_part: BodyPart) -> Result<Vec<FeedbackRecord>>;
}

/// Database wrapper
pub struct Database {
    conn: Connection,
}

fn parse_date(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s)
        .map(|d| d.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now())
}

fn mode_from_str(s: &str) -> Result<Mode> {
    serde_json::from_value(serde_json::Value::String(s.to_string()))
        .with_context(|| format!("unknown mode '{}'", s))
}

impl Database {
    /// Open or create database
    pub fn open(path: &str) -> Result<Self> {
        let conn = Connection::open(path).with_context(|| format!("opening database {}", path))?;
        let db = Self { conn };
        db.init_schema()?;
        Ok(db)
    }

    pub fn open_in_memory() -> Result<Self> {
        let db = Self { conn: Connection::open_in_memory()? };
        db.init_schema()?;
        Ok(db)
    }

    /// Initialize database schema
    fn init_schema(&self) -> Result<()> {
        self.conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS calibration_profiles (
                body_part TEXT PRIMARY KEY,
                zones TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );
            CREATE TABLE IF NOT EXISTS sessions (
                body_part TEXT PRIMARY KEY,
                state TEXT NOT NULL,
                position INTEGER NOT NULL,
                flag TEXT,
                focus TEXT,
                started_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );
            CREATE TABLE IF NOT EXISTS feedback_log (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                date TEXT NOT NULL,
                body_part TEXT NOT NULL,
                drill_id TEXT NOT NULL,
                pain INTEGER NOT NULL,
                felt_stable INTEGER NOT NULL,
                notes TEXT,
                mode_after TEXT NOT NULL
            );",
        )?;
        Ok(())
    }
}

impl Store for Database {
    fn save_profile(&self, profile: &CalibrationProfile) -> Result<()> {
        let zones = serde_json::to_string(&profile.problem_zones)?;
        self.conn.execute(
            "INSERT OR REPLACE INTO calibration_profiles (body_part, zones, updated_at) VALUES (?1, ?2, ?3)",
            params![profile.body_part.as_str(), zones, Utc::now().to_rfc3339()],
        )?;
        debug!(body_part = %profile.body_part, zones = profile.problem_zones.len(), "Saved calibration profile");
        Ok(())
    }

    fn load_profile(&self, body_part: BodyPart) -> Result<Option<CalibrationProfile>> {
        let zones: Option<String> = self
            .conn
            .query_row(
                "SELECT zones FROM calibration_profiles WHERE body_part = ?1",
                params![body_part.as_str()],
                |row| row.get(0),
            )
            .optional()?;

        zones
            .map(|json| {
                let problem_zones: Vec<ProblemZone> = serde_json::from_str(&json)
                    .with_context(|| format!("corrupt calibration profile for {}", body_part))?;
                Ok::<_, anyhow::Error>(CalibrationProfile::new(body_part, problem_zones))
            })
            .transpose()
    }

    fn save_session(&self, session: &StoredSession) -> Result<()> {
        let state = serde_json::to_string(&session.progress.state)?;
        let flag = session.flag.as_ref().map(serde_json::to_string).transpose()?;
        let focus = session.focus.as_ref().map(serde_json::to_string).transpose()?;
        self.conn.execute(
            "INSERT OR REPLACE INTO sessions (body_part, state, position, flag, focus, started_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                session.body_part().as_str(),
                state,
                session.progress.position as i64,
                flag,
                focus,
                session.started_at.to_rfc3339(),
                session.updated_at.to_rfc3339(),
            ],
        )?;
        debug!(
            body_part = %session.body_part(),
            mode = %session.progress.state.mode,
            position = session.progress.position,
            "Saved session"
        );
        Ok(())
    }

    fn load_session(&self, body_part: BodyPart) -> Result<Option<StoredSession>> {
        type Row = (String, i64, Option<String>, Option<String>, String, String);
        let row: Option<Row> = self
            .conn
            .query_row(
                "SELECT state, position, flag, focus, started_at, updated_at FROM sessions WHERE body_part = ?1",
                params![body_part.as_str()],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?, row.get(4)?, row.get(5)?)),
            )
            .optional()?;

        let Some((state, position, flag, focus, started_at, updated_at)) = row else {
            return Ok(None);
        };

        let state: CoachState = serde_json::from_str(&state)
            .with_context(|| format!("corrupt session state for {}", body_part))?;
        let position = usize::try_from(position)
            .with_context(|| format!("negative session position for {}", body_part))?;
        let flag = flag.map(|f| serde_json::from_str(&f)).transpose()?;
        let focus = focus.map(|f| serde_json::from_str(&f)).transpose()?;

        Ok(Some(StoredSession {
            progress: SessionProgress { state, position },
            flag,
            focus,
            started_at: parse_date(&started_at),
            updated_at: parse_date(&updated_at),
        }))
    }

    fn log_feedback(&self, record: &FeedbackRecord) -> Result<i64> {
        self.conn.execute(
            "INSERT INTO feedback_log (date, body_part, drill_id, pain, felt_stable, notes, mode_after)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                record.date.to_rfc3339(),
                record.body_part.as_str(),
                record.feedback.drill_id,
                record.feedback.pain,
                record.feedback.felt_stable,
                record.feedback.notes,
                record.mode_after.as_str(),
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    fn feedback_history(&self, body_part: BodyPart) -> Result<Vec<FeedbackRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, date, drill_id, pain, felt_stable, notes, mode_after FROM feedback_log
             WHERE body_part = ?1 ORDER BY id DESC",
        )?;

        let rows = stmt
            .query_map(params![body_part.as_str()], |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, u8>(3)?,
                    row.get::<_, bool>(4)?,
                    row.get::<_, Option<String>>(5)?,
                    row.get::<_, String>(6)?,
                ))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        rows.into_iter()
            .map(|(id, date, drill_id, pain, felt_stable, notes, mode_after)| {
                Ok::<_, anyhow::Error>(FeedbackRecord {
                    id: Some(id),
                    date: parse_date(&date),
                    body_part,
                    feedback: DrillFeedback { drill_id, pain, felt_stable, notes },
                    mode_after: mode_from_str(&mode_after)?,
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coach::ProblemZone;

    fn knee_profile() -> CalibrationProfile {
        CalibrationProfile::new(
            BodyPart::Knee,
            vec![
                ProblemZone { zone_index: 2, severity: 5.0 },
                ProblemZone { zone_index: 0, severity: 3.5 },
            ],
        )
    }

    #[test]
    fn test_profile_missing() {
        let db = Database::open_in_memory().unwrap();
        assert!(db.load_profile(BodyPart::Knee).unwrap().is_none());
    }

    #[test]
    fn test_profile_save_and_load() {
        let db = Database::open_in_memory().unwrap();
        db.save_profile(&knee_profile()).unwrap();
        assert_eq!(db.load_profile(BodyPart::Knee).unwrap(), Some(knee_profile()));
        assert!(db.load_profile(BodyPart::Foot).unwrap().is_none());
    }

    #[test]
    fn test_recalibration_replaces_profile() {
        let db = Database::open_in_memory().unwrap();
        db.save_profile(&knee_profile()).unwrap();
        let replacement = CalibrationProfile::new(
            BodyPart::Knee,
            vec![ProblemZone { zone_index: 4, severity: 1.0 }],
        );
        db.save_profile(&replacement).unwrap();
        assert_eq!(db.load_profile(BodyPart::Knee).unwrap(), Some(replacement));
    }

    #[test]
    fn test_session_save_and_load() {
        let db = Database::open_in_memory().unwrap();
        let state = CoachState::new(BodyPart::Achilles, Mode::Regressed, vec!["achilles_seated_raise".to_string()]);
        let mut session = StoredSession::new(state, None, None);
        session.progress.position = 1;
        db.save_session(&session).unwrap();

        let loaded = db.load_session(BodyPart::Achilles).unwrap().unwrap();
        assert_eq!(loaded.progress, session.progress);
        assert!(loaded.flag.is_none());
        assert!(db.load_session(BodyPart::Knee).unwrap().is_none());
    }

    #[test]
    fn test_blocked_session_keeps_flag() {
        let db = Database::open_in_memory().unwrap();
        let flag = SafetyFlag {
            rule_id: "acute_trauma".to_string(),
            title: "t".to_string(),
            description: "d".to_string(),
            recommended_action: "a".to_string(),
        };
        let state = CoachState::new(BodyPart::Shoulder, Mode::Blocked, Vec::new());
        db.save_session(&StoredSession::new(state, Some(flag.clone()), None)).unwrap();
        let loaded = db.load_session(BodyPart::Shoulder).unwrap().unwrap();
        assert_eq!(loaded.flag, Some(flag));
        assert!(loaded.progress.state.is_blocked());
    }

    #[test]
    fn test_new_session_replaces_old() {
        let db = Database::open_in_memory().unwrap();
        let first = CoachState::new(BodyPart::Foot, Mode::Normal, vec!["foot_towel_curl".to_string()]);
        let second = CoachState::new(BodyPart::Foot, Mode::Reset, vec!["foot_ball_roll".to_string()]);
        db.save_session(&StoredSession::new(first, None, None)).unwrap();
        db.save_session(&StoredSession::new(second.clone(), None, None)).unwrap();
        assert_eq!(db.load_session(BodyPart::Foot).unwrap().unwrap().progress.state, second);
    }

    #[test]
    fn test_feedback_log_order() {
        let db = Database::open_in_memory().unwrap();
        for (pain, mode) in [(2, Mode::Normal), (8, Mode::Reset)] {
            let record = FeedbackRecord {
                id: None,
                date: Utc::now(),
                body_part: BodyPart::Knee,
                feedback: DrillFeedback::new("knee_step_down", pain, true),
                mode_after: mode,
            };
            db.log_feedback(&record).unwrap();
        }
        let history = db.feedback_history(BodyPart::Knee).unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].feedback.pain, 8);
        assert_eq!(history[0].mode_after, Mode::Reset);
        assert_eq!(history[1].mode_after, Mode::Normal);
        assert!(db.feedback_history(BodyPart::Foot).unwrap().is_empty());
    }
}
