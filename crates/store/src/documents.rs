//! Per-user JSON artifacts.
//!
//! Each user has up to three files in the data directory, keyed by username:
//! chat history, schedule, and persona settings. An absent file loads as the
//! empty default.

use crate::fs;
use deskmate_core::error::StoreError;
use deskmate_core::{ChatTurn, PersonaSettings, ScheduleRecord};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};
use tracing::debug;

/// The kinds of per-user artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactKind {
    Chat,
    Schedule,
    Persona,
}

impl ArtifactKind {
    pub fn file_name(self, username: &str) -> String {
        match self {
            Self::Chat => format!("chat_history_{username}.json"),
            Self::Schedule => format!("schedules_{username}.json"),
            Self::Persona => format!("ai_persona_{username}.json"),
        }
    }
}

/// Reads and writes per-user artifacts under one data directory.
///
/// No locking: artifacts of different users never overlap, and a single
/// user's actions are serialized by their session.
#[derive(Debug, Clone)]
pub struct DocumentStore {
    data_dir: PathBuf,
}

impl DocumentStore {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn path(&self, kind: ArtifactKind, username: &str) -> PathBuf {
        self.data_dir.join(kind.file_name(username))
    }

    /// Load an artifact, or `T::default()` when it does not exist.
    pub fn load<T: DeserializeOwned + Default>(
        &self,
        kind: ArtifactKind,
        username: &str,
    ) -> Result<T, StoreError> {
        let path = self.path(kind, username);
        let value = fs::read_json(&path)?;
        debug!(?kind, username, found = value.is_some(), "Artifact loaded");
        Ok(value.unwrap_or_default())
    }

    /// Overwrite an artifact.
    pub fn save<T: Serialize + ?Sized>(
        &self,
        kind: ArtifactKind,
        username: &str,
        data: &T,
    ) -> Result<(), StoreError> {
        fs::write_json(&self.path(kind, username), data)?;
        debug!(?kind, username, "Artifact saved");
        Ok(())
    }

    pub fn load_chat(&self, username: &str) -> Result<Vec<ChatTurn>, StoreError> {
        self.load(ArtifactKind::Chat, username)
    }

    pub fn save_chat(&self, username: &str, turns: &[ChatTurn]) -> Result<(), StoreError> {
        self.save(ArtifactKind::Chat, username, turns)
    }

    /// Delete the chat history. A missing file and an empty history are the
    /// same thing to `load_chat`.
    pub fn clear_chat(&self, username: &str) -> Result<(), StoreError> {
        fs::remove(&self.path(ArtifactKind::Chat, username))?;
        debug!(username, "Chat history cleared");
        Ok(())
    }

    pub fn load_schedule(&self, username: &str) -> Result<Vec<ScheduleRecord>, StoreError> {
        self.load(ArtifactKind::Schedule, username)
    }

    pub fn save_schedule(
        &self,
        username: &str,
        records: &[ScheduleRecord],
    ) -> Result<(), StoreError> {
        self.save(ArtifactKind::Schedule, username, records)
    }

    /// Load the persona. An absent file or an empty JSON object means the
    /// user never saved one.
    pub fn load_persona(&self, username: &str) -> Result<Option<PersonaSettings>, StoreError> {
        let path = self.path(ArtifactKind::Persona, username);
        let raw: Option<serde_json::Value> = fs::read_json(&path)?;
        match raw {
            None => Ok(None),
            Some(serde_json::Value::Object(map)) if map.is_empty() => Ok(None),
            Some(value) => serde_json::from_value(value)
                .map(Some)
                .map_err(|e| StoreError::Corrupted {
                    path,
                    reason: e.to_string(),
                }),
        }
    }

    pub fn save_persona(
        &self,
        username: &str,
        persona: &PersonaSettings,
    ) -> Result<(), StoreError> {
        self.save(ArtifactKind::Persona, username, persona)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(date: &str, time: Option<&str>, event: &str) -> ScheduleRecord {
        ScheduleRecord {
            date: date.into(),
            time: time.map(String::from),
            event: event.into(),
        }
    }

    #[test]
    fn file_names_are_keyed_by_user() {
        assert_eq!(ArtifactKind::Chat.file_name("alice"), "chat_history_alice.json");
        assert_eq!(ArtifactKind::Schedule.file_name("alice"), "schedules_alice.json");
        assert_eq!(ArtifactKind::Persona.file_name("alice"), "ai_persona_alice.json");
    }

    #[test]
    fn absent_artifacts_load_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = DocumentStore::new(dir.path());
        assert!(store.load_chat("alice").unwrap().is_empty());
        assert!(store.load_schedule("alice").unwrap().is_empty());
        assert!(store.load_persona("alice").unwrap().is_none());
    }

    #[test]
    fn chat_appends_survive_reload_and_clear() {
        let dir = tempfile::tempdir().unwrap();
        let store = DocumentStore::new(dir.path());

        let mut turns = vec![ChatTurn::new("q1", "a1")];
        store.save_chat("alice", &turns).unwrap();
        turns.push(ChatTurn::new("q2", "a2"));
        store.save_chat("alice", &turns).unwrap();

        assert_eq!(store.load_chat("alice").unwrap(), turns);

        store.clear_chat("alice").unwrap();
        assert!(!store.path(ArtifactKind::Chat, "alice").exists());
        assert!(store.load_chat("alice").unwrap().is_empty());
        // Clearing twice is fine
        store.clear_chat("alice").unwrap();
    }

    #[test]
    fn schedule_keeps_null_times() {
        let dir = tempfile::tempdir().unwrap();
        let store = DocumentStore::new(dir.path());
        let records = vec![
            record("2024-05-01", Some("09:30"), "standup"),
            record("2024-05-01", None, "all day"),
        ];
        store.save_schedule("alice", &records).unwrap();

        let raw = std::fs::read_to_string(store.path(ArtifactKind::Schedule, "alice")).unwrap();
        let json: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert!(json[1]["time"].is_null());
        assert_eq!(store.load_schedule("alice").unwrap(), records);
    }

    #[test]
    fn empty_persona_object_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = DocumentStore::new(dir.path());
        std::fs::write(store.path(ArtifactKind::Persona, "alice"), "{}").unwrap();
        assert!(store.load_persona("alice").unwrap().is_none());
    }

    #[test]
    fn persona_round_trip_overwrites() {
        let dir = tempfile::tempdir().unwrap();
        let store = DocumentStore::new(dir.path());

        let mut persona = PersonaSettings::default();
        store.save_persona("alice", &persona).unwrap();
        persona.mind = "be optimistic".into();
        persona.temperature = 0.9;
        store.save_persona("alice", &persona).unwrap();

        assert_eq!(store.load_persona("alice").unwrap(), Some(persona));
    }

    #[test]
    fn users_do_not_share_artifacts() {
        let dir = tempfile::tempdir().unwrap();
        let store = DocumentStore::new(dir.path());
        store
            .save_chat("alice", &[ChatTurn::new("hi", "hello")])
            .unwrap();
        assert!(store.load_chat("bob").unwrap().is_empty());
    }

    #[test]
    fn corrupted_chat_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let store = DocumentStore::new(dir.path());
        std::fs::write(store.path(ArtifactKind::Chat, "alice"), "[{").unwrap();
        assert!(matches!(
            store.load_chat("alice"),
            Err(StoreError::Corrupted { .. })
        ));
    }
}
