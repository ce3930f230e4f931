use async_trait::async_trait;
use chrono::{DateTime, SubsecRound, TimeDelta, Utc};

use std::{
    ffi::OsString,
    io::ErrorKind,
    path::{Path, PathBuf},
};

use crate::models::Note;

#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("Notes file I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Notes file is not a valid notes snapshot: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Storage for notes.
///
/// Mutating methods take `&mut self`: callers hold the repository behind a
/// single lock, so every read-modify-write sequence runs alone.
#[async_trait]
pub trait NoteRepository: Send + Sync {
    async fn create_note(&mut self, title: String, text: String) -> Result<Note, RepositoryError>;

    async fn update_note(
        &mut self,
        id: i64,
        title: Option<String>,
        text: String,
    ) -> Result<Option<Note>, RepositoryError>;

    async fn delete_note(&mut self, id: i64) -> Result<Option<Note>, RepositoryError>;

    async fn get_one_note(&self, id: i64) -> Result<Option<Note>, RepositoryError>;

    async fn get_all_notes(&self) -> Result<Vec<Note>, RepositoryError>;
}

/// Notes kept in memory and mirrored to a JSON array file.
///
/// Each mutation writes the complete snapshot to a temporary sibling file and
/// renames it over the target. The in-memory collection changes only once the
/// new snapshot is on disk.
pub struct JsonFileRepository {
    path: PathBuf,
    notes: Vec<Note>,
}

impl JsonFileRepository {
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self, RepositoryError> {
        let path = path.into();

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }

        let notes: Vec<Note> = match tokio::fs::read(&path).await {
            Ok(bytes) if bytes.iter().all(u8::is_ascii_whitespace) => Vec::new(),
            Ok(bytes) => serde_json::from_slice(&bytes)?,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::info!(
                    "Notes file {} does not exist yet, starting empty",
                    path.display()
                );
                Vec::new()
            }
            Err(e) => return Err(e.into()),
        };

        tracing::info!("Loaded {} notes from {}", notes.len(), path.display());

        Ok(Self { path, notes })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map_or_else(|| OsString::from("notes.json"), OsString::from);
        name.push(".tmp");
        self.path.with_file_name(name)
    }

    async fn persist(&self, notes: &[Note]) -> Result<(), RepositoryError> {
        let data = serde_json::to_vec_pretty(notes)?;
        let temp = self.temp_path();

        tokio::fs::write(&temp, &data).await?;
        tokio::fs::rename(&temp, &self.path).await?;

        tracing::debug!(
            "Wrote {} notes ({} bytes) to {}",
            notes.len(),
            data.len(),
            self.path.display()
        );

        Ok(())
    }

    fn next_id(&self, now: DateTime<Utc>) -> i64 {
        let candidate = now.timestamp_millis();
        match self.notes.iter().map(|note| note.id).max() {
            Some(max) if max >= candidate => max + 1,
            _ => candidate,
        }
    }

    fn position(&self, id: i64) -> Option<usize> {
        self.notes.iter().position(|note| note.id == id)
    }
}

// Stored timestamps carry millisecond precision, the same as they are written.
fn now_millis() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(3)
}

// Edits within the same clock tick still have to land after creation.
fn edit_timestamp(created_at: DateTime<Utc>) -> DateTime<Utc> {
    let now = now_millis();
    if now > created_at {
        now
    } else {
        created_at + TimeDelta::milliseconds(1)
    }
}

#[async_trait]
impl NoteRepository for JsonFileRepository {
    async fn create_note(&mut self, title: String, text: String) -> Result<Note, RepositoryError> {
        let now = now_millis();
        let note = Note {
            id: self.next_id(now),
            title,
            text,
            created_at: now,
            updated_at: None,
        };

        let mut notes = self.notes.clone();
        notes.push(note.clone());
        self.persist(&notes).await?;
        self.notes = notes;

        Ok(note)
    }

    async fn update_note(
        &mut self,
        id: i64,
        title: Option<String>,
        text: String,
    ) -> Result<Option<Note>, RepositoryError> {
        let Some(idx) = self.position(id) else {
            return Ok(None);
        };

        let mut notes = self.notes.clone();
        let note = &mut notes[idx];
        if let Some(title) = title {
            note.title = title;
        }
        note.text = text;
        note.updated_at = Some(edit_timestamp(note.created_at));
        let updated = note.clone();

        self.persist(&notes).await?;
        self.notes = notes;

        Ok(Some(updated))
    }

    async fn delete_note(&mut self, id: i64) -> Result<Option<Note>, RepositoryError> {
        let Some(idx) = self.position(id) else {
            return Ok(None);
        };

        let mut notes = self.notes.clone();
        let removed = notes.remove(idx);
        self.persist(&notes).await?;
        self.notes = notes;

        Ok(Some(removed))
    }

    async fn get_one_note(&self, id: i64) -> Result<Option<Note>, RepositoryError> {
        Ok(self.notes.iter().find(|note| note.id == id).cloned())
    }

    async fn get_all_notes(&self) -> Result<Vec<Note>, RepositoryError> {
        Ok(self.notes.clone())
    }
}
