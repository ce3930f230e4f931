pub mod summary;

use crate::{
    dto::{CreateNoteRequest, UpdateNoteRequest},
    extractor::{self, ExtractError},
    llm::SummarizationError,
    models::{DEFAULT_TITLE, Note},
    repository::{NoteRepository, RepositoryError},
};

use std::sync::Arc;

pub use summary::SummaryService;

pub type SharedRepository = Arc<tokio::sync::Mutex<Box<dyn NoteRepository>>>;

#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("{0}")]
    Validation(String),

    #[error("Note not found")]
    NotFound,

    #[error(transparent)]
    Extraction(#[from] ExtractError),

    #[error("No notes provided")]
    NoNotes,

    #[error("No note text to summarize")]
    EmptyInput,

    #[error("Failed to summarize notes: {0}")]
    Summarization(#[from] SummarizationError),

    #[error("Storage error: {0}")]
    Storage(#[from] RepositoryError),
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

fn required_text(text: Option<String>) -> Result<String, ServiceError> {
    non_blank(text).ok_or_else(|| ServiceError::Validation("Note text is required".to_string()))
}

#[derive(Clone)]
pub struct NoteService {
    repo: SharedRepository,
}

impl NoteService {
    pub const fn new(repo: SharedRepository) -> Self {
        Self { repo }
    }

    pub async fn create_note(&self, request: CreateNoteRequest) -> Result<Note, ServiceError> {
        let text = required_text(request.text)?;
        let title = non_blank(request.title).unwrap_or_else(|| DEFAULT_TITLE.to_string());

        let note = self.repo.lock().await.create_note(title, text).await?;
        tracing::info!("Created note {} '{}'", note.id, note.title);

        Ok(note)
    }

    /// Extracts the text of an uploaded file and stores it as a new note
    /// titled after the file.
    pub async fn create_note_from_upload(
        &self,
        filename: Option<&str>,
        content_type: &str,
        data: Vec<u8>,
    ) -> Result<Note, ServiceError> {
        let size = data.len();
        let text = extractor::extract_document(content_type, data).await?;
        let title = extractor::title_from_filename(filename);

        tracing::info!(
            "Extracted {} chars from upload '{}' ({}, {} bytes)",
            text.chars().count(),
            title,
            content_type,
            size
        );

        let note = self.repo.lock().await.create_note(title, text).await?;
        tracing::info!("Created note {} from upload", note.id);

        Ok(note)
    }

    pub async fn update_note(
        &self,
        id: i64,
        request: UpdateNoteRequest,
    ) -> Result<Note, ServiceError> {
        let text = required_text(request.text)?;
        let title = non_blank(request.title);

        let note = self
            .repo
            .lock()
            .await
            .update_note(id, title, text)
            .await?
            .ok_or(ServiceError::NotFound)?;
        tracing::info!("Updated note {}", id);

        Ok(note)
    }

    pub async fn delete_note(&self, id: i64) -> Result<Note, ServiceError> {
        let note = self
            .repo
            .lock()
            .await
            .delete_note(id)
            .await?
            .ok_or(ServiceError::NotFound)?;
        tracing::info!("Deleted note {}", id);

        Ok(note)
    }

    pub async fn get_one_note(&self, id: i64) -> Result<Note, ServiceError> {
        self.repo
            .lock()
            .await
            .get_one_note(id)
            .await?
            .ok_or(ServiceError::NotFound)
    }

    pub async fn get_all_notes(&self) -> Result<Vec<Note>, ServiceError> {
        Ok(self.repo.lock().await.get_all_notes().await?)
    }
}
