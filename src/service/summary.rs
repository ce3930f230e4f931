use crate::{config::SummarizerConfig, dto::SummarizeNote, llm::CompletionClient};

use std::sync::Arc;

use super::ServiceError;

/// Trims every note text, drops blank ones and joins the rest with a blank line.
/// `None` entries count as notes without text.
pub fn join_note_text(notes: &[Option<SummarizeNote>]) -> String {
    notes
        .iter()
        .flatten()
        .filter_map(|note| note.text.as_deref())
        .map(str::trim)
        .filter(|text| !text.is_empty())
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Splits `text` into consecutive windows of `chunk_size` characters; only
/// the last window may be shorter. Concatenating the result gives back `text`.
pub fn chunk_text(text: &str, chunk_size: usize) -> Vec<&str> {
    let chunk_size = chunk_size.max(1);
    let mut chunks = Vec::new();
    let mut start = 0;
    let mut count = 0;

    for (idx, _) in text.char_indices() {
        if count == chunk_size {
            chunks.push(&text[start..idx]);
            start = idx;
            count = 0;
        }
        count += 1;
    }

    if start < text.len() {
        chunks.push(&text[start..]);
    }

    chunks
}

/// Summarizes notes in two passes: every chunk on its own, then one call
/// combining the partial summaries.
pub struct SummaryService {
    client: Arc<dyn CompletionClient>,
    config: SummarizerConfig,
}

impl SummaryService {
    pub fn new(client: Arc<dyn CompletionClient>, config: SummarizerConfig) -> Self {
        Self { client, config }
    }

    pub async fn summarize(
        &self,
        notes: &[Option<SummarizeNote>],
    ) -> Result<String, ServiceError> {
        if notes.is_empty() {
            return Err(ServiceError::NoNotes);
        }

        let raw = join_note_text(notes);
        if raw.is_empty() {
            return Err(ServiceError::EmptyInput);
        }

        let chunks = chunk_text(&raw, self.config.chunk_size);
        tracing::info!(
            "Summarizing {} notes, split into {} chunk(s)",
            notes.len(),
            chunks.len()
        );

        let mut partials = Vec::with_capacity(chunks.len());
        for (idx, chunk) in chunks.iter().enumerate() {
            tracing::debug!(
                "Summarizing chunk {}/{} ({} chars)",
                idx + 1,
                chunks.len(),
                chunk.chars().count()
            );

            let prompt = format!("{}\n\n{}", self.config.chunk_prompt, chunk);
            let partial = self.client.complete(&prompt).await?.unwrap_or_default();
            if partial.is_empty() {
                tracing::warn!("Chunk {} produced no summary text", idx + 1);
            }
            partials.push(partial);
        }

        let prompt = format!(
            "{}\n\n{}",
            self.config.combine_prompt,
            partials.join("\n\n")
        );
        let summary = self
            .client
            .complete(&prompt)
            .await?
            .unwrap_or_else(|| self.config.fallback_summary.clone());

        tracing::info!("Final summary length: {}", summary.len());

        Ok(summary)
    }
}
