//! Factual extractor (Layer 2)
//! ROBO mode: only what is literally written in the chunk, with a source
//! location, extracted under bounded parallelism with per-chunk isolation

use std::sync::Arc;

use serde_json::Value;
use tokio::sync::Semaphore;

use crate::chunker::{LegalChunk, UNIDENTIFIED_LOCATION};
use crate::config::PipelineConfig;
use crate::json_utils::extract_json;
use crate::llm::{backoff_delay, supports_json_mode, ChatCompletion, ChatMessage, CompletionRequest, LlmError};
use crate::prompts::EXTRACTION_PROMPT;
use crate::types::{ChunkExtraction, EventType, Theme};

const EXTRACTION_MAX_TOKENS: u32 = 2000;

pub struct FactualExtractor {
    client: Arc<dyn ChatCompletion>,
    model: String,
    temperature: f32,
    max_retries: u32,
    max_parallel: usize,
}

impl FactualExtractor {
    pub fn new(client: Arc<dyn ChatCompletion>, config: &PipelineConfig) -> Self {
        Self {
            client,
            model: config
                .extraction_model
                .clone()
                .unwrap_or_else(|| config.model.clone()),
            temperature: config.extraction_temperature,
            max_retries: config.max_retries,
            max_parallel: config.extraction_max_parallel.max(1),
        }
    }

    /// Extract facts from all chunks with bounded parallelism.
    ///
    /// Only successful extractions are returned; a failed chunk never
    /// aborts its siblings and nothing here panics or errors out.
    pub async fn extract_from_chunks(&self, chunks: &[LegalChunk]) -> Vec<ChunkExtraction> {
        tracing::info!("Layer 2: factual extraction - {} chunks", chunks.len());

        let semaphore = Semaphore::new(self.max_parallel);

        let tasks = chunks.iter().map(|chunk| {
            let semaphore = &semaphore;
            async move {
                let Ok(_permit) = semaphore.acquire().await else {
                    return None;
                };
                self.extract_from_chunk(chunk).await
            }
        });

        let extractions: Vec<ChunkExtraction> = futures::future::join_all(tasks)
            .await
            .into_iter()
            .flatten()
            .collect();

        tracing::info!("Layer 2: {} successful extractions", extractions.len());
        extractions
    }

    /// Extract one chunk, retrying transient API errors with backoff.
    ///
    /// A response without recoverable JSON drops the chunk without retry;
    /// non-transient API errors also fail immediately.
    async fn extract_from_chunk(&self, chunk: &LegalChunk) -> Option<ChunkExtraction> {
        for attempt in 0..self.max_retries {
            match self.call_extraction_api(chunk).await {
                Ok(Some(extraction)) => return Some(extraction),
                Ok(None) => {
                    tracing::warn!("No parseable JSON for chunk {}", chunk.chunk_id);
                    return None;
                }
                Err(e) if e.is_transient() => {
                    if attempt + 1 == self.max_retries {
                        tracing::error!(
                            "Extraction of {} failed after {} attempts: {}",
                            chunk.chunk_id,
                            self.max_retries,
                            e
                        );
                        return None;
                    }
                    let delay = backoff_delay(attempt);
                    tracing::warn!(
                        "Extraction attempt {} for {} failed ({}), waiting {:?}",
                        attempt + 1,
                        chunk.chunk_id,
                        e,
                        delay
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(e) => {
                    tracing::error!("Extraction of {} failed: {}", chunk.chunk_id, e);
                    return None;
                }
            }
        }

        None
    }

    async fn call_extraction_api(
        &self,
        chunk: &LegalChunk,
    ) -> Result<Option<ChunkExtraction>, LlmError> {
        let context = format!(
            "CONTEXTO DO TRECHO:\n\
             - Tipo de documento provavel: {}\n\
             - Localizacao no documento: {}\n\
             - Tamanho: {} palavras\n\n\
             TEXTO PARA EXTRAIR:\n{}",
            chunk.probable_type, chunk.start_location, chunk.word_count, chunk.text
        );

        let request = CompletionRequest {
            model: self.model.clone(),
            messages: vec![
                ChatMessage::system(EXTRACTION_PROMPT),
                ChatMessage::user(context),
            ],
            temperature: self.temperature,
            max_tokens: EXTRACTION_MAX_TOKENS,
            json_mode: supports_json_mode(&self.model),
        };

        let response = self.client.complete(&request).await?;
        Ok(self.parse_extraction_response(&response, chunk))
    }

    /// Map the model response onto the closed taxonomies. Unrecognized
    /// labels degrade to `outros`; they never fail the chunk.
    fn parse_extraction_response(
        &self,
        response: &str,
        chunk: &LegalChunk,
    ) -> Option<ChunkExtraction> {
        let data = extract_json(response)?;

        let event_label = data
            .get("tipo_evento")
            .and_then(Value::as_str)
            .unwrap_or(&chunk.probable_type);
        let event_type = EventType::from_label(event_label);

        let mut themes: Vec<Theme> = Vec::new();
        if let Some(labels) = data.get("temas").and_then(Value::as_array) {
            for label in labels.iter().filter_map(Value::as_str) {
                let theme = Theme::from_label(label);
                if !themes.contains(&theme) {
                    themes.push(theme);
                }
            }
        }
        if themes.is_empty() {
            themes.push(Theme::Other);
        }

        let literal_facts: Vec<String> = data
            .get("fatos_literais")
            .and_then(Value::as_array)
            .map(|facts| {
                facts
                    .iter()
                    .filter_map(Value::as_str)
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();

        let parameters = data
            .get("parametros")
            .and_then(Value::as_object)
            .cloned()
            .unwrap_or_default();

        let location = data
            .get("localizacao")
            .and_then(Value::as_str)
            .filter(|loc| !loc.trim().is_empty() && *loc != "nao informado")
            .unwrap_or(&chunk.start_location)
            .to_string();

        let confidence = calculate_confidence(&data);

        Some(ChunkExtraction {
            chunk_id: chunk.chunk_id.clone(),
            event_type,
            themes,
            literal_facts,
            parameters,
            location,
            source_text: chunk.text.clone(),
            confidence,
        })
    }
}

/// Completeness heuristic: base 0.5, bonuses for literal facts, parameters
/// and a real location, capped at 1.0.
fn calculate_confidence(data: &Value) -> f64 {
    let mut score = 0.5;

    if data
        .get("fatos_literais")
        .and_then(Value::as_array)
        .is_some_and(|facts| !facts.is_empty())
    {
        score += 0.2;
    }

    if data
        .get("parametros")
        .and_then(Value::as_object)
        .is_some_and(|params| !params.is_empty())
    {
        score += 0.15;
    }

    let location = data.get("localizacao").and_then(Value::as_str).unwrap_or("");
    if !location.is_empty() && location != "nao informado" && location != UNIDENTIFIED_LOCATION {
        score += 0.15;
    }

    f64::min(1.0, score)
}
