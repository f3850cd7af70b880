//! Semantic consolidator (Layer 4)
//! JUIZ mode: merges multi-source facts per theme, resolves conflicts by
//! source hierarchy, and degrades to a deterministic local consolidation
//! when the model path fails

use std::sync::Arc;

use serde_json::Value;

use crate::config::PipelineConfig;
use crate::json_utils::extract_json;
use crate::llm::{backoff_delay, supports_json_mode, ChatCompletion, ChatMessage, CompletionRequest, LlmError};
use crate::memory::ProcessMemory;
use crate::prompts::CONSOLIDATION_PROMPT;
use crate::types::{ChunkExtraction, Conflict, ConsolidatedTheme, ConsolidationStatus, Theme};

const CONSOLIDATION_MAX_TOKENS: u32 = 1500;
const MAX_FACTS_PER_SOURCE: usize = 5;

pub struct SemanticConsolidator {
    client: Arc<dyn ChatCompletion>,
    model: String,
    temperature: f32,
    max_retries: u32,
}

impl SemanticConsolidator {
    pub fn new(client: Arc<dyn ChatCompletion>, config: &PipelineConfig) -> Self {
        Self {
            client,
            model: config
                .consolidation_model
                .clone()
                .unwrap_or_else(|| config.model.clone()),
            temperature: config.consolidation_temperature,
            max_retries: config.max_retries,
        }
    }

    /// Consolidate every theme present in memory, one entry per theme.
    pub async fn consolidate(&self, memory: &ProcessMemory) -> Vec<ConsolidatedTheme> {
        let themes = memory.get_all_themes();
        tracing::info!("Layer 4: semantic consolidation - {} themes", themes.len());

        let mut consolidated: Vec<ConsolidatedTheme> = Vec::new();

        for theme in themes {
            let extractions = memory.get_by_theme(theme);
            if extractions.is_empty() {
                continue;
            }
            consolidated.push(self.consolidate_theme(theme, &extractions, memory).await);
        }

        tracing::info!("Layer 4: {} themes consolidated", consolidated.len());
        consolidated
    }

    async fn consolidate_theme(
        &self,
        theme: Theme,
        extractions: &[&ChunkExtraction],
        memory: &ProcessMemory,
    ) -> ConsolidatedTheme {
        // A single source cannot conflict with itself; skip the model call
        if let [only] = extractions {
            return single_source_consolidation(theme, only);
        }

        for attempt in 0..self.max_retries {
            // Unparseable responses share the transient-failure path
            let retryable = match self.call_consolidation_api(theme, extractions, memory).await {
                Ok(Some(consolidated)) => return consolidated,
                Ok(None) => true,
                Err(e) => {
                    if !e.is_transient() {
                        tracing::error!("Consolidation of {} failed: {}", theme, e);
                    }
                    e.is_transient()
                }
            };

            if !retryable {
                break;
            }
            if attempt + 1 == self.max_retries {
                tracing::error!(
                    "Consolidation of {} failed after {} attempts, using fallback",
                    theme,
                    self.max_retries
                );
                break;
            }
            tokio::time::sleep(backoff_delay(attempt)).await;
        }

        fallback_consolidation(theme, memory)
    }

    async fn call_consolidation_api(
        &self,
        theme: Theme,
        extractions: &[&ChunkExtraction],
        memory: &ProcessMemory,
    ) -> Result<Option<ConsolidatedTheme>, LlmError> {
        let known_conflicts: Vec<Conflict> = memory
            .detect_conflicts()
            .into_iter()
            .filter(|c| c.theme == theme)
            .collect();

        let conflicts_block = if known_conflicts.is_empty() {
            "Nenhum conflito detectado automaticamente".to_string()
        } else {
            format_conflicts_for_prompt(&known_conflicts)
        };

        let context = format!(
            "TEMA: {}\n\n\
             EXTRACOES ENCONTRADAS ({} fontes):\n{}\n\n\
             CONFLITOS JA DETECTADOS: {}\n{}\n\n\
             Consolide as informacoes acima seguindo a hierarquia de fontes.",
            theme,
            extractions.len(),
            format_extractions_for_prompt(extractions),
            known_conflicts.len(),
            conflicts_block
        );

        let request = CompletionRequest {
            model: self.model.clone(),
            messages: vec![
                ChatMessage::system(CONSOLIDATION_PROMPT),
                ChatMessage::user(context),
            ],
            temperature: self.temperature,
            max_tokens: CONSOLIDATION_MAX_TOKENS,
            json_mode: supports_json_mode(&self.model),
        };

        let response = self.client.complete(&request).await?;
        Ok(parse_consolidation_response(&response, theme, extractions))
    }
}

fn format_extractions_for_prompt(extractions: &[&ChunkExtraction]) -> String {
    let mut parts: Vec<String> = Vec::new();

    for (i, extraction) in extractions.iter().enumerate() {
        let facts: Vec<String> = extraction
            .literal_facts
            .iter()
            .take(MAX_FACTS_PER_SOURCE)
            .map(|fact| format!("- {}", fact))
            .collect();

        let parameters = serde_json::to_string_pretty(&extraction.parameters)
            .unwrap_or_else(|_| "{}".to_string());

        parts.push(format!(
            "--- FONTE {}: {} ({}) ---\nFatos literais:\n{}\n\nParametros:\n{}",
            i + 1,
            extraction.event_type,
            extraction.location,
            facts.join("\n"),
            parameters
        ));
    }

    parts.join("\n\n")
}

fn format_conflicts_for_prompt(conflicts: &[Conflict]) -> String {
    conflicts
        .iter()
        .map(|c| {
            format!(
                "- {}: '{}' ({}) vs '{}' ({})",
                c.field, c.primary_value, c.primary_source, c.secondary_value, c.secondary_source
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn parse_consolidation_response(
    response: &str,
    theme: Theme,
    extractions: &[&ChunkExtraction],
) -> Option<ConsolidatedTheme> {
    let data = extract_json(response)?;

    let status = data
        .get("status")
        .and_then(Value::as_str)
        .and_then(ConsolidationStatus::from_label)
        .unwrap_or(ConsolidationStatus::Pending);

    let mut conflicts: Vec<Conflict> = Vec::new();
    if let Some(items) = data.get("conflitos").and_then(Value::as_array) {
        for item in items {
            conflicts.push(Conflict {
                theme,
                field: item
                    .get("campo")
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string(),
                primary_value: item.get("valor_1").cloned().unwrap_or(Value::Null),
                primary_source: item
                    .get("fonte_1")
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string(),
                secondary_value: item.get("valor_2").cloned().unwrap_or(Value::Null),
                secondary_source: item
                    .get("fonte_2")
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string(),
                resolution: item
                    .get("resolucao")
                    .and_then(Value::as_str)
                    .map(str::to_string),
                chosen_source: None,
            });
        }
    }

    let mut sources: Vec<String> = data
        .get("fontes")
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default();
    if sources.is_empty() {
        sources = extractions.iter().map(|e| e.location.clone()).collect();
    }

    Some(ConsolidatedTheme {
        theme,
        status,
        parameters: data
            .get("parametros_consolidados")
            .and_then(Value::as_object)
            .cloned()
            .unwrap_or_default(),
        sources,
        conflicts,
        notes: data
            .get("observacoes")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string(),
    })
}

/// Immediate confirmation for a theme with exactly one source.
fn single_source_consolidation(theme: Theme, extraction: &ChunkExtraction) -> ConsolidatedTheme {
    ConsolidatedTheme {
        theme,
        status: ConsolidationStatus::Confirmed,
        parameters: extraction.parameters.clone(),
        sources: vec![extraction.location.clone()],
        conflicts: Vec::new(),
        notes: "Fonte unica - sem conflitos possiveis".to_string(),
    }
}

/// Deterministic consolidation from ProcessMemory's own priority-resolved
/// data. Requires no model collaborator; this is the safety net behind
/// every failed adjudication call.
pub fn fallback_consolidation(theme: Theme, memory: &ProcessMemory) -> ConsolidatedTheme {
    let parameters = memory.get_parameters_by_theme(theme);
    let sources = memory.get_sources_by_theme(theme);
    let conflicts: Vec<Conflict> = memory
        .detect_conflicts()
        .into_iter()
        .filter(|c| c.theme == theme)
        .collect();

    let status = if !conflicts.is_empty() {
        ConsolidationStatus::Divergent
    } else if !parameters.is_empty() {
        ConsolidationStatus::Confirmed
    } else {
        ConsolidationStatus::Pending
    };

    ConsolidatedTheme {
        theme,
        status,
        parameters,
        sources,
        conflicts,
        notes: "Consolidacao automatica (fallback)".to_string(),
    }
}
