//! Section generator (Layer 5)
//! REDATOR mode: drafts the nine summary sections from consolidated data,
//! carrying a source citation next to every value-bearing field

use std::sync::Arc;

use serde_json::Value;

use crate::config::PipelineConfig;
use crate::json_utils::{collect_sources, extract_json};
use crate::llm::{backoff_delay, supports_json_mode, ChatCompletion, ChatMessage, CompletionRequest, LlmError};
use crate::memory::ProcessMemory;
use crate::prompts::{section_prompt, SECTION_ORDER};
use crate::types::{ConsolidatedTheme, ConsolidationStatus, SectionResult};

const GENERATION_MAX_TOKENS: u32 = 2000;

pub struct SectionGenerator {
    client: Arc<dyn ChatCompletion>,
    model: String,
    temperature: f32,
    max_retries: u32,
}

impl SectionGenerator {
    pub fn new(client: Arc<dyn ChatCompletion>, config: &PipelineConfig) -> Self {
        Self {
            client,
            model: config
                .generation_model
                .clone()
                .unwrap_or_else(|| config.model.clone()),
            temperature: config.generation_temperature,
            max_retries: config.max_retries,
        }
    }

    /// Generate all nine sections, strictly in the fixed order.
    pub async fn generate_sections(
        &self,
        consolidated: &[ConsolidatedTheme],
        memory: &ProcessMemory,
    ) -> Vec<SectionResult> {
        tracing::info!("Layer 5: section generation - {} sections", SECTION_ORDER.len());

        let mut sections: Vec<SectionResult> = Vec::new();
        for section_name in SECTION_ORDER {
            sections.push(
                self.generate_section(section_name, consolidated, memory, &[])
                    .await,
            );
        }

        tracing::info!("Layer 5: {} sections generated", sections.len());
        sections
    }

    /// Redo one section, feeding the previous validation errors back as
    /// corrective instructions.
    pub async fn regenerate_section(
        &self,
        section_name: &str,
        consolidated: &[ConsolidatedTheme],
        memory: &ProcessMemory,
        previous_errors: &[String],
    ) -> SectionResult {
        tracing::info!("Layer 5: regenerating section {}", section_name);
        self.generate_section(section_name, consolidated, memory, previous_errors)
            .await
    }

    async fn generate_section(
        &self,
        section_name: &str,
        consolidated: &[ConsolidatedTheme],
        memory: &ProcessMemory,
        error_context: &[String],
    ) -> SectionResult {
        for attempt in 0..self.max_retries {
            match self
                .call_generation_api(section_name, consolidated, memory, error_context)
                .await
            {
                Ok(Some(content)) => {
                    let sources_used = collect_sources(&content);
                    return SectionResult {
                        name: section_name.to_string(),
                        content,
                        sources_used,
                        passed_validation: true,
                        validation_findings: Vec::new(),
                        attempts: attempt + 1,
                    };
                }
                Ok(None) => {
                    tracing::warn!(
                        "No parseable JSON for section {} (attempt {})",
                        section_name,
                        attempt + 1
                    );
                }
                Err(e) if e.is_transient() => {
                    if attempt + 1 == self.max_retries {
                        tracing::error!(
                            "Generation of {} failed after {} attempts: {}",
                            section_name,
                            self.max_retries,
                            e
                        );
                        break;
                    }
                    tokio::time::sleep(backoff_delay(attempt)).await;
                }
                Err(e) => {
                    tracing::error!("Generation of {} failed: {}", section_name, e);
                    break;
                }
            }
        }

        failed_section(section_name, self.max_retries)
    }

    async fn call_generation_api(
        &self,
        section_name: &str,
        consolidated: &[ConsolidatedTheme],
        memory: &ProcessMemory,
        error_context: &[String],
    ) -> Result<Option<Value>, LlmError> {
        let Some(prompt) = section_prompt(section_name) else {
            tracing::warn!("No prompt template for section {}", section_name);
            return Ok(None);
        };

        let mut context = format!(
            "DADOS CONSOLIDADOS:\n{}\n\nCONTEXTO ADICIONAL:\n{}",
            format_themes_for_prompt(consolidated),
            format_memory_context(memory)
        );

        if !error_context.is_empty() {
            let errors: Vec<String> = error_context.iter().map(|e| format!("- {}", e)).collect();
            context.push_str(&format!(
                "\n\nATENCAO - ERROS NA TENTATIVA ANTERIOR:\n{}\n\nCorrija estes problemas nesta geracao.",
                errors.join("\n")
            ));
        }

        let request = CompletionRequest {
            model: self.model.clone(),
            messages: vec![ChatMessage::system(prompt), ChatMessage::user(context)],
            temperature: self.temperature,
            max_tokens: GENERATION_MAX_TOKENS,
            json_mode: supports_json_mode(&self.model),
        };

        let response = self.client.complete(&request).await?;
        Ok(extract_json(&response))
    }
}

/// Sentinel for a section the model could not produce.
fn failed_section(section_name: &str, attempts: u32) -> SectionResult {
    SectionResult {
        name: section_name.to_string(),
        content: serde_json::json!({"erro": "Falha na geracao"}),
        sources_used: Vec::new(),
        passed_validation: false,
        validation_findings: Vec::new(),
        attempts,
    }
}

fn format_themes_for_prompt(themes: &[ConsolidatedTheme]) -> String {
    let mut parts: Vec<String> = Vec::new();

    for theme in themes {
        let status_marker = match theme.status {
            ConsolidationStatus::Confirmed => "[OK]",
            ConsolidationStatus::Divergent => "[!]",
            ConsolidationStatus::Pending => "[?]",
        };

        let parameters =
            serde_json::to_string(&theme.parameters).unwrap_or_else(|_| "{}".to_string());

        parts.push(format!(
            "TEMA: {} {}\nStatus: {}\nFontes: {}\nParametros: {}\nConflitos: {}\nObservacoes: {}",
            theme.theme,
            status_marker,
            theme.status.label(),
            theme.sources.join(", "),
            parameters,
            theme.conflicts.len(),
            theme.notes
        ));
    }

    parts.join("\n\n")
}

fn format_memory_context(memory: &ProcessMemory) -> String {
    let summary = memory.summary();
    let gaps = memory.detect_gaps();

    format!(
        "Total de extracoes: {}\nTemas encontrados: {}\nEventos encontrados: {}\nLacunas detectadas: {}",
        summary.total_extractions,
        summary.themes.len(),
        summary.events.len(),
        gaps.len()
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::testing::MockClient;
    use serde_json::json;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn generator(client: Arc<MockClient>) -> SectionGenerator {
        SectionGenerator::new(client, &PipelineConfig::default())
    }

    fn section_content() -> String {
        json!({
            "numero_processo": {"valor": "0001234-56.2023.5.02.0001", "fonte": "fls. 1"},
            "tribunal": {"valor": "2a Vara do Trabalho", "fonte": "fls. 1"}
        })
        .to_string()
    }

    #[tokio::test]
    async fn test_generates_nine_sections_in_order() {
        let client = Arc::new(MockClient::new(|_| Ok(section_content())));
        let generator = generator(client.clone());
        let memory = ProcessMemory::new();

        let sections = generator.generate_sections(&[], &memory).await;
        assert_eq!(sections.len(), 9);
        for (section, expected) in sections.iter().zip(SECTION_ORDER) {
            assert_eq!(section.name, expected);
            assert!(section.passed_validation);
            assert_eq!(section.attempts, 1);
        }
        assert_eq!(client.calls(), 9);
    }

    #[tokio::test]
    async fn test_sources_collected_from_content() {
        let client = Arc::new(MockClient::new(|_| Ok(section_content())));
        let generator = generator(client);
        let memory = ProcessMemory::new();

        let sections = generator.generate_sections(&[], &memory).await;
        assert_eq!(sections[0].sources_used, vec!["fls. 1"]);
    }

    #[tokio::test]
    async fn test_parse_failure_is_retried() {
        let failures = AtomicU32::new(0);
        let client = Arc::new(MockClient::new(move |_| {
            if failures.fetch_add(1, Ordering::SeqCst) == 0 {
                Ok("resposta sem json".to_string())
            } else {
                Ok(section_content())
            }
        }));
        let generator = generator(client);
        let memory = ProcessMemory::new();

        let section = generator
            .generate_section("cabecalho", &[], &memory, &[])
            .await;
        assert!(section.passed_validation);
        assert_eq!(section.attempts, 2);
    }

    #[tokio::test]
    async fn test_sentinel_after_permanent_error() {
        let client = Arc::new(MockClient::new(|_| Err(LlmError::Api("HTTP 500".into()))));
        let generator = generator(client.clone());
        let memory = ProcessMemory::new();

        let section = generator
            .generate_section("cabecalho", &[], &memory, &[])
            .await;
        assert!(!section.passed_validation);
        assert_eq!(section.content["erro"], "Falha na geracao");
        assert_eq!(section.attempts, PipelineConfig::default().max_retries);
        assert!(section.sources_used.is_empty());
        assert_eq!(client.calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_sentinel_after_transient_exhaustion() {
        let client = Arc::new(MockClient::new(|_| Err(LlmError::RateLimited)));
        let generator = generator(client.clone());
        let memory = ProcessMemory::new();

        let section = generator
            .generate_section("timeline", &[], &memory, &[])
            .await;
        assert!(!section.passed_validation);
        assert_eq!(client.calls(), PipelineConfig::default().max_retries);
    }

    #[tokio::test]
    async fn test_regeneration_carries_error_context() {
        let client = Arc::new(MockClient::new(|request: &CompletionRequest| {
            let user = &request.messages[1].content;
            assert!(user.contains("ATENCAO - ERROS NA TENTATIVA ANTERIOR"));
            assert!(user.contains("Campos sem fonte: salario_base"));
            Ok(section_content())
        }));
        let generator = generator(client);
        let memory = ProcessMemory::new();

        let section = generator
            .regenerate_section(
                "parametros_calculo",
                &[],
                &memory,
                &["Campos sem fonte: salario_base".to_string()],
            )
            .await;
        assert!(section.passed_validation);
    }

    #[tokio::test]
    async fn test_unknown_section_yields_sentinel() {
        let client = Arc::new(MockClient::new(|_| Ok(section_content())));
        let generator = generator(client.clone());
        let memory = ProcessMemory::new();

        let section = generator
            .generate_section("secao_inexistente", &[], &memory, &[])
            .await;
        assert!(!section.passed_validation);
        assert_eq!(client.calls(), 0);
    }
}
