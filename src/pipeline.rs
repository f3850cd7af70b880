//! Six-layer anti-hallucination summarization pipeline
//! chunk -> extract -> memory -> consolidate -> generate -> validate,
//! with bounded regeneration of sections that fail validation

use std::sync::Arc;
use std::time::Instant;

use thiserror::Error;

use crate::chunker::LegalChunker;
use crate::config::{ConfigError, PipelineConfig};
use crate::consolidator::SemanticConsolidator;
use crate::extractor::FactualExtractor;
use crate::generator::SectionGenerator;
use crate::llm::{ChatCompletion, OpenAiClient};
use crate::memory::ProcessMemory;
use crate::types::{ConsolidatedTheme, PipelineResult, SectionResult, Severity};
use crate::validator::PipelineValidator;

#[derive(Debug, Error)]
#[error("{stage}: {message}")]
pub struct PipelineError {
    pub stage: &'static str,
    pub message: String,
}

/// Orchestrates the full pipeline behind one `summarize` call.
///
/// Per-unit failures (a chunk, a theme, a section) are absorbed by the
/// layers themselves; only construction can fail, and only on missing
/// configuration.
pub struct CaseSummarizer {
    chunker: LegalChunker,
    extractor: FactualExtractor,
    consolidator: SemanticConsolidator,
    generator: SectionGenerator,
    validator: PipelineValidator,
}

impl CaseSummarizer {
    /// Build the pipeline with the HTTP completion client. Fails fast when
    /// no API key is configured.
    pub fn new(config: PipelineConfig) -> Result<Self, ConfigError> {
        let api_key = config.require_api_key()?.to_string();
        let client: Arc<dyn ChatCompletion> =
            Arc::new(OpenAiClient::new(&config.base_url, &api_key));
        Ok(Self::with_client(&config, client))
    }

    /// Build the pipeline around an injected completion collaborator.
    pub fn with_client(config: &PipelineConfig, client: Arc<dyn ChatCompletion>) -> Self {
        Self {
            chunker: LegalChunker::new(config.chunker_max_words, config.chunker_min_words),
            extractor: FactualExtractor::new(client.clone(), config),
            consolidator: SemanticConsolidator::new(client.clone(), config),
            generator: SectionGenerator::new(client, config),
            validator: PipelineValidator::new(config.max_regeneration_attempts),
        }
    }

    /// Run the full pipeline and serialize the outcome.
    ///
    /// Always returns a JSON string: the nine sections plus `_metadata` on
    /// success, `{"erro": "Texto vazio"}` for empty input, or
    /// `{"erro", "pipeline_stage"}` if the run itself fails.
    pub async fn summarize(&self, text: &str) -> String {
        if text.trim().is_empty() {
            return serde_json::json!({"erro": "Texto vazio"}).to_string();
        }

        tracing::info!("{}", "=".repeat(60));
        tracing::info!("ANTI-HALLUCINATION PIPELINE STARTED");
        tracing::info!("{}", "=".repeat(60));

        let result = match self.run(text).await {
            Ok(result) => result,
            Err(e) => {
                tracing::error!("Pipeline failed at {}: {}", e.stage, e.message);
                return serde_json::json!({
                    "erro": e.message,
                    "pipeline_stage": e.stage,
                })
                .to_string();
            }
        };

        tracing::info!("{}", "=".repeat(60));
        tracing::info!("PIPELINE FINISHED in {:.0}ms", result.elapsed_ms);
        tracing::info!("{}", "=".repeat(60));

        match serde_json::to_string_pretty(&result.to_json()) {
            Ok(json) => json,
            Err(e) => serde_json::json!({
                "erro": e.to_string(),
                "pipeline_stage": "serialization",
            })
            .to_string(),
        }
    }

    /// Run all six layers and build the structured result.
    pub async fn run(&self, text: &str) -> Result<PipelineResult, PipelineError> {
        let start = Instant::now();

        // Layer 1: juridical chunking
        let chunks = self.chunker.chunk(text);
        let total_chunks = chunks.len();

        // Layer 2: factual extraction (bounded parallel)
        let extractions = self.extractor.extract_from_chunks(&chunks).await;
        let total_extractions = extractions.len();

        // Layer 3: process memory, written sequentially after the
        // parallel phase so no synchronization is needed
        tracing::info!("Layer 3: building process memory");
        let mut memory = ProcessMemory::new();
        memory.add_extractions(extractions);
        tracing::info!(
            "Layer 3: {} themes, {} events, {} conflicts, {} gaps",
            memory.get_all_themes().len(),
            memory.get_all_events().len(),
            memory.detect_conflicts().len(),
            memory.detect_gaps().len()
        );

        // Layer 4: semantic consolidation
        let consolidated = self.consolidator.consolidate(&memory).await;

        // Layer 5: section generation
        let sections = self.generator.generate_sections(&consolidated, &memory).await;

        // Layer 6: validation with bounded regeneration
        let sections = self
            .validate_and_regenerate(sections, &consolidated, &memory)
            .await;

        Ok(self.build_result(sections, total_chunks, total_extractions, &consolidated, &memory, start))
    }

    /// Validate every section; regenerate failing ones, carrying their
    /// ERROR messages forward, up to the configured attempt cap. The last
    /// produced version is kept either way.
    pub async fn validate_and_regenerate(
        &self,
        mut sections: Vec<SectionResult>,
        consolidated: &[ConsolidatedTheme],
        memory: &ProcessMemory,
    ) -> Vec<SectionResult> {
        let results = self.validator.validate_all_sections(&sections);

        for (section, result) in sections.iter_mut().zip(&results) {
            section.passed_validation = result.passed;
            section.validation_findings = result.findings.clone();
        }

        let to_regenerate = self.validator.get_sections_to_regenerate(&results);
        if to_regenerate.is_empty() {
            tracing::info!("Layer 6: all sections passed validation");
            return sections;
        }

        tracing::info!("Layer 6: {} sections need regeneration", to_regenerate.len());
        let max_attempts = self.validator.max_regeneration_attempts();

        for (name, mut errors) in to_regenerate {
            let Some(slot) = sections.iter_mut().find(|s| s.name == name) else {
                continue;
            };

            for attempt in 1..=max_attempts {
                tracing::info!("Layer 6: regenerating {} (attempt {})", name, attempt);

                let mut regenerated = self
                    .generator
                    .regenerate_section(&name, consolidated, memory, &errors)
                    .await;

                let (passed, findings) = self.validator.validate_section(&regenerated);
                errors = findings
                    .iter()
                    .filter(|f| f.severity == Severity::Error)
                    .map(|f| f.message.clone())
                    .collect();

                regenerated.passed_validation = passed;
                regenerated.validation_findings = findings;
                regenerated.attempts = attempt;
                *slot = regenerated;

                if passed {
                    tracing::info!("Layer 6: {} passed after regeneration", name);
                    break;
                }
            }
        }

        sections
    }

    fn build_result(
        &self,
        sections: Vec<SectionResult>,
        total_chunks: usize,
        total_extractions: usize,
        consolidated: &[ConsolidatedTheme],
        memory: &ProcessMemory,
        start: Instant,
    ) -> PipelineResult {
        let conflicts_found = memory.detect_conflicts().len();

        let mut pendencies: Vec<String> = memory
            .detect_gaps()
            .iter()
            .map(|gap| format!("{}: {}", gap.theme, gap.description))
            .collect();

        for section in &sections {
            if !section.passed_validation {
                for finding in &section.validation_findings {
                    pendencies.push(format!("{}: {}", section.name, finding.message));
                }
            }
        }

        PipelineResult {
            sections,
            total_chunks,
            total_extractions,
            consolidated_themes: consolidated.len(),
            conflicts_found,
            pendencies,
            elapsed_ms: start.elapsed().as_secs_f64() * 1000.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::testing::MockClient;

    #[tokio::test]
    async fn test_empty_input_short_circuits_without_model_calls() {
        let client = Arc::new(MockClient::new(|_| {
            Err(crate::llm::LlmError::Api("must not be called".into()))
        }));
        let summarizer = CaseSummarizer::with_client(&PipelineConfig::default(), client.clone());

        for input in ["", "   ", "\n\t\n"] {
            let output = summarizer.summarize(input).await;
            let json: serde_json::Value = serde_json::from_str(&output).unwrap();
            assert_eq!(json["erro"], "Texto vazio");
        }
        assert_eq!(client.calls(), 0);
    }

    #[test]
    fn test_construction_fails_without_api_key() {
        let config = PipelineConfig {
            api_key: None,
            ..PipelineConfig::default()
        };
        assert!(CaseSummarizer::new(config).is_err());
    }
}
