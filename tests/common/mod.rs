//! Common test utilities for LexBrief integration tests
//!
//! Provides a scripted completion collaborator and fixture case texts so
//! the full pipeline runs without any network access.

use std::sync::atomic::{AtomicU32, Ordering};

use async_trait::async_trait;
use lexbrief::llm::{ChatCompletion, CompletionRequest, LlmError};

type Handler = dyn Fn(&CompletionRequest) -> Result<String, LlmError> + Send + Sync;

/// Scripted completion collaborator with call counting.
pub struct MockCompletion {
    handler: Box<Handler>,
    calls: AtomicU32,
}

impl MockCompletion {
    pub fn new<F>(handler: F) -> Self
    where
        F: Fn(&CompletionRequest) -> Result<String, LlmError> + Send + Sync + 'static,
    {
        Self {
            handler: Box::new(handler),
            calls: AtomicU32::new(0),
        }
    }

    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ChatCompletion for MockCompletion {
    async fn complete(&self, request: &CompletionRequest) -> Result<String, LlmError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        (self.handler)(request)
    }
}

/// Which pipeline layer a request belongs to, judged by its system prompt.
#[derive(Debug, PartialEq, Eq)]
pub enum RequestKind {
    Extraction,
    Consolidation,
    Section,
}

pub fn classify_request(request: &CompletionRequest) -> RequestKind {
    let system = &request.messages[0].content;
    if system.contains("EXTRATOR FACTUAL") {
        RequestKind::Extraction
    } else if system.contains("CONSOLIDADOR SEMANTICO") {
        RequestKind::Consolidation
    } else {
        RequestKind::Section
    }
}

/// Case file with a judgment fixing overtime at 50% (fls. 10) and a
/// payslip stating 40% (fls. 55) - the canonical divergence fixture.
pub fn divergent_case_text() -> String {
    [
        "SENTENÇA",
        "",
        "Julgo parcialmente procedente a reclamacao trabalhista. Condeno a \
         reclamada ao pagamento de horas extras com adicional de 50%, \
         conforme apurado as fls. 10 dos autos.",
        "",
        "HOLERITE",
        "",
        "Recibo de pagamento mensal do reclamante. Horas extras quitadas \
         com adicional de 40%, conforme registro as fls. 55.",
    ]
    .join("\n")
}

pub fn judgment_extraction_json() -> String {
    serde_json::json!({
        "tipo_evento": "sentenca",
        "temas": ["horas_extras"],
        "fatos_literais": [
            "Condeno a reclamada ao pagamento de horas extras com adicional de 50%"
        ],
        "parametros": {"percentual": "50%"},
        "localizacao": "fls. 10"
    })
    .to_string()
}

pub fn payslip_extraction_json() -> String {
    serde_json::json!({
        "tipo_evento": "holerite",
        "temas": ["horas_extras"],
        "fatos_literais": [
            "Horas extras quitadas com adicional de 40%"
        ],
        "parametros": {"percentual": "40%"},
        "localizacao": "fls. 55"
    })
    .to_string()
}

/// Section content that satisfies every validation rule.
pub fn passing_section_json() -> String {
    serde_json::json!({
        "sintese": {"valor": "Horas extras deferidas na sentenca", "fonte": "fls. 10"}
    })
    .to_string()
}

/// Section content that always fails the monetary-value-without-source rule.
pub fn failing_section_json() -> String {
    serde_json::json!({
        "salario_base": {"valor": "R$ 500,00"}
    })
    .to_string()
}
