//! Pipeline validator (Layer 6)
//! Fixed rule table over generated sections; ERROR findings queue the
//! section for regeneration, WARNINGs are surfaced but never block

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

use crate::json_utils::{has_meaningful_content, visit_objects};
use crate::types::{SectionResult, Severity, ValidationFinding};

static PERCENT_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\d+[,.]?\d*\s*%").unwrap()
});

static CURRENCY_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"R\$\s*[\d.,]+").unwrap()
});

static AMBIGUOUS_DATE_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b\d{1,2}/\d{1,2}/\d{2}\b").unwrap()
});

const ACCESSORY_KEYWORDS: &[&str] = &["reflexos", "repercussao", "incidencia", "integracao"];

const BASE_CLAIM_KEYWORDS: &[&str] = &[
    "horas extras",
    "adicional",
    "ferias",
    "decimo terceiro",
    "fgts",
];

const VAGUE_TERMS: &[&str] = &[
    "possivelmente",
    "provavelmente",
    "talvez",
    "parece que",
    "aparentemente",
    "pode ser que",
    "nao tenho certeza",
    "acredito que",
];

const PLACEHOLDER_VALUE: &str = "nao identificado";

type RuleCheck = fn(&Value) -> Option<String>;

/// One validation rule, scoped to specific sections (`*` = all).
struct ValidationRule {
    name: &'static str,
    severity: Severity,
    applies_to: &'static [&'static str],
    check: RuleCheck,
}

/// The rule table is immutable static data; the validator only carries
/// the regeneration budget.
static RULES: &[ValidationRule] = &[
    ValidationRule {
        name: "campo_sem_localizacao",
        severity: Severity::Error,
        applies_to: &["cabecalho", "parametros_calculo", "resultado_por_pedido"],
        check: check_missing_sources,
    },
    ValidationRule {
        name: "percentual_sem_fonte",
        severity: Severity::Error,
        applies_to: &["parametros_calculo"],
        check: check_percentages_have_source,
    },
    ValidationRule {
        name: "valor_sem_fonte",
        severity: Severity::Error,
        applies_to: &["parametros_calculo", "resultado_por_pedido", "resumo"],
        check: check_currency_has_source,
    },
    ValidationRule {
        name: "reflexo_sem_base",
        severity: Severity::Warning,
        applies_to: &["resultado_por_pedido", "parametros_calculo"],
        check: check_accessory_claims,
    },
    ValidationRule {
        name: "linguagem_vaga",
        severity: Severity::Warning,
        applies_to: &["*"],
        check: check_vague_language,
    },
    ValidationRule {
        name: "data_invalida",
        severity: Severity::Warning,
        applies_to: &["cabecalho", "timeline", "parametros_calculo"],
        check: check_date_formats,
    },
    ValidationRule {
        name: "secao_vazia",
        severity: Severity::Error,
        applies_to: &["*"],
        check: check_not_empty,
    },
];

/// Validation outcome of one section.
#[derive(Debug, Clone)]
pub struct SectionValidation {
    pub section: String,
    pub passed: bool,
    pub findings: Vec<ValidationFinding>,
}

pub struct PipelineValidator {
    max_regeneration_attempts: u32,
}

impl PipelineValidator {
    pub fn new(max_regeneration_attempts: u32) -> Self {
        Self { max_regeneration_attempts }
    }

    pub fn max_regeneration_attempts(&self) -> u32 {
        self.max_regeneration_attempts
    }

    /// Apply every applicable rule. A section passes only with zero
    /// ERROR-severity findings; warnings never block.
    pub fn validate_section(&self, section: &SectionResult) -> (bool, Vec<ValidationFinding>) {
        let mut findings: Vec<ValidationFinding> = Vec::new();

        for rule in RULES {
            let applies = rule.applies_to.contains(&"*")
                || rule.applies_to.contains(&section.name.as_str());
            if !applies {
                continue;
            }

            if let Some(message) = (rule.check)(&section.content) {
                findings.push(ValidationFinding {
                    section: section.name.clone(),
                    rule: rule.name.to_string(),
                    message,
                    severity: rule.severity,
                });
            }
        }

        let has_errors = findings.iter().any(|f| f.severity == Severity::Error);
        (!has_errors, findings)
    }

    /// Validate every section, preserving input order.
    pub fn validate_all_sections(&self, sections: &[SectionResult]) -> Vec<SectionValidation> {
        let mut results: Vec<SectionValidation> = Vec::new();

        for section in sections {
            let (passed, findings) = self.validate_section(section);

            for finding in &findings {
                match finding.severity {
                    Severity::Error => tracing::error!(
                        "Layer 6: {} - {}: {}",
                        section.name,
                        finding.rule,
                        finding.message
                    ),
                    Severity::Warning => tracing::warn!(
                        "Layer 6: {} - {}: {}",
                        section.name,
                        finding.rule,
                        finding.message
                    ),
                }
            }

            results.push(SectionValidation {
                section: section.name.clone(),
                passed,
                findings,
            });
        }

        let passed_count = results.iter().filter(|r| r.passed).count();
        tracing::info!(
            "Layer 6: validation - {}/{} sections passed",
            passed_count,
            results.len()
        );

        results
    }

    /// Failing sections with their ERROR messages, ready to feed back as
    /// corrective context.
    pub fn get_sections_to_regenerate(
        &self,
        results: &[SectionValidation],
    ) -> Vec<(String, Vec<String>)> {
        results
            .iter()
            .filter(|r| !r.passed)
            .map(|r| {
                let errors: Vec<String> = r
                    .findings
                    .iter()
                    .filter(|f| f.severity == Severity::Error)
                    .map(|f| f.message.clone())
                    .collect();
                (r.section.clone(), errors)
            })
            .collect()
    }
}

impl Default for PipelineValidator {
    fn default() -> Self {
        Self::new(2)
    }
}

// ========== Rule checks ==========

fn value_is_meaningful(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::String(s) => !s.trim().is_empty() && s != PLACEHOLDER_VALUE,
        Value::Number(n) => n.as_f64().map_or(true, |f| f != 0.0),
        Value::Bool(b) => *b,
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
    }
}

fn object_has_source(map: &serde_json::Map<String, Value>) -> bool {
    match map.get("fonte") {
        Some(Value::String(s)) => !s.trim().is_empty(),
        Some(Value::Null) | None => false,
        Some(_) => true,
    }
}

/// Any object carrying a real `valor` must carry a `fonte` next to it.
fn check_missing_sources(content: &Value) -> Option<String> {
    let mut missing: Vec<String> = Vec::new();

    visit_objects(content, &mut |map, path| {
        if let Some(valor) = map.get("valor") {
            if value_is_meaningful(valor) && !object_has_source(map) {
                missing.push(if path.is_empty() { "campo".to_string() } else { path.to_string() });
            }
        }
    });

    if missing.is_empty() {
        None
    } else {
        Some(format!("Campos sem fonte: {}", missing[..missing.len().min(3)].join(", ")))
    }
}

/// Percentage strings need a source at the same nesting level.
fn check_percentages_have_source(content: &Value) -> Option<String> {
    let mut missing: Vec<String> = Vec::new();

    visit_objects(content, &mut |map, path| {
        for (key, value) in map {
            if let Value::String(s) = value {
                if PERCENT_PATTERN.is_match(s) && !object_has_source(map) {
                    missing.push(join_path(path, key));
                }
            }
        }
    });

    if missing.is_empty() {
        None
    } else {
        Some(format!("Percentuais sem fonte: {}", missing[..missing.len().min(3)].join(", ")))
    }
}

/// Currency amounts need a source at the same nesting level.
fn check_currency_has_source(content: &Value) -> Option<String> {
    let mut missing: Vec<String> = Vec::new();

    visit_objects(content, &mut |map, path| {
        for (key, value) in map {
            if let Value::String(s) = value {
                if CURRENCY_PATTERN.is_match(s) && !object_has_source(map) {
                    missing.push(join_path(path, key));
                }
            }
        }
    });

    if missing.is_empty() {
        None
    } else {
        Some(format!("Valores sem fonte: {}", missing[..missing.len().min(3)].join(", ")))
    }
}

/// Accessory ("reflexo") claims must co-occur with a base claim.
fn check_accessory_claims(content: &Value) -> Option<String> {
    let text = content.to_string().to_lowercase();

    for keyword in ACCESSORY_KEYWORDS {
        if text.contains(keyword) {
            let has_base = BASE_CLAIM_KEYWORDS.iter().any(|base| text.contains(base));
            if !has_base {
                return Some("Reflexo mencionado sem verba base clara".to_string());
            }
        }
    }

    None
}

fn check_vague_language(content: &Value) -> Option<String> {
    let text = content.to_string().to_lowercase();

    let found: Vec<&str> = VAGUE_TERMS
        .iter()
        .filter(|term| text.contains(**term))
        .copied()
        .collect();

    if found.is_empty() {
        None
    } else {
        Some(format!(
            "Linguagem vaga detectada: {}",
            found[..found.len().min(2)].join(", ")
        ))
    }
}

/// Two-digit-year dates are ambiguous and flagged.
fn check_date_formats(content: &Value) -> Option<String> {
    let text = content.to_string();

    if AMBIGUOUS_DATE_PATTERN.is_match(&text) {
        return Some("Data em formato ambiguo (use DD/MM/AAAA)".to_string());
    }

    None
}

fn check_not_empty(content: &Value) -> Option<String> {
    match content {
        Value::Object(map) if map.is_empty() => return Some("Secao vazia".to_string()),
        Value::Object(map) => {
            if let Some(erro) = map.get("erro") {
                let message = erro.as_str().map_or_else(|| erro.to_string(), str::to_string);
                return Some(format!("Secao com erro: {}", message));
            }
        }
        Value::Null => return Some("Secao vazia".to_string()),
        _ => {}
    }

    if !has_meaningful_content(content) {
        return Some("Secao sem conteudo significativo".to_string());
    }

    None
}

fn join_path(path: &str, key: &str) -> String {
    if path.is_empty() {
        key.to_string()
    } else {
        format!("{}.{}", path, key)
    }
}
