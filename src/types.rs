//! Data types shared across the summarization pipeline
//! Event/theme taxonomies, extraction records, consolidation and section results

use serde::Serialize;
use serde_json::{Map, Value};

/// Category of source document a chunk most likely represents.
///
/// The taxonomy is closed: unrecognized labels map to `Other` instead of
/// failing, so a misbehaving model response can never abort an extraction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum EventType {
    #[serde(rename = "sentenca")]
    Judgment,
    #[serde(rename = "acordao")]
    AppellateDecision,
    #[serde(rename = "laudo")]
    ExpertReport,
    #[serde(rename = "ctps")]
    LaborCard,
    #[serde(rename = "holerite")]
    Payslip,
    #[serde(rename = "peticao_inicial")]
    InitialPetition,
    #[serde(rename = "contestacao")]
    Defense,
    #[serde(rename = "recurso")]
    Appeal,
    #[serde(rename = "despacho")]
    Order,
    #[serde(rename = "calculo")]
    Calculation,
    #[serde(rename = "contrato")]
    Contract,
    #[serde(rename = "documento_pessoal")]
    PersonalDocument,
    #[serde(rename = "ata_audiencia")]
    HearingRecord,
    #[serde(rename = "procuracao")]
    PowerOfAttorney,
    #[serde(rename = "outros")]
    Other,
}

impl EventType {
    /// Wire label as it appears in prompts and in the output JSON.
    pub fn label(self) -> &'static str {
        match self {
            Self::Judgment => "sentenca",
            Self::AppellateDecision => "acordao",
            Self::ExpertReport => "laudo",
            Self::LaborCard => "ctps",
            Self::Payslip => "holerite",
            Self::InitialPetition => "peticao_inicial",
            Self::Defense => "contestacao",
            Self::Appeal => "recurso",
            Self::Order => "despacho",
            Self::Calculation => "calculo",
            Self::Contract => "contrato",
            Self::PersonalDocument => "documento_pessoal",
            Self::HearingRecord => "ata_audiencia",
            Self::PowerOfAttorney => "procuracao",
            Self::Other => "outros",
        }
    }

    /// Total label mapping; anything unrecognized becomes `Other`.
    pub fn from_label(label: &str) -> Self {
        match label.trim() {
            "sentenca" => Self::Judgment,
            "acordao" => Self::AppellateDecision,
            "laudo" => Self::ExpertReport,
            "ctps" => Self::LaborCard,
            "holerite" => Self::Payslip,
            "peticao_inicial" => Self::InitialPetition,
            "contestacao" => Self::Defense,
            "recurso" => Self::Appeal,
            "despacho" => Self::Order,
            "calculo" => Self::Calculation,
            "contrato" => Self::Contract,
            "documento_pessoal" => Self::PersonalDocument,
            "ata_audiencia" => Self::HearingRecord,
            "procuracao" => Self::PowerOfAttorney,
            _ => Self::Other,
        }
    }

    /// Source-authority rank used to resolve conflicting values.
    /// Lower number wins: a judgment overrides a payslip, and so on.
    pub fn priority(self) -> u8 {
        match self {
            Self::Judgment => 1,
            Self::AppellateDecision => 2,
            Self::ExpertReport => 3,
            Self::Calculation => 4,
            Self::LaborCard => 5,
            Self::Payslip => 6,
            Self::Contract => 7,
            Self::InitialPetition => 8,
            Self::Defense => 9,
            Self::Appeal => 10,
            Self::HearingRecord => 11,
            Self::Order => 12,
            Self::PowerOfAttorney => 13,
            Self::PersonalDocument => 14,
            Self::Other => 99,
        }
    }
}

impl std::fmt::Display for EventType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Substantive labor-law topic a fact can be about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum Theme {
    #[serde(rename = "jornada")]
    WorkingHours,
    #[serde(rename = "horas_extras")]
    Overtime,
    #[serde(rename = "adicional_noturno")]
    NightShiftPremium,
    #[serde(rename = "fgts")]
    Fgts,
    #[serde(rename = "multa_fgts")]
    FgtsFine,
    #[serde(rename = "ferias")]
    Vacation,
    #[serde(rename = "decimo_terceiro")]
    ThirteenthSalary,
    #[serde(rename = "aviso_previo")]
    PriorNotice,
    #[serde(rename = "verbas_rescisorias")]
    SeverancePay,
    #[serde(rename = "danos_morais")]
    MoralDamages,
    #[serde(rename = "danos_materiais")]
    MaterialDamages,
    #[serde(rename = "salario")]
    Salary,
    #[serde(rename = "remuneracao")]
    Remuneration,
    #[serde(rename = "vinculo_empregaticio")]
    EmploymentBond,
    #[serde(rename = "intervalo_intrajornada")]
    IntraShiftBreak,
    #[serde(rename = "intervalo_interjornada")]
    InterShiftBreak,
    #[serde(rename = "dsr")]
    WeeklyRest,
    #[serde(rename = "adicional_insalubridade")]
    UnhealthyWorkPremium,
    #[serde(rename = "adicional_periculosidade")]
    HazardPremium,
    #[serde(rename = "equiparacao_salarial")]
    WageEquiparation,
    #[serde(rename = "desvio_funcao")]
    FunctionDeviation,
    #[serde(rename = "acumulo_funcao")]
    FunctionAccumulation,
    #[serde(rename = "estabilidade")]
    JobStability,
    #[serde(rename = "reintegracao")]
    Reinstatement,
    #[serde(rename = "vale_transporte")]
    TransportVoucher,
    #[serde(rename = "vale_alimentacao")]
    MealVoucher,
    #[serde(rename = "plr")]
    ProfitSharing,
    #[serde(rename = "honorarios")]
    AttorneyFees,
    #[serde(rename = "custas")]
    CourtCosts,
    #[serde(rename = "juros")]
    Interest,
    #[serde(rename = "correcao_monetaria")]
    MonetaryCorrection,
    #[serde(rename = "compensacao")]
    Offset,
    #[serde(rename = "prescricao")]
    StatuteOfLimitations,
    #[serde(rename = "outros")]
    Other,
}

impl Theme {
    pub fn label(self) -> &'static str {
        match self {
            Self::WorkingHours => "jornada",
            Self::Overtime => "horas_extras",
            Self::NightShiftPremium => "adicional_noturno",
            Self::Fgts => "fgts",
            Self::FgtsFine => "multa_fgts",
            Self::Vacation => "ferias",
            Self::ThirteenthSalary => "decimo_terceiro",
            Self::PriorNotice => "aviso_previo",
            Self::SeverancePay => "verbas_rescisorias",
            Self::MoralDamages => "danos_morais",
            Self::MaterialDamages => "danos_materiais",
            Self::Salary => "salario",
            Self::Remuneration => "remuneracao",
            Self::EmploymentBond => "vinculo_empregaticio",
            Self::IntraShiftBreak => "intervalo_intrajornada",
            Self::InterShiftBreak => "intervalo_interjornada",
            Self::WeeklyRest => "dsr",
            Self::UnhealthyWorkPremium => "adicional_insalubridade",
            Self::HazardPremium => "adicional_periculosidade",
            Self::WageEquiparation => "equiparacao_salarial",
            Self::FunctionDeviation => "desvio_funcao",
            Self::FunctionAccumulation => "acumulo_funcao",
            Self::JobStability => "estabilidade",
            Self::Reinstatement => "reintegracao",
            Self::TransportVoucher => "vale_transporte",
            Self::MealVoucher => "vale_alimentacao",
            Self::ProfitSharing => "plr",
            Self::AttorneyFees => "honorarios",
            Self::CourtCosts => "custas",
            Self::Interest => "juros",
            Self::MonetaryCorrection => "correcao_monetaria",
            Self::Offset => "compensacao",
            Self::StatuteOfLimitations => "prescricao",
            Self::Other => "outros",
        }
    }

    /// Total label mapping; anything unrecognized becomes `Other`.
    pub fn from_label(label: &str) -> Self {
        match label.trim() {
            "jornada" => Self::WorkingHours,
            "horas_extras" => Self::Overtime,
            "adicional_noturno" => Self::NightShiftPremium,
            "fgts" => Self::Fgts,
            "multa_fgts" => Self::FgtsFine,
            "ferias" => Self::Vacation,
            "decimo_terceiro" => Self::ThirteenthSalary,
            "aviso_previo" => Self::PriorNotice,
            "verbas_rescisorias" => Self::SeverancePay,
            "danos_morais" => Self::MoralDamages,
            "danos_materiais" => Self::MaterialDamages,
            "salario" => Self::Salary,
            "remuneracao" => Self::Remuneration,
            "vinculo_empregaticio" => Self::EmploymentBond,
            "intervalo_intrajornada" => Self::IntraShiftBreak,
            "intervalo_interjornada" => Self::InterShiftBreak,
            "dsr" => Self::WeeklyRest,
            "adicional_insalubridade" => Self::UnhealthyWorkPremium,
            "adicional_periculosidade" => Self::HazardPremium,
            "equiparacao_salarial" => Self::WageEquiparation,
            "desvio_funcao" => Self::FunctionDeviation,
            "acumulo_funcao" => Self::FunctionAccumulation,
            "estabilidade" => Self::JobStability,
            "reintegracao" => Self::Reinstatement,
            "vale_transporte" => Self::TransportVoucher,
            "vale_alimentacao" => Self::MealVoucher,
            "plr" => Self::ProfitSharing,
            "honorarios" => Self::AttorneyFees,
            "custas" => Self::CourtCosts,
            "juros" => Self::Interest,
            "correcao_monetaria" => Self::MonetaryCorrection,
            "compensacao" => Self::Offset,
            "prescricao" => Self::StatuteOfLimitations,
            _ => Self::Other,
        }
    }
}

impl std::fmt::Display for Theme {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Cross-source agreement classification of a consolidated theme.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ConsolidationStatus {
    Confirmed,
    Divergent,
    Pending,
}

impl ConsolidationStatus {
    pub fn label(self) -> &'static str {
        match self {
            Self::Confirmed => "confirmed",
            Self::Divergent => "divergent",
            Self::Pending => "pending",
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        match label.trim() {
            "confirmed" => Some(Self::Confirmed),
            "divergent" => Some(Self::Divergent),
            "pending" => Some(Self::Pending),
            _ => None,
        }
    }
}

/// Severity of a validation rule or detected gap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
}

/// Conflicting values for the same field of a theme, paired primary-first.
#[derive(Debug, Clone, Serialize)]
pub struct Conflict {
    #[serde(rename = "tema")]
    pub theme: Theme,
    #[serde(rename = "campo")]
    pub field: String,
    #[serde(rename = "valor_1")]
    pub primary_value: Value,
    #[serde(rename = "fonte_1")]
    pub primary_source: String,
    #[serde(rename = "valor_2")]
    pub secondary_value: Value,
    #[serde(rename = "fonte_2")]
    pub secondary_source: String,
    #[serde(rename = "resolucao", skip_serializing_if = "Option::is_none")]
    pub resolution: Option<String>,
    #[serde(rename = "fonte_escolhida", skip_serializing_if = "Option::is_none")]
    pub chosen_source: Option<String>,
}

/// A field a theme was expected to carry but never did.
#[derive(Debug, Clone, Serialize)]
pub struct Gap {
    #[serde(rename = "tema")]
    pub theme: Theme,
    #[serde(rename = "campo")]
    pub field: String,
    #[serde(rename = "descricao")]
    pub description: String,
    #[serde(rename = "severidade")]
    pub severity: Severity,
}

/// Literal facts extracted from one chunk, with their source location.
///
/// Immutable once stored in [`crate::memory::ProcessMemory`]. `literal_facts`
/// are verbatim excerpts of the document, never paraphrases.
#[derive(Debug, Clone, Serialize)]
pub struct ChunkExtraction {
    pub chunk_id: String,
    #[serde(rename = "tipo_evento")]
    pub event_type: EventType,
    #[serde(rename = "temas")]
    pub themes: Vec<Theme>,
    #[serde(rename = "fatos_literais")]
    pub literal_facts: Vec<String>,
    #[serde(rename = "parametros")]
    pub parameters: Map<String, Value>,
    #[serde(rename = "localizacao")]
    pub location: String,
    #[serde(skip)]
    pub source_text: String,
    #[serde(rename = "confianca")]
    pub confidence: f64,
}

/// Consolidated view of one theme after cross-source reconciliation.
#[derive(Debug, Clone, Serialize)]
pub struct ConsolidatedTheme {
    #[serde(rename = "tema")]
    pub theme: Theme,
    pub status: ConsolidationStatus,
    #[serde(rename = "parametros_consolidados")]
    pub parameters: Map<String, Value>,
    #[serde(rename = "fontes")]
    pub sources: Vec<String>,
    #[serde(rename = "conflitos")]
    pub conflicts: Vec<Conflict>,
    #[serde(rename = "observacoes")]
    pub notes: String,
}

/// One finding from a validation rule applied to a generated section.
#[derive(Debug, Clone, Serialize)]
pub struct ValidationFinding {
    #[serde(rename = "secao")]
    pub section: String,
    #[serde(rename = "regra")]
    pub rule: String,
    #[serde(rename = "mensagem")]
    pub message: String,
    #[serde(rename = "severidade")]
    pub severity: Severity,
}

/// One of the nine generated summary sections and its validation state.
#[derive(Debug, Clone, Serialize)]
pub struct SectionResult {
    #[serde(rename = "secao")]
    pub name: String,
    #[serde(rename = "conteudo")]
    pub content: Value,
    #[serde(rename = "fontes_utilizadas")]
    pub sources_used: Vec<String>,
    #[serde(rename = "validacao_ok")]
    pub passed_validation: bool,
    #[serde(rename = "erros_validacao")]
    pub validation_findings: Vec<ValidationFinding>,
    #[serde(rename = "tentativas")]
    pub attempts: u32,
}

/// Terminal output of one pipeline run.
#[derive(Debug, Clone)]
pub struct PipelineResult {
    pub sections: Vec<SectionResult>,
    pub total_chunks: usize,
    pub total_extractions: usize,
    pub consolidated_themes: usize,
    pub conflicts_found: usize,
    pub pendencies: Vec<String>,
    pub elapsed_ms: f64,
}

impl PipelineResult {
    /// Final JSON object: one key per section plus a `_metadata` block.
    pub fn to_json(&self) -> Value {
        let mut root = Map::new();

        for section in &self.sections {
            root.insert(section.name.clone(), section.content.clone());
        }

        root.insert(
            "_metadata".to_string(),
            serde_json::json!({
                "total_chunks": self.total_chunks,
                "total_extracoes": self.total_extractions,
                "temas_consolidados": self.consolidated_themes,
                "conflitos_encontrados": self.conflicts_found,
                "pendencias": self.pendencies,
                "tempo_processamento_ms": self.elapsed_ms,
            }),
        );

        Value::Object(root)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_type_label_roundtrip() {
        for label in [
            "sentenca",
            "acordao",
            "laudo",
            "ctps",
            "holerite",
            "peticao_inicial",
            "contestacao",
            "recurso",
            "despacho",
            "calculo",
            "contrato",
            "documento_pessoal",
            "ata_audiencia",
            "procuracao",
            "outros",
        ] {
            assert_eq!(EventType::from_label(label).label(), label);
        }
    }

    #[test]
    fn test_event_type_unknown_maps_to_other() {
        assert_eq!(EventType::from_label("peticao"), EventType::Other);
        assert_eq!(EventType::from_label(""), EventType::Other);
        assert_eq!(EventType::from_label("SENTENCA"), EventType::Other);
    }

    #[test]
    fn test_theme_unknown_maps_to_other() {
        assert_eq!(Theme::from_label("inexistente"), Theme::Other);
        assert_eq!(Theme::from_label("horas_extras"), Theme::Overtime);
    }

    #[test]
    fn test_priority_hierarchy() {
        assert!(EventType::Judgment.priority() < EventType::AppellateDecision.priority());
        assert!(EventType::AppellateDecision.priority() < EventType::ExpertReport.priority());
        assert!(EventType::Payslip.priority() > EventType::Calculation.priority());
        assert_eq!(EventType::Other.priority(), 99);
    }

    #[test]
    fn test_pipeline_result_to_json_has_metadata() {
        let result = PipelineResult {
            sections: vec![SectionResult {
                name: "cabecalho".to_string(),
                content: serde_json::json!({"numero_processo": {"valor": "0001", "fonte": "fls. 1"}}),
                sources_used: vec!["fls. 1".to_string()],
                passed_validation: true,
                validation_findings: vec![],
                attempts: 1,
            }],
            total_chunks: 3,
            total_extractions: 2,
            consolidated_themes: 1,
            conflicts_found: 0,
            pendencies: vec![],
            elapsed_ms: 12.5,
        };

        let json = result.to_json();
        assert!(json.get("cabecalho").is_some());
        let meta = json.get("_metadata").unwrap();
        assert_eq!(meta["total_chunks"], 3);
        assert_eq!(meta["total_extracoes"], 2);
        assert_eq!(meta["temas_consolidados"], 1);
    }

    #[test]
    fn test_serialized_labels_are_wire_names() {
        let json = serde_json::to_string(&EventType::Judgment).unwrap();
        assert_eq!(json, "\"sentenca\"");
        let json = serde_json::to_string(&Theme::Overtime).unwrap();
        assert_eq!(json, "\"horas_extras\"");
        let json = serde_json::to_string(&ConsolidationStatus::Divergent).unwrap();
        assert_eq!(json, "\"divergent\"");
    }
}
