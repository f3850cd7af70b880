//! Process memory
//! Indexed store of all extractions from one run: lookup by theme and
//! event type, conflict detection via source priority, gap detection

use std::collections::{BTreeMap, BTreeSet};

use serde_json::{Map, Value};

use crate::types::{ChunkExtraction, Conflict, EventType, Gap, Severity, Theme};

/// One recorded parameter value with its provenance.
#[derive(Debug, Clone)]
struct ParamObservation {
    value: Value,
    location: String,
    event_type: EventType,
}

/// Fields a theme is semantically required to carry. A missing `percentual`
/// on overtime blocks downstream calculation, hence ERROR severity.
const EXPECTED_FIELDS: &[(Theme, &[(&str, &str, Severity)])] = &[
    (
        Theme::Overtime,
        &[
            ("percentual", "Percentual de horas extras", Severity::Error),
            ("periodo", "Periodo de apuracao", Severity::Warning),
        ],
    ),
    (
        Theme::WorkingHours,
        &[
            ("horario_entrada", "Horario de entrada", Severity::Warning),
            ("horario_saida", "Horario de saida", Severity::Warning),
        ],
    ),
    (
        Theme::Fgts,
        &[
            ("percentual", "Percentual do FGTS", Severity::Warning),
            ("periodo", "Periodo de deposito", Severity::Warning),
        ],
    ),
    (
        Theme::NightShiftPremium,
        &[("percentual", "Percentual do adicional noturno", Severity::Error)],
    ),
    (Theme::Salary, &[("valor", "Valor do salario", Severity::Error)]),
    (
        Theme::EmploymentBond,
        &[
            ("data_admissao", "Data de admissao", Severity::Error),
            ("data_demissao", "Data de demissao", Severity::Warning),
        ],
    ),
];

/// Aggregate statistics over the accumulated extractions.
#[derive(Debug, Clone)]
pub struct MemorySummary {
    pub total_extractions: usize,
    pub themes: Vec<Theme>,
    pub events: Vec<EventType>,
    pub extractions_per_theme: BTreeMap<Theme, usize>,
    pub extractions_per_event: BTreeMap<EventType, usize>,
}

/// Accumulates every extraction of one pipeline run (Layer 3).
///
/// Writes are append-only and happen sequentially after the parallel
/// extraction phase; every query is a pure read over the accumulated
/// state. One instance belongs to exactly one run.
#[derive(Debug, Default)]
pub struct ProcessMemory {
    extractions: Vec<ChunkExtraction>,
    by_theme: BTreeMap<Theme, Vec<usize>>,
    by_event: BTreeMap<EventType, Vec<usize>>,
    parameter_index: BTreeMap<Theme, BTreeMap<String, Vec<ParamObservation>>>,
}

impl ProcessMemory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one extraction and update all indexes.
    pub fn add_extraction(&mut self, extraction: ChunkExtraction) {
        let index = self.extractions.len();

        for theme in &extraction.themes {
            self.by_theme.entry(*theme).or_default().push(index);

            let fields = self.parameter_index.entry(*theme).or_default();
            for (key, value) in &extraction.parameters {
                fields.entry(key.clone()).or_default().push(ParamObservation {
                    value: value.clone(),
                    location: extraction.location.clone(),
                    event_type: extraction.event_type,
                });
            }
        }

        self.by_event
            .entry(extraction.event_type)
            .or_default()
            .push(index);

        self.extractions.push(extraction);
    }

    pub fn add_extractions(&mut self, extractions: Vec<ChunkExtraction>) {
        for extraction in extractions {
            self.add_extraction(extraction);
        }
    }

    pub fn len(&self) -> usize {
        self.extractions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.extractions.is_empty()
    }

    pub fn get_by_theme(&self, theme: Theme) -> Vec<&ChunkExtraction> {
        self.by_theme
            .get(&theme)
            .map(|indexes| indexes.iter().map(|&i| &self.extractions[i]).collect())
            .unwrap_or_default()
    }

    pub fn get_by_event(&self, event_type: EventType) -> Vec<&ChunkExtraction> {
        self.by_event
            .get(&event_type)
            .map(|indexes| indexes.iter().map(|&i| &self.extractions[i]).collect())
            .unwrap_or_default()
    }

    pub fn get_all_themes(&self) -> BTreeSet<Theme> {
        self.by_theme.keys().copied().collect()
    }

    pub fn get_all_events(&self) -> BTreeSet<EventType> {
        self.by_event.keys().copied().collect()
    }

    /// Conflicting parameter values across sources of the same theme.
    ///
    /// Values are normalized, grouped, and the groups ordered by the
    /// source-priority of their first observation; one conflict is emitted
    /// per non-primary group, paired against the primary value.
    pub fn detect_conflicts(&self) -> Vec<Conflict> {
        let mut conflicts: Vec<Conflict> = Vec::new();

        for (theme, fields) in &self.parameter_index {
            for (field, observations) in fields {
                if observations.len() < 2 {
                    continue;
                }

                let groups = group_by_normalized(observations);
                if groups.len() < 2 {
                    continue;
                }

                let mut groups = groups;
                groups.sort_by_key(|group| group[0].event_type.priority());

                let primary = groups[0][0];
                for group in &groups[1..] {
                    let secondary = group[0];
                    conflicts.push(Conflict {
                        theme: *theme,
                        field: field.clone(),
                        primary_value: primary.value.clone(),
                        primary_source: primary.location.clone(),
                        secondary_value: secondary.value.clone(),
                        secondary_source: secondary.location.clone(),
                        resolution: Some(format!(
                            "Preferencia: {} > {}",
                            primary.event_type, secondary.event_type
                        )),
                        chosen_source: Some(primary.location.clone()),
                    });
                }
            }
        }

        conflicts
    }

    /// Expected fields that never showed up for a theme present in memory.
    pub fn detect_gaps(&self) -> Vec<Gap> {
        let mut gaps: Vec<Gap> = Vec::new();

        for (theme, fields) in EXPECTED_FIELDS {
            let Some(recorded) = self.parameter_index.get(theme) else {
                continue;
            };

            for (field, description, severity) in *fields {
                let missing = recorded.get(*field).map_or(true, Vec::is_empty);
                if missing {
                    gaps.push(Gap {
                        theme: *theme,
                        field: (*field).to_string(),
                        description: format!("{} nao encontrado(a)", description),
                        severity: *severity,
                    });
                }
            }
        }

        gaps
    }

    /// Parameter view of a theme with every field resolved to the value
    /// from its highest-authority source.
    pub fn get_parameters_by_theme(&self, theme: Theme) -> Map<String, Value> {
        let mut resolved = Map::new();

        let Some(fields) = self.parameter_index.get(&theme) else {
            return resolved;
        };

        for (field, observations) in fields {
            let best = observations
                .iter()
                .min_by_key(|obs| obs.event_type.priority());
            if let Some(best) = best {
                resolved.insert(field.clone(), best.value.clone());
            }
        }

        resolved
    }

    /// Distinct source locations of a theme, in extraction order.
    pub fn get_sources_by_theme(&self, theme: Theme) -> Vec<String> {
        let mut sources: Vec<String> = Vec::new();
        for extraction in self.get_by_theme(theme) {
            if !extraction.location.is_empty() && !sources.contains(&extraction.location) {
                sources.push(extraction.location.clone());
            }
        }
        sources
    }

    /// Every literal fact recorded for a theme.
    pub fn get_facts_by_theme(&self, theme: Theme) -> Vec<String> {
        self.get_by_theme(theme)
            .iter()
            .flat_map(|extraction| extraction.literal_facts.iter().cloned())
            .collect()
    }

    pub fn summary(&self) -> MemorySummary {
        MemorySummary {
            total_extractions: self.extractions.len(),
            themes: self.by_theme.keys().copied().collect(),
            events: self.by_event.keys().copied().collect(),
            extractions_per_theme: self
                .by_theme
                .iter()
                .map(|(theme, indexes)| (*theme, indexes.len()))
                .collect(),
            extractions_per_event: self
                .by_event
                .iter()
                .map(|(event, indexes)| (*event, indexes.len()))
                .collect(),
        }
    }

    /// Drop everything, indexes included.
    pub fn clear(&mut self) {
        self.extractions.clear();
        self.by_theme.clear();
        self.by_event.clear();
        self.parameter_index.clear();
    }
}

/// Group observations whose normalized values are equal, preserving
/// first-seen order of both groups and members.
fn group_by_normalized(observations: &[ParamObservation]) -> Vec<Vec<&ParamObservation>> {
    let mut keys: Vec<String> = Vec::new();
    let mut groups: Vec<Vec<&ParamObservation>> = Vec::new();

    for obs in observations {
        let key = normalize_value(&obs.value);
        match keys.iter().position(|k| *k == key) {
            Some(i) => groups[i].push(obs),
            None => {
                keys.push(key);
                groups.push(vec![obs]);
            }
        }
    }

    groups
}

/// Comparison key for a parameter value: trimmed/lowercased strings,
/// stringified numbers.
fn normalize_value(value: &Value) -> String {
    match value {
        Value::Null => "none".to_string(),
        Value::String(s) => s.trim().to_lowercase(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        other => other.to_string().to_lowercase(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn extraction(
        chunk_id: &str,
        event_type: EventType,
        themes: &[Theme],
        parameters: &[(&str, Value)],
        location: &str,
    ) -> ChunkExtraction {
        let mut params = Map::new();
        for (key, value) in parameters {
            params.insert((*key).to_string(), value.clone());
        }
        ChunkExtraction {
            chunk_id: chunk_id.to_string(),
            event_type,
            themes: themes.to_vec(),
            literal_facts: vec![format!("fato de {}", chunk_id)],
            parameters: params,
            location: location.to_string(),
            source_text: String::new(),
            confidence: 1.0,
        }
    }

    #[test]
    fn test_indexes_by_theme_and_event() {
        let mut memory = ProcessMemory::new();
        memory.add_extraction(extraction(
            "chunk_0",
            EventType::Judgment,
            &[Theme::Overtime, Theme::Salary],
            &[],
            "fls. 10",
        ));
        memory.add_extraction(extraction(
            "chunk_1",
            EventType::Payslip,
            &[Theme::Overtime],
            &[],
            "fls. 55",
        ));

        assert_eq!(memory.get_by_theme(Theme::Overtime).len(), 2);
        assert_eq!(memory.get_by_theme(Theme::Salary).len(), 1);
        assert_eq!(memory.get_by_event(EventType::Judgment).len(), 1);
        assert_eq!(memory.get_all_themes().len(), 2);
        assert_eq!(memory.get_all_events().len(), 2);
    }

    #[test]
    fn test_conflict_primary_follows_priority() {
        let mut memory = ProcessMemory::new();
        // Payslip first: insertion order must not decide the primary value
        memory.add_extraction(extraction(
            "chunk_1",
            EventType::Payslip,
            &[Theme::Overtime],
            &[("percentual", json!("40%"))],
            "fls. 55",
        ));
        memory.add_extraction(extraction(
            "chunk_0",
            EventType::Judgment,
            &[Theme::Overtime],
            &[("percentual", json!("50%"))],
            "fls. 10",
        ));

        let conflicts = memory.detect_conflicts();
        assert_eq!(conflicts.len(), 1);
        let conflict = &conflicts[0];
        assert_eq!(conflict.theme, Theme::Overtime);
        assert_eq!(conflict.field, "percentual");
        assert_eq!(conflict.primary_value, json!("50%"));
        assert_eq!(conflict.primary_source, "fls. 10");
        assert_eq!(conflict.secondary_value, json!("40%"));
        assert_eq!(conflict.secondary_source, "fls. 55");
        assert_eq!(conflict.chosen_source.as_deref(), Some("fls. 10"));
    }

    #[test]
    fn test_no_conflict_when_values_agree_after_normalization() {
        let mut memory = ProcessMemory::new();
        memory.add_extraction(extraction(
            "chunk_0",
            EventType::Judgment,
            &[Theme::Overtime],
            &[("percentual", json!("50%"))],
            "fls. 10",
        ));
        memory.add_extraction(extraction(
            "chunk_1",
            EventType::Payslip,
            &[Theme::Overtime],
            &[("percentual", json!("  50%  "))],
            "fls. 55",
        ));

        assert!(memory.detect_conflicts().is_empty());
    }

    #[test]
    fn test_three_way_conflict_pairs_against_primary() {
        let mut memory = ProcessMemory::new();
        for (id, event, pct, loc) in [
            ("chunk_0", EventType::Payslip, "40%", "fls. 55"),
            ("chunk_1", EventType::Judgment, "50%", "fls. 10"),
            ("chunk_2", EventType::InitialPetition, "60%", "fls. 2"),
        ] {
            memory.add_extraction(extraction(
                id,
                event,
                &[Theme::Overtime],
                &[("percentual", json!(pct))],
                loc,
            ));
        }

        let conflicts = memory.detect_conflicts();
        assert_eq!(conflicts.len(), 2);
        for conflict in &conflicts {
            assert_eq!(conflict.primary_value, json!("50%"));
            assert_eq!(conflict.primary_source, "fls. 10");
        }
    }

    #[test]
    fn test_gap_detection_missing_percentual() {
        let mut memory = ProcessMemory::new();
        memory.add_extraction(extraction(
            "chunk_0",
            EventType::Judgment,
            &[Theme::Overtime],
            &[("periodo", json!("2020-2022"))],
            "fls. 10",
        ));

        let gaps = memory.detect_gaps();
        let overtime_errors: Vec<&Gap> = gaps
            .iter()
            .filter(|g| g.theme == Theme::Overtime && g.severity == Severity::Error)
            .collect();
        assert_eq!(overtime_errors.len(), 1);
        assert_eq!(overtime_errors[0].field, "percentual");
    }

    #[test]
    fn test_gap_detection_ignores_absent_themes() {
        let mut memory = ProcessMemory::new();
        memory.add_extraction(extraction(
            "chunk_0",
            EventType::Judgment,
            &[Theme::MoralDamages],
            &[("valor_condenacao", json!("R$ 5.000,00"))],
            "fls. 10",
        ));

        // No expected-field table entry for moral damages, no gaps
        assert!(memory.detect_gaps().is_empty());
    }

    #[test]
    fn test_parameters_resolved_by_priority() {
        let mut memory = ProcessMemory::new();
        memory.add_extraction(extraction(
            "chunk_0",
            EventType::Payslip,
            &[Theme::Salary],
            &[("valor", json!("R$ 1.900,00"))],
            "fls. 55",
        ));
        memory.add_extraction(extraction(
            "chunk_1",
            EventType::Judgment,
            &[Theme::Salary],
            &[("valor", json!("R$ 2.000,00"))],
            "fls. 10",
        ));

        let params = memory.get_parameters_by_theme(Theme::Salary);
        assert_eq!(params.get("valor"), Some(&json!("R$ 2.000,00")));
    }

    #[test]
    fn test_sources_and_facts_by_theme() {
        let mut memory = ProcessMemory::new();
        memory.add_extraction(extraction(
            "chunk_0",
            EventType::Judgment,
            &[Theme::Overtime],
            &[],
            "fls. 10",
        ));
        memory.add_extraction(extraction(
            "chunk_1",
            EventType::Payslip,
            &[Theme::Overtime],
            &[],
            "fls. 10",
        ));

        assert_eq!(memory.get_sources_by_theme(Theme::Overtime), vec!["fls. 10"]);
        assert_eq!(memory.get_facts_by_theme(Theme::Overtime).len(), 2);
    }

    #[test]
    fn test_clear_resets_everything() {
        let mut memory = ProcessMemory::new();
        memory.add_extraction(extraction(
            "chunk_0",
            EventType::Judgment,
            &[Theme::Overtime],
            &[("percentual", json!("50%"))],
            "fls. 10",
        ));
        memory.clear();

        assert!(memory.is_empty());
        assert!(memory.get_all_themes().is_empty());
        assert!(memory.detect_conflicts().is_empty());
        assert!(memory.get_parameters_by_theme(Theme::Overtime).is_empty());
    }

    #[test]
    fn test_normalize_value() {
        assert_eq!(normalize_value(&json!("  50%  ")), "50%");
        assert_eq!(normalize_value(&json!("ABC")), "abc");
        assert_eq!(normalize_value(&json!(42)), "42");
        assert_eq!(normalize_value(&Value::Null), "none");
    }
}
