//! Legal-document chunker
//! Splits case files along document boundaries (judgment, expert report,
//! payslip, ...) instead of arbitrary word counts

use once_cell::sync::Lazy;
use regex::Regex;

/// Sentinel location when no page/folio/event reference is found.
pub const UNIDENTIFIED_LOCATION: &str = "nao identificado";

/// Signatures that open a new document inside a case file. Order matters:
/// the first matching pattern for a line wins.
static DOCUMENT_START_PATTERNS: Lazy<Vec<(Regex, &'static str)>> = Lazy::new(|| {
    [
        // Judgments
        (r"(?i)^\s*S\s*E\s*N\s*T\s*E\s*N\s*[CÇ]\s*A", "sentenca"),
        (r"(?i)^\s*VISTOS[,.]?\s*etc\.?", "sentenca"),
        (r"(?i)^\s*RELATÓRIO\s*$", "sentenca"),
        // Appellate decisions
        (r"(?i)^\s*A\s*C\s*[OÓ]\s*R\s*D\s*[AÃ]\s*O", "acordao"),
        (r"(?i)^\s*EMENTA\s*:", "acordao"),
        (r"(?i)^\s*V\s*O\s*T\s*O", "acordao"),
        // Expert reports
        (r"(?i)^\s*LAUDO\s+PERICIAL", "laudo"),
        (r"(?i)^\s*LAUDO\s+T[EÉ]CNICO", "laudo"),
        (r"(?i)^\s*PARECER\s+T[EÉ]CNICO", "laudo"),
        // Petitions and responses
        (r"(?i)^\s*EXCELENT[IÍ]SSIMO", "peticao"),
        (r"(?i)^\s*AO\s+DOUTO\s+JU[IÍ]ZO", "peticao"),
        (r"(?i)^\s*PETI[CÇ][AÃ]O\s+INICIAL", "peticao_inicial"),
        (r"(?i)^\s*CONTESTA[CÇ][AÃ]O", "contestacao"),
        (r"(?i)^\s*RECURSO\s+ORDIN[AÁ]RIO", "recurso"),
        // Calculation statements
        (r"(?i)^\s*C[AÁ]LCULO\s+DE\s+LIQUIDA[CÇ][AÃ]O", "calculo"),
        (r"(?i)^\s*DEMONSTRATIVO\s+DE\s+C[AÁ]LCULO", "calculo"),
        (r"(?i)^\s*MEM[OÓ]RIA\s+DE\s+C[AÁ]LCULO", "calculo"),
        // Contracts
        (r"(?i)^\s*CONTRATO\s+DE\s+TRABALHO", "contrato"),
        (r"(?i)^\s*TERMO\s+DE\s+RESCIS[AÃ]O", "contrato"),
        // Hearing records
        (r"(?i)^\s*ATA\s+DE\s+AUDI[EÊ]NCIA", "ata_audiencia"),
        (r"(?i)^\s*TERMO\s+DE\s+AUDI[EÊ]NCIA", "ata_audiencia"),
        // Labor records
        (r"(?i)^\s*CTPS", "ctps"),
        (r"(?i)^\s*CARTEIRA\s+DE\s+TRABALHO", "ctps"),
        (r"(?i)^\s*HOLERITE", "holerite"),
        (r"(?i)^\s*CONTRACHEQUE", "holerite"),
        (r"(?i)^\s*DEMONSTRATIVO\s+DE\s+PAGAMENTO", "holerite"),
    ]
    .into_iter()
    .map(|(pattern, doc_type)| {
        // Static table, patterns are known-good
        (Regex::new(pattern).unwrap(), doc_type)
    })
    .collect()
});

/// Page/folio/record-event reference conventions, in match-priority order.
static LOCATION_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"(?i)fls?\.\s*\d+",
        r"(?i)fl\.\s*\d+",
        r"(?i)p[aá]gina\s*\d+",
        r"(?i)p[aá]g\.?\s*\d+",
        r"(?i)evento\s*\d+",
        r"(?i)id\.?\s*\d+",
    ]
    .into_iter()
    .map(|pattern| {
        Regex::new(pattern).unwrap()
    })
    .collect()
});

static PARAGRAPH_BREAK: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\n\s*\n").unwrap()
});

static SENTENCE_BOUNDARY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"[.!?]\s+").unwrap()
});

/// One logical slice of the case file, with best-effort metadata.
#[derive(Debug, Clone)]
pub struct LegalChunk {
    pub chunk_id: String,
    pub text: String,
    /// Best-effort document-type label ("sentenca", "holerite", ...).
    pub probable_type: String,
    pub start_location: String,
    pub end_location: String,
    pub word_count: usize,
}

/// Splits case files by legal unit. Deterministic and stateless across
/// calls; only the word bounds live in the instance.
pub struct LegalChunker {
    max_words: usize,
    min_words: usize,
}

impl LegalChunker {
    pub fn new(max_words: usize, min_words: usize) -> Self {
        Self { max_words, min_words }
    }

    /// Split `text` into ordered chunks. Empty input yields an empty list.
    pub fn chunk(&self, text: &str) -> Vec<LegalChunk> {
        if text.trim().is_empty() {
            return Vec::new();
        }

        tracing::debug!("Layer 1: chunking {} characters", text.len());

        let mut chunks = self.split_by_document_markers(text);
        if chunks.len() <= 1 {
            chunks = self.split_by_paragraphs(text);
        }

        let chunks = self.enforce_size_limits(chunks);

        tracing::info!("Layer 1: juridical chunking - {} chunks", chunks.len());
        chunks
    }

    /// Split at document-start markers found at line starts.
    fn split_by_document_markers(&self, text: &str) -> Vec<LegalChunk> {
        let mut markers: Vec<(usize, &'static str)> = Vec::new();
        let mut pos = 0usize;

        for line in text.split('\n') {
            for (pattern, doc_type) in DOCUMENT_START_PATTERNS.iter() {
                if pattern.is_match(line) {
                    markers.push((pos, doc_type));
                    break;
                }
            }
            pos += line.len() + 1;
        }

        if markers.is_empty() {
            return vec![self.make_chunk("chunk_0", text, "outros")];
        }

        let mut chunks: Vec<LegalChunk> = Vec::new();

        // Text before the first marker is still part of the record
        let preamble = text[..markers[0].0].trim();
        if count_words(preamble) >= self.min_words {
            let doc_type = detect_document_type(preamble);
            chunks.push(self.make_chunk("chunk_pre", preamble, doc_type));
        }

        for (i, &(start, doc_type)) in markers.iter().enumerate() {
            let end = markers.get(i + 1).map_or(text.len(), |m| m.0);
            let chunk_text = text[start..end].trim();

            if count_words(chunk_text) >= self.min_words {
                let id = format!("chunk_{}", i);
                chunks.push(self.make_chunk(&id, chunk_text, doc_type));
            }
        }

        chunks
    }

    /// Fallback: accumulate paragraphs up to the word limit. A single
    /// paragraph larger than the limit is re-split at sentence boundaries
    /// before accumulation.
    fn split_by_paragraphs(&self, text: &str) -> Vec<LegalChunk> {
        let mut units: Vec<&str> = Vec::new();
        for para in PARAGRAPH_BREAK.split(text) {
            let para = para.trim();
            if para.is_empty() {
                continue;
            }
            if count_words(para) > self.max_words {
                units.extend(split_sentences(para));
            } else {
                units.push(para);
            }
        }

        let mut chunks: Vec<LegalChunk> = Vec::new();
        let mut current: Vec<&str> = Vec::new();
        let mut current_words = 0usize;
        let mut index = 0usize;

        for unit in units {
            let unit_words = count_words(unit);

            if current_words + unit_words > self.max_words && !current.is_empty() {
                chunks.push(self.flush_paragraph_chunk(index, &current));
                index += 1;
                current = vec![unit];
                current_words = unit_words;
            } else {
                current.push(unit);
                current_words += unit_words;
            }
        }

        if !current.is_empty() {
            chunks.push(self.flush_paragraph_chunk(index, &current));
        }

        chunks
    }

    fn flush_paragraph_chunk(&self, index: usize, parts: &[&str]) -> LegalChunk {
        let text = parts.join("\n\n");
        let doc_type = detect_document_type(&text);
        self.make_chunk(&format!("chunk_{}", index), &text, doc_type)
    }

    /// Re-split oversized chunks on fixed word windows and renumber all
    /// chunk IDs sequentially.
    fn enforce_size_limits(&self, chunks: Vec<LegalChunk>) -> Vec<LegalChunk> {
        let mut result: Vec<LegalChunk> = Vec::new();

        for chunk in chunks {
            if chunk.word_count <= self.max_words {
                result.push(chunk);
            } else {
                result.extend(self.split_large_chunk(&chunk));
            }
        }

        for (i, chunk) in result.iter_mut().enumerate() {
            chunk.chunk_id = format!("chunk_{}", i);
        }

        result
    }

    fn split_large_chunk(&self, chunk: &LegalChunk) -> Vec<LegalChunk> {
        let words: Vec<&str> = chunk.text.split_whitespace().collect();

        words
            .chunks(self.max_words)
            .enumerate()
            .map(|(i, window)| {
                let sub_text = window.join(" ");
                LegalChunk {
                    chunk_id: format!("{}_{}", chunk.chunk_id, i),
                    word_count: count_words(&sub_text),
                    text: sub_text,
                    probable_type: chunk.probable_type.clone(),
                    start_location: chunk.start_location.clone(),
                    end_location: chunk.end_location.clone(),
                }
            })
            .collect()
    }

    fn make_chunk(&self, chunk_id: &str, text: &str, probable_type: &str) -> LegalChunk {
        LegalChunk {
            chunk_id: chunk_id.to_string(),
            probable_type: probable_type.to_string(),
            start_location: extract_location(char_prefix(text, 500)),
            end_location: extract_location(char_suffix(text, 500)),
            word_count: count_words(text),
            text: text.to_string(),
        }
    }
}

/// Best-effort document-type label for an unmarked chunk: marker patterns
/// against the opening, then full-text phrase heuristics.
fn detect_document_type(text: &str) -> &'static str {
    let head = char_prefix(text, 1000);
    for (pattern, doc_type) in DOCUMENT_START_PATTERNS.iter() {
        if pattern.is_match(head) {
            return doc_type;
        }
    }

    let lower = text.to_lowercase();
    if lower.contains("julgo procedente") || lower.contains("julgo improcedente") {
        return "sentenca";
    }
    if lower.contains("acordam os") || lower.contains("dou provimento") {
        return "acordao";
    }
    if lower.contains("perito") && lower.contains("laudo") {
        return "laudo";
    }
    if lower.contains("admissao") && lower.contains("demissao") {
        return "ctps";
    }
    if lower.contains("liquido a receber") || lower.contains("valor bruto") {
        return "holerite";
    }

    "outros"
}

/// First page/folio/event reference in the text, or the sentinel.
fn extract_location(text: &str) -> String {
    for pattern in LOCATION_PATTERNS.iter() {
        if let Some(m) = pattern.find(text) {
            return m.as_str().to_string();
        }
    }
    UNIDENTIFIED_LOCATION.to_string()
}

fn count_words(text: &str) -> usize {
    text.split_whitespace().count()
}

/// Punctuation-delimited sentences, boundary punctuation kept.
fn split_sentences(text: &str) -> Vec<&str> {
    let mut sentences: Vec<&str> = Vec::new();
    let mut last = 0usize;

    for m in SENTENCE_BOUNDARY.find_iter(text) {
        let sentence = text[last..m.end()].trim();
        if !sentence.is_empty() {
            sentences.push(sentence);
        }
        last = m.end();
    }

    let tail = text[last..].trim();
    if !tail.is_empty() {
        sentences.push(tail);
    }

    sentences
}

/// First `n` characters as a str slice, UTF-8 safe.
fn char_prefix(text: &str, n: usize) -> &str {
    match text.char_indices().nth(n) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

/// Last `n` characters as a str slice, UTF-8 safe.
fn char_suffix(text: &str, n: usize) -> &str {
    let total = text.chars().count();
    if total <= n {
        return text;
    }
    match text.char_indices().nth(total - n) {
        Some((idx, _)) => &text[idx..],
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn words(n: usize) -> String {
        (0..n).map(|i| format!("palavra{}", i)).collect::<Vec<_>>().join(" ")
    }

    #[test]
    fn test_empty_input_yields_no_chunks() {
        let chunker = LegalChunker::new(3000, 100);
        assert!(chunker.chunk("").is_empty());
        assert!(chunker.chunk("   \n\n  ").is_empty());
    }

    #[test]
    fn test_split_by_markers() {
        let chunker = LegalChunker::new(3000, 5);
        let text = format!(
            "SENTENÇA\n\nJulgo procedente o pedido. {}\n\nHOLERITE\n\nDemonstrativo mensal. {}",
            words(20),
            words(20)
        );

        let chunks = chunker.chunk(&text);
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].probable_type, "sentenca");
        assert_eq!(chunks[1].probable_type, "holerite");
        assert_eq!(chunks[0].chunk_id, "chunk_0");
        assert_eq!(chunks[1].chunk_id, "chunk_1");
    }

    #[test]
    fn test_marker_case_insensitive_unicode() {
        let chunker = LegalChunker::new(3000, 3);
        let text = format!(
            "Sentença\n\n{}\n\ncontestação\n\n{}",
            words(10),
            words(10)
        );
        let chunks = chunker.chunk(&text);
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].probable_type, "sentenca");
        assert_eq!(chunks[1].probable_type, "contestacao");
    }

    #[test]
    fn test_preamble_before_first_marker_is_kept() {
        let chunker = LegalChunker::new(3000, 5);
        let preamble = words(15);
        let text = format!("{}\n\nSENTENÇA\n\nJulgo procedente. {}", preamble, words(20));

        let chunks = chunker.chunk(&text);
        assert_eq!(chunks.len(), 2);
        assert!(chunks[0].text.starts_with("palavra0"));
        assert_eq!(chunks[1].probable_type, "sentenca");

        // Every input word is represented by some chunk
        let total: usize = chunks.iter().map(|c| c.word_count).sum();
        assert_eq!(total, count_words(&text));
    }

    #[test]
    fn test_candidates_below_min_words_are_discarded() {
        let chunker = LegalChunker::new(3000, 10);
        // The holerite section is too short to stand as its own chunk
        let text = format!(
            "SENTENÇA\n\n{}\n\nHOLERITE\n\ncurta\n\nCONTESTAÇÃO\n\n{}",
            words(30),
            words(30)
        );
        let chunks = chunker.chunk(&text);
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].probable_type, "sentenca");
        assert_eq!(chunks[1].probable_type, "contestacao");
    }

    #[test]
    fn test_paragraph_fallback_respects_max_words() {
        let chunker = LegalChunker::new(50, 1);
        let paragraphs: Vec<String> = (0..6).map(|_| words(20)).collect();
        let text = paragraphs.join("\n\n");

        let chunks = chunker.chunk(&text);
        assert!(chunks.len() > 1);
        for chunk in &chunks {
            assert!(chunk.word_count <= 50, "chunk exceeds limit: {}", chunk.word_count);
        }

        let total: usize = chunks.iter().map(|c| c.word_count).sum();
        assert_eq!(total, count_words(&text), "paragraph chunks must cover the input");
    }

    #[test]
    fn test_giant_single_paragraph_splits_on_sentences() {
        let chunker = LegalChunker::new(30, 1);
        let text = (0..10)
            .map(|_| format!("{}.", words(12)))
            .collect::<Vec<_>>()
            .join(" ");

        let chunks = chunker.chunk(&text);
        assert!(chunks.len() > 1);
        for chunk in &chunks {
            assert!(chunk.word_count <= 30);
        }
    }

    #[test]
    fn test_oversized_chunk_is_window_split_and_renumbered() {
        let chunker = LegalChunker::new(40, 5);
        let text = format!("SENTENÇA\n{}\n\nHOLERITE\n{}", words(100), words(20));

        let chunks = chunker.chunk(&text);
        assert!(chunks.len() >= 3);
        for (i, chunk) in chunks.iter().enumerate() {
            assert_eq!(chunk.chunk_id, format!("chunk_{}", i));
            assert!(chunk.word_count <= 40);
        }
        // Window sub-chunks keep the original type label
        assert!(chunks[..chunks.len() - 1].iter().all(|c| c.probable_type == "sentenca"));
    }

    #[test]
    fn test_location_extraction() {
        assert_eq!(extract_location("conforme fls. 123 dos autos"), "fls. 123");
        assert_eq!(extract_location("vide página 45"), "página 45");
        assert_eq!(extract_location("no evento 12 do PJe"), "evento 12");
        assert_eq!(extract_location("sem referencia"), UNIDENTIFIED_LOCATION);
    }

    #[test]
    fn test_detect_type_by_phrase() {
        assert_eq!(detect_document_type("No merito, julgo procedente o pedido."), "sentenca");
        assert_eq!(detect_document_type("Acordam os desembargadores..."), "acordao");
        assert_eq!(detect_document_type("O perito apresentou o laudo."), "laudo");
        assert_eq!(detect_document_type("valor bruto: R$ 3.000,00"), "holerite");
        assert_eq!(detect_document_type("texto qualquer"), "outros");
    }

    #[test]
    fn test_char_prefix_suffix_utf8() {
        let text = "ação";
        assert_eq!(char_prefix(text, 2), "aç");
        assert_eq!(char_suffix(text, 2), "ão");
        assert_eq!(char_prefix(text, 10), text);
        assert_eq!(char_suffix(text, 10), text);
    }
}
