/*!
 * Document model types for the long-document translation pipeline.
 *
 * The pipeline moves a document through three one-way representations:
 * source pages/blocks supplied by the host, the derived intermediate
 * representation (IR), and translated blocks. Each stage creates new
 * immutable records; nothing is mutated backward.
 */

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Kind of content a source block holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlockType {
    /// Running prose
    Paragraph,
    /// Section heading
    Heading,
    /// Caption referencing a parent figure/table block
    Caption,
    /// A single table cell
    TableCell,
    /// Pure mathematical notation, never translated
    Formula,
}

/// Layout coordinates of a block on its page.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BlockBounds {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

/// One block of a source document page, in reading order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceDocumentBlock {
    /// Stable id assigned by the host
    pub id: String,

    /// Content kind
    pub block_type: BlockType,

    /// Raw block text
    pub text: String,

    /// Parent block for captions (figure/table the caption describes)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,

    /// Layout coordinates, when the host knows them
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bounds: Option<BlockBounds>,
}

impl SourceDocumentBlock {
    /// Create a block
    pub fn new(id: impl Into<String>, block_type: BlockType, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            block_type,
            text: text.into(),
            parent_id: None,
            bounds: None,
        }
    }

    /// Attach the parent block id (captions)
    pub fn with_parent(mut self, parent_id: impl Into<String>) -> Self {
        self.parent_id = Some(parent_id.into());
        self
    }

    /// Attach layout coordinates
    pub fn with_bounds(mut self, bounds: BlockBounds) -> Self {
        self.bounds = Some(bounds);
        self
    }
}

/// One page of a source document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceDocumentPage {
    /// 1-based page number
    pub number: usize,

    /// Whether the page is a scan without extracted text
    #[serde(default)]
    pub is_scanned: bool,

    /// Blocks in reading order
    #[serde(default)]
    pub blocks: Vec<SourceDocumentBlock>,
}

impl SourceDocumentPage {
    /// Create an empty page
    pub fn new(number: usize) -> Self {
        Self { number, is_scanned: false, blocks: Vec::new() }
    }

    /// Mark the page as scanned
    pub fn scanned(mut self) -> Self {
        self.is_scanned = true;
        self
    }

    /// Append a block in reading order
    pub fn with_block(mut self, block: SourceDocumentBlock) -> Self {
        self.blocks.push(block);
        self
    }

    /// Whether the page carries no translatable text at all
    pub fn has_no_text(&self) -> bool {
        self.blocks.iter().all(|block| block.text.trim().is_empty())
    }
}

/// Intermediate representation of one block, derived 1:1 from its source.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentBlockIr {
    /// Page the block belongs to
    pub page_number: usize,

    /// Position within the page's reading order
    pub reading_index: usize,

    /// Stable id carried over from the source block
    pub id: String,

    /// Content kind carried over from the source block
    pub block_type: BlockType,

    /// Block text, possibly with formula placeholders substituted in
    pub text: String,

    /// Parent block for captions
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,

    /// SHA-256 of the source text, for round-trip/no-op detection
    pub content_hash: String,

    /// Whether the translate stage must leave this block untouched
    pub skip_translation: bool,

    /// Placeholder token -> original notation, filled by formula protection
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub placeholders: HashMap<String, String>,
}

impl DocumentBlockIr {
    /// Derive the IR for a source block.
    ///
    /// Pure-formula and textless blocks are pre-marked translation-skipped.
    pub fn from_source(
        page_number: usize,
        reading_index: usize,
        block: &SourceDocumentBlock,
    ) -> Self {
        let skip_translation =
            block.block_type == BlockType::Formula || block.text.trim().is_empty();
        Self {
            page_number,
            reading_index,
            id: block.id.clone(),
            block_type: block.block_type,
            text: block.text.clone(),
            parent_id: block.parent_id.clone(),
            content_hash: content_hash(&block.text),
            skip_translation,
            placeholders: HashMap::new(),
        }
    }

    /// Copy with protected text and its placeholder map.
    ///
    /// When the whole text collapsed to notation, the copy is also marked
    /// translation-skipped.
    pub fn with_protected_text(
        &self,
        text: String,
        placeholders: HashMap<String, String>,
        collapsed_to_notation: bool,
    ) -> Self {
        Self {
            text,
            placeholders,
            skip_translation: self.skip_translation || collapsed_to_notation,
            ..self.clone()
        }
    }
}

/// SHA-256 hex digest of a block's text
pub fn content_hash(text: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Final form of one block: the IR plus the translation outcome.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranslatedDocumentBlock {
    /// The IR this block was translated from
    pub ir: DocumentBlockIr,

    /// Translated text, or the original text when skipped or failed
    pub translated_text: String,

    /// Dispatch attempts that failed before this outcome
    pub retry_count: u32,

    /// Last error message when the retry budget was exhausted
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl TranslatedDocumentBlock {
    /// Record a successful translation
    pub fn succeeded(ir: DocumentBlockIr, translated_text: String, retry_count: u32) -> Self {
        Self { ir, translated_text, retry_count, error: None }
    }

    /// Record a skipped block (the original text is carried through)
    pub fn skipped(ir: DocumentBlockIr) -> Self {
        let translated_text = ir.text.clone();
        Self { ir, translated_text, retry_count: 0, error: None }
    }

    /// Record an exhausted retry budget (the original text is retained)
    pub fn failed(ir: DocumentBlockIr, retry_count: u32, error: String) -> Self {
        let translated_text = ir.text.clone();
        Self { ir, translated_text, retry_count, error: Some(error) }
    }

    /// Whether this block fell back to its original text after failures
    pub fn is_failed(&self) -> bool {
        self.error.is_some()
    }
}

/// Translated blocks of one page, in reading order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranslatedPage {
    /// 1-based page number
    pub number: usize,

    /// Blocks in reading order
    pub blocks: Vec<TranslatedDocumentBlock>,
}

/// Host-supplied options for a pipeline run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineOptions {
    /// Provider to dispatch through; the orchestrator default when absent
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider_id: Option<String>,

    /// Source language of the document, or "auto"
    pub source_language: String,

    /// Target language every block is translated into
    pub target_language: String,

    /// Invoke the injected OCR extractor for scanned pages without blocks
    pub enable_ocr_fallback: bool,

    /// Protect mathematical notation behind placeholders
    pub enable_formula_protection: bool,

    /// Case-insensitive term substitutions applied to translated text
    #[serde(default)]
    pub glossary: HashMap<String, String>,

    /// Per-block retry budget, independent of the orchestrator's
    pub max_block_retries: u32,

    /// Per-request timeout for block dispatches, in milliseconds
    pub timeout_ms: u64,

    /// Upper bound on concurrently translating blocks
    pub max_concurrent_blocks: usize,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            provider_id: None,
            source_language: "auto".to_string(),
            target_language: "en".to_string(),
            enable_ocr_fallback: false,
            enable_formula_protection: true,
            glossary: HashMap::new(),
            max_block_retries: 2,
            timeout_ms: 10_000,
            max_concurrent_blocks: 4,
        }
    }
}

impl PipelineOptions {
    /// Set the provider id
    pub fn with_provider(mut self, provider_id: impl Into<String>) -> Self {
        self.provider_id = Some(provider_id.into());
        self
    }

    /// Set the language pair
    pub fn with_languages(
        mut self,
        source_language: impl Into<String>,
        target_language: impl Into<String>,
    ) -> Self {
        self.source_language = source_language.into();
        self.target_language = target_language.into();
        self
    }

    /// Enable or disable the OCR fallback
    pub fn with_ocr_fallback(mut self, enabled: bool) -> Self {
        self.enable_ocr_fallback = enabled;
        self
    }

    /// Enable or disable formula protection
    pub fn with_formula_protection(mut self, enabled: bool) -> Self {
        self.enable_formula_protection = enabled;
        self
    }

    /// Set the glossary map
    pub fn with_glossary(mut self, glossary: HashMap<String, String>) -> Self {
        self.glossary = glossary;
        self
    }

    /// Set the per-block retry budget
    pub fn with_max_block_retries(mut self, max_block_retries: u32) -> Self {
        self.max_block_retries = max_block_retries;
        self
    }
}

/// Wall-clock duration of each pipeline stage, in milliseconds.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct StageTimings {
    pub ingest_ms: u64,
    pub build_ir_ms: u64,
    pub formula_protection_ms: u64,
    pub translate_ms: u64,
    pub assemble_ms: u64,
}

impl StageTimings {
    /// Sum of all stage durations
    pub fn total_ms(&self) -> u64 {
        self.ingest_ms
            + self.build_ir_ms
            + self.formula_protection_ms
            + self.translate_ms
            + self.assemble_ms
    }
}

/// One block whose retry budget was exhausted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FailedBlock {
    pub page_number: usize,
    pub block_id: String,
    pub retry_count: u32,
    pub error: String,
}

/// Outcome accounting for a pipeline run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct QualityReport {
    /// Blocks that entered the pipeline
    pub total_blocks: usize,

    /// Blocks that were actually translated
    pub translated_blocks: usize,

    /// Blocks carried through untranslated (formulas, empty text)
    pub skipped_blocks: usize,

    /// Blocks that fell back to their original text
    #[serde(default)]
    pub failed_blocks: Vec<FailedBlock>,

    /// Per-stage elapsed time
    pub timings: StageTimings,
}

impl QualityReport {
    /// One-line summary for logs
    pub fn summary(&self) -> String {
        format!(
            "{} blocks | {} translated | {} skipped | {} failed | {}ms total",
            self.total_blocks,
            self.translated_blocks,
            self.skipped_blocks,
            self.failed_blocks.len(),
            self.timings.total_ms()
        )
    }
}

/// Everything a pipeline run produces.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentTranslationResult {
    /// The intermediate representation the run worked from
    pub ir: Vec<DocumentBlockIr>,

    /// Translated blocks grouped by ascending page
    pub pages: Vec<TranslatedPage>,

    /// Structured text rendering of the translated document
    pub rendered: String,

    /// Outcome accounting
    pub report: QualityReport,
}
