/*!
 * Long-document translation pipeline.
 *
 * Reuses the orchestrator to translate a paginated, block-structured
 * document in five independently timed stages: ingest, IR construction,
 * formula protection, per-block translation, and structured assembly.
 * Block failures never abort the document - a block that exhausts its
 * retry budget keeps its original text and is listed in the quality
 * report.
 */

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::time::Instant;

use futures::stream::{self, StreamExt};
use log::{debug, warn};
use regex::Regex;
use tokio::sync::Semaphore;
use uuid::Uuid;

use crate::document::formula;
use crate::document::model::{
    BlockType, DocumentBlockIr, DocumentTranslationResult, FailedBlock, PipelineOptions,
    QualityReport, SourceDocumentBlock, SourceDocumentPage, StageTimings, TranslatedDocumentBlock,
    TranslatedPage,
};
use crate::errors::TranslationError;
use crate::translation::core::TranslationOrchestrator;
use crate::translation::types::TranslationRequest;

/// Host-injected OCR extractor: recognizes text on a scanned page.
///
/// The extractor is an external collaborator; its errors are opaque to the
/// pipeline and only downgrade the page to "no text".
pub type OcrExtractor =
    Arc<dyn Fn(&SourceDocumentPage) -> anyhow::Result<Option<String>> + Send + Sync>;

/// The long-document translation pipeline.
pub struct DocumentPipeline {
    orchestrator: Arc<TranslationOrchestrator>,
    options: PipelineOptions,
    ocr_extractor: Option<OcrExtractor>,
}

impl DocumentPipeline {
    /// Create a pipeline over a shared orchestrator
    pub fn new(orchestrator: Arc<TranslationOrchestrator>, options: PipelineOptions) -> Self {
        Self { orchestrator, options, ocr_extractor: None }
    }

    /// Inject the OCR extractor used by the ingest stage
    pub fn with_ocr_extractor(mut self, extractor: OcrExtractor) -> Self {
        self.ocr_extractor = Some(extractor);
        self
    }

    /// The options this pipeline runs with
    pub fn options(&self) -> &PipelineOptions {
        &self.options
    }

    /// Translate a document.
    ///
    /// # Errors
    /// `UnknownProvider` when the configured provider id is not registered;
    /// every other failure is absorbed per block and reported in the
    /// quality report.
    pub async fn run(
        &self,
        pages: &[SourceDocumentPage],
    ) -> Result<DocumentTranslationResult, TranslationError> {
        // Fail fast on a misconfigured provider instead of recording the
        // same failure once per block.
        self.orchestrator.resolve(self.options.provider_id.as_deref())?;

        let mut timings = StageTimings::default();

        let started = Instant::now();
        let pages = self.ingest(pages);
        timings.ingest_ms = elapsed_ms(started);

        let started = Instant::now();
        let ir = Self::build_ir(&pages);
        timings.build_ir_ms = elapsed_ms(started);

        let started = Instant::now();
        let ir = if self.options.enable_formula_protection {
            Self::protect_formulas(ir)
        } else {
            ir
        };
        timings.formula_protection_ms = elapsed_ms(started);

        let started = Instant::now();
        let translated = self.translate_blocks(&ir).await;
        timings.translate_ms = elapsed_ms(started);

        let started = Instant::now();
        let page_numbers: Vec<usize> = pages.iter().map(|page| page.number).collect();
        let (pages_out, rendered) = Self::assemble(&page_numbers, translated);
        timings.assemble_ms = elapsed_ms(started);

        let report = Self::build_report(&pages_out, timings);
        debug!("document pipeline finished: {}", report.summary());

        Ok(DocumentTranslationResult { ir, pages: pages_out, rendered, report })
    }

    /// Stage 1: select the page set to process.
    ///
    /// A scanned page without extracted blocks goes through the OCR
    /// fallback when enabled; recognized text becomes one synthetic
    /// paragraph block. Pages that still have no text pass through
    /// untouched.
    fn ingest(&self, pages: &[SourceDocumentPage]) -> Vec<SourceDocumentPage> {
        pages
            .iter()
            .map(|page| {
                let needs_ocr = page.blocks.is_empty()
                    && page.is_scanned
                    && self.options.enable_ocr_fallback;
                if !needs_ocr {
                    return page.clone();
                }
                let Some(extractor) = &self.ocr_extractor else {
                    return page.clone();
                };
                match extractor(page) {
                    Ok(Some(text)) if !text.trim().is_empty() => {
                        debug!("OCR fallback recovered text on page {}", page.number);
                        let block = SourceDocumentBlock::new(
                            format!("ocr-{}", Uuid::new_v4()),
                            BlockType::Paragraph,
                            text,
                        );
                        SourceDocumentPage {
                            number: page.number,
                            is_scanned: true,
                            blocks: vec![block],
                        }
                    }
                    Ok(_) => page.clone(),
                    Err(err) => {
                        warn!("OCR fallback failed on page {}: {}", page.number, err);
                        page.clone()
                    }
                }
            })
            .collect()
    }

    /// Stage 2: derive the IR, 1:1 from source blocks
    fn build_ir(pages: &[SourceDocumentPage]) -> Vec<DocumentBlockIr> {
        pages
            .iter()
            .flat_map(|page| {
                page.blocks
                    .iter()
                    .enumerate()
                    .map(|(index, block)| DocumentBlockIr::from_source(page.number, index, block))
            })
            .collect()
    }

    /// Stage 3: swap mathematical notation for opaque placeholders
    fn protect_formulas(ir: Vec<DocumentBlockIr>) -> Vec<DocumentBlockIr> {
        ir.into_iter()
            .map(|block| {
                if block.skip_translation {
                    return block;
                }
                let protected = formula::protect(&block.text);
                if protected.placeholders.is_empty() {
                    return block;
                }
                if protected.collapsed_to_notation {
                    debug!("block '{}' is pure notation, skipping translation", block.id);
                }
                block.with_protected_text(
                    protected.text,
                    protected.placeholders,
                    protected.collapsed_to_notation,
                )
            })
            .collect()
    }

    /// Stage 4: translate every non-skipped block through the orchestrator.
    ///
    /// Blocks are dispatched concurrently under a semaphore; the final
    /// deterministic order is restored by index before assembly.
    async fn translate_blocks(&self, ir: &[DocumentBlockIr]) -> Vec<TranslatedDocumentBlock> {
        let glossary = GlossaryApplier::new(&self.options.glossary);
        let semaphore = Arc::new(Semaphore::new(self.options.max_concurrent_blocks.max(1)));

        let mut results = stream::iter(ir.iter().cloned().enumerate())
            .map(|(index, block)| {
                let semaphore = Arc::clone(&semaphore);
                let glossary = &glossary;
                async move {
                    let _permit = semaphore.acquire().await.unwrap();
                    let outcome = self.translate_block(block, glossary).await;
                    (index, outcome)
                }
            })
            .buffer_unordered(self.options.max_concurrent_blocks.max(1))
            .collect::<Vec<_>>()
            .await;

        results.sort_by_key(|(index, _)| *index);
        results.into_iter().map(|(_, block)| block).collect()
    }

    /// Translate one block with the pipeline's independent retry budget,
    /// falling back to the original text when the budget is exhausted.
    async fn translate_block(
        &self,
        ir: DocumentBlockIr,
        glossary: &GlossaryApplier,
    ) -> TranslatedDocumentBlock {
        if ir.skip_translation {
            return TranslatedDocumentBlock::skipped(ir);
        }

        let request = TranslationRequest::new(
            ir.text.clone(),
            self.options.source_language.clone(),
            self.options.target_language.clone(),
        )
        .with_timeout_ms(self.options.timeout_ms);
        let provider_id = self.options.provider_id.as_deref();

        let mut failures = 0u32;
        loop {
            match self.orchestrator.translate(&request, provider_id).await {
                Ok(result) => {
                    let mut text = result.translated_text;
                    if !ir.placeholders.is_empty() {
                        text = formula::restore(&text, &ir.placeholders);
                    }
                    text = glossary.apply(&text);
                    return TranslatedDocumentBlock::succeeded(ir, text, failures);
                }
                Err(err) => {
                    failures += 1;
                    warn!(
                        "block '{}' translation attempt {} failed: {}",
                        ir.id, failures, err
                    );
                    if !err.is_retryable() || failures > self.options.max_block_retries {
                        let retry_count = failures.saturating_sub(1);
                        return TranslatedDocumentBlock::failed(ir, retry_count, err.to_string());
                    }
                }
            }
        }
    }

    /// Stage 5: group by ascending page, restore reading order, and render
    /// the structured text output.
    fn assemble(
        page_numbers: &[usize],
        translated: Vec<TranslatedDocumentBlock>,
    ) -> (Vec<TranslatedPage>, String) {
        let mut by_page: BTreeMap<usize, Vec<TranslatedDocumentBlock>> = BTreeMap::new();
        for block in translated {
            by_page.entry(block.ir.page_number).or_default().push(block);
        }
        for blocks in by_page.values_mut() {
            blocks.sort_by_key(|block| block.ir.reading_index);
        }

        // Empty pages are carried through so page numbering survives
        let mut numbers: Vec<usize> = page_numbers.to_vec();
        numbers.sort_unstable();
        numbers.dedup();
        let pages: Vec<TranslatedPage> = numbers
            .into_iter()
            .map(|number| TranslatedPage {
                number,
                blocks: by_page.remove(&number).unwrap_or_default(),
            })
            .collect();

        let rendered = Self::render(&pages);
        (pages, rendered)
    }

    /// Render translated pages as structured text.
    ///
    /// A caption whose parent resolves to a known block is attached under
    /// that parent as a bracketed annotation instead of standing alone.
    fn render(pages: &[TranslatedPage]) -> String {
        let known_ids: std::collections::HashSet<&str> = pages
            .iter()
            .flat_map(|page| page.blocks.iter().map(|block| block.ir.id.as_str()))
            .collect();

        let mut annotations: HashMap<&str, Vec<&str>> = HashMap::new();
        for page in pages {
            for block in &page.blocks {
                if block.ir.block_type == BlockType::Caption {
                    if let Some(parent) = block.ir.parent_id.as_deref() {
                        if known_ids.contains(parent) {
                            annotations
                                .entry(parent)
                                .or_default()
                                .push(block.translated_text.as_str());
                        }
                    }
                }
            }
        }

        let mut paragraphs: Vec<String> = Vec::new();
        for page in pages {
            for block in &page.blocks {
                let attached = block.ir.block_type == BlockType::Caption
                    && block
                        .ir
                        .parent_id
                        .as_deref()
                        .is_some_and(|parent| known_ids.contains(parent));
                if attached {
                    continue;
                }

                let mut text = match block.ir.block_type {
                    BlockType::Heading => format!("# {}", block.translated_text.trim()),
                    _ => block.translated_text.trim().to_string(),
                };
                if text.is_empty() {
                    continue;
                }
                if let Some(captions) = annotations.get(block.ir.id.as_str()) {
                    for caption in captions {
                        text.push_str(&format!("\n[{}]", caption.trim()));
                    }
                }
                paragraphs.push(text);
            }
        }
        paragraphs.join("\n\n")
    }

    fn build_report(pages: &[TranslatedPage], timings: StageTimings) -> QualityReport {
        let mut report = QualityReport { timings, ..Default::default() };
        for page in pages {
            for block in &page.blocks {
                report.total_blocks += 1;
                if block.ir.skip_translation {
                    report.skipped_blocks += 1;
                } else if block.is_failed() {
                    report.failed_blocks.push(FailedBlock {
                        page_number: block.ir.page_number,
                        block_id: block.ir.id.clone(),
                        retry_count: block.retry_count,
                        error: block.error.clone().unwrap_or_default(),
                    });
                } else {
                    report.translated_blocks += 1;
                }
            }
        }
        report
    }
}

/// Case-insensitive glossary substitution over translated text.
struct GlossaryApplier {
    rules: Vec<(Regex, String)>,
}

impl GlossaryApplier {
    fn new(glossary: &HashMap<String, String>) -> Self {
        let rules = glossary
            .iter()
            .filter(|(term, _)| !term.trim().is_empty())
            .filter_map(|(term, replacement)| {
                Regex::new(&format!(r"(?i){}", regex::escape(term)))
                    .ok()
                    .map(|pattern| (pattern, replacement.clone()))
            })
            .collect();
        Self { rules }
    }

    fn apply(&self, text: &str) -> String {
        let mut result = text.to_string();
        for (pattern, replacement) in &self.rules {
            // NoExpand: glossary replacements are literal text, not capture templates
            result = pattern
                .replace_all(&result, regex::NoExpand(replacement.as_str()))
                .into_owned();
        }
        result
    }
}

fn elapsed_ms(started: Instant) -> u64 {
    started.elapsed().as_millis() as u64
}
