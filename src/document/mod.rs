/*!
 * Long-document translation.
 *
 * Splits into:
 * - `model`: source pages/blocks, intermediate representation, translated
 *   blocks, options, and the quality report
 * - `formula`: placeholder protection for mathematical notation
 * - `pipeline`: the five-stage pipeline reusing the orchestrator
 */

pub use self::formula::{ProtectedText, protect, restore};
pub use self::model::{
    BlockBounds, BlockType, DocumentBlockIr, DocumentTranslationResult, FailedBlock,
    PipelineOptions, QualityReport, SourceDocumentBlock, SourceDocumentPage, StageTimings,
    TranslatedDocumentBlock, TranslatedPage,
};
pub use self::pipeline::{DocumentPipeline, OcrExtractor};

pub mod formula;
pub mod model;
pub mod pipeline;
