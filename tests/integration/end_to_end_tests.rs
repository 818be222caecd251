/*!
 * End-to-end orchestration scenarios across providers, cache, and
 * enrichment.
 */

use std::sync::Arc;

use babelcore::document::{
    BlockType, DocumentPipeline, PipelineOptions, SourceDocumentBlock, SourceDocumentPage,
};
use babelcore::providers::mock::MockProvider;
use babelcore::translation::{PhoneticAccent, TranslationRequest};

use crate::common::{CountingPhoneticSource, enriching_orchestrator, init_test_logging};

#[tokio::test]
async fn test_endToEnd_shortWordTranslation_shouldEnrichThenServeFromCache() {
    init_test_logging();
    let source = Arc::new(CountingPhoneticSource::new());
    let orchestrator = enriching_orchestrator("mock", source.clone());

    // A provider lacking phonetics entirely
    let provider = Arc::new(
        MockProvider::working("mock").with_custom_response(|_| "hello".to_string()),
    );
    orchestrator.register_provider(provider.clone());

    let request = TranslationRequest::new("你好", "auto", "en");

    // First call: fresh dispatch, enrichment attaches destination phonetics
    let first = orchestrator.translate(&request, None).await.unwrap();
    assert!(!first.from_cache);
    assert_eq!(first.translated_text, "hello");
    let word = first.word_result.as_ref().expect("enrichment ran");
    assert!(
        word.phonetics
            .iter()
            .any(|p| matches!(p.accent, PhoneticAccent::Us | PhoneticAccent::Uk))
    );

    // Second identical call: served from cache with the phonetics attached
    let second = orchestrator.translate(&request, None).await.unwrap();
    assert!(second.from_cache);
    assert_eq!(second.word_result, first.word_result);

    // One provider dispatch, one upstream lookup - everything else was shared
    assert_eq!(provider.calls(), 1);
    assert_eq!(source.lookup_count(), 1);
}

#[tokio::test]
async fn test_endToEnd_documentRun_shouldProduceStructuredOutputAndCleanReport() {
    let source = Arc::new(CountingPhoneticSource::new());
    let orchestrator = Arc::new(enriching_orchestrator("mock", source));
    let provider = Arc::new(
        MockProvider::working("mock").with_custom_response(|req| req.text.to_uppercase()),
    );
    orchestrator.register_provider(provider.clone());

    let pages = vec![
        SourceDocumentPage::new(1)
            .with_block(SourceDocumentBlock::new("h1", BlockType::Heading, "Overview"))
            .with_block(SourceDocumentBlock::new(
                "p1",
                BlockType::Paragraph,
                "Energy obeys $$E = mc^2$$ here.",
            )),
        SourceDocumentPage::new(2)
            .with_block(SourceDocumentBlock::new("fig", BlockType::Paragraph, "A chart."))
            .with_block(
                SourceDocumentBlock::new("cap", BlockType::Caption, "Chart caption")
                    .with_parent("fig"),
            ),
    ];

    let pipeline = DocumentPipeline::new(
        Arc::clone(&orchestrator),
        PipelineOptions::default().with_languages("en", "fr"),
    );
    let result = pipeline.run(&pages).await.unwrap();

    assert_eq!(result.report.total_blocks, 4);
    assert_eq!(result.report.translated_blocks, 4);
    assert!(result.report.failed_blocks.is_empty());

    // Formula notation survives the provider round trip uppercased text
    assert!(result.rendered.contains("$$E = mc^2$$"));
    // Caption attached to its parent, heading rendered as heading
    assert!(result.rendered.contains("# OVERVIEW"));
    assert!(result.rendered.contains("A CHART.\n[CHART CAPTION]"));
}

#[tokio::test]
async fn test_endToEnd_repeatedDocumentRun_shouldHitTheSharedCache() {
    let source = Arc::new(CountingPhoneticSource::new());
    let orchestrator = Arc::new(enriching_orchestrator("mock", source));
    let provider = Arc::new(MockProvider::working("mock"));
    orchestrator.register_provider(provider.clone());

    let pages = vec![SourceDocumentPage::new(1).with_block(SourceDocumentBlock::new(
        "p1",
        BlockType::Paragraph,
        "Repeated prose.",
    ))];

    let pipeline = DocumentPipeline::new(
        Arc::clone(&orchestrator),
        PipelineOptions::default().with_languages("en", "fr"),
    );
    pipeline.run(&pages).await.unwrap();
    pipeline.run(&pages).await.unwrap();

    // The second run is served entirely from the orchestrator's cache
    assert_eq!(provider.calls(), 1);
}
