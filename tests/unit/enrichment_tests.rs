/*!
 * Unit tests for phonetic enrichment gating and singleflight behavior.
 */

use std::sync::Arc;

use futures::future::join_all;

use babelcore::providers::mock::MockProvider;
use babelcore::translation::enrichment::PhoneticEnricher;
use babelcore::translation::{Phonetic, PhoneticAccent, TranslationRequest, WordResult};

use crate::common::{CountingPhoneticSource, enriching_orchestrator};

#[tokio::test]
async fn test_stampede_concurrentSameWord_shouldIssueExactlyOneLookup() {
    let source = Arc::new(CountingPhoneticSource::new().with_delay_ms(50));
    let enricher = Arc::new(PhoneticEnricher::new(source.clone()));

    let lookups = (0..16).map(|_| {
        let enricher = Arc::clone(&enricher);
        async move { enricher.lookup("hello").await }
    });
    let outcomes = join_all(lookups).await;

    assert!(outcomes.iter().all(|outcome| outcome.is_ok()));
    assert_eq!(source.lookup_count(), 1);
}

#[tokio::test]
async fn test_stampede_concurrentDistinctWords_shouldIssueOneLookupEach() {
    let source = Arc::new(CountingPhoneticSource::new().with_delay_ms(30));
    let enricher = Arc::new(PhoneticEnricher::new(source.clone()));

    let words = ["alpha", "beta", "gamma", "delta", "epsilon"];
    let lookups = words.iter().map(|word| {
        let enricher = Arc::clone(&enricher);
        async move { enricher.lookup(word).await }
    });
    let outcomes = join_all(lookups).await;

    assert!(outcomes.iter().all(|outcome| outcome.is_ok()));
    assert_eq!(source.lookup_count(), words.len());
}

#[tokio::test]
async fn test_stampede_lookupAfterCompletion_shouldHitCacheWithoutNewLookup() {
    let source = Arc::new(CountingPhoneticSource::new());
    let enricher = PhoneticEnricher::new(source.clone());

    enricher.lookup("hello").await.unwrap();
    enricher.lookup("hello").await.unwrap();

    assert_eq!(source.lookup_count(), 1);
}

#[tokio::test]
async fn test_stampede_sharedFailure_shouldReachAllJoinersAndClear() {
    let source = Arc::new(CountingPhoneticSource::failing());
    let enricher = Arc::new(PhoneticEnricher::new(source.clone()));

    let lookups = (0..8).map(|_| {
        let enricher = Arc::clone(&enricher);
        async move { enricher.lookup("hello").await }
    });
    let outcomes = join_all(lookups).await;

    assert!(outcomes.iter().all(|outcome| outcome.is_err()));
    // The settled flight is cleared; a later caller starts fresh
    assert_eq!(enricher.in_flight_count(), 0);
    let before = source.lookup_count();
    let _ = enricher.lookup("hello").await;
    assert_eq!(source.lookup_count(), before + 1);
}

#[tokio::test]
async fn test_stampede_joinerCancellation_shouldNotCancelSharedLookup() {
    let source = Arc::new(CountingPhoneticSource::new().with_delay_ms(60));
    let enricher = Arc::new(PhoneticEnricher::new(source.clone()));

    let winner = {
        let enricher = Arc::clone(&enricher);
        tokio::spawn(async move { enricher.lookup("hello").await })
    };
    let joiner = {
        let enricher = Arc::clone(&enricher);
        tokio::spawn(async move { enricher.lookup("hello").await })
    };

    // Give both a chance to join the flight, then cancel one of them
    tokio::time::sleep(tokio::time::Duration::from_millis(10)).await;
    joiner.abort();

    let outcome = winner.await.unwrap();
    assert!(outcome.is_ok());
    assert_eq!(source.lookup_count(), 1);
}

#[tokio::test]
async fn test_enrichment_englishShortWord_shouldAttachUsOrUkPhonetic() {
    let source = Arc::new(CountingPhoneticSource::new());
    let orchestrator = enriching_orchestrator("mock", source.clone());
    orchestrator
        .register_provider(Arc::new(MockProvider::working("mock").with_custom_response(
            |_| "hello".to_string(),
        )));

    let request = TranslationRequest::new("你好", "auto", "en");
    let result = orchestrator.translate(&request, None).await.unwrap();

    let word = result.word_result.expect("enrichment ran");
    assert!(word.phonetics.iter().any(|p| matches!(
        p.accent,
        PhoneticAccent::Us | PhoneticAccent::Uk
    )));
    assert_eq!(source.lookup_count(), 1);
}

#[tokio::test]
async fn test_enrichment_nonEnglishTarget_shouldNeverTrigger() {
    let source = Arc::new(CountingPhoneticSource::new());
    let orchestrator = enriching_orchestrator("mock", source.clone());
    orchestrator.register_provider(Arc::new(MockProvider::working("mock")));

    let request = TranslationRequest::new("hello", "en", "fr");
    let result = orchestrator.translate(&request, None).await.unwrap();

    assert!(result.word_result.is_none());
    assert_eq!(source.lookup_count(), 0);
}

#[tokio::test]
async fn test_enrichment_sentenceOutput_shouldNeverTrigger() {
    let source = Arc::new(CountingPhoneticSource::new());
    let orchestrator = enriching_orchestrator("mock", source.clone());
    orchestrator
        .register_provider(Arc::new(MockProvider::working("mock").with_custom_response(
            |_| "This is a complete sentence.".to_string(),
        )));

    let request = TranslationRequest::new("这是一个完整的句子。", "auto", "en");
    let result = orchestrator.translate(&request, None).await.unwrap();

    assert!(result.word_result.is_none());
    assert_eq!(source.lookup_count(), 0);
}

#[tokio::test]
async fn test_enrichment_sourceOnlyTranscription_shouldStillTriggerAndPreserveIt() {
    let source = Arc::new(CountingPhoneticSource::new());
    let orchestrator = enriching_orchestrator("mock", source.clone());

    // Provider already attaches a pinyin transcription of the source text
    let pinyin = WordResult {
        phonetics: vec![Phonetic::new("nǐ hǎo", PhoneticAccent::Source)],
        ..Default::default()
    };
    orchestrator.register_provider(Arc::new(
        MockProvider::working("mock")
            .with_custom_response(|_| "hello".to_string())
            .with_word_result(pinyin),
    ));

    let request = TranslationRequest::new("你好", "auto", "en");
    let result = orchestrator.translate(&request, None).await.unwrap();

    let word = result.word_result.unwrap();
    assert_eq!(source.lookup_count(), 1);
    // Pinyin entry preserved alongside the new destination entries
    assert!(word.phonetics.iter().any(|p| p.accent == PhoneticAccent::Source));
    assert!(word.has_destination_phonetic());
}

#[tokio::test]
async fn test_enrichment_existingDestinationPhonetic_shouldNotTrigger() {
    let source = Arc::new(CountingPhoneticSource::new());
    let orchestrator = enriching_orchestrator("mock", source.clone());

    let already = WordResult {
        phonetics: vec![Phonetic::new("/həˈloʊ/", PhoneticAccent::Us)],
        ..Default::default()
    };
    orchestrator.register_provider(Arc::new(
        MockProvider::working("mock")
            .with_custom_response(|_| "hello".to_string())
            .with_word_result(already),
    ));

    let request = TranslationRequest::new("你好", "auto", "en");
    let result = orchestrator.translate(&request, None).await.unwrap();

    assert!(result.word_result.is_some());
    assert_eq!(source.lookup_count(), 0);
}

#[tokio::test]
async fn test_enrichment_failure_shouldDegradeSilently() {
    let source = Arc::new(CountingPhoneticSource::failing());
    let orchestrator = enriching_orchestrator("mock", source.clone());
    orchestrator
        .register_provider(Arc::new(MockProvider::working("mock").with_custom_response(
            |_| "hello".to_string(),
        )));

    let request = TranslationRequest::new("你好", "auto", "en");
    let result = orchestrator.translate(&request, None).await.unwrap();

    // The translation survives untouched
    assert_eq!(result.translated_text, "hello");
    assert!(result.word_result.is_none());
    assert_eq!(source.lookup_count(), 1);
}
