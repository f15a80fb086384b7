/*!
 * Tests for the batch translation pipeline
 */

use std::time::Duration;
use tokio::time::Instant;

use lingobatch::errors::ProviderError;
use lingobatch::providers::mock::MockProvider;
use lingobatch::subtitle_processor::SubtitleCollection;
use lingobatch::translation::prompts::CONTEXT_HEADER;
use lingobatch::translation::{
    BatchProgress, Dictionary, DictionaryRule, DocumentKind, Entry, EntryStatus, PassKind,
    PipelineOptions, Segmenter, TranslationDocument,
};

use crate::common;

fn document(count: usize) -> TranslationDocument {
    let entries = (1..=count)
        .map(|id| Entry::from_text(id, id - 1, format!("line {}", id)))
        .collect();
    TranslationDocument::new(DocumentKind::PlainText, entries)
}

fn options_with_batch(batch_size: usize) -> PipelineOptions {
    PipelineOptions {
        batch_size,
        ..common::fast_options()
    }
}

#[tokio::test]
async fn test_translate_shouldIssueCeilOfEntriesOverBatchSizeCalls() {
    for (entries, batch_size, expected_calls) in [(0, 50, 0), (1, 50, 1), (100, 50, 2), (101, 50, 3), (7, 3, 3)] {
        let provider = MockProvider::working();
        let pipeline = common::mock_pipeline(&provider, Dictionary::new(), options_with_batch(batch_size));
        let mut doc = document(entries);

        let report = pipeline.translate(&mut doc).await.unwrap();

        assert_eq!(provider.call_count(), expected_calls, "{} entries / {}", entries, batch_size);
        assert_eq!(report.batches, expected_calls);
    }
}

#[tokio::test]
async fn test_passes_shouldNeverChangeEntryCount() {
    let provider = MockProvider::fail_on_calls(&[1]);
    let pipeline = common::mock_pipeline(&provider, Dictionary::new(), options_with_batch(4));
    let mut doc = document(10);

    pipeline.translate(&mut doc).await.unwrap();
    assert_eq!(doc.len(), 10);
    pipeline.retry_failed(&mut doc).await.unwrap();
    assert_eq!(doc.len(), 10);
    pipeline.improve(&mut doc).await.unwrap();
    assert_eq!(doc.len(), 10);
    assert_eq!(doc.status_counts().total(), 10);
}

#[tokio::test]
async fn test_translate_withEmptyResponse_shouldMarkBatchError() {
    let provider = MockProvider::empty();
    let pipeline = common::mock_pipeline(&provider, Dictionary::new(), common::fast_options());
    let mut doc = document(3);

    let report = pipeline.translate(&mut doc).await.unwrap();

    assert_eq!(report.counts.error, 3);
    assert_eq!(report.failed_batches, 0);
}

#[tokio::test]
async fn test_translate_shouldDropNoiseLinesBeforeAlignment() {
    let provider = MockProvider::with_responder(|_| Ok("- note\nBonjour\n\n[aside]\nSalut".to_string()));
    let pipeline = common::mock_pipeline(&provider, Dictionary::new(), common::fast_options());
    let mut doc = document(2);

    pipeline.translate(&mut doc).await.unwrap();

    assert_eq!(doc.entries()[0].translated_text, "Bonjour");
    assert_eq!(doc.entries()[1].translated_text, "Salut");
}

#[tokio::test]
async fn test_translate_shouldApplyDictionaryToAcceptedLines() {
    let provider = MockProvider::working();
    let dictionary = Dictionary::from_rules([DictionaryRule::new("line", "row")]).unwrap();
    let pipeline = common::mock_pipeline(&provider, dictionary, common::fast_options());
    let mut doc = document(2);

    pipeline.translate(&mut doc).await.unwrap();

    assert_eq!(doc.entries()[1].translated_text, "TR: row 2");
    assert_eq!(doc.entries()[1].original_text, "line 2");
}

#[tokio::test]
async fn test_translate_withMultilineCue_shouldRestoreNewlines() {
    let cues = SubtitleCollection::parse_srt_string(common::SAMPLE_SRT).unwrap();
    let mut doc = Segmenter::new(2000).segment_subtitles(&cues);
    let provider = MockProvider::working();
    let pipeline = common::mock_pipeline(&provider, Dictionary::new(), common::fast_options());

    pipeline.translate(&mut doc).await.unwrap();

    assert!(provider.prompts()[0].contains("It contains <br> multiple lines."));
    assert_eq!(doc.entries()[1].translated_text, "TR: It contains\nmultiple lines.");
    assert_eq!(doc.status_counts().translated, 3);
}

#[tokio::test]
async fn test_translate_withContextDisabled_shouldNotSendContext() {
    let provider = MockProvider::working();
    let options = PipelineOptions {
        preserve_context: false,
        ..options_with_batch(1)
    };
    let pipeline = common::mock_pipeline(&provider, Dictionary::new(), options);
    let mut doc = document(3);

    pipeline.translate(&mut doc).await.unwrap();

    assert!(provider.prompts().iter().all(|prompt| !prompt.contains(CONTEXT_HEADER)));
}

#[tokio::test]
async fn test_translate_withFailedBatch_shouldNotUpdateContext() {
    let provider = MockProvider::fail_on_calls(&[2]);
    let pipeline = common::mock_pipeline(&provider, Dictionary::new(), options_with_batch(1));
    let mut doc = document(3);

    pipeline.translate(&mut doc).await.unwrap();

    let prompts = provider.prompts();
    assert!(prompts[2].contains("TR: line 1"));
    assert!(!prompts[2].contains("TR: line 2"));
}

#[tokio::test]
async fn test_translate_shouldReportProgressAfterEveryBatch() {
    let provider = MockProvider::working();
    let pipeline = common::mock_pipeline(&provider, Dictionary::new(), options_with_batch(2));
    let mut doc = document(5);
    let mut seen: Vec<BatchProgress> = Vec::new();

    pipeline
        .translate_with_progress(&mut doc, |progress| seen.push(*progress))
        .await
        .unwrap();

    assert_eq!(seen.len(), 3);
    assert_eq!(seen[0].pass, PassKind::Translate);
    assert_eq!(seen[0].counts.translated, 2);
    assert_eq!(seen[0].counts.pending, 3);
    assert_eq!(seen[2].batch_index, seen[2].total_batches);
    assert!(seen[2].counts.is_complete());
}

#[tokio::test]
async fn test_retryFailed_withNoErrors_shouldMakeNoCalls() {
    let provider = MockProvider::working();
    let pipeline = common::mock_pipeline(&provider, Dictionary::new(), common::fast_options());
    let mut doc = document(4);

    let outcome = pipeline.retry_failed(&mut doc).await.unwrap();

    assert!(outcome.is_nothing_to_do());
    assert_eq!(provider.call_count(), 0);
    assert!(doc.entries().iter().all(|entry| entry.status == EntryStatus::Pending));
}

#[tokio::test]
async fn test_retryFailed_withFailingCall_shouldKeepErrorsAndContinue() {
    // Main pass fails entirely, first retry batch fails, second succeeds
    let provider = MockProvider::fail_on_calls(&[1, 2]);
    let options = PipelineOptions {
        retry_batch_size: 2,
        ..common::fast_options()
    };
    let pipeline = common::mock_pipeline(&provider, Dictionary::new(), options);
    let mut doc = document(4);
    pipeline.translate(&mut doc).await.unwrap();

    let outcome = pipeline.retry_failed(&mut doc).await.unwrap();
    let report = outcome.report().unwrap();

    assert_eq!(report.batches, 2);
    assert_eq!(report.failed_batches, 1);
    let statuses: Vec<EntryStatus> = doc.entries().iter().map(|entry| entry.status).collect();
    assert_eq!(
        statuses,
        vec![EntryStatus::Error, EntryStatus::Error, EntryStatus::Translated, EntryStatus::Translated]
    );
}

#[tokio::test]
async fn test_retryFailed_withUntaggedSegments_shouldMatchByPosition() {
    let provider = MockProvider::with_responder(|prompt| {
        if prompt.contains("[[ID:") {
            Ok("premier ||| second".to_string())
        } else {
            Err(ProviderError::RequestFailed("down".to_string()))
        }
    });
    let pipeline = common::mock_pipeline(&provider, Dictionary::new(), common::fast_options());
    let mut doc = document(2);
    pipeline.translate(&mut doc).await.unwrap();

    pipeline.retry_failed(&mut doc).await.unwrap();

    assert_eq!(doc.entries()[0].translated_text, "premier");
    assert_eq!(doc.entries()[1].translated_text, "second");
}

#[tokio::test]
async fn test_improve_withNothingTranslated_shouldReturnNothingToDo() {
    let provider = MockProvider::working();
    let pipeline = common::mock_pipeline(&provider, Dictionary::new(), common::fast_options());
    let mut doc = document(2);

    assert!(pipeline.improve(&mut doc).await.unwrap().is_nothing_to_do());
    assert_eq!(provider.call_count(), 0);
}

#[tokio::test]
async fn test_improve_shouldOnlyTouchTranslatedEntries() {
    let provider = MockProvider::fail_on_calls(&[2]);
    let pipeline = common::mock_pipeline(&provider, Dictionary::new(), options_with_batch(2));
    let mut doc = document(4);
    pipeline.translate(&mut doc).await.unwrap();

    pipeline.improve(&mut doc).await.unwrap();

    assert_eq!(doc.entries()[0].translated_text, "IMPROVED: TR: line 1");
    assert_eq!(doc.entries()[2].status, EntryStatus::Error);
    assert_eq!(doc.entries()[2].translated_text, "");
    let improve_prompt = &provider.prompts()[2];
    assert!(improve_prompt.contains("ORIGINAL: line 1"));
    assert!(!improve_prompt.contains("line 3"));
}

#[tokio::test]
async fn test_improve_withFailingCall_shouldKeepTranslations() {
    let provider = MockProvider::fail_on_calls(&[2]);
    let pipeline = common::mock_pipeline(&provider, Dictionary::new(), common::fast_options());
    let mut doc = document(2);
    pipeline.translate(&mut doc).await.unwrap();
    let before = doc.entries().to_vec();

    let outcome = pipeline.improve(&mut doc).await.unwrap();

    assert_eq!(outcome.report().unwrap().failed_batches, 1);
    assert_eq!(doc.entries(), &before[..]);
}

#[tokio::test]
async fn test_retranslateEntry_shouldOnlyTranslateThatEntry() {
    let provider = MockProvider::fail_on_calls(&[1]);
    let pipeline = common::mock_pipeline(&provider, Dictionary::new(), common::fast_options());
    let mut doc = document(3);
    pipeline.translate(&mut doc).await.unwrap();

    let status = pipeline.retranslate_entry(&mut doc, 2).await.unwrap();

    assert_eq!(status, EntryStatus::Translated);
    assert_eq!(doc.get(2).unwrap().translated_text, "TR: line 2");
    assert_eq!(doc.get(1).unwrap().status, EntryStatus::Error);
    assert_eq!(provider.call_count(), 2);
}

#[tokio::test]
async fn test_translate_withZeroBatchSize_shouldRejectOptions() {
    let provider = MockProvider::working();
    let pipeline = common::mock_pipeline(&provider, Dictionary::new(), options_with_batch(0));
    let mut doc = document(1);

    assert!(pipeline.translate(&mut doc).await.is_err());
    assert_eq!(provider.call_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_translate_shouldPauseBetweenBatchesButNotAfterLast() {
    let provider = MockProvider::working();
    let options = PipelineOptions {
        batch_delay: Duration::from_secs(1),
        ..options_with_batch(50)
    };
    let pipeline = common::mock_pipeline(&provider, Dictionary::new(), options);
    let mut doc = document(120);

    let started = Instant::now();
    pipeline.translate(&mut doc).await.unwrap();

    assert_eq!(provider.call_count(), 3);
    assert_eq!(started.elapsed(), Duration::from_secs(2));
}

#[tokio::test(start_paused = true)]
async fn test_retryFailed_withSingleBatch_shouldNotPause() {
    let provider = MockProvider::fail_on_calls(&[1]);
    let options = PipelineOptions {
        batch_delay: Duration::from_secs(5),
        ..common::fast_options()
    };
    let pipeline = common::mock_pipeline(&provider, Dictionary::new(), options);
    let mut doc = document(3);
    pipeline.translate(&mut doc).await.unwrap();

    let started = Instant::now();
    pipeline.retry_failed(&mut doc).await.unwrap();

    assert_eq!(started.elapsed(), Duration::ZERO);
    assert!(doc.status_counts().is_complete());
}
