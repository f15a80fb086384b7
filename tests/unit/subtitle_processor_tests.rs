/*!
 * Tests for SubRip parsing and serialization
 */

use anyhow::Result;
use lingobatch::errors::SubtitleError;
use lingobatch::file_utils::FileManager;
use lingobatch::subtitle_processor::{SubtitleCollection, SubtitleEntry};

use crate::common;

#[test]
fn test_parseTimestamp_withValidValue_shouldReturnMilliseconds() {
    assert_eq!(SubtitleEntry::parse_timestamp("01:02:03,456").unwrap(), 3_723_456);
    assert_eq!(SubtitleEntry::parse_timestamp("00:00:00.001").unwrap(), 1);
}

#[test]
fn test_parseTimestamp_withInvalidValue_shouldFail() {
    assert!(matches!(
        SubtitleEntry::parse_timestamp("00:61:00,000"),
        Err(SubtitleError::InvalidTimestamp(_))
    ));
    assert!(SubtitleEntry::parse_timestamp("garbage").is_err());
}

#[test]
fn test_formatTimestamp_shouldPadFields() {
    assert_eq!(SubtitleEntry::format_timestamp(3_723_456), "01:02:03,456");
    assert_eq!(SubtitleEntry::format_timestamp(0), "00:00:00,000");
}

#[test]
fn test_parseSrtString_withUnorderedCues_shouldSortAndRenumber() {
    let content = "7\n00:00:05,000 --> 00:00:06,000\nSecond\n\n3\n00:00:01,000 --> 00:00:02,000\nFirst\n";
    let entries = SubtitleCollection::parse_srt_string(content).unwrap();

    assert_eq!(entries[0].text, "First");
    assert_eq!(entries[0].seq_num, 1);
    assert_eq!(entries[1].seq_num, 2);
}

#[test]
fn test_parseSrtString_withBomAndCrlf_shouldParse() {
    let content = "\u{feff}1\r\n00:00:01,000 --> 00:00:02,000\r\nHello\r\n\r\n";
    let entries = SubtitleCollection::parse_srt_string(content).unwrap();

    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].text, "Hello");
}

#[test]
fn test_fromFile_thenRender_shouldPreserveStructure() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let input = common::create_test_subtitle(temp_dir.path(), "in.srt")?;

    let collection = SubtitleCollection::from_file(&input)?;
    let output = temp_dir.path().join("out.srt");
    FileManager::write_to_file(&output, &collection.to_srt_string())?;

    let reparsed = SubtitleCollection::from_file(&output)?;
    assert_eq!(reparsed.entries, collection.entries);
    assert_eq!(reparsed.entries[1].text, "It contains\nmultiple lines.");
    Ok(())
}

#[test]
fn test_parseSrtString_withEmptyCue_shouldNotSwallowNextCue() {
    let content = "1\n00:00:01,000 --> 00:00:02,000\n\n2\n00:00:03,000 --> 00:00:04,000\nHello\n\n3\n00:00:05,000 --> 00:00:06,000\nWorld\n";
    let entries = SubtitleCollection::parse_srt_string(content).unwrap();

    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].text, "Hello");
    assert_eq!(entries[0].start_time_ms, 3_000);
    assert_eq!(entries[1].text, "World");
    assert!(entries.iter().all(|entry| !entry.text.contains("-->")));
}

#[test]
fn test_parseSrtString_withOutOfRangeTimestamp_shouldSkipCue() {
    let content = "1\n00:61:00,000 --> 00:62:00,000\nBroken\ncue\n\n2\n00:00:03,000 --> 00:00:04,000\nValid\n";
    let entries = SubtitleCollection::parse_srt_string(content).unwrap();

    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].text, "Valid");
    assert_eq!(entries[0].seq_num, 1);
}

#[test]
fn test_parseSrtString_withOnlyInvalidCues_shouldReturnNoEntries() {
    let content = "1\n00:00:99,000 --> 00:01:00,000\nText\n";
    assert!(matches!(
        SubtitleCollection::parse_srt_string(content),
        Err(SubtitleError::NoEntries)
    ));
}
