/*!
 * Tests for file utility functions
 */

use anyhow::Result;
use lingobatch::file_utils::{FileManager, FileType};

use crate::common;

#[test]
fn test_detectFileType_withSrtExtension_shouldReturnSubtitle() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = common::create_test_subtitle(temp_dir.path(), "movie.srt")?;

    assert_eq!(FileManager::detect_file_type(&path)?, FileType::Subtitle);
    Ok(())
}

#[test]
fn test_detectFileType_withSrtContentButNoExtension_shouldSniffSubtitle() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = common::create_test_file(temp_dir.path(), "captions", common::SAMPLE_SRT)?;

    assert_eq!(FileManager::detect_file_type(&path)?, FileType::Subtitle);
    Ok(())
}

#[test]
fn test_detectFileType_withProse_shouldReturnPlainText() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = common::create_test_file(temp_dir.path(), "notes.md", "# Title\n\nSome prose.")?;

    assert_eq!(FileManager::detect_file_type(&path)?, FileType::PlainText);
    Ok(())
}

#[test]
fn test_detectFileType_withMissingFile_shouldFail() {
    assert!(FileManager::detect_file_type("/definitely/not/here.srt").is_err());
}

#[test]
fn test_writeToFile_shouldCreateParentDirectories() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = temp_dir.path().join("nested").join("out.txt");

    FileManager::write_to_file(&path, "content")?;

    assert!(FileManager::file_exists(&path));
    assert_eq!(FileManager::read_to_string(&path)?, "content");
    Ok(())
}
