/*!
 * Tests for dictionary post-processing and persistence
 */

use anyhow::Result;
use lingobatch::translation::{Dictionary, DictionaryRule};

use crate::common;

#[test]
fn test_apply_withTomRule_shouldRespectWordBoundaries() {
    let dictionary = Dictionary::from_rules([DictionaryRule::new("Tom", "Thomas")]).unwrap();

    assert_eq!(dictionary.apply("Tom said hello"), "Thomas said hello");
    assert_eq!(dictionary.apply("Tomato soup"), "Tomato soup");
    assert_eq!(dictionary.apply("Hello, tom!"), "Hello, Thomas!");
}

#[test]
fn test_apply_withMultiWordPhrase_shouldReplaceWholePhrase() {
    let dictionary = Dictionary::from_rules([DictionaryRule::new("New York", "NYC")]).unwrap();
    assert_eq!(dictionary.apply("I love new york."), "I love NYC.");
}

#[test]
fn test_apply_withRegexMetacharacters_shouldMatchLiterally() {
    let dictionary = Dictionary::from_rules([DictionaryRule::new("a.b", "x")]).unwrap();
    assert_eq!(dictionary.apply("a.b axb"), "x axb");
}

#[test]
fn test_apply_withEmptyDictionary_shouldReturnInput() {
    assert_eq!(Dictionary::new().apply("unchanged"), "unchanged");
}

#[test]
fn test_saveThenLoad_shouldKeepRuleOrder() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = temp_dir.path().join("dict").join("rules.json");

    let mut dictionary = Dictionary::new();
    dictionary.add_rule("cat", "dog")?;
    dictionary.add_rule("dog", "wolf")?;
    dictionary.save(&path)?;

    let loaded = Dictionary::load(&path)?;
    let rules: Vec<_> = loaded.rules().cloned().collect();
    assert_eq!(
        rules,
        vec![DictionaryRule::new("cat", "dog"), DictionaryRule::new("dog", "wolf")]
    );
    assert_eq!(loaded.apply("cat"), "wolf");
    Ok(())
}

#[test]
fn test_load_withMissingFile_shouldBeEmpty() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let dictionary = Dictionary::load(temp_dir.path().join("none.json"))?;
    assert!(dictionary.is_empty());
    Ok(())
}

#[test]
fn test_load_withMalformedFile_shouldFail() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = common::create_test_file(temp_dir.path(), "bad.json", "{ rules: nope")?;
    assert!(Dictionary::load(path).is_err());
    Ok(())
}

#[test]
fn test_addRule_withNonAsciiCaseVariant_shouldUpdateExistingRule() -> Result<()> {
    let mut dictionary = Dictionary::new();
    dictionary.add_rule("Élan", "verve")?;
    dictionary.add_rule("élan", "panache")?;

    assert_eq!(dictionary.len(), 1);
    assert_eq!(dictionary.apply("Quel élan !"), "Quel panache !");
    assert!(dictionary.remove_rule("ÉLAN"));
    assert!(dictionary.is_empty());
    Ok(())
}
