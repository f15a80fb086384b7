/*!
 * Tests for ISO language code utilities
 */

use lingobatch::language_utils::{get_language_name, language_codes_match, prompt_language_name};

#[test]
fn test_languageCodesMatch_withDifferentForms_shouldMatch() {
    assert!(language_codes_match("fr", "fra"));
    assert!(language_codes_match("fre", "FR"));
    assert!(language_codes_match("de", "ger"));
    assert!(!language_codes_match("en", "fr"));
    assert!(!language_codes_match("en", "??"));
}

#[test]
fn test_getLanguageName_withValidCode_shouldReturnEnglishName() {
    assert_eq!(get_language_name("es").unwrap(), "Spanish");
    assert_eq!(get_language_name("deu").unwrap(), "German");
    assert!(get_language_name("").is_err());
}

#[test]
fn test_promptLanguageName_shouldFallBackToInput() {
    assert_eq!(prompt_language_name("fr"), "French");
    assert_eq!(prompt_language_name(" Elvish "), "Elvish");
}
