/*!
 * User-managed find/replace dictionary applied to translated lines.
 *
 * Rules run in list order. Each rule replaces every case-insensitive,
 * whole-word occurrence of `from` with `to`.
 */

use anyhow::{anyhow, Context, Result};
use log::debug;
use regex::{NoExpand, Regex};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// A single substitution rule
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DictionaryRule {
    pub from: String,
    pub to: String,
}

impl DictionaryRule {
    pub fn new(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
        }
    }
}

#[derive(Debug, Clone)]
struct CompiledRule {
    rule: DictionaryRule,
    pattern: Regex,
}

impl CompiledRule {
    fn compile(rule: DictionaryRule) -> Result<Self> {
        let from = rule.from.trim();
        if from.is_empty() {
            return Err(anyhow!("Dictionary rule needs a non-empty 'from' term"));
        }
        let pattern = Regex::new(&format!(r"(?i)\b{}\b", regex::escape(from)))
            .with_context(|| format!("Failed to compile dictionary rule '{}'", from))?;
        Ok(Self { rule, pattern })
    }
}

/// On-disk layout of the dictionary file
#[derive(Debug, Default, Serialize, Deserialize)]
struct DictionaryFile {
    #[serde(default)]
    rules: Vec<DictionaryRule>,
}

/// Ordered collection of whole-word substitution rules
#[derive(Debug, Clone, Default)]
pub struct Dictionary {
    rules: Vec<CompiledRule>,
}

impl Dictionary {
    /// Empty dictionary; applying it returns lines unchanged
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a dictionary from rules, keeping their order
    pub fn from_rules(rules: impl IntoIterator<Item = DictionaryRule>) -> Result<Self> {
        let mut dictionary = Self::new();
        for rule in rules {
            dictionary.add_rule(rule.from, rule.to)?;
        }
        Ok(dictionary)
    }

    /// Load rules from a JSON file; a missing file yields an empty dictionary
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            debug!("Dictionary file {:?} not found, starting empty", path);
            return Ok(Self::new());
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read dictionary file: {:?}", path))?;
        let file: DictionaryFile = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse dictionary file: {:?}", path))?;

        Self::from_rules(file.rules)
    }

    /// Persist rules as pretty JSON
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let file = DictionaryFile {
            rules: self.rules().cloned().collect(),
        };
        let json = serde_json::to_string_pretty(&file)
            .context("Failed to serialize dictionary")?;

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)
                    .with_context(|| format!("Failed to create directory: {:?}", parent))?;
            }
        }
        fs::write(path, json)
            .with_context(|| format!("Failed to write dictionary file: {:?}", path))?;

        Ok(())
    }

    /// Add a rule at the end, or update `to` in place when `from` already exists
    pub fn add_rule(&mut self, from: impl Into<String>, to: impl Into<String>) -> Result<()> {
        let rule = DictionaryRule::new(from.into().trim(), to);

        if let Some(existing) = self
            .rules
            .iter_mut()
            .find(|compiled| same_word(&compiled.rule.from, &rule.from))
        {
            existing.rule.to = rule.to;
            return Ok(());
        }

        self.rules.push(CompiledRule::compile(rule)?);
        Ok(())
    }

    /// Remove the rule for `from`; returns whether a rule was removed
    pub fn remove_rule(&mut self, from: &str) -> bool {
        let before = self.rules.len();
        self.rules.retain(|compiled| !same_word(&compiled.rule.from, from));
        self.rules.len() != before
    }

    pub fn rules(&self) -> impl Iterator<Item = &DictionaryRule> {
        self.rules.iter().map(|compiled| &compiled.rule)
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Apply every rule to a translated line, in list order
    pub fn apply(&self, line: &str) -> String {
        let mut result = line.to_string();
        for compiled in &self.rules {
            if compiled.pattern.is_match(&result) {
                result = compiled
                    .pattern
                    .replace_all(&result, NoExpand(&compiled.rule.to))
                    .into_owned();
            }
        }
        result
    }
}

/// Rule keys compare the way the `(?i)` pattern matches, with Unicode case folding
fn same_word(a: &str, b: &str) -> bool {
    a.trim().to_lowercase() == b.trim().to_lowercase()
}
