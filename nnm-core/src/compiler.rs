//! compiler.rs - Compiles and caches the phrase patterns.
//!
//! A `PhraseConfig` is turned into `PhrasePatterns`, an ordered list of
//! case-insensitive regular expressions each paired with the capture group that
//! marks its redacted subspan. Compiled sets are cached process-wide, keyed by a
//! hash of the config, so every page agent shares one compiled list.
//!
//! License: MIT OR Apache-2.0

use anyhow::{Context, Result};
use lazy_static::lazy_static;
use log::{debug, warn};
use regex::{Regex, RegexBuilder};
use std::collections::hash_map::DefaultHasher;
use std::collections::HashMap;
use std::hash::{Hash, Hasher};
use std::sync::{Arc, RwLock};

use crate::config::{PhraseConfig, PhraseRule, MAX_PATTERN_LENGTH};
use crate::errors::NnmError;

/// One compiled phrase rule.
#[derive(Debug)]
pub struct CompiledPattern {
    pub name: String,
    pub regex: Regex,
    /// Capture group holding the redacted subspan.
    pub group: usize,
}

/// The ordered, compiled phrase list.
#[derive(Debug)]
pub struct PhrasePatterns {
    pub patterns: Vec<CompiledPattern>,
}

impl PhrasePatterns {
    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &CompiledPattern> {
        self.patterns.iter()
    }
}

lazy_static! {
    static ref COMPILED_PATTERNS_CACHE: RwLock<HashMap<u64, Arc<PhrasePatterns>>> =
        RwLock::new(HashMap::new());
}

fn hash_config(config: &PhraseConfig) -> u64 {
    let mut hasher = DefaultHasher::new();
    config.hash(&mut hasher);
    hasher.finish()
}

/// Compiles rules in order. Disabled rules are skipped.
pub fn compile_rules(rules: Vec<PhraseRule>) -> Result<PhrasePatterns, NnmError> {
    debug!("Starting compilation of {} phrase rules.", rules.len());
    let mut patterns = Vec::new();
    let mut errors = Vec::new();

    for rule in rules {
        if !rule.is_enabled() {
            warn!("Skipping rule '{}' because it is disabled.", rule.name);
            continue;
        }
        if rule.pattern.len() > MAX_PATTERN_LENGTH {
            errors.push(NnmError::PatternLengthExceeded(
                rule.name,
                rule.pattern.len(),
                MAX_PATTERN_LENGTH,
            ));
            continue;
        }
        let regex = match RegexBuilder::new(&rule.pattern)
            .case_insensitive(true)
            .size_limit(10 * (1 << 20))
            .build()
        {
            Ok(regex) => regex,
            Err(e) => {
                errors.push(NnmError::RuleCompilationError(rule.name, e));
                continue;
            }
        };
        if rule.capture_group == 0 || rule.capture_group >= regex.captures_len() {
            errors.push(NnmError::InvalidRule(
                rule.name,
                format!("capture group {} does not exist", rule.capture_group),
            ));
            continue;
        }
        debug!("Rule '{}' compiled successfully.", rule.name);
        patterns.push(CompiledPattern {
            name: rule.name,
            regex,
            group: rule.capture_group,
        });
    }

    if !errors.is_empty() {
        let message = errors
            .iter()
            .map(|e| e.to_string())
            .collect::<Vec<_>>()
            .join("\n");
        return Err(NnmError::Fatal(format!(
            "Failed to compile {} rule(s):\n{}",
            errors.len(),
            message
        )));
    }
    debug!("Finished compiling phrase rules. Total compiled: {}.", patterns.len());
    Ok(PhrasePatterns { patterns })
}

/// Returns the compiled patterns for `config`, compiling them on first use.
pub fn get_or_compile_patterns(config: &PhraseConfig) -> Result<Arc<PhrasePatterns>> {
    let key = hash_config(config);
    {
        let cache = COMPILED_PATTERNS_CACHE
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if let Some(patterns) = cache.get(&key) {
            debug!("Serving compiled patterns from cache for key: {}", key);
            return Ok(Arc::clone(patterns));
        }
    }

    let compiled = Arc::new(compile_rules(config.rules.clone())?);
    COMPILED_PATTERNS_CACHE
        .write()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
        .insert(key, Arc::clone(&compiled));
    debug!("Compiled and cached phrase patterns for key: {}", key);
    Ok(compiled)
}

/// The built-in phrase list, compiled.
pub fn default_patterns() -> Result<Arc<PhrasePatterns>> {
    let config = PhraseConfig::load_default_rules()?;
    get_or_compile_patterns(&config).context("Failed to compile the built-in phrase list")
}
