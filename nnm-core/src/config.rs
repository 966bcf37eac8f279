//! Phrase rule configuration for `nnm-core`.
//!
//! The phrase list is fixed at build time: it is embedded from
//! `config/phrases.yaml`, parsed with `serde_yml` and validated before it is
//! compiled. Each rule is one regular expression for one language or script plus
//! the index of the capture group that marks the redacted subspan.
//!
//! License: MIT OR Apache-2.0

use anyhow::{anyhow, Context, Result};
use log::debug;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Maximum allowed length for a pattern string.
pub const MAX_PATTERN_LENGTH: usize = 500;

fn default_capture_group() -> usize {
    1
}

/// A single phrase rule.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize, Serialize)]
pub struct PhraseRule {
    /// Unique identifier, usually the language (e.g. "english").
    pub name: String,
    /// The phrase as it is written, for humans.
    #[serde(default)]
    pub description: Option<String>,
    /// Regular expression, matched case-insensitively.
    pub pattern: String,
    /// Capture group holding the part of the match that is redacted.
    #[serde(default = "default_capture_group")]
    pub capture_group: usize,
    /// Explicit override for disabling the rule.
    #[serde(default)]
    pub enabled: Option<bool>,
}

impl PhraseRule {
    pub fn new(name: &str, pattern: &str, capture_group: usize) -> Self {
        Self {
            name: name.to_string(),
            description: None,
            pattern: pattern.to_string(),
            capture_group,
            enabled: None,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled != Some(false)
    }
}

/// The ordered list of phrase rules.
#[derive(Debug, Default, Clone, PartialEq, Eq, Hash, Deserialize, Serialize)]
pub struct PhraseConfig {
    pub rules: Vec<PhraseRule>,
}

impl PhraseConfig {
    /// Loads the built-in phrase list.
    pub fn load_default_rules() -> Result<Self> {
        debug!("Loading default phrase rules from embedded string...");
        let default_yaml = include_str!("../config/phrases.yaml");
        let config: PhraseConfig =
            serde_yml::from_str(default_yaml).context("Failed to parse default phrase rules")?;
        validate_rules(&config.rules).context("Default phrase rules are invalid")?;
        debug!("Loaded {} default phrase rules.", config.rules.len());
        Ok(config)
    }
}

/// Validates rule integrity: unique names, compilable patterns and a capture group
/// that exists in the pattern.
pub fn validate_rules(rules: &[PhraseRule]) -> Result<()> {
    let mut rule_names = HashSet::new();
    let mut errors = Vec::new();

    for rule in rules {
        if rule.name.is_empty() {
            errors.push("A rule has an empty `name` field.".to_string());
        } else if !rule_names.insert(rule.name.as_str()) {
            errors.push(format!("Duplicate rule name found: '{}'.", rule.name));
        }

        if rule.pattern.is_empty() {
            errors.push(format!("Rule '{}' has an empty `pattern` field.", rule.name));
            continue;
        }
        if rule.pattern.len() > MAX_PATTERN_LENGTH {
            errors.push(format!(
                "Rule '{}': pattern length ({}) exceeds maximum allowed ({}).",
                rule.name,
                rule.pattern.len(),
                MAX_PATTERN_LENGTH
            ));
            continue;
        }

        let regex = match Regex::new(&rule.pattern) {
            Ok(regex) => regex,
            Err(e) => {
                errors.push(format!("Rule '{}' has an invalid regex pattern: {}", rule.name, e));
                continue;
            }
        };

        // captures_len() counts the implicit whole-match group 0.
        let groups = regex.captures_len() - 1;
        if rule.capture_group == 0 || rule.capture_group > groups {
            errors.push(format!(
                "Rule '{}': capture group {} does not exist (pattern has {}).",
                rule.name, rule.capture_group, groups
            ));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(anyhow!("Rule validation failed:\n{}", errors.join("\n")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_rules_load_and_validate() {
        let config = PhraseConfig::load_default_rules().unwrap();
        assert_eq!(config.rules.len(), 7);
        assert_eq!(config.rules[0].name, "english");
        assert!(config.rules.iter().all(|r| r.capture_group == 1 && r.is_enabled()));
    }

    #[test]
    fn test_validation_reports_every_problem() {
        let rules = vec![
            PhraseRule::new("dup", "(a)b", 1),
            PhraseRule::new("dup", "ab", 1),
            PhraseRule::new("broken", "(a", 1),
            PhraseRule::new("", "(x)", 0),
        ];
        let message = validate_rules(&rules).unwrap_err().to_string();
        assert!(message.contains("Duplicate rule name found: 'dup'"));
        assert!(message.contains("capture group 1 does not exist (pattern has 0)"));
        assert!(message.contains("Rule 'broken' has an invalid regex pattern"));
        assert!(message.contains("empty `name`"));
        assert!(message.contains("capture group 0 does not exist"));
    }
}
