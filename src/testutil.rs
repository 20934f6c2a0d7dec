//! Builders for catalog entities in unit tests.

use crate::model::{Category, RawReference, Rule, RuleMetadata, Ruleset};

pub const LANGUAGE: &str = "java";

/// A category at `path` named `name`, owning `rules`.
pub fn category(name: &str, path: &str, rules: &[&str]) -> (Category, Vec<Rule>) {
    let category = Category {
        name: name.to_string(),
        path: path.to_string(),
        language: LANGUAGE.to_string(),
    };
    let rules = rules
        .iter()
        .map(|rule| Rule {
            name: rule.to_string(),
            category: name.to_string(),
            category_path: path.to_string(),
            language: LANGUAGE.to_string(),
            metadata: RuleMetadata::default(),
            rulesets: Vec::new(),
        })
        .collect();
    (category, rules)
}

/// An unlinked ruleset whose name is its file stem.
pub fn ruleset(path: &str, references: Vec<RawReference>) -> Ruleset {
    let name = path
        .rsplit('/')
        .next()
        .unwrap_or(path)
        .trim_end_matches(".xml")
        .to_string();
    let mut ruleset = Ruleset::shell(LANGUAGE, path, name);
    ruleset.references = references;
    ruleset
}

pub fn include(source: &str, rule: &str) -> RawReference {
    RawReference::IncludeRule {
        source: source.to_string(),
        rule: rule.to_string(),
    }
}

pub fn include_from(ruleset: &str, rule: &str) -> RawReference {
    RawReference::IncludeFromRuleset {
        ruleset: ruleset.to_string(),
        rule: rule.to_string(),
    }
}

pub fn include_category(path: &str) -> RawReference {
    RawReference::IncludeCategory {
        path: path.to_string(),
    }
}

pub fn exclude(source: &str, rule: &str) -> RawReference {
    RawReference::ExcludeRule {
        source: Some(source.to_string()),
        rule: rule.to_string(),
    }
}

pub fn exclude_by_name(rule: &str) -> RawReference {
    RawReference::ExcludeRule {
        source: None,
        rule: rule.to_string(),
    }
}

pub fn import(path: &str) -> RawReference {
    RawReference::ImportRuleset {
        path: path.to_string(),
    }
}

/// Names of the rules `ruleset` resolved to, in order.
pub fn resolved_names(ruleset: &Ruleset) -> Vec<&str> {
    ruleset.rules.iter().map(|r| r.id.name.as_str()).collect()
}
