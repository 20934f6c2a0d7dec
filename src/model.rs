//! Catalog entities: categories, rules, rulesets and the raw references
//! that tie rulesets to the rest.

use std::fmt;

/// A named grouping of rules, defined by one category file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Category {
    pub name: String,
    /// Archive-relative path of the defining file.
    pub path: String,
    pub language: String,
}

/// Identity of a rule within one language.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RuleId {
    pub category: String,
    pub name: String,
}

impl fmt::Display for RuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.category, self.name)
    }
}

/// Descriptive fields carried by a rule element. Opaque to linking.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RuleMetadata {
    pub message: Option<String>,
    pub description: Option<String>,
    pub priority: Option<u8>,
    pub since: Option<String>,
    pub class: Option<String>,
    pub external_info_url: Option<String>,
    pub deprecated: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rule {
    pub name: String,
    /// Name of the owning category.
    pub category: String,
    pub category_path: String,
    pub language: String,
    pub metadata: RuleMetadata,
    /// Paths of the rulesets that include this rule, sorted. Empty until linked.
    pub rulesets: Vec<String>,
}

impl Rule {
    pub fn id(&self) -> RuleId {
        RuleId {
            category: self.category.clone(),
            name: self.name.clone(),
        }
    }

    /// True if `source` names this rule's category, by path or by name.
    pub fn in_category(&self, source: &str) -> bool {
        self.category_path == source || self.category == source
    }
}

/// An unresolved pointer captured verbatim from a ruleset file.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum RawReference {
    /// Import every rule another ruleset resolves to.
    ImportRuleset { path: String },
    /// Include every rule of a category file.
    IncludeCategory { path: String },
    /// Include one rule. An empty `source` matches by rule name alone.
    IncludeRule { source: String, rule: String },
    /// Include one rule as another ruleset resolves it.
    IncludeFromRuleset { ruleset: String, rule: String },
    /// Remove one rule. `source: None` matches by rule name alone.
    ExcludeRule { source: Option<String>, rule: String },
}

impl fmt::Display for RawReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RawReference::ImportRuleset { path } | RawReference::IncludeCategory { path } => {
                write!(f, "{path}")
            }
            RawReference::IncludeRule { source, rule } if source.is_empty() => write!(f, "{rule}"),
            RawReference::IncludeRule { source, rule } => write!(f, "{source}/{rule}"),
            RawReference::IncludeFromRuleset { ruleset, rule } => write!(f, "{ruleset}/{rule}"),
            RawReference::ExcludeRule { source: None, rule } => write!(f, "!{rule}"),
            RawReference::ExcludeRule {
                source: Some(source),
                rule,
            } => write!(f, "!{source}/{rule}"),
        }
    }
}

/// A rule a ruleset resolved to, with the import chain that brought it in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedRule {
    pub id: RuleId,
    /// Ruleset paths, outermost import first. Empty for direct references.
    pub via: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ruleset {
    pub name: String,
    /// Archive-relative path; the join key for every reference.
    pub path: String,
    pub language: String,
    pub description: Option<String>,
    /// Raw references in document order.
    pub references: Vec<RawReference>,
    /// Resolved rules in application order. Empty until linked.
    pub rules: Vec<ResolvedRule>,
    /// Paths of the rulesets whose imports resolved. Empty until linked.
    pub imports: Vec<String>,
}

impl Ruleset {
    pub fn shell(language: &str, path: &str, name: String) -> Self {
        Self {
            name,
            path: path.to_string(),
            language: language.to_string(),
            description: None,
            references: Vec::new(),
            rules: Vec::new(),
            imports: Vec::new(),
        }
    }
}
