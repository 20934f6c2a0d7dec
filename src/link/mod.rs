pub mod dependencies;
pub mod rules;

use crate::diagnostic::Diagnostic;
use crate::error::CatalogError;
use crate::model::{Category, Rule, Ruleset};

pub use dependencies::{DependencyPlan, Step, link_dependencies};
pub use rules::{RuleLinks, apply_memberships, link_rules};

/// One language's entities after both linking passes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Linked {
    pub rules: Vec<Rule>,
    pub rulesets: Vec<Ruleset>,
    pub diagnostics: Vec<Diagnostic>,
}

/// Run the dependency pass, then the rule pass, over one language.
///
/// Only a cyclic import fails; dangling references come back as diagnostics.
pub fn link(
    language: &str,
    categories: &[Category],
    rules: Vec<Rule>,
    rulesets: Vec<Ruleset>,
) -> Result<Linked, CatalogError> {
    let plan = link_dependencies(language, &rulesets)?;
    let links = link_rules(language, categories, &rules, &rulesets, &plan);

    let mut diagnostics = plan.diagnostics.clone();
    diagnostics.extend(links.diagnostics.iter().cloned());
    let (rules, rulesets) = apply_memberships(rules, rulesets, &plan, links);

    Ok(Linked {
        rules,
        rulesets,
        diagnostics,
    })
}
