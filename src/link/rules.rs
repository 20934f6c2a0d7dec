//! Resolving ruleset references to concrete rules.
//!
//! Each ruleset's steps are replayed once, in document order, over an
//! ordered de-duplicated rule list. Imports contribute whatever the target
//! already resolved to, which is why rulesets are visited in the
//! dependency plan's resolution order.

use std::collections::{HashMap, HashSet};

use crate::diagnostic::Diagnostic;
use crate::error::CatalogError;
use crate::link::dependencies::{DependencyPlan, Step};
use crate::model::{Category, RawReference, ResolvedRule, Rule, RuleId, Ruleset};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RuleLinks {
    /// Per ruleset, same indices as the input slice.
    pub resolved: Vec<Vec<ResolvedRule>>,
    pub diagnostics: Vec<Diagnostic>,
}

/// Immutable lookups over one language's rules.
struct RuleIndex<'a> {
    rules: &'a [Rule],
    /// Keyed by (category path, rule) and (category name, rule).
    qualified: HashMap<(&'a str, &'a str), usize>,
    by_name: HashMap<&'a str, Vec<usize>>,
    categories: HashSet<&'a str>,
}

impl<'a> RuleIndex<'a> {
    fn new(categories: &'a [Category], rules: &'a [Rule]) -> Self {
        let mut qualified = HashMap::new();
        let mut by_name: HashMap<&str, Vec<usize>> = HashMap::new();
        for (i, rule) in rules.iter().enumerate() {
            qualified.insert((rule.category_path.as_str(), rule.name.as_str()), i);
            qualified.insert((rule.category.as_str(), rule.name.as_str()), i);
            by_name.entry(rule.name.as_str()).or_default().push(i);
        }
        let categories = categories
            .iter()
            .flat_map(|c| [c.path.as_str(), c.name.as_str()])
            .collect();
        Self {
            rules,
            qualified,
            by_name,
            categories,
        }
    }

    fn find(&self, source: &str, rule: &str) -> Option<&'a Rule> {
        let index = if source.is_empty() {
            self.by_name.get(rule).and_then(|hits| hits.first()).copied()
        } else {
            self.qualified.get(&(source, rule)).copied()
        };
        index.map(|i| &self.rules[i])
    }

    /// Rules of the category named by `source`; `None` if no such category.
    fn in_category(&self, source: &str) -> Option<Vec<&'a Rule>> {
        if !self.categories.contains(source) {
            return None;
        }
        Some(self.rules.iter().filter(|r| r.in_category(source)).collect())
    }
}

/// Insertion-ordered set of resolved rules.
#[derive(Default)]
struct ResolvedSet {
    rules: Vec<ResolvedRule>,
    present: HashSet<RuleId>,
}

impl ResolvedSet {
    fn insert(&mut self, id: RuleId, via: Vec<String>) {
        if self.present.insert(id.clone()) {
            self.rules.push(ResolvedRule { id, via });
        }
    }

    fn remove_where(&mut self, pred: impl Fn(&RuleId) -> bool) {
        self.rules.retain(|r| !pred(&r.id));
        self.present.retain(|id| !pred(id));
    }
}

/// Replay every ruleset's steps and produce its resolved rule list.
pub fn link_rules(
    language: &str,
    categories: &[Category],
    rules: &[Rule],
    rulesets: &[Ruleset],
    plan: &DependencyPlan,
) -> RuleLinks {
    let index = RuleIndex::new(categories, rules);
    let mut resolved: Vec<Vec<ResolvedRule>> = vec![Vec::new(); rulesets.len()];
    let mut diagnostics = Vec::new();

    for &current in &plan.resolution_order {
        let ruleset = &rulesets[current];
        let mut set = ResolvedSet::default();
        let mut dangling = |reference: &RawReference| {
            let err = CatalogError::DanglingRuleReference {
                ruleset: ruleset.path.clone(),
                reference: reference.to_string(),
            };
            tracing::warn!(language, "{err}");
            diagnostics.push(Diagnostic::warning(language, &err));
        };

        for step in &plan.steps[current] {
            match step {
                Step::Import(target) => {
                    let target_path = &rulesets[*target].path;
                    for inherited in &resolved[*target] {
                        let mut via = Vec::with_capacity(inherited.via.len() + 1);
                        via.push(target_path.clone());
                        via.extend(inherited.via.iter().cloned());
                        set.insert(inherited.id.clone(), via);
                    }
                }
                Step::ImportRule(target, rule) => {
                    let target_path = &rulesets[*target].path;
                    match resolved[*target].iter().find(|r| r.id.name == *rule) {
                        Some(inherited) => {
                            let mut via = Vec::with_capacity(inherited.via.len() + 1);
                            via.push(target_path.clone());
                            via.extend(inherited.via.iter().cloned());
                            set.insert(inherited.id.clone(), via);
                        }
                        None => dangling(&RawReference::IncludeFromRuleset {
                            ruleset: target_path.clone(),
                            rule: rule.clone(),
                        }),
                    }
                }
                Step::Apply(reference @ RawReference::IncludeRule { source, rule }) => {
                    match index.find(source, rule) {
                        Some(found) => set.insert(found.id(), Vec::new()),
                        None => dangling(reference),
                    }
                }
                Step::Apply(reference @ RawReference::IncludeCategory { path }) => {
                    match index.in_category(path) {
                        Some(members) => {
                            for member in members {
                                set.insert(member.id(), Vec::new());
                            }
                        }
                        None => dangling(reference),
                    }
                }
                Step::Apply(RawReference::ExcludeRule { source, rule }) => match source {
                    Some(source) => {
                        if let Some(found) = index.find(source, rule) {
                            let id = found.id();
                            set.remove_where(|r| *r == id);
                        }
                    }
                    None => set.remove_where(|r| r.name == *rule),
                },
                // Turned into `Step::Import`/`Step::ImportRule` by the dependency pass.
                Step::Apply(
                    RawReference::ImportRuleset { .. } | RawReference::IncludeFromRuleset { .. },
                ) => {}
            }
        }

        resolved[current] = set.rules;
    }

    tracing::debug!(
        language,
        rulesets = rulesets.len(),
        dangling = diagnostics.len(),
        "linked rules to rulesets"
    );
    RuleLinks {
        resolved,
        diagnostics,
    }
}

/// New rule and ruleset values carrying the resolved relationships.
pub fn apply_memberships(
    rules: Vec<Rule>,
    rulesets: Vec<Ruleset>,
    plan: &DependencyPlan,
    links: RuleLinks,
) -> (Vec<Rule>, Vec<Ruleset>) {
    let mut membership: HashMap<RuleId, Vec<String>> = HashMap::new();
    for (ruleset, resolved) in rulesets.iter().zip(&links.resolved) {
        for r in resolved {
            membership
                .entry(r.id.clone())
                .or_default()
                .push(ruleset.path.clone());
        }
    }

    let rules = rules
        .into_iter()
        .map(|rule| {
            let mut paths = membership.remove(&rule.id()).unwrap_or_default();
            paths.sort();
            paths.dedup();
            Rule {
                rulesets: paths,
                ..rule
            }
        })
        .collect();

    let paths: Vec<String> = rulesets.iter().map(|rs| rs.path.clone()).collect();
    let rulesets = rulesets
        .into_iter()
        .zip(links.resolved)
        .enumerate()
        .map(|(i, (ruleset, resolved))| Ruleset {
            rules: resolved,
            imports: plan
                .imports_of(i)
                .into_iter()
                .map(|t| paths[t].clone())
                .collect(),
            ..ruleset
        })
        .collect();

    (rules, rulesets)
}
