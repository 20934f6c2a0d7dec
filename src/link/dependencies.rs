//! Resolving ruleset-to-ruleset imports.
//!
//! This pass only decides which rulesets feed which and in what order they
//! must be resolved; concrete rule links are made by [`super::rules`].

use std::collections::HashMap;

use crate::diagnostic::Diagnostic;
use crate::error::CatalogError;
use crate::model::{RawReference, Ruleset};

/// One entry of a ruleset's replay list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    /// Import everything the ruleset at this index resolves to.
    Import(usize),
    /// Import one named rule of what the ruleset at this index resolves to.
    ImportRule(usize, String),
    /// A rule/category include or a rule exclude, applied as-is.
    Apply(RawReference),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DependencyPlan {
    /// Per ruleset (same indices as the input slice), in document order.
    pub steps: Vec<Vec<Step>>,
    /// Every import target appears before the rulesets importing it.
    pub resolution_order: Vec<usize>,
    pub diagnostics: Vec<Diagnostic>,
}

impl DependencyPlan {
    /// Indices of the rulesets `index` imports whole, first occurrence order.
    pub fn imports_of(&self, index: usize) -> Vec<usize> {
        let mut targets = Vec::new();
        for step in &self.steps[index] {
            if let Step::Import(target) = step {
                if !targets.contains(target) {
                    targets.push(*target);
                }
            }
        }
        targets
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mark {
    Unvisited,
    Visiting,
    Done,
}

/// Resolve the import references of every ruleset of one language.
///
/// Imports of unknown paths are dropped with a warning diagnostic. A
/// ruleset that transitively imports itself is an error.
pub fn link_dependencies(
    language: &str,
    rulesets: &[Ruleset],
) -> Result<DependencyPlan, CatalogError> {
    let by_path: HashMap<&str, usize> = rulesets
        .iter()
        .enumerate()
        .map(|(i, rs)| (rs.path.as_str(), i))
        .collect();

    let mut diagnostics = Vec::new();
    let steps: Vec<Vec<Step>> = rulesets
        .iter()
        .map(|ruleset| {
            ruleset
                .references
                .iter()
                .filter_map(|reference| {
                    let (path, rule) = match reference {
                        RawReference::ImportRuleset { path } => (path, None),
                        RawReference::IncludeFromRuleset { ruleset: target, rule } => (target, Some(rule)),
                        other => return Some(Step::Apply(other.clone())),
                    };
                    match (by_path.get(path.as_str()), rule) {
                        (Some(&target), None) => Some(Step::Import(target)),
                        (Some(&target), Some(rule)) => Some(Step::ImportRule(target, rule.clone())),
                        (None, _) => {
                            let err = CatalogError::DanglingRulesetReference {
                                ruleset: ruleset.path.clone(),
                                missing: path.clone(),
                            };
                            tracing::warn!(language, "{err}");
                            diagnostics.push(Diagnostic::warning(language, &err));
                            None
                        }
                    }
                })
                .collect()
        })
        .collect();

    let resolution_order = resolution_order(rulesets, &steps)?;
    tracing::debug!(
        language,
        rulesets = rulesets.len(),
        dangling = diagnostics.len(),
        "linked ruleset dependencies"
    );

    Ok(DependencyPlan {
        steps,
        resolution_order,
        diagnostics,
    })
}

/// Depth-first post-order over the import graph with an explicit stack.
fn resolution_order(rulesets: &[Ruleset], steps: &[Vec<Step>]) -> Result<Vec<usize>, CatalogError> {
    let imports: Vec<Vec<usize>> = steps
        .iter()
        .map(|s| {
            s.iter()
                .filter_map(|step| match step {
                    Step::Import(target) | Step::ImportRule(target, _) => Some(*target),
                    Step::Apply(_) => None,
                })
                .collect()
        })
        .collect();

    let mut marks = vec![Mark::Unvisited; rulesets.len()];
    let mut order = Vec::with_capacity(rulesets.len());

    for root in 0..rulesets.len() {
        if marks[root] != Mark::Unvisited {
            continue;
        }
        marks[root] = Mark::Visiting;
        // (ruleset index, next import to follow)
        let mut stack: Vec<(usize, usize)> = vec![(root, 0)];

        while let Some(frame) = stack.last_mut() {
            let node = frame.0;
            let Some(&target) = imports[node].get(frame.1) else {
                marks[node] = Mark::Done;
                order.push(node);
                stack.pop();
                continue;
            };
            frame.1 += 1;

            match marks[target] {
                Mark::Done => {}
                Mark::Unvisited => {
                    marks[target] = Mark::Visiting;
                    stack.push((target, 0));
                }
                Mark::Visiting => {
                    let start = stack.iter().position(|&(n, _)| n == target).unwrap_or(0);
                    let mut cycle: Vec<String> = stack[start..]
                        .iter()
                        .map(|&(n, _)| rulesets[n].path.clone())
                        .collect();
                    cycle.push(rulesets[target].path.clone());
                    return Err(CatalogError::CyclicRulesetReference { cycle });
                }
            }
        }
    }

    Ok(order)
}
