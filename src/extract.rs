//! Turning category and ruleset XML documents into catalog entities.
//!
//! A category file looks like
//!
//! ```xml
//! <ruleset name="Best Practices">
//!   <rule name="AvoidGlobalModifier" message="..." since="5.5.0" class="...">
//!     <description>...</description>
//!     <priority>3</priority>
//!   </rule>
//! </ruleset>
//! ```
//!
//! and a ruleset file references rules, categories and other rulesets:
//!
//! ```xml
//! <ruleset name="quickstart">
//!   <rule ref="category/apex/design.xml/ExcessiveClassLength"/>
//!   <rule ref="category/apex/errorprone.xml"><exclude name="EmptyCatchBlock"/></rule>
//!   <rule ref="rulesets/apex/style.xml"/>
//!   <rule ref="rulesets/apex/legacy.xml/AvoidGlobalModifier"/>
//! </ruleset>
//! ```
//!
//! Extraction captures references verbatim; nothing is resolved here.

use std::collections::HashSet;

use roxmltree::{Document, Node};

use crate::config::ReferenceGrammar;
use crate::error::CatalogError;
use crate::model::{Category, RawReference, Rule, RuleMetadata, Ruleset};

fn malformed(path: &str, reason: impl Into<String>) -> CatalogError {
    CatalogError::MalformedDefinition {
        path: path.to_string(),
        reason: reason.into(),
    }
}

fn parse<'a>(path: &str, xml: &'a str) -> Result<Document<'a>, CatalogError> {
    Document::parse(xml).map_err(|e| malformed(path, e.to_string()))
}

fn required_name<'a>(path: &str, node: Node<'a, '_>) -> Result<&'a str, CatalogError> {
    match node.attribute("name") {
        Some(name) if !name.trim().is_empty() => Ok(name),
        _ => Err(malformed(
            path,
            format!(
                "<{}> element is missing a `name` attribute",
                node.tag_name().name()
            ),
        )),
    }
}

fn child_text(node: Node<'_, '_>, tag: &str) -> Option<String> {
    node.children()
        .find(|c| c.has_tag_name(tag))
        .and_then(|c| c.text())
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
}

fn element_children<'a, 'input>(
    node: Node<'a, 'input>,
    tag: &'a str,
) -> impl Iterator<Item = Node<'a, 'input>> {
    node.children().filter(move |c| c.has_tag_name(tag))
}

/// Parse a category file into its category and the rules it declares.
pub fn extract_category(
    language: &str,
    path: &str,
    xml: &str,
) -> Result<(Category, Vec<Rule>), CatalogError> {
    let doc = parse(path, xml)?;
    let root = doc.root_element();
    let category = Category {
        name: required_name(path, root)?.to_string(),
        path: path.to_string(),
        language: language.to_string(),
    };

    let mut rules = Vec::new();
    let mut seen = HashSet::new();
    for node in element_children(root, "rule") {
        let name = required_name(path, node)?;
        if !seen.insert(name) {
            return Err(malformed(
                path,
                format!("rule `{name}` is defined more than once"),
            ));
        }
        rules.push(Rule {
            name: name.to_string(),
            category: category.name.clone(),
            category_path: category.path.clone(),
            language: language.to_string(),
            metadata: rule_metadata(node),
            rulesets: Vec::new(),
        });
    }

    Ok((category, rules))
}

fn rule_metadata(node: Node<'_, '_>) -> RuleMetadata {
    RuleMetadata {
        message: node.attribute("message").map(String::from),
        description: child_text(node, "description"),
        priority: child_text(node, "priority").and_then(|p| p.parse().ok()),
        since: node.attribute("since").map(String::from),
        class: node.attribute("class").map(String::from),
        external_info_url: node.attribute("externalInfoUrl").map(String::from),
        // Renamed rules stay behind as `deprecated="true"` aliases with a `ref`.
        deprecated: node.attribute("deprecated") == Some("true"),
    }
}

/// Parse a ruleset file into an unlinked ruleset.
pub fn extract_ruleset_shell(
    language: &str,
    path: &str,
    xml: &str,
    grammar: &ReferenceGrammar,
) -> Result<Ruleset, CatalogError> {
    let doc = parse(path, xml)?;
    let root = doc.root_element();
    let mut ruleset = Ruleset::shell(language, path, required_name(path, root)?.to_string());
    ruleset.description = child_text(root, "description");

    for node in element_children(root, "rule") {
        let Some(target) = node.attribute("ref") else {
            // Rules defined inline in a ruleset are not catalogued.
            continue;
        };
        let reference = classify_reference(target.trim(), grammar);
        let exclude_source = match &reference {
            RawReference::IncludeCategory { path } => Some(path.clone()),
            _ => None,
        };
        ruleset.references.push(reference);

        for exclude in element_children(node, "exclude") {
            let rule = required_name(path, exclude)?;
            ruleset.references.push(RawReference::ExcludeRule {
                source: exclude_source.clone(),
                rule: rule.to_string(),
            });
        }
    }

    Ok(ruleset)
}

/// Read a `ref` attribute according to the grammar.
pub fn classify_reference(target: &str, grammar: &ReferenceGrammar) -> RawReference {
    if grammar.is_definition(target) {
        return if target.starts_with(&grammar.ruleset_root) {
            RawReference::ImportRuleset {
                path: target.to_string(),
            }
        } else {
            RawReference::IncludeCategory {
                path: target.to_string(),
            }
        };
    }
    match target.rsplit_once('/') {
        Some((source, rule)) if grammar.is_ruleset_file(source) => {
            RawReference::IncludeFromRuleset {
                ruleset: source.to_string(),
                rule: rule.to_string(),
            }
        }
        Some((source, rule)) => RawReference::IncludeRule {
            source: source.to_string(),
            rule: rule.to_string(),
        },
        None => RawReference::IncludeRule {
            source: String::new(),
            rule: target.to_string(),
        },
    }
}
