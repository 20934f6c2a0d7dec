//! Aggregating linked languages into one catalog and writing it out.

use std::collections::BTreeMap;
use std::fs;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use serde::Serialize;

use crate::diagnostic::Diagnostic;
use crate::error::CatalogError;
use crate::link::Linked;
use crate::model::{Category, Rule, Ruleset};

/// Everything catalogued for one language. Only constructible from a
/// finished link, so a builder never holds half-linked data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LanguageCatalog {
    pub language: String,
    pub categories: Vec<Category>,
    pub rules: Vec<Rule>,
    pub rulesets: Vec<Ruleset>,
    pub diagnostics: Vec<Diagnostic>,
}

impl LanguageCatalog {
    pub fn new(language: &str, categories: Vec<Category>, linked: Linked) -> Self {
        Self {
            language: language.to_string(),
            categories,
            rules: linked.rules,
            rulesets: linked.rulesets,
            diagnostics: linked.diagnostics,
        }
    }
}

/// Collects per-language results until every expected language is in.
#[derive(Debug)]
pub struct CatalogBuilder {
    expected: Vec<String>,
    linked: BTreeMap<String, LanguageCatalog>,
    skipped: Vec<String>,
}

impl CatalogBuilder {
    pub fn new(expected: &[String]) -> Self {
        Self {
            expected: expected.to_vec(),
            linked: BTreeMap::new(),
            skipped: Vec::new(),
        }
    }

    pub fn add(&mut self, catalog: LanguageCatalog) {
        self.linked.insert(catalog.language.clone(), catalog);
    }

    /// Leave `language` out of the catalog on purpose.
    pub fn skip(&mut self, language: &str) {
        self.skipped.push(language.to_string());
    }

    /// Merge languages in the configured order.
    pub fn assemble(mut self) -> Result<Catalog, CatalogError> {
        let missing: Vec<String> = self
            .expected
            .iter()
            .filter(|l| !self.linked.contains_key(*l) && !self.skipped.contains(*l))
            .cloned()
            .collect();
        if !missing.is_empty() {
            return Err(CatalogError::IncompleteCatalog { missing });
        }

        let mut catalog = Catalog::default();
        for language in &self.expected {
            let Some(part) = self.linked.remove(language) else {
                continue;
            };
            catalog.categories.extend(part.categories);
            catalog.rules.extend(part.rules);
            catalog.rulesets.extend(part.rulesets);
            catalog.diagnostics.extend(part.diagnostics);
        }
        Ok(catalog)
    }
}

/// The finished catalog across all languages.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Catalog {
    pub categories: Vec<Category>,
    pub rules: Vec<Rule>,
    pub rulesets: Vec<Ruleset>,
    /// Not serialized; reported separately.
    pub diagnostics: Vec<Diagnostic>,
}

#[derive(Serialize)]
struct CatalogJson<'a> {
    rules: Vec<RuleJson<'a>>,
    categories: Vec<CategoryJson<'a>>,
    rulesets: Vec<RulesetJson<'a>>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RuleJson<'a> {
    name: &'a str,
    language: &'a str,
    category: &'a str,
    category_path: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    priority: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    since: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    class: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    external_info_url: Option<&'a str>,
    deprecated: bool,
    rulesets: &'a [String],
}

#[derive(Serialize)]
struct CategoryJson<'a> {
    name: &'a str,
    path: &'a str,
    language: &'a str,
    rules: Vec<&'a str>,
}

#[derive(Serialize)]
struct RulesetJson<'a> {
    name: &'a str,
    path: &'a str,
    language: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<&'a str>,
    imports: &'a [String],
    rules: Vec<RuleRefJson<'a>>,
}

#[derive(Serialize)]
struct RuleRefJson<'a> {
    category: &'a str,
    name: &'a str,
    #[serde(skip_serializing_if = "is_empty")]
    via: &'a [String],
}

fn is_empty(paths: &&[String]) -> bool {
    paths.is_empty()
}

impl Catalog {
    fn to_json(&self) -> CatalogJson<'_> {
        let rules = self
            .rules
            .iter()
            .map(|r| RuleJson {
                name: &r.name,
                language: &r.language,
                category: &r.category,
                category_path: &r.category_path,
                message: r.metadata.message.as_deref(),
                description: r.metadata.description.as_deref(),
                priority: r.metadata.priority,
                since: r.metadata.since.as_deref(),
                class: r.metadata.class.as_deref(),
                external_info_url: r.metadata.external_info_url.as_deref(),
                deprecated: r.metadata.deprecated,
                rulesets: &r.rulesets,
            })
            .collect();

        let categories = self
            .categories
            .iter()
            .map(|c| CategoryJson {
                name: &c.name,
                path: &c.path,
                language: &c.language,
                rules: self
                    .rules
                    .iter()
                    .filter(|r| r.language == c.language && r.category_path == c.path)
                    .map(|r| r.name.as_str())
                    .collect(),
            })
            .collect();

        let rulesets = self
            .rulesets
            .iter()
            .map(|rs| RulesetJson {
                name: &rs.name,
                path: &rs.path,
                language: &rs.language,
                description: rs.description.as_deref(),
                imports: &rs.imports,
                rules: rs
                    .rules
                    .iter()
                    .map(|r| RuleRefJson {
                        category: &r.id.category,
                        name: &r.id.name,
                        via: &r.via,
                    })
                    .collect(),
            })
            .collect();

        CatalogJson {
            rules,
            categories,
            rulesets,
        }
    }

    pub fn write_json(&self, out: &mut dyn Write) -> io::Result<()> {
        serde_json::to_writer_pretty(&mut *out, &self.to_json())?;
        writeln!(out)
    }

    pub fn to_json_string(&self) -> String {
        let mut buf = Vec::new();
        // Writing into memory only fails on serializer bugs.
        self.write_json(&mut buf)
            .expect("catalog should serialize to JSON");
        String::from_utf8(buf).expect("serde_json emits UTF-8")
    }

    /// Per-language entity counts, sorted by language.
    pub fn counts(&self) -> BTreeMap<&str, LanguageCounts> {
        let mut counts: BTreeMap<&str, LanguageCounts> = BTreeMap::new();
        for c in &self.categories {
            counts.entry(c.language.as_str()).or_default().categories += 1;
        }
        for r in &self.rules {
            let entry = counts.entry(r.language.as_str()).or_default();
            entry.rules += 1;
            if r.rulesets.is_empty() {
                entry.unreferenced_rules += 1;
            }
        }
        for rs in &self.rulesets {
            counts.entry(rs.language.as_str()).or_default().rulesets += 1;
        }
        for d in &self.diagnostics {
            counts.entry(d.language.as_str()).or_default().diagnostics += 1;
        }
        counts
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LanguageCounts {
    pub categories: usize,
    pub rules: usize,
    pub rulesets: usize,
    pub unreferenced_rules: usize,
    pub diagnostics: usize,
}

/// Write the catalog to `path`, creating its directory if needed.
pub fn write_catalog(catalog: &Catalog, path: &Path) -> Result<(), CatalogError> {
    let write_error = |source: io::Error| CatalogError::CatalogWriteError {
        path: path.to_path_buf(),
        source,
    };
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(write_error)?;
    }
    let file = fs::File::create(path).map_err(write_error)?;
    let mut out = BufWriter::new(file);
    catalog.write_json(&mut out).map_err(write_error)?;
    out.flush().map_err(write_error)?;
    tracing::info!(
        path = %path.display(),
        rules = catalog.rules.len(),
        categories = catalog.categories.len(),
        rulesets = catalog.rulesets.len(),
        "wrote catalog"
    );
    Ok(())
}

/// Write per-language counts as a table.
pub fn print_summary(catalog: &Catalog, out: &mut dyn Write) -> io::Result<()> {
    writeln!(
        out,
        "{:<14} {:>10} {:>8} {:>9} {:>13} {:>12}",
        "Language", "Categories", "Rules", "Rulesets", "Unreferenced", "Diagnostics"
    )?;
    writeln!(out, "{}", "-".repeat(71))?;

    let counts = catalog.counts();
    for (language, c) in &counts {
        writeln!(
            out,
            "{:<14} {:>10} {:>8} {:>9} {:>13} {:>12}",
            language, c.categories, c.rules, c.rulesets, c.unreferenced_rules, c.diagnostics
        )?;
    }

    writeln!(out)?;
    writeln!(
        out,
        "{} languages, {} categories, {} rules, {} rulesets",
        counts.len(),
        catalog.categories.len(),
        catalog.rules.len(),
        catalog.rulesets.len()
    )
}
