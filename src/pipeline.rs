//! Per-language scan, extract and link, and the fan-out over languages.

use std::collections::HashMap;

use rayon::prelude::*;

use crate::archive::{self, DefinitionSource, ScannedArchive, ZipDefinitionSource};
use crate::catalog::{Catalog, CatalogBuilder, LanguageCatalog};
use crate::config::{CatalogerConfig, ReferenceGrammar};
use crate::diagnostic::Diagnostic;
use crate::error::CatalogError;
use crate::extract::{extract_category, extract_ruleset_shell};
use crate::link::link;
use crate::model::{Category, Rule, Ruleset};

/// Categories, rules and ruleset shells of one language, before linking.
#[derive(Debug, Clone, Default)]
pub struct Extracted {
    pub categories: Vec<Category>,
    pub rules: Vec<Rule>,
    pub rulesets: Vec<Ruleset>,
}

/// Read and parse every definition file the scan found.
pub fn extract_language(
    language: &str,
    scanned: &ScannedArchive,
    source: &dyn DefinitionSource,
    grammar: &ReferenceGrammar,
) -> Result<Extracted, CatalogError> {
    let mut extracted = Extracted::default();
    let mut seen: HashMap<String, String> = HashMap::new();

    for path in &scanned.category_paths {
        let xml = source.read_definition(path)?;
        let (category, rules) = extract_category(language, path, &xml)?;
        if let Some(first) = seen.insert(category.name.clone(), path.clone()) {
            return Err(CatalogError::MalformedDefinition {
                path: path.clone(),
                reason: format!("category `{}` is already defined by {first}", category.name),
            });
        }
        extracted.categories.push(category);
        extracted.rules.extend(rules);
    }

    for path in &scanned.ruleset_paths {
        let xml = source.read_definition(path)?;
        extracted
            .rulesets
            .push(extract_ruleset_shell(language, path, &xml, grammar)?);
    }

    tracing::debug!(
        language,
        categories = extracted.categories.len(),
        rules = extracted.rules.len(),
        rulesets = extracted.rulesets.len(),
        "extracted definitions"
    );
    Ok(extracted)
}

/// Extract and link one language whose definitions come from `source`.
pub fn catalog_language(
    language: &str,
    scanned: &ScannedArchive,
    source: &dyn DefinitionSource,
    grammar: &ReferenceGrammar,
) -> Result<LanguageCatalog, CatalogError> {
    let extracted = extract_language(language, scanned, source, grammar)?;
    let linked = link(
        language,
        &extracted.categories,
        extracted.rules,
        extracted.rulesets,
    )?;
    tracing::info!(
        language,
        rules = linked.rules.len(),
        rulesets = linked.rulesets.len(),
        warnings = linked.diagnostics.len(),
        "catalogued language"
    );
    Ok(LanguageCatalog::new(language, extracted.categories, linked))
}

/// Scan `language`'s archive and catalog it.
pub fn catalog_archive(
    language: &str,
    config: &CatalogerConfig,
) -> Result<LanguageCatalog, CatalogError> {
    let scanned = archive::scan(language, config)?;
    let source = ZipDefinitionSource::new(&scanned.archive);
    catalog_language(language, &scanned, &source, &config.grammar)
}

/// A language left out of the catalog under keep-going.
#[derive(Debug)]
pub struct LanguageFailure {
    pub language: String,
    pub error: CatalogError,
}

#[derive(Debug)]
pub struct BuildOutcome {
    pub catalog: Catalog,
    pub failures: Vec<LanguageFailure>,
}

/// Catalog every configured language and assemble the result.
///
/// Languages are independent and run in parallel; results are merged in
/// configured order once all of them are done. Without `keep_going` the
/// first failing language (in configured order) fails the build.
pub fn build_catalog(
    config: &CatalogerConfig,
    keep_going: bool,
) -> Result<BuildOutcome, CatalogError> {
    let results: Vec<(String, Result<LanguageCatalog, CatalogError>)> = config
        .languages
        .par_iter()
        .map(|language| (language.clone(), catalog_archive(language, config)))
        .collect();

    let mut builder = CatalogBuilder::new(&config.languages);
    let mut failures = Vec::new();
    let mut skipped = Vec::new();
    for (language, result) in results {
        match result {
            Ok(part) => builder.add(part),
            Err(error) if keep_going => {
                tracing::error!(language = %language, "skipping language: {error}");
                builder.skip(&language);
                skipped.push(Diagnostic::error(&language, &error));
                failures.push(LanguageFailure { language, error });
            }
            Err(error) => return Err(error),
        }
    }

    let mut catalog = builder.assemble()?;
    catalog.diagnostics.extend(skipped);
    Ok(BuildOutcome { catalog, failures })
}
