//! Locating per-language rule archives and enumerating/reading the
//! definition files inside them.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::{Path, PathBuf};

use zip::ZipArchive;

use crate::config::{CatalogerConfig, EngineConfig, ReferenceGrammar};
use crate::error::CatalogError;

/// Definition files found in one language's archive, in archive order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScannedArchive {
    pub archive: PathBuf,
    pub category_paths: Vec<String>,
    pub ruleset_paths: Vec<String>,
}

/// `pmd-apex-6.20.0.jar` for `("apex", 6.20.0)`.
pub fn archive_name(language: &str, engine: &EngineConfig) -> String {
    format!(
        "{}-{}-{}.{}",
        engine.prefix, language, engine.version, engine.archive_extension
    )
}

pub fn archive_path(language: &str, engine: &EngineConfig) -> PathBuf {
    engine.lib_dir.join(archive_name(language, engine))
}

/// Enumerate the category and ruleset files in `language`'s archive.
pub fn scan(language: &str, config: &CatalogerConfig) -> Result<ScannedArchive, CatalogError> {
    let path = archive_path(language, &config.engine);
    if !path.is_file() {
        return Err(CatalogError::ArchiveNotFound {
            language: language.to_string(),
            path,
        });
    }
    let names = entry_names(&path)?;
    let mut scanned = classify_entries(names, &config.grammar);
    scanned.archive = path;
    tracing::debug!(
        language,
        categories = scanned.category_paths.len(),
        rulesets = scanned.ruleset_paths.len(),
        "scanned archive"
    );
    Ok(scanned)
}

/// Sort entry names into category and ruleset files; everything else is dropped.
pub fn classify_entries<I>(names: I, grammar: &ReferenceGrammar) -> ScannedArchive
where
    I: IntoIterator<Item = String>,
{
    let mut scanned = ScannedArchive::default();
    for name in names {
        if grammar.is_category_file(&name) {
            scanned.category_paths.push(name);
        } else if grammar.is_ruleset_file(&name) {
            scanned.ruleset_paths.push(name);
        }
    }
    scanned
}

fn open_archive(path: &Path) -> Result<ZipArchive<BufReader<File>>, CatalogError> {
    let read_error = |source: io::Error| CatalogError::ArchiveReadError {
        path: path.to_path_buf(),
        source,
    };
    let file = File::open(path).map_err(read_error)?;
    ZipArchive::new(BufReader::new(file)).map_err(|e| read_error(e.into()))
}

fn entry_names(path: &Path) -> Result<Vec<String>, CatalogError> {
    let mut archive = open_archive(path)?;
    let mut names = Vec::with_capacity(archive.len());
    for i in 0..archive.len() {
        // Raw access: only the header is needed, not the payload.
        let entry = archive
            .by_index_raw(i)
            .map_err(|e| CatalogError::ArchiveReadError {
                path: path.to_path_buf(),
                source: e.into(),
            })?;
        names.push(entry.name().to_string());
    }
    Ok(names)
}

/// Where the extractor reads definition files from.
pub trait DefinitionSource: Sync {
    fn read_definition(&self, path: &str) -> Result<String, CatalogError>;
}

/// Reads entries straight out of a rule archive. The archive is reopened
/// for every read so no handle outlives the call.
pub struct ZipDefinitionSource {
    archive: PathBuf,
}

impl ZipDefinitionSource {
    pub fn new(archive: impl Into<PathBuf>) -> Self {
        Self {
            archive: archive.into(),
        }
    }
}

impl DefinitionSource for ZipDefinitionSource {
    fn read_definition(&self, path: &str) -> Result<String, CatalogError> {
        let read_error = |source: io::Error| CatalogError::ArchiveReadError {
            path: self.archive.clone(),
            source,
        };
        let mut archive = open_archive(&self.archive)?;
        let mut entry = archive.by_name(path).map_err(|e| read_error(e.into()))?;
        let mut bytes = Vec::new();
        entry.read_to_end(&mut bytes).map_err(read_error)?;
        String::from_utf8(bytes).map_err(|e| CatalogError::MalformedDefinition {
            path: path.to_string(),
            reason: format!("not valid UTF-8: {e}"),
        })
    }
}

/// Definitions held in memory, keyed by archive-relative path.
#[derive(Debug, Clone, Default)]
pub struct MemoryDefinitionSource {
    files: BTreeMap<String, String>,
}

impl MemoryDefinitionSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, path: &str, contents: &str) -> Self {
        self.files.insert(path.to_string(), contents.to_string());
        self
    }

    /// All held paths, classified as an archive scan would.
    pub fn scan(&self, grammar: &ReferenceGrammar) -> ScannedArchive {
        classify_entries(self.files.keys().cloned(), grammar)
    }
}

impl DefinitionSource for MemoryDefinitionSource {
    fn read_definition(&self, path: &str) -> Result<String, CatalogError> {
        self.files
            .get(path)
            .cloned()
            .ok_or_else(|| CatalogError::ArchiveReadError {
                path: PathBuf::from(path),
                source: io::Error::new(io::ErrorKind::NotFound, "no such entry"),
            })
    }
}
