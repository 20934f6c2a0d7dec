use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde_yml::Value;

use crate::cli::Args;

/// How archives are named and where they live.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    pub prefix: String,
    pub version: String,
    pub archive_extension: String,
    pub lib_dir: PathBuf,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            prefix: "pmd".to_string(),
            version: "6.20.0".to_string(),
            archive_extension: "jar".to_string(),
            lib_dir: PathBuf::from("dist/pmd/lib"),
        }
    }
}

/// Where definitions live inside an archive and how `ref` attributes are read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReferenceGrammar {
    /// Entry-name prefix of category files (`category/java/bestpractices.xml`).
    pub category_root: String,
    /// Entry-name prefix of ruleset files (`rulesets/java/quickstart.xml`).
    pub ruleset_root: String,
    pub extension: String,
}

impl Default for ReferenceGrammar {
    fn default() -> Self {
        Self {
            category_root: "category".to_string(),
            ruleset_root: "rulesets".to_string(),
            extension: ".xml".to_string(),
        }
    }
}

impl ReferenceGrammar {
    pub fn is_definition(&self, entry: &str) -> bool {
        entry.ends_with(&self.extension)
    }

    pub fn is_category_file(&self, entry: &str) -> bool {
        self.is_definition(entry) && entry.starts_with(&self.category_root)
    }

    pub fn is_ruleset_file(&self, entry: &str) -> bool {
        self.is_definition(entry) && entry.starts_with(&self.ruleset_root)
    }
}

/// Resolved configuration from `cataloger.yml` plus command-line overrides.
#[derive(Debug, Clone)]
pub struct CatalogerConfig {
    pub engine: EngineConfig,
    pub languages: Vec<String>,
    pub output: PathBuf,
    pub grammar: ReferenceGrammar,
    config_path: Option<PathBuf>,
}

impl Default for CatalogerConfig {
    fn default() -> Self {
        Self {
            engine: EngineConfig::default(),
            languages: vec![
                "apex".to_string(),
                "java".to_string(),
                "javascript".to_string(),
            ],
            output: PathBuf::from("catalogs/PmdCatalog.json"),
            grammar: ReferenceGrammar::default(),
            config_path: None,
        }
    }
}

impl CatalogerConfig {
    /// The file this config was read from, if any.
    pub fn config_path(&self) -> Option<&Path> {
        self.config_path.as_deref()
    }

    /// Command-line flags win over the config file.
    pub fn apply_args(&mut self, args: &Args) {
        if let Some(version) = &args.engine_version {
            self.engine.version = version.clone();
        }
        if let Some(dir) = &args.lib_dir {
            self.engine.lib_dir = dir.clone();
        }
        if !args.languages.is_empty() {
            self.languages = args.languages.clone();
        }
        if let Some(output) = &args.output {
            self.output = output.clone();
        }
    }
}

/// Load config from the given path, or look for `cataloger.yml` in the
/// current directory. Returns the defaults if the file doesn't exist.
pub fn load_config(path: Option<&Path>) -> Result<CatalogerConfig> {
    let config_path = match path {
        Some(p) => p.to_path_buf(),
        None => Path::new("cataloger.yml").to_path_buf(),
    };

    if !config_path.exists() {
        return Ok(CatalogerConfig::default());
    }

    let contents = std::fs::read_to_string(&config_path)
        .with_context(|| format!("failed to read config {}", config_path.display()))?;
    let raw: Value = serde_yml::from_str(&contents)
        .with_context(|| format!("failed to parse {}", config_path.display()))?;

    let mut config = CatalogerConfig {
        config_path: Some(config_path.clone()),
        ..CatalogerConfig::default()
    };

    let Value::Mapping(map) = &raw else {
        return Ok(config);
    };

    for (key, value) in map {
        let Some(key) = key.as_str() else {
            continue;
        };
        match key {
            "engine" => parse_engine(value, &mut config.engine, &config_path)?,
            "grammar" => parse_grammar(value, &mut config.grammar, &config_path)?,
            "languages" => {
                if let Some(list) = value_to_string_list(value) {
                    config.languages = list;
                }
            }
            "output" => {
                if let Some(s) = value.as_str() {
                    config.output = PathBuf::from(s);
                }
            }
            other => anyhow::bail!(
                "unknown key `{other}` in {}",
                config_path.display()
            ),
        }
    }

    Ok(config)
}

fn parse_engine(value: &Value, engine: &mut EngineConfig, config_path: &Path) -> Result<()> {
    let Value::Mapping(map) = value else {
        return Ok(());
    };
    for (k, v) in map {
        // Versions like `7.0` parse as floats in YAML.
        let text = match v {
            Value::String(s) => s.clone(),
            Value::Number(n) => n.to_string(),
            _ => continue,
        };
        match k.as_str() {
            Some("prefix") => engine.prefix = text,
            Some("version") => engine.version = text,
            Some("archive_extension") => engine.archive_extension = text,
            Some("lib_dir") => engine.lib_dir = PathBuf::from(text),
            other => anyhow::bail!(
                "unknown key `engine.{}` in {}",
                other.unwrap_or("?"),
                config_path.display()
            ),
        }
    }
    Ok(())
}

fn parse_grammar(value: &Value, grammar: &mut ReferenceGrammar, config_path: &Path) -> Result<()> {
    let Value::Mapping(map) = value else {
        return Ok(());
    };
    for (k, v) in map {
        let Some(text) = v.as_str() else {
            continue;
        };
        match k.as_str() {
            Some("category_root") => grammar.category_root = text.to_string(),
            Some("ruleset_root") => grammar.ruleset_root = text.to_string(),
            Some("extension") => grammar.extension = text.to_string(),
            other => anyhow::bail!(
                "unknown key `grammar.{}` in {}",
                other.unwrap_or("?"),
                config_path.display()
            ),
        }
    }
    Ok(())
}

fn value_to_string_list(value: &Value) -> Option<Vec<String>> {
    value.as_sequence().map(|seq| {
        seq.iter()
            .filter_map(|v| v.as_str().map(String::from))
            .collect()
    })
}
