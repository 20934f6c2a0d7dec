//! Integration tests for the cataloging pipeline.
//!
//! These tests write real rule archives to a temp directory and drive
//! `run` and `build_catalog` end to end: archive scanning, XML extraction,
//! both linking passes, assembly, and the JSON written to disk.

use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use clap::Parser;
use serde_json::Value;
use zip::write::SimpleFileOptions;

use pmd_cataloger::cli::Args;
use pmd_cataloger::config::CatalogerConfig;
use pmd_cataloger::error::CatalogError;
use pmd_cataloger::pipeline::build_catalog;

const BEST_PRACTICES: &str = r#"<?xml version="1.0"?>
<ruleset name="Best Practices" xmlns="http://pmd.sourceforge.net/ruleset/2.0.0">
  <description>Best practices.</description>
  <rule name="RuleA" message="Rule A fired" since="6.0.0" class="x.RuleA">
    <description>First rule.</description>
    <priority>3</priority>
  </rule>
  <rule name="RuleB" message="Rule B fired" since="6.0.0" class="x.RuleB">
    <priority>1</priority>
  </rule>
</ruleset>"#;

const DESIGN: &str = r#"<?xml version="1.0"?>
<ruleset name="Design" xmlns="http://pmd.sourceforge.net/ruleset/2.0.0">
  <rule name="GodClass" message="God class" class="x.GodClass"/>
  <rule name="CyclomaticComplexity" message="Too complex" class="x.Cyclo"/>
  <rule name="TooManyFields" message="Too many fields" class="x.Fields"/>
</ruleset>"#;

fn write_jar(dir: &Path, name: &str, entries: &[(&str, &str)]) -> PathBuf {
    let path = dir.join(name);
    let mut writer = zip::ZipWriter::new(File::create(&path).unwrap());
    writer
        .start_file("META-INF/MANIFEST.MF", SimpleFileOptions::default())
        .unwrap();
    writer.write_all(b"Manifest-Version: 1.0\n").unwrap();
    for (entry, contents) in entries {
        writer
            .start_file(*entry, SimpleFileOptions::default())
            .unwrap();
        writer.write_all(contents.as_bytes()).unwrap();
    }
    writer.finish().unwrap();
    path
}

fn args(dir: &Path, languages: &str, extra: &[&str]) -> Args {
    let lib_dir = dir.to_str().unwrap().to_string();
    let output = dir.join("catalogs").join("PmdCatalog.json");
    let config = dir.join("no-such-config.yml");
    let mut argv = vec![
        "pmd-cataloger".to_string(),
        "--config".to_string(),
        config.to_str().unwrap().to_string(),
        "--lib-dir".to_string(),
        lib_dir,
        "--languages".to_string(),
        languages.to_string(),
        "--output".to_string(),
        output.to_str().unwrap().to_string(),
    ];
    argv.extend(extra.iter().map(|s| s.to_string()));
    Args::parse_from(argv)
}

fn read_catalog(dir: &Path) -> Value {
    let text = fs::read_to_string(dir.join("catalogs").join("PmdCatalog.json")).unwrap();
    serde_json::from_str(&text).unwrap()
}

fn config_for(dir: &Path, languages: &[&str]) -> CatalogerConfig {
    let mut config = CatalogerConfig::default();
    config.engine.lib_dir = dir.to_path_buf();
    config.languages = languages.iter().map(|l| l.to_string()).collect();
    config
}

fn names(values: &Value) -> Vec<&str> {
    values
        .as_array()
        .unwrap()
        .iter()
        .map(|v| v["name"].as_str().unwrap())
        .collect()
}

// ---------- End-to-end ----------

#[test]
fn single_category_single_ruleset() {
    let dir = tempfile::tempdir().unwrap();
    write_jar(
        dir.path(),
        "pmd-apex-6.20.0.jar",
        &[
            ("category/apex/bestpractices.xml", BEST_PRACTICES),
            (
                "rulesets/apex/quickstart.xml",
                r#"<ruleset name="quickstart"><rule ref="category/apex/bestpractices.xml/RuleA"/></ruleset>"#,
            ),
        ],
    );

    let code = pmd_cataloger::run(args(dir.path(), "apex", &[])).unwrap();
    assert_eq!(code, 0);

    let catalog = read_catalog(dir.path());
    assert_eq!(names(&catalog["categories"]), vec!["Best Practices"]);
    assert_eq!(names(&catalog["rules"]), vec!["RuleA", "RuleB"]);
    assert_eq!(names(&catalog["rulesets"]), vec!["quickstart"]);

    let rules = catalog["rules"].as_array().unwrap();
    assert_eq!(rules[0]["rulesets"], serde_json::json!(["rulesets/apex/quickstart.xml"]));
    assert_eq!(rules[1]["rulesets"], serde_json::json!([]));
    assert_eq!(rules[0]["message"], "Rule A fired");
    assert_eq!(rules[0]["priority"], 3);
    assert_eq!(rules[0]["language"], "apex");

    assert_eq!(
        catalog["rulesets"][0]["rules"],
        serde_json::json!([{ "category": "Best Practices", "name": "RuleA" }])
    );
}

#[test]
fn imports_excludes_and_categories_across_rulesets() {
    let dir = tempfile::tempdir().unwrap();
    write_jar(
        dir.path(),
        "pmd-java-6.20.0.jar",
        &[
            ("category/java/bestpractices.xml", BEST_PRACTICES),
            ("category/java/design.xml", DESIGN),
            (
                "rulesets/java/base.xml",
                r#"<ruleset name="base">
  <rule ref="category/java/design.xml">
    <exclude name="TooManyFields"/>
  </rule>
</ruleset>"#,
            ),
            (
                "rulesets/java/middle.xml",
                r#"<ruleset name="middle">
  <rule ref="rulesets/java/base.xml"/>
  <rule ref="category/java/bestpractices.xml/RuleB"/>
</ruleset>"#,
            ),
            (
                "rulesets/java/quickstart.xml",
                r#"<ruleset name="quickstart">
  <rule ref="rulesets/java/base.xml"/>
  <rule ref="rulesets/java/middle.xml">
    <exclude name="GodClass"/>
  </rule>
  <rule ref="category/java/bestpractices.xml/RuleA"/>
</ruleset>"#,
            ),
        ],
    );

    let outcome = build_catalog(&config_for(dir.path(), &["java"]), false).unwrap();
    let catalog = outcome.catalog;
    assert!(catalog.diagnostics.is_empty());

    let by_path = |path: &str| catalog.rulesets.iter().find(|rs| rs.path == path).unwrap();
    let resolved = |path: &str| -> Vec<String> {
        by_path(path).rules.iter().map(|r| r.id.name.clone()).collect()
    };

    assert_eq!(resolved("rulesets/java/base.xml"), vec!["GodClass", "CyclomaticComplexity"]);
    assert_eq!(
        resolved("rulesets/java/middle.xml"),
        vec!["GodClass", "CyclomaticComplexity", "RuleB"]
    );
    // base imported directly and again through middle: no duplicates.
    assert_eq!(
        resolved("rulesets/java/quickstart.xml"),
        vec!["CyclomaticComplexity", "RuleB", "RuleA"]
    );
    assert_eq!(
        by_path("rulesets/java/quickstart.xml").imports,
        vec!["rulesets/java/base.xml", "rulesets/java/middle.xml"]
    );

    let god_class = catalog.rules.iter().find(|r| r.name == "GodClass").unwrap();
    assert_eq!(god_class.rulesets, vec!["rulesets/java/base.xml", "rulesets/java/middle.xml"]);
    let too_many = catalog.rules.iter().find(|r| r.name == "TooManyFields").unwrap();
    assert!(too_many.rulesets.is_empty());
}

#[test]
fn release_ruleset_picks_rules_through_ruleset_paths() {
    let dir = tempfile::tempdir().unwrap();
    write_jar(
        dir.path(),
        "pmd-java-6.20.0.jar",
        &[
            ("category/java/design.xml", DESIGN),
            (
                "rulesets/java/legacy.xml",
                r#"<ruleset name="legacy">
  <rule ref="category/java/design.xml/GodClass"/>
</ruleset>"#,
            ),
            (
                "rulesets/releases/600.xml",
                r#"<ruleset name="600">
  <rule ref="rulesets/java/legacy.xml/GodClass"/>
</ruleset>"#,
            ),
        ],
    );

    let catalog = build_catalog(&config_for(dir.path(), &["java"]), false)
        .unwrap()
        .catalog;
    assert!(catalog.diagnostics.is_empty());

    let release = catalog
        .rulesets
        .iter()
        .find(|rs| rs.path == "rulesets/releases/600.xml")
        .unwrap();
    assert_eq!(release.rules.len(), 1);
    assert_eq!(release.rules[0].id.name, "GodClass");
    assert_eq!(release.rules[0].via, vec!["rulesets/java/legacy.xml"]);

    let god_class = catalog.rules.iter().find(|r| r.name == "GodClass").unwrap();
    assert_eq!(
        god_class.rulesets,
        vec!["rulesets/java/legacy.xml", "rulesets/releases/600.xml"]
    );
}

#[test]
fn every_rule_has_exactly_one_category() {
    let dir = tempfile::tempdir().unwrap();
    write_jar(
        dir.path(),
        "pmd-java-6.20.0.jar",
        &[
            ("category/java/bestpractices.xml", BEST_PRACTICES),
            ("category/java/design.xml", DESIGN),
        ],
    );
    let catalog = build_catalog(&config_for(dir.path(), &["java"]), false)
        .unwrap()
        .catalog;
    for rule in &catalog.rules {
        let owners = catalog
            .categories
            .iter()
            .filter(|c| c.path == rule.category_path && c.name == rule.category)
            .count();
        assert_eq!(owners, 1, "rule {} has {owners} owning categories", rule.name);
    }
}

#[test]
fn languages_are_merged_in_configured_order() {
    let dir = tempfile::tempdir().unwrap();
    write_jar(
        dir.path(),
        "pmd-java-6.20.0.jar",
        &[("category/java/design.xml", DESIGN)],
    );
    write_jar(
        dir.path(),
        "pmd-apex-6.20.0.jar",
        &[("category/apex/bestpractices.xml", BEST_PRACTICES)],
    );
    let catalog = build_catalog(&config_for(dir.path(), &["java", "apex"]), false)
        .unwrap()
        .catalog;
    let languages: Vec<&str> = catalog.categories.iter().map(|c| c.language.as_str()).collect();
    assert_eq!(languages, vec!["java", "apex"]);
    assert_eq!(catalog.rules.len(), 5);
}

#[test]
fn rebuilding_gives_identical_json() {
    let dir = tempfile::tempdir().unwrap();
    write_jar(
        dir.path(),
        "pmd-java-6.20.0.jar",
        &[
            ("category/java/design.xml", DESIGN),
            (
                "rulesets/java/a.xml",
                r#"<ruleset name="a"><rule ref="category/java/design.xml"/><rule ref="rulesets/java/b.xml"/></ruleset>"#,
            ),
            (
                "rulesets/java/b.xml",
                r#"<ruleset name="b"><rule ref="category/java/design.xml/GodClass"/></ruleset>"#,
            ),
        ],
    );
    let config = config_for(dir.path(), &["java"]);
    let first = build_catalog(&config, false).unwrap().catalog.to_json_string();
    let second = build_catalog(&config, false).unwrap().catalog.to_json_string();
    assert_eq!(first, second);
}

// ---------- Recoverable reference problems ----------

#[test]
fn dangling_references_are_warnings() {
    let dir = tempfile::tempdir().unwrap();
    write_jar(
        dir.path(),
        "pmd-apex-6.20.0.jar",
        &[
            ("category/apex/bestpractices.xml", BEST_PRACTICES),
            (
                "rulesets/apex/quickstart.xml",
                r#"<ruleset name="quickstart">
  <rule ref="rulesets/missing.xml"/>
  <rule ref="category/apex/bestpractices.xml/NoSuchRule"/>
  <rule ref="category/apex/bestpractices.xml/RuleB"/>
</ruleset>"#,
            ),
        ],
    );

    let code = pmd_cataloger::run(args(dir.path(), "apex", &[])).unwrap();
    assert_eq!(code, 0);
    let catalog = read_catalog(dir.path());
    assert_eq!(
        catalog["rulesets"][0]["rules"],
        serde_json::json!([{ "category": "Best Practices", "name": "RuleB" }])
    );

    let strict = pmd_cataloger::run(args(dir.path(), "apex", &["--strict"])).unwrap();
    assert_eq!(strict, 2);
}

// ---------- Fatal errors ----------

#[test]
fn missing_archive_aborts_without_writing() {
    let dir = tempfile::tempdir().unwrap();
    let err = pmd_cataloger::run(args(dir.path(), "apex", &[])).unwrap_err();
    assert!(matches!(
        err.downcast_ref::<CatalogError>(),
        Some(CatalogError::ArchiveNotFound { .. })
    ));
    assert_eq!(pmd_cataloger::error::exit_code_for(&err), 10);
    assert!(!dir.path().join("catalogs").exists());
}

#[test]
fn unreadable_archive_has_its_own_exit_code() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("pmd-apex-6.20.0.jar"), b"PK but not really").unwrap();
    let err = pmd_cataloger::run(args(dir.path(), "apex", &[])).unwrap_err();
    assert_eq!(pmd_cataloger::error::exit_code_for(&err), 11);
}

#[test]
fn cyclic_imports_abort_the_run() {
    let dir = tempfile::tempdir().unwrap();
    write_jar(
        dir.path(),
        "pmd-java-6.20.0.jar",
        &[
            (
                "rulesets/java/a.xml",
                r#"<ruleset name="a"><rule ref="rulesets/java/b.xml"/></ruleset>"#,
            ),
            (
                "rulesets/java/b.xml",
                r#"<ruleset name="b"><rule ref="rulesets/java/a.xml"/></ruleset>"#,
            ),
        ],
    );
    let err = pmd_cataloger::run(args(dir.path(), "java", &[])).unwrap_err();
    assert!(matches!(
        err.downcast_ref::<CatalogError>(),
        Some(CatalogError::CyclicRulesetReference { .. })
    ));
    assert_eq!(pmd_cataloger::error::exit_code_for(&err), 13);
    assert!(!dir.path().join("catalogs").exists());
}

#[test]
fn keep_going_writes_surviving_languages() {
    let dir = tempfile::tempdir().unwrap();
    write_jar(
        dir.path(),
        "pmd-java-6.20.0.jar",
        &[("category/java/design.xml", DESIGN)],
    );

    let code = pmd_cataloger::run(args(dir.path(), "apex,java", &["--keep-going"])).unwrap();
    assert_eq!(code, 10);

    let catalog = read_catalog(dir.path());
    assert_eq!(names(&catalog["categories"]), vec!["Design"]);
    assert_eq!(catalog["rules"].as_array().unwrap().len(), 3);
}

#[test]
fn unwritable_output_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    write_jar(
        dir.path(),
        "pmd-java-6.20.0.jar",
        &[("category/java/design.xml", DESIGN)],
    );
    // Occupy the output path with a directory.
    fs::create_dir_all(dir.path().join("catalogs").join("PmdCatalog.json")).unwrap();
    let err = pmd_cataloger::run(args(dir.path(), "java", &[])).unwrap_err();
    assert_eq!(pmd_cataloger::error::exit_code_for(&err), 14);
}

// ---------- Binary ----------

#[test]
fn unknown_flag_exits_with_generic_error() {
    let output = std::process::Command::new(env!("CARGO_BIN_EXE_pmd-cataloger"))
        .arg("--no-such-flag")
        .output()
        .expect("Failed to execute pmd-cataloger");

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert_eq!(output.status.code(), Some(3), "stderr: {stderr}");
    assert!(stderr.contains("--no-such-flag"));
}

#[test]
fn help_still_exits_zero() {
    let output = std::process::Command::new(env!("CARGO_BIN_EXE_pmd-cataloger"))
        .arg("--help")
        .output()
        .expect("Failed to execute pmd-cataloger");
    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).contains("--keep-going"));
}

#[test]
fn stdout_with_summary_keeps_stdout_valid_json() {
    let dir = tempfile::tempdir().unwrap();
    write_jar(
        dir.path(),
        "pmd-java-6.20.0.jar",
        &[("category/java/design.xml", DESIGN)],
    );
    let output = std::process::Command::new(env!("CARGO_BIN_EXE_pmd-cataloger"))
        .current_dir(dir.path())
        .args([
            "--lib-dir",
            dir.path().to_str().unwrap(),
            "--languages",
            "java",
            "--stdout",
            "--summary",
        ])
        .output()
        .expect("Failed to execute pmd-cataloger");

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(output.status.success(), "stderr: {stderr}");
    let catalog: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(names(&catalog["categories"]), vec!["Design"]);
    assert!(stderr.contains("1 languages, 1 categories, 3 rules, 0 rulesets"));
}
