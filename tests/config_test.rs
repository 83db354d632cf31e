//! Tests for layered settings

use std::path::PathBuf;

use tempfile::TempDir;

use argtree::application::{bind_schema, ApplicationError, Schema};
use argtree::config::{local_config_path, Settings};
use argtree::domain::{ErrorLevel, ErrorReporter, ResolvedThresholds};
use argtree::util::testing;

fn write_local_config(dir: &TempDir, content: &str) -> PathBuf {
    let path = local_config_path(dir.path());
    std::fs::write(&path, content).expect("write local config");
    path
}

#[test]
fn given_local_config_when_loading_then_overrides_defaults() {
    // Arrange
    testing::init_test_setup();
    let temp = TempDir::new().unwrap();
    write_local_config(
        &temp,
        "exit_level = \"warning\"\nschema_dir = \"/opt/schemas\"\n",
    );

    // Act
    let settings = Settings::load(Some(temp.path())).unwrap();

    // Assert
    assert_eq!(settings.exit_level, ErrorLevel::Warning);
    assert_eq!(settings.schema_dir, Some(PathBuf::from("/opt/schemas")));
}

#[test]
fn given_invalid_level_in_local_config_when_loading_then_config_error() {
    // Arrange
    let temp = TempDir::new().unwrap();
    write_local_config(&temp, "display_level = \"loud\"\n");

    // Act
    let result = Settings::load(Some(temp.path()));

    // Assert
    assert!(matches!(result, Err(ApplicationError::Config { .. })));
}

#[test]
fn given_schema_dir_when_resolving_existing_path_then_path_wins() {
    // Arrange
    let temp = TempDir::new().unwrap();
    let schema = temp.path().join("app.toml");
    std::fs::write(&schema, "[command]\nnames = [\"app\"]\n").unwrap();
    let settings = Settings {
        schema_dir: Some(PathBuf::from("/elsewhere")),
        ..Settings::default()
    };

    // Act
    let resolved = settings.resolve_schema(&schema);

    // Assert
    assert_eq!(resolved, schema);
}

#[test]
fn given_strict_settings_when_applied_to_tree_then_warnings_fail_parse() {
    // Arrange
    let schema: Schema = r#"
[command]
names = ["app"]

[[command.arguments]]
names = ["input"]
type = "stdin"
"#
    .parse()
    .unwrap();
    let mut bound = bind_schema(&schema).unwrap();
    let settings = Settings {
        display_level: ErrorLevel::Debug,
        exit_level: ErrorLevel::Info,
        schema_dir: None,
    };

    // Act
    bound.tree.set_default_thresholds(settings.thresholds());

    // Assert
    assert_eq!(
        bound.tree.default_thresholds(),
        ResolvedThresholds {
            display: ErrorLevel::Debug,
            exit: ErrorLevel::Info,
        }
    );
    let root = bound.tree.root();
    assert_eq!(bound.tree.command_thresholds(root).exit, ErrorLevel::Info);
    let outcome = bound.tree.parse(["--bogus"]);
    assert!(outcome.has_exit_errors());
}

#[test]
fn given_template_when_generated_then_parses_as_toml() {
    // Act
    let template = Settings::template();

    // Assert
    let parsed: toml::Value = toml::from_str(&template).unwrap();
    assert!(parsed.as_table().unwrap().is_empty());
    assert!(template.contains("exit_level"));
}

#[test]
fn given_settings_when_round_tripping_through_toml_then_equal() {
    // Arrange
    let settings = Settings {
        display_level: ErrorLevel::Warning,
        exit_level: ErrorLevel::Error,
        schema_dir: Some(PathBuf::from("/schemas")),
    };

    // Act
    let text = settings.to_toml().unwrap();
    let back: Settings = toml::from_str(&text).unwrap();

    // Assert
    assert_eq!(back, settings);
}
