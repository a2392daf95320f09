// Tests for AnalysisConfig loading from YAML files
use crate::unit::common::*;
use eventql::ConfigError;
use std::fs;
use tempfile::TempDir;

#[test]
fn test_config_file_loading() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("analysis.yaml");
    fs::write(&path, "max_subquery_depth: 8\nmax_expression_length: 4096\n").unwrap();

    let config = AnalysisConfig::from_file(&path).unwrap();
    assert_eq!(config.max_subquery_depth, 8);
    assert_eq!(config.max_expression_length, 4096);
}

#[test]
fn test_missing_file_is_io_error() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("missing.yaml");

    let err = AnalysisConfig::from_file(&path).unwrap_err();
    assert!(matches!(err, ConfigError::IoError { ref file, .. } if *file == path));
}

#[test]
fn test_unknown_key_is_parse_error() {
    let err = AnalysisConfig::from_yaml_str("max_depth: 3").unwrap_err();
    assert!(matches!(err, ConfigError::ParseError { .. }));
}

#[test]
fn test_expression_length_limit_is_argument_error() {
    let config = AnalysisConfig {
        max_expression_length: 16,
        ..AnalysisConfig::default()
    };
    let err = Query::builder("q", "select field1 from TargetA")
        .config(config)
        .build()
        .unwrap_err();
    assert!(matches!(err, QueryError::Argument { .. }));
}

#[test]
fn test_depth_limit_applies_to_rewriting() {
    init_logging();
    let config = AnalysisConfig {
        max_subquery_depth: 1,
        ..AnalysisConfig::default()
    };
    let expression = "select a from A where exists (select b from B where exists (select c from C))";
    let mut model = EventQueryParser::new().compile(expression).unwrap();
    let names = mapping(&[("A", "A1"), ("B", "B1"), ("C", "C1")]);

    let err = QueryRewriter::with_config(&names, config)
        .rewrite(&mut model)
        .unwrap_err();
    assert!(matches!(err, QueryError::Client { .. }));
}

#[test]
fn test_expression_depth_from_yaml() {
    let config = AnalysisConfig::from_yaml_str("max_expression_depth: 3\n").unwrap();
    assert_eq!(config.max_expression_depth, 3);

    let err = Query::builder("q", "select a from A where (((x = 1)))")
        .config(config)
        .build()
        .unwrap()
        .targets()
        .unwrap_err();
    assert!(matches!(err, QueryError::Client { .. }));

    let err = AnalysisConfig::from_yaml_str("max_expression_depth: 0\n").unwrap_err();
    assert!(matches!(err, ConfigError::InvalidValue { ref field, .. } if field == "max_expression_depth"));
}
