use super::*;

#[test]
fn missing_file_falls_back_to_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("does-not-exist.json");
    let config = load_config(Some(&path)).unwrap();
    assert_eq!(config.global.security.max_command_length, 2000);
}

#[test]
fn file_contents_override_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.json");
    std::fs::write(
        &path,
        r#"{ "global": { "security": { "maxCommandLength": 123 } } }"#,
    )
    .unwrap();
    let config = load_config(Some(&path)).unwrap();
    assert_eq!(config.global.security.max_command_length, 123);
    // untouched fields keep their defaults
    assert!(config.global.security.restrict_working_directory);
}

#[test]
fn malformed_file_falls_back_to_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.json");
    std::fs::write(&path, "{ not json").unwrap();
    let config = load_config(Some(&path)).unwrap();
    assert_eq!(config.global.security.max_command_length, 2000);
    assert!(config.global.security.restrict_working_directory);
}

#[test]
fn invalid_values_fall_back_to_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.json");
    std::fs::write(
        &path,
        r#"{ "global": { "security": { "commandTimeout": 0 } } }"#,
    )
    .unwrap();
    let config = load_config(Some(&path)).unwrap();
    assert!((config.global.security.command_timeout - 30.0).abs() < f64::EPSILON);
}

#[test]
fn parse_errors_are_reported_by_the_reader() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.json");
    std::fs::write(&path, "[1, 2]").unwrap();
    assert!(read_config(&path).is_err());
}
