//! Integration tests for configuration loading

use std::io::Write;
use std::time::Duration;

use tourwatch::config::Config;

#[test]
fn test_from_file_with_partial_sections() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(
        file,
        r#"
[api]
access_token = "octo-secret"

[database]
path = "/var/lib/tourwatch/tours.db"

[watch]
interval = "5m"

[notify]
webhook_url = "https://hooks.example.com/tours"
"#
    )
    .unwrap();

    let config = Config::from_file(file.path()).unwrap();
    config.validate().unwrap();

    assert_eq!(config.api.access_token.as_deref(), Some("octo-secret"));
    assert_eq!(config.api.base_url, "https://api.ventrata.com");
    assert_eq!(config.database.path, "/var/lib/tourwatch/tours.db");
    assert_eq!(config.watch_interval().unwrap(), Duration::from_secs(300));
    assert_eq!(config.listen_addr().unwrap().port(), 7077);
    assert_eq!(config.notifiers().unwrap().len(), 1);
}

#[test]
fn test_from_file_rejects_bad_toml() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "[watch\ninterval = ").unwrap();

    assert!(Config::from_file(file.path()).is_err());
}

#[test]
fn test_validate_rejects_half_pushover() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(
        file,
        r#"
[notify]
pushover_app_token = "app"
"#
    )
    .unwrap();

    let config = Config::from_file(file.path()).unwrap();
    assert!(config.validate().is_err());
}

#[test]
fn test_missing_file() {
    let err = Config::from_file(std::path::Path::new("/nonexistent/tourwatch.toml")).unwrap_err();
    assert!(err.to_string().contains("Failed to read config file"));
}
