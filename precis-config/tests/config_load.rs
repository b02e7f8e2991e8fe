use precis_common::ContentSource;
use precis_common::observability::LogFormat;
use precis_config::PrecisConfigLoader;
use serial_test::serial;
use std::{fs, path::PathBuf};
use tempfile::TempDir;

/// Helper to write a YAML file in a temp dir and return its path.
fn write_yaml(tmp: &TempDir, name: &str, yaml: &str) -> PathBuf {
    let p = tmp.path().join(name);
    fs::write(&p, yaml).expect("write yaml");
    p
}

#[test]
#[serial]
fn test_config_load() {
    let tmp = TempDir::new().unwrap();

    let file_yaml = r#"
version: "1"
model:
  name: "gemini-2.0-flash"
  timeout_secs: 30
pipeline:
  source: caption_fetch
  max_source_chars: 30000
key_store:
  path: "${PRECIS_TEST_HOME}/precis.db"
logging:
  format: json
"#;
    let p = write_yaml(&tmp, "precis.yaml", file_yaml);

    let config = temp_env::with_var("PRECIS_TEST_HOME", Some("/var/lib/precis"), || {
        PrecisConfigLoader::new()
            .with_file(&p)
            .load()
            .expect("load precis config")
    });

    assert_eq!(config.model.name, "gemini-2.0-flash");
    assert_eq!(config.model.timeout_secs, 30);
    assert_eq!(config.pipeline.source, ContentSource::CaptionFetch);
    assert_eq!(config.pipeline.max_source_chars, 30_000);
    assert_eq!(
        config.key_store.resolved_path(),
        PathBuf::from("/var/lib/precis/precis.db")
    );
    assert_eq!(config.logging.format, LogFormat::Json);
}

#[test]
#[serial]
fn env_overrides_file_values() {
    let tmp = TempDir::new().unwrap();
    let p = write_yaml(
        &tmp,
        "precis.yaml",
        "pipeline:\n  source: dom_text\n  max_source_chars: 15000\n",
    );

    let config = temp_env::with_vars(
        [
            ("PRECIS__PIPELINE__SOURCE", Some("direct_url")),
            ("PRECIS__PIPELINE__MAX_SOURCE_CHARS", Some("20000")),
        ],
        || PrecisConfigLoader::new().with_file(&p).load().unwrap(),
    );

    assert_eq!(config.pipeline.source, ContentSource::DirectUrl);
    assert_eq!(config.pipeline.max_source_chars, 20_000);
}

#[test]
#[serial]
fn missing_optional_file_is_fine() {
    let tmp = TempDir::new().unwrap();
    let config = PrecisConfigLoader::new()
        .with_optional_file(tmp.path().join("absent.yaml"))
        .load()
        .unwrap();
    assert!(config.version.is_none());
}

#[test]
#[serial]
fn missing_required_file_fails() {
    let tmp = TempDir::new().unwrap();
    let res = PrecisConfigLoader::new()
        .with_file(tmp.path().join("absent.yaml"))
        .load();
    assert!(res.is_err());
}
