//! End-to-end extraction tests against a fake OCR program.

use std::path::Path;

use egid_core::store::Result as StoreResult;
use egid_core::{
    EgidConfig, EgidError, ErrorKind, ExtractedRecord, HistoryEntry, IdExtractor, InputError,
    ParseError, ResultStore, SqliteResultStore, StoreError,
};
use pretty_assertions::assert_eq;
use tempfile::TempDir;

const SCRIPT: &str = "extract_single.sh";

/// Write `body` as the extraction script and build a config running it with `sh`.
fn service(body: &str) -> (TempDir, EgidConfig) {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join(SCRIPT), body).unwrap();

    let mut config = EgidConfig::default();
    config.ocr.executable = "sh".to_string();
    config.ocr.service_dir = dir.path().to_path_buf();
    config.ocr.script = SCRIPT.to_string();
    config.ocr.timeout_secs = 10;
    config.store.enabled = false;

    (dir, config)
}

const AHMED: &str = r#"echo "loading model"
echo '{"full_name":"Ahmed Ali","national_id":"28906130102292"}'
"#;

struct FailingStore;

impl ResultStore for FailingStore {
    fn save(&self, _: &str, _: &ExtractedRecord) -> StoreResult<i64> {
        Err(StoreError::InvalidRow("disk full".to_string()))
    }

    fn history(&self, _: u32) -> StoreResult<Vec<HistoryEntry>> {
        Err(StoreError::InvalidRow("disk full".to_string()))
    }

    fn search_by_national_id(&self, _: &str) -> StoreResult<Vec<HistoryEntry>> {
        Err(StoreError::InvalidRow("disk full".to_string()))
    }
}

#[tokio::test]
async fn test_extract_from_url() {
    let (_dir, config) = service(AHMED);
    let extractor = IdExtractor::new(config).unwrap();

    let record = extractor
        .extract_from_url("https://example.com/id.jpg", true)
        .await
        .unwrap();

    assert_eq!(
        record,
        ExtractedRecord {
            full_name: Some("Ahmed Ali".to_string()),
            national_id: Some("28906130102292".to_string()),
            ..Default::default()
        }
    );
}

#[tokio::test]
async fn test_image_reference_is_passed_as_argument() {
    let (_dir, config) = service("printf '{\"address\": \"%s\"}\\n' \"$1\"\n");
    let extractor = IdExtractor::new(config).unwrap();

    let record = extractor
        .try_extract_from_url("https://example.com/a b;c.jpg?x=$(id)", false)
        .await
        .unwrap();
    assert_eq!(
        record.address.as_deref(),
        Some("https://example.com/a b;c.jpg?x=$(id)")
    );
}

#[tokio::test]
async fn test_persists_successful_extraction() {
    let (_dir, config) = service(AHMED);
    let extractor = IdExtractor::new(config)
        .unwrap()
        .with_store(SqliteResultStore::open_in_memory().unwrap());

    extractor
        .try_extract_from_url("https://example.com/id.jpg", true)
        .await
        .unwrap();
    extractor
        .try_extract_from_url("https://example.com/not-saved.jpg", false)
        .await
        .unwrap();

    let history = extractor.get_history(50).unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].image_url, "https://example.com/id.jpg");
    assert_eq!(history[0].full_name, "Ahmed Ali");
    assert_eq!(history[0].address, "");

    let found = extractor.search_by_national_id("28906130102292").unwrap();
    assert_eq!(found, history);
    assert!(extractor.search_by_national_id("29001010101010").unwrap().is_empty());
}

#[tokio::test]
async fn test_store_failure_does_not_mask_extraction() {
    let (_dir, config) = service(AHMED);
    let extractor = IdExtractor::new(config).unwrap().with_store(FailingStore);

    let record = extractor
        .extract_from_url("https://example.com/id.jpg", true)
        .await
        .unwrap();
    assert_eq!(record.full_name.as_deref(), Some("Ahmed Ali"));

    assert_eq!(extractor.get_history(10), None);
    let err = extractor.try_get_history(10).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::PersistenceFailure);
}

#[tokio::test]
async fn test_process_failure_persists_nothing() {
    let (_dir, config) = service("echo 'model not found' >&2\nexit 1\n");
    let extractor = IdExtractor::new(config)
        .unwrap()
        .with_store(SqliteResultStore::open_in_memory().unwrap());

    assert_eq!(extractor.extract_from_url("https://example.com/id.jpg", true).await, None);

    let err = extractor
        .try_extract_from_url("https://example.com/id.jpg", true)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ProcessFailure);
    assert!(err.to_string().contains("model not found"));

    assert!(extractor.get_history(50).unwrap().is_empty());
}

#[tokio::test]
async fn test_error_json_with_failing_exit_is_process_failure() {
    let (_dir, config) = service("echo '{\"error\": \"Failed to download image\", \"status\": \"error\"}'\nexit 1\n");
    let extractor = IdExtractor::new(config).unwrap();

    let err = extractor
        .try_extract_from_url("https://example.com/id.jpg", false)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ProcessFailure);
}

#[tokio::test]
async fn test_parse_failures() {
    let (_dir, config) = service("echo 'loading model'\necho 'done'\n");
    let extractor = IdExtractor::new(config).unwrap();
    let err = extractor
        .try_extract_from_url("https://example.com/id.jpg", false)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NoStructuredOutput);

    let (_dir, config) = service("echo 'loading model'\necho '{\"full_name\": '\n");
    let extractor = IdExtractor::new(config).unwrap();
    let err = extractor
        .try_extract_from_url("https://example.com/id.jpg", false)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::MalformedOutput);
}

#[tokio::test]
async fn test_timeout_is_enforced() {
    let (_dir, mut config) = service("sleep 30\necho '{}'\n");
    config.ocr.timeout_secs = 1;
    let extractor = IdExtractor::new(config).unwrap();

    let err = extractor
        .try_extract_from_url("https://example.com/id.jpg", false)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Timeout);
}

#[tokio::test]
async fn test_invalid_url() {
    let (_dir, config) = service(AHMED);
    let extractor = IdExtractor::new(config).unwrap();

    assert_eq!(extractor.extract_from_url("not a url", true).await, None);
    let err = extractor.try_extract_from_url("not a url", true).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidInput);
}

#[tokio::test]
async fn test_domain_allow_list() {
    let (_dir, mut config) = service(AHMED);
    config.security.allowed_domains = vec!["example.com".to_string()];
    let extractor = IdExtractor::new(config).unwrap();

    assert!(extractor.extract_from_url("https://cdn.example.com/id.jpg", false).await.is_some());
    let err = extractor
        .try_extract_from_url("https://other.org/id.jpg", false)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidInput);

    for url in ["ftp://other.org/id.jpg", "ws://other.org/id.jpg"] {
        let err = extractor.try_extract_from_url(url, false).await.unwrap_err();
        assert!(
            matches!(err, EgidError::Input(InputError::DomainNotAllowed(ref h)) if h == "other.org"),
            "{url}"
        );
    }
}

#[tokio::test]
async fn test_stderr_line_before_json_is_scanned_first() {
    let (_dir, config) = service("echo '{not json' >&2\necho '{\"address\": \"stdout\"}'\n");
    let extractor = IdExtractor::new(config).unwrap();

    let err = extractor
        .try_extract_from_url("https://example.com/id.jpg", false)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        EgidError::Parse(ParseError::MalformedOutput { ref line, .. }) if line == "{not json"
    ));
}

#[tokio::test]
async fn test_file_url_is_checked_like_a_file() {
    let (dir, mut config) = service("printf '{\"address\": \"%s\"}\\n' \"$1\"\n");
    config.security.max_image_size = 4;
    let extractor = IdExtractor::new(config)
        .unwrap()
        .with_store(SqliteResultStore::open_in_memory().unwrap());

    let big = dir.path().join("big.jpg");
    std::fs::write(&big, b"0123456789").unwrap();
    let err = extractor
        .try_extract_from_url(&format!("file://{}", big.display()), false)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        EgidError::Input(InputError::FileTooLarge { size: 10, limit: 4 })
    ));

    let err = extractor
        .try_extract_from_url("file:///nonexistent/egid/missing.jpg", false)
        .await
        .unwrap_err();
    assert!(matches!(err, EgidError::Input(InputError::FileNotFound(_))));

    let small = dir.path().join("ok.jpg");
    std::fs::write(&small, b"jpg").unwrap();
    let record = extractor
        .try_extract_from_url(&format!("file://{}", small.display()), true)
        .await
        .unwrap();
    let expected = format!("file://{}", std::fs::canonicalize(&small).unwrap().display());
    assert_eq!(record.address.as_deref(), Some(expected.as_str()));
    assert_eq!(extractor.get_history(1).unwrap()[0].image_url, expected);
}

#[tokio::test]
async fn test_extract_from_file() {
    let (dir, config) = service("echo \"reading $1\"\necho '{\"governorate\": \"Cairo\"}'\n");
    let image = dir.path().join("card.jpg");
    std::fs::write(&image, b"not really a jpeg").unwrap();

    let extractor = IdExtractor::new(config)
        .unwrap()
        .with_store(SqliteResultStore::open_in_memory().unwrap());

    let record = extractor.extract_from_file(&image, true).await.unwrap();
    assert_eq!(record.governorate.as_deref(), Some("Cairo"));

    let history = extractor.get_history(1).unwrap();
    let expected = format!("file://{}", std::fs::canonicalize(&image).unwrap().display());
    assert_eq!(history[0].image_url, expected);
    assert_eq!(history[0].governorate, "Cairo");
}

#[tokio::test]
async fn test_extract_from_missing_file() {
    let (dir, config) = service(AHMED);
    let extractor = IdExtractor::new(config).unwrap();

    let missing = dir.path().join("missing.jpg");
    assert_eq!(extractor.extract_from_file(&missing, false).await, None);

    let err = extractor.try_extract_from_file(&missing, false).await.unwrap_err();
    assert!(matches!(
        err,
        EgidError::Input(InputError::FileNotFound(ref p)) if p == &missing
    ));

    let err = extractor.try_extract_from_file(dir.path(), false).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidInput);
}

#[tokio::test]
async fn test_file_size_limit() {
    let (dir, mut config) = service(AHMED);
    config.security.max_image_size = 4;
    let image = dir.path().join("big.jpg");
    std::fs::write(&image, b"0123456789").unwrap();

    let extractor = IdExtractor::new(config).unwrap();
    let err = extractor.try_extract_from_file(&image, false).await.unwrap_err();
    assert!(matches!(
        err,
        EgidError::Input(InputError::FileTooLarge { size: 10, limit: 4 })
    ));
}

#[tokio::test]
async fn test_connection_probe() {
    let (_dir, mut config) = service(AHMED);

    config.ocr.executable = "true".to_string();
    assert!(IdExtractor::new(config.clone()).unwrap().test_connection().await);

    config.ocr.executable = "false".to_string();
    assert!(!IdExtractor::new(config.clone()).unwrap().test_connection().await);

    config.ocr.executable = "/nonexistent/python3".to_string();
    assert!(!IdExtractor::new(config).unwrap().test_connection().await);
}

#[test]
fn test_from_config_opens_store() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = EgidConfig::default();
    config.ocr.service_dir = dir.path().to_path_buf();
    config.store.database_path = dir.path().join("db").join("egid.db");

    let extractor = IdExtractor::from_config(config.clone()).unwrap();
    assert!(extractor.has_store());
    assert!(Path::new(&config.store.database_path).exists());

    config.store.enabled = false;
    assert!(!IdExtractor::from_config(config).unwrap().has_store());
}

#[test]
fn test_invalid_config_rejected() {
    let mut config = EgidConfig::default();
    config.ocr.service_dir = "/nonexistent/egid/service".into();
    let err = IdExtractor::new(config).err().unwrap();
    assert_eq!(err.kind(), ErrorKind::Configuration);
}
