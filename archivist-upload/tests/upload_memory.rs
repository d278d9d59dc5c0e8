use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

use archivist_upload::{
    BackendCall, MemoryStore, MultipartCoordinator, RecordingProgress, SessionState,
    SingleShotUploader, Strategy, UploadConfig, UploadError, UploadRequest, Uploader,
};

const KIB: u64 = 1024;

/// Same shape as the production defaults (100MB / 64MB), scaled down to KiB
fn test_config() -> UploadConfig {
    UploadConfig::new("test-bucket")
        .with_size_threshold(100 * KIB)
        .with_part_size(64 * KIB)
}

fn write_fixture(dir: &tempfile::TempDir, name: &str, len: u64) -> PathBuf {
    let path = dir.path().join(name);
    let mut file = std::fs::File::create(&path).unwrap();
    let data: Vec<u8> = (0..len).map(|i| (i % 251) as u8).collect();
    file.write_all(&data).unwrap();
    path
}

fn uploader(store: &Arc<MemoryStore>) -> Uploader {
    Uploader::from_arc(store.clone(), test_config()).unwrap()
}

fn part_sizes(calls: &[BackendCall]) -> Vec<(u32, u64)> {
    calls
        .iter()
        .filter_map(|call| match call {
            BackendCall::UploadPart {
                part_number,
                size_bytes,
                ..
            } => Some((*part_number, *size_bytes)),
            _ => None,
        })
        .collect()
}

fn count(calls: &[BackendCall], pred: impl Fn(&BackendCall) -> bool) -> usize {
    calls.iter().filter(|call| pred(call)).count()
}

#[tokio::test]
async fn small_file_takes_single_put() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_fixture(&dir, "small.tar.gz", 10 * KIB);
    let store = Arc::new(MemoryStore::new());

    let result = uploader(&store).upload_path(&path).await;

    assert!(result.success, "{:?}", result.error);
    assert_eq!(result.strategy, Some(Strategy::SingleShot));
    assert_eq!(result.key, "archives/small.tar.gz");
    assert_eq!(result.size_display, "10.00KB");
    assert_eq!(
        store.calls(),
        vec![BackendCall::PutObject {
            key: "archives/small.tar.gz".into(),
            size_bytes: 10 * KIB
        }]
    );
    assert_eq!(
        store.object("archives/small.tar.gz").unwrap().len() as u64,
        10 * KIB
    );
}

#[tokio::test]
async fn large_file_is_split_into_contiguous_parts() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_fixture(&dir, "large.tar.gz", 150 * KIB);
    let store = Arc::new(MemoryStore::new());

    let result = uploader(&store).upload_path(&path).await;

    assert!(result.success, "{:?}", result.error);
    assert_eq!(result.strategy, Some(Strategy::Multipart));
    assert_eq!(result.parts, 3);

    let calls = store.calls();
    assert_eq!(
        part_sizes(&calls),
        vec![(1, 64 * KIB), (2, 64 * KIB), (3, 22 * KIB)]
    );
    assert!(matches!(calls.first(), Some(BackendCall::InitiateSession { .. })));
    assert!(matches!(
        calls.last(),
        Some(BackendCall::CompleteSession { parts, .. }) if parts == &vec![1, 2, 3]
    ));
    assert_eq!(count(&calls, |c| matches!(c, BackendCall::AbortSession { .. })), 0);

    let expected = std::fs::read(&path).unwrap();
    assert_eq!(store.object("archives/large.tar.gz").unwrap().as_ref(), &expected[..]);
    assert_eq!(store.open_sessions(), 0);
}

#[tokio::test]
async fn file_at_threshold_goes_multipart() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_fixture(&dir, "edge.bin", 100 * KIB);
    let store = Arc::new(MemoryStore::new());

    let result = uploader(&store).upload_path(&path).await;

    assert!(result.success);
    assert_eq!(result.strategy, Some(Strategy::Multipart));
    assert_eq!(part_sizes(&store.calls()), vec![(1, 64 * KIB), (2, 36 * KIB)]);
}

#[tokio::test]
async fn exact_multiple_of_part_size_has_no_empty_tail() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_fixture(&dir, "even.bin", 128 * KIB);
    let store = Arc::new(MemoryStore::new());

    let result = uploader(&store).upload_path(&path).await;

    assert!(result.success);
    assert_eq!(part_sizes(&store.calls()), vec![(1, 64 * KIB), (2, 64 * KIB)]);
}

#[tokio::test]
async fn empty_file_takes_single_put() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_fixture(&dir, "empty.bin", 0);
    let store = Arc::new(MemoryStore::new());

    let result = uploader(&store).upload_path(&path).await;

    assert!(result.success);
    assert_eq!(result.strategy, Some(Strategy::SingleShot));
    assert_eq!(result.size_display, "0.00B");
    assert_eq!(
        store.calls(),
        vec![BackendCall::PutObject {
            key: "archives/empty.bin".into(),
            size_bytes: 0
        }]
    );
}

#[tokio::test]
async fn failed_part_aborts_once_and_stops() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_fixture(&dir, "large.tar.gz", 150 * KIB);
    let store = Arc::new(MemoryStore::new().fail_part(2));

    let result = uploader(&store).upload_path(&path).await;

    assert!(!result.success);
    assert!(result.error.unwrap().contains("part 2"));

    let calls = store.calls();
    assert_eq!(part_sizes(&calls), vec![(1, 64 * KIB), (2, 64 * KIB)]);
    assert_eq!(count(&calls, |c| matches!(c, BackendCall::AbortSession { .. })), 1);
    assert_eq!(count(&calls, |c| matches!(c, BackendCall::CompleteSession { .. })), 0);
    assert!(matches!(calls.last(), Some(BackendCall::AbortSession { .. })));
    assert!(store.object("archives/large.tar.gz").is_none());
    assert_eq!(store.open_sessions(), 0);
}

#[tokio::test]
async fn abort_failure_keeps_part_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_fixture(&dir, "large.tar.gz", 150 * KIB);
    let store = MemoryStore::new().fail_part(1).fail_abort();
    let config = test_config();
    let request = UploadRequest::from_path(&path, "archives/large.tar.gz").await.unwrap();

    let err = MultipartCoordinator::new(&store, &config)
        .upload(&request, &RecordingProgress::new())
        .await
        .unwrap_err();

    assert!(matches!(err, UploadError::PartUpload { part_number: 1, .. }));
    assert_eq!(
        count(&store.calls(), |c| matches!(c, BackendCall::AbortSession { .. })),
        1
    );
    assert!(store.object("archives/large.tar.gz").is_none());
}

#[tokio::test]
async fn failed_complete_does_not_abort() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_fixture(&dir, "large.tar.gz", 150 * KIB);
    let store = MemoryStore::new().fail_complete();
    let config = test_config();
    let request = UploadRequest::from_path(&path, "archives/large.tar.gz").await.unwrap();

    let err = MultipartCoordinator::new(&store, &config)
        .upload(&request, &RecordingProgress::new())
        .await
        .unwrap_err();

    assert!(matches!(err, UploadError::Completion { .. }));
    let calls = store.calls();
    assert_eq!(part_sizes(&calls).len(), 3);
    assert_eq!(count(&calls, |c| matches!(c, BackendCall::AbortSession { .. })), 0);
    assert!(store.object("archives/large.tar.gz").is_none());
    // Left for the backend to reconcile
    assert_eq!(store.open_sessions(), 1);
}

#[tokio::test]
async fn failed_initiate_needs_no_cleanup() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_fixture(&dir, "large.tar.gz", 150 * KIB);
    let store = Arc::new(MemoryStore::new().fail_initiate());

    let result = uploader(&store).upload_path(&path).await;

    assert!(!result.success);
    assert_eq!(
        store.calls(),
        vec![BackendCall::InitiateSession {
            key: "archives/large.tar.gz".into()
        }]
    );
}

#[tokio::test]
async fn failed_put_reports_failure() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_fixture(&dir, "small.bin", KIB);
    let store = Arc::new(MemoryStore::new().fail_put());

    let result = uploader(&store).upload_path(&path).await;

    assert!(!result.success);
    assert_eq!(store.calls().len(), 1);
    assert!(store.object("archives/small.bin").is_none());
}

#[tokio::test]
async fn missing_file_makes_no_backend_calls() {
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(MemoryStore::new());

    let result = uploader(&store)
        .upload_path(&dir.path().join("nope.tar.gz"))
        .await;

    assert!(!result.success);
    assert_eq!(result.strategy, None);
    assert_eq!(result.path, dir.path().join("nope.tar.gz"));
    assert!(result.error.unwrap().starts_with("File not found"));
    assert!(store.calls().is_empty());

    let err = UploadRequest::from_path(dir.path().join("nope.tar.gz"), "k")
        .await
        .unwrap_err();
    assert!(matches!(err, UploadError::SourceNotFound { .. }));
}

#[tokio::test]
async fn unreadable_source_skips_put() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_fixture(&dir, "gone.bin", KIB);
    let request = UploadRequest::from_path(&path, "archives/gone.bin").await.unwrap();
    std::fs::remove_file(&path).unwrap();
    let store = MemoryStore::new();

    let err = SingleShotUploader::new(&store).upload(&request).await.unwrap_err();

    assert!(matches!(err, UploadError::SourceUnreadable { .. }));
    assert!(store.calls().is_empty());
}

#[tokio::test]
async fn truncated_source_aborts_session() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_fixture(&dir, "shrinks.bin", 150 * KIB);
    let request = UploadRequest::from_path(&path, "archives/shrinks.bin").await.unwrap();
    std::fs::File::create(&path)
        .unwrap()
        .write_all(&vec![7u8; 70 * KIB as usize])
        .unwrap();
    let store = MemoryStore::new();
    let config = test_config();

    let err = MultipartCoordinator::new(&store, &config)
        .upload(&request, &RecordingProgress::new())
        .await
        .unwrap_err();

    assert!(matches!(err, UploadError::PartUpload { part_number: 3, .. }));
    let calls = store.calls();
    assert_eq!(part_sizes(&calls), vec![(1, 64 * KIB), (2, 6 * KIB)]);
    assert_eq!(count(&calls, |c| matches!(c, BackendCall::AbortSession { .. })), 1);
    assert_eq!(store.open_sessions(), 0);
}

#[tokio::test]
async fn source_removed_after_session_opens_aborts() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_fixture(&dir, "vanishes.bin", 150 * KIB);
    let request = UploadRequest::from_path(&path, "archives/vanishes.bin").await.unwrap();
    std::fs::remove_file(&path).unwrap();
    let store = MemoryStore::new();
    let config = test_config();

    let err = MultipartCoordinator::new(&store, &config)
        .upload(&request, &RecordingProgress::new())
        .await
        .unwrap_err();

    assert!(matches!(err, UploadError::SourceUnreadable { .. }), "{}", err);
    assert!(err.to_string().starts_with("Failed to open"), "{}", err);
    let calls = store.calls();
    assert_eq!(count(&calls, |c| matches!(c, BackendCall::InitiateSession { .. })), 1);
    assert!(part_sizes(&calls).is_empty());
    assert!(matches!(calls.last(), Some(BackendCall::AbortSession { .. })));
    assert_eq!(store.open_sessions(), 0);
    assert!(store.object("archives/vanishes.bin").is_none());
}

#[tokio::test]
async fn progress_climbs_to_one_hundred() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_fixture(&dir, "large.tar.gz", 150 * KIB);
    let store = MemoryStore::new();
    let config = test_config();
    let request = UploadRequest::from_path(&path, "archives/large.tar.gz").await.unwrap();
    let progress = RecordingProgress::new();

    let receipt = MultipartCoordinator::new(&store, &config)
        .upload(&request, &progress)
        .await
        .unwrap();

    assert_eq!(receipt.session.state, SessionState::Completed);
    assert_eq!(receipt.bytes_sent, 150 * KIB);
    assert_eq!(progress.updates(), vec![0, 42, 85, 100]);
    assert!(progress.was_cleared());
}

#[tokio::test]
async fn single_put_reports_no_progress() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_fixture(&dir, "small.bin", KIB);
    let store = Arc::new(MemoryStore::new());
    let progress = RecordingProgress::new();

    let result = uploader(&store)
        .upload_path_with_progress(&path, &progress)
        .await;

    assert!(result.success);
    assert!(progress.updates().is_empty());
}

#[tokio::test]
async fn too_many_parts_is_rejected_before_any_call() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_fixture(&dir, "large.bin", 150 * KIB);
    let store = MemoryStore::new();
    let config = test_config().with_max_parts(2);
    let request = UploadRequest::from_path(&path, "archives/large.bin").await.unwrap();

    let err = MultipartCoordinator::new(&store, &config)
        .upload(&request, &RecordingProgress::new())
        .await
        .unwrap_err();

    assert!(matches!(err, UploadError::Invalid { .. }));
    assert!(store.calls().is_empty());
}

#[tokio::test]
async fn one_failure_does_not_affect_the_next_file() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("missing.bin");
    let present = write_fixture(&dir, "present.bin", 2 * KIB);
    let store = Arc::new(MemoryStore::new());
    let uploader = uploader(&store);

    let first = uploader.upload_path(&missing).await;
    let second = uploader.upload_path(&present).await;

    assert!(!first.success);
    assert!(second.success);
    assert!(store.object("archives/present.bin").is_some());
}

#[tokio::test]
async fn result_serializes_for_reports() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_fixture(&dir, "small.bin", KIB);
    let store = Arc::new(MemoryStore::new());

    let result = uploader(&store).upload_path(&path).await;
    let json = serde_json::to_value(&result).unwrap();

    assert_eq!(json["success"], true);
    assert_eq!(json["strategy"], "single_shot");
    assert_eq!(json["size_display"], "1.00KB");
    assert_eq!(json["path"], path.display().to_string());
}
