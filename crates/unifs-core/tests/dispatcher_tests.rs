//! Dispatcher behavior through the public API.

mod common;

use std::sync::Arc;

use common::InstrumentedAdapter;
use rstest::rstest;
use unifs_core::{
    Adapter, CancellationToken, ErrorKind, FileSystem, FsError, LocalAdapter, MemoryAdapter,
};

fn registry(prefixes: &[&str]) -> FileSystem {
    let mut fs = FileSystem::new();
    for prefix in prefixes {
        fs.add_adapter(MemoryAdapter::new(*prefix));
    }
    fs
}

#[tokio::test]
async fn every_operation_fails_on_empty_registry() {
    let fs = FileSystem::new();
    let cancel = CancellationToken::new();

    let errors = [
        fs.get_file("a://x", &cancel).await.unwrap_err(),
        fs.list_files("a://", &cancel).await.unwrap_err(),
        fs.file_exists("a://x", &cancel).await.unwrap_err(),
        fs.write_file("a://x", b"1", false, &cancel).await.unwrap_err(),
        fs.delete_directory("a://d", &cancel).await.unwrap_err(),
    ];
    for err in errors {
        assert_eq!(err.kind(), ErrorKind::NoAdaptersRegistered);
    }
}

#[tokio::test]
async fn malformed_path_is_rejected_before_registry_checks() {
    let fs = FileSystem::new();
    let cancel = CancellationToken::new();

    let err = fs.read_file("no-separator", &cancel).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::PrefixNotFoundInPath);
}

#[tokio::test]
async fn duplicate_prefix_is_reported_with_full_registry() {
    let fs = registry(&["a", "a"]);
    let cancel = CancellationToken::new();

    match fs.read_file("a://x", &cancel).await.unwrap_err() {
        FsError::DuplicateAdapterPrefix {
            duplicates,
            registered,
        } => {
            assert_eq!(duplicates, vec!["a"]);
            assert_eq!(registered, vec!["a", "a"]);
        }
        other => panic!("expected DuplicateAdapterPrefix, got {other:?}"),
    }
}

#[rstest]
#[case(&["a", "b"], "z", ErrorKind::AdapterNotFound)]
#[case(&["a", "b", "a"], "b", ErrorKind::DuplicateAdapterPrefix)]
#[case(&[], "a", ErrorKind::NoAdaptersRegistered)]
#[tokio::test]
async fn registry_validation_order(
    #[case] prefixes: &[&str],
    #[case] prefix: &str,
    #[case] expected: ErrorKind,
) {
    let fs = registry(prefixes);
    let cancel = CancellationToken::new();
    let err = fs
        .file_exists(&format!("{prefix}://x"), &cancel)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), expected);
}

#[tokio::test]
async fn unknown_prefix_names_registered_adapters() {
    let fs = registry(&["a", "b"]);
    let cancel = CancellationToken::new();

    match fs.get_directory("z://", &cancel).await.unwrap_err() {
        FsError::AdapterNotFound { prefix, registered } => {
            assert_eq!(prefix, "z");
            assert_eq!(registered, vec!["a", "b"]);
        }
        other => panic!("expected AdapterNotFound, got {other:?}"),
    }
}

#[tokio::test]
async fn registry_changes_are_seen_by_the_next_call() {
    let mut fs = registry(&["a"]);
    let cancel = CancellationToken::new();
    fs.write_file("a://x", b"1", false, &cancel).await.unwrap();

    fs.add_adapter(MemoryAdapter::new("a"));
    let err = fs.read_file("a://x", &cancel).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::DuplicateAdapterPrefix);
}

#[tokio::test]
async fn connect_runs_before_every_operation() {
    let adapter = Arc::new(InstrumentedAdapter::new("mem"));
    let mut fs = FileSystem::new();
    fs.add_adapter_arc(adapter.clone());
    let cancel = CancellationToken::new();

    fs.write_file("mem://x", b"1", false, &cancel).await.unwrap();
    fs.read_file("mem://x", &cancel).await.unwrap();
    fs.file_exists("mem://y", &cancel).await.unwrap();
    assert_eq!(adapter.connect_count(), 3);
}

#[tokio::test]
async fn failed_lookup_does_not_connect() {
    let adapter = Arc::new(InstrumentedAdapter::new("mem"));
    let mut fs = FileSystem::new();
    fs.add_adapter_arc(adapter.clone());
    let cancel = CancellationToken::new();

    fs.read_file("other://x", &cancel).await.unwrap_err();
    assert_eq!(adapter.connect_count(), 0);
}

#[tokio::test]
async fn connect_failure_is_a_connection_error() {
    let mut fs = FileSystem::new();
    fs.add_adapter(LocalAdapter::new("disk", "/definitely/not/a/real/root"));
    let cancel = CancellationToken::new();

    let err = fs.list_files("disk://", &cancel).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Connection);
}

#[tokio::test]
async fn adapter_errors_pass_through_unchanged() {
    let fs = registry(&["mem"]);
    let cancel = CancellationToken::new();

    match fs.get_file("mem://docs/missing.txt", &cancel).await.unwrap_err() {
        FsError::FileNotFound { prefix, path } => {
            assert_eq!(prefix, "mem");
            assert!(path.ends_with("docs/missing.txt"));
        }
        other => panic!("expected FileNotFound, got {other:?}"),
    }

    let err = fs
        .get_directory("mem://docs", &cancel)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::DirectoryNotFound);
}

#[tokio::test]
async fn cancelled_token_surfaces_as_runtime_error() {
    let fs = registry(&["mem"]);
    let cancel = CancellationToken::new();
    fs.write_file("mem://x", b"1", false, &cancel).await.unwrap();

    cancel.cancel();
    let err = fs.read_file("mem://x", &cancel).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::AdapterRuntime);
}

#[tokio::test]
async fn local_adapter_through_the_dispatcher() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::create_dir(dir.path().join("docs")).unwrap();
    std::fs::write(dir.path().join("docs/readme.txt"), "hi").unwrap();

    let mut fs = FileSystem::new();
    fs.add_adapter(LocalAdapter::new("files", dir.path().to_str().unwrap()));
    let cancel = CancellationToken::new();

    let file = fs.get_file("files://docs/readme.txt", &cancel).await.unwrap();
    assert_eq!(file.name, "readme.txt");
    assert_eq!(file.virtual_path, "files://docs/readme.txt");
    assert_eq!(file.length, Some(2));

    let dirs = fs.list_directories("files://", &cancel).await.unwrap();
    assert_eq!(dirs.len(), 1);
    assert_eq!(dirs[0].virtual_path, "files://docs");

    assert!(fs.directory_exists("files://docs", &cancel).await.unwrap());
    assert!(!fs.file_exists("files://docs/nope.txt", &cancel).await.unwrap());
}

#[tokio::test]
async fn list_entries_puts_directories_first() {
    let fs = registry(&["mem"]);
    let cancel = CancellationToken::new();
    fs.write_file("mem://b.txt", b"", false, &cancel).await.unwrap();
    fs.write_file("mem://a.txt", b"", false, &cancel).await.unwrap();
    fs.create_directory("mem://sub", &cancel).await.unwrap();

    let entries = fs.list_entries("mem://", &cancel).await.unwrap();
    let names: Vec<&str> = entries.iter().map(|e| e.name()).collect();
    assert_eq!(names, vec!["sub", "a.txt", "b.txt"]);
    assert!(entries[0].is_dir());
}

#[tokio::test]
async fn get_adapter_does_not_connect() {
    let adapter = Arc::new(InstrumentedAdapter::new("mem"));
    let mut fs = FileSystem::new();
    fs.add_adapter_arc(adapter.clone());

    let found = fs.get_adapter("mem").unwrap();
    assert_eq!(found.prefix(), "mem");
    assert_eq!(adapter.connect_count(), 0);
}
