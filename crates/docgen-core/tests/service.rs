//! Persistence and regeneration through the document service

use async_trait::async_trait;
use docgen_core::{
    snapshot_key, DocgenConfig, DocgenError, DocumentGenerator, DocumentService, DocumentStore,
    FsStore, MemoryStore, ObjectMeta, PutOptions, StorageError,
};
use docgen_ai::TextGenerator;
use docgen_test_utils::{jane_doe_input, FailingGenerator, ScriptedGenerator};
use pretty_assertions::assert_eq;
use std::sync::Arc;

fn service_with(
    generator: Arc<dyn TextGenerator>,
    store: Arc<dyn DocumentStore>,
) -> DocumentService {
    let config = DocgenConfig::default().with_backoff_ms(0, 0);
    DocumentService::new(DocumentGenerator::from_config(&config, generator), store)
}

/// Memory store that rejects puts for keys with a given suffix
struct RejectingStore {
    inner: MemoryStore,
    reject_suffix: &'static str,
}

#[async_trait]
impl DocumentStore for RejectingStore {
    async fn put(
        &self,
        key: &str,
        content: Vec<u8>,
        options: PutOptions,
    ) -> Result<ObjectMeta, StorageError> {
        if key.ends_with(self.reject_suffix) {
            return Err(StorageError::io_error(
                key,
                std::io::Error::new(std::io::ErrorKind::PermissionDenied, "read-only bucket"),
            ));
        }
        self.inner.put(key, content, options).await
    }

    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StorageError> {
        self.inner.get(key).await
    }

    async fn head(&self, key: &str) -> Result<Option<ObjectMeta>, StorageError> {
        self.inner.head(key).await
    }
}

#[tokio::test]
async fn stores_document_and_input_snapshot() {
    let store = Arc::new(MemoryStore::new());
    let service = service_with(Arc::new(ScriptedGenerator::new()), store.clone());

    let result = service.generate_and_store(&jane_doe_input()).await.unwrap();

    assert_eq!(result.regeneration_available, Some(true));
    assert_eq!(
        store.keys(),
        vec![
            format!("{}.html", result.filename),
            format!("{}.input.json", result.filename),
        ]
    );

    let document = store
        .head(&format!("{}.html", result.filename))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(document.content_type, "text/html; charset=utf-8");
    assert_eq!(document.metadata["documentType"], "letter_of_demand");
    assert_eq!(document.metadata["isFallback"], "false");
    assert_eq!(
        document.metadata["generationId"],
        result.generation_id().unwrap()
    );

    let snapshot = store
        .head(&snapshot_key(&result.filename))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(snapshot.content_type, "application/json");

    let fetched = service.fetch_document(&result.filename).await.unwrap();
    assert_eq!(fetched.as_deref(), Some(result.document_text.as_str()));
}

#[tokio::test]
async fn snapshot_is_always_json_whatever_the_hint() {
    let store = Arc::new(MemoryStore::new());
    let service = service_with(Arc::new(ScriptedGenerator::new()), store.clone());

    let result = service
        .generate_and_store_with(&jane_doe_input(), PutOptions::content_type("text/plain"))
        .await
        .unwrap();

    let document = service.document_meta(&result.filename).await.unwrap().unwrap();
    assert_eq!(document.content_type, "text/plain");
    let snapshot = store
        .head(&snapshot_key(&result.filename))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(snapshot.content_type, "application/json");
}

#[tokio::test]
async fn snapshot_failure_only_disables_regeneration() {
    let store = Arc::new(RejectingStore {
        inner: MemoryStore::new(),
        reject_suffix: ".input.json",
    });
    let service = service_with(Arc::new(ScriptedGenerator::new()), store.clone());

    let result = service.generate_and_store(&jane_doe_input()).await.unwrap();

    assert!(result.success);
    assert_eq!(result.regeneration_available, Some(false));
    assert_eq!(store.inner.len(), 1);

    let err = service.regenerate(&result.filename).await.unwrap_err();
    assert!(matches!(err, DocgenError::SnapshotMissing(_)));
}

#[tokio::test]
async fn document_store_failure_is_fatal() {
    let store = Arc::new(RejectingStore {
        inner: MemoryStore::new(),
        reject_suffix: ".html",
    });
    let service = service_with(Arc::new(ScriptedGenerator::new()), store.clone());

    let err = service.generate_and_store(&jane_doe_input()).await.unwrap_err();

    assert!(matches!(err, DocgenError::Storage(_)), "{err}");
    assert!(store.inner.is_empty());
}

#[tokio::test]
async fn regeneration_stores_a_new_document() {
    let store = Arc::new(MemoryStore::new());
    let service = service_with(Arc::new(ScriptedGenerator::new()), store.clone());
    let original = service.generate_and_store(&jane_doe_input()).await.unwrap();

    let regenerated = service
        .regenerate(&format!("{}.html", original.filename))
        .await
        .unwrap();

    assert_ne!(regenerated.filename, original.filename);
    assert_eq!(regenerated.customer_name, "Jane Doe");
    assert_eq!(store.len(), 4);

    let meta = service
        .document_meta(&regenerated.filename)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(meta.metadata["regeneratedFrom"], original.filename);

    // Original untouched
    let before = service.fetch_document(&original.filename).await.unwrap();
    assert_eq!(before.as_deref(), Some(original.document_text.as_str()));
}

#[tokio::test]
async fn fallback_documents_can_be_regenerated() {
    let store: Arc<dyn DocumentStore> = Arc::new(MemoryStore::new());
    let offline = service_with(Arc::new(FailingGenerator::unauthorized()), store.clone());
    let degraded = offline.generate_and_store(&jane_doe_input()).await.unwrap();
    assert!(degraded.is_fallback);
    assert_eq!(degraded.regeneration_available, Some(true));

    let online = service_with(Arc::new(ScriptedGenerator::new()), store);
    let restored = online.regenerate(&degraded.filename).await.unwrap();

    assert!(!restored.is_fallback);
    assert!(!restored.filename.ends_with("_fallback"));
}

#[tokio::test]
async fn snapshot_round_trips_the_input() {
    let store = Arc::new(MemoryStore::new());
    let service = service_with(Arc::new(ScriptedGenerator::new()), store);
    let raw = jane_doe_input();
    let result = service.generate_and_store(&raw).await.unwrap();

    assert_eq!(service.load_snapshot(&result.filename).await.unwrap(), raw);
}

#[tokio::test]
async fn missing_snapshot_is_a_client_error() {
    let service = service_with(Arc::new(ScriptedGenerator::new()), Arc::new(MemoryStore::new()));

    let err = service.regenerate("au_letter_of_demand_deadbeef").await.unwrap_err();

    assert!(matches!(
        err,
        DocgenError::SnapshotMissing(ref name) if name == "au_letter_of_demand_deadbeef"
    ));
    assert!(err.is_client_error());
}

#[tokio::test]
async fn unreadable_snapshot_is_reported() {
    let store = Arc::new(MemoryStore::new());
    store
        .put(
            "au_letter_of_demand_deadbeef.input.json",
            b"{ not json".to_vec(),
            PutOptions::content_type("application/json"),
        )
        .await
        .unwrap();
    let service = service_with(Arc::new(ScriptedGenerator::new()), store);

    let err = service.regenerate("au_letter_of_demand_deadbeef").await.unwrap_err();

    assert!(matches!(err, DocgenError::InvalidSnapshot { .. }), "{err}");
}

#[tokio::test]
async fn filesystem_store_end_to_end() {
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(FsStore::new(dir.path().join("documents")));
    let service = service_with(Arc::new(ScriptedGenerator::new()), store);

    let result = service.generate_and_store(&jane_doe_input()).await.unwrap();

    let html = dir.path().join("documents").join(format!("{}.html", result.filename));
    assert_eq!(std::fs::read_to_string(html).unwrap(), result.document_text);

    let regenerated = service.regenerate(&result.filename).await.unwrap();
    assert!(regenerated.success);
    assert_eq!(regenerated.regeneration_available, Some(true));
}
