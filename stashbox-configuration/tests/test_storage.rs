use stashbox_backend::CacheStorage;
use stashbox_configuration::{ConfigWorker, Moka, Storage};

#[test]
fn test_moka_storage_deserialize() {
    let storage: Storage = serde_saphyr::from_str("type: Moka").expect("failed to deserialize");
    assert_eq!(storage, Storage::Moka(Moka {}));
}

#[test]
fn test_size_limits_are_rejected() {
    let yaml = r#"
type: Moka
max_entries: 10000
"#;
    assert!(serde_saphyr::from_str::<Storage>(yaml).is_err());
}

#[test]
fn test_storage_defaults_to_unbounded_moka() {
    let config = ConfigWorker::from_yaml("{}").expect("failed to parse");
    assert_eq!(config.storage, Storage::Moka(Moka {}));
}

#[test]
fn test_storage_serialize_roundtrip() {
    let storage = Storage::Moka(Moka {});

    let yaml = serde_saphyr::to_string(&storage).expect("failed to serialize");
    let deserialized: Storage = serde_saphyr::from_str(&yaml).expect("failed to deserialize");

    assert_eq!(storage, deserialized);
}

#[test]
fn test_unknown_storage_type_is_rejected() {
    let yaml = r#"
storage:
  type: Redis
"#;
    assert!(ConfigWorker::from_yaml(yaml).is_err());
}

#[tokio::test]
async fn test_into_parts_builds_storage() {
    let yaml = r#"
versions:
  static: v2
storage:
  type: Moka
"#;

    let (config, storage) = ConfigWorker::from_yaml(yaml)
        .unwrap()
        .into_parts()
        .expect("invalid config");

    let generation = config.static_generation();
    let name = generation.name();
    assert_eq!(name, "static-v2");
    storage.open(name).await.unwrap();
    assert_eq!(storage.keys().await.unwrap(), vec![name.clone()]);
}
