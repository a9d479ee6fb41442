use embedd::config::{resolve_overlap, EmbeddConfig};
use std::path::PathBuf;
use tempfile::TempDir;

#[test]
fn load_from_missing_file_uses_defaults() {
    let tmp = TempDir::new().unwrap();
    let config = EmbeddConfig::load_from(tmp.path().join("absent.toml")).unwrap();
    assert_eq!(config.embedding.chunk_size, 196);
    assert_eq!(config.embedding.overlap, 0.15);
}

#[test]
fn load_from_file_and_resolve() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("config.toml");
    std::fs::write(
        &path,
        r#"
[embedding]
tokenizer_path = "/models/tokenizer.json"
model_path = "/models/model.onnx"
chunk_size = 200
overlap = 10
"#,
    )
    .unwrap();

    let resolved = EmbeddConfig::load_from(&path).unwrap().resolve().unwrap();
    assert_eq!(resolved.tokenizer_path, PathBuf::from("/models/tokenizer.json"));
    assert_eq!(resolved.model_path, PathBuf::from("/models/model.onnx"));
    assert_eq!(resolved.chunk_size, 200);
    assert_eq!(resolved.overlap, 10);
}

#[test]
fn invalid_toml_is_an_error() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("config.toml");
    std::fs::write(&path, "[embedding\nchunk_size = ").unwrap();
    assert!(EmbeddConfig::load_from(&path).is_err());
}

#[test]
fn overlap_resolution_examples() {
    assert_eq!(resolve_overlap(10.0, 200).unwrap(), 10);
    assert_eq!(resolve_overlap(0.2, 200).unwrap(), 40);
}

#[test]
fn overlap_not_smaller_than_chunk_size_is_rejected() {
    let mut config = EmbeddConfig::default();
    config.embedding.chunk_size = 10;
    config.embedding.overlap = 10.0;
    assert!(config.resolve().is_err());
}
