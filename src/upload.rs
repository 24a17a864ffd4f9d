use crate::{content_type, store::ObjectStore, walk::LocalFile, Error};
use std::path::PathBuf;

/// One object write, built just before it happens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadRequest {
    pub bucket: String,
    pub key: String,
    pub source_path: PathBuf,
    pub content_type: String,
}

impl UploadRequest {
    pub fn new(bucket: impl Into<String>, file: LocalFile) -> Self {
        let content_type = content_type::resolve(&file.relative_key);
        Self {
            bucket: bucket.into(),
            content_type: content_type.essence_str().to_owned(),
            key: file.relative_key,
            source_path: file.absolute_path,
        }
    }
}

/// Pushes one local file to the store under its relative key, overwriting whatever was there.
///
/// Returns the key that was written.
pub async fn upload_file<S: ObjectStore + ?Sized>(store: &S, file: LocalFile) -> Result<String, Error> {
    let UploadRequest {
        bucket,
        key,
        source_path,
        content_type,
    } = UploadRequest::new(store.bucket_name(), file);

    let contents = tokio::fs::read(&source_path)
        .await
        .map_err(|e| Error::filesystem(&source_path, e))?;

    store
        .put_object(&key, &contents, &content_type)
        .await
        .map_err(|source| Error::Upload {
            key: key.clone(),
            source,
        })?;

    info!(?bucket, ?key, ?content_type, len=?contents.len(), "Uploaded");
    Ok(key)
}
