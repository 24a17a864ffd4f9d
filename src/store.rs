use crate::error::{Error, RemoteError};
use async_trait::async_trait;
use s3::Bucket;

/// Somewhere objects can be written to.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Name of the bucket objects end up in
    fn bucket_name(&self) -> &str;

    /// Creates or overwrites `key`.
    async fn put_object(
        &self,
        key: &str,
        contents: &[u8],
        content_type: &str,
    ) -> Result<(), RemoteError>;
}

/// An object as reported by a bucket listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteObject {
    pub key: String,
    pub size: u64,
    pub last_modified: String,
}

/// Bucket-backed store used for the real uploads.
#[derive(Debug, Clone)]
pub struct S3Store {
    bucket: Box<Bucket>,
}

impl S3Store {
    pub fn new(bucket: Box<Bucket>) -> Self {
        Self { bucket }
    }

    /// Every object in the bucket, across all listing pages.
    pub async fn list_objects(&self) -> Result<Vec<RemoteObject>, Error> {
        let pages = self
            .bucket
            .list(String::new(), None)
            .await
            .map_err(|e| Error::remote("ListObjects", e))?;

        Ok(pages
            .into_iter()
            .flat_map(|page| page.contents)
            .map(|object| RemoteObject {
                key: object.key,
                size: object.size,
                last_modified: object.last_modified,
            })
            .collect())
    }
}

#[async_trait]
impl ObjectStore for S3Store {
    fn bucket_name(&self) -> &str {
        &self.bucket.name
    }

    async fn put_object(
        &self,
        key: &str,
        contents: &[u8],
        content_type: &str,
    ) -> Result<(), RemoteError> {
        let rsp = self
            .bucket
            .put_object_with_content_type(key, contents, content_type)
            .await?;

        let code = rsp.status_code();
        if !(200..300).contains(&code) {
            return Err(format!("store answered with status {code}").into());
        }

        trace!(?key, %code, "Stored object");
        Ok(())
    }
}
