#![allow(dead_code)]

use async_trait::async_trait;
use std::{
    collections::BTreeMap,
    path::Path,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Mutex,
    },
};
use tokio_util::sync::CancellationToken;
use webotron::{
    bucket::{BucketAdmin, BucketInfo, CreateOutcome},
    store::ObjectStore,
    Error, RemoteError,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    pub contents: Vec<u8>,
    pub content_type: String,
}

/// Keeps objects in memory, optionally failing the Nth put (1-based).
#[derive(Default)]
pub struct MemoryStore {
    pub objects: Mutex<BTreeMap<String, StoredObject>>,
    pub attempts: Mutex<Vec<String>>,
    fail_on: Option<usize>,
    cancel_after: Option<(usize, CancellationToken)>,
    puts: AtomicUsize,
}

impl MemoryStore {
    pub fn failing_on(n: usize) -> Self {
        Self {
            fail_on: Some(n),
            ..Default::default()
        }
    }

    pub fn cancelling_after(n: usize, token: CancellationToken) -> Self {
        Self {
            cancel_after: Some((n, token)),
            ..Default::default()
        }
    }

    pub fn keys(&self) -> Vec<String> {
        self.objects.lock().unwrap().keys().cloned().collect()
    }

    pub fn get(&self, key: &str) -> Option<StoredObject> {
        self.objects.lock().unwrap().get(key).cloned()
    }

    pub fn attempts(&self) -> Vec<String> {
        self.attempts.lock().unwrap().clone()
    }
}

#[async_trait]
impl ObjectStore for MemoryStore {
    fn bucket_name(&self) -> &str {
        "demo"
    }

    async fn put_object(
        &self,
        key: &str,
        contents: &[u8],
        content_type: &str,
    ) -> Result<(), RemoteError> {
        let n = self.puts.fetch_add(1, Ordering::SeqCst) + 1;
        self.attempts.lock().unwrap().push(key.to_owned());

        if self.fail_on == Some(n) {
            return Err(format!("access denied for {key}").into());
        }

        self.objects.lock().unwrap().insert(
            key.to_owned(),
            StoredObject {
                contents: contents.to_vec(),
                content_type: content_type.to_owned(),
            },
        );

        if let Some((after, token)) = &self.cancel_after {
            if n == *after {
                token.cancel();
            }
        }

        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BucketState {
    pub public_policy_allowed: bool,
    pub policy: Option<String>,
    pub website: Option<(String, String)>,
}

/// Behaves like S3 for a single account: creating a bucket twice reports it as already owned,
/// and names in `taken` belong to someone else.
#[derive(Default)]
pub struct FakeAdmin {
    pub buckets: Mutex<BTreeMap<String, BucketState>>,
    pub taken: Vec<String>,
    pub calls: Mutex<Vec<String>>,
}

impl FakeAdmin {
    pub fn with_taken(names: &[&str]) -> Self {
        Self {
            taken: names.iter().map(|n| n.to_string()).collect(),
            ..Default::default()
        }
    }

    pub fn state(&self, bucket: &str) -> Option<BucketState> {
        self.buckets.lock().unwrap().get(bucket).cloned()
    }

    fn record(&self, call: &str) {
        self.calls.lock().unwrap().push(call.to_owned());
    }
}

#[async_trait]
impl BucketAdmin for FakeAdmin {
    async fn create_bucket(&self, bucket: &str, _region: &str) -> Result<CreateOutcome, Error> {
        self.record("create_bucket");
        if self.taken.iter().any(|t| t == bucket) {
            return Err(Error::BucketConflict {
                bucket: bucket.to_owned(),
                code: "BucketAlreadyExists".into(),
                message: "The requested bucket name is not available".into(),
            });
        }

        let mut buckets = self.buckets.lock().unwrap();
        if buckets.contains_key(bucket) {
            return Ok(CreateOutcome::AlreadyOwned);
        }
        buckets.insert(
            bucket.to_owned(),
            BucketState {
                public_policy_allowed: false,
                policy: None,
                website: None,
            },
        );
        Ok(CreateOutcome::Created)
    }

    async fn allow_public_policy(&self, bucket: &str) -> Result<(), Error> {
        self.record("allow_public_policy");
        let mut buckets = self.buckets.lock().unwrap();
        let state = buckets.get_mut(bucket).ok_or_else(|| Error::Remote {
            operation: "PutPublicAccessBlock",
            source: "NoSuchBucket".into(),
        })?;
        state.public_policy_allowed = true;
        Ok(())
    }

    async fn put_policy(&self, bucket: &str, policy: &str) -> Result<(), Error> {
        self.record("put_policy");
        let mut buckets = self.buckets.lock().unwrap();
        let state = buckets.get_mut(bucket).ok_or_else(|| Error::Remote {
            operation: "PutBucketPolicy",
            source: "NoSuchBucket".into(),
        })?;
        // new buckets reject public policies until the public access block is lifted
        if !state.public_policy_allowed {
            return Err(Error::Remote {
                operation: "PutBucketPolicy",
                source: "AccessDenied".into(),
            });
        }
        state.policy = Some(policy.to_owned());
        Ok(())
    }

    async fn put_website(
        &self,
        bucket: &str,
        index_document: &str,
        error_document: &str,
    ) -> Result<(), Error> {
        self.record("put_website");
        let mut buckets = self.buckets.lock().unwrap();
        let state = buckets.get_mut(bucket).ok_or_else(|| Error::Remote {
            operation: "PutBucketWebsite",
            source: "NoSuchBucket".into(),
        })?;
        state.website = Some((index_document.to_owned(), error_document.to_owned()));
        Ok(())
    }

    async fn list_buckets(&self) -> Result<Vec<BucketInfo>, Error> {
        Ok(self
            .buckets
            .lock()
            .unwrap()
            .keys()
            .map(|name| BucketInfo {
                name: name.clone(),
                created: None,
            })
            .collect())
    }
}

pub fn write(root: &Path, relative: &str, contents: &str) {
    let path = root.join(relative);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(path, contents).unwrap();
}
