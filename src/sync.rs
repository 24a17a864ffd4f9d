use crate::{store::ObjectStore, upload::upload_file, walk::walk, Error};
use futures::{stream::FuturesUnordered, StreamExt};
use std::path::{Path, PathBuf};
use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone, Copy)]
pub struct SyncOptions {
    /// Maximum number of uploads in flight. `1` uploads strictly one file at a time.
    pub jobs: usize,
    /// Upload symlinked files and descend into symlinked directories
    pub follow_links: bool,
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self {
            jobs: 1,
            follow_links: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncSummary {
    pub bucket: String,
    pub root: PathBuf,
    pub uploaded: usize,
}

/// A sync that stopped early. Objects counted in `uploaded` stay in the bucket.
#[derive(Debug, thiserror::Error)]
#[error("sync aborted after {uploaded} upload(s): {error}")]
pub struct SyncAborted {
    pub uploaded: usize,
    #[source]
    pub error: Error,
}

/// Uploads every regular file under `root` to `store`, keyed by its path relative to `root`.
///
/// Every file is uploaded on every run. The first error stops any new upload from starting
/// (uploads already in flight are allowed to finish) and is returned along with how many
/// uploads succeeded. `cancel` is checked before each upload starts.
pub async fn sync_dir<S: ObjectStore + ?Sized>(
    store: &S,
    root: &Path,
    options: SyncOptions,
    cancel: &CancellationToken,
) -> Result<SyncSummary, SyncAborted> {
    let root = std::fs::canonicalize(root).map_err(|e| SyncAborted {
        uploaded: 0,
        error: Error::filesystem(root, e),
    })?;
    let bucket = store.bucket_name().to_owned();
    let jobs = options.jobs.max(1);

    info!(?root, ?bucket, %jobs, "Syncing");

    let mut files = walk(&root, options.follow_links);
    let mut in_flight = FuturesUnordered::new();
    let mut uploaded = 0;
    let mut failure: Option<Error> = None;

    loop {
        while failure.is_none() && in_flight.len() < jobs {
            if cancel.is_cancelled() {
                warn!("Cancelled, not starting any more uploads");
                failure = Some(Error::Cancelled);
                break;
            }

            match files.next() {
                Some(Ok(file)) => in_flight.push(upload_file(store, file)),
                Some(Err(e)) => {
                    error!(code = e.code(), ?e, "Walking the sync root failed");
                    failure = Some(e);
                }
                None => break,
            }
        }

        match in_flight.next().await {
            Some(Ok(_key)) => uploaded += 1,
            Some(Err(e)) => {
                error!(code = e.code(), ?e, "Upload failed");
                failure.get_or_insert(e);
            }
            None => break,
        }
    }

    match failure {
        Some(error) => Err(SyncAborted { uploaded, error }),
        None => {
            info!(%uploaded, ?bucket, "Sync finished");
            Ok(SyncSummary {
                bucket,
                root,
                uploaded,
            })
        }
    }
}
