use crate::Error;
use async_trait::async_trait;
use aws_sdk_s3::{
    error::{DisplayErrorContext, ProvideErrorMetadata},
    primitives::DateTimeFormat,
    types::{
        BucketLocationConstraint, CreateBucketConfiguration, ErrorDocument, IndexDocument,
        PublicAccessBlockConfiguration, WebsiteConfiguration,
    },
    Client,
};
use serde_json::json;

pub const INDEX_DOCUMENT: &str = "index.html";
pub const ERROR_DOCUMENT: &str = "error.html";

/// S3 rejects an explicit location constraint for this region.
const DEFAULT_REGION: &str = "us-east-1";

/// Regions whose website endpoints use `s3-website-<region>` rather than `s3-website.<region>`.
const DASHED_WEBSITE_REGIONS: &[&str] = &[
    "us-east-1",
    "us-west-1",
    "us-west-2",
    "ap-southeast-1",
    "ap-southeast-2",
    "ap-northeast-1",
    "eu-west-1",
    "sa-east-1",
    "us-gov-west-1",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CreateOutcome {
    Created,
    /// We already own a bucket with this name, so it gets reused
    AlreadyOwned,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BucketInfo {
    pub name: String,
    pub created: Option<String>,
}

/// Bucket-level administration.
#[async_trait]
pub trait BucketAdmin: Send + Sync {
    async fn create_bucket(&self, bucket: &str, region: &str) -> Result<CreateOutcome, Error>;

    /// Lifts the block on public bucket policies that new buckets get by default.
    async fn allow_public_policy(&self, bucket: &str) -> Result<(), Error>;

    async fn put_policy(&self, bucket: &str, policy: &str) -> Result<(), Error>;

    async fn put_website(
        &self,
        bucket: &str,
        index_document: &str,
        error_document: &str,
    ) -> Result<(), Error>;

    async fn list_buckets(&self) -> Result<Vec<BucketInfo>, Error>;
}

/// Policy letting anyone read any object in `bucket`.
pub fn public_read_policy(bucket: &str) -> String {
    json!({
        "Version": "2012-10-17",
        "Statement": [{
            "Sid": "PublicReadGetObject",
            "Effect": "Allow",
            "Principal": "*",
            "Action": ["s3:GetObject"],
            "Resource": [format!("arn:aws:s3:::{bucket}/*")],
        }]
    })
    .to_string()
}

pub fn website_endpoint(bucket: &str, region: &str) -> String {
    if DASHED_WEBSITE_REGIONS.contains(&region) {
        format!("http://{bucket}.s3-website-{region}.amazonaws.com")
    } else {
        format!("http://{bucket}.s3-website.{region}.amazonaws.com")
    }
}

/// Creates `bucket` (or reuses it if we already own it), makes its objects publicly readable
/// and turns on static website hosting. Safe to run again on the same bucket.
///
/// Returns the website endpoint.
#[instrument(skip(admin))]
pub async fn setup_bucket<A: BucketAdmin + ?Sized>(
    admin: &A,
    bucket: &str,
    region: &str,
) -> Result<String, Error> {
    match admin.create_bucket(bucket, region).await? {
        CreateOutcome::Created => info!("Created bucket"),
        CreateOutcome::AlreadyOwned => info!("Bucket already owned, reusing it"),
    }

    admin.allow_public_policy(bucket).await?;
    admin.put_policy(bucket, &public_read_policy(bucket)).await?;
    debug!("Attached public read policy");

    admin
        .put_website(bucket, INDEX_DOCUMENT, ERROR_DOCUMENT)
        .await?;
    debug!("Enabled website hosting");

    Ok(website_endpoint(bucket, region))
}

#[async_trait]
impl BucketAdmin for Client {
    async fn create_bucket(&self, bucket: &str, region: &str) -> Result<CreateOutcome, Error> {
        let mut request = self.create_bucket().bucket(bucket);
        if region != DEFAULT_REGION {
            request = request.create_bucket_configuration(
                CreateBucketConfiguration::builder()
                    .location_constraint(BucketLocationConstraint::from(region))
                    .build(),
            );
        }

        match request.send().await {
            Ok(_) => Ok(CreateOutcome::Created),
            Err(e)
                if e.as_service_error()
                    .is_some_and(|e| e.is_bucket_already_owned_by_you()) =>
            {
                Ok(CreateOutcome::AlreadyOwned)
            }
            Err(e) => Err(Error::BucketConflict {
                bucket: bucket.to_owned(),
                code: e.code().unwrap_or("Unknown").to_owned(),
                message: e
                    .message()
                    .map(str::to_owned)
                    .unwrap_or_else(|| DisplayErrorContext(&e).to_string()),
            }),
        }
    }

    async fn allow_public_policy(&self, bucket: &str) -> Result<(), Error> {
        self.put_public_access_block()
            .bucket(bucket)
            .public_access_block_configuration(
                PublicAccessBlockConfiguration::builder()
                    .block_public_acls(true)
                    .ignore_public_acls(true)
                    .block_public_policy(false)
                    .restrict_public_buckets(false)
                    .build(),
            )
            .send()
            .await
            .map_err(|e| Error::remote("PutPublicAccessBlock", e))?;
        Ok(())
    }

    async fn put_policy(&self, bucket: &str, policy: &str) -> Result<(), Error> {
        self.put_bucket_policy()
            .bucket(bucket)
            .policy(policy)
            .send()
            .await
            .map_err(|e| Error::remote("PutBucketPolicy", e))?;
        Ok(())
    }

    async fn put_website(
        &self,
        bucket: &str,
        index_document: &str,
        error_document: &str,
    ) -> Result<(), Error> {
        let index = IndexDocument::builder()
            .suffix(index_document)
            .build()
            .map_err(|e| Error::remote("PutBucketWebsite", e))?;
        let error = ErrorDocument::builder()
            .key(error_document)
            .build()
            .map_err(|e| Error::remote("PutBucketWebsite", e))?;

        self.put_bucket_website()
            .bucket(bucket)
            .website_configuration(
                WebsiteConfiguration::builder()
                    .index_document(index)
                    .error_document(error)
                    .build(),
            )
            .send()
            .await
            .map_err(|e| Error::remote("PutBucketWebsite", e))?;
        Ok(())
    }

    async fn list_buckets(&self) -> Result<Vec<BucketInfo>, Error> {
        let output = self
            .list_buckets()
            .send()
            .await
            .map_err(|e| Error::remote("ListBuckets", e))?;

        Ok(output
            .buckets()
            .iter()
            .map(|b| BucketInfo {
                name: b.name().unwrap_or_default().to_owned(),
                created: b
                    .creation_date()
                    .and_then(|d| d.fmt(DateTimeFormat::DateTime).ok()),
            })
            .collect())
    }
}
