use crate::store::S3Store;
use aws_config::{BehaviorVersion, SdkConfig};
use aws_credential_types::provider::ProvideCredentials;
use aws_sdk_s3::config::Region as SdkRegion;
use color_eyre::eyre::eyre;
use s3::{creds::Credentials, Bucket, Region};

/// Used when neither the flags, the environment nor the profile name a region.
pub const FALLBACK_REGION: &str = "us-east-1";

/// What the operator asked for on the command line.
#[derive(Debug, Clone, Default)]
pub struct Context {
    pub profile: Option<String>,
    pub region: Option<String>,
    /// S3-compatible endpoint to use instead of AWS
    pub endpoint: Option<String>,
    pub path_style: bool,
}

/// Resolved AWS configuration for one command invocation.
#[derive(Debug, Clone)]
pub struct Session {
    context: Context,
    sdk_config: SdkConfig,
    region: String,
    /// Resolved from the same chain as `sdk_config`, for the rust-s3 store
    credentials: Credentials,
}

impl Session {
    /// Resolves region and credentials for `context`, failing if no credentials can be found.
    pub async fn load(context: Context) -> color_eyre::Result<Self> {
        let mut loader = aws_config::defaults(BehaviorVersion::latest());
        if let Some(profile) = &context.profile {
            loader = loader.profile_name(profile);
        }
        if let Some(region) = &context.region {
            loader = loader.region(SdkRegion::new(region.clone()));
        }
        if let Some(endpoint) = &context.endpoint {
            loader = loader.endpoint_url(endpoint);
        }

        let sdk_config = loader.load().await;
        let region = sdk_config
            .region()
            .map(|r| r.as_ref().to_owned())
            .unwrap_or_else(|| FALLBACK_REGION.to_owned());

        let provider = sdk_config
            .credentials_provider()
            .ok_or_else(|| eyre!("no AWS credentials provider configured"))?;
        let resolved = provider.provide_credentials().await?;
        let credentials = Credentials::new(
            Some(resolved.access_key_id()),
            Some(resolved.secret_access_key()),
            resolved.session_token(),
            None,
            None,
        )?;

        debug!(profile=?context.profile, %region, endpoint=?context.endpoint, "Loaded AWS config");

        Ok(Self {
            context,
            sdk_config,
            region,
            credentials,
        })
    }

    pub fn region(&self) -> &str {
        &self.region
    }

    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    /// Client for bucket-level calls.
    pub fn admin(&self) -> aws_sdk_s3::Client {
        let config = aws_sdk_s3::config::Builder::from(&self.sdk_config)
            .force_path_style(self.context.path_style)
            .build();
        aws_sdk_s3::Client::from_conf(config)
    }

    /// Store for object uploads and listings in `bucket_name`.
    pub fn store(&self, bucket_name: &str) -> color_eyre::Result<S3Store> {
        let region = Region::Custom {
            region: self.region.clone(),
            endpoint: self
                .context
                .endpoint
                .clone()
                .unwrap_or_else(|| format!("https://s3.{}.amazonaws.com", self.region)),
        };

        let bucket = Bucket::new(bucket_name, region, self.credentials.clone())?;
        let bucket = if self.context.path_style {
            bucket.with_path_style()
        } else {
            bucket
        };

        Ok(S3Store::new(bucket))
    }
}
