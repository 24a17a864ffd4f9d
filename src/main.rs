use clap::{Parser, Subcommand};
use color_eyre::eyre::bail;
use comfy_table::{presets::UTF8_FULL, Table};
use std::path::PathBuf;
use tokio::signal;
use tokio_util::sync::CancellationToken;
use webotron::{
    aws::{Context, Session},
    bucket::{setup_bucket, BucketAdmin},
    setup,
    sync::{sync_dir, SyncOptions},
};

#[macro_use]
extern crate tracing;

/// Deploys static websites to S3.
#[derive(Debug, Parser)]
#[command(name = "webotron", version)]
struct Cli {
    /// AWS profile to take credentials and region from
    #[arg(long, global = true, env = "AWS_PROFILE")]
    profile: Option<String>,

    /// Region to work in, overriding the profile's
    #[arg(long, global = true, env = "AWS_REGION")]
    region: Option<String>,

    /// S3-compatible endpoint to talk to instead of AWS
    #[arg(long, global = true, env = "AWS_ENDPOINT_URL_S3")]
    endpoint_url: Option<String>,

    /// Address buckets by path rather than by subdomain
    #[arg(long, global = true)]
    path_style: bool,

    /// More logging (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// List all buckets
    ListBuckets,
    /// List the objects in a bucket
    ListBucketObjects { bucket: String },
    /// Create a bucket and configure it for public static website hosting
    SetupBucket { bucket: String },
    /// Upload every file under PATHNAME to BUCKET
    Sync {
        pathname: PathBuf,
        bucket: String,
        /// Number of uploads to run at once
        #[arg(short, long, default_value_t = 1)]
        jobs: usize,
        /// Skip symlinks instead of uploading what they point at
        #[arg(long)]
        no_follow_symlinks: bool,
    },
}

//adapted from https://github.com/tokio-rs/axum/blob/main/examples/graceful-shutdown/src/main.rs
async fn shutdown_signal(cancel: CancellationToken) {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(?e, "Unable to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                error!(?e, "Unable to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    warn!("Shutdown signal received");
    cancel.cancel();
}

async fn list_buckets(session: &Session) -> color_eyre::Result<()> {
    let buckets = BucketAdmin::list_buckets(&session.admin()).await?;

    let mut table = Table::new();
    table.load_preset(UTF8_FULL).set_header(vec!["Bucket", "Created"]);
    for bucket in buckets {
        table.add_row(vec![bucket.name, bucket.created.unwrap_or_default()]);
    }
    println!("{table}");

    Ok(())
}

async fn list_bucket_objects(session: &Session, bucket: &str) -> color_eyre::Result<()> {
    let objects = session.store(bucket)?.list_objects().await?;

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_header(vec!["Key", "Size", "Last Modified"]);
    for object in objects {
        table.add_row(vec![
            object.key,
            object.size.to_string(),
            object.last_modified,
        ]);
    }
    println!("{table}");

    Ok(())
}

async fn provision(session: &Session, bucket: &str) -> color_eyre::Result<()> {
    let endpoint = setup_bucket(&session.admin(), bucket, session.region()).await?;
    println!("{bucket} is serving at {endpoint}");
    Ok(())
}

async fn sync(
    session: &Session,
    pathname: PathBuf,
    bucket: &str,
    options: SyncOptions,
) -> color_eyre::Result<()> {
    if !pathname.is_dir() {
        bail!("{pathname:?} is not an existing directory");
    }

    let store = session.store(bucket)?;
    let cancel = CancellationToken::new();
    let signal_task = tokio::spawn(shutdown_signal(cancel.clone()));

    let result = sync_dir(&store, &pathname, options, &cancel).await;
    signal_task.abort();

    match result {
        Ok(summary) => {
            println!(
                "Uploaded {} file(s) from {:?} to {}",
                summary.uploaded, summary.root, summary.bucket
            );
            Ok(())
        }
        Err(aborted) => {
            error!(
                code = aborted.error.code(),
                uploaded = aborted.uploaded,
                "Sync aborted"
            );
            Err(aborted.into())
        }
    }
}

fn main() -> color_eyre::Result<()> {
    let cli = Cli::parse();
    setup(cli.verbose)?;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;

    let context = Context {
        profile: cli.profile,
        region: cli.region,
        endpoint: cli.endpoint_url,
        path_style: cli.path_style,
    };

    runtime.block_on(async move {
        let session = Session::load(context).await?;

        match cli.command {
            Command::ListBuckets => list_buckets(&session).await,
            Command::ListBucketObjects { bucket } => list_bucket_objects(&session, &bucket).await,
            Command::SetupBucket { bucket } => provision(&session, &bucket).await,
            Command::Sync {
                pathname,
                bucket,
                jobs,
                no_follow_symlinks,
            } => {
                let options = SyncOptions {
                    jobs,
                    follow_links: !no_follow_symlinks,
                };
                sync(&session, pathname, &bucket, options).await
            }
        }
    })
}
