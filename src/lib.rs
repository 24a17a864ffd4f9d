use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

pub mod aws;
pub mod bucket;
pub mod content_type;
mod error;
pub mod store;
pub mod sync;
pub mod upload;
pub mod walk;

pub use error::{Error, RemoteError};

#[macro_use]
extern crate tracing;

/// Loads `.env`, installs the tracing subscriber and color-eyre.
///
/// `RUST_LOG` takes precedence over `verbosity`.
pub fn setup(verbosity: u8) -> color_eyre::Result<()> {
    if let Err(e) = dotenvy::dotenv() {
        if !e.not_found() {
            eprintln!("Error reading .env: {e:?}");
        }
    }

    let level = match verbosity {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("warn,webotron={level}")));

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    color_eyre::install()
}
