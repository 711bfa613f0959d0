//! factify - check text and images with the Factify analysis service.

mod cli;
mod render;
mod upload;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let default_filter = if cli::is_verbose() {
        "warn,factify_engine=info,factify_runtime=info,factify_appcore=info"
    } else {
        "warn"
    };

    // `init` also routes the libraries' `log` records into this subscriber.
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    cli::run().await
}
