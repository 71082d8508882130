use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use travel_chat_client::config::load_settings;
use travel_chat_client::ui::app::ConsoleApp;
use travel_chat_client::HttpTransport;

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "travel_chat_client=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let settings = load_settings();
    let transport = HttpTransport::new(settings.endpoint.clone(), settings.request_timeout())?;
    tracing::info!(endpoint = transport.endpoint(), "using chat endpoint");

    ConsoleApp::new(settings, Arc::new(transport)).run().await
}
