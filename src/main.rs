use std::sync::Arc;

use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;

use bsky_chat_bridge::config::{BridgeConfig, LogFormat};
use bsky_chat_bridge::delivery::ChannelDeliveryQueue;
use bsky_chat_bridge::identity::DidSenderResolver;
use bsky_chat_bridge::lexicon::LogPage;
use bsky_chat_bridge::pipeline::{EventDispatcher, MessageDetailExtractor, UserId};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = BridgeConfig::from_env()?;

    // Logs go to stderr; stdout carries the converted messages.
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr);
    match config.log_format {
        LogFormat::Text => subscriber.init(),
        LogFormat::Json => subscriber.json().init(),
    }

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        user_did = ?config.user_did.as_ref().map(|d| d.as_str()),
        input = ?config.input,
        "Starting bridge core"
    );

    // ── Pipeline ────────────────────────────────────────────────────────
    let resolver = Arc::new(DidSenderResolver::new(config.user_did.clone()));
    let (queue, mut queued_rx) = ChannelDeliveryQueue::new();
    let dispatcher = EventDispatcher::new(MessageDetailExtractor::new(resolver), Arc::new(queue))
        .with_receiver(config.user_did.as_ref().map(|d| UserId(d.to_string())));

    // Delivery side: one JSON message per line on stdout.
    let printer = tokio::spawn(async move {
        let mut delivered = 0usize;
        while let Some(queued) = queued_rx.recv().await {
            queued.context.span().in_scope(|| {
                match serde_json::to_string(&queued.message) {
                    Ok(line) => {
                        println!("{line}");
                        delivered += 1;
                    }
                    Err(e) => tracing::warn!(error = %e, "Failed to serialize message"),
                }
            });
        }
        delivered
    });

    // ── Input ───────────────────────────────────────────────────────────
    let reader: Box<dyn AsyncBufRead + Unpin + Send> = match &config.input {
        Some(path) => Box::new(BufReader::new(tokio::fs::File::open(path).await?)),
        None => Box::new(BufReader::new(tokio::io::stdin())),
    };

    let mut lines = reader.lines();
    let mut line_no = 0usize;
    let mut cursor = None;
    while let Some(line) = lines.next_line().await? {
        line_no += 1;
        if line.trim().is_empty() {
            continue;
        }
        match serde_json::from_str::<LogPage>(&line) {
            Ok(page) => {
                if let Some(next) = dispatcher.handle_page(page).await {
                    cursor = Some(next);
                }
            }
            Err(e) => tracing::warn!(line = line_no, error = %e, "Skipping malformed log page"),
        }
    }

    // Dropping the dispatcher closes the queue so the printer can finish.
    drop(dispatcher);
    let delivered = printer.await?;
    tracing::info!(delivered, cursor = ?cursor, "Input exhausted");

    Ok(())
}
