use std::io::Write;

use clap::Parser;
use futures_util::StreamExt;
use serde_json::json;
use tracing_subscriber::EnvFilter;

use stream_relay::decoder::{decode_stream, EndReason, Event};

#[derive(Parser)]
#[command(name = "stream-cli")]
#[command(about = "Send a query through the relay and print the streamed answer", long_about = None)]
struct Cli {
    /// Streaming endpoint, usually the relay prefix plus the upstream path.
    #[arg(short, long, default_value = "http://localhost:8080/api/proxy/api/stream_query")]
    url: String,

    /// Question to send.
    query: String,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let query = cli.query.trim();
    if query.is_empty() {
        return Err("query must not be empty".into());
    }

    let client = reqwest::Client::new();
    let res = match client
        .post(&cli.url)
        .json(&json!({ "query": query }))
        .send()
        .await
    {
        Ok(res) => res,
        Err(e) => {
            eprintln!("Error: failed to connect to stream at {}: {}", cli.url, e);
            return Err(e.into());
        }
    };

    let status = res.status();
    if !status.is_success() {
        eprintln!("Error: stream endpoint returned status {}", status);
        if let Ok(text) = res.text().await {
            eprintln!("Response: {}", text);
        }
        return Err(format!("HTTP error! Status: {}", status.as_u16()).into());
    }

    let mut stdout = std::io::stdout();
    let mut events = std::pin::pin!(decode_stream(res.bytes_stream()));
    while let Some(event) = events.next().await {
        match event {
            Event::Data(payload) => {
                stdout.write_all(payload.as_bytes())?;
                stdout.flush()?;
            }
            Event::End(reason) => {
                writeln!(stdout)?;
                if reason == EndReason::TransportClosed {
                    eprintln!("Warning: stream closed without an end marker");
                }
            }
            Event::Error(reason) => {
                writeln!(stdout)?;
                eprintln!("Error: stream aborted: {}", reason);
                return Err(reason.into());
            }
        }
    }

    Ok(())
}
