//! Stand-in for the upstream service: answers `POST /api/stream_query` with the
//! query echoed back one word per frame, then the end marker.
//!
//! ```text
//! cargo run --example mock_upstream
//! cargo run --bin stream-relay
//! cargo run --bin stream-cli -- "what is the core tech stack?"
//! ```

use std::convert::Infallible;
use std::net::SocketAddr;
use std::time::Duration;

use axum::{
    body::Body,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use futures_util::{stream, StreamExt};
use serde::Deserialize;

#[derive(Deserialize)]
struct QueryModel {
    query: String,
}

async fn stream_query(Json(data): Json<QueryModel>) -> Response {
    let mut frames: Vec<String> = format!("You asked: {}", data.query)
        .split(' ')
        .map(|word| format!("data: {word} \n\n"))
        .collect();
    frames.push("data: [END]\n\n".to_string());

    let body = stream::iter(frames).then(|frame| async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        Ok::<_, Infallible>(frame)
    });

    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/event-stream")],
        Body::from_stream(body),
    )
        .into_response()
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();

    let app = Router::new().route("/api/stream_query", post(stream_query));

    let addr = SocketAddr::from(([127, 0, 0, 1], 8000));
    tracing::info!(address = %addr, "Mock upstream listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
