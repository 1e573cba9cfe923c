use kadoa_sdk::{KadoaClient, RealtimeOptions, StreamMode};
use std::time::Duration;

/// Stream Kadoa realtime events to the terminal for a while
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load environment variables
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "kadoa_sdk=debug".into()),
        )
        .init();

    let api_key = std::env::var("KADOA_API_KEY").map_err(|_| "KADOA_API_KEY must be set in .env")?;
    let stream_mode = match std::env::var("KADOA_STREAM_MODE").as_deref() {
        Ok("stream") => StreamMode::Stream,
        _ => StreamMode::Default,
    };
    let run_for = std::env::var("KADOA_DEMO_SECONDS")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(60);

    let client = KadoaClient::new(api_key)?;
    println!("Connecting to {:?}", client.endpoints());

    let realtime = client
        .connect_realtime(RealtimeOptions {
            stream_mode,
            ..Default::default()
        })
        .await?;

    let _events = realtime.on_event(|event| {
        println!("event: {}", event);
    });
    let _connection = realtime.on_connection(|connected, reason| match reason {
        Some(reason) => println!("connected={} ({})", connected, reason),
        None => println!("connected={}", connected),
    });
    let _errors = realtime.on_error(|error| {
        eprintln!("realtime error [{}]: {}", error.code(), error);
    });

    println!("Listening for {}s (connected: {})", run_for, client.is_realtime_connected());
    tokio::time::sleep(Duration::from_secs(run_for)).await;

    client.dispose();
    println!("Done");
    Ok(())
}
