//! Sends one test alert through every backend configured in the environment.
//! Usage: `cargo run --bin notify_demo -- "Headline text" https://link`

use pulse_news::{AlertPayload, NotifierMux};

#[tokio::main]
async fn main() {
    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt().with_target(false).init();

    let mut args = std::env::args().skip(1);
    let title = args.next().unwrap_or_else(|| "Pulse test alert".to_string());
    let link = args.next().unwrap_or_default();

    let mux = NotifierMux::from_env();
    let sent = mux.notify(&AlertPayload::new(title, link)).await;

    println!("notify-demo done ({sent} backend(s) accepted the alert)");
}
