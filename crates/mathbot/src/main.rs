//! A terminal chat with MathBot through a relay endpoint.

#[macro_use]
extern crate tracing;

use mathbot::HttpRelayTransport;
use tokio::io::{self, BufReader};

#[tokio::main(flavor = "current_thread")]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let transport = HttpRelayTransport::from_env();
    debug!("using relay at {}", transport.url());

    // One reader for the whole session, so piped lines are never lost.
    mathbot::cli::run(transport, BufReader::new(io::stdin())).await;
}
