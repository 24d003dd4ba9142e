use mathbot_server::{AppState, ServerConfig, serve};
use tokio::net::TcpListener;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let config = ServerConfig::from_env();
    let state = AppState::from_config(&config);

    let listener = match TcpListener::bind(config.listen()).await {
        Ok(listener) => listener,
        Err(err) => {
            eprintln!("failed to bind {}: {err}", config.listen());
            std::process::exit(1);
        }
    };
    if let Err(err) = serve(listener, state).await {
        eprintln!("server error: {err}");
        std::process::exit(1);
    }
}
