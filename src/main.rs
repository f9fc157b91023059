use std::sync::Arc;

use hearth::{Config, Request, Response, Server};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_target(false)
        .with_level(true)
        .init();

    let cfg = Config::load()?;

    let handler = Arc::new(|req: Request| {
        Response::ok(format!("Hello from Hearth: {} {}\n", req.method, req.uri))
    });

    let mut server = Server::bind(cfg, handler).await?;
    let handle = server.handle();

    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Shutdown signal received");
            handle.stop();
        }
    });

    server.run().await?;
    Ok(())
}
