//! Module for running the HTTP service.

use super::*;

/// Options for [`Commands::Serve`].
#[derive(Args, Clone)]
pub struct ServeOptions {
  /// Address to listen on, overriding `server.bind` from the configuration
  #[arg(long, short)]
  pub bind: Option<String>,

  /// Directory for daily-rolling log files, in addition to stdout
  #[arg(long)]
  pub log_dir: Option<PathBuf>,
}

/// Function for the [`Commands::Serve`] in the CLI.
///
/// Runs until interrupted with Ctrl-C, then stops accepting connections and lets in-flight
/// requests finish.
pub async fn serve(config: Config, options: ServeOptions) -> Result<()> {
  let bind = options.bind.unwrap_or_else(|| config.server.bind.clone());
  let addr: SocketAddr = bind.parse()?;

  let state = server::AppState::from_config(&config)?;
  let available: Vec<_> = state
    .waterfall
    .providers()
    .iter()
    .filter(|provider| provider.is_available())
    .map(|provider| provider.kind().to_string())
    .collect();
  if available.is_empty() {
    warn!("No image provider is available, every search will come back empty");
  }

  let listener = tokio::net::TcpListener::bind(addr).await?;
  info!("Listening on http://{addr} with providers [{}]", available.join(", "));
  println!("{} Listening on http://{}", style(SUCCESS_PREFIX).green(), addr);

  axum::serve(listener, server::router(Arc::new(state)))
    .with_graceful_shutdown(shutdown_signal())
    .await?;

  println!("{} Server stopped", style(INFO_PREFIX).cyan());
  Ok(())
}

/// Resolves when the process receives Ctrl-C.
async fn shutdown_signal() {
  if let Err(e) = tokio::signal::ctrl_c().await {
    warn!("Failed to listen for Ctrl-C, shutting down: {e}");
    return;
  }
  info!("Shutdown requested");
}
