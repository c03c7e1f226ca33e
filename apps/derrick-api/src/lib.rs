pub mod routes;
pub mod state;

use std::{net::SocketAddr, path::PathBuf, time::Duration};

use clap::Parser;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

use crate::state::AppState;

#[derive(Debug, Parser)]
#[command(
	version = derrick_cli::VERSION,
	rename_all = "kebab",
	styles = derrick_cli::styles(),
)]
pub struct Args {
	#[arg(long, short = 'c', value_name = "FILE")]
	pub config: PathBuf,
}

pub async fn run(args: Args) -> color_eyre::Result<()> {
	let config = derrick_config::load(&args.config)?;
	init_tracing(&config)?;

	let http_addr: SocketAddr = config.service.http_bind.parse()?;
	let sweep_interval = Duration::from_secs(config.session.sweep_interval_seconds.max(1));
	let state = AppState::new(config).await?;

	spawn_session_sweeper(state.clone(), sweep_interval);

	let app = routes::router(state);
	let listener = TcpListener::bind(http_addr).await?;

	tracing::info!(%http_addr, "HTTP server listening.");

	axum::serve(listener, app).await?;

	Ok(())
}

fn spawn_session_sweeper(state: AppState, interval: Duration) {
	tokio::spawn(async move {
		let mut ticker = tokio::time::interval(interval);

		loop {
			ticker.tick().await;

			let evicted = state.service.sessions.sweep().await;

			if evicted > 0 {
				tracing::info!(evicted, "Evicted idle sessions.");
			}
		}
	});
}

fn init_tracing(config: &derrick_config::Config) -> color_eyre::Result<()> {
	let filter =
		EnvFilter::try_new(&config.service.log_level).unwrap_or_else(|_| EnvFilter::new("info"));
	tracing_subscriber::fmt().with_env_filter(filter).init();
	Ok(())
}
