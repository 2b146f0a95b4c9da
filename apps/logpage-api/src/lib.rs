pub mod routes;
pub mod state;

use std::{net::SocketAddr, path::PathBuf, time::Duration};

use clap::{
	Parser,
	builder::{
		Styles,
		styling::{AnsiColor, Effects},
	},
};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

use crate::state::AppState;

#[derive(Debug, Parser)]
#[command(version, rename_all = "kebab", styles = styles())]
pub struct Args {
	#[arg(long, short = 'c', value_name = "FILE")]
	pub config: PathBuf,
}

pub async fn run(args: Args) -> color_eyre::Result<()> {
	let config = logpage_config::load(&args.config)?;

	init_tracing(&config);

	let http_addr: SocketAddr = config.service.http_bind.parse()?;
	let state = AppState::new(config)?;
	let shutdown = CancellationToken::new();
	let sweeper = logpage_service::spawn_sweeper(
		state.service.cache.clone(),
		state.service.page_ttl(),
		Duration::from_millis(state.service.cfg.cache.sweep_interval_ms),
		shutdown.clone(),
	);
	let app = routes::router(state);
	let listener = TcpListener::bind(http_addr).await?;

	tracing::info!(%http_addr, "HTTP server listening.");

	let signal = shutdown.clone();

	axum::serve(listener, app)
		.with_graceful_shutdown(async move {
			if tokio::signal::ctrl_c().await.is_err() {
				tracing::warn!("Failed to listen for the shutdown signal.");
			}

			signal.cancel();
		})
		.await?;

	shutdown.cancel();
	sweeper.await?;

	tracing::info!("HTTP server stopped.");

	Ok(())
}

fn init_tracing(config: &logpage_config::Config) {
	let filter =
		EnvFilter::try_new(&config.service.log_level).unwrap_or_else(|_| EnvFilter::new("info"));

	tracing_subscriber::fmt().with_env_filter(filter).init();
}

fn styles() -> Styles {
	Styles::styled()
		.header(AnsiColor::Yellow.on_default() | Effects::BOLD)
		.usage(AnsiColor::Yellow.on_default() | Effects::BOLD)
		.literal(AnsiColor::Cyan.on_default() | Effects::BOLD)
		.placeholder(AnsiColor::Green.on_default())
}
