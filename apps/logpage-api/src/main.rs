use clap::Parser;

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
	color_eyre::install()?;

	let args = logpage_api::Args::parse();

	logpage_api::run(args).await
}
