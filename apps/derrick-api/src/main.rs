use clap::Parser;

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
	color_eyre::install()?;
	let args = derrick_api::Args::parse();
	derrick_api::run(args).await
}
