use clap::Parser;

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
	color_eyre::install()?;

	let args = crag_api::Args::parse();

	crag_api::run(args).await
}
