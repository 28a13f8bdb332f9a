use clap::Parser;

mod cli;
mod commands;
mod logging;

use cli::Cli;

#[tokio::main]
async fn main() {
	let cli = Cli::parse();
	logging::init_logging(cli.verbose);

	if let Err(err) = commands::dispatch(cli).await {
		match err.downcast_ref::<drivekit::Error>() {
			Some(driver_err) => eprintln!("error ({}): {driver_err}", driver_err.w3c_code()),
			None => eprintln!("error: {err:#}"),
		}
		std::process::exit(1);
	}
}
