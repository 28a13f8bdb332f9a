use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "drivekit")]
#[command(about = "Check automation session capabilities without a device")]
#[command(version)]
pub struct Cli {
	/// Increase verbosity (-v info, -vv debug, -vvv debug everywhere)
	#[arg(short, long, global = true, action = clap::ArgAction::Count)]
	pub verbose: u8,

	/// Driver config file (JSON); base constraints are used when omitted
	#[arg(short, long, global = true)]
	pub config: Option<PathBuf>,

	#[command(subcommand)]
	pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
	/// Run a create-session request and print the resulting session
	Session {
		/// Request body file: a create-session body or flat capabilities ("-" for stdin)
		request: PathBuf,
	},
	/// Print the effective capability constraint table
	Constraints,
}
