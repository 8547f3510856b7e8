use clap::Parser;
use monras_etl::cli::{args::Args, commands};
use std::process;

fn main() {
    let args = Args::parse();

    // Without a subcommand the binary runs the import against the default
    // configuration location, which is the tool's whole contract.
    match commands::run(args) {
        Ok(()) => process::exit(0),
        Err(error) => {
            eprintln!("Error: {}", error);
            process::exit(1);
        }
    }
}
