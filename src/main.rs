use std::process;

use clap::Parser;
use colored::Colorize;

use release_check::app;
use release_check::cli::Args;

fn main() {
    dotenvy::dotenv().ok();

    let args = Args::parse();

    if let Err(err) = app::run(args) {
        eprintln!("{} {}", "x".red(), err);
        process::exit(1);
    }
}
