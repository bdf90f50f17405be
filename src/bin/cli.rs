// src/bin/cli.rs
use clap::Parser;
use tabscrape::{
    cli::{self, Args},
    log::{self, LogTarget},
};

fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;
    log::init(LogTarget::Stderr)?;
    cli::run(Args::parse())
}
