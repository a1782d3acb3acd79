//! bookstruct CLI: structural analysis of unpacked e-book packages.
//!
//! Infers sections, content types, images and the table of contents of a
//! package directory and prints them as text or JSON.

mod commands;
mod render;

use clap::Parser;
use color_eyre::eyre::Result;

use commands::Cli;

fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();
    commands::init_tracing(&cli);
    commands::run(cli)
}
