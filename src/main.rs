mod book;
mod cli;
mod commands;
mod error;
mod logging;
mod mcp;
mod pdf;

use anyhow::Result;
use clap::Parser;
use cli::{Cli, Commands};

#[tokio::main]
async fn main() -> Result<()> {
    logging::setup_logging();
    let cli = Cli::parse();
    let options = cli.book_options();

    match cli.command {
        Commands::Mcp => {
            mcp::run_server().await?;
        }
        Commands::Sections { books } => {
            let backend = commands::backend(cli.backend);
            let books = commands::load_books(&books.specs(), backend.as_ref(), &options)?;
            commands::sections::run(&books)?;
        }
        Commands::Missing { books } => {
            let backend = commands::backend(cli.backend);
            let books = commands::load_books(&books.specs(), backend.as_ref(), &options)?;
            commands::missing::run(&books)?;
        }
        Commands::Explode { books, output_dir } => {
            let backend = commands::backend(cli.backend);
            let books = commands::load_books(&books.specs(), backend.as_ref(), &options)?;
            commands::explode::run(&books, &output_dir, backend.as_ref())?;
        }
    }

    Ok(())
}
