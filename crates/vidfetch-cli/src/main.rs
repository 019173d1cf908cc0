//! CLI entry point.

use clap::{CommandFactory, Parser};
use tracing_subscriber::EnvFilter;

use vidfetch_cli::{Cli, Commands, bootstrap, handlers};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables before anything reads them
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    // Logs go to stderr; stdout belongs to progress bars and tables
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(cli.log_level()));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let Some(command) = cli.command else {
        Cli::command().print_help()?;
        return Ok(());
    };

    let ctx = bootstrap().await?;

    match command {
        Commands::Get {
            urls,
            file,
            concurrency,
            out,
            quality,
            format,
            audio_only,
            subs,
            thumbnail,
            no_history,
        } => {
            let args = handlers::get::GetArgs {
                urls,
                file,
                concurrency,
                out,
                quality,
                format,
                audio_only,
                subs,
                thumbnail,
                no_history,
            };
            handlers::get::execute(&ctx, args).await?;
        }
        Commands::History { limit, search } => {
            handlers::history::execute(&ctx, limit, search.as_deref()).await?;
        }
        Commands::Config { command } => {
            handlers::config::execute(&ctx, command)?;
        }
    }

    Ok(())
}
