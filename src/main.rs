mod commands;
mod context;
mod handler;
mod logging;
mod request;
mod response;

use std::io;
use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use lectern_core::{LecternConfig, LecternResult};
use tokio::io::AsyncWrite;

use crate::context::Context;
use crate::response::{Response, Status};

const NOT_CONFIGURED: &str = "Sorry, this server is not properly configured.";

#[derive(Parser)]
#[command(name = "lectern")]
#[command(about = "Intake handler for live lecture uploads, run once per connection")]
struct Cli {
    /// Config file (defaults to ~/.config/lectern/config.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Handle the connection on stdin/stdout (the default)
    Handle,
    /// Print the currently announced events as JSON
    List,
    /// Add a talk to an event's announcement
    AddTalk {
        /// Event id, e.g. 2024-06-01-rust-meetup
        event: String,

        /// Talk title
        title: String,

        /// Speakers, as shown to viewers
        #[arg(short, long)]
        speakers: Option<String>,
    },
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let command = cli.command.unwrap_or(Commands::Handle);

    let config = match load_config(cli.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{}", e);
            if let Commands::Handle = command {
                write_not_configured(&mut tokio::io::stdout()).await?;
                return Ok(());
            }
            return Err(e.into());
        }
    };

    if let Err(e) = logging::init(&config.log) {
        logging::init_stderr();
        tracing::warn!("Could not open log file {}: {}", config.log.display(), e);
    }

    let ctx = Context::new(&config);

    match command {
        Commands::Handle => commands::handle::run(&ctx).await,
        Commands::List => commands::list::run(&ctx),
        Commands::AddTalk {
            event,
            title,
            speakers,
        } => commands::add_talk::run(&ctx, &event, &title, speakers.as_deref()),
    }
}

/// Answer the client before anything is read from the connection.
async fn write_not_configured<W>(output: &mut W) -> io::Result<()>
where
    W: AsyncWrite + Unpin + ?Sized,
{
    Response::text(Status::InternalServerError, NOT_CONFIGURED)
        .write_to(output)
        .await
}

fn load_config(path: Option<PathBuf>) -> LecternResult<LecternConfig> {
    let path = match path {
        Some(path) => path,
        None => LecternConfig::default_path()?,
    };
    LecternConfig::load(&path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_not_configured_response() {
        let mut output = Vec::new();
        write_not_configured(&mut output).await.unwrap();

        let response = String::from_utf8(output).unwrap();
        assert!(response.starts_with("HTTP/1.0 500 Internal Server Error\r\n"));
        assert!(response.ends_with(&format!("\r\n\r\n{NOT_CONFIGURED}")));
    }

    #[test]
    fn test_missing_config_file_is_error() {
        let tmp = tempfile::tempdir().unwrap();
        assert!(load_config(Some(tmp.path().join("config.toml"))).is_err());
    }
}
