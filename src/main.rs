use std::{
    env,
    error::Error,
    fs::read_to_string,
    io::{self, Read},
    path::PathBuf,
};

use anyhow::{bail, Context};
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use log::info;
use url::Url;

mod api;
mod config;
mod gql_queries;
mod utils;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[arg(short, long)]
    verbose: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Save a page to the reading list
    Save {
        url: String,
        /// Title for the library entry; defaults to the URL
        #[arg(short, long)]
        title: Option<String>,
        /// Read the page content from a file instead of stdin
        #[arg(short, long)]
        content_file: Option<PathBuf>,
        /// Idempotency key for the save; generated when omitted
        #[arg(long)]
        request_id: Option<String>,
    },
    /// Attach a note to a saved item
    Note { item_id: String, note: String },
    /// Archive a saved item
    Archive {
        item_id: String,
        /// Move the item back to the inbox instead
        #[arg(long)]
        undo: bool,
    },
    /// Generate shell completions
    Completions {
        shell: Shell,
    },
}

fn setup_logging(verbose: bool) {
    let mut log_builder = env_logger::builder();
    if verbose {
        log_builder.filter(None, log::LevelFilter::Debug);
    } else {
        // Only set default of info if not configured via env already
        if env::var("RUST_LOG").is_err() {
            log_builder.filter(None, log::LevelFilter::Info);
        }
        log_builder.format_timestamp(None);
    }
    log_builder.init();
}

fn require_success<T>(outcome: api::ApiResult<T>, action: &str) -> anyhow::Result<T> {
    match outcome {
        api::ApiResult::Success(value) => Ok(value),
        api::ApiResult::Unauthorized => bail!(
            "Not authorized to {action}. Set or refresh api_token in your config file."
        ),
        api::ApiResult::Failure => {
            bail!("Failed to {action}. Re-run with --verbose for request details.")
        }
    }
}

fn read_content(content_file: &Option<PathBuf>) -> anyhow::Result<String> {
    match content_file {
        Some(path) => read_to_string(path)
            .with_context(|| format!("Failed to read content from {}", path.display())),
        None => {
            let mut content = String::new();
            io::stdin().read_to_string(&mut content)?;
            Ok(content)
        }
    }
}

fn save_page(
    client: &api::ApiClient,
    url: &str,
    title: &Option<String>,
    content_file: &Option<PathBuf>,
    request_id: &Option<String>,
) -> anyhow::Result<()> {
    let page_url = Url::parse(url).with_context(|| format!("'{url}' is not a valid URL"))?;
    let content = read_content(content_file)?;
    let title = title.clone().unwrap_or_else(|| page_url.to_string());
    let request_id = request_id.clone().unwrap_or_else(utils::new_request_id);
    let outcome = client.save_page(&api::SavePage {
        url: page_url.as_str(),
        title: &title,
        client_request_id: &request_id,
        original_content: &content,
    });
    let item_id = require_success(outcome, "save the page")?;
    info!("Saved '{title}'");
    println!("{item_id}");
    Ok(())
}

fn add_note(client: &api::ApiClient, item_id: &str, note: &str) -> anyhow::Result<()> {
    let outcome = client.add_note(item_id, note);
    let highlight_id = require_success(outcome, "add the note")?;
    info!("Note stored on highlight {highlight_id}");
    Ok(())
}

fn archive(client: &api::ApiClient, item_id: &str, undo: bool) -> anyhow::Result<()> {
    let outcome = client.set_archived(item_id, !undo);
    let action = if undo { "unarchive the item" } else { "archive the item" };
    require_success(outcome, action)?;
    info!("{} {item_id}", if undo { "Unarchived" } else { "Archived" });
    Ok(())
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    setup_logging(cli.verbose);

    if let Commands::Completions { shell } = &cli.command {
        let mut command = Cli::command();
        clap_complete::generate(*shell, &mut command, "stash", &mut io::stdout());
        return Ok(());
    }

    let config = config::get_config()?;
    let client = api::create_api_client(&config)?;
    match &cli.command {
        Commands::Save {
            url,
            title,
            content_file,
            request_id,
        } => save_page(&client, url, title, content_file, request_id)?,
        Commands::Note { item_id, note } => add_note(&client, item_id, note)?,
        Commands::Archive { item_id, undo } => archive(&client, item_id, *undo)?,
        Commands::Completions { .. } => unreachable!("handled above"),
    };

    Ok(())
}
