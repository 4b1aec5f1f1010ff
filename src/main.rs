use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use folio::config::Config;
use folio::{server, ArticleStore};
use std::io::Write;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Reads a directory of markdown articles and serves their metadata.
#[derive(Parser)]
#[command(name = "folio", version, about)]
struct Cli {
    /// Project file to load instead of searching for `folio.yaml`.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Article directory, overriding the project file.
    #[arg(long, global = true)]
    articles: Option<PathBuf>,

    /// Log debug output.
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    verbose: bool,

    /// Only log warnings and errors.
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print the article listing as JSON, newest first.
    List {
        /// Only list articles with this tag.
        #[arg(long)]
        tag: Option<String>,

        /// Only list articles matching every search term.
        #[arg(long)]
        search: Option<String>,
    },

    /// Print one article as JSON.
    Show {
        id: String,

        /// Print the rendered HTML body instead.
        #[arg(long)]
        html: bool,
    },

    /// Print every article id.
    Ids,

    /// Serve the listing and articles over HTTP.
    Serve {
        /// Address to bind, overriding the project file.
        #[arg(long)]
        listen: Option<String>,
    },
}

fn init_logging(verbose: bool, quiet: bool) {
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else if quiet {
        EnvFilter::new("warn")
    } else if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn load_config(cli: &Cli) -> Result<Config> {
    let mut config = match &cli.config {
        Some(path) => Config::from_project_file(path)?,
        None => Config::from_directory(&std::env::current_dir()?)?,
    };
    if let Some(articles) = &cli.articles {
        config.articles_directory = articles.clone();
    }
    Ok(config)
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    let mut stdout = std::io::stdout().lock();
    serde_json::to_writer_pretty(&mut stdout, value)?;
    writeln!(stdout)?;
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.quiet);

    let config = load_config(&cli)?;
    let store = ArticleStore::open(&config.articles_directory).with_context(|| {
        format!(
            "Opening article directory `{}`",
            config.articles_directory.display()
        )
    })?;

    match cli.command {
        Command::List { tag, search } => {
            let summaries = store.list_filtered(tag.as_deref(), search.as_deref())?;
            print_json(&summaries)
        }
        Command::Show { id, html } => {
            let detail = store.get_article(&id)?;
            if html {
                println!("{}", detail.to_html());
                Ok(())
            } else {
                print_json(&detail)
            }
        }
        Command::Ids => {
            for id in store.article_ids()? {
                println!("{}", id);
            }
            Ok(())
        }
        Command::Serve { listen } => {
            let addr = listen.unwrap_or(config.listen);
            server::serve(&store, &addr)
        }
    }
}
