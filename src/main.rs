//! book-admin - Book Inventory administration client
//!
//! Command-line front end for the book inventory REST API.

use anyhow::{anyhow, bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use book_inventory_admin::{
    config::LoggingConfig,
    models::{BookDraft, ImageUpload},
    services::navigation::{Navigator, Route},
    AppConfig, AppState,
};

/// Administer the book inventory catalog.
#[derive(Parser)]
#[command(name = "book-admin", version, about = "Book Inventory administration client")]
struct Cli {
    /// Log debug output to stderr.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct Login {
    #[arg(long, short, env = "BOOK_ADMIN_USERNAME")]
    username: String,

    #[arg(long, short, env = "BOOK_ADMIN_PASSWORD", hide_env_values = true)]
    password: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Sign in and store the session token.
    Login(Login),

    /// Create an account and sign in with it.
    Register(Login),

    /// Forget the stored session.
    Logout,

    /// Show the signed-in admin.
    Whoami,

    /// List books, optionally filtered by title or author.
    List {
        #[arg(long, short)]
        search: Option<String>,
    },

    /// Add a new book.
    Add {
        #[arg(long)]
        title: String,

        #[arg(long)]
        author: String,

        /// Release year.
        #[arg(long)]
        year: i32,

        #[arg(long)]
        genre: Option<String>,

        #[arg(long)]
        description: Option<String>,

        /// Cover image file.
        #[arg(long)]
        image: Option<PathBuf>,
    },

    /// Edit a book. Omitted fields keep their current value.
    Edit {
        id: i64,

        #[arg(long)]
        title: Option<String>,

        #[arg(long)]
        author: Option<String>,

        #[arg(long)]
        year: Option<i32>,

        #[arg(long)]
        genre: Option<String>,

        #[arg(long)]
        description: Option<String>,

        #[arg(long)]
        image: Option<PathBuf>,
    },

    /// Delete a book.
    Delete { id: i64 },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let config = AppConfig::load().context("Failed to load configuration")?;
    init_tracing(&config.logging, cli.verbose);

    tracing::debug!("book-admin v{} against {}", env!("CARGO_PKG_VERSION"), config.api.base_url);

    let state = AppState::new(config)?;
    state.services.session.initialize().await;

    let mut search = None;
    let outcome = run(&state, cli.command, &mut search).await;
    render_route(&state, search.as_deref()).await;
    outcome
}

fn init_tracing(logging: &LoggingConfig, verbose: bool) {
    let level = if verbose { "debug" } else { logging.level.as_str() };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| format!("book_inventory_admin={level},book_admin={level}").into());

    let registry = tracing_subscriber::registry().with(filter);
    if logging.format == "json" {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

async fn run(state: &AppState, command: Commands, search: &mut Option<String>) -> Result<()> {
    let services = &state.services;
    let session = &services.session;

    match command {
        Commands::Login(Login { username, password }) => {
            // Replaces any restored session once the server accepts
            session.login(&username, &password).await;
            if let Some(error) = session.snapshot().error {
                bail!(error);
            }
        }
        Commands::Register(Login { username, password }) => {
            session.register(&username, &password).await;
            if let Some(error) = session.snapshot().error {
                bail!(error);
            }
        }
        Commands::Logout => {
            session.logout();
            println!("Signed out.");
        }
        Commands::Whoami => {
            let user = require_user(state)?;
            println!("{} (id {})", user.username, user.id);
        }
        Commands::List { search: term } => {
            require_user(state)?;
            *search = term;
            services.navigation.navigate(Route::Books);
        }
        Commands::Add {
            title,
            author,
            year,
            genre,
            description,
            image,
        } => {
            require_user(state)?;
            let draft = BookDraft {
                title,
                author,
                genre,
                release_year: Some(year),
                description,
                image: load_image(image).await?,
            };
            let record = services.books.create(draft).await?;
            println!("Added #{}: {}", record.id, record.title);
            services.navigation.navigate(Route::Books);
        }
        Commands::Edit {
            id,
            title,
            author,
            year,
            genre,
            description,
            image,
        } => {
            require_user(state)?;
            services.books.fetch_all().await?;
            let current = services
                .books
                .state()
                .books
                .get(id)
                .cloned()
                .ok_or_else(|| anyhow!("No book with id {}", id))?;

            let mut draft = BookDraft::from_record(&current);
            if let Some(title) = title {
                draft.title = title;
            }
            if let Some(author) = author {
                draft.author = author;
            }
            if year.is_some() {
                draft.release_year = year;
            }
            if genre.is_some() {
                draft.genre = genre;
            }
            if description.is_some() {
                draft.description = description;
            }
            draft.image = load_image(image).await?;

            services.books.update(id, draft).await?;
            if let Some(notice) = services.books.state().notice {
                println!("{}", notice);
                services.books.clear_notice();
            }
            services.navigation.navigate(Route::Books);
        }
        Commands::Delete { id } => {
            require_user(state)?;
            services.books.fetch_all().await?;
            services.books.delete(id).await?;
            println!("Deleted #{}.", id);
            services.navigation.navigate(Route::Books);
        }
    }

    Ok(())
}

/// Book commands are only available with a validated session
fn require_user(state: &AppState) -> Result<book_inventory_admin::models::UserProfile> {
    match state.services.session.snapshot().user {
        Some(user) => Ok(user),
        None => {
            state.services.navigation.navigate(Route::Login);
            bail!("Not signed in")
        }
    }
}

async fn load_image(path: Option<PathBuf>) -> Result<Option<ImageUpload>> {
    match path {
        Some(path) => {
            let image = ImageUpload::from_path(&path)
                .await
                .with_context(|| format!("Failed to read image {}", path.display()))?;
            Ok(Some(image))
        }
        None => Ok(None),
    }
}

/// Show whatever view the last command navigated to
async fn render_route(state: &AppState, search: Option<&str>) {
    match state.services.navigation.take() {
        Some(Route::Books) => render_books(state, search.unwrap_or_default()).await,
        Some(Route::Login) => {
            eprintln!("Sign in with: book-admin login --username <USER> --password <PASSWORD>");
        }
        None => {}
    }
}

async fn render_books(state: &AppState, search: &str) {
    let books = &state.services.books;
    if books.fetch_all().await.is_err() {
        if let Some(error) = books.state().error {
            eprintln!("{}", error);
        }
        return;
    }

    let shown = books.filter(search);
    if shown.is_empty() {
        if search.is_empty() {
            println!("No books available. Add a book to get started!");
        } else {
            println!("No books found matching your search.");
        }
        return;
    }

    let media_base = state.config.api.media_base_url.as_deref();
    for book in shown {
        let year = book.release_year.map(|y| format!(" ({})", y)).unwrap_or_default();
        let genre = book.genre.as_deref().map(|g| format!(" [{}]", g)).unwrap_or_default();
        println!(
            "#{:<5} {} by {}{}{}",
            book.id,
            book.title,
            book.author.as_deref().unwrap_or("Unknown Author"),
            year,
            genre
        );
        if let Some(url) = book.image_url(media_base) {
            println!("       cover: {}", url);
        }
    }
}
