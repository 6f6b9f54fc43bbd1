use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::{error, info, warn};

use bookmark_store::backend::Backend;
use bookmark_store::logging::init_logging;
use bookmark_store::models::{Key, NewUser};
use bookmark_store::password::hasher_from_config;
use bookmark_store::{
    create_connection, AppConfig, AppResult, BookmarkBackend, BookmarkPatch, DriverConnection,
    NewBookmark, Page, SessionStore,
};

#[derive(Parser, Debug)]
#[command(name = "bookmark-store")]
#[command(about = "Bookmark persistence over SQLite, libsql, MySQL or PostgreSQL")]
struct Args {
    /// YAML configuration file, layered under the environment
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create the tables on the selected backend
    InitSchema,
    /// Store a new bookmark
    Add {
        url: String,
        #[arg(long = "tag")]
        tags: Vec<String>,
        #[arg(long)]
        collection: Option<String>,
        #[arg(long)]
        user_id: Option<String>,
    },
    /// Print stored bookmarks as JSON
    List {
        #[arg(long, requires = "offset")]
        limit: Option<u32>,
        #[arg(long, requires = "limit")]
        offset: Option<u32>,
    },
    /// Change fields of an existing bookmark
    Update {
        id: String,
        #[arg(long)]
        url: Option<String>,
        #[arg(long = "tag")]
        tags: Vec<String>,
        #[arg(long)]
        collection: Option<String>,
    },
    /// Remove a bookmark
    Delete { id: String },
    /// Create a user with a username/password key
    CreateUser {
        #[arg(long, default_value = "admin")]
        username: String,
        #[arg(long)]
        password: String,
    },
    /// Hold the connection open until Ctrl-C or SIGTERM
    Run,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    let args = Args::parse();

    let config = AppConfig::load(args.config.as_deref())?;
    init_logging(&config.log_level);
    info!(
        max_title_length = config.max_bookmark_title_length(),
        max_desc_length = config.max_bookmark_desc_length(),
        "Bookmark length limits loaded"
    );

    let connection = create_connection(&config).await?;
    let result = execute(args.command, &config, &connection).await;

    if let Err(e) = connection.close().await {
        warn!(error = %e, "Failed to close database connection");
    }
    if let Err(e) = &result {
        error!(error = %e, "Command failed");
    }
    result.map_err(Into::into)
}

async fn execute(
    command: Command,
    config: &AppConfig,
    connection: &DriverConnection,
) -> AppResult<()> {
    let backend = &connection.backend;

    match command {
        Command::InitSchema => {
            backend.init_schema().await?;
            info!(driver = %connection.database_type(), "Schema initialized");
        }
        Command::Add {
            url,
            tags,
            collection,
            user_id,
        } => {
            let mut data = NewBookmark::new(url);
            if !tags.is_empty() {
                data = data.with_tags(tags);
            }
            data.collection = collection;
            data.user_id = user_id;

            let inserted = backend.create_bookmark(&data).await?;
            println!("{}", inserted.id);
        }
        Command::List { limit, offset } => {
            let page = limit.zip(offset).map(|(limit, offset)| Page { limit, offset });
            let bookmarks = backend.get_bookmarks(page).await?;
            println!("{}", serde_json::to_string_pretty(&bookmarks)?);
        }
        Command::Update {
            id,
            url,
            tags,
            collection,
        } => {
            let patch = BookmarkPatch {
                url,
                tags: (!tags.is_empty()).then(|| Some(tags)),
                collection: collection.map(Some),
                user_id: None,
            };
            let result = backend.update_bookmark(&id, &patch).await?;
            println!("{}", result.rows_affected);
        }
        Command::Delete { id } => {
            let result = backend.delete_bookmark(&id).await?;
            println!("{}", result.rows_affected);
        }
        Command::CreateUser { username, password } => {
            let hasher = hasher_from_config(&config.hashing_config()?)?;
            let key = Key::new("username", &username, "")
                .with_hashed_password(hasher.hash_password(&password)?);

            let user_id = connection
                .session_store
                .set_user(&NewUser::default(), Some(&key))
                .await?;
            info!(user_id = %user_id, key = %key.id, "User created");
            println!("{}", user_id);
        }
        Command::Run => {
            info!(driver = %connection.database_type(), "Bookmark store ready");
            shutdown_signal().await;
        }
    }

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C signal"),
        _ = terminate => info!("Received terminate signal"),
    }
}
