use std::error::Error;
use std::fs::File;

use clap::{Parser, Subcommand};
use log::{info, warn};
use serde_json::Value;
use simplelog::{ConfigBuilder, LevelFilter, WriteLogger};

use trailguide::api::{ApiClient, ApiError};
use trailguide::core::auth::AuthService;
use trailguide::core::config::{self, CliOverrides};
use trailguide::core::session::SessionStore;
use trailguide::core::{RequestError, RequestExecutor};
use trailguide::storage::{BackendKind, Storage};

#[derive(Parser)]
#[command(name = "trailguide", about = "Session and API client for the Trailguide backend")]
struct Args {
    /// Where session data is kept
    #[arg(long, value_enum)]
    storage: Option<BackendKind>,

    /// Backend API base URL
    #[arg(long)]
    api_url: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Sign in and store the session
    Login {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
    },
    /// Forget the stored session
    Logout,
    /// Show the signed-in traveler
    Whoami,
    /// Exchange the refresh token for a new access token
    Refresh,
    /// GET an API path and print the payload
    Get { path: String },
    /// Inspect or edit the local key-value store
    Store {
        #[command(subcommand)]
        action: StoreCommand,
    },
}

#[derive(Subcommand)]
enum StoreCommand {
    Get { key: String },
    /// Value is stored as JSON if it parses, otherwise as a string
    Set { key: String, value: String },
    Remove { key: String },
    Clear,
}

type CliResult = Result<(), Box<dyn Error>>;

#[tokio::main]
async fn main() -> CliResult {
    let args = Args::parse();
    dotenv::dotenv().ok();

    // Initialize file logger - writes to trailguide.log in current directory
    let log_config = ConfigBuilder::new()
        .set_time_format_rfc3339()
        .build();

    if let Ok(log_file) = File::create("trailguide.log") {
        let _ = WriteLogger::init(LevelFilter::Debug, log_config, log_file);
    }

    let file_config = config::load_config().unwrap_or_else(|e| {
        warn!("Ignoring config file: {}", e);
        eprintln!("warning: {e}; using defaults");
        Default::default()
    });
    let resolved = config::resolve(
        &file_config,
        &CliOverrides {
            api_url: args.api_url.as_deref(),
            storage: args.storage,
        },
    );
    info!("Trailguide starting up: {:?}", resolved);

    let storage = Storage::open(resolved.storage_backend, resolved.storage_dir.as_deref());
    let session = SessionStore::new(storage);
    let client = ApiClient::new(&resolved.api_base_url, resolved.request_timeout)?
        .with_session(session.clone());

    run(args.command, client, session).await
}

async fn run(command: Command, client: ApiClient, session: SessionStore) -> CliResult {
    let auth = AuthService::new(client.clone(), session.clone());

    match command {
        Command::Login { email, password } => match auth.login(&email, &password).await {
            Some(tokens) => {
                let name = tokens.user.as_ref().map_or(email.as_str(), |u| u.name.as_str());
                println!("Signed in as {name}");
                Ok(())
            }
            None => failed(auth.login_requests().error()),
        },
        Command::Logout => {
            if auth.logout().await {
                println!("Signed out");
            } else {
                eprintln!("Signed out, but some session data could not be removed");
            }
            Ok(())
        }
        Command::Whoami => {
            let signed_in = session.is_authenticated().await;
            match auth.current_user().await {
                Some(user) => println!("{}", serde_json::to_string_pretty(&user)?),
                None if signed_in => println!("Signed in (no profile stored)"),
                None => println!("Not signed in"),
            }
            Ok(())
        }
        Command::Refresh => {
            if session.get_refresh_token().await.is_none() {
                println!("No refresh token stored; sign in first");
                return Ok(());
            }
            match auth.refresh().await {
                Some(_) => {
                    println!("Access token refreshed");
                    Ok(())
                }
                None => failed(auth.refresh_requests().error()),
            }
        }
        Command::Get { path } => {
            let fetch = {
                let client = client.clone();
                RequestExecutor::new(move |path: String| {
                    let client = client.clone();
                    async move { client.get::<Value>(&path).await }
                })
            };

            let mut data = fetch.execute(path.clone()).await;
            // One retry after refreshing an expired access token.
            if data.is_none()
                && fetch.error().and_then(|e| e.status()) == Some(401)
                && auth.refresh().await.is_some()
            {
                info!("Retrying {} with refreshed token", path);
                data = fetch.execute(path).await;
            }

            match data {
                Some(value) => {
                    println!("{}", serde_json::to_string_pretty(&value)?);
                    Ok(())
                }
                None => failed(fetch.error()),
            }
        }
        Command::Store { action } => run_store(action, session.storage()).await,
    }
}

async fn run_store(action: StoreCommand, storage: &Storage) -> CliResult {
    let ok = match action {
        StoreCommand::Get { key } => {
            match storage.get_item::<Value>(&key).await {
                Some(value) => println!("{}", serde_json::to_string_pretty(&value)?),
                None => println!("(not set)"),
            }
            true
        }
        StoreCommand::Set { key, value } => {
            let value = serde_json::from_str::<Value>(&value).unwrap_or(Value::String(value));
            storage.set_item(&key, &value).await
        }
        StoreCommand::Remove { key } => storage.remove_item(&key).await,
        StoreCommand::Clear => storage.clear().await,
    };

    if ok {
        Ok(())
    } else {
        Err(format!("{} storage operation failed (see trailguide.log)", storage.backend_name()).into())
    }
}

fn failed(error: Option<RequestError<ApiError>>) -> CliResult {
    match error {
        Some(RequestError::Status(info)) => {
            if let Some(fields) = &info.errors {
                for (field, messages) in fields {
                    eprintln!("  {field}: {}", messages.join(", "));
                }
            }
            Err(info.to_string().into())
        }
        Some(err) => Err(Box::new(err)),
        None => Err("request failed".into()),
    }
}
