//! `blush`: command line front end for the Blush Hour client core.

mod commands;
mod output;

use std::sync::Arc;

use tracing::info;

use blush_api::ApiClient;
use blush_client::{ClientConfig, Context};
use blush_store::Store;

pub struct App {
    pub api: ApiClient,
    pub ctx: Context,
    pub events: tokio::sync::mpsc::UnboundedReceiver<blush_types::events::ClientEvent>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = ClientConfig::from_env();

    // Logs go to stderr so command output stays clean
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "blush=debug".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = std::env::args().collect();
    if args.len() < 2 {
        print_usage();
        return Ok(());
    }

    let store = Arc::new(Store::open(&config.db_path)?);
    let (ctx, events) = Context::new(store);
    let api = ApiClient::new(config.api_url.clone());
    info!("Using backend {}", api.base_url());

    let mut app = App { api, ctx, events };
    let result = dispatch(&mut app, &args[1], &args[2..]).await;
    output::flush_events(&mut app.events);
    result
}

async fn dispatch(app: &mut App, command: &str, rest: &[String]) -> anyhow::Result<()> {
    match command {
        "register" => {
            let [phone, password] = need::<2>(rest, "blush register <phone> <password>")?;
            commands::register(app, phone, password).await?;
        }
        "login" => {
            let [phone, password] = need::<2>(rest, "blush login <phone> <password>")?;
            commands::login(app, phone, password).await?;
        }
        "logout" => commands::logout(app).await,
        "me" => commands::me(app).await?,
        "discovery" => commands::discovery(app).await?,
        "threads" | "matches" => commands::threads(app).await?,
        "chat" => {
            let [thread_id] = need::<1>(rest, "blush chat <thread_id> [--watch]")?;
            let watch = rest.iter().any(|a| a == "--watch");
            commands::chat(app, thread_id, watch).await?;
        }
        "send" => {
            if rest.len() < 2 {
                anyhow::bail!("Usage: blush send <thread_id> <message>");
            }
            commands::send(app, &rest[0], &rest[1..].join(" ")).await?;
        }
        "chat-night" => {
            let enter = rest.first().is_some_and(|a| a == "enter");
            let engage = rest.iter().any(|a| a == "--engage");
            commands::chat_night(app, enter, engage).await?;
        }
        "admin" => commands::admin(app, rest).await?,
        _ => {
            eprintln!("Unknown command: {}", command);
            print_usage();
        }
    }

    Ok(())
}

fn need<'a, const N: usize>(args: &'a [String], usage: &str) -> anyhow::Result<[&'a str; N]> {
    if args.len() < N {
        anyhow::bail!("Usage: {}", usage);
    }
    Ok(std::array::from_fn(|i| args[i].as_str()))
}

fn print_usage() {
    println!("Blush Hour CLI");
    println!();
    println!("Usage: blush <command> [args]");
    println!();
    println!("Commands:");
    println!("  register <phone> <password>      Create an account");
    println!("  login <phone> <password>         Sign in and remember the session");
    println!("  logout                           Forget the stored session");
    println!("  me                               Show your profile");
    println!("  discovery                        Show a batch of profiles");
    println!("  threads                          List conversations");
    println!("  chat <thread_id> [--watch]       Show a conversation");
    println!("  send <thread_id> <message>       Send a message");
    println!("  chat-night [enter] [--engage]    Chat Night status, or join the pool");
    println!("  admin <subcommand>               Admin console (see `blush admin`)");
    println!();
    println!("Environment: BLUSH_API_URL, BLUSH_DB_PATH, RUST_LOG");
}
