//! `localevents` command-line client

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use localevents::{
    Config, EventCard, FileSessionStorage, IntakeField, LocalEvents, SessionState, SubmitError,
};
use localevents_core::model::{EventId, UserId};
use localevents_http::HttpEventStore;
use localevents_runtime::StoreConfig;
use std::process::ExitCode;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "localevents")]
#[command(about = "Browse, join, and organize local events")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List users; the active one is marked with `*`
    Users,
    /// Act as another user
    Use {
        /// Id from `localevents users`
        user_id: i64,
    },
    /// Register a new user
    Register {
        /// Display name
        name: String,
    },
    /// List events with the actions available to the active user
    Events,
    /// Join an event as the active user
    Join {
        /// Event id
        event_id: i64,
    },
    /// Quit an event as the active user
    Quit {
        /// Event id
        event_id: i64,
    },
    /// Cancel an event (admin only)
    Cancel {
        /// Event id
        event_id: i64,
    },
    /// Create an event (admin only)
    Create {
        /// Title
        #[arg(long, default_value = "")]
        title: String,

        /// Start date and time (e.g., "2024-10-30T10:00")
        #[arg(long, default_value = "")]
        at: String,

        /// Free-form duration
        #[arg(long, default_value = "1 day")]
        duration: String,

        /// Free-form location
        #[arg(long, default_value = "")]
        location: String,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    // A missing .env file is fine
    let _ = dotenvy::dotenv();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "localevents=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    match run(Cli::parse()).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            eprintln!("Error: {error:#}");
            ExitCode::FAILURE
        },
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = Config::from_env();
    tracing::debug!(
        store_url = %config.store_url,
        session_dir = %config.session_dir.display(),
        "Configuration loaded"
    );

    let store = HttpEventStore::with_timeout(&config.store_url, config.request_timeout)
        .context("Invalid LOCALEVENTS_STORE_URL")?;
    let client = LocalEvents::with_config(
        Arc::new(store),
        Arc::new(FileSessionStorage::new(&config.session_dir)),
        StoreConfig::default().with_feedback_limit(config.feedback_limit),
    );

    match cli.command {
        Commands::Users => {
            client.load_roster().await?;
            print_users(&client.session().await);
        },
        Commands::Use { user_id } => {
            client.load_roster().await?;
            let user_id = UserId::new(user_id);
            client.set_active(user_id).await?;
            let session = client.session().await;
            if session.active_user().map(|u| u.id) != Some(user_id) {
                anyhow::bail!("No user with id {user_id}");
            }
            print_users(&session);
        },
        Commands::Register { name } => {
            let user = client.register_user(name).await?;
            println!("Registered {} (id {})", user.name, user.id);
        },
        Commands::Events => {
            client.load_roster().await?;
            print_cards(&client.refresh_cards().await?);
        },
        Commands::Join { event_id } => {
            client.load_roster().await?;
            let event = client.join(EventId::new(event_id)).await?;
            println!("Joined '{}'", event.title);
        },
        Commands::Quit { event_id } => {
            client.load_roster().await?;
            let event = client.quit(EventId::new(event_id)).await?;
            println!("Left '{}'", event.title);
        },
        Commands::Cancel { event_id } => {
            client.load_roster().await?;
            client.cancel(EventId::new(event_id)).await?;
            println!("Cancelled event {event_id}");
        },
        Commands::Create {
            title,
            at,
            duration,
            location,
        } => {
            client.load_roster().await?;
            let mut form = client.intake_form().await;
            form.set(IntakeField::Title, title);
            form.set(IntakeField::EventDt, at);
            form.set(IntakeField::Duration, duration);
            form.set(IntakeField::Location, location);

            match client.submit(&mut form).await {
                Ok(event) => println!("Created '{}' (id {})", event.title, event.id),
                Err(SubmitError::Invalid(errors)) => {
                    for (field, message) in errors.iter() {
                        eprintln!("  {field}: {message}");
                    }
                    anyhow::bail!("Event not created");
                },
                Err(SubmitError::Failed(error)) => return Err(error.into()),
            }
        },
    }

    Ok(())
}

fn print_users(session: &SessionState) {
    let active = session.active_user().map(|u| u.id);
    for user in session.roster() {
        let marker = if Some(user.id) == active { '*' } else { ' ' };
        println!("{marker} {:>4}  {}", user.id, user.name);
    }
}

fn print_cards(cards: &[EventCard]) {
    if cards.is_empty() {
        println!("No events");
        return;
    }
    for card in cards {
        println!("[{}] {}", card.id, card.title);
        println!("     {} | {} | {}", card.when, card.duration, card.location);
        println!("     Organizer: {}", card.organizer);
        if !card.joiners.is_empty() {
            println!("     Joiners: {}", card.joiners);
        }

        let actions: Vec<&str> = [
            (card.actions.join, "join"),
            (card.actions.quit, "quit"),
            (card.actions.cancel, "cancel"),
        ]
        .into_iter()
        .filter_map(|(allowed, name)| allowed.then_some(name))
        .collect();
        if !actions.is_empty() {
            println!("     Actions: {}", actions.join(", "));
        }
    }
}
