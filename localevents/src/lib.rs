//! # LocalEvents
//!
//! Client for a small community event board: a known set of users browse,
//! create, join, quit, and cancel local events held by a remote store.
//!
//! ## Components
//!
//! - [`session`]: who is acting (the active user) and whether they are the admin
//! - [`roster`]: per-event join/quit/cancel gating and the mutations themselves
//! - [`intake`]: staging and validating a new event
//! - [`client::LocalEvents`]: the `async` façade over all three
//! - [`storage::FileSessionStorage`]: keeps the session between runs
//!
//! ## Example
//!
//! ```no_run
//! use localevents::{Config, FileSessionStorage, LocalEvents};
//! use localevents_http::HttpEventStore;
//!
//! # async fn run() -> anyhow::Result<()> {
//! let config = Config::from_env();
//! let client = LocalEvents::new(
//!     HttpEventStore::with_timeout(&config.store_url, config.request_timeout)?,
//!     FileSessionStorage::new(&config.session_dir),
//! );
//!
//! client.load_roster().await?;
//! for card in client.refresh_cards().await? {
//!     println!("{}: {} ({})", card.id, card.title, card.when);
//! }
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod config;
pub mod error;
pub mod intake;
pub mod roster;
pub mod session;
pub mod storage;

pub use client::{LocalEvents, MIN_FEEDBACK_LIMIT};
pub use config::Config;
pub use error::{LocalEventsError, Operation, SubmitError};
pub use intake::{IntakeField, IntakeForm, ValidationErrors, validate};
pub use roster::{AllowedActions, EventCard, ListPhase, can_cancel, can_join, can_quit};
pub use session::SessionState;
pub use storage::FileSessionStorage;
