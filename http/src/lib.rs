//! # LocalEvents HTTP Store
//!
//! [`HttpEventStore`] implements the [`EventStore`](localevents_core::EventStore)
//! contract against the LocalEvents REST service.
//!
//! ## Example
//!
//! ```no_run
//! use localevents_core::EventStore;
//! use localevents_http::HttpEventStore;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let store = HttpEventStore::new("http://127.0.0.1:8000")?;
//!
//!     for event in store.list_events().await? {
//!         println!("{} at {}", event.title, event.event_dt);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Error mapping
//!
//! - connection failures and timeouts: `EventStoreError::Unreachable`
//! - any non-2xx status: `EventStoreError::Status`, with the response body
//! - a 2xx body that is not the expected JSON: `EventStoreError::Decode`

pub mod client;
pub mod error;

pub use client::HttpEventStore;
pub use error::ClientBuildError;
