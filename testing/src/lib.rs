//! # LocalEvents Testing
//!
//! Testing utilities for LocalEvents reducers and the client façade.
//!
//! This crate provides:
//! - [`ReducerTest`], a Given/When/Then harness for reducers
//! - [`InMemoryEventStore`] and [`MemorySessionStorage`], in-memory
//!   collaborators that stand in for the REST store and the session files
//! - [`fixtures`] with the users and events the scenarios are written in
//! - [`properties`] with proptest strategies for rosters and events
//!
//! ## Example
//!
//! ```ignore
//! use localevents_testing::{InMemoryEventStore, MemorySessionStorage, fixtures};
//!
//! #[tokio::test]
//! async fn first_user_becomes_active() {
//!     let store = InMemoryEventStore::new().with_users(fixtures::alice_and_admin());
//!     let client = LocalEvents::new(store, MemorySessionStorage::new());
//!
//!     client.load_roster().await.unwrap();
//!
//!     assert_eq!(client.active_user().await, Some(fixtures::user(1, "alice")));
//! }
//! ```

pub mod fixtures;
pub mod mocks;
pub mod properties;
pub mod reducer_test;

pub use mocks::{InMemoryEventStore, MemorySessionStorage, StoreCall};
pub use reducer_test::{ReducerTest, assertions};
