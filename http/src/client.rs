//! REST event store client

use crate::error::ClientBuildError;
use localevents_core::event_store::{EventStore, EventStoreError, StoreFuture};
use localevents_core::model::{Event, EventCreate, EventId, MembershipChange, NewUser, User};
use reqwest::{Client, Method, Response};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::time::Duration;

/// Event store reached over HTTP
///
/// Cheap to clone; clones share the connection pool.
#[derive(Clone, Debug)]
pub struct HttpEventStore {
    client: Client,
    base_url: String,
}

impl HttpEventStore {
    /// Create a client for the store at `base_url` with no request timeout
    ///
    /// # Errors
    ///
    /// [`ClientBuildError::InvalidBaseUrl`] if `base_url` is not an
    /// `http://` or `https://` URL.
    pub fn new(base_url: impl Into<String>) -> Result<Self, ClientBuildError> {
        Self::with_timeout(base_url, None)
    }

    /// Create a client whose requests give up after `timeout`
    ///
    /// A timed-out request surfaces as [`EventStoreError::Unreachable`].
    ///
    /// # Errors
    ///
    /// [`ClientBuildError`] if the URL is invalid or the client cannot be built.
    pub fn with_timeout(
        base_url: impl Into<String>,
        timeout: Option<Duration>,
    ) -> Result<Self, ClientBuildError> {
        let base_url = base_url.into();
        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            return Err(ClientBuildError::InvalidBaseUrl(base_url));
        }

        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| ClientBuildError::Client(e.to_string()))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// The normalized base URL (no trailing slash)
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    async fn execute<B: Serialize + Sync>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
    ) -> Result<Response, EventStoreError> {
        let mut request = self.client.request(method.clone(), self.url(path));
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await.map_err(|e| {
            tracing::debug!(%method, path, error = %e, "Event store unreachable");
            EventStoreError::Unreachable(e.to_string())
        })?;

        let status = response.status();
        if status.is_success() {
            tracing::trace!(%method, path, status = status.as_u16(), "Event store responded");
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        tracing::debug!(%method, path, status = status.as_u16(), "Event store rejected request");
        Err(EventStoreError::Status {
            status: status.as_u16(),
            body,
        })
    }

    async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, EventStoreError> {
        let bytes = response
            .bytes()
            .await
            .map_err(|e| EventStoreError::Unreachable(e.to_string()))?;
        serde_json::from_slice(&bytes).map_err(|e| EventStoreError::Decode(e.to_string()))
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, EventStoreError> {
        let response = self.execute::<()>(Method::GET, path, None).await?;
        Self::decode(response).await
    }

    async fn post<B, T>(&self, path: &str, body: &B) -> Result<T, EventStoreError>
    where
        B: Serialize + Sync,
        T: DeserializeOwned,
    {
        let response = self.execute(Method::POST, path, Some(body)).await?;
        Self::decode(response).await
    }
}

impl EventStore for HttpEventStore {
    fn list_events(&self) -> StoreFuture<'_, Vec<Event>> {
        Box::pin(self.get("/events/"))
    }

    fn list_users(&self) -> StoreFuture<'_, Vec<User>> {
        Box::pin(self.get("/users/"))
    }

    fn create_user(&self, user: NewUser) -> StoreFuture<'_, User> {
        Box::pin(async move { self.post("/users/", &user).await })
    }

    fn create_event(&self, event: EventCreate) -> StoreFuture<'_, Event> {
        Box::pin(async move { self.post("/events/", &event).await })
    }

    fn join_event(&self, change: MembershipChange) -> StoreFuture<'_, Event> {
        Box::pin(async move { self.post("/event/join/", &change).await })
    }

    fn quit_event(&self, change: MembershipChange) -> StoreFuture<'_, Event> {
        Box::pin(async move { self.post("/event/quit/", &change).await })
    }

    fn cancel_event(&self, event_id: EventId) -> StoreFuture<'_, ()> {
        Box::pin(async move {
            let path = format!("/event/cancel/{event_id}");
            // The body, if any, carries nothing the client uses
            self.execute::<()>(Method::DELETE, &path, None).await?;
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    #[test]
    fn trailing_slash_is_trimmed() {
        let store = HttpEventStore::new("http://localhost:8000/").unwrap();
        assert_eq!(store.base_url(), "http://localhost:8000");
        assert_eq!(store.url("/events/"), "http://localhost:8000/events/");
    }

    #[test]
    fn non_http_url_is_rejected() {
        let result = HttpEventStore::new("localhost:8000");
        assert!(matches!(result, Err(ClientBuildError::InvalidBaseUrl(_))));
    }
}
