//! Remote backend abstraction.
//!
//! The coordinator talks to the backend only through [`RemoteApi`]. The
//! shipped implementation is [`PostgrestClient`]; tests plug in their own.
//!
//! # Error classification
//!
//! Every failure is either [`RemoteError::Unavailable`] (the backend could
//! not be reached or is temporarily unable to answer) or
//! [`RemoteError::Rejected`] (the backend answered and refused the request).
//! Only unavailable failures are recovered locally.

pub mod postgrest;

use std::future::Future;
use std::pin::Pin;

use serde_json::Value;
use talebedu_models::Collection;

pub use postgrest::PostgrestClient;

/// Boxed future returned by [`RemoteApi`] methods.
pub type RemoteFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, RemoteError>> + Send + 'a>>;

/// CRUD contract of the remote backend, per collection.
pub trait RemoteApi: Send + Sync {
    /// Rows of a collection matching the query.
    fn select<'a>(
        &'a self,
        collection: Collection,
        query: &'a RemoteQuery,
    ) -> RemoteFuture<'a, Vec<Value>>;

    /// Inserts a record and returns the stored row.
    fn insert<'a>(&'a self, collection: Collection, record: &'a Value) -> RemoteFuture<'a, Value>;

    /// Applies a partial update to one row and returns the stored row.
    fn update<'a>(
        &'a self,
        collection: Collection,
        id: &'a str,
        patch: &'a Value,
    ) -> RemoteFuture<'a, Value>;

    fn delete<'a>(&'a self, collection: Collection, id: &'a str) -> RemoteFuture<'a, ()>;
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RemoteError {
    #[error("Remote unavailable: {0}")]
    Unavailable(String),

    #[error("Remote rejected the request with status {status}: {message}")]
    Rejected { status: u16, message: String },
}

impl RemoteError {
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable(message.into())
    }

    pub fn rejected(status: u16, message: impl Into<String>) -> Self {
        Self::Rejected {
            status,
            message: message.into(),
        }
    }

    /// Classifies a non-success HTTP status. 5xx, 408 and 429 are treated as
    /// the backend being unavailable.
    pub fn from_status(status: u16, message: impl Into<String>) -> Self {
        match status {
            408 | 429 | 500..=599 => Self::Unavailable(format!("HTTP {status}: {}", message.into())),
            _ => Self::rejected(status, message),
        }
    }

    /// Whether the failure is worth retrying later.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Unavailable(_))
    }
}

/// Row selection for [`RemoteApi::select`].
///
/// The default selects every column of every row.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RemoteQuery {
    /// Column list, `*` when unset.
    pub columns: Option<String>,
    /// Equality filters as `(column, value)`.
    pub filters: Vec<(String, String)>,
    pub order: Option<OrderBy>,
    pub limit: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderBy {
    pub column: String,
    pub ascending: bool,
}

impl RemoteQuery {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn columns(mut self, columns: impl Into<String>) -> Self {
        self.columns = Some(columns.into());
        self
    }

    pub fn eq(mut self, column: impl Into<String>, value: impl Into<String>) -> Self {
        self.filters.push((column.into(), value.into()));
        self
    }

    pub fn order_by(mut self, column: impl Into<String>, ascending: bool) -> Self {
        self.order = Some(OrderBy {
            column: column.into(),
            ascending,
        });
        self
    }

    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }
}
