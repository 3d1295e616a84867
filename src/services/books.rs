//! Book collection synchronizer
//!
//! Keeps the in-memory listing in step with the server. Deletes are applied
//! locally before the request goes out; updates wait for the server's copy of
//! the record. Either failure is repaired by refetching the whole listing.

use std::sync::Arc;
use tokio::sync::watch;

use crate::{
    api::BooksApi,
    error::{ApiError, SyncError, SyncResult},
    models::{BookCollection, BookDraft, BookRecord, Session},
};

pub const UPDATED_NOTICE: &str = "Book updated successfully!";

/// What the listing view renders
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CollectionState {
    pub books: BookCollection,
    /// A listing fetch is in flight
    pub loading: bool,
    /// A create or update is in flight
    pub saving: bool,
    pub error: Option<String>,
    pub notice: Option<String>,
}

pub struct BookSynchronizer {
    api: Arc<dyn BooksApi>,
    /// Bearer source: whatever token the session currently holds
    session: watch::Receiver<Session>,
    state: watch::Sender<CollectionState>,
}

impl BookSynchronizer {
    pub fn new(api: Arc<dyn BooksApi>, session: watch::Receiver<Session>) -> Self {
        let (state, _) = watch::channel(CollectionState::default());
        Self { api, session, state }
    }

    pub fn state(&self) -> CollectionState {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<CollectionState> {
        self.state.subscribe()
    }

    pub fn clear_notice(&self) {
        self.state.send_if_modified(|s| s.notice.take().is_some());
    }

    /// Books whose title or author contains `term`, ignoring case
    pub fn filter(&self, term: &str) -> Vec<BookRecord> {
        self.state.borrow().books.filter(term).into_iter().cloned().collect()
    }

    fn token(&self) -> Option<String> {
        self.session.borrow().token.clone()
    }

    fn report(&self, err: SyncError) -> SyncError {
        tracing::warn!(kind = err.kind(), "{:?}", err);
        let message = err.to_string();
        self.state.send_modify(|s| s.error = Some(message));
        err
    }

    /// Refetch after a failed write. `err` stays the reported error even if
    /// the refetch fails too.
    async fn resync(&self, err: SyncError) -> SyncError {
        match self.fetch_all().await {
            Ok(()) => tracing::debug!("Listing resynced after {}", err.kind()),
            Err(refetch) => {
                tracing::warn!("Resync after {} failed: {}", err.kind(), refetch);
                let message = err.to_string();
                self.state.send_modify(|s| s.error = Some(message));
            }
        }
        err
    }

    /// Replace the listing with the server's. A failure leaves it as is.
    pub async fn fetch_all(&self) -> SyncResult<()> {
        self.state.send_modify(|s| s.loading = true);
        let token = self.token();

        match self.api.list_books(token.as_deref()).await {
            Ok(books) => {
                tracing::info!("Fetched {} books", books.len());
                self.state.send_modify(|s| {
                    s.books.replace_all(books);
                    s.loading = false;
                });
                Ok(())
            }
            Err(e) => {
                self.state.send_modify(|s| s.loading = false);
                Err(self.report(SyncError::FetchFailed(e)))
            }
        }
    }

    /// Submit a new book. The listing is not touched; callers return to it
    /// and refetch.
    pub async fn create(&self, draft: BookDraft) -> SyncResult<BookRecord> {
        let draft = draft.normalized();
        if let Err(errors) = draft.validate_for_create() {
            return Err(self.report(SyncError::Validation(errors)));
        }

        self.state.send_modify(|s| {
            s.saving = true;
            s.error = None;
        });
        let token = self.token();
        let result = self.api.create_book(&draft, token.as_deref()).await;
        self.state.send_modify(|s| s.saving = false);

        match result {
            Ok(record) => {
                tracing::info!("Created book id={} {:?}", record.id, record.title);
                Ok(record)
            }
            Err(ApiError::Validation { errors, .. }) => Err(self.report(SyncError::Validation(errors))),
            Err(e) => Err(self.report(SyncError::CreateFailed(e))),
        }
    }

    /// Replace book `id` on the server, then adopt the server's record
    /// locally. Nothing local changes before the response arrives.
    pub async fn update(&self, id: i64, draft: BookDraft) -> SyncResult<BookRecord> {
        let draft = draft.normalized();
        if let Err(errors) = draft.validate_for_update() {
            return Err(self.report(SyncError::Validation(errors)));
        }

        self.state.send_modify(|s| s.saving = true);
        let token = self.token();
        let result = self.api.update_book(id, &draft, token.as_deref()).await;
        self.state.send_modify(|s| s.saving = false);

        match result {
            Ok(record) => {
                tracing::info!("Updated book id={}", id);
                let stored = record.clone();
                self.state.send_modify(|s| {
                    if !s.books.replace(stored) {
                        tracing::debug!("Updated book id={} is no longer listed", id);
                    }
                    s.error = None;
                    s.notice = Some(UPDATED_NOTICE.to_string());
                });
                Ok(record)
            }
            Err(e) => {
                let err = self.report(SyncError::UpdateFailed(e));
                Err(self.resync(err).await)
            }
        }
    }

    /// Drop book `id` from the listing at once, then delete it on the server
    pub async fn delete(&self, id: i64) -> SyncResult<()> {
        self.state.send_modify(|s| {
            s.books.remove(id);
        });
        let token = self.token();

        match self.api.delete_book(id, token.as_deref()).await {
            Ok(()) => {
                tracing::info!("Deleted book id={}", id);
                Ok(())
            }
            Err(e) => {
                let err = self.report(SyncError::DeleteFailed(e));
                Err(self.resync(err).await)
            }
        }
    }
}
