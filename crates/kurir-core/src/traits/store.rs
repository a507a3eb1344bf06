// SPDX-FileCopyrightText: 2026 Kurir Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Document-store trait: durable session and lead records.

use async_trait::async_trait;

use crate::error::KurirError;
use crate::model::{Lead, NewSession, Session, SessionPatch};

/// Durable storage for sessions and leads.
///
/// Multiple sessions may exist per entity; "latest by `updated_at`" is the
/// resolution rule, implemented once in [`latest_session_by_entity`].
///
/// [`latest_session_by_entity`]: DocumentStore::latest_session_by_entity
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Creates and persists a new session.
    async fn create_session(&self, req: NewSession) -> Result<Session, KurirError>;

    /// Fetches a session by id.
    async fn get_session(&self, session_id: &str) -> Result<Option<Session>, KurirError>;

    /// Applies a partial update; returns the updated session or `None` when
    /// the session does not exist.
    async fn update_session(
        &self,
        session_id: &str,
        patch: SessionPatch,
    ) -> Result<Option<Session>, KurirError>;

    /// Deletes a session; returns whether a document was removed. Only used
    /// by maintenance tooling and test fixtures.
    async fn delete_session(&self, session_id: &str) -> Result<bool, KurirError>;

    /// All sessions for an entity. With `active_only`, expired sessions are
    /// filtered out and lazily marked inactive as they are encountered.
    async fn sessions_by_entity(
        &self,
        entity_id: i64,
        active_only: bool,
    ) -> Result<Vec<Session>, KurirError>;

    /// The most recently updated active session for an entity.
    async fn latest_session_by_entity(
        &self,
        entity_id: i64,
    ) -> Result<Option<Session>, KurirError> {
        let sessions = self.sessions_by_entity(entity_id, true).await?;
        Ok(sessions.into_iter().max_by_key(|s| s.updated_at))
    }

    /// Marks every expired-but-active session inactive; returns the count.
    async fn cleanup_expired_sessions(&self) -> Result<usize, KurirError>;

    /// Persists a lead audit record.
    async fn save_lead(&self, lead: &Lead) -> Result<(), KurirError>;
}
