// SPDX-FileCopyrightText: 2026 Kurir Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-memory document store for deterministic testing.
//!
//! Mirrors the Firestore-backed store's semantics (patch application via
//! `Session::apply`, lazy deactivation of expired sessions) over hash maps,
//! with injectable failures for the write paths.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use kurir_core::{DocumentStore, KurirError, Lead, NewSession, Session, SessionPatch};
use tokio::sync::Mutex;

/// A mock document store backed by hash maps.
pub struct MemoryStore {
    sessions: Mutex<HashMap<String, Session>>,
    leads: Mutex<Vec<Lead>>,
    fail_create_session: AtomicBool,
    fail_update_session: AtomicBool,
    fail_save_lead: AtomicBool,
    fail_queries: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            sessions: Mutex::new(HashMap::new()),
            leads: Mutex::new(Vec::new()),
            fail_create_session: AtomicBool::new(false),
            fail_update_session: AtomicBool::new(false),
            fail_save_lead: AtomicBool::new(false),
            fail_queries: AtomicBool::new(false),
        }
    }

    /// Inserts a pre-built session, bypassing `create_session`.
    pub async fn insert_session(&self, session: Session) {
        self.sessions
            .lock()
            .await
            .insert(session.session_id.clone(), session);
    }

    /// Snapshot of all stored sessions.
    pub async fn sessions(&self) -> Vec<Session> {
        self.sessions.lock().await.values().cloned().collect()
    }

    /// Snapshot of all saved leads, in save order.
    pub async fn leads(&self) -> Vec<Lead> {
        self.leads.lock().await.clone()
    }

    pub fn fail_create_session(&self, fail: bool) {
        self.fail_create_session.store(fail, Ordering::SeqCst);
    }

    pub fn fail_update_session(&self, fail: bool) {
        self.fail_update_session.store(fail, Ordering::SeqCst);
    }

    pub fn fail_save_lead(&self, fail: bool) {
        self.fail_save_lead.store(fail, Ordering::SeqCst);
    }

    pub fn fail_queries(&self, fail: bool) {
        self.fail_queries.store(fail, Ordering::SeqCst);
    }

    fn injected(kind: &str) -> KurirError {
        KurirError::Store {
            message: format!("injected {kind} failure"),
            source: None,
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn create_session(&self, req: NewSession) -> Result<Session, KurirError> {
        if self.fail_create_session.load(Ordering::SeqCst) {
            return Err(Self::injected("create_session"));
        }
        let session = req.into_session();
        self.insert_session(session.clone()).await;
        Ok(session)
    }

    async fn get_session(&self, session_id: &str) -> Result<Option<Session>, KurirError> {
        Ok(self.sessions.lock().await.get(session_id).cloned())
    }

    async fn update_session(
        &self,
        session_id: &str,
        patch: SessionPatch,
    ) -> Result<Option<Session>, KurirError> {
        if self.fail_update_session.load(Ordering::SeqCst) {
            return Err(Self::injected("update_session"));
        }
        let mut sessions = self.sessions.lock().await;
        match sessions.get_mut(session_id) {
            Some(session) => {
                session.apply(&patch);
                Ok(Some(session.clone()))
            }
            None => Ok(None),
        }
    }

    async fn delete_session(&self, session_id: &str) -> Result<bool, KurirError> {
        Ok(self.sessions.lock().await.remove(session_id).is_some())
    }

    async fn sessions_by_entity(
        &self,
        entity_id: i64,
        active_only: bool,
    ) -> Result<Vec<Session>, KurirError> {
        if self.fail_queries.load(Ordering::SeqCst) {
            return Err(Self::injected("query"));
        }

        let mut sessions = self.sessions.lock().await;
        let mut result = Vec::new();
        for session in sessions.values_mut() {
            if session.entity_id != Some(entity_id) {
                continue;
            }
            if active_only && !session.is_active {
                continue;
            }
            if session.is_expired() {
                if session.is_active {
                    session.deactivate();
                }
                continue;
            }
            result.push(session.clone());
        }
        Ok(result)
    }

    async fn cleanup_expired_sessions(&self) -> Result<usize, KurirError> {
        let mut sessions = self.sessions.lock().await;
        let mut cleaned = 0;
        for session in sessions.values_mut() {
            if session.is_active && session.is_expired() {
                session.deactivate();
                cleaned += 1;
            }
        }
        Ok(cleaned)
    }

    async fn save_lead(&self, lead: &Lead) -> Result<(), KurirError> {
        if self.fail_save_lead.load(Ordering::SeqCst) {
            return Err(Self::injected("save_lead"));
        }
        self.leads.lock().await.push(lead.clone());
        Ok(())
    }
}
