//! Session state
//!
//! The authentication flag and user profile live in an explicit
//! [`SessionContext`] handed to views, initialised from the persistence
//! collaborator and torn down on logout.

use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::UserProfile;
use crate::storage::KeyValueStore;

/// Key holding the serialized session marker
pub const SESSION_KEY: &str = "user";
/// Key set once the onboarding tutorial has been dismissed
pub const ONBOARDING_KEY: &str = "has_seen_onboarding";

/// Onboarding tutorial pages as (title, body)
pub const TUTORIAL_STEPS: [(&str, &str); 4] = [
    (
        "Welcome to Req Extract",
        "This AI-powered tool helps you extract, organize, and manage requirements. Let's take a quick tour!",
    ),
    (
        "Create New Requirements",
        "Upload documents or enter requirements manually. Our AI will help you extract and organize them.",
    ),
    (
        "Review & Prioritize",
        "Review AI-extracted requirements, verify them, and prioritize using the MoSCoW method.",
    ),
    (
        "Analyze & Export",
        "Get insights on your requirements and export them in multiple formats including Word, PDF, and JIRA.",
    ),
];

/// An authenticated session
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Session {
    pub token: Uuid,
    pub profile: UserProfile,
    pub signed_in_at: DateTime<Utc>,
}

impl Session {
    pub fn new(profile: UserProfile) -> Self {
        Self {
            token: Uuid::new_v4(),
            profile,
            signed_in_at: Utc::now(),
        }
    }
}

/// Authentication state shared by every view
pub struct SessionContext<K: KeyValueStore> {
    store: K,
    session: Option<Session>,
    seen_onboarding: bool,
}

impl<K: KeyValueStore> SessionContext<K> {
    /// Reads the session marker and onboarding flag once at startup
    ///
    /// An unreadable marker is discarded and treated as signed out.
    pub fn initialize(mut store: K) -> Result<Self> {
        let session = match store.get(SESSION_KEY)? {
            Some(raw) => match serde_json::from_str::<Session>(&raw) {
                Ok(session) => {
                    log::debug!("Restored session for {}", session.profile.email);
                    Some(session)
                }
                Err(e) => {
                    log::warn!("Discarding unreadable session marker: {}", e);
                    store.remove(SESSION_KEY)?;
                    None
                }
            },
            None => None,
        };

        let seen_onboarding = store
            .get(ONBOARDING_KEY)?
            .map(|v| v == "true")
            .unwrap_or(false);

        Ok(Self {
            store,
            session,
            seen_onboarding,
        })
    }

    pub fn is_authenticated(&self) -> bool {
        self.session.is_some()
    }

    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    pub fn profile(&self) -> Option<&UserProfile> {
        self.session.as_ref().map(|s| &s.profile)
    }

    /// Installs a session produced by the auth collaborator
    pub fn login(&mut self, session: Session) -> Result<()> {
        let marker = serde_json::to_string(&session)?;
        self.store.set(SESSION_KEY, &marker)?;
        log::info!("Signed in as {}", session.profile.email);
        self.session = Some(session);
        Ok(())
    }

    /// Clears the session and removes the persisted marker
    pub fn logout(&mut self) -> Result<()> {
        self.store.remove(SESSION_KEY)?;
        if let Some(session) = self.session.take() {
            log::info!("Signed out {}", session.profile.email);
        }
        Ok(())
    }

    /// Replaces the profile of the active session (settings page)
    pub fn update_profile(&mut self, profile: UserProfile) -> Result<bool> {
        let Some(session) = self.session.as_mut() else {
            return Ok(false);
        };
        session.profile = profile;
        let marker = serde_json::to_string(&*session)?;
        self.store.set(SESSION_KEY, &marker)?;
        Ok(true)
    }

    pub fn needs_onboarding(&self) -> bool {
        !self.seen_onboarding
    }

    pub fn dismiss_onboarding(&mut self) -> Result<()> {
        self.store.set(ONBOARDING_KEY, "true")?;
        self.seen_onboarding = true;
        Ok(())
    }

    /// Gives the backing store back, e.g. to reopen a fresh context
    pub fn into_store(self) -> K {
        self.store
    }
}
