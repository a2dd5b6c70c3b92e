//! Auth collaborator
//!
//! The only real rule is an exact match against one configured credential
//! pair; registration and federated sign-in always succeed once their
//! fields validate.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

use crate::error::WorkflowError;
use crate::models::{Alert, UserProfile};
use crate::session::Session;

/// Errors returned by an [`Authenticator`]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("Passwords do not match")]
    PasswordMismatch,
}

/// Email and password entered on the login view
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

impl Credentials {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
        }
    }

    pub fn validate(&self) -> Result<(), WorkflowError> {
        if self.email.trim().is_empty() || self.password.is_empty() {
            return Err(WorkflowError::Validation(
                "Please enter both email and password".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for Credentials {
    fn default() -> Self {
        Self::new("user@example.com", "password")
    }
}

/// Fields of the registration view
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Registration {
    pub name: String,
    pub email: String,
    pub password: String,
    pub confirm_password: String,
}

impl Registration {
    pub fn validate(&self) -> Result<(), WorkflowError> {
        let fields = [&self.name, &self.email, &self.password, &self.confirm_password];
        if fields.iter().any(|f| f.trim().is_empty()) {
            return Err(WorkflowError::Validation(
                "Please fill all fields".to_string(),
            ));
        }
        if self.password != self.confirm_password {
            return Err(AuthError::PasswordMismatch.into());
        }
        Ok(())
    }
}

#[async_trait]
pub trait Authenticator: Send + Sync {
    async fn authenticate(&self, credentials: &Credentials) -> Result<Session, AuthError>;

    async fn register(&self, registration: &Registration) -> Result<Session, AuthError>;

    /// Third-party sign-in ("Login with Google")
    async fn federated_login(&self) -> Result<Session, AuthError>;

    async fn request_password_reset(&self, email: &str) -> Result<(), AuthError>;
}

/// Authenticator backed by a single literal credential pair
#[derive(Debug, Clone)]
pub struct FixtureAuthenticator {
    accepted: Credentials,
    profile: UserProfile,
    delay: Duration,
}

impl FixtureAuthenticator {
    pub fn new(accepted: Credentials, profile: UserProfile, delay: Duration) -> Self {
        Self {
            accepted,
            profile,
            delay,
        }
    }
}

impl Default for FixtureAuthenticator {
    fn default() -> Self {
        Self::new(
            Credentials::default(),
            UserProfile::default(),
            Duration::ZERO,
        )
    }
}

#[async_trait]
impl Authenticator for FixtureAuthenticator {
    async fn authenticate(&self, credentials: &Credentials) -> Result<Session, AuthError> {
        tokio::time::sleep(self.delay).await;

        if credentials.email == self.accepted.email
            && credentials.password == self.accepted.password
        {
            let mut profile = self.profile.clone();
            profile.email = credentials.email.clone();
            Ok(Session::new(profile))
        } else {
            log::debug!("Rejected credentials for {}", credentials.email);
            Err(AuthError::InvalidCredentials)
        }
    }

    async fn register(&self, registration: &Registration) -> Result<Session, AuthError> {
        tokio::time::sleep(self.delay).await;

        if registration.password != registration.confirm_password {
            return Err(AuthError::PasswordMismatch);
        }
        Ok(Session::new(UserProfile::new(
            registration.name.clone(),
            registration.email.clone(),
        )))
    }

    async fn federated_login(&self) -> Result<Session, AuthError> {
        tokio::time::sleep(self.delay).await;
        Ok(Session::new(self.profile.clone()))
    }

    async fn request_password_reset(&self, _email: &str) -> Result<(), AuthError> {
        tokio::time::sleep(self.delay).await;
        Ok(())
    }
}

/// Validates the login form and asks the collaborator for a session
pub async fn sign_in(
    auth: &dyn Authenticator,
    credentials: &Credentials,
) -> Result<Session, WorkflowError> {
    credentials.validate()?;
    Ok(auth.authenticate(credentials).await?)
}

/// Validates the registration form and asks the collaborator for a session
pub async fn sign_up(
    auth: &dyn Authenticator,
    registration: &Registration,
) -> Result<Session, WorkflowError> {
    registration.validate()?;
    Ok(auth.register(registration).await?)
}

/// Forgot-password flow; any non-empty address is accepted
pub async fn reset_password(
    auth: &dyn Authenticator,
    email: &str,
) -> Result<Alert, WorkflowError> {
    if email.trim().is_empty() {
        return Err(WorkflowError::Validation(
            "Please enter your email address".to_string(),
        ));
    }
    auth.request_password_reset(email).await?;
    Ok(Alert::success(
        "Password reset link has been sent to your email",
    ))
}
