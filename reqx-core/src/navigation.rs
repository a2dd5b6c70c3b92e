//! Views, routes and the navigation guard

use std::fmt;
use std::str::FromStr;

use crate::backend::DocumentId;
use crate::error::WorkflowError;
use crate::models::{DocumentStatus, DocumentSummary};
use crate::workflow::{Stage, WorkflowStore};

/// Every page of the application
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum View {
    Login,
    Register,
    ForgotPassword,
    Dashboard,
    RequirementInput,
    ExtractionReview(DocumentId),
    Prioritization(DocumentId),
    DocumentGeneration(DocumentId),
    Analytics,
    Settings,
}

impl View {
    /// Views reachable without a session
    pub fn is_public(&self) -> bool {
        matches!(self, View::Login | View::Register | View::ForgotPassword)
    }

    /// Sign-in pages an authenticated user is bounced away from
    fn is_auth_entry(&self) -> bool {
        matches!(self, View::Login | View::Register)
    }

    /// The workflow stage a view mounts its store at, if any
    pub fn stage(&self) -> Option<Stage> {
        match self {
            View::RequirementInput => Some(Stage::Input),
            View::ExtractionReview(_) => Some(Stage::Extracted),
            View::Prioritization(_) => Some(Stage::Reviewed),
            View::DocumentGeneration(_) => Some(Stage::Prioritized),
            _ => None,
        }
    }

    pub fn path(&self) -> String {
        match self {
            View::Login => "/login".to_string(),
            View::Register => "/register".to_string(),
            View::ForgotPassword => "/forgot-password".to_string(),
            View::Dashboard => "/dashboard".to_string(),
            View::RequirementInput => "/requirement-input".to_string(),
            View::ExtractionReview(id) => format!("/extraction-review/{}", id),
            View::Prioritization(id) => format!("/prioritization/{}", id),
            View::DocumentGeneration(id) => format!("/document-generation/{}", id),
            View::Analytics => "/analytics".to_string(),
            View::Settings => "/settings".to_string(),
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            View::Login => "Login",
            View::Register => "Create Account",
            View::ForgotPassword => "Forgot Password",
            View::Dashboard => "Dashboard",
            View::RequirementInput => "Input Requirements",
            View::ExtractionReview(_) => "Requirement Extraction & Review",
            View::Prioritization(_) => "Requirement Prioritization",
            View::DocumentGeneration(_) => "Document Generation",
            View::Analytics => "Analytics",
            View::Settings => "Settings",
        }
    }
}

impl fmt::Display for View {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.path())
    }
}

/// Route that could not be matched; the guard sends these to the root
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownRoute(pub String);

impl FromStr for View {
    type Err = UnknownRoute;

    fn from_str(path: &str) -> Result<Self, Self::Err> {
        let trimmed = path.trim().trim_end_matches('/');
        let segments: Vec<&str> = trimmed
            .trim_start_matches('/')
            .split('/')
            .filter(|s| !s.is_empty())
            .collect();

        let doc = |raw: &str| {
            raw.parse::<DocumentId>()
                .map_err(|_| UnknownRoute(path.to_string()))
        };

        match segments.as_slice() {
            ["login"] => Ok(View::Login),
            ["register"] => Ok(View::Register),
            ["forgot-password"] => Ok(View::ForgotPassword),
            ["dashboard"] => Ok(View::Dashboard),
            ["requirement-input"] => Ok(View::RequirementInput),
            ["extraction-review", id] => Ok(View::ExtractionReview(doc(*id)?)),
            ["prioritization", id] => Ok(View::Prioritization(doc(*id)?)),
            ["document-generation", id] => Ok(View::DocumentGeneration(doc(*id)?)),
            ["analytics"] => Ok(View::Analytics),
            ["settings"] => Ok(View::Settings),
            _ => Err(UnknownRoute(path.to_string())),
        }
    }
}

/// Applies the guard: protected views need a session, and signed-in
/// users skip the login and registration pages
pub fn guard(view: View, authenticated: bool) -> View {
    if !authenticated && !view.is_public() {
        log::debug!("Redirecting unauthenticated access to {} to login", view);
        return View::Login;
    }
    if authenticated && view.is_auth_entry() {
        return View::Dashboard;
    }
    view
}

/// Resolves a raw path, sending the root and unknown routes to the
/// dashboard or login page depending on the session
pub fn resolve(path: &str, authenticated: bool) -> View {
    match path.parse::<View>() {
        Ok(view) => guard(view, authenticated),
        Err(UnknownRoute(route)) => {
            if route.trim() != "/" && !route.trim().is_empty() {
                log::debug!("Unknown route {}, redirecting to root", route);
            }
            guard(View::Dashboard, authenticated)
        }
    }
}

/// "Proceed to prioritization" from the review view
pub fn proceed_from_review(
    document: DocumentId,
    store: &WorkflowStore,
) -> Result<View, WorkflowError> {
    store.can_advance_from_review()?;
    Ok(View::Prioritization(document))
}

/// "Generate document" from the prioritization view
pub fn proceed_from_prioritization(
    document: DocumentId,
    store: &WorkflowStore,
) -> Result<View, WorkflowError> {
    store.can_advance_from_prioritization()?;
    Ok(View::DocumentGeneration(document))
}

/// Stage view a dashboard entry opens, chosen by its status
pub fn open_document(doc: &DocumentSummary) -> View {
    match doc.status {
        DocumentStatus::Extracted => View::Prioritization(doc.id),
        DocumentStatus::InReview => View::ExtractionReview(doc.id),
        DocumentStatus::Prioritized => View::DocumentGeneration(doc.id),
        DocumentStatus::Completed => View::ExtractionReview(doc.id),
    }
}
