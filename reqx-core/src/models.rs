use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::WorkflowError;

/// Identifier of a requirement within one editing session
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(transparent)]
pub struct RequirementId(pub u32);

impl RequirementId {
    /// Label used in generated documents, e.g. "REQ-007"
    pub fn doc_label(&self) -> String {
        format!("REQ-{:03}", self.0)
    }
}

impl fmt::Display for RequirementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Represents the type of a requirement
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum RequirementType {
    Functional,
    NonFunctional,
}

impl fmt::Display for RequirementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RequirementType::Functional => write!(f, "Functional"),
            RequirementType::NonFunctional => write!(f, "Non-Functional"),
        }
    }
}

impl FromStr for RequirementType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "functional" | "f" => Ok(RequirementType::Functional),
            "non-functional" | "nonfunctional" | "non_functional" | "nf" => {
                Ok(RequirementType::NonFunctional)
            }
            _ => Err(format!(
                "Invalid type: {}. Use functional or non-functional",
                s
            )),
        }
    }
}

/// MoSCoW priority bucket
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum Priority {
    MustHave,
    ShouldHave,
    CouldHave,
    WontHave,
}

impl Priority {
    pub const ALL: [Priority; 4] = [
        Priority::MustHave,
        Priority::ShouldHave,
        Priority::CouldHave,
        Priority::WontHave,
    ];

    /// Guidance text shown next to each bucket
    pub fn description(&self) -> &'static str {
        match self {
            Priority::MustHave => {
                "Essential for project success. Project cannot go live without these."
            }
            Priority::ShouldHave => {
                "Important but not vital. Project success would be affected without these."
            }
            Priority::CouldHave => {
                "Desirable features that would be nice to have if time and resources permit."
            }
            Priority::WontHave => {
                "Features that will not be implemented in the current release but may be considered for future."
            }
        }
    }

    /// Wire form, e.g. "must-have"
    pub fn slug(&self) -> &'static str {
        match self {
            Priority::MustHave => "must-have",
            Priority::ShouldHave => "should-have",
            Priority::CouldHave => "could-have",
            Priority::WontHave => "wont-have",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Priority::MustHave => write!(f, "Must-Have"),
            Priority::ShouldHave => write!(f, "Should-Have"),
            Priority::CouldHave => write!(f, "Could-Have"),
            Priority::WontHave => write!(f, "Won't Have"),
        }
    }
}

impl FromStr for Priority {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace(['_', ' ', '\''], "-").as_str() {
            "must-have" | "must" | "m" => Ok(Priority::MustHave),
            "should-have" | "should" | "s" => Ok(Priority::ShouldHave),
            "could-have" | "could" | "c" => Ok(Priority::CouldHave),
            "wont-have" | "won-t-have" | "wont" | "w" => Ok(Priority::WontHave),
            _ => Err(format!(
                "Invalid priority: {}. Use must-have, should-have, could-have or wont-have",
                s
            )),
        }
    }
}

/// A single requirement statement flowing through the workflow
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Requirement {
    pub id: RequirementId,

    /// The requirement statement
    pub text: String,

    #[serde(rename = "type")]
    pub req_type: RequirementType,

    /// Assigned during prioritization
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<Priority>,

    /// Document grouping label used at generation
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub section: Option<String>,

    #[serde(default)]
    pub is_verified: bool,

    #[serde(default)]
    pub is_ambiguous: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ambiguous_reason: Option<String>,
}

impl Requirement {
    /// Creates an unverified requirement, rejecting blank text
    pub fn new(
        id: RequirementId,
        text: impl Into<String>,
        req_type: RequirementType,
    ) -> Result<Self, WorkflowError> {
        let text = text.into();
        if text.trim().is_empty() {
            return Err(WorkflowError::Validation(
                "Please enter requirement text".to_string(),
            ));
        }

        Ok(Self {
            id,
            text,
            req_type,
            priority: None,
            section: None,
            is_verified: false,
            is_ambiguous: false,
            ambiguous_reason: None,
        })
    }

    pub fn verified(mut self) -> Self {
        self.is_verified = true;
        self
    }

    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = Some(priority);
        self
    }

    pub fn with_section(mut self, section: impl Into<String>) -> Self {
        self.section = Some(section.into());
        self
    }

    /// Flags the requirement as ambiguous with the reason shown to reviewers
    pub fn ambiguous(mut self, reason: impl Into<String>) -> Self {
        self.is_ambiguous = true;
        self.ambiguous_reason = Some(reason.into());
        self
    }
}

/// Severity of a user-visible banner
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum AlertSeverity {
    Error,
    Warning,
    Info,
    Success,
}

impl fmt::Display for AlertSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AlertSeverity::Error => write!(f, "error"),
            AlertSeverity::Warning => write!(f, "warning"),
            AlertSeverity::Info => write!(f, "info"),
            AlertSeverity::Success => write!(f, "success"),
        }
    }
}

/// Dismissible banner produced by a view action
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Alert {
    pub severity: AlertSeverity,
    pub message: String,
}

impl Alert {
    pub fn new(severity: AlertSeverity, message: impl Into<String>) -> Self {
        Self {
            severity,
            message: message.into(),
        }
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self::new(AlertSeverity::Success, message)
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self::new(AlertSeverity::Info, message)
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self::new(AlertSeverity::Warning, message)
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::new(AlertSeverity::Error, message)
    }
}

/// Profile of the signed-in user
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UserProfile {
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub role: String,
    #[serde(default)]
    pub department: String,
}

impl UserProfile {
    pub fn new(name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
            role: "member".to_string(),
            department: String::new(),
        }
    }

    /// First letter of the name, used as an avatar
    pub fn initial(&self) -> char {
        self.name
            .chars()
            .next()
            .map(|c| c.to_ascii_uppercase())
            .unwrap_or('?')
    }
}

impl Default for UserProfile {
    fn default() -> Self {
        Self {
            name: "John Doe".to_string(),
            email: "user@example.com".to_string(),
            role: "admin".to_string(),
            department: "Engineering".to_string(),
        }
    }
}

/// Processing state of a document listed on the dashboard
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum DocumentStatus {
    Completed,
    InReview,
    Extracted,
    Prioritized,
}

impl fmt::Display for DocumentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DocumentStatus::Completed => write!(f, "Completed"),
            DocumentStatus::InReview => write!(f, "In Review"),
            DocumentStatus::Extracted => write!(f, "Extracted"),
            DocumentStatus::Prioritized => write!(f, "Prioritized"),
        }
    }
}

/// How a document entered the system
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum SourceKind {
    Pdf,
    Docx,
    ManualEntry,
    WebUrl,
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceKind::Pdf => write!(f, "PDF"),
            SourceKind::Docx => write!(f, "DOCX"),
            SourceKind::ManualEntry => write!(f, "Manual Entry"),
            SourceKind::WebUrl => write!(f, "Web URL"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DocumentSummary {
    pub id: u32,
    pub name: String,
    pub date: NaiveDate,
    pub status: DocumentStatus,
    pub source: SourceKind,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct DashboardStats {
    pub total_documents: usize,
    pub completed: usize,
    pub in_progress: usize,
    pub to_review: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_rejects_blank_text() {
        let err = Requirement::new(RequirementId(1), "   ", RequirementType::Functional)
            .unwrap_err();
        assert_eq!(
            err,
            WorkflowError::Validation("Please enter requirement text".to_string())
        );
    }

    #[test]
    fn test_new_starts_unverified_and_unprioritized() {
        let req =
            Requirement::new(RequirementId(3), "Users can log in", RequirementType::Functional)
                .unwrap();
        assert!(!req.is_verified);
        assert!(!req.is_ambiguous);
        assert_eq!(req.priority, None);
        assert_eq!(req.section, None);
    }

    #[test]
    fn test_doc_label_is_zero_padded() {
        assert_eq!(RequirementId(7).doc_label(), "REQ-007");
        assert_eq!(RequirementId(1234).doc_label(), "REQ-1234");
    }

    #[test]
    fn test_priority_parsing() {
        assert_eq!("must-have".parse::<Priority>(), Ok(Priority::MustHave));
        assert_eq!("Won't Have".parse::<Priority>(), Ok(Priority::WontHave));
        assert_eq!("could_have".parse::<Priority>(), Ok(Priority::CouldHave));
        assert!("urgent".parse::<Priority>().is_err());
    }

    #[test]
    fn test_type_parsing() {
        assert_eq!(
            "non-functional".parse::<RequirementType>(),
            Ok(RequirementType::NonFunctional)
        );
        assert_eq!(
            "Functional".parse::<RequirementType>(),
            Ok(RequirementType::Functional)
        );
        assert!("system".parse::<RequirementType>().is_err());
    }

    #[test]
    fn test_requirement_json_shape() {
        let req = Requirement::new(
            RequirementId(8),
            "The application should be highly available.",
            RequirementType::NonFunctional,
        )
        .unwrap()
        .ambiguous("needs specific uptime percentage")
        .with_priority(Priority::ShouldHave);

        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(json["id"], 8);
        assert_eq!(json["type"], "non-functional");
        assert_eq!(json["priority"], "should-have");
        assert_eq!(json["is_ambiguous"], true);
        assert!(json.get("section").is_none());
    }

    #[test]
    fn test_profile_initial() {
        assert_eq!(UserProfile::new("sarah smith", "s@example.com").initial(), 'S');
        assert_eq!(UserProfile::new("", "x@example.com").initial(), '?');
    }
}
