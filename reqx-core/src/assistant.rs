//! Requirements assistant and AI suggestions
//!
//! Both are canned: the chat answers from a fixed keyword table and the
//! suggestions panel serves two literal batches.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

use crate::backend::ViewScope;
use crate::error::WorkflowError;
use crate::models::{Requirement, RequirementId, RequirementType};
use crate::workflow::WorkflowStore;

pub const GREETING: &str = "Hello! I'm your Requirements Assistant. How can I help you today?";

pub const FALLBACK: &str = "I'm here to help with requirement extraction and management. Feel free \
to ask about creating, organizing, or exporting requirements!";

/// A keyword and the reply it triggers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rule {
    pub keyword: &'static str,
    pub response: &'static str,
}

/// Checked top to bottom; the first keyword contained in the message wins
pub const RULES: [Rule; 6] = [
    Rule {
        keyword: "requirement",
        response: "Good requirements should be specific, measurable, achievable, relevant, and \
                   time-bound (SMART). Need help creating better requirements?",
    },
    Rule {
        keyword: "priorit",
        response: "We use the MoSCoW method for prioritization: Must-Have, Should-Have, \
                   Could-Have, and Won't-Have. This helps teams focus on what's most important.",
    },
    Rule {
        keyword: "extract",
        response: "Our AI can extract requirements from documents, web pages, or manual input. \
                   We then classify them as functional or non-functional and suggest priorities.",
    },
    Rule {
        keyword: "help",
        response: "I can help you with creating requirements, extracting them from documents, \
                   prioritizing, and generating documentation. What do you need assistance with?",
    },
    Rule {
        keyword: "template",
        response: "We offer various templates for different project types including banking \
                   applications, e-commerce websites, and mobile apps. Would you like to use one?",
    },
    Rule {
        keyword: "export",
        response: "You can export your requirements as Word, PDF, or Excel formats. These \
                   formats maintain all prioritization and classification data.",
    },
];

/// Canned reply for a user message
pub fn respond(message: &str) -> &'static str {
    let lowered = message.to_lowercase();
    RULES
        .iter()
        .find(|rule| lowered.contains(rule.keyword))
        .map(|rule| rule.response)
        .unwrap_or(FALLBACK)
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    User,
    Assistant,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChatMessage {
    pub sender: Sender,
    pub text: String,
}

/// Chat transcript, opened with the greeting
#[derive(Debug, Clone)]
pub struct Conversation {
    messages: Vec<ChatMessage>,
}

impl Default for Conversation {
    fn default() -> Self {
        Self::new()
    }
}

impl Conversation {
    pub fn new() -> Self {
        Self {
            messages: vec![ChatMessage {
                sender: Sender::Assistant,
                text: GREETING.to_string(),
            }],
        }
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    /// Posts a message and waits for the reply. Blank messages are ignored
    /// and yield `None`.
    pub async fn send(
        &mut self,
        scope: &ViewScope,
        message: &str,
        typing: Duration,
    ) -> Result<Option<&'static str>, WorkflowError> {
        if message.trim().is_empty() {
            return Ok(None);
        }

        self.messages.push(ChatMessage {
            sender: Sender::User,
            text: message.to_string(),
        });
        // The user's message stays even if the dialog closes mid-reply
        scope.sleep(typing).await?;

        let reply = respond(message);
        self.messages.push(ChatMessage {
            sender: Sender::Assistant,
            text: reply.to_string(),
        });
        Ok(Some(reply))
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum SuggestionKind {
    Clarity,
    Missing,
    Security,
    Conflict,
}

impl fmt::Display for SuggestionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SuggestionKind::Clarity => write!(f, "Clarity Improvement"),
            SuggestionKind::Missing => write!(f, "Missing Requirement"),
            SuggestionKind::Security => write!(f, "Security Enhancement"),
            SuggestionKind::Conflict => write!(f, "Requirement Conflict"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Suggestion {
    pub id: u32,
    #[serde(rename = "type")]
    pub kind: SuggestionKind,
    /// Text being improved; absent for missing requirements
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original: Option<String>,
    pub improved: String,
    pub reasoning: String,
    /// Percentage, 0-100
    pub confidence: u8,
}

impl Suggestion {
    fn new(
        id: u32,
        kind: SuggestionKind,
        original: Option<&str>,
        improved: &str,
        reasoning: &str,
        confidence: u8,
    ) -> Self {
        Self {
            id,
            kind,
            original: original.map(str::to_string),
            improved: improved.to_string(),
            reasoning: reasoning.to_string(),
            confidence,
        }
    }

    pub fn is_high_confidence(&self) -> bool {
        self.confidence > 90
    }
}

#[async_trait]
pub trait SuggestionSource: Send + Sync {
    /// First pass when the panel opens
    async fn analyze(
        &self,
        requirements: &[Requirement],
    ) -> Result<Vec<Suggestion>, WorkflowError>;

    /// "Re-Analyze" button
    async fn reanalyze(
        &self,
        requirements: &[Requirement],
    ) -> Result<Vec<Suggestion>, WorkflowError>;
}

/// Serves the two literal suggestion batches
#[derive(Debug, Clone, Default)]
pub struct FixtureSuggestions {
    analysis_delay: Duration,
    reanalysis_delay: Duration,
}

impl FixtureSuggestions {
    pub fn new(analysis_delay: Duration, reanalysis_delay: Duration) -> Self {
        Self {
            analysis_delay,
            reanalysis_delay,
        }
    }
}

#[async_trait]
impl SuggestionSource for FixtureSuggestions {
    async fn analyze(
        &self,
        requirements: &[Requirement],
    ) -> Result<Vec<Suggestion>, WorkflowError> {
        log::debug!("Analyzing {} requirements", requirements.len());
        tokio::time::sleep(self.analysis_delay).await;
        Ok(initial_suggestions())
    }

    async fn reanalyze(
        &self,
        requirements: &[Requirement],
    ) -> Result<Vec<Suggestion>, WorkflowError> {
        log::debug!("Re-analyzing {} requirements", requirements.len());
        tokio::time::sleep(self.reanalysis_delay).await;
        Ok(reanalysis_suggestions())
    }
}

pub fn initial_suggestions() -> Vec<Suggestion> {
    use SuggestionKind::*;

    vec![
        Suggestion::new(
            1,
            Clarity,
            Some("System should be fast and responsive"),
            "System should respond to user interactions within 300ms",
            "The original requirement is vague. Specifying measurable performance metrics makes \
             this requirement testable.",
            94,
        ),
        Suggestion::new(
            2,
            Missing,
            None,
            "The system shall support data export in CSV and JSON formats",
            "Based on similar requirements for data import, an export requirement is likely \
             needed for completeness.",
            78,
        ),
        Suggestion::new(
            3,
            Security,
            Some("Users must log in to access the system"),
            "Users must authenticate using multi-factor authentication and sessions should \
             expire after 30 minutes of inactivity",
            "Enhanced security practice recommends MFA and session timeout policies for \
             sensitive applications.",
            88,
        ),
    ]
}

pub fn reanalysis_suggestions() -> Vec<Suggestion> {
    use SuggestionKind::*;

    vec![
        Suggestion::new(
            4,
            Clarity,
            Some("System should handle large files"),
            "System should process files up to 500MB in size with no more than 10% increase \
             in response time",
            "The original requirement lacks specific size limitations and performance \
             expectations.",
            91,
        ),
        Suggestion::new(
            5,
            Conflict,
            Some("The system must auto-delete user data after 30 days"),
            "The system must archive user data after 30 days of inactivity and provide admin \
             option to restore or permanently delete",
            "This conflicts with the data retention policy mentioned in REQ-042 which requires \
             keeping user data for 1 year.",
            95,
        ),
    ]
}

fn normalize(text: &str) -> String {
    text.trim().trim_end_matches('.').to_lowercase()
}

/// Applies a suggestion to the store.
///
/// A suggestion whose `original` matches an existing requirement rewrites
/// it in place; anything else is added as a new requirement. Returns the id
/// of the requirement that now holds the improved text.
pub fn apply_suggestion(
    store: &mut WorkflowStore,
    suggestion: &Suggestion,
) -> Result<RequirementId, WorkflowError> {
    let target = suggestion.original.as_deref().and_then(|original| {
        let wanted = normalize(original);
        store
            .all()
            .find(|r| normalize(&r.text) == wanted)
            .map(|r| (r.id, r.req_type))
    });

    match target {
        Some((id, req_type)) => {
            store.edit(id, &suggestion.improved, req_type)?;
            log::info!("Applied suggestion {} to requirement {}", suggestion.id, id);
            Ok(id)
        }
        None => {
            let req_type = match suggestion.kind {
                SuggestionKind::Security => RequirementType::NonFunctional,
                _ => RequirementType::Functional,
            };
            let id = store.add(&suggestion.improved, req_type)?;
            log::info!("Added suggestion {} as requirement {}", suggestion.id, id);
            Ok(id)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures;
    use crate::workflow::Stage;

    #[test]
    fn test_rules_match_in_order() {
        // "requirement" outranks "export"
        assert_eq!(respond("How do I export a requirement?"), RULES[0].response);
        assert_eq!(respond("PRIORITIZE this"), RULES[1].response);
        assert_eq!(respond("can you help"), RULES[3].response);
        assert_eq!(respond("export to word"), RULES[5].response);
        assert_eq!(respond("good morning"), FALLBACK);
    }

    #[tokio::test]
    async fn test_conversation_flow() {
        let scope = ViewScope::new("assistant");
        let mut chat = Conversation::new();
        assert_eq!(chat.messages()[0].text, GREETING);

        assert_eq!(chat.send(&scope, "   ", Duration::ZERO).await, Ok(None));
        assert_eq!(chat.messages().len(), 1);

        let reply = chat
            .send(&scope, "Any templates?", Duration::ZERO)
            .await
            .unwrap();
        assert_eq!(reply, Some(RULES[4].response));
        assert_eq!(chat.messages().len(), 3);
        assert_eq!(chat.messages()[1].sender, Sender::User);
        assert_eq!(chat.messages()[2].sender, Sender::Assistant);
    }

    #[tokio::test]
    async fn test_closed_dialog_drops_reply() {
        let scope = ViewScope::new("assistant");
        scope.unmount();
        let mut chat = Conversation::new();

        let result = chat.send(&scope, "help", Duration::ZERO).await;
        assert_eq!(result, Err(WorkflowError::Cancelled));
        assert_eq!(chat.messages().len(), 2);
    }

    #[tokio::test]
    async fn test_fixture_batches() {
        let source = FixtureSuggestions::default();
        let first = source.analyze(&[]).await.unwrap();
        let ids: Vec<u32> = first.iter().map(|s| s.id).collect();
        assert_eq!(ids, vec![1, 2, 3]);
        assert!(first[1].original.is_none());

        let second = source.reanalyze(&[]).await.unwrap();
        assert_eq!(second.len(), 2);
        assert!(second.iter().all(Suggestion::is_high_confidence));
        assert_eq!(second[1].kind.to_string(), "Requirement Conflict");
    }

    #[test]
    fn test_apply_rewrites_matching_requirement() {
        let mut store = WorkflowStore::from_requirements(
            fixtures::extracted_requirements(),
            Stage::Extracted,
        )
        .unwrap();
        let suggestion = Suggestion::new(
            9,
            SuggestionKind::Clarity,
            Some("the application should be highly available"),
            "The application shall be available 99.9% of the time.",
            "Measurable uptime",
            93,
        );

        let id = apply_suggestion(&mut store, &suggestion).unwrap();
        assert_eq!(id, RequirementId(8));
        assert_eq!(store.len(), 8);
        let req = store.get(id).unwrap();
        assert!(req.is_verified && !req.is_ambiguous);
        assert_eq!(req.req_type, RequirementType::NonFunctional);
    }

    #[test]
    fn test_apply_adds_unmatched_suggestion() {
        let mut store = WorkflowStore::from_requirements(
            fixtures::extracted_requirements(),
            Stage::Extracted,
        )
        .unwrap();

        let security = &initial_suggestions()[2];
        let id = apply_suggestion(&mut store, security).unwrap();
        assert_eq!(id, RequirementId(9));
        assert_eq!(store.non_functional().len(), 4);
        assert_eq!(store.get(id).unwrap().text, security.improved);
    }
}
