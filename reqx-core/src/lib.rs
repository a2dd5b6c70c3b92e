pub mod assistant;
pub mod auth;
pub mod backend;
pub mod comments;
pub mod config;
pub mod dashboard;
pub mod error;
pub mod export;
pub mod fixtures;
pub mod input;
pub mod models;
pub mod navigation;
pub mod presence;
pub mod session;
pub mod storage;
pub mod workflow;

// Re-export commonly used types
pub use assistant::{
    apply_suggestion, respond, Conversation, FixtureSuggestions, Suggestion, SuggestionKind,
    SuggestionSource,
};
pub use auth::{Authenticator, Credentials, FixtureAuthenticator, Registration};
pub use backend::{mount, DocumentId, FixtureSource, RequirementSource, ViewScope};
pub use comments::{Comment, CommentSource, DocumentComments, FixtureComments};
pub use config::{get_config_path, AppConfig, DelayConfig, Preferences};
pub use dashboard::{Analytics, Dashboard};
pub use error::WorkflowError;
pub use export::{
    DocumentExporter, ExportError, ExportFormat, ExportProgress, ExportReceipt,
    GeneratedDocument, SimulatedExporter,
};
pub use input::InputSource;
pub use models::{
    Alert, AlertSeverity, DocumentStatus, DocumentSummary, Priority, Requirement, RequirementId,
    RequirementType, UserProfile,
};
pub use navigation::View;
pub use presence::{PresenceEvent, PresenceHandle, PresenceState};
pub use session::{Session, SessionContext};
pub use storage::{FileKeyValueStore, KeyValueStore, MemoryKeyValueStore};
pub use workflow::{Aggregate, PriorityCounts, Stage, WorkflowStore};
