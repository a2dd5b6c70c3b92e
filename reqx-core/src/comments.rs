//! Comment thread on a generated document
//!
//! The thread is fetched when the generation view mounts. Posting, editing
//! and deleting go through [`CommentSource`] first and only touch the local
//! list once the backend answered, so an unmounted view keeps its list as
//! it was.

use async_trait::async_trait;
use chrono::{Local, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::backend::{DocumentId, ViewScope};
use crate::error::WorkflowError;

pub type CommentId = u32;

/// Author shown on comments posted from this session
pub const LOCAL_AUTHOR: &str = "You";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Reply {
    pub id: CommentId,
    pub text: String,
    pub author: String,
    pub posted_at: NaiveDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Comment {
    pub id: CommentId,
    pub text: String,
    pub author: String,
    pub posted_at: NaiveDateTime,
    #[serde(default)]
    pub resolved: bool,
    #[serde(default)]
    pub likes: u32,
    #[serde(default)]
    pub replies: Vec<Reply>,
}

impl Comment {
    /// Avatar letter
    pub fn initial(&self) -> char {
        self.author.chars().next().unwrap_or('?')
    }
}

#[async_trait]
pub trait CommentSource: Send + Sync {
    async fn fetch(&self, document: DocumentId) -> Result<Vec<Comment>, WorkflowError>;

    async fn post(&self, document: DocumentId, comment: &Comment) -> Result<(), WorkflowError>;

    async fn update(
        &self,
        document: DocumentId,
        id: CommentId,
        text: &str,
    ) -> Result<(), WorkflowError>;

    async fn remove(&self, document: DocumentId, id: CommentId) -> Result<(), WorkflowError>;
}

/// Serves the fixture thread and acknowledges every change after a delay
#[derive(Debug, Clone, Default)]
pub struct FixtureComments {
    fetch_delay: Duration,
    save_delay: Duration,
}

impl FixtureComments {
    pub fn new(fetch_delay: Duration, save_delay: Duration) -> Self {
        Self {
            fetch_delay,
            save_delay,
        }
    }
}

#[async_trait]
impl CommentSource for FixtureComments {
    async fn fetch(&self, document: DocumentId) -> Result<Vec<Comment>, WorkflowError> {
        tokio::time::sleep(self.fetch_delay).await;
        log::debug!("Serving comment thread for document {}", document);
        Ok(fixture_comments())
    }

    async fn post(&self, document: DocumentId, comment: &Comment) -> Result<(), WorkflowError> {
        tokio::time::sleep(self.save_delay).await;
        log::debug!("Posted comment {} on document {}", comment.id, document);
        Ok(())
    }

    async fn update(
        &self,
        document: DocumentId,
        id: CommentId,
        _text: &str,
    ) -> Result<(), WorkflowError> {
        tokio::time::sleep(self.save_delay).await;
        log::debug!("Updated comment {} on document {}", id, document);
        Ok(())
    }

    async fn remove(&self, document: DocumentId, id: CommentId) -> Result<(), WorkflowError> {
        tokio::time::sleep(self.save_delay).await;
        log::debug!("Removed comment {} from document {}", id, document);
        Ok(())
    }
}

fn at(y: i32, m: u32, d: u32, h: u32, min: u32, s: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(y, m, d)
        .and_then(|date| date.and_hms_opt(h, min, s))
        .unwrap_or_default()
}

pub fn fixture_comments() -> Vec<Comment> {
    vec![
        Comment {
            id: 1,
            text: "The security requirements need more detail about authentication mechanisms."
                .to_string(),
            author: "Alex Kim".to_string(),
            posted_at: at(2025, 3, 30, 14, 22, 10),
            resolved: false,
            likes: 2,
            replies: vec![Reply {
                id: 101,
                text: "Added more details about OAuth2 and MFA requirements.".to_string(),
                author: LOCAL_AUTHOR.to_string(),
                posted_at: at(2025, 3, 30, 15, 10, 45),
            }],
        },
        Comment {
            id: 2,
            text: "Performance requirement PR-003 is too vague. Needs more clarity.".to_string(),
            author: "John Doe".to_string(),
            posted_at: at(2025, 3, 30, 16, 0, 0),
            resolved: false,
            likes: 5,
            replies: Vec::new(),
        },
    ]
}

/// The loaded thread, newest first
#[derive(Debug, Clone)]
pub struct DocumentComments {
    document: DocumentId,
    comments: Vec<Comment>,
}

impl DocumentComments {
    /// Fetches the thread for a mounted view
    pub async fn load(
        source: &dyn CommentSource,
        scope: &ViewScope,
        document: DocumentId,
    ) -> Result<Self, WorkflowError> {
        let comments = scope.run(source.fetch(document)).await?;
        Ok(Self { document, comments })
    }

    pub fn comments(&self) -> &[Comment] {
        &self.comments
    }

    pub fn get(&self, id: CommentId) -> Option<&Comment> {
        self.comments.iter().find(|c| c.id == id)
    }

    pub fn unresolved(&self) -> usize {
        self.comments.iter().filter(|c| !c.resolved).count()
    }

    fn position(&self, id: CommentId) -> Result<usize, WorkflowError> {
        self.comments
            .iter()
            .position(|c| c.id == id)
            .ok_or(WorkflowError::CommentNotFound(id))
    }

    /// Posts a comment at the top of the thread. Blank text is ignored and
    /// yields `None`.
    pub async fn add(
        &mut self,
        source: &dyn CommentSource,
        scope: &ViewScope,
        text: &str,
    ) -> Result<Option<CommentId>, WorkflowError> {
        if text.trim().is_empty() {
            return Ok(None);
        }

        // Ids are never reused, even after deletes
        let id = self.comments.iter().map(|c| c.id).max().unwrap_or(0) + 1;
        let comment = Comment {
            id,
            text: text.to_string(),
            author: LOCAL_AUTHOR.to_string(),
            posted_at: Local::now().naive_local(),
            resolved: false,
            likes: 0,
            replies: Vec::new(),
        };
        scope.run(source.post(self.document, &comment)).await?;

        self.comments.insert(0, comment);
        Ok(Some(id))
    }

    /// Rewrites a comment's text. Blank text is ignored and yields `false`.
    pub async fn edit(
        &mut self,
        source: &dyn CommentSource,
        scope: &ViewScope,
        id: CommentId,
        text: &str,
    ) -> Result<bool, WorkflowError> {
        if text.trim().is_empty() {
            return Ok(false);
        }
        self.position(id)?;
        scope.run(source.update(self.document, id, text)).await?;

        let pos = self.position(id)?;
        self.comments[pos].text = text.to_string();
        Ok(true)
    }

    pub async fn delete(
        &mut self,
        source: &dyn CommentSource,
        scope: &ViewScope,
        id: CommentId,
    ) -> Result<Comment, WorkflowError> {
        self.position(id)?;
        scope.run(source.remove(self.document, id)).await?;

        let pos = self.position(id)?;
        Ok(self.comments.remove(pos))
    }

    /// Flips the resolved flag locally and returns the new value
    pub fn toggle_resolved(&mut self, id: CommentId) -> Result<bool, WorkflowError> {
        let pos = self.position(id)?;
        let comment = &mut self.comments[pos];
        comment.resolved = !comment.resolved;
        Ok(comment.resolved)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::Instant;

    async fn loaded(scope: &ViewScope) -> DocumentComments {
        DocumentComments::load(&FixtureComments::default(), scope, 999)
            .await
            .unwrap()
    }

    #[tokio::test(start_paused = true)]
    async fn test_load_waits_for_fixture_thread() {
        let source = FixtureComments::new(Duration::from_millis(1500), Duration::ZERO);
        let scope = ViewScope::new("document-generation");
        let start = Instant::now();

        let thread = DocumentComments::load(&source, &scope, 999).await.unwrap();
        assert!(start.elapsed() >= Duration::from_millis(1500));
        assert_eq!(thread.comments().len(), 2);
        assert_eq!(thread.unresolved(), 2);

        let first = &thread.comments()[0];
        assert_eq!(first.initial(), 'A');
        assert_eq!(first.likes, 2);
        assert_eq!(first.replies[0].author, LOCAL_AUTHOR);
    }

    #[tokio::test]
    async fn test_add_puts_newest_first() {
        let scope = ViewScope::new("document-generation");
        let source = FixtureComments::default();
        let mut thread = loaded(&scope).await;

        let id = thread
            .add(&source, &scope, "Please add a glossary.")
            .await
            .unwrap();
        assert_eq!(id, Some(3));
        let newest = &thread.comments()[0];
        assert_eq!(newest.text, "Please add a glossary.");
        assert_eq!(newest.author, LOCAL_AUTHOR);
        assert_eq!(newest.likes, 0);
        assert!(!newest.resolved);
        assert!(newest.replies.is_empty());

        assert_eq!(thread.add(&source, &scope, "   ").await.unwrap(), None);
        assert_eq!(thread.comments().len(), 3);
    }

    #[tokio::test]
    async fn test_add_after_delete_does_not_reuse_ids() {
        let scope = ViewScope::new("document-generation");
        let source = FixtureComments::default();
        let mut thread = loaded(&scope).await;

        thread.delete(&source, &scope, 1).await.unwrap();
        let id = thread.add(&source, &scope, "Another note").await.unwrap();
        assert_eq!(id, Some(3));
    }

    #[tokio::test]
    async fn test_edit_and_delete() {
        let scope = ViewScope::new("document-generation");
        let source = FixtureComments::default();
        let mut thread = loaded(&scope).await;

        assert!(thread
            .edit(&source, &scope, 2, "PR-003 now has a 2 s target.")
            .await
            .unwrap());
        assert_eq!(thread.get(2).unwrap().text, "PR-003 now has a 2 s target.");

        assert!(!thread.edit(&source, &scope, 2, "").await.unwrap());
        assert_eq!(thread.get(2).unwrap().text, "PR-003 now has a 2 s target.");

        let removed = thread.delete(&source, &scope, 2).await.unwrap();
        assert_eq!(removed.author, "John Doe");
        assert!(thread.get(2).is_none());

        assert_eq!(
            thread.delete(&source, &scope, 2).await.unwrap_err(),
            WorkflowError::CommentNotFound(2)
        );
        assert_eq!(
            thread.edit(&source, &scope, 42, "x").await.unwrap_err(),
            WorkflowError::CommentNotFound(42)
        );
    }

    #[tokio::test]
    async fn test_resolve_toggles() {
        let scope = ViewScope::new("document-generation");
        let mut thread = loaded(&scope).await;

        assert_eq!(thread.toggle_resolved(1), Ok(true));
        assert_eq!(thread.unresolved(), 1);
        assert_eq!(thread.toggle_resolved(1), Ok(false));
        assert_eq!(thread.unresolved(), 2);
        assert_eq!(
            thread.toggle_resolved(9),
            Err(WorkflowError::CommentNotFound(9))
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_unmount_leaves_thread_untouched() {
        let source = FixtureComments::new(Duration::ZERO, Duration::from_millis(1000));
        let scope = ViewScope::new("document-generation");
        let mut thread = DocumentComments::load(&source, &scope, 999).await.unwrap();

        let token = scope.token();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(200)).await;
            token.cancel();
        });

        let result = thread.add(&source, &scope, "Too late").await;
        assert_eq!(result, Err(WorkflowError::Cancelled));
        assert_eq!(thread.comments().len(), 2);
    }
}
