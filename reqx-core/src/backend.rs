//! Asynchronous boundary standing in for a backend
//!
//! Views fetch their data through [`RequirementSource`]; the fixture
//! implementation sleeps for a configured delay and returns literal
//! payloads. Every fetch runs inside a [`ViewScope`] whose token is
//! cancelled when the view unmounts, so a late response can never be
//! installed into a disposed view.

use async_trait::async_trait;
use std::future::Future;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use crate::error::WorkflowError;
use crate::fixtures;
use crate::models::Requirement;
use crate::workflow::{Stage, WorkflowStore};

/// Identifier carried in stage routes, e.g. `/extraction-review/999`
pub type DocumentId = u32;

#[async_trait]
pub trait RequirementSource: Send + Sync {
    /// Returns the requirement set a view at `stage` starts from
    async fn fetch(
        &self,
        document: DocumentId,
        stage: Stage,
    ) -> Result<Vec<Requirement>, WorkflowError>;
}

/// Serves the hard-coded fixtures after an artificial delay
#[derive(Debug, Clone, Default)]
pub struct FixtureSource {
    delay: Duration,
}

impl FixtureSource {
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }
}

#[async_trait]
impl RequirementSource for FixtureSource {
    async fn fetch(
        &self,
        document: DocumentId,
        stage: Stage,
    ) -> Result<Vec<Requirement>, WorkflowError> {
        tokio::time::sleep(self.delay).await;
        log::debug!("Serving {} fixture for document {}", stage, document);

        Ok(match stage {
            Stage::Input => Vec::new(),
            Stage::Extracted => fixtures::extracted_requirements(),
            Stage::Reviewed => fixtures::prioritization_requirements(),
            Stage::Prioritized | Stage::Generated => fixtures::generation_requirements(),
        })
    }
}

/// Lifetime of a mounted view
///
/// Dropping the scope cancels everything still running inside it.
#[derive(Debug)]
pub struct ViewScope {
    name: String,
    token: CancellationToken,
}

impl ViewScope {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            token: CancellationToken::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Token for work spawned on behalf of this view
    pub fn token(&self) -> CancellationToken {
        self.token.clone()
    }

    pub fn is_unmounted(&self) -> bool {
        self.token.is_cancelled()
    }

    pub fn unmount(&self) {
        if !self.token.is_cancelled() {
            log::debug!("Unmounting view {}", self.name);
            self.token.cancel();
        }
    }

    /// Runs `fut` unless the view unmounts first
    pub async fn run<T, F>(&self, fut: F) -> Result<T, WorkflowError>
    where
        F: Future<Output = Result<T, WorkflowError>>,
    {
        if self.token.is_cancelled() {
            return Err(WorkflowError::Cancelled);
        }

        tokio::select! {
            biased;
            _ = self.token.cancelled() => {
                log::debug!("Pending work in view {} cancelled", self.name);
                Err(WorkflowError::Cancelled)
            }
            res = fut => res,
        }
    }

    /// Waits out a cosmetic delay unless the view unmounts first
    pub async fn sleep(&self, delay: Duration) -> Result<(), WorkflowError> {
        self.run(async {
            tokio::time::sleep(delay).await;
            Ok(())
        })
        .await
    }
}

impl Drop for ViewScope {
    fn drop(&mut self) {
        self.token.cancel();
    }
}

/// Fetches the stage fixture and builds the store for a freshly mounted
/// view. Each mount starts over, discarding edits from earlier visits.
pub async fn mount(
    source: &dyn RequirementSource,
    scope: &ViewScope,
    document: DocumentId,
    stage: Stage,
) -> Result<WorkflowStore, WorkflowError> {
    let requirements = scope.run(source.fetch(document, stage)).await?;
    WorkflowStore::from_requirements(requirements, stage)
}
