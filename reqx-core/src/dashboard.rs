//! Dashboard document list and the analytics page

use serde::{Deserialize, Serialize};

use crate::backend::DocumentId;
use crate::fixtures;
use crate::models::{DashboardStats, DocumentSummary, Priority};
use crate::navigation::{self, View};
use crate::workflow::{Aggregate, WorkflowStore};

/// Recent documents and headline counts
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dashboard {
    pub documents: Vec<DocumentSummary>,
    pub stats: DashboardStats,
}

impl Default for Dashboard {
    fn default() -> Self {
        Self {
            documents: fixtures::recent_documents(),
            stats: fixtures::dashboard_stats(),
        }
    }
}

impl Dashboard {
    pub fn document(&self, id: DocumentId) -> Option<&DocumentSummary> {
        self.documents.iter().find(|d| d.id == id)
    }

    /// Removes a document from the list. Only the list changes; the stats
    /// are served separately.
    pub fn delete(&mut self, id: DocumentId) -> Option<DocumentSummary> {
        let pos = self.documents.iter().position(|d| d.id == id)?;
        let removed = self.documents.remove(pos);
        log::debug!("Removed document {} from the dashboard", id);
        Some(removed)
    }

    /// Stage view for a listed document
    pub fn open(&self, id: DocumentId) -> Option<View> {
        self.document(id).map(navigation::open_document)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthlyTrend {
    pub month: String,
    pub new_requirements: u32,
    pub completed: u32,
}

/// Figures shown on the analytics page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Analytics {
    pub aggregate: Aggregate,
    /// Share of requirements that are verified and unambiguous, in percent
    pub quality_score: u8,
    pub trend: Vec<MonthlyTrend>,
}

impl Analytics {
    pub fn from_store(store: &WorkflowStore) -> Self {
        let aggregate = store.aggregate();
        let clean = store
            .all()
            .filter(|r| r.is_verified && !r.is_ambiguous)
            .count();
        let quality_score = if aggregate.total == 0 {
            0
        } else {
            (clean * 100 / aggregate.total) as u8
        };

        Self {
            aggregate,
            quality_score,
            trend: trend(),
        }
    }

    /// (priority, count) pairs in MoSCoW order
    pub fn by_priority(&self) -> Vec<(Priority, usize)> {
        Priority::ALL
            .iter()
            .map(|p| (*p, self.aggregate.priorities.get(*p)))
            .collect()
    }
}

fn trend() -> Vec<MonthlyTrend> {
    [
        ("Jan", 12, 8),
        ("Feb", 19, 15),
        ("Mar", 15, 12),
        ("Apr", 22, 18),
        ("May", 30, 25),
        ("Jun", 25, 22),
    ]
    .into_iter()
    .map(|(month, new_requirements, completed)| MonthlyTrend {
        month: month.to_string(),
        new_requirements,
        completed,
    })
    .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflow::Stage;

    #[test]
    fn test_delete_and_open() {
        let mut dashboard = Dashboard::default();
        assert_eq!(dashboard.documents.len(), 4);
        assert_eq!(dashboard.open(4), Some(View::DocumentGeneration(4)));

        let removed = dashboard.delete(2).unwrap();
        assert_eq!(removed.name, "Trading Platform Features");
        assert_eq!(dashboard.documents.len(), 3);
        assert_eq!(dashboard.open(2), None);
        assert!(dashboard.delete(2).is_none());
        assert_eq!(dashboard.stats.total_documents, 12);
    }

    #[test]
    fn test_analytics_over_generation_fixture() {
        let store = WorkflowStore::from_requirements(
            fixtures::generation_requirements(),
            Stage::Prioritized,
        )
        .unwrap();
        let analytics = Analytics::from_store(&store);

        assert_eq!(analytics.aggregate.total, 10);
        assert_eq!(analytics.aggregate.functional, 7);
        assert_eq!(analytics.aggregate.non_functional, 3);
        assert_eq!(analytics.quality_score, 100);
        assert_eq!(
            analytics.by_priority(),
            vec![
                (Priority::MustHave, 4),
                (Priority::ShouldHave, 4),
                (Priority::CouldHave, 1),
                (Priority::WontHave, 1),
            ]
        );
        assert_eq!(analytics.trend.len(), 6);
    }

    #[test]
    fn test_quality_score_counts_ambiguity() {
        let store =
            WorkflowStore::from_requirements(fixtures::extracted_requirements(), Stage::Extracted)
                .unwrap();
        assert_eq!(Analytics::from_store(&store).quality_score, 75);
    }
}
