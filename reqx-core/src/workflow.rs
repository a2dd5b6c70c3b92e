//! Requirement workflow store
//!
//! Holds the requirement set of the mounted stage in two type-partitioned
//! collections and exposes the mutations, derived counts and stage gates
//! used by the review, prioritization and generation views.
//!
//! All operations are synchronous and all-or-nothing: a call either applies
//! fully or returns an error with the store untouched.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

use crate::error::WorkflowError;
use crate::models::{Priority, Requirement, RequirementId, RequirementType};

/// Section used when a requirement carries no grouping label
pub const DEFAULT_SECTION: &str = "General";

/// Position of a document in the forward-only workflow
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum Stage {
    Input,
    /// Extracted but not yet fully verified
    Extracted,
    Reviewed,
    Prioritized,
    Generated,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Input => write!(f, "Input"),
            Stage::Extracted => write!(f, "Extraction Review"),
            Stage::Reviewed => write!(f, "Prioritization"),
            Stage::Prioritized => write!(f, "Document Generation"),
            Stage::Generated => write!(f, "Generated"),
        }
    }
}

/// Requirement counts per MoSCoW bucket
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct PriorityCounts {
    pub must_have: usize,
    pub should_have: usize,
    pub could_have: usize,
    pub wont_have: usize,
}

impl PriorityCounts {
    pub fn get(&self, priority: Priority) -> usize {
        match priority {
            Priority::MustHave => self.must_have,
            Priority::ShouldHave => self.should_have,
            Priority::CouldHave => self.could_have,
            Priority::WontHave => self.wont_have,
        }
    }

    pub fn sum(&self) -> usize {
        self.must_have + self.should_have + self.could_have + self.wont_have
    }

    fn bump(&mut self, priority: Priority) {
        match priority {
            Priority::MustHave => self.must_have += 1,
            Priority::ShouldHave => self.should_have += 1,
            Priority::CouldHave => self.could_have += 1,
            Priority::WontHave => self.wont_have += 1,
        }
    }
}

/// Derived counts over the current store contents
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct Aggregate {
    pub total: usize,
    pub verified: usize,
    pub ambiguous: usize,
    pub functional: usize,
    pub non_functional: usize,
    pub unprioritized: usize,
    pub priorities: PriorityCounts,
}

/// In-memory requirement collection for the mounted stage
#[derive(Debug, Clone)]
pub struct WorkflowStore {
    functional: Vec<Requirement>,
    non_functional: Vec<Requirement>,
    /// Next id to hand out; never decreases within a session
    next_id: u32,
    stage: Stage,
}

impl Default for WorkflowStore {
    fn default() -> Self {
        Self::new()
    }
}

impl WorkflowStore {
    /// Creates an empty store at the input stage
    pub fn new() -> Self {
        Self {
            functional: Vec::new(),
            non_functional: Vec::new(),
            next_id: 1,
            stage: Stage::Input,
        }
    }

    /// Builds a store from a fixture payload
    pub fn from_requirements(
        requirements: Vec<Requirement>,
        stage: Stage,
    ) -> Result<Self, WorkflowError> {
        let mut store = Self::new();
        store.load(requirements, stage)?;
        Ok(store)
    }

    /// Replaces the contents wholesale, discarding prior edits
    ///
    /// Rejects payloads with duplicate ids and leaves the store untouched.
    pub fn load(
        &mut self,
        requirements: Vec<Requirement>,
        stage: Stage,
    ) -> Result<(), WorkflowError> {
        let mut seen = HashSet::new();
        for req in &requirements {
            if !seen.insert(req.id) {
                return Err(WorkflowError::Validation(format!(
                    "Duplicate requirement id {} in payload",
                    req.id
                )));
            }
        }

        let max_id = requirements.iter().map(|r| r.id.0).max().unwrap_or(0);
        let next_id = max_id.checked_add(1).ok_or_else(|| {
            WorkflowError::Validation(format!(
                "Requirement id {} leaves no room for new requirements",
                max_id
            ))
        })?;
        let (functional, non_functional): (Vec<_>, Vec<_>) = requirements
            .into_iter()
            .partition(|r| r.req_type == RequirementType::Functional);

        log::debug!(
            "Loaded {} functional and {} non-functional requirements at stage {}",
            functional.len(),
            non_functional.len(),
            stage
        );

        self.functional = functional;
        self.non_functional = non_functional;
        self.next_id = next_id;
        self.stage = stage;
        Ok(())
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    pub fn functional(&self) -> &[Requirement] {
        &self.functional
    }

    pub fn non_functional(&self) -> &[Requirement] {
        &self.non_functional
    }

    pub fn partition(&self, req_type: RequirementType) -> &[Requirement] {
        match req_type {
            RequirementType::Functional => &self.functional,
            RequirementType::NonFunctional => &self.non_functional,
        }
    }

    fn partition_mut(&mut self, req_type: RequirementType) -> &mut Vec<Requirement> {
        match req_type {
            RequirementType::Functional => &mut self.functional,
            RequirementType::NonFunctional => &mut self.non_functional,
        }
    }

    /// Iterates functional requirements first, then non-functional
    pub fn all(&self) -> impl Iterator<Item = &Requirement> {
        self.functional.iter().chain(self.non_functional.iter())
    }

    /// All requirements ordered by id
    pub fn sorted_by_id(&self) -> Vec<&Requirement> {
        let mut reqs: Vec<&Requirement> = self.all().collect();
        reqs.sort_by_key(|r| r.id);
        reqs
    }

    pub fn len(&self) -> usize {
        self.functional.len() + self.non_functional.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Finds which partition holds `id` and where
    fn locate(&self, id: RequirementId) -> Option<(RequirementType, usize)> {
        if let Some(pos) = self.functional.iter().position(|r| r.id == id) {
            return Some((RequirementType::Functional, pos));
        }
        self.non_functional
            .iter()
            .position(|r| r.id == id)
            .map(|pos| (RequirementType::NonFunctional, pos))
    }

    pub fn get(&self, id: RequirementId) -> Option<&Requirement> {
        self.locate(id)
            .map(|(req_type, pos)| &self.partition(req_type)[pos])
    }

    fn get_mut(&mut self, id: RequirementId) -> Result<&mut Requirement, WorkflowError> {
        let (req_type, pos) = self.locate(id).ok_or(WorkflowError::NotFound(id))?;
        Ok(&mut self.partition_mut(req_type)[pos])
    }

    // =========================================================================
    // Mutations
    // =========================================================================

    /// Marks a requirement as verified. Verifying twice is a no-op.
    pub fn verify(&mut self, id: RequirementId) -> Result<(), WorkflowError> {
        let req = self.get_mut(id)?;
        if !req.is_verified {
            req.is_verified = true;
            log::debug!("Verified requirement {}", id);
        }
        Ok(())
    }

    /// Rewrites a requirement, moving it to the other partition when the
    /// type changes. An edited requirement counts as reviewed: it becomes
    /// verified and loses its ambiguity flag.
    pub fn edit(
        &mut self,
        id: RequirementId,
        new_text: &str,
        new_type: RequirementType,
    ) -> Result<(), WorkflowError> {
        if new_text.trim().is_empty() {
            return Err(WorkflowError::Validation(
                "Please enter requirement text".to_string(),
            ));
        }
        let (current_type, pos) = self.locate(id).ok_or(WorkflowError::NotFound(id))?;

        let apply = |req: &mut Requirement| {
            req.text = new_text.to_string();
            req.req_type = new_type;
            req.is_verified = true;
            req.is_ambiguous = false;
            req.ambiguous_reason = None;
        };

        if current_type == new_type {
            apply(&mut self.partition_mut(current_type)[pos]);
        } else {
            let mut req = self.partition_mut(current_type).remove(pos);
            apply(&mut req);
            self.partition_mut(new_type).push(req);
            log::debug!(
                "Moved requirement {} from {} to {}",
                id,
                current_type,
                new_type
            );
        }
        Ok(())
    }

    /// Removes a requirement. There is no undo.
    pub fn delete(&mut self, id: RequirementId) -> Result<Requirement, WorkflowError> {
        let (req_type, pos) = self.locate(id).ok_or(WorkflowError::NotFound(id))?;
        let removed = self.partition_mut(req_type).remove(pos);
        log::debug!("Deleted requirement {}", id);
        Ok(removed)
    }

    /// Adds a reviewer-authored requirement and returns its id
    pub fn add(
        &mut self,
        text: &str,
        req_type: RequirementType,
    ) -> Result<RequirementId, WorkflowError> {
        let id = RequirementId(self.next_id);
        let next_id = self.next_id.checked_add(1).ok_or_else(|| {
            WorkflowError::Validation("No requirement ids left to assign".to_string())
        })?;
        let req = Requirement::new(id, text, req_type)?.verified();

        self.next_id = next_id;
        self.partition_mut(req_type).push(req);
        log::debug!("Added requirement {} ({})", id, req_type);
        Ok(id)
    }

    pub fn set_priority(
        &mut self,
        id: RequirementId,
        priority: Priority,
    ) -> Result<(), WorkflowError> {
        self.get_mut(id)?.priority = Some(priority);
        Ok(())
    }

    // =========================================================================
    // Derived views
    // =========================================================================

    /// Recomputes counts from the current contents
    pub fn aggregate(&self) -> Aggregate {
        let mut agg = Aggregate {
            functional: self.functional.len(),
            non_functional: self.non_functional.len(),
            ..Aggregate::default()
        };

        for req in self.all() {
            agg.total += 1;
            if req.is_verified {
                agg.verified += 1;
            }
            if req.is_ambiguous {
                agg.ambiguous += 1;
            }
            match req.priority {
                Some(p) => agg.priorities.bump(p),
                None => agg.unprioritized += 1,
            }
        }

        agg
    }

    /// Groups requirements by section in order of first appearance by id
    pub fn group_by_section(&self) -> Vec<(String, Vec<&Requirement>)> {
        let mut groups: Vec<(String, Vec<&Requirement>)> = Vec::new();

        for req in self.sorted_by_id() {
            let section = req.section.as_deref().unwrap_or(DEFAULT_SECTION);
            match groups.iter_mut().find(|(name, _)| name == section) {
                Some((_, reqs)) => reqs.push(req),
                None => groups.push((section.to_string(), vec![req])),
            }
        }

        groups
    }

    // =========================================================================
    // Stage gates
    // =========================================================================

    /// Passes when every requirement has been verified
    pub fn can_advance_from_review(&self) -> Result<(), WorkflowError> {
        let unverified = self.all().filter(|r| !r.is_verified).count();
        if unverified == 0 {
            return Ok(());
        }

        Err(WorkflowError::GateNotSatisfied {
            stage: Stage::Extracted,
            reason: format!(
                "{} of {} requirements are not verified. Please verify all requirements before proceeding.",
                unverified,
                self.len()
            ),
        })
    }

    /// Passes when every requirement carries a priority
    pub fn can_advance_from_prioritization(&self) -> Result<(), WorkflowError> {
        let missing = self.all().filter(|r| r.priority.is_none()).count();
        if missing == 0 {
            return Ok(());
        }

        Err(WorkflowError::GateNotSatisfied {
            stage: Stage::Reviewed,
            reason: format!(
                "{} of {} requirements have no priority. Please assign a priority to all requirements before proceeding.",
                missing,
                self.len()
            ),
        })
    }

    /// Moves one stage forward if the current stage's gate holds
    pub fn advance(&mut self) -> Result<Stage, WorkflowError> {
        let next = match self.stage {
            Stage::Input => Stage::Extracted,
            Stage::Extracted => {
                self.can_advance_from_review()?;
                Stage::Reviewed
            }
            Stage::Reviewed => {
                self.can_advance_from_prioritization()?;
                Stage::Prioritized
            }
            Stage::Prioritized => Stage::Generated,
            Stage::Generated => {
                return Err(WorkflowError::GateNotSatisfied {
                    stage: Stage::Generated,
                    reason: "The document has already been generated.".to_string(),
                })
            }
        };

        log::info!("Workflow advanced from {} to {}", self.stage, next);
        self.stage = next;
        Ok(next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn req(id: u32, req_type: RequirementType) -> Requirement {
        Requirement::new(RequirementId(id), format!("Requirement {}", id), req_type).unwrap()
    }

    /// 5 functional (ids 1-5) + 3 non-functional (ids 6-8), all unverified
    fn review_store() -> WorkflowStore {
        let mut reqs: Vec<Requirement> =
            (1..=5).map(|i| req(i, RequirementType::Functional)).collect();
        reqs.extend((6..=8).map(|i| req(i, RequirementType::NonFunctional)));
        WorkflowStore::from_requirements(reqs, Stage::Extracted).unwrap()
    }

    fn ids(reqs: &[Requirement]) -> Vec<u32> {
        reqs.iter().map(|r| r.id.0).collect()
    }

    #[test]
    fn test_load_partitions_by_type() {
        let store = review_store();
        assert_eq!(ids(store.functional()), vec![1, 2, 3, 4, 5]);
        assert_eq!(ids(store.non_functional()), vec![6, 7, 8]);
        assert_eq!(store.stage(), Stage::Extracted);
    }

    #[test]
    fn test_load_rejects_duplicate_ids() {
        let mut store = review_store();
        let dupes = vec![
            req(1, RequirementType::Functional),
            req(1, RequirementType::NonFunctional),
        ];
        assert!(matches!(
            store.load(dupes, Stage::Extracted),
            Err(WorkflowError::Validation(_))
        ));
        assert_eq!(store.len(), 8);
    }

    #[test]
    fn test_load_rejects_id_at_counter_limit() {
        let mut store = review_store();
        let result = store.load(
            vec![req(u32::MAX, RequirementType::Functional)],
            Stage::Reviewed,
        );
        assert!(matches!(result, Err(WorkflowError::Validation(_))));
        assert_eq!(store.len(), 8);
        assert_eq!(store.stage(), Stage::Extracted);
        assert_eq!(
            store.add("Still works", RequirementType::Functional),
            Ok(RequirementId(9))
        );
    }

    #[test]
    fn test_add_stops_when_ids_run_out() {
        let mut store = WorkflowStore::from_requirements(
            vec![req(u32::MAX - 1, RequirementType::Functional)],
            Stage::Extracted,
        )
        .unwrap();

        let last = store.add("Last one", RequirementType::Functional).unwrap();
        assert_eq!(last, RequirementId(u32::MAX));

        let err = store.add("One too many", RequirementType::NonFunctional);
        assert!(matches!(err, Err(WorkflowError::Validation(_))));
        assert_eq!(store.len(), 2);
        assert!(store.non_functional().is_empty());
    }

    #[test]
    fn test_review_gate_scenario() {
        let mut store = review_store();

        let err = store.can_advance_from_review().unwrap_err();
        assert!(err.to_string().contains("8 of 8"));

        for id in 1..=8 {
            store.verify(RequirementId(id)).unwrap();
        }
        assert!(store.can_advance_from_review().is_ok());
    }

    #[test]
    fn test_review_gate_fails_iff_any_unverified() {
        let mut store = review_store();
        for id in 1..=7 {
            store.verify(RequirementId(id)).unwrap();
        }
        let err = store.can_advance_from_review().unwrap_err();
        assert!(err.to_string().starts_with("1 of 8"));

        store.verify(RequirementId(8)).unwrap();
        assert!(store.can_advance_from_review().is_ok());
    }

    #[test]
    fn test_verify_is_idempotent() {
        let mut once = review_store();
        once.verify(RequirementId(2)).unwrap();

        let mut twice = review_store();
        twice.verify(RequirementId(2)).unwrap();
        twice.verify(RequirementId(2)).unwrap();

        assert_eq!(once.functional(), twice.functional());
        assert_eq!(once.non_functional(), twice.non_functional());
    }

    #[test]
    fn test_verify_unknown_id() {
        let mut store = review_store();
        assert_eq!(
            store.verify(RequirementId(99)),
            Err(WorkflowError::NotFound(RequirementId(99)))
        );
    }

    #[test]
    fn test_edit_moves_between_partitions() {
        let mut store = WorkflowStore::from_requirements(
            vec![
                req(1, RequirementType::Functional),
                req(4, RequirementType::Functional)
                    .ambiguous("vague")
                    .with_priority(Priority::ShouldHave)
                    .with_section("User Management"),
                req(6, RequirementType::NonFunctional),
            ],
            Stage::Extracted,
        )
        .unwrap();
        let functional_before = store.functional().len();
        let non_functional_before = store.non_functional().len();

        store
            .edit(RequirementId(4), "New text", RequirementType::NonFunctional)
            .unwrap();

        assert_eq!(store.functional().len(), functional_before - 1);
        assert_eq!(store.non_functional().len(), non_functional_before + 1);
        assert!(!ids(store.functional()).contains(&4));
        assert_eq!(ids(store.non_functional()), vec![6, 4]);

        let moved = store.get(RequirementId(4)).unwrap();
        assert_eq!(moved.text, "New text");
        assert_eq!(moved.req_type, RequirementType::NonFunctional);
        assert!(moved.is_verified);
        assert!(!moved.is_ambiguous);
        assert_eq!(moved.ambiguous_reason, None);
        assert_eq!(moved.priority, Some(Priority::ShouldHave));
        assert_eq!(moved.section.as_deref(), Some("User Management"));
    }

    #[test]
    fn test_edit_in_place_keeps_position_and_priority() {
        let mut store = WorkflowStore::from_requirements(
            vec![
                req(1, RequirementType::Functional).with_priority(Priority::CouldHave),
                req(2, RequirementType::Functional),
            ],
            Stage::Extracted,
        )
        .unwrap();

        store
            .edit(RequirementId(1), "Reworded", RequirementType::Functional)
            .unwrap();

        assert_eq!(ids(store.functional()), vec![1, 2]);
        let edited = store.get(RequirementId(1)).unwrap();
        assert_eq!(edited.text, "Reworded");
        assert_eq!(edited.priority, Some(Priority::CouldHave));
    }

    #[test]
    fn test_edit_with_blank_text_changes_nothing() {
        let mut store = review_store();
        let before = store.clone();

        let err = store
            .edit(RequirementId(3), "  ", RequirementType::NonFunctional)
            .unwrap_err();

        assert!(matches!(err, WorkflowError::Validation(_)));
        assert_eq!(store.functional(), before.functional());
        assert_eq!(store.non_functional(), before.non_functional());
    }

    #[test]
    fn test_add_blank_text_is_rejected() {
        let mut store = review_store();
        let err = store.add("", RequirementType::Functional).unwrap_err();
        assert_eq!(err.to_string(), "Please enter requirement text");
        assert_eq!(store.len(), 8);

        assert!(store.add(" \t ", RequirementType::NonFunctional).is_err());
        assert_eq!(store.len(), 8);
    }

    #[test]
    fn test_add_issues_larger_id() {
        let mut store = review_store();
        let max_before = store.all().map(|r| r.id).max().unwrap();

        let id = store
            .add("Admins can export audit logs", RequirementType::Functional)
            .unwrap();

        assert_eq!(store.len(), 9);
        assert!(id > max_before);
        let added = store.get(id).unwrap();
        assert!(added.is_verified);
        assert!(!added.is_ambiguous);
        assert_eq!(store.functional().last().unwrap().id, id);
    }

    #[test]
    fn test_ids_are_not_reused_after_delete() {
        let mut store = review_store();
        let first = store.add("First", RequirementType::Functional).unwrap();
        store.delete(first).unwrap();
        store.delete(RequirementId(8)).unwrap();

        let second = store.add("Second", RequirementType::NonFunctional).unwrap();
        assert!(second > first);
    }

    #[test]
    fn test_delete_removes_only_target() {
        let mut store = review_store();
        let before: Vec<Requirement> = store.all().cloned().collect();

        let removed = store.delete(RequirementId(7)).unwrap();
        assert_eq!(removed.id, RequirementId(7));
        assert_eq!(store.len(), 7);
        assert!(store.get(RequirementId(7)).is_none());

        for original in before.iter().filter(|r| r.id != RequirementId(7)) {
            assert_eq!(store.get(original.id), Some(original));
        }
    }

    #[test]
    fn test_delete_unknown_id() {
        let mut store = review_store();
        assert!(store.delete(RequirementId(42)).is_err());
        assert_eq!(store.len(), 8);
    }

    #[test]
    fn test_priority_counts_sum_to_total() {
        let reqs: Vec<Requirement> = (1..=10)
            .map(|i| req(i, RequirementType::Functional).verified())
            .collect();
        let mut store = WorkflowStore::from_requirements(reqs, Stage::Reviewed).unwrap();

        for id in 1..=10u32 {
            let priority = Priority::ALL[(id as usize) % 4];
            store.set_priority(RequirementId(id), priority).unwrap();
        }

        let agg = store.aggregate();
        assert_eq!(agg.priorities.sum(), 10);
        assert_eq!(agg.unprioritized, 0);
        assert_eq!(agg.priorities.get(Priority::ShouldHave), 3);
    }

    #[test]
    fn test_prioritization_gate_fails_iff_any_missing() {
        let reqs: Vec<Requirement> = (1..=3)
            .map(|i| req(i, RequirementType::Functional).verified())
            .collect();
        let mut store = WorkflowStore::from_requirements(reqs, Stage::Reviewed).unwrap();

        store.set_priority(RequirementId(1), Priority::MustHave).unwrap();
        store.set_priority(RequirementId(2), Priority::WontHave).unwrap();
        let err = store.can_advance_from_prioritization().unwrap_err();
        assert!(err.to_string().starts_with("1 of 3"));

        store.set_priority(RequirementId(3), Priority::CouldHave).unwrap();
        assert!(store.can_advance_from_prioritization().is_ok());
    }

    #[test]
    fn test_aggregate_tracks_mutations() {
        let mut store = review_store();
        assert_eq!(store.aggregate().verified, 0);

        store.verify(RequirementId(1)).unwrap();
        store.add("Extra", RequirementType::NonFunctional).unwrap();

        let agg = store.aggregate();
        assert_eq!(agg.total, 9);
        assert_eq!(agg.verified, 2);
        assert_eq!(agg.functional, 5);
        assert_eq!(agg.non_functional, 4);
    }

    #[test]
    fn test_advance_is_gated_and_forward_only() {
        let mut store = review_store();

        let err = store.advance().unwrap_err();
        assert!(matches!(err, WorkflowError::GateNotSatisfied { stage: Stage::Extracted, .. }));
        assert_eq!(store.stage(), Stage::Extracted);

        for id in 1..=8 {
            store.verify(RequirementId(id)).unwrap();
        }
        assert_eq!(store.advance().unwrap(), Stage::Reviewed);

        assert!(store.advance().is_err());
        assert_eq!(store.stage(), Stage::Reviewed);

        for id in 1..=8 {
            store.set_priority(RequirementId(id), Priority::MustHave).unwrap();
        }
        assert_eq!(store.advance().unwrap(), Stage::Prioritized);
        assert_eq!(store.advance().unwrap(), Stage::Generated);
        assert!(store.advance().is_err());
        assert_eq!(store.stage(), Stage::Generated);
    }

    #[test]
    fn test_group_by_section_keeps_first_appearance_order() {
        let store = WorkflowStore::from_requirements(
            vec![
                req(3, RequirementType::Functional).with_section("Dashboard"),
                req(1, RequirementType::Functional).with_section("Authentication"),
                req(6, RequirementType::NonFunctional).with_section("Performance"),
                req(2, RequirementType::Functional).with_section("Authentication"),
                req(9, RequirementType::Functional),
            ],
            Stage::Prioritized,
        )
        .unwrap();

        let groups = store.group_by_section();
        let names: Vec<&str> = groups.iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names, vec!["Authentication", "Dashboard", "Performance", "General"]);
        assert_eq!(groups[0].1.len(), 2);
    }
}
