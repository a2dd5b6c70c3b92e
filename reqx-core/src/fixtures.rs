//! Literal payloads standing in for backend responses

use chrono::NaiveDate;

use crate::models::{
    DashboardStats, DocumentStatus, DocumentSummary, Priority, Requirement, RequirementId,
    RequirementType, SourceKind,
};

fn fixture(id: u32, text: &str, req_type: RequirementType) -> Requirement {
    Requirement {
        id: RequirementId(id),
        text: text.to_string(),
        req_type,
        priority: None,
        section: None,
        is_verified: false,
        is_ambiguous: false,
        ambiguous_reason: None,
    }
}

/// Output of the extraction step: 5 functional, 3 non-functional, two of
/// them flagged ambiguous and awaiting verification
pub fn extracted_requirements() -> Vec<Requirement> {
    use RequirementType::*;

    vec![
        fixture(1, "The system shall allow users to login using email and password.", Functional)
            .verified(),
        fixture(2, "Users should be able to reset their password via email.", Functional)
            .verified(),
        fixture(3, "The system must provide a dashboard with recent activities.", Functional)
            .verified(),
        fixture(4, "The application will be nice and user-friendly.", Functional).ambiguous(
            "Vague terminology: \"nice\" and \"user-friendly\" need specific criteria",
        ),
        fixture(5, "Users can upload documents for requirement extraction.", Functional)
            .verified(),
        fixture(6, "The system shall respond to user requests within 2 seconds.", NonFunctional)
            .verified(),
        fixture(7, "User data must be encrypted at rest and during transmission.", NonFunctional)
            .verified(),
        fixture(8, "The application should be highly available.", NonFunctional).ambiguous(
            "Ambiguous term: \"highly available\" - needs specific uptime percentage",
        ),
    ]
}

/// (id, text, type, priority, section) of the reviewed requirement set
const REVIEWED: [(u32, &str, RequirementType, Priority, &str); 10] = [
    (
        1,
        "The system shall allow users to login using email and password.",
        RequirementType::Functional,
        Priority::MustHave,
        "Authentication",
    ),
    (
        2,
        "Users should be able to reset their password via email.",
        RequirementType::Functional,
        Priority::MustHave,
        "Authentication",
    ),
    (
        3,
        "The system must provide a dashboard with recent activities.",
        RequirementType::Functional,
        Priority::ShouldHave,
        "Dashboard",
    ),
    (
        4,
        "The application interface must be intuitive and follow standard UX patterns.",
        RequirementType::Functional,
        Priority::ShouldHave,
        "User Interface",
    ),
    (
        5,
        "Users can upload documents for requirement extraction.",
        RequirementType::Functional,
        Priority::MustHave,
        "Document Management",
    ),
    (
        6,
        "The system shall respond to user requests within 2 seconds.",
        RequirementType::NonFunctional,
        Priority::ShouldHave,
        "Performance",
    ),
    (
        7,
        "User data must be encrypted at rest and during transmission.",
        RequirementType::NonFunctional,
        Priority::MustHave,
        "Security",
    ),
    (
        8,
        "The application should have a 99.9% uptime guarantee.",
        RequirementType::NonFunctional,
        Priority::ShouldHave,
        "Reliability",
    ),
    (
        9,
        "The system should support speech-to-text for requirement input.",
        RequirementType::Functional,
        Priority::CouldHave,
        "User Interface",
    ),
    (
        10,
        "The application should integrate with Slack for notifications.",
        RequirementType::Functional,
        Priority::WontHave,
        "Integrations",
    ),
];

/// Verified requirements with suggested priorities, as the prioritization
/// view receives them
pub fn prioritization_requirements() -> Vec<Requirement> {
    REVIEWED
        .iter()
        .map(|(id, text, req_type, priority, _)| {
            fixture(*id, text, *req_type).verified().with_priority(*priority)
        })
        .collect()
}

/// Prioritized requirements with document sections for generation
pub fn generation_requirements() -> Vec<Requirement> {
    REVIEWED
        .iter()
        .map(|(id, text, req_type, priority, section)| {
            fixture(*id, text, *req_type)
                .verified()
                .with_priority(*priority)
                .with_section(*section)
        })
        .collect()
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap_or_default()
}

pub fn recent_documents() -> Vec<DocumentSummary> {
    vec![
        DocumentSummary {
            id: 1,
            name: "Banking App Requirements".to_string(),
            date: date(2025, 3, 30),
            status: DocumentStatus::Completed,
            source: SourceKind::Pdf,
        },
        DocumentSummary {
            id: 2,
            name: "Trading Platform Features".to_string(),
            date: date(2025, 3, 28),
            status: DocumentStatus::InReview,
            source: SourceKind::ManualEntry,
        },
        DocumentSummary {
            id: 3,
            name: "Security Compliance Doc".to_string(),
            date: date(2025, 3, 25),
            status: DocumentStatus::Extracted,
            source: SourceKind::Docx,
        },
        DocumentSummary {
            id: 4,
            name: "Mobile App Update Spec".to_string(),
            date: date(2025, 3, 20),
            status: DocumentStatus::Prioritized,
            source: SourceKind::WebUrl,
        },
    ]
}

pub fn dashboard_stats() -> DashboardStats {
    DashboardStats {
        total_documents: 12,
        completed: 7,
        in_progress: 3,
        to_review: 2,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_extraction_fixture_shape() {
        let reqs = extracted_requirements();
        let functional = reqs
            .iter()
            .filter(|r| r.req_type == RequirementType::Functional)
            .count();
        assert_eq!(functional, 5);
        assert_eq!(reqs.len() - functional, 3);
        assert_eq!(reqs.iter().filter(|r| !r.is_verified).count(), 2);
        assert!(reqs
            .iter()
            .filter(|r| r.is_ambiguous)
            .all(|r| r.ambiguous_reason.is_some()));
    }

    #[test]
    fn test_fixture_ids_are_unique() {
        for reqs in [
            extracted_requirements(),
            prioritization_requirements(),
            generation_requirements(),
        ] {
            let ids: HashSet<_> = reqs.iter().map(|r| r.id).collect();
            assert_eq!(ids.len(), reqs.len());
        }
    }

    #[test]
    fn test_generation_fixture_is_complete() {
        assert!(generation_requirements()
            .iter()
            .all(|r| r.is_verified && r.priority.is_some() && r.section.is_some()));
    }
}
