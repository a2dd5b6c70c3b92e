//! Document generation and the export collaborator
//!
//! The generated document is rendered as Markdown (document tab) and as
//! spreadsheet rows (table tab). Exporting is simulated: the exporter walks
//! the progress steps and reports success without writing a file.

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;
use uuid::Uuid;

use crate::config::scaled;
use crate::error::WorkflowError;
use crate::models::{Alert, Priority, RequirementType};
use crate::workflow::{PriorityCounts, WorkflowStore};

pub const DEFAULT_TITLE: &str = "Banking App Requirements Specification";
pub const DEFAULT_PROJECT: &str = "Banking App";

/// Target format offered by the export panel
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    Pdf,
    Docx,
    Excel,
    Jira,
}

impl ExportFormat {
    pub const ALL: [ExportFormat; 4] = [
        ExportFormat::Pdf,
        ExportFormat::Docx,
        ExportFormat::Excel,
        ExportFormat::Jira,
    ];

    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Pdf => "pdf",
            ExportFormat::Docx => "docx",
            ExportFormat::Excel => "xlsx",
            ExportFormat::Jira => "csv",
        }
    }

    /// Upper-case selector as shown in the confirmation toast
    pub fn label(&self) -> &'static str {
        match self {
            ExportFormat::Pdf => "PDF",
            ExportFormat::Docx => "DOCX",
            ExportFormat::Excel => "EXCEL",
            ExportFormat::Jira => "JIRA",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            ExportFormat::Pdf => "Export as a structured PDF document for sharing and printing",
            ExportFormat::Docx => "Export as an editable Microsoft Word document",
            ExportFormat::Excel => "Export as Excel for JIRA import or tabular analysis",
            ExportFormat::Jira => "Export directly to JIRA as epics and user stories",
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExportFormat::Pdf => write!(f, "PDF Document"),
            ExportFormat::Docx => write!(f, "Word Document"),
            ExportFormat::Excel => write!(f, "Excel Spreadsheet"),
            ExportFormat::Jira => write!(f, "JIRA Import"),
        }
    }
}

impl FromStr for ExportFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pdf" => Ok(ExportFormat::Pdf),
            "docx" | "word" => Ok(ExportFormat::Docx),
            "excel" | "xlsx" => Ok(ExportFormat::Excel),
            "jira" => Ok(ExportFormat::Jira),
            _ => Err(format!(
                "Invalid format: {}. Use pdf, docx, excel or jira",
                s
            )),
        }
    }
}

/// One requirement line in the generated document
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DocumentEntry {
    /// e.g. "REQ-001"
    pub label: String,
    pub text: String,
    pub req_type: RequirementType,
    pub priority: Priority,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DocumentSection {
    pub name: String,
    pub entries: Vec<DocumentEntry>,
}

/// Row of the spreadsheet view
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SpreadsheetRow {
    pub id: String,
    pub requirement: String,
    #[serde(rename = "type")]
    pub req_type: String,
    pub priority: String,
    pub section: String,
}

/// The requirements document assembled at the generation stage
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GeneratedDocument {
    pub title: String,
    pub version: String,
    pub project: String,
    pub date: NaiveDate,
    pub sections: Vec<DocumentSection>,
    pub priorities: PriorityCounts,
}

impl GeneratedDocument {
    /// Assembles the document; every requirement must carry a priority
    pub fn from_store(store: &WorkflowStore, date: NaiveDate) -> Result<Self, WorkflowError> {
        store.can_advance_from_prioritization()?;

        let sections = store
            .group_by_section()
            .into_iter()
            .map(|(name, reqs)| DocumentSection {
                name,
                entries: reqs
                    .into_iter()
                    .filter_map(|r| {
                        r.priority.map(|priority| DocumentEntry {
                            label: r.id.doc_label(),
                            text: r.text.clone(),
                            req_type: r.req_type,
                            priority,
                        })
                    })
                    .collect(),
            })
            .collect();

        Ok(Self {
            title: DEFAULT_TITLE.to_string(),
            version: "1.0".to_string(),
            project: DEFAULT_PROJECT.to_string(),
            date,
            sections,
            priorities: store.aggregate().priorities,
        })
    }

    pub fn requirement_count(&self) -> usize {
        self.sections.iter().map(|s| s.entries.len()).sum()
    }

    /// Saves an edited title
    pub fn rename(&mut self, title: &str) -> Result<Alert, WorkflowError> {
        let title = title.trim();
        if title.is_empty() {
            return Err(WorkflowError::Validation(
                "Please enter a document title".to_string(),
            ));
        }
        self.title = title.to_string();
        Ok(Alert::success("Document changes saved successfully."))
    }

    pub fn share(&self) -> Alert {
        Alert::success(
            "Document shared successfully. Recipients will receive an email with the link.",
        )
    }

    /// Suggested download name, e.g. "banking-app-requirements-specification.pdf"
    pub fn file_name(&self, format: ExportFormat) -> String {
        let stem: String = self
            .title
            .to_lowercase()
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() { c } else { '-' })
            .collect();
        let stem = stem
            .split('-')
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join("-");
        format!("{}.{}", stem, format.extension())
    }

    pub fn to_markdown(&self) -> String {
        let mut output = String::new();

        output.push_str(&format!("# {}\n\n", self.title));
        output.push_str(&format!(
            "Version: {} | Date: {}\n\nGenerated by Req Extract\n\n",
            self.version,
            self.date.format("%Y-%m-%d")
        ));

        output.push_str("## 1. Introduction\n\n");
        output.push_str(&format!(
            "This document outlines the requirements for the {} project. It captures both functional \
             and non-functional requirements prioritized using the MoSCoW method.\n\n",
            self.project
        ));

        output.push_str("## 2. Requirements\n\n");
        for (index, section) in self.sections.iter().enumerate() {
            output.push_str(&format!("### 2.{}. {}\n\n", index + 1, section.name));
            for entry in &section.entries {
                output.push_str(&format!(
                    "- **{}** {} _({}, {})_\n",
                    entry.label, entry.text, entry.req_type, entry.priority
                ));
            }
            output.push('\n');
        }

        output.push_str("## 3. Prioritization Summary\n\n");
        output.push_str("| Priority | Count |\n|---|---|\n");
        for priority in Priority::ALL {
            output.push_str(&format!(
                "| {} | {} |\n",
                priority,
                self.priorities.get(priority)
            ));
        }

        output
    }

    pub fn rows(&self) -> Vec<SpreadsheetRow> {
        self.sections
            .iter()
            .flat_map(|section| {
                section.entries.iter().map(move |entry| SpreadsheetRow {
                    id: entry.label.clone(),
                    requirement: entry.text.clone(),
                    req_type: entry.req_type.to_string(),
                    priority: entry.priority.to_string(),
                    section: section.name.clone(),
                })
            })
            .collect()
    }
}

/// Errors reported by a [`DocumentExporter`]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExportError {
    #[error("Nothing to export: the document has no requirements")]
    EmptyDocument,

    #[error("Export cancelled")]
    Cancelled,
}

impl From<ExportError> for WorkflowError {
    fn from(e: ExportError) -> Self {
        match e {
            ExportError::Cancelled => WorkflowError::Cancelled,
            other => WorkflowError::Validation(other.to_string()),
        }
    }
}

/// Progress notification emitted while an export runs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExportProgress {
    pub format: ExportFormat,
    pub step: &'static str,
    pub percent: u8,
}

/// Result of a completed export
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ExportReceipt {
    pub id: Uuid,
    pub format: ExportFormat,
    pub file_name: String,
    pub message: String,
}

impl ExportReceipt {
    pub fn to_alert(&self) -> Alert {
        Alert::success(self.message.clone())
    }
}

#[async_trait]
pub trait DocumentExporter: Send + Sync {
    async fn export(
        &self,
        format: ExportFormat,
        document: &GeneratedDocument,
        progress: &(dyn Fn(ExportProgress) + Send + Sync),
    ) -> Result<ExportReceipt, ExportError>;
}

/// Progress steps as (label, from %, to %, tick in ms)
const EXPORT_STEPS: [(&str, u8, u8, u64); 5] = [
    ("Initializing export", 0, 15, 100),
    ("Generating document structure", 15, 35, 50),
    ("Formatting content", 35, 65, 80),
    ("Applying formatting", 65, 85, 60),
    ("Finalizing document", 85, 100, 40),
];

/// Exporter that only animates progress
#[derive(Debug, Clone)]
pub struct SimulatedExporter {
    scale: f64,
}

impl SimulatedExporter {
    /// `scale` multiplies every tick; 0 (or anything unusable) runs instantly
    pub fn new(scale: f64) -> Self {
        Self { scale }
    }

    fn tick(&self, ms: u64) -> Duration {
        scaled(ms, self.scale)
    }
}

impl Default for SimulatedExporter {
    fn default() -> Self {
        Self::new(1.0)
    }
}

#[async_trait]
impl DocumentExporter for SimulatedExporter {
    async fn export(
        &self,
        format: ExportFormat,
        document: &GeneratedDocument,
        progress: &(dyn Fn(ExportProgress) + Send + Sync),
    ) -> Result<ExportReceipt, ExportError> {
        if document.requirement_count() == 0 {
            return Err(ExportError::EmptyDocument);
        }

        log::info!("Exporting '{}' as {}", document.title, format);
        let mut last = None;
        for (step, from, to, tick_ms) in EXPORT_STEPS {
            for percent in from..=to {
                // Step boundaries are shared; report each percentage once
                if last == Some(percent) {
                    continue;
                }
                progress(ExportProgress {
                    format,
                    step,
                    percent,
                });
                last = Some(percent);
                tokio::time::sleep(self.tick(tick_ms)).await;
            }
        }
        tokio::time::sleep(self.tick(500)).await;

        Ok(ExportReceipt {
            id: Uuid::new_v4(),
            format,
            file_name: document.file_name(format),
            message: format!("Document downloaded in {} format.", format.label()),
        })
    }
}

/// Today's date for document headers
pub fn today() -> NaiveDate {
    Utc::now().date_naive()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures;
    use crate::models::RequirementId;
    use crate::workflow::Stage;
    use std::sync::Mutex;

    fn generation_store() -> WorkflowStore {
        WorkflowStore::from_requirements(fixtures::generation_requirements(), Stage::Prioritized)
            .unwrap()
    }

    fn doc() -> GeneratedDocument {
        let date = NaiveDate::from_ymd_opt(2025, 3, 30).unwrap();
        GeneratedDocument::from_store(&generation_store(), date).unwrap()
    }

    #[test]
    fn test_sections_follow_requirement_order() {
        let doc = doc();
        let names: Vec<&str> = doc.sections.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(
            names,
            vec![
                "Authentication",
                "Dashboard",
                "User Interface",
                "Document Management",
                "Performance",
                "Security",
                "Reliability",
                "Integrations",
            ]
        );
        assert_eq!(doc.requirement_count(), 10);
        assert_eq!(doc.priorities.sum(), 10);
    }

    #[test]
    fn test_generation_requires_priorities() {
        let mut store = WorkflowStore::from_requirements(
            fixtures::extracted_requirements(),
            Stage::Extracted,
        )
        .unwrap();
        store.set_priority(RequirementId(1), Priority::MustHave).unwrap();

        let err = GeneratedDocument::from_store(&store, today()).unwrap_err();
        assert!(matches!(err, WorkflowError::GateNotSatisfied { .. }));
    }

    #[test]
    fn test_markdown_layout() {
        let md = doc().to_markdown();
        assert!(md.starts_with("# Banking App Requirements Specification\n"));
        assert!(md.contains("Version: 1.0 | Date: 2025-03-30"));
        assert!(md.contains("### 2.1. Authentication"));
        assert!(md.contains("**REQ-001** The system shall allow users"));
        assert!(md.contains("| Must-Have | 4 |"));
        assert!(md.contains("| Won't Have | 1 |"));
    }

    #[test]
    fn test_rows_cover_every_requirement() {
        let rows = doc().rows();
        assert_eq!(rows.len(), 10);
        assert_eq!(rows[0].id, "REQ-001");
        assert_eq!(rows[0].section, "Authentication");
        assert!(rows.iter().any(|r| r.req_type == "Non-Functional"));
    }

    #[test]
    fn test_rename_and_file_name() {
        let mut doc = doc();
        assert!(doc.rename("   ").is_err());
        assert_eq!(doc.title, DEFAULT_TITLE);

        let alert = doc.rename("Trading Platform: Features v2").unwrap();
        assert_eq!(alert.message, "Document changes saved successfully.");
        assert_eq!(
            doc.file_name(ExportFormat::Excel),
            "trading-platform-features-v2.xlsx"
        );
    }

    #[test]
    fn test_format_parsing() {
        assert_eq!("PDF".parse::<ExportFormat>(), Ok(ExportFormat::Pdf));
        assert_eq!("excel".parse::<ExportFormat>(), Ok(ExportFormat::Excel));
        assert!("odt".parse::<ExportFormat>().is_err());
    }

    #[tokio::test]
    async fn test_simulated_export_reports_every_percent() {
        let exporter = SimulatedExporter::new(0.0);
        let seen = Mutex::new(Vec::new());

        let receipt = exporter
            .export(ExportFormat::Jira, &doc(), &|p: ExportProgress| {
                seen.lock().unwrap().push(p.percent)
            })
            .await
            .unwrap();

        let seen = seen.into_inner().unwrap();
        assert_eq!(seen, (0..=100).collect::<Vec<u8>>());
        assert_eq!(receipt.message, "Document downloaded in JIRA format.");
        assert_eq!(
            receipt.file_name,
            "banking-app-requirements-specification.csv"
        );
    }

    #[tokio::test]
    async fn test_unusable_scale_exports_instantly() {
        for scale in [f64::INFINITY, f64::NAN, -3.0] {
            let receipt = SimulatedExporter::new(scale)
                .export(ExportFormat::Pdf, &doc(), &|_: ExportProgress| {})
                .await
                .unwrap();
            assert_eq!(receipt.format, ExportFormat::Pdf);
        }
    }

    #[tokio::test]
    async fn test_export_of_empty_document_fails() {
        let mut empty = doc();
        empty.sections.clear();
        let err = SimulatedExporter::new(0.0)
            .export(ExportFormat::Pdf, &empty, &|_: ExportProgress| {})
            .await
            .unwrap_err();
        assert_eq!(err, ExportError::EmptyDocument);
    }
}
