//! Requirement input: manual text, file upload, URL and speech
//!
//! Nothing is actually parsed. A valid submission waits out the processing
//! delay and hands back the document the extraction review opens.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::backend::{DocumentId, ViewScope};
use crate::error::WorkflowError;
use crate::models::Alert;
use crate::navigation::View;

pub const MANUAL_DOCUMENT: DocumentId = 999;
pub const FILE_DOCUMENT: DocumentId = 998;
pub const URL_DOCUMENT: DocumentId = 997;

/// Extensions offered by the upload picker
pub const ACCEPTED_EXTENSIONS: [&str; 6] = ["pdf", "doc", "docx", "txt", "xls", "xlsx"];

/// What the speech recognizer "hears"
pub const SPEECH_TRANSCRIPT: &str = "This is the transcribed text from your speech. The system will \
automatically convert all spoken requirements into text format. You can edit this text before \
submitting for extraction.";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", content = "value", rename_all = "kebab-case")]
pub enum InputSource {
    Manual(String),
    /// Only the name is used; the file is never opened
    File(Option<PathBuf>),
    Url(String),
}

impl InputSource {
    pub fn validate(&self) -> Result<(), WorkflowError> {
        let message = match self {
            InputSource::Manual(text) if text.trim().is_empty() => {
                "Please enter some text to process"
            }
            InputSource::File(None) => "Please select a file to upload",
            InputSource::Url(url) if url.trim().is_empty() => "Please enter a URL",
            _ => return Ok(()),
        };
        Err(WorkflowError::Validation(message.to_string()))
    }

    /// Document the extraction review opens for this kind of input
    pub fn target_document(&self) -> DocumentId {
        match self {
            InputSource::Manual(_) => MANUAL_DOCUMENT,
            InputSource::File(_) => FILE_DOCUMENT,
            InputSource::Url(_) => URL_DOCUMENT,
        }
    }

    /// Banner shown while the submission is processed
    pub fn processing_alert(&self) -> Alert {
        match self {
            InputSource::Manual(_) => Alert::success("Processing requirements..."),
            InputSource::File(_) => Alert::success("Uploading and processing file..."),
            InputSource::Url(_) => Alert::success("Extracting content from URL..."),
        }
    }

    /// Submits the input and resolves to the review view
    pub async fn submit(&self, scope: &ViewScope, delay: Duration) -> Result<View, WorkflowError> {
        self.validate()?;
        log::info!("{}", self.processing_alert().message);
        scope.sleep(delay).await?;
        Ok(View::ExtractionReview(self.target_document()))
    }
}

/// Banner shown once a file has been picked
pub fn file_selected(path: &Path) -> Alert {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    Alert::info(format!("File \"{}\" ready for processing", name))
}

pub fn is_accepted_file(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| ACCEPTED_EXTENSIONS.contains(&e.to_lowercase().as_str()))
        .unwrap_or(false)
}

/// Ends a recording: waits for recognition and returns the text for the
/// manual tab
pub async fn transcribe(scope: &ViewScope, delay: Duration) -> Result<String, WorkflowError> {
    log::info!("Recording stopped. Processing speech to text...");
    scope.sleep(delay).await?;
    Ok(SPEECH_TRANSCRIPT.to_string())
}
