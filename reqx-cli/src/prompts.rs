use anyhow::Result;
use inquire::{Confirm, Password, Select, Text};
use std::fmt;

use reqx_core::assistant::Suggestion;
use reqx_core::{Credentials, Priority, Registration, Requirement, RequirementId, RequirementType};

/// Prompts for the login form
pub fn prompt_credentials(email: Option<String>) -> Result<Credentials> {
    let email = match email {
        Some(email) => email,
        None => Text::new("Email:").prompt()?,
    };
    let password = Password::new("Password:")
        .without_confirmation()
        .prompt()?;
    Ok(Credentials::new(email, password))
}

/// Prompts for whatever registration fields were not given as flags
pub fn prompt_registration(
    name: Option<String>,
    email: Option<String>,
    password: Option<String>,
    confirm_password: Option<String>,
) -> Result<Registration> {
    let name = match name {
        Some(name) => name,
        None => Text::new("Full name:").prompt()?,
    };
    let email = match email {
        Some(email) => email,
        None => Text::new("Email:").prompt()?,
    };
    let password = match password {
        Some(password) => password,
        None => Password::new("Password:").without_confirmation().prompt()?,
    };
    let confirm_password = match confirm_password {
        Some(confirm) => confirm,
        None => Password::new("Confirm password:")
            .without_confirmation()
            .prompt()?,
    };

    Ok(Registration {
        name,
        email,
        password,
        confirm_password,
    })
}

/// One line per requirement for selection lists
pub fn requirement_label(req: &Requirement) -> String {
    let mut label = format!("[{}] {}", req.id, req.text);
    if let Some(priority) = req.priority {
        label.push_str(&format!(" ({})", priority));
    }
    if req.is_ambiguous {
        label.push_str(" [ambiguous]");
    } else if !req.is_verified {
        label.push_str(" [unverified]");
    }
    label
}

/// Prompts the user to pick a requirement
pub fn prompt_select_requirement(reqs: &[&Requirement]) -> Result<RequirementId> {
    if reqs.is_empty() {
        anyhow::bail!("No requirements to select");
    }
    let options: Vec<String> = reqs.iter().map(|r| requirement_label(r)).collect();
    let selection = Select::new("Select a requirement:", options).raw_prompt()?;
    Ok(reqs[selection.index].id)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReviewAction {
    Verify,
    Edit,
    Delete,
    Add,
    Suggestions,
    Proceed,
    Quit,
}

impl fmt::Display for ReviewAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReviewAction::Verify => write!(f, "Verify a requirement"),
            ReviewAction::Edit => write!(f, "Edit a requirement"),
            ReviewAction::Delete => write!(f, "Delete a requirement"),
            ReviewAction::Add => write!(f, "Add a requirement"),
            ReviewAction::Suggestions => write!(f, "Apply an AI suggestion"),
            ReviewAction::Proceed => write!(f, "Proceed to prioritization"),
            ReviewAction::Quit => write!(f, "Quit"),
        }
    }
}

pub fn prompt_review_action() -> Result<ReviewAction> {
    let options = vec![
        ReviewAction::Verify,
        ReviewAction::Edit,
        ReviewAction::Delete,
        ReviewAction::Add,
        ReviewAction::Suggestions,
        ReviewAction::Proceed,
        ReviewAction::Quit,
    ];
    Ok(Select::new("Action:", options).prompt()?)
}

fn prompt_type(current: RequirementType) -> Result<RequirementType> {
    let options = vec![RequirementType::Functional, RequirementType::NonFunctional];
    let cursor = options.iter().position(|t| *t == current).unwrap_or(0);
    Ok(Select::new("Type:", options)
        .with_starting_cursor(cursor)
        .prompt()?)
}

/// Prompts for the edit dialog, prefilled with the current values
pub fn prompt_edit_requirement(req: &Requirement) -> Result<(String, RequirementType)> {
    let text = Text::new("Requirement:")
        .with_initial_value(&req.text)
        .prompt()?;
    let req_type = prompt_type(req.req_type)?;
    Ok((text, req_type))
}

pub fn prompt_new_requirement() -> Result<(String, RequirementType)> {
    let text = Text::new("Requirement:").prompt()?;
    let req_type = prompt_type(RequirementType::Functional)?;
    Ok((text, req_type))
}

pub fn prompt_confirm_delete(req: &Requirement) -> Result<bool> {
    Ok(Confirm::new(&format!("Delete requirement {}?", req.id))
        .with_default(false)
        .prompt()?)
}

/// Prompts for a priority, starting at the current one
pub fn prompt_priority(current: Option<Priority>) -> Result<Priority> {
    let options = Priority::ALL.to_vec();
    let cursor = current
        .and_then(|p| options.iter().position(|o| *o == p))
        .unwrap_or(0);
    Ok(Select::new("Priority:", options)
        .with_starting_cursor(cursor)
        .prompt()?)
}

pub fn prompt_continue(message: &str) -> Result<bool> {
    Ok(Confirm::new(message).with_default(true).prompt()?)
}

/// Prompts the user to pick one of the offered suggestions
pub fn prompt_select_suggestion(suggestions: &[Suggestion]) -> Result<Suggestion> {
    if suggestions.is_empty() {
        anyhow::bail!("No suggestions available");
    }
    let options: Vec<String> = suggestions
        .iter()
        .map(|s| format!("{} ({}%): {}", s.kind, s.confidence, s.improved))
        .collect();
    let selection = Select::new("Apply suggestion:", options).raw_prompt()?;
    Ok(suggestions[selection.index].clone())
}
