use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[clap(author, version, about = "Extract, review, prioritize and document requirements")]
pub struct Cli {
    /// Path to the config file (defaults to $REQX_CONFIG or the user config dir)
    #[clap(long, global = true)]
    pub config: Option<PathBuf>,

    /// Skip the simulated backend delays
    #[clap(long, global = true)]
    pub instant: bool,

    /// Log at debug level unless RUST_LOG says otherwise
    #[clap(long, short = 'v', global = true)]
    pub verbose: bool,

    #[clap(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Sign in with email and password
    Login {
        #[clap(long)]
        email: Option<String>,

        #[clap(long)]
        password: Option<String>,

        /// Sign in through the third-party provider
        #[clap(long)]
        google: bool,
    },

    /// Create an account and sign in
    Register {
        #[clap(long)]
        name: Option<String>,

        #[clap(long)]
        email: Option<String>,

        #[clap(long)]
        password: Option<String>,

        #[clap(long)]
        confirm_password: Option<String>,
    },

    /// Request a password reset link
    ForgotPassword {
        #[clap(long)]
        email: Option<String>,
    },

    /// Sign out and forget the stored session
    Logout,

    /// Show the signed-in user
    Whoami,

    /// Recent documents and headline counts
    Dashboard {
        /// Remove a document from the list
        #[clap(long)]
        delete: Option<u32>,

        /// Print the stage view a document opens in
        #[clap(long)]
        open: Option<u32>,

        /// Print as JSON
        #[clap(long)]
        json: bool,
    },

    /// Submit requirements for extraction
    Input {
        /// Requirement text typed in directly
        #[clap(long, conflicts_with_all = ["file", "url", "speech"])]
        text: Option<String>,

        /// Document to upload
        #[clap(long, conflicts_with_all = ["url", "speech"])]
        file: Option<PathBuf>,

        /// Web page to extract from
        #[clap(long, conflicts_with = "speech")]
        url: Option<String>,

        /// Dictate instead of typing
        #[clap(long)]
        speech: bool,
    },

    /// Review extracted requirements
    Review {
        /// Document id from the input step
        #[clap(long, default_value_t = 999)]
        document: u32,

        /// Print the requirements and exit without prompting
        #[clap(long)]
        list: bool,
    },

    /// Assign MoSCoW priorities
    Prioritize {
        #[clap(long, default_value_t = 999)]
        document: u32,

        #[clap(long)]
        list: bool,
    },

    /// Generate and export the requirements document
    Generate(GenerateArgs),

    /// Requirement analytics
    Analytics {
        #[clap(long)]
        json: bool,
    },

    /// Ask the requirements assistant
    Assistant {
        /// Single question; starts a chat when omitted
        message: Option<String>,
    },

    /// AI suggestions for the extracted requirements
    Suggest {
        /// Run the analysis a second time
        #[clap(long)]
        reanalyze: bool,
    },

    /// Show the onboarding tutorial
    Onboarding {
        /// Mark the tutorial as seen without showing it
        #[clap(long)]
        dismiss: bool,
    },

    /// View or change settings
    #[clap(subcommand)]
    Settings(SettingsCommand),

    /// Run the whole workflow end to end without prompts
    Walkthrough,
}

#[derive(Subcommand, Debug)]
pub enum SettingsCommand {
    /// Print preferences and profile
    Show,

    /// Change a preference (ai, jira, slack, email, template)
    Set { name: String, value: String },

    /// Update the profile of the signed-in user
    Profile {
        #[clap(long)]
        name: Option<String>,

        #[clap(long)]
        email: Option<String>,

        #[clap(long)]
        role: Option<String>,

        #[clap(long)]
        department: Option<String>,
    },
}

#[derive(Args, Debug)]
pub struct GenerateArgs {
    #[clap(long, default_value_t = 999)]
    pub document: u32,

    /// Export format: pdf, docx, excel or jira
    #[clap(long)]
    pub format: Option<String>,

    /// Replace the document title
    #[clap(long)]
    pub title: Option<String>,

    /// Show the spreadsheet view instead of the document
    #[clap(long)]
    pub table: bool,

    /// Share the document with collaborators
    #[clap(long)]
    pub share: bool,

    /// Watch collaborator activity for a few updates
    #[clap(long)]
    pub collaborate: bool,

    #[clap(flatten)]
    pub thread: CommentArgs,
}

/// Comment thread actions; any of them loads the thread
#[derive(Args, Debug, Default)]
pub struct CommentArgs {
    /// Show the comment thread
    #[clap(long)]
    pub comments: bool,

    /// Post a comment
    #[clap(long, value_name = "TEXT")]
    pub comment: Option<String>,

    /// Replace the text of a comment
    #[clap(long, num_args = 2, value_names = ["ID", "TEXT"])]
    pub edit_comment: Option<Vec<String>>,

    #[clap(long, value_name = "ID")]
    pub delete_comment: Option<u32>,

    /// Mark a comment resolved, or reopen it
    #[clap(long, value_name = "ID")]
    pub resolve: Option<u32>,
}

impl CommentArgs {
    pub fn requested(&self) -> bool {
        self.comments
            || self.comment.is_some()
            || self.edit_comment.is_some()
            || self.delete_comment.is_some()
            || self.resolve.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn generate_args(args: &[&str]) -> GenerateArgs {
        let argv = ["reqx", "generate"].iter().chain(args.iter());
        match Cli::try_parse_from(argv).unwrap().command {
            Command::Generate(args) => args,
            other => panic!("parsed as {:?}", other),
        }
    }

    #[test]
    fn test_comment_flags() {
        let args = generate_args(&[
            "--comment",
            "Needs a glossary",
            "--edit-comment",
            "2",
            "Reworded",
            "--resolve",
            "1",
        ]);
        assert_eq!(args.document, 999);
        assert_eq!(args.thread.comment.as_deref(), Some("Needs a glossary"));
        assert_eq!(
            args.thread.edit_comment,
            Some(vec!["2".to_string(), "Reworded".to_string()])
        );
        assert_eq!(args.thread.resolve, Some(1));
        assert!(args.thread.requested());
    }

    #[test]
    fn test_plain_generate_skips_thread() {
        let args = generate_args(&["--format", "pdf"]);
        assert_eq!(args.format.as_deref(), Some("pdf"));
        assert!(!args.thread.requested());
        assert!(!args.collaborate);
    }
}
