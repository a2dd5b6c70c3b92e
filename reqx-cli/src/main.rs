mod cli;
mod prompts;

use anyhow::{Context, Result};
use clap::Parser;
use colored::Colorize;
use std::io::Write;
use std::path::{Path, PathBuf};

use reqx_core::assistant::{self, Conversation, FixtureSuggestions, Suggestion, SuggestionSource};
use reqx_core::auth::{self, Authenticator, Credentials, FixtureAuthenticator};
use reqx_core::backend::{self, FixtureSource, RequirementSource, ViewScope};
use reqx_core::config::{get_config_path, AppConfig, DelayConfig};
use reqx_core::dashboard::{Analytics, Dashboard};
use reqx_core::export::{
    self, DocumentExporter, ExportFormat, ExportProgress, GeneratedDocument, SimulatedExporter,
};
use reqx_core::input::{self, InputSource};
use reqx_core::navigation::{self, View};
use reqx_core::comments::{DocumentComments, FixtureComments};
use reqx_core::presence::{self, PresenceState};
use reqx_core::session::{SessionContext, TUTORIAL_STEPS};
use reqx_core::{
    Alert, AlertSeverity, DocumentStatus, FileKeyValueStore, Priority, Requirement,
    RequirementType, Stage, WorkflowError, WorkflowStore,
};

use crate::cli::{Cli, Command, CommentArgs, GenerateArgs, SettingsCommand};
use crate::prompts::ReviewAction;

struct App {
    config: AppConfig,
    config_path: PathBuf,
    session: SessionContext<FileKeyValueStore>,
}

impl App {
    fn authenticator(&self) -> FixtureAuthenticator {
        FixtureAuthenticator::new(
            self.config.demo_credentials.clone(),
            self.config.profile.clone(),
            self.config.delays.auth(),
        )
    }

    fn source(&self) -> FixtureSource {
        FixtureSource::new(self.config.delays.fetch())
    }

    /// Runs the navigation guard; prints the redirect and returns false when
    /// the view is not reachable
    fn enter(&self, view: View) -> bool {
        let resolved = navigation::guard(view, self.session.is_authenticated());
        if resolved != view {
            print_alert(&Alert::warning(format!(
                "{} requires a signed-in user. Run `reqx login` first.",
                view.title()
            )));
            return false;
        }
        println!("{}", view.title().bold());
        true
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config_path = match &cli.config {
        Some(path) => path.clone(),
        None => get_config_path()?,
    };
    let mut config = AppConfig::load_from(&config_path)?;
    if cli.instant {
        config.delays = DelayConfig::instant();
    }

    let store = FileKeyValueStore::new(config.session_file_path()?);
    let session = SessionContext::initialize(store).context("Failed to read session state")?;
    let mut app = App {
        config,
        config_path,
        session,
    };

    match &cli.command {
        Command::Login {
            email,
            password,
            google,
        } => {
            login(&mut app, email, password, *google).await?;
        }
        Command::Register {
            name,
            email,
            password,
            confirm_password,
        } => {
            register(
                &mut app,
                name.clone(),
                email.clone(),
                password.clone(),
                confirm_password.clone(),
            )
            .await?;
        }
        Command::ForgotPassword { email } => {
            forgot_password(&app, email.clone()).await?;
        }
        Command::Logout => {
            app.session.logout()?;
            println!("{}", "Signed out.".green());
        }
        Command::Whoami => match app.session.profile() {
            Some(profile) => {
                println!("{} ({})", profile.name.bold(), profile.email);
                println!("Role: {}", profile.role);
                if !profile.department.is_empty() {
                    println!("Department: {}", profile.department);
                }
            }
            None => println!("{}", "Not signed in.".yellow()),
        },
        Command::Dashboard { delete, open, json } => {
            show_dashboard(&app, *delete, *open, *json).await?;
        }
        Command::Input {
            text,
            file,
            url,
            speech,
        } => {
            submit_input(&app, text, file.as_deref(), url, *speech).await?;
        }
        Command::Review { document, list } => {
            review(&app, *document, *list).await?;
        }
        Command::Prioritize { document, list } => {
            prioritize(&app, *document, *list).await?;
        }
        Command::Generate(args) => {
            generate(&app, args).await?;
        }
        Command::Analytics { json } => {
            show_analytics(&app, *json).await?;
        }
        Command::Assistant { message } => {
            chat(&app, message.as_deref()).await?;
        }
        Command::Suggest { reanalyze } => {
            suggest(&app, *reanalyze).await?;
        }
        Command::Onboarding { dismiss } => {
            onboarding(&mut app, *dismiss)?;
        }
        Command::Settings(settings_cmd) => {
            handle_settings_command(settings_cmd, &mut app)?;
        }
        Command::Walkthrough => {
            walkthrough(&mut app).await?;
        }
    }

    Ok(())
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .init();
}

fn print_alert(alert: &Alert) {
    let message = match alert.severity {
        AlertSeverity::Success => alert.message.green(),
        AlertSeverity::Info => alert.message.blue(),
        AlertSeverity::Warning => alert.message.yellow(),
        AlertSeverity::Error => alert.message.red(),
    };
    println!("{}", message);
}

fn print_error(err: &WorkflowError) {
    print_alert(&err.to_alert());
}

// =============================================================================
// Authentication
// =============================================================================

async fn login(
    app: &mut App,
    email: &Option<String>,
    password: &Option<String>,
    google: bool,
) -> Result<()> {
    if navigation::guard(View::Login, app.session.is_authenticated()) != View::Login {
        if let Some(profile) = app.session.profile() {
            println!("Already signed in as {}.", profile.email.bold());
        }
        return Ok(());
    }

    let authenticator = app.authenticator();
    let result = if google {
        authenticator
            .federated_login()
            .await
            .map_err(WorkflowError::from)
    } else {
        let credentials = match (email, password) {
            (Some(email), Some(password)) => Credentials::new(email.clone(), password.clone()),
            (email, _) => prompts::prompt_credentials(email.clone())?,
        };
        auth::sign_in(&authenticator, &credentials).await
    };

    match result {
        Ok(session) => {
            let name = session.profile.name.clone();
            app.session.login(session)?;
            print_alert(&Alert::success(format!("Welcome, {}!", name)));
            if app.session.needs_onboarding() {
                println!("New here? Run `reqx onboarding` for a quick tour.");
            }
        }
        Err(e) => print_error(&e),
    }
    Ok(())
}

async fn register(
    app: &mut App,
    name: Option<String>,
    email: Option<String>,
    password: Option<String>,
    confirm_password: Option<String>,
) -> Result<()> {
    if navigation::guard(View::Register, app.session.is_authenticated()) != View::Register {
        println!("{}", "Already signed in. Run `reqx logout` first.".yellow());
        return Ok(());
    }

    let registration = prompts::prompt_registration(name, email, password, confirm_password)?;
    match auth::sign_up(&app.authenticator(), &registration).await {
        Ok(session) => {
            let name = session.profile.name.clone();
            app.session.login(session)?;
            print_alert(&Alert::success(format!("Account created. Welcome, {}!", name)));
        }
        Err(e) => print_error(&e),
    }
    Ok(())
}

async fn forgot_password(app: &App, email: Option<String>) -> Result<()> {
    let email = match email {
        Some(email) => email,
        None => inquire::Text::new("Email:").prompt()?,
    };
    match auth::reset_password(&app.authenticator(), &email).await {
        Ok(alert) => print_alert(&alert),
        Err(e) => print_error(&e),
    }
    Ok(())
}

// =============================================================================
// Dashboard and analytics
// =============================================================================

async fn show_dashboard(
    app: &App,
    delete: Option<u32>,
    open: Option<u32>,
    json: bool,
) -> Result<()> {
    if !app.enter(View::Dashboard) {
        return Ok(());
    }

    let scope = ViewScope::new("dashboard");
    if let Err(e) = scope.sleep(app.config.delays.fetch()).await {
        print_error(&e);
        return Ok(());
    }
    let mut dashboard = Dashboard::default();

    if let Some(id) = delete {
        match dashboard.delete(id) {
            Some(doc) => print_alert(&Alert::info(format!("Removed \"{}\"", doc.name))),
            None => print_alert(&Alert::error(format!("No document with id {}", id))),
        }
    }

    if let Some(id) = open {
        match dashboard.open(id) {
            Some(view) => println!("{}", view.path()),
            None => print_alert(&Alert::error(format!("No document with id {}", id))),
        }
        return Ok(());
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&dashboard)?);
        return Ok(());
    }

    if let Some(profile) = app.session.profile() {
        println!("Welcome back, {}", profile.name);
    }
    let stats = &dashboard.stats;
    println!(
        "Documents: {}  Completed: {}  In progress: {}  To review: {}",
        stats.total_documents.to_string().bold(),
        stats.completed.to_string().green(),
        stats.in_progress.to_string().blue(),
        stats.to_review.to_string().yellow()
    );
    println!();

    println!(
        "{:<4} | {:<30} | {:<10} | {:<12} | {:<12}",
        "ID", "Name", "Date", "Status", "Source"
    );
    println!("{}", "-".repeat(80));
    for doc in &dashboard.documents {
        let status = match doc.status {
            DocumentStatus::Completed => doc.status.to_string().green(),
            DocumentStatus::InReview => doc.status.to_string().yellow(),
            DocumentStatus::Extracted => doc.status.to_string().blue(),
            DocumentStatus::Prioritized => doc.status.to_string().magenta(),
        };
        println!(
            "{:<4} | {:<30} | {:<10} | {:<12} | {:<12}",
            doc.id,
            doc.name,
            doc.date.format("%Y-%m-%d"),
            status,
            doc.source
        );
    }
    Ok(())
}

async fn show_analytics(app: &App, json: bool) -> Result<()> {
    if !app.enter(View::Analytics) {
        return Ok(());
    }

    let scope = ViewScope::new("analytics");
    let store = match backend::mount(&app.source(), &scope, 0, Stage::Prioritized).await {
        Ok(store) => store,
        Err(e) => {
            print_error(&e);
            return Ok(());
        }
    };
    let analytics = Analytics::from_store(&store);

    if json {
        println!("{}", serde_json::to_string_pretty(&analytics)?);
        return Ok(());
    }

    let agg = &analytics.aggregate;
    println!("Total requirements:     {}", agg.total);
    println!("Functional:             {}", agg.functional);
    println!("Non-functional:         {}", agg.non_functional);
    println!("Ambiguous:              {}", agg.ambiguous);
    println!("Average quality score:  {}%", analytics.quality_score);
    println!();
    println!("{}", "By priority".bold());
    for (priority, count) in analytics.by_priority() {
        println!("  {:<12} {}", priority.to_string(), count);
    }
    println!();
    println!("{}", "Trend (new / completed)".bold());
    for month in &analytics.trend {
        println!(
            "  {}  {:>3} / {:>3}",
            month.month, month.new_requirements, month.completed
        );
    }
    Ok(())
}

// =============================================================================
// Input and review
// =============================================================================

async fn submit_input(
    app: &App,
    text: &Option<String>,
    file: Option<&Path>,
    url: &Option<String>,
    speech: bool,
) -> Result<()> {
    if !app.enter(View::RequirementInput) {
        return Ok(());
    }

    let scope = ViewScope::new("requirement-input");
    let delay = app.config.delays.processing();

    let source = if speech {
        print_alert(&Alert::info(
            "Recording started. Speak your requirements...",
        ));
        match input::transcribe(&scope, delay).await {
            Ok(transcript) => {
                print_alert(&Alert::success("Speech converted to text successfully"));
                println!("{}", transcript);
                InputSource::Manual(transcript)
            }
            Err(e) => {
                print_error(&e);
                return Ok(());
            }
        }
    } else if let Some(path) = file {
        if !input::is_accepted_file(path) {
            print_alert(&Alert::warning(format!(
                "Unsupported file type. Accepted: {}",
                input::ACCEPTED_EXTENSIONS.join(", ")
            )));
            return Ok(());
        }
        print_alert(&input::file_selected(path));
        InputSource::File(Some(path.to_path_buf()))
    } else if let Some(url) = url {
        InputSource::Url(url.clone())
    } else {
        InputSource::Manual(text.clone().unwrap_or_default())
    };

    if source.validate().is_ok() {
        print_alert(&source.processing_alert());
    }
    match source.submit(&scope, delay).await {
        Ok(View::ExtractionReview(document)) => {
            println!(
                "Requirements extracted. Continue with `reqx review --document {}`.",
                document
            );
        }
        Ok(view) => println!("{}", view.path()),
        Err(e) => print_error(&e),
    }
    Ok(())
}

fn print_requirement(req: &Requirement) {
    let status = if req.is_verified {
        "verified".green()
    } else {
        "unverified".yellow()
    };
    let priority = req
        .priority
        .map(|p| format!(" [{}]", p))
        .unwrap_or_default();
    println!("  {:>3}. {}{} ({})", req.id, req.text, priority, status);
    if let Some(reason) = &req.ambiguous_reason {
        println!("       {}", reason.yellow());
    }
}

fn print_store(store: &WorkflowStore) {
    for req_type in [RequirementType::Functional, RequirementType::NonFunctional] {
        let reqs = store.partition(req_type);
        println!("{}", format!("{} Requirements ({})", req_type, reqs.len()).bold());
        for req in reqs {
            print_requirement(req);
        }
    }
    let agg = store.aggregate();
    println!(
        "{} total, {} verified, {} ambiguous",
        agg.total, agg.verified, agg.ambiguous
    );
}

async fn review(app: &App, document: u32, list: bool) -> Result<()> {
    if !app.enter(View::ExtractionReview(document)) {
        return Ok(());
    }

    let scope = ViewScope::new("extraction-review");
    let mut store =
        match backend::mount(&app.source(), &scope, document, Stage::Extracted).await {
            Ok(store) => store,
            Err(e) => {
                print_error(&e);
                return Ok(());
            }
        };

    print_store(&store);
    if list {
        return Ok(());
    }

    loop {
        println!();
        let outcome = match prompts::prompt_review_action()? {
            ReviewAction::Verify => {
                let id = prompts::prompt_select_requirement(&store.sorted_by_id())?;
                store
                    .verify(id)
                    .map(|_| Alert::success(format!("Requirement {} verified", id)))
            }
            ReviewAction::Edit => {
                let id = prompts::prompt_select_requirement(&store.sorted_by_id())?;
                let Some(req) = store.get(id) else {
                    continue;
                };
                let (text, req_type) = prompts::prompt_edit_requirement(req)?;
                store
                    .edit(id, &text, req_type)
                    .map(|_| Alert::success("Requirement updated successfully"))
            }
            ReviewAction::Delete => {
                let id = prompts::prompt_select_requirement(&store.sorted_by_id())?;
                let confirmed = match store.get(id) {
                    Some(req) => prompts::prompt_confirm_delete(req)?,
                    None => false,
                };
                if !confirmed {
                    continue;
                }
                store
                    .delete(id)
                    .map(|_| Alert::success("Requirement deleted successfully"))
            }
            ReviewAction::Add => {
                let (text, req_type) = prompts::prompt_new_requirement()?;
                store
                    .add(&text, req_type)
                    .map(|id| Alert::success(format!("Requirement {} added successfully", id)))
            }
            ReviewAction::Suggestions => {
                let source = FixtureSuggestions::new(
                    app.config.delays.analysis(),
                    app.config.delays.reanalysis(),
                );
                println!("AI is analyzing your requirements...");
                let reqs: Vec<Requirement> = store.all().cloned().collect();
                match scope.run(source.analyze(&reqs)).await {
                    Ok(suggestions) => {
                        let suggestion = prompts::prompt_select_suggestion(&suggestions)?;
                        assistant::apply_suggestion(&mut store, &suggestion)
                            .map(|id| Alert::success(format!("Suggestion applied to {}", id)))
                    }
                    Err(e) => Err(e),
                }
            }
            ReviewAction::Proceed => match navigation::proceed_from_review(document, &store) {
                Ok(_) => {
                    print_alert(&Alert::success("All requirements verified."));
                    println!(
                        "Continue with `reqx prioritize --document {}`.",
                        document
                    );
                    return Ok(());
                }
                Err(e) => Err(e),
            },
            ReviewAction::Quit => return Ok(()),
        };

        match outcome {
            Ok(alert) => {
                print_alert(&alert);
                print_store(&store);
            }
            Err(e) => print_error(&e),
        }
    }
}

// =============================================================================
// Prioritization and generation
// =============================================================================

fn print_priorities(store: &WorkflowStore) {
    let agg = store.aggregate();
    for priority in Priority::ALL {
        println!(
            "{}",
            format!("{} ({})", priority, agg.priorities.get(priority)).bold()
        );
        println!("  {}", priority.description());
        for req in store.sorted_by_id() {
            if req.priority == Some(priority) {
                println!("  {:>3}. {}", req.id, req.text);
            }
        }
    }
    if agg.unprioritized > 0 {
        println!(
            "{}",
            format!("{} requirements without priority", agg.unprioritized).yellow()
        );
    }
}

async fn prioritize(app: &App, document: u32, list: bool) -> Result<()> {
    if !app.enter(View::Prioritization(document)) {
        return Ok(());
    }

    let scope = ViewScope::new("prioritization");
    let mut store =
        match backend::mount(&app.source(), &scope, document, Stage::Reviewed).await {
            Ok(store) => store,
            Err(e) => {
                print_error(&e);
                return Ok(());
            }
        };

    print_priorities(&store);
    if list {
        return Ok(());
    }

    while prompts::prompt_continue("Change a priority?")? {
        let id = prompts::prompt_select_requirement(&store.sorted_by_id())?;
        let current = store.get(id).and_then(|r| r.priority);
        let priority = prompts::prompt_priority(current)?;
        match store.set_priority(id, priority) {
            Ok(()) => print_priorities(&store),
            Err(e) => print_error(&e),
        }
    }

    match navigation::proceed_from_prioritization(document, &store) {
        Ok(_) => println!(
            "Continue with `reqx generate --document {}`.",
            document
        ),
        Err(e) => print_error(&e),
    }
    Ok(())
}

fn print_progress(progress: ExportProgress) {
    print!("\r{:>3}% {:<32}", progress.percent, progress.step);
    let _ = std::io::stdout().flush();
}

async fn export_document(
    app: &App,
    scope: &ViewScope,
    doc: &GeneratedDocument,
    format: ExportFormat,
) -> Result<()> {
    let exporter = SimulatedExporter::new(app.config.delays.export_scale);
    println!("Exporting as {}...", format);
    let result = scope
        .run(async {
            exporter
                .export(format, doc, &print_progress)
                .await
                .map_err(WorkflowError::from)
        })
        .await;
    println!();

    match result {
        Ok(receipt) => {
            print_alert(&receipt.to_alert());
            println!("Saved as {}", receipt.file_name.bold());
        }
        Err(e) => print_error(&e),
    }
    Ok(())
}

/// Roster plus this many activity updates before `--collaborate` returns
const PRESENCE_UPDATES: usize = 3;

async fn follow_presence(app: &App, scope: &ViewScope) {
    let mut handle = presence::spawn_presence(scope, app.config.delays.presence_scale);
    let mut state = PresenceState::default();
    let mut updates = 0;
    while let Some(event) = handle.next().await {
        state.apply(event);
        let labels: Vec<String> = state.active.iter().map(|u| u.label()).collect();
        println!("Collaborators: {}", labels.join(", "));
        if state.being_edited() {
            println!("  {}", "Document being edited".blue());
        }

        updates += 1;
        if updates > PRESENCE_UPDATES {
            break;
        }
    }
}

fn print_comments(thread: &DocumentComments) {
    println!(
        "{}",
        format!(
            "Document Comments ({} open of {})",
            thread.unresolved(),
            thread.comments().len()
        )
        .bold()
    );
    for comment in thread.comments() {
        let status = if comment.resolved {
            " [resolved]".green().to_string()
        } else {
            String::new()
        };
        println!(
            "  #{} {} {}{}",
            comment.id,
            comment.author.bold(),
            comment.posted_at.format("%Y-%m-%d %H:%M"),
            status
        );
        println!("     {}", comment.text);
        if comment.likes > 0 {
            println!("     {} likes", comment.likes);
        }
        for reply in &comment.replies {
            println!("     > {}: {}", reply.author.bold(), reply.text);
        }
    }
}

async fn comment_thread(
    app: &App,
    scope: &ViewScope,
    document: u32,
    args: &CommentArgs,
) -> Result<()> {
    let source = FixtureComments::new(
        app.config.delays.comments(),
        app.config.delays.comment_save(),
    );
    println!("Loading comments...");
    let mut thread = match DocumentComments::load(&source, scope, document).await {
        Ok(thread) => thread,
        Err(e) => {
            print_error(&e);
            return Ok(());
        }
    };

    if let Some(text) = &args.comment {
        match thread.add(&source, scope, text).await {
            Ok(Some(id)) => print_alert(&Alert::success(format!("Comment #{} posted", id))),
            Ok(None) => print_alert(&Alert::warning("Comment text is empty; nothing posted")),
            Err(e) => print_error(&e),
        }
    }

    if let Some(edit) = &args.edit_comment {
        match edit.as_slice() {
            [id, text] => match id.parse::<u32>() {
                Ok(id) => match thread.edit(&source, scope, id, text).await {
                    Ok(true) => print_alert(&Alert::success(format!("Comment #{} updated", id))),
                    Ok(false) => {
                        print_alert(&Alert::warning("Comment text is empty; nothing changed"))
                    }
                    Err(e) => print_error(&e),
                },
                Err(_) => print_alert(&Alert::error(format!("Invalid comment id '{}'", id))),
            },
            _ => print_alert(&Alert::error("--edit-comment takes an id and a text")),
        }
    }

    if let Some(id) = args.delete_comment {
        match thread.delete(&source, scope, id).await {
            Ok(_) => print_alert(&Alert::success(format!("Comment #{} deleted", id))),
            Err(e) => print_error(&e),
        }
    }

    if let Some(id) = args.resolve {
        match thread.toggle_resolved(id) {
            Ok(true) => print_alert(&Alert::success(format!("Comment #{} resolved", id))),
            Ok(false) => print_alert(&Alert::info(format!("Comment #{} reopened", id))),
            Err(e) => print_error(&e),
        }
    }

    print_comments(&thread);
    Ok(())
}

async fn generate(app: &App, args: &GenerateArgs) -> Result<()> {
    let document = args.document;
    if !app.enter(View::DocumentGeneration(document)) {
        return Ok(());
    }

    let scope = ViewScope::new("document-generation");
    let store =
        match backend::mount(&app.source(), &scope, document, Stage::Prioritized).await {
            Ok(store) => store,
            Err(e) => {
                print_error(&e);
                return Ok(());
            }
        };
    let mut doc = match GeneratedDocument::from_store(&store, export::today()) {
        Ok(doc) => doc,
        Err(e) => {
            print_error(&e);
            return Ok(());
        }
    };

    if let Some(title) = &args.title {
        match doc.rename(title) {
            Ok(alert) => print_alert(&alert),
            Err(e) => print_error(&e),
        }
    }

    if args.table {
        println!(
            "{:<8} | {:<60} | {:<14} | {:<11} | {:<20}",
            "ID", "Requirement", "Type", "Priority", "Section"
        );
        println!("{}", "-".repeat(125));
        for row in doc.rows() {
            println!(
                "{:<8} | {:<60} | {:<14} | {:<11} | {:<20}",
                row.id, row.requirement, row.req_type, row.priority, row.section
            );
        }
    } else {
        println!("{}", doc.to_markdown());
    }

    if args.thread.requested() {
        comment_thread(app, &scope, document, &args.thread).await?;
    }

    if args.collaborate {
        follow_presence(app, &scope).await;
    }

    if args.share {
        print_alert(&doc.share());
    }

    if let Some(format) = &args.format {
        match format.parse::<ExportFormat>() {
            Ok(format) => export_document(app, &scope, &doc, format).await?,
            Err(e) => {
                print_alert(&Alert::error(e));
                for format in ExportFormat::ALL {
                    println!("  {:<8} {}", format.label().to_lowercase(), format.description());
                }
            }
        }
    }
    Ok(())
}

// =============================================================================
// Assistant and suggestions
// =============================================================================

async fn chat(app: &App, message: Option<&str>) -> Result<()> {
    if !app.enter(View::Dashboard) {
        return Ok(());
    }

    let scope = ViewScope::new("assistant");
    let typing = app.config.delays.assistant();
    let mut conversation = Conversation::new();
    println!("{}", assistant::GREETING.cyan());

    if let Some(message) = message {
        match conversation.send(&scope, message, typing).await {
            Ok(Some(reply)) => println!("{}", reply.cyan()),
            Ok(None) => {}
            Err(e) => print_error(&e),
        }
        return Ok(());
    }

    loop {
        let message = inquire::Text::new(">")
            .with_help_message("Ask something about requirements. Empty line to quit.")
            .prompt()?;
        if message.trim().is_empty() {
            break;
        }
        match conversation.send(&scope, &message, typing).await {
            Ok(Some(reply)) => println!("{}", reply.cyan()),
            Ok(None) => {}
            Err(e) => {
                print_error(&e);
                break;
            }
        }
    }
    Ok(())
}

fn print_suggestion(suggestion: &Suggestion) {
    let confidence = format!("{}% confidence", suggestion.confidence);
    let confidence = if suggestion.is_high_confidence() {
        confidence.green()
    } else {
        confidence.blue()
    };
    println!(
        "{} {}",
        suggestion.kind.to_string().bold(),
        confidence
    );
    if let Some(original) = &suggestion.original {
        println!("  Original:  {}", original);
    }
    println!("  Suggested: {}", suggestion.improved.cyan());
    println!("  {}", suggestion.reasoning);
}

async fn suggest(app: &App, reanalyze: bool) -> Result<()> {
    let document = input::MANUAL_DOCUMENT;
    if !app.enter(View::ExtractionReview(document)) {
        return Ok(());
    }

    let scope = ViewScope::new("suggestions");
    let fixtures = app.source();
    let reqs = match scope.run(fixtures.fetch(document, Stage::Extracted)).await {
        Ok(reqs) => reqs,
        Err(e) => {
            print_error(&e);
            return Ok(());
        }
    };

    let source = FixtureSuggestions::new(
        app.config.delays.analysis(),
        app.config.delays.reanalysis(),
    );
    println!("AI is analyzing your requirements...");
    let result = if reanalyze {
        scope.run(source.reanalyze(&reqs)).await
    } else {
        scope.run(source.analyze(&reqs)).await
    };

    match result {
        Ok(suggestions) => {
            for suggestion in &suggestions {
                print_suggestion(suggestion);
                println!();
            }
        }
        Err(e) => print_error(&e),
    }
    Ok(())
}

// =============================================================================
// Onboarding and settings
// =============================================================================

fn onboarding(app: &mut App, dismiss: bool) -> Result<()> {
    if !app.enter(View::Dashboard) {
        return Ok(());
    }

    if !dismiss {
        for (index, (title, body)) in TUTORIAL_STEPS.iter().enumerate() {
            println!(
                "{} {}",
                format!("[{}/{}]", index + 1, TUTORIAL_STEPS.len()).dimmed(),
                title.bold()
            );
            println!("  {}", body);
        }
    }
    app.session.dismiss_onboarding()?;
    Ok(())
}

fn handle_settings_command(cmd: &SettingsCommand, app: &mut App) -> Result<()> {
    if !app.enter(View::Settings) {
        return Ok(());
    }

    match cmd {
        SettingsCommand::Show => {
            let prefs = &app.config.preferences;
            println!("{}", "Preferences".bold());
            println!("  AI assistance:        {}", on_off(prefs.ai_enabled));
            println!("  JIRA integration:     {}", on_off(prefs.jira_enabled));
            println!("  Slack integration:    {}", on_off(prefs.slack_enabled));
            println!("  Email notifications:  {}", on_off(prefs.email_notifications));
            println!("  Template format:      {}", prefs.template_format);
            println!("Config file: {}", app.config_path.display());

            if let Some(profile) = app.session.profile() {
                println!("{}", "Profile".bold());
                println!("  Name:        {}", profile.name);
                println!("  Email:       {}", profile.email);
                println!("  Role:        {}", profile.role);
                println!("  Department:  {}", profile.department);
            }
        }
        SettingsCommand::Set { name, value } => {
            // Reload so command-line overrides such as --instant are not saved
            let mut stored = AppConfig::load_from(&app.config_path)?;
            if let Err(e) = stored.preferences.set(name, value) {
                print_alert(&Alert::error(e.to_string()));
                return Ok(());
            }
            stored.save(&app.config_path)?;
            print_alert(&Alert::success("Settings saved successfully."));
        }
        SettingsCommand::Profile {
            name,
            email,
            role,
            department,
        } => {
            let Some(mut profile) = app.session.profile().cloned() else {
                return Ok(());
            };
            if let Some(name) = name {
                profile.name = name.clone();
            }
            if let Some(email) = email {
                profile.email = email.clone();
            }
            if let Some(role) = role {
                profile.role = role.clone();
            }
            if let Some(department) = department {
                profile.department = department.clone();
            }
            if app.session.update_profile(profile)? {
                print_alert(&Alert::success("Profile information updated successfully."));
            }
        }
    }
    Ok(())
}

fn on_off(value: bool) -> colored::ColoredString {
    if value {
        "on".green()
    } else {
        "off".dimmed()
    }
}

// =============================================================================
// Walkthrough
// =============================================================================

/// Runs every stage with canned answers, stopping at the first failure
async fn walkthrough(app: &mut App) -> Result<()> {
    if !app.session.is_authenticated() {
        let credentials = app.config.demo_credentials.clone();
        let session = auth::sign_in(&app.authenticator(), &credentials).await?;
        app.session.login(session)?;
        print_alert(&Alert::success(format!("Signed in as {}", credentials.email)));
    }
    let source = app.source();

    let scope = ViewScope::new("requirement-input");
    app.enter(View::RequirementInput);
    let input = InputSource::Manual(
        "The system shall allow users to login using email and password.".to_string(),
    );
    print_alert(&input.processing_alert());
    let View::ExtractionReview(document) = input
        .submit(&scope, app.config.delays.processing())
        .await?
    else {
        anyhow::bail!("Input did not open the review view");
    };
    drop(scope);

    let scope = ViewScope::new("extraction-review");
    app.enter(View::ExtractionReview(document));
    let mut store = backend::mount(&source, &scope, document, Stage::Extracted).await?;
    print_store(&store);
    if let Err(e) = navigation::proceed_from_review(document, &store) {
        print_error(&e);
    }
    let pending: Vec<_> = store
        .all()
        .filter(|r| !r.is_verified)
        .map(|r| r.id)
        .collect();
    for id in pending {
        store.verify(id)?;
        print_alert(&Alert::success(format!("Requirement {} verified", id)));
    }
    navigation::proceed_from_review(document, &store)?;
    drop(scope);

    let scope = ViewScope::new("prioritization");
    app.enter(View::Prioritization(document));
    let mut store = backend::mount(&source, &scope, document, Stage::Reviewed).await?;
    let unprioritized: Vec<_> = store
        .all()
        .filter(|r| r.priority.is_none())
        .map(|r| r.id)
        .collect();
    for id in unprioritized {
        store.set_priority(id, Priority::ShouldHave)?;
    }
    print_priorities(&store);
    navigation::proceed_from_prioritization(document, &store)?;
    drop(scope);

    let scope = ViewScope::new("document-generation");
    app.enter(View::DocumentGeneration(document));
    let store = backend::mount(&source, &scope, document, Stage::Prioritized).await?;
    let doc = GeneratedDocument::from_store(&store, export::today())?;
    println!("{}", doc.to_markdown());
    export_document(app, &scope, &doc, ExportFormat::Pdf).await?;
    Ok(())
}
