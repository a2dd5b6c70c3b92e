//! End-to-end pass through the stage-gated workflow

use reqx_core::auth::{self, Credentials, FixtureAuthenticator};
use reqx_core::backend::{mount, FixtureSource, ViewScope};
use reqx_core::export::{
    DocumentExporter, ExportFormat, ExportProgress, GeneratedDocument, SimulatedExporter,
};
use reqx_core::input::InputSource;
use reqx_core::models::{AlertSeverity, Priority, RequirementId, RequirementType};
use reqx_core::navigation::{self, View};
use reqx_core::session::SessionContext;
use reqx_core::storage::MemoryKeyValueStore;
use reqx_core::workflow::Stage;
use reqx_core::WorkflowError;
use std::sync::atomic::{AtomicU8, Ordering};
use std::time::Duration;

#[tokio::test]
async fn test_full_walkthrough() -> anyhow::Result<()> {
    let source = FixtureSource::default();
    let authenticator = FixtureAuthenticator::default();
    let mut session = SessionContext::initialize(MemoryKeyValueStore::new())?;

    // Protected pages bounce to login until signed in
    assert_eq!(navigation::resolve("/dashboard", false), View::Login);

    let bad = auth::sign_in(&authenticator, &Credentials::new("user@example.com", "nope")).await;
    assert_eq!(bad.unwrap_err().severity(), AlertSeverity::Error);

    let signed_in = auth::sign_in(&authenticator, &Credentials::default()).await?;
    session.login(signed_in)?;
    assert_eq!(
        navigation::resolve("/login", session.is_authenticated()),
        View::Dashboard
    );

    // Input
    let input_scope = ViewScope::new("requirement-input");
    let review = InputSource::Manual("The system shall let users log in.".into())
        .submit(&input_scope, Duration::ZERO)
        .await?;
    drop(input_scope);
    let View::ExtractionReview(document) = review else {
        panic!("expected the review view, got {}", review);
    };

    // Review: two ambiguous requirements block the gate
    let review_scope = ViewScope::new("extraction-review");
    let mut store = mount(&source, &review_scope, document, Stage::Extracted).await?;
    let err = navigation::proceed_from_review(document, &store).unwrap_err();
    assert!(err.to_string().starts_with("2 of 8 requirements are not verified"));

    store.edit(
        RequirementId(4),
        "The interface must follow the corporate UX guidelines.",
        RequirementType::Functional,
    )?;
    store.edit(
        RequirementId(8),
        "The application shall have 99.9% uptime.",
        RequirementType::NonFunctional,
    )?;
    let added = store.add("Users can export reports as CSV.", RequirementType::Functional)?;
    assert_eq!(added, RequirementId(9));

    let next = navigation::proceed_from_review(document, &store)?;
    assert_eq!(next, View::Prioritization(document));
    drop(review_scope);

    // Prioritization view mounts its own fixture; edits above are not carried
    let prio_scope = ViewScope::new("prioritization");
    let mut store = mount(&source, &prio_scope, document, Stage::Reviewed).await?;
    assert_eq!(store.len(), 10);
    assert_eq!(store.aggregate().priorities.sum(), 10);
    store.set_priority(RequirementId(10), Priority::CouldHave)?;
    let next = navigation::proceed_from_prioritization(document, &store)?;
    assert_eq!(next, View::DocumentGeneration(document));
    drop(prio_scope);

    // Generation and export
    let gen_scope = ViewScope::new("document-generation");
    let store = mount(&source, &gen_scope, document, Stage::Prioritized).await?;
    let generated = GeneratedDocument::from_store(&store, reqx_core::export::today())?;
    assert_eq!(generated.rows().len(), 10);

    let last = AtomicU8::new(0);
    let receipt = SimulatedExporter::new(0.0)
        .export(ExportFormat::Pdf, &generated, &|p: ExportProgress| {
            last.store(p.percent, Ordering::SeqCst)
        })
        .await?;
    assert_eq!(last.load(Ordering::SeqCst), 100);
    assert_eq!(receipt.to_alert().message, "Document downloaded in PDF format.");

    session.logout()?;
    assert_eq!(
        navigation::resolve("/document-generation/999", session.is_authenticated()),
        View::Login
    );
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_leaving_a_view_drops_its_fetch() {
    let source = FixtureSource::new(Duration::from_millis(800));
    let scope = ViewScope::new("extraction-review");
    let token = scope.token();

    let pending = tokio::spawn(async move { mount(&source, &scope, 999, Stage::Extracted).await });
    tokio::time::sleep(Duration::from_millis(100)).await;
    token.cancel();

    let result = pending.await.expect("mount task panicked");
    assert_eq!(result.unwrap_err(), WorkflowError::Cancelled);
}
