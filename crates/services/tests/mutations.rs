mod support;

use std::{sync::Arc, time::Duration};

use domain::{
    Amount,
    models::{
        costs::{CostFrequency, CreateFixedCost, FixedCost, UpdateFixedCost},
        landing_page::LandingPage,
        lead::{CreateLead, Lead},
    },
};
use services::services::{
    api_client::ApiError,
    dialog::{DialogMode, DialogState},
    mutations::{MutationCommand, MutationError, MutationOutcome, MutationRequest},
    notification::{NotificationService, ToastKind},
    pages::ResourcePage,
    query_cache::{CacheEventKind, QueryCache, Subscription},
    resources::Resource,
};
use support::{RecordingNotifier, StubBackend, context, fixed_cost};

/// Drains whatever the subscription has buffered right now.
async fn drain(events: &mut Subscription) -> Vec<CacheEventKind> {
    let mut kinds = Vec::new();
    while let Ok(Some(event)) =
        tokio::time::timeout(Duration::from_millis(50), events.next()).await
    {
        kinds.push(event.kind);
    }
    kinds
}

fn rent() -> CreateFixedCost {
    CreateFixedCost::new("Rent", "300", CostFrequency::Quarterly)
}

#[tokio::test]
async fn successful_create_invalidates_once_then_closes_and_notifies() {
    let backend = StubBackend::new();
    backend.seed("fixed-costs", vec![fixed_cost("Storage", "80", "monthly", None)]);
    let base = backend.spawn().await;

    let cache = QueryCache::default();
    let probe_cache = cache.clone();
    let notifier = RecordingNotifier::new(move || {
        probe_cache
            .peek::<Vec<FixedCost>>(&FixedCost::list_key())
            .map(|entry| entry.is_stale)
    });
    let mut page = ResourcePage::<FixedCost>::new(&context(&base, &cache, notifier.clone()));
    page.load().await.unwrap().unwrap();

    let mut events = cache.subscribe(vec![FixedCost::list_key()]);
    page.open_create_with(rent()).unwrap();
    let outcome = page.submit().await.unwrap();

    let MutationOutcome::Created(created) = outcome else {
        panic!("expected a created record");
    };
    assert_eq!(created.name, "Rent");
    assert_eq!(page.dialog().state(), &DialogState::Closed);
    assert_eq!(drain(&mut events).await, vec![CacheEventKind::Invalidated]);

    // The toast fires after the list is already marked stale.
    let seen = notifier.seen();
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0].0.kind, ToastKind::Success);
    assert_eq!(seen[0].0.title, "Fixed cost created");
    assert_eq!(seen[0].1, Some(true));

    let rows = page.load().await.unwrap().unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(backend.count("POST", "/api/fixed-costs"), 1);
    assert_eq!(backend.count("GET", "/api/fixed-costs"), 2);
}

#[tokio::test]
async fn read_after_create_includes_the_row_even_with_a_load_in_flight() {
    let backend = StubBackend::new();
    backend.seed("fixed-costs", vec![fixed_cost("Storage", "80", "monthly", None)]);
    backend.set_delay(Duration::from_millis(60));
    let base = backend.spawn().await;

    let cache = QueryCache::default();
    let notifier = RecordingNotifier::silent();
    let ctx = context(&base, &cache, notifier.clone());
    let reader = ResourcePage::<FixedCost>::new(&ctx);
    let mut writer = ResourcePage::<FixedCost>::new(&ctx);
    writer.open_create_with(rent()).unwrap();

    // The POST is stored at ~60ms; the first GET reads the collection at ~30ms and
    // answers at ~90ms, so it is still running when the create succeeds.
    let ((submitted, after), early) = tokio::join!(
        async {
            let submitted = writer.submit().await;
            (submitted, reader.load().await)
        },
        async {
            tokio::time::sleep(Duration::from_millis(30)).await;
            reader.load().await
        }
    );
    assert!(matches!(submitted, Ok(MutationOutcome::Created(_))));
    assert_eq!(notifier.toasts()[0].title, "Fixed cost created");
    assert_eq!(early.unwrap().unwrap().len(), 1);

    let rows = after.unwrap().unwrap();
    let names: Vec<&str> = rows.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, ["Storage", "Rent"]);

    // The older answer does not overwrite the newer one.
    let entry = reader.entry();
    assert_eq!(entry.data.unwrap().len(), 2);
    assert!(!entry.is_stale);
    assert_eq!(backend.count("GET", "/api/fixed-costs"), 2);
}

#[tokio::test]
async fn server_error_keeps_dialog_open_and_cache_untouched() {
    let backend = StubBackend::new();
    backend.seed("fixed-costs", vec![fixed_cost("Storage", "80", "monthly", None)]);
    backend.fail("POST", "/api/fixed-costs", 500, "Database unavailable");
    let base = backend.spawn().await;

    let cache = QueryCache::default();
    let notifier = RecordingNotifier::silent();
    let mut page = ResourcePage::<FixedCost>::new(&context(&base, &cache, notifier.clone()));
    page.load().await.unwrap().unwrap();

    page.open_create_with(rent()).unwrap();
    let err = page.submit().await.unwrap_err();
    assert!(matches!(
        err,
        MutationError::Api(ApiError::Http { status: 500, .. })
    ));

    assert!(page.dialog().can_submit());
    assert_eq!(page.dialog().mode(), Some(DialogMode::Create));
    assert_eq!(page.dialog().form().unwrap().name, "Rent");
    assert!(page.dialog().errors().unwrap().is_empty());

    let entry = cache
        .peek::<Vec<FixedCost>>(&FixedCost::list_key())
        .unwrap();
    assert!(!entry.is_stale);

    let toasts = notifier.toasts();
    assert_eq!(toasts.len(), 1);
    assert_eq!(toasts[0].kind, ToastKind::Error);
    assert_eq!(toasts[0].title, "Could not create fixed cost");
    assert_eq!(toasts[0].description.as_deref(), Some("Database unavailable"));
    assert_eq!(backend.count("POST", "/api/fixed-costs"), 1);
}

#[tokio::test]
async fn invalid_form_never_reaches_the_server() {
    let backend = StubBackend::new();
    let base = backend.spawn().await;
    let cache = QueryCache::default();
    let notifier = RecordingNotifier::silent();
    let mut page = ResourcePage::<FixedCost>::new(&context(&base, &cache, notifier.clone()));

    page.open_create_with(CreateFixedCost::new("Rent", "", CostFrequency::Monthly))
        .unwrap();
    let err = page.submit().await.unwrap_err();

    assert!(matches!(err, MutationError::Validation(_)));
    let errors = page.dialog().errors().unwrap();
    assert_eq!(errors.for_field("amount").unwrap().message, "is required");
    assert_eq!(backend.count("POST", "/api/fixed-costs"), 0);
    assert!(notifier.toasts().is_empty());
}

#[tokio::test]
async fn overlapping_submissions_send_one_request() {
    let backend = StubBackend::new();
    backend.set_delay(Duration::from_millis(50));
    let base = backend.spawn().await;
    let cache = QueryCache::default();
    let ctx = context(&base, &cache, RecordingNotifier::silent());

    let command = MutationCommand::<FixedCost>::new(ctx.client.clone(), cache.clone(), ctx.notifier.clone());
    let other = command.clone();
    let (first, second) = tokio::join!(
        command.execute(MutationRequest::Create(rent())),
        other.execute(MutationRequest::Create(rent())),
    );

    assert!(first.is_ok());
    assert!(matches!(second, Err(MutationError::AlreadyInFlight)));
    assert_eq!(backend.count("POST", "/api/fixed-costs"), 1);
    assert!(!command.is_in_flight());
}

#[tokio::test]
async fn edit_sends_a_patch_for_the_bound_record() {
    let backend = StubBackend::new();
    let record = fixed_cost("Rent", "500", "monthly", None);
    let id: uuid::Uuid = serde_json::from_value(record["id"].clone()).unwrap();
    backend.seed("fixed-costs", vec![record]);
    let base = backend.spawn().await;
    let cache = QueryCache::default();
    let mut page = ResourcePage::<FixedCost>::new(&context(&base, &cache, RecordingNotifier::silent()));

    let rows = page.load().await.unwrap().unwrap();
    page.open_edit(&rows[0]).unwrap();
    assert_eq!(page.dialog().bound_record(), Some(id));
    page.dialog_mut().form_mut().unwrap().amount = Amount::new("650");

    let MutationOutcome::Updated(updated) = page.submit().await.unwrap() else {
        panic!("expected an updated record");
    };
    assert_eq!(updated.amount.as_str(), "650");
    assert_eq!(backend.count("PATCH", &format!("/api/fixed-costs/{id}")), 1);
}

#[tokio::test]
async fn partial_update_and_delete_through_the_command() {
    let backend = StubBackend::new();
    let record = fixed_cost("Rent", "500", "monthly", None);
    let id: uuid::Uuid = serde_json::from_value(record["id"].clone()).unwrap();
    backend.seed("fixed-costs", vec![record]);
    let base = backend.spawn().await;
    let cache = QueryCache::default();
    let ctx = context(&base, &cache, RecordingNotifier::silent());
    let command = MutationCommand::<FixedCost>::new(ctx.client.clone(), cache.clone(), ctx.notifier.clone());

    let patch = UpdateFixedCost {
        notes: Some("renegotiated".into()),
        ..Default::default()
    };
    command
        .execute(MutationRequest::Update { id, patch })
        .await
        .unwrap();
    let records = backend.records("fixed-costs");
    let stored = &records[0];
    assert_eq!(stored["notes"], "renegotiated");
    assert_eq!(stored["amount"], "500");

    let outcome = command.execute(MutationRequest::Delete { id }).await.unwrap();
    assert_eq!(outcome, MutationOutcome::Deleted(id));
    assert!(backend.records("fixed-costs").is_empty());

    let err = command
        .execute(MutationRequest::Delete { id })
        .await
        .unwrap_err();
    assert_eq!(err.user_message(), "not found");
}

#[tokio::test]
async fn lead_changes_refresh_landing_page_counters() {
    let backend = StubBackend::new();
    let base = backend.spawn().await;
    let cache = QueryCache::default();
    let ctx = context(&base, &cache, Arc::new(NotificationService::new()));

    let pages = ResourcePage::<LandingPage>::new(&ctx);
    pages.load().await.unwrap().unwrap();

    let mut leads = ResourcePage::<Lead>::new(&ctx);
    leads
        .open_create_with(CreateLead {
            first_name: "Ada".into(),
            email: Some("ada@example.com".into()),
            ..Default::default()
        })
        .unwrap();
    leads.submit().await.unwrap();

    let entry = cache
        .peek::<Vec<LandingPage>>(&LandingPage::list_key())
        .unwrap();
    assert!(entry.is_stale);
}
