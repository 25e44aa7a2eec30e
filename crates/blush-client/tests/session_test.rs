mod common;

use std::time::Duration;

use serde_json::json;

use blush_client::auth::{self, AuthError, RegisterOutcome};
use blush_client::registration::RegistrationDraft;
use blush_client::session::Section;
use blush_types::events::{ClientEvent, Route};

use common::{FakeBackend, Reply, alert_messages, alert_titles, context, drain, sleep_secs};

fn profile(phone: &str, onboarded: bool) -> Reply {
    Reply::ok(json!({"_id": format!("id-{}", phone), "phone_number": phone, "onboarding_completed": onboarded}))
}

#[tokio::test(start_paused = true)]
async fn hydrate_restores_a_stored_session() {
    let api = FakeBackend::new();
    api.script("me:t1", [profile("5550000001", true)]);
    let (ctx, _rx, store) = context();
    store.save_token("t1").unwrap();

    assert_eq!(ctx.session.entry_route().await, None, "loading");
    ctx.session.hydrate(&api).await;

    let state = ctx.session.snapshot().await;
    assert_eq!(state.token.as_deref(), Some("t1"));
    assert!(state.is_authenticated());
    assert_eq!(ctx.session.entry_route().await, Some(Route::Discovery));
    assert_eq!(ctx.session.redirect_for(Section::Auth).await, Some(Route::Profile));
}

#[tokio::test(start_paused = true)]
async fn hydrate_without_token_lands_on_welcome() {
    let api = FakeBackend::new();
    let (ctx, _rx, _store) = context();

    ctx.session.hydrate(&api).await;
    assert_eq!(ctx.session.entry_route().await, Some(Route::Welcome));
    assert_eq!(ctx.session.redirect_for(Section::Main).await, Some(Route::Welcome));
}

#[tokio::test(start_paused = true)]
async fn profile_for_a_replaced_token_is_discarded() {
    let api = FakeBackend::new();
    api.script("me:old", [profile("5550000001", true)])
        .delay("me:old", Duration::from_secs(5))
        .script("me:new", [profile("5550000002", false)]);
    let (ctx, _rx, store) = context();

    let slow = {
        let session = ctx.session.clone();
        let api = api.clone();
        tokio::spawn(async move { session.sign_in(&api, "old").await })
    };
    sleep_secs(1.0).await;
    ctx.session.sign_in(&api, "new").await;

    slow.await.unwrap();
    let state = ctx.session.snapshot().await;
    assert_eq!(state.token.as_deref(), Some("new"));
    assert_eq!(state.user.unwrap().phone_number, "5550000002");
    assert_eq!(store.load_token().unwrap().as_deref(), Some("new"));
}

#[tokio::test(start_paused = true)]
async fn sign_out_during_fetch_stays_signed_out() {
    let api = FakeBackend::new();
    api.script("me:t1", [profile("5550000001", true)])
        .delay("me:t1", Duration::from_secs(5));
    let (ctx, mut rx, store) = context();

    let slow = {
        let session = ctx.session.clone();
        let api = api.clone();
        tokio::spawn(async move { session.sign_in(&api, "t1").await })
    };
    sleep_secs(1.0).await;
    ctx.session.sign_out(false).await;
    slow.await.unwrap();

    let state = ctx.session.snapshot().await;
    assert!(state.token.is_none());
    assert!(state.user.is_none());
    assert_eq!(store.load_token().unwrap(), None);
    assert!(drain(&mut rx).contains(&ClientEvent::SignedOut { banned: false }));
}

#[tokio::test(start_paused = true)]
async fn rejected_token_signs_out() {
    let api = FakeBackend::new();
    api.script("me:t1", [Reply::status(401, json!({"detail": "Could not validate credentials"}))]);
    let (ctx, mut rx, store) = context();
    store.save_token("t1").unwrap();

    ctx.session.hydrate(&api).await;

    assert!(ctx.session.token().await.is_none());
    assert_eq!(store.load_token().unwrap(), None);
    let events = drain(&mut rx);
    assert!(events.contains(&ClientEvent::SignedOut { banned: false }));
    assert!(events.contains(&ClientEvent::Navigate(Route::Welcome)));
}

#[tokio::test(start_paused = true)]
async fn banned_profile_forces_sign_out() {
    let api = FakeBackend::new();
    api.script("me:t1", [Reply::status(403, json!({"detail": "User is banned"}))]);
    let (ctx, mut rx, _store) = context();

    ctx.session.sign_in(&api, "t1").await;

    assert!(ctx.session.token().await.is_none());
    let events = drain(&mut rx);
    assert!(events.contains(&ClientEvent::SignedOut { banned: true }));
    assert_eq!(alert_titles(&events), vec!["Access Denied"]);
}

#[tokio::test(start_paused = true)]
async fn network_failure_keeps_the_token() {
    let api = FakeBackend::new();
    api.script("me:t1", [Reply::Network]);
    let (ctx, mut rx, store) = context();
    store.save_token("t1").unwrap();

    ctx.session.hydrate(&api).await;

    let state = ctx.session.snapshot().await;
    assert_eq!(state.token.as_deref(), Some("t1"));
    assert!(state.user.is_none());
    assert_eq!(ctx.session.redirect_for(Section::Main).await, None);
    assert!(drain(&mut rx).is_empty());
}

#[tokio::test(start_paused = true)]
async fn login_installs_session_and_routes_to_onboarding() {
    let api = FakeBackend::new();
    api.script("login", [Reply::ok(json!({"access_token": "jwt", "token_type": "bearer"}))])
        .script("me:jwt", [profile("5551234567", false)]);
    let (ctx, mut rx, store) = context();

    let next = auth::login(&api, &ctx, "+1 (555) 123-4567", "hunter22")
        .await
        .unwrap();

    assert_eq!(next, Some(Route::OnboardingName));
    assert_eq!(store.load_token().unwrap().as_deref(), Some("jwt"));
    assert_eq!(
        drain(&mut rx),
        vec![ClientEvent::Navigate(Route::OnboardingName)]
    );
}

#[tokio::test(start_paused = true)]
async fn login_failure_keeps_signed_out() {
    let api = FakeBackend::new();
    api.script("login", [Reply::status(401, json!({"detail": "Invalid credentials"}))]);
    let (ctx, _rx, _store) = context();

    let err = auth::login(&api, &ctx, "5551234567", "wrong").await.unwrap_err();
    assert!(matches!(err, AuthError::Api(_)));
    assert!(ctx.session.token().await.is_none());
    assert_eq!(api.calls("me:jwt"), 0);
}

#[tokio::test(start_paused = true)]
async fn register_conflict_redirects_to_login() {
    let api = FakeBackend::new();
    api.script("register", [Reply::status(409, json!({"detail": "Account already exists"}))]);
    let (ctx, mut rx, _store) = context();

    let outcome = auth::register(&api, &ctx, "555-123 4567", "hunter22")
        .await
        .unwrap();

    assert_eq!(
        outcome,
        RegisterOutcome::AlreadyExists {
            phone: "5551234567".into()
        }
    );
    assert_eq!(
        drain(&mut rx),
        vec![ClientEvent::Navigate(Route::Login {
            prefill_phone: Some("5551234567".into())
        })]
    );
}

#[tokio::test(start_paused = true)]
async fn register_validation_error_shows_detail() {
    let api = FakeBackend::new();
    api.script("register", [Reply::status(400, json!({"detail": "Phone number is invalid"}))]);
    let (ctx, mut rx, _store) = context();

    assert!(auth::register(&api, &ctx, "12", "hunter22").await.is_err());
    assert_eq!(alert_messages(&drain(&mut rx)), vec!["Phone number is invalid"]);
}

#[tokio::test(start_paused = true)]
async fn weak_password_never_reaches_the_server() {
    let api = FakeBackend::new();
    let (ctx, mut rx, _store) = context();

    let err = auth::register(&api, &ctx, "5551234567", "short").await.unwrap_err();
    assert!(matches!(err, AuthError::WeakPassword));
    assert_eq!(api.calls("register"), 0);
    assert_eq!(alert_titles(&drain(&mut rx)), vec!["Weak Password"]);
}

#[tokio::test(start_paused = true)]
async fn rate_limit_is_reported() {
    let api = FakeBackend::new();
    api.script("login", [Reply::status(429, json!({"detail": "Too many requests"}))]);
    let (ctx, mut rx, _store) = context();

    assert!(auth::login(&api, &ctx, "5551234567", "hunter22").await.is_err());
    let events = drain(&mut rx);
    assert!(events.contains(&ClientEvent::RateLimited));
    assert_eq!(
        alert_messages(&events),
        vec!["Too many attempts. Try again in a minute."]
    );
}

#[tokio::test(start_paused = true)]
async fn onboarding_submit_refreshes_profile() {
    let api = FakeBackend::new();
    api.script("me:t1", [profile("5551234567", false), profile("5551234567", true)])
        .script("update_me", [Reply::ok(json!({"phone_number": "5551234567", "onboarding_completed": true}))]);
    let (ctx, mut rx, _store) = context();
    ctx.session.sign_in(&api, "t1").await;

    let mut draft = RegistrationDraft::default();
    draft.update(|d| {
        d.first_name = "Ria".into();
        for slot in d.photos.iter_mut().take(4) {
            *slot = Some("p.jpg".into());
        }
    });
    let profile = draft.submit(&api, &ctx).await.unwrap();

    assert!(profile.onboarding_completed);
    assert!(ctx.session.user().await.unwrap().onboarding_completed);
    assert!(drain(&mut rx).contains(&ClientEvent::Navigate(Route::Discovery)));
}

#[tokio::test(start_paused = true)]
async fn onboarding_submit_needs_four_photos() {
    let api = FakeBackend::new();
    let (ctx, _rx, _store) = context();

    let draft = RegistrationDraft::default();
    assert!(draft.submit(&api, &ctx).await.is_err());
    assert_eq!(api.calls("update_me"), 0);
}
