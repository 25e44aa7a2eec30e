use std::collections::HashSet;
use std::time::Duration;

use anyhow::{Context as _, bail};
use chrono::Utc;
use tracing::debug;

use blush_api::{ApiClient, ApiError};
use blush_client::admin::{self, MIN_COMPLETION_KEY};
use blush_client::auth;
use blush_client::chat_night::{ChatNight, EntryOutcome};
use blush_client::matches::MatchesFeed;
use blush_client::talk_room::{Finish, TalkRoom};
use blush_client::thread::{SendOutcome, Thread};
use blush_types::events::{ClientEvent, Route};

use crate::App;
use crate::output::{self, print_event};

const REFRESH: Duration = Duration::from_secs(1);

/// Restore the stored session and return a client carrying its token.
async fn signed_in(app: &App) -> anyhow::Result<ApiClient> {
    app.ctx.session.hydrate(&app.api).await;
    let token = app
        .ctx
        .session
        .token()
        .await
        .context("Not signed in. Run `blush login <phone> <password>` first.")?;
    Ok(app.api.authenticated(token))
}

/// Surface a failed direct call through the shared error handling.
async fn checked<T>(app: &App, result: Result<T, ApiError>) -> anyhow::Result<T> {
    match result {
        Ok(v) => Ok(v),
        Err(e) => {
            app.ctx.intercept(&e).await;
            Err(e.into())
        }
    }
}

// -- Account --

pub async fn register(app: &mut App, phone: &str, password: &str) -> anyhow::Result<()> {
    match auth::register(&app.api, &app.ctx, phone, password).await? {
        auth::RegisterOutcome::Created { phone } => {
            println!("Account created for {}. Sign in with `blush login`.", phone)
        }
        auth::RegisterOutcome::AlreadyExists { phone } => {
            println!("{} is already registered. Sign in with `blush login`.", phone)
        }
    }
    Ok(())
}

pub async fn login(app: &mut App, phone: &str, password: &str) -> anyhow::Result<()> {
    let next = auth::login(&app.api, &app.ctx, phone, password).await?;
    let name = app
        .ctx
        .session
        .user()
        .await
        .and_then(|u| u.first_name)
        .unwrap_or_else(|| "there".into());
    println!("Welcome, {}.", name);
    if let Some(route) = next {
        debug!("Gate routes to {:?}", route);
    }
    Ok(())
}

pub async fn logout(app: &mut App) {
    app.ctx.session.sign_out(false).await;
}

pub async fn me(app: &mut App) -> anyhow::Result<()> {
    signed_in(app).await?;
    let user = app
        .ctx
        .session
        .user()
        .await
        .context("Profile could not be loaded")?;

    println!("{}", user.first_name.as_deref().unwrap_or("(no name yet)"));
    println!("  phone       {}", user.phone_number);
    if let Some(age) = user.age_on(Utc::now().date_naive()) {
        println!("  age         {}", age);
    }
    println!("  role        {:?}", user.role);
    println!("  completion  {}%", user.profile_completion);
    println!(
        "  onboarded   {}",
        if user.onboarding_completed { "yes" } else { "no" }
    );
    if let Some(route) = app.ctx.session.entry_route().await {
        println!("  home        {}", output::route_label(&route));
    }
    Ok(())
}

// -- Discovery and matches --

pub async fn discovery(app: &mut App) -> anyhow::Result<()> {
    let api = signed_in(app).await?;
    let mut deck = blush_client::discovery::load(&api, &app.ctx, Utc::now().date_naive()).await?;
    if deck.is_exhausted() {
        println!("No one new right now. Check back later.");
        return Ok(());
    }
    while let Some(card) = deck.pass() {
        let age = card.age.map(|a| format!(", {}", a)).unwrap_or_default();
        println!("{}{}", card.first_name, age);
        if let Some(bio) = card.bio.as_deref().filter(|b| !b.is_empty()) {
            println!("  {}", bio);
        }
    }
    Ok(())
}

pub async fn threads(app: &mut App) -> anyhow::Result<()> {
    let api = signed_in(app).await?;
    let feed = MatchesFeed::new(api, app.ctx.clone());
    let rows = feed.refresh().await?;
    if rows.is_empty() {
        println!("No matches yet. Try Chat Night.");
    }
    for row in rows {
        let unread = if row.unread > 0 {
            format!(" ({} unread)", row.unread)
        } else {
            String::new()
        };
        println!("{}  {}{}", row.thread_id, row.partner_name, unread);
        println!("  {}", row.last_message);
    }
    Ok(())
}

// -- Threads --

pub async fn chat(app: &mut App, thread_id: &str, watch: bool) -> anyhow::Result<()> {
    let api = signed_in(app).await?;
    let me = app.ctx.session.user().await.and_then(|u| u.id);
    let thread = Thread::new(api, app.ctx.clone(), thread_id);

    let (partner, ()) = tokio::join!(thread.partner(), thread.open());
    match partner {
        Ok(p) => println!("Chat with {}", p.first_name.as_deref().unwrap_or("your match")),
        Err(e) => debug!("Partner lookup failed: {}", e),
    }

    let mut seen = HashSet::new();
    for msg in thread.messages().await {
        output::print_message(&msg, me.as_deref());
        seen.insert(msg.id);
    }
    if !watch {
        thread.stop().await;
        return Ok(());
    }

    println!("Watching for new messages, Ctrl-C to stop.");
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            Some(event) = app.events.recv() => print_event(&event),
            _ = tokio::time::sleep(REFRESH) => {
                for msg in thread.messages().await {
                    if !msg.id.is_pending() && seen.insert(msg.id.clone()) {
                        output::print_message(&msg, me.as_deref());
                    }
                }
            }
        }
    }
    thread.stop().await;
    Ok(())
}

pub async fn send(app: &mut App, thread_id: &str, text: &str) -> anyhow::Result<()> {
    let api = signed_in(app).await?;
    let thread = Thread::new(api, app.ctx.clone(), thread_id);
    match thread.send_message(text).await {
        SendOutcome::Sent(id) => {
            println!("Sent ({})", id);
            Ok(())
        }
        SendOutcome::Ignored => bail!("Message is empty"),
        SendOutcome::Failed => bail!("Message was not sent"),
    }
}

// -- Chat Night --

pub async fn chat_night(app: &mut App, enter: bool, engage: bool) -> anyhow::Result<()> {
    let api = signed_in(app).await?;
    let night = ChatNight::new(api.clone(), app.ctx.clone());
    night.start().await;
    output::print_chat_night(&night.snapshot().await);
    if !enter {
        night.stop().await;
        return Ok(());
    }

    let room_id = match night.enter_pool().await {
        EntryOutcome::Joined(room_id) => room_id,
        EntryOutcome::Queued => {
            println!("Searching for someone, Ctrl-C to cancel.");
            match wait_for_room(app).await {
                Some(room_id) => room_id,
                None => {
                    night.cancel_search().await;
                    println!("Left the pool.");
                    return Ok(());
                }
            }
        }
        EntryOutcome::NotOpen => {
            night.stop().await;
            println!("Chat Night is not open right now.");
            return Ok(());
        }
        outcome => {
            night.stop().await;
            debug!("Pool entry ended as {:?}", outcome);
            return Ok(());
        }
    };
    night.stop().await;

    let room = TalkRoom::open(api, app.ctx.clone(), room_id);
    if engage {
        room.engage().await;
    }

    let mut last_shown = None;
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                println!("Left the room.");
                break;
            }
            Some(event) = app.events.recv() => print_event(&event),
            _ = tokio::time::sleep(REFRESH) => {
                let state = room.snapshot().await;
                match state.finished {
                    Some(Finish::Matched) => {
                        output::flush_events(&mut app.events);
                        println!("Say hi with `blush threads`.");
                        break;
                    }
                    Some(Finish::Ended) => {
                        output::flush_events(&mut app.events);
                        break;
                    }
                    None => {
                        // Every 30s, and whenever engagement changes
                        let key = (state.seconds_remaining / 30, state.engaged, state.match_unlocked);
                        if last_shown != Some(key) {
                            output::print_room(&state);
                            last_shown = Some(key);
                        }
                    }
                }
            }
        }
    }
    Ok(())
}

/// Print events until the pool assigns a room. None on Ctrl-C.
async fn wait_for_room(app: &mut App) -> Option<String> {
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => return None,
            event = app.events.recv() => match event? {
                ClientEvent::Navigate(Route::TalkRoom { room_id }) => return Some(room_id),
                other => print_event(&other),
            },
        }
    }
}

// -- Admin --

pub async fn admin(app: &mut App, args: &[String]) -> anyhow::Result<()> {
    let Some(sub) = args.first() else {
        print_admin_usage();
        return Ok(());
    };
    let api = signed_in(app).await?;
    if !app.ctx.session.user().await.is_some_and(|u| u.is_admin()) {
        bail!("Admin role required");
    }
    let arg = |i: usize| args.get(i).map(String::as_str);

    match sub.as_str() {
        "metrics" => {
            let metrics = checked(app, api.admin_metrics().await).await?;
            println!("{}", serde_json::to_string_pretty(&metrics)?);
        }
        "users" => {
            let users = checked(app, api.admin_users().await).await?;
            for u in users {
                let banned = if u.is_banned { "  BANNED" } else { "" };
                println!(
                    "{}  {:<16} {:<12} {:?} {}%{}",
                    u.id,
                    u.name.as_deref().unwrap_or("-"),
                    u.phone.as_deref().unwrap_or("-"),
                    u.role,
                    u.completion.unwrap_or(0),
                    banned
                );
            }
        }
        "user" => {
            let id = arg(1).context("Usage: blush admin user <id>")?;
            let detail = checked(app, api.admin_user(id).await).await?;
            let p = &detail.profile;
            println!("{}", p.first_name.as_deref().unwrap_or("(no name)"));
            println!("  phone     {}", p.phone_number.as_deref().unwrap_or("-"));
            println!("  banned    {}", p.is_banned);
            if let Some(strength) = &detail.strength {
                println!("  strength  {:?}", strength);
            }
            let stats = &detail.activity_stats;
            println!("  messages  {}", stats.messages_sent_all_time);
            println!("  matches   {}", stats.matches_count_all_time);
            println!("  passes    {} used today", stats.chat_night_passes_used_today);
        }
        "ban" => {
            let id = arg(1).context("Usage: blush admin ban <id> [reason]")?;
            let detail = checked(app, api.admin_user(id).await).await?;
            let reason = (args.len() > 2).then(|| args[2..].join(" "));
            let action = admin::toggle_ban(&api, &app.ctx, id, &detail, reason.as_deref()).await?;
            println!("{:?} applied to {}", action, id);
        }
        "reset-passes" => {
            let id = arg(1).context("Usage: blush admin reset-passes <id> [count]")?;
            let count = admin::parse_reset_count(arg(2).unwrap_or_default());
            admin::reset_passes(&api, &app.ctx, id, count).await?;
        }
        "toggles" => {
            let toggles = checked(app, api.admin_toggles().await).await?;
            let min = admin::toggle_value(&toggles, MIN_COMPLETION_KEY);
            println!("{} = {}", MIN_COMPLETION_KEY, min.as_deref().unwrap_or("(unset)"));
            for (key, value) in &toggles.dynamic_overrides {
                if key != MIN_COMPLETION_KEY {
                    println!("{} = {}", key, value);
                }
            }
        }
        "set-min-completion" => {
            let value = arg(1).context("Usage: blush admin set-min-completion <value>")?;
            admin::set_min_completion(&api, &app.ctx, value).await?;
        }
        other => {
            eprintln!("Unknown admin command: {}", other);
            print_admin_usage();
        }
    }
    Ok(())
}

fn print_admin_usage() {
    println!("Usage: blush admin <command>");
    println!();
    println!("  metrics                      Platform overview");
    println!("  users                        List accounts");
    println!("  user <id>                    Account detail");
    println!("  ban <id> [reason]            Ban, or unban if already banned");
    println!("  reset-passes <id> [count]    Set tonight's Chat Night passes");
    println!("  toggles                      Show runtime settings");
    println!("  set-min-completion <value>   Profile completion needed for Chat Night");
}
