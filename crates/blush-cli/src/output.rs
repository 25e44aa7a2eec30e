use tokio::sync::mpsc::UnboundedReceiver;

use blush_client::chat_night::ChatNightState;
use blush_client::talk_room::TalkRoomState;
use blush_types::events::{ClientEvent, Route};
use blush_types::models::{ChatMessage, ChatNightPhase};

pub fn print_event(event: &ClientEvent) {
    match event {
        ClientEvent::Navigate(route) => println!("-> {}", route_label(route)),
        ClientEvent::Alert { title, message } => println!("[{}] {}", title, message),
        ClientEvent::RateLimited => println!("[rate limited]"),
        ClientEvent::SignedOut { banned: true } => println!("Signed out (account restricted)"),
        ClientEvent::SignedOut { banned: false } => println!("Signed out"),
    }
}

/// Print whatever is already queued without waiting for more.
pub fn flush_events(rx: &mut UnboundedReceiver<ClientEvent>) {
    while let Ok(event) = rx.try_recv() {
        print_event(&event);
    }
}

pub fn route_label(route: &Route) -> String {
    match route {
        Route::Login {
            prefill_phone: Some(phone),
        } => format!("login ({})", phone),
        Route::TalkRoom { room_id } => format!("talk room {}", room_id),
        Route::Thread { thread_id } => format!("thread {}", thread_id),
        other => serde_json::to_value(other)
            .ok()
            .and_then(|v| v.get("screen").and_then(|s| s.as_str()).map(String::from))
            .unwrap_or_else(|| format!("{:?}", other)),
    }
}

pub fn print_message(msg: &ChatMessage, me: Option<&str>) {
    let who = match (&msg.sender_id, me) {
        (Some(sender), Some(me)) if sender == me => "you",
        (Some(_), _) => "them",
        (None, _) => "?",
    };
    let marker = if msg.id.is_pending() { " (sending)" } else { "" };
    println!(
        "{} {:>4}: {}{}",
        msg.created_at.format("%H:%M"),
        who,
        msg.text,
        marker
    );
}

pub fn print_chat_night(state: &ChatNightState) {
    match state.phase {
        ChatNightPhase::Closed => {
            println!("Chat Night is closed. Next session: {}", state.next_session)
        }
        ChatNightPhase::Gated => {
            let gate = state.gate.clone().unwrap_or_default();
            println!("Chat Night is locked: {}", gate.message);
            if let (Some(current), Some(required)) = (gate.current, gate.required) {
                println!("  Profile completion {}% of {}% required", current, required);
            }
            if !gate.missing_fields.is_empty() {
                println!("  Missing: {}", gate.missing_fields.join(", "));
            }
        }
        phase => println!("Chat Night is {}", phase),
    }
    println!("Passes left tonight: {}", state.passes_remaining);
}

pub fn print_room(state: &TalkRoomState) {
    let partner = state.partner_name.as_deref().unwrap_or("your match");
    let engage = if state.match_unlocked {
        "match unlocked"
    } else if state.engaged {
        "engaged"
    } else {
        "not engaged"
    };
    let network = if state.network_error { " (reconnecting)" } else { "" };
    println!(
        "{:02}:{:02} left with {} [{}]{}",
        state.seconds_remaining / 60,
        state.seconds_remaining % 60,
        partner,
        engage,
        network
    );
}
