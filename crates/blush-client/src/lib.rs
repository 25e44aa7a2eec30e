//! Client-side core of Blush Hour: session handling, Chat Night, talk
//! rooms and message threads, driven over the HTTP API.
//!
//! Nothing here draws a screen. Controllers emit [`ClientEvent`]s
//! (navigation, alerts, sign-outs) on a channel and the front end decides
//! how to present them.
//!
//! [`ClientEvent`]: blush_types::events::ClientEvent

pub mod admin;
pub mod auth;
pub mod backend;
pub mod chat_night;
pub mod config;
pub mod context;
pub mod discovery;
pub mod events;
pub mod lifecycle;
pub mod matches;
pub mod poller;
pub mod registration;
pub mod session;
pub mod talk_room;
pub mod thread;

pub use config::ClientConfig;
pub use context::Context;
pub use session::Session;
