//! Typed HTTP client for the Blush Hour backend.
//!
//! Every endpoint the app consumes lives on [`ApiClient`], grouped by area
//! in the modules below. Failures are classified into [`ApiError`] so callers
//! can tell a rate limit or a ban apart from a plain network hiccup.

mod admin;
mod auth;
mod chat;
mod chat_night;
mod discovery;
mod users;

pub mod client;
pub mod error;

pub use client::ApiClient;
pub use error::ApiError;
