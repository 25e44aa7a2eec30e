//! Shared types for the Blush Hour client.
//!
//! `api` holds the JSON bodies exchanged with the backend, `models` the
//! client-side domain types built from them, and `events` what the client
//! core emits towards whatever front end is driving it.

pub mod api;
pub mod events;
pub mod models;
pub mod timestamp;
