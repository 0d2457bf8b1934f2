//! Botline is a terminal-first client for a bot-persona chat platform.
//!
//! The crate is organized around a small set of collaborating layers:
//! - [`core`] owns the domain state: session identity, bot records, the
//!   chat transcript, and configuration.
//! - [`api`] defines the backend payloads and the typed HTTP client that is
//!   the only code constructing paths, queries, and bodies.
//! - [`ui`] renders the terminal interface: the dashboard and the chat
//!   screen, each an event loop over pure, testable state.
//! - [`auth`] implements the interactive login/signup/logout flows and is
//!   the sole writer of the persisted session.
//!
//! Runtime entrypoints live in the binary crate (`src/main.rs`) and route
//! through [`crate::cli::main`], which dispatches into [`ui::dashboard`] and
//! [`ui::chat_loop`] for interactive sessions.

pub mod api;
pub mod auth;
pub mod cli;
pub mod core;
pub mod ui;
pub mod utils;
