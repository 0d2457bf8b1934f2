//! Terminal UI layer.
//!
//! Two full-screen views share one pattern: state structs with pure update
//! methods (unit-testable without a terminal), an event loop polling keyboard
//! input and draining a channel fed by spawned network tasks, and rendering
//! built from styled line lists.
//!
//! - [`dashboard`]: bot listing with my/public tabs.
//! - [`chat_loop`]: the transcript view for one bot.
//! - [`bot_card`]: pure card rendering shared by the dashboard.

pub mod bot_card;
pub mod chat_loop;
pub mod dashboard;
