//! Slack integration - Socket Mode bot interface
//!
//! This crate provides the Slack interface for mailbot:
//! - **Socket Mode** (`socket`) - WebSocket connection to Slack (no public URL needed)
//! - **Routing** (`routing`) - keyword intent tables scoped to DM vs. mention
//! - **Events** (`events`) - direct messages and app mentions
//! - **Blocks** (`blocks`) - message template builders
//!
//! # Architecture
//!
//! ```text
//! Slack Events → EventDispatcher → Handlers → MailAccountService → Conversation Runtime
//!                     ↓
//!               MessageTemplate ← Replies
//! ```
//!
//! The transport itself is a trait (`SocketTransport`) with a noop default;
//! connection lifecycle and wire framing stay outside the core.

pub mod blocks;
pub mod events;
pub mod routing;
pub mod socket;
