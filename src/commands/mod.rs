//! Command Module
//!
//! This module implements the console layer of ttlkv. It turns lines of text
//! into commands, executes them against a shared storage engine, and renders
//! replies.
//!
//! ## Architecture
//!
//! ```text
//! Console line
//!       │
//!       ▼
//! ┌─────────────────┐
//! │  parser         │  Command::parse
//! └────────┬────────┘
//!          │
//!          ▼
//! ┌─────────────────┐
//! │ CommandHandler  │  execute
//! └────────┬────────┘
//!          │
//!          ▼
//! ┌─────────────────┐
//! │ KvStorage       │  (storage module, behind a Mutex)
//! └─────────────────┘
//! ```

pub mod handler;
pub mod parser;
pub mod reply;

// Re-export the main types
pub use handler::CommandHandler;
pub use parser::Command;
pub use reply::Reply;
