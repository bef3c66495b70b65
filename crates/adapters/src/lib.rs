//! feed-courier adapters crate
//!
//! This crate contains infrastructure adapters implementing the domain ports:
//! - `ledger`: SQLite and in-memory ledger stores
//! - `blogger`: Blogger-style feed source
//! - `telegram`: Telegram delivery sink
//! - `enrich`: caption enricher implementations (template, remote, stub)

mod ledger_memory;
mod ledger_sqlite;

pub mod blogger;
pub mod enrich;
pub mod telegram;

/// Re-exports for ledger adapters
pub mod ledger {
    pub use crate::ledger_memory::InMemoryLedger;
    pub use crate::ledger_sqlite::SqliteLedger;
}
