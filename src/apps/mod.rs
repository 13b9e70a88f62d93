//! Per-app facades composing entity stores with their side collections

pub mod blog;
pub mod chat;
pub mod ledger;

pub use blog::{Blog, BlogSettings, BlogStats};
pub use chat::{Chat, RoomFeed};
pub use ledger::{Balance, Ledger, LedgerSummary};
