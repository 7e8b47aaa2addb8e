pub mod handlers;
pub mod ledger;
#[cfg(test)]
pub mod memory;
pub mod service;

pub use ledger::{PgScoreLedger, ScoreLedger};
