//! Wager lifecycle protocol for two parties or a solo player against the house
//!
//! A session checks the backend for an existing wager, escrows the stake
//! through the ledger, records it with the backend, then waits for an
//! opponent or commits straight away. Outcomes are reported once the game ends.

pub mod error;
pub mod session;
pub mod settlement;
pub mod timer;

#[cfg(test)]
mod testing;

pub use error::{Result, WagerError};
pub use session::{GameStartCallback, SessionState, WagerOutcome, WagerSession, WaitOutcome};
pub use settlement::{SettlementOutcome, SettlementReporter};
pub use timer::{CancellationTimer, CancellationWindow};
