pub mod finish;
pub mod journal;
pub mod play;
pub mod signer;
pub mod status;

pub use finish::{handle_finish_command, FinishArgs};
pub use journal::{handle_journal_command, handle_reconcile_command};
pub use play::{handle_play_command, PlayArgs};
pub use signer::{handle_signer_command, SignerCommands};
pub use status::handle_status_command;
