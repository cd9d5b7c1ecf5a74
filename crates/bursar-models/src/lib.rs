//! # Bursar Models
//!
//! Domain entities and request/response DTOs for the Bursar API.
//!
//! The fee ledger side ([`fees`]) owns what a student owes: fee structures,
//! per-student fees with installment schedules, concessions and fines. The
//! payment side ([`payments`]) owns how money arrives: payment intents and
//! the immutable payment records created when the gateway confirms them.
//!
//! All monetary amounts are integer minor units (see [`money`]).

pub mod fees;
pub mod ids;
pub mod money;
pub mod payments;

pub use fees::{FineStatus, InstallmentStatus};
pub use payments::IntentState;
