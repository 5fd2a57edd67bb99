//! Account store for questbot
//!
//! Holds the ordered list of `{label, cookie}` records and persists it as a
//! JSON file. Writes are atomic (temp file + rename) so a crash between two
//! persists never leaves a half-written file. The store is owned by a single
//! run and mutated through `&mut`; there is no internal locking.

pub mod error;
pub mod store;

pub use error::{Error, Result};
pub use store::{Account, AccountId, AccountStore};
