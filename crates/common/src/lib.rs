//! Types shared by every questbot crate: configuration errors and the
//! `Secret` wrapper used for session cookies.

mod error;
mod secret;

pub use error::{Error, Result};
pub use secret::Secret;
