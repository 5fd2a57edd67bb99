//! Mode runners
//!
//! Each runner drives one account through one mode. They return
//! `session::Result`; an account-fatal error ends that account's work and
//! the orchestrator moves on to the next account.

pub mod lootbox;
pub mod tasks;
pub mod tokens;

use crate::config::{LimitsConfig, PacingConfig};

/// Attempt budgets and pacing shared by all runners.
#[derive(Debug, Clone)]
pub struct Settings {
    pub task_attempts: u32,
    pub token_attempts: u32,
    pub lootbox_attempts: u32,
    pub identity_attempts: u32,
    pub pacing: PacingConfig,
}

impl Default for Settings {
    fn default() -> Self {
        let limits = LimitsConfig::default();
        Self {
            task_attempts: limits.task_attempts,
            token_attempts: limits.token_attempts,
            lootbox_attempts: limits.lootbox_attempts,
            identity_attempts: limits.identity_attempts,
            pacing: PacingConfig::default(),
        }
    }
}
