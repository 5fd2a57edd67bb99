//! Operator interaction seam
//!
//! All methods block until the operator answers. The engine only calls them
//! between network calls, never concurrently with one.

/// Human operator collaborator: free-text prompt, yes/no, menu.
pub trait Operator: Send + Sync {
    /// Ask for one line of text. None if input is closed.
    fn prompt_line(&self, prompt: &str) -> Option<String>;

    /// Yes/no question. Empty or unreadable input yields `default`.
    fn confirm(&self, prompt: &str, default: bool) -> bool;

    /// Pick one of `options`; returns its index. None if nothing valid was chosen.
    fn select(&self, prompt: &str, options: &[String]) -> Option<usize>;
}
