use std::fmt;

use crate::Outcome;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ItemStatus {
    #[default]
    Pending,
    Success,
    Error,
}

impl ItemStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            ItemStatus::Pending => "pending",
            ItemStatus::Success => "success",
            ItemStatus::Error => "error",
        }
    }

    pub fn is_terminal(self) -> bool {
        !matches!(self, ItemStatus::Pending)
    }
}

impl fmt::Display for ItemStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A validated `{identifier, token}` row as produced by intake.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemInput {
    pub identifier: String,
    pub token: String,
}

impl ItemInput {
    pub fn new(identifier: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            token: token.into(),
        }
    }
}

/// One unit of work. Status and message are only written through
/// [`crate::RunState`], which enforces the Pending -> terminal transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkItem {
    pub identifier: String,
    pub token: String,
    status: ItemStatus,
    message: String,
}

impl WorkItem {
    pub fn new(identifier: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            token: token.into(),
            status: ItemStatus::Pending,
            message: String::new(),
        }
    }

    pub fn status(&self) -> ItemStatus {
        self.status
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    pub(crate) fn reset(&mut self) {
        self.status = ItemStatus::Pending;
        self.message.clear();
    }

    /// Freezes the item in its terminal state. Returns `false` when the item
    /// was already terminal, leaving it untouched.
    pub(crate) fn finish(&mut self, outcome: &Outcome) -> bool {
        if self.is_terminal() {
            return false;
        }
        self.status = match outcome {
            Outcome::Success => ItemStatus::Success,
            Outcome::Error { .. } => ItemStatus::Error,
        };
        self.message = outcome.message().to_string();
        true
    }
}

impl From<ItemInput> for WorkItem {
    fn from(input: ItemInput) -> Self {
        WorkItem::new(input.identifier, input.token)
    }
}
