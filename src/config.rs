//! Options for one translation run. The CLI builds these from its flags.

/// What to do when an attribute list repeats a key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DuplicateAttributes {
    /// Fail with `DuplicateAttribute`.
    #[default]
    Reject,
    /// Keep the last value, at the key's first position.
    LastWins,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TranslateOptions {
    pub duplicate_attributes: DuplicateAttributes,
}

impl TranslateOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_duplicate_attributes(mut self, policy: DuplicateAttributes) -> Self {
        self.duplicate_attributes = policy;
        self
    }
}
