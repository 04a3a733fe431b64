// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

/// Settings for one merge.
///
/// ```
/// use diffmerge::MergeConfig;
///
/// let config = MergeConfig::new().with_label("inventory").with_prefetch(16);
/// assert_eq!(config.label(), "inventory");
/// assert_eq!(config.prefetch(), 16);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeConfig {
    label: String,
    prefetch: u64,
}

impl MergeConfig {
    pub const DEFAULT_LABEL: &'static str = "merge";
    pub const DEFAULT_PREFETCH: u64 = 1;

    #[must_use]
    pub fn new() -> Self {
        Self {
            label: Self::DEFAULT_LABEL.to_string(),
            prefetch: Self::DEFAULT_PREFETCH,
        }
    }

    /// Name used in log lines and error contexts.
    #[must_use]
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    /// Items a [`PublisherStream`](crate::PublisherStream) requests each time
    /// its buffer runs dry. Zero is raised to one; `u64::MAX` requests
    /// everything up front.
    #[must_use]
    pub fn with_prefetch(mut self, prefetch: u64) -> Self {
        self.prefetch = prefetch.max(1);
        self
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub const fn prefetch(&self) -> u64 {
        self.prefetch
    }
}

impl Default for MergeConfig {
    fn default() -> Self {
        Self::new()
    }
}
