use serde::{Deserialize, Serialize};

/// Caller options for a search or sync.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperationOptions {
    /// Attributes the caller wants besides the defaults. Drives which tables
    /// are joined.
    #[serde(default)]
    pub attributes_to_get: Option<Vec<String>>,
    #[serde(default)]
    pub page_size: Option<u64>,
    /// 1-based page offset.
    #[serde(default)]
    pub paged_results_offset: Option<u64>,
    /// Last identifier of the previous page.
    #[serde(default)]
    pub paged_results_cookie: Option<String>,
}

impl OperationOptions {
    #[must_use]
    pub fn with_attributes(mut self, attributes: Vec<String>) -> Self {
        self.attributes_to_get = Some(attributes);
        self
    }

    #[must_use]
    pub fn with_page(mut self, size: u64, offset: u64) -> Self {
        self.page_size = Some(size);
        self.paged_results_offset = Some(offset);
        self
    }

    #[must_use]
    pub fn with_cookie(mut self, size: u64, cookie: impl Into<String>) -> Self {
        self.page_size = Some(size);
        self.paged_results_cookie = Some(cookie.into());
        self
    }

    /// Requested attributes, empty when none were requested.
    #[must_use]
    pub fn attributes(&self) -> &[String] {
        self.attributes_to_get.as_deref().unwrap_or(&[])
    }

    /// The cookie, ignoring empty strings.
    #[must_use]
    pub fn cookie(&self) -> Option<&str> {
        self.paged_results_cookie.as_deref().filter(|c| !c.is_empty())
    }
}
