//! Listing parameters: pagination and asset filters.

use chrono::{DateTime, Utc};

/// Page size used when a caller asks for a page without a size.
pub const DEFAULT_PAGE_SIZE: usize = 100;

/// A page of a listing ordered by internal id ascending.
///
/// Page `n` covers the slice `[n * size, n * size + size)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    /// Zero-based page index.
    pub page: usize,
    /// Page size.
    pub size: usize,
}

impl PageRequest {
    /// Creates a page request.
    #[must_use]
    pub const fn new(page: usize, size: usize) -> Self {
        Self { page, size }
    }

    /// Index of the first element of the page.
    #[must_use]
    pub const fn offset(self) -> usize {
        self.page.saturating_mul(self.size)
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::new(0, DEFAULT_PAGE_SIZE)
    }
}

/// Conjunctive filters for asset listings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AssetFilter {
    /// Only assets of this type.
    pub asset_type: Option<String>,
    /// Only assets with this identifier.
    pub identifier: Option<String>,
    /// Only assets with `first_seen <= valid_at <= expiration`.
    pub valid_at: Option<DateTime<Utc>>,
}

impl AssetFilter {
    /// Matches every asset.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Restricts to an asset type.
    #[must_use]
    pub fn with_type(mut self, asset_type: impl Into<String>) -> Self {
        self.asset_type = Some(asset_type.into());
        self
    }

    /// Restricts to an identifier.
    #[must_use]
    pub fn with_identifier(mut self, identifier: impl Into<String>) -> Self {
        self.identifier = Some(identifier.into());
        self
    }

    /// Restricts to assets valid at an instant.
    #[must_use]
    pub const fn valid_at(mut self, at: DateTime<Utc>) -> Self {
        self.valid_at = Some(at);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_offset() {
        assert_eq!(PageRequest::new(0, 10).offset(), 0);
        assert_eq!(PageRequest::new(3, 10).offset(), 30);
        assert_eq!(PageRequest::new(usize::MAX, 2).offset(), usize::MAX);
        assert_eq!(PageRequest::default().size, DEFAULT_PAGE_SIZE);
    }
}
