//! Gallery filtering: category tab plus free-text search.

use super::model::{Category, Listing};

/// Filter applied to a listing snapshot before display.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListingFilter {
    /// `None` means "All".
    pub category: Option<Category>,
    /// Case-insensitive substring matched against title, author and category.
    pub query: String,
}

impl ListingFilter {
    pub fn new(category: Option<Category>, query: impl Into<String>) -> Self {
        Self {
            category,
            query: query.into(),
        }
    }

    pub fn matches(&self, listing: &Listing) -> bool {
        if let Some(category) = self.category {
            if listing.category != category {
                return false;
            }
        }

        let needle = self.query.trim().to_lowercase();
        if needle.is_empty() {
            return true;
        }

        listing.title.to_lowercase().contains(&needle)
            || listing.author.to_lowercase().contains(&needle)
            || listing.category.as_str().to_lowercase().contains(&needle)
    }

    /// Keeps matching listings, preserving snapshot order.
    pub fn apply<'a>(&self, listings: &'a [Listing]) -> Vec<&'a Listing> {
        listings.iter().filter(|l| self.matches(l)).collect()
    }
}
