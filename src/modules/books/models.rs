use serde::{Deserialize, Serialize};

/// A catalog row.
///
/// `id` is `None` until the repository stores the book. Every field is always
/// serialized, so absent text fields show up as `null`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Book {
    /// Repository-assigned identifier
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub author: Option<String>,
    /// Price in an unspecified currency
    #[serde(default)]
    pub price: f64,
}

impl Book {
    /// An unsaved book with the given title and author
    pub fn new(title: impl Into<String>, author: impl Into<String>) -> Self {
        Self {
            id: None,
            title: Some(title.into()),
            author: Some(author.into()),
            price: 0.0,
        }
    }

    pub fn with_price(mut self, price: f64) -> Self {
        self.price = price;
        self
    }

    pub fn with_id(mut self, id: i64) -> Self {
        self.id = Some(id);
        self
    }
}
