//! Storage contract for books and the in-memory store behind it.

use anyhow::Context;
use async_trait::async_trait;
use std::collections::BTreeMap;
use tokio::sync::RwLock;

use super::models::Book;

/// Persistence seam for the books module.
#[async_trait]
pub trait BookRepository: Send + Sync {
    /// Every stored book
    async fn find_all(&self) -> anyhow::Result<Vec<Book>>;

    async fn find_by_id(&self, id: i64) -> anyhow::Result<Option<Book>>;

    /// Insert or replace a book and return the stored row.
    ///
    /// A book without an id, or with an id that is not stored, is inserted
    /// under a freshly issued id.
    async fn save(&self, book: Book) -> anyhow::Result<Book>;

    /// Remove a book. Absent ids are ignored.
    async fn delete_by_id(&self, id: i64) -> anyhow::Result<()>;
}

#[derive(Debug, Default)]
struct Table {
    last_id: i64,
    rows: BTreeMap<i64, Book>,
}

impl Table {
    fn issue_id(&mut self) -> anyhow::Result<i64> {
        self.last_id = self
            .last_id
            .checked_add(1)
            .context("book id sequence exhausted")?;
        Ok(self.last_id)
    }

    fn insert(&mut self, book: Book) -> anyhow::Result<Book> {
        let id = match book.id {
            Some(id) if self.rows.contains_key(&id) => id,
            _ => self.issue_id()?,
        };
        let stored = Book {
            id: Some(id),
            ..book
        };
        self.rows.insert(id, stored.clone());
        Ok(stored)
    }
}

/// Process-local repository. Ids start at 1 and are never reused.
#[derive(Debug, Default)]
pub struct InMemoryBookRepository {
    table: RwLock<Table>,
}

impl InMemoryBookRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-populate the store. Books that carry an id keep it; the id
    /// sequence continues after the largest one seen.
    pub fn with_books(books: impl IntoIterator<Item = Book>) -> anyhow::Result<Self> {
        let mut table = Table::default();
        for book in books {
            match book.id {
                Some(id) => {
                    table.last_id = table.last_id.max(id);
                    table.rows.insert(id, book);
                }
                None => {
                    table.insert(book)?;
                }
            }
        }
        Ok(Self {
            table: RwLock::new(table),
        })
    }

    pub async fn len(&self) -> usize {
        self.table.read().await.rows.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.table.read().await.rows.is_empty()
    }
}

#[async_trait]
impl BookRepository for InMemoryBookRepository {
    async fn find_all(&self) -> anyhow::Result<Vec<Book>> {
        let table = self.table.read().await;
        Ok(table.rows.values().cloned().collect())
    }

    async fn find_by_id(&self, id: i64) -> anyhow::Result<Option<Book>> {
        let table = self.table.read().await;
        Ok(table.rows.get(&id).cloned())
    }

    async fn save(&self, book: Book) -> anyhow::Result<Book> {
        let mut table = self.table.write().await;
        table.insert(book)
    }

    async fn delete_by_id(&self, id: i64) -> anyhow::Result<()> {
        let mut table = self.table.write().await;
        if table.rows.remove(&id).is_none() {
            tracing::debug!(book_id = id, "delete of absent book ignored");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn save_assigns_sequential_ids() {
        let repository = InMemoryBookRepository::new();

        let first = repository.save(Book::new("Dune", "Herbert")).await.unwrap();
        let second = repository
            .save(Book::new("Emma", "Austen").with_price(7.5))
            .await
            .unwrap();

        assert_eq!(first.id, Some(1));
        assert_eq!(second.id, Some(2));
        assert_eq!(second.price, 7.5);
    }

    #[tokio::test]
    async fn find_by_id_returns_saved_fields() {
        let repository = InMemoryBookRepository::new();
        let saved = repository
            .save(Book::new("Test Book", "Test Author").with_price(10.99))
            .await
            .unwrap();

        let found = repository
            .find_by_id(saved.id.unwrap())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found.title.as_deref(), Some("Test Book"));
        assert_eq!(found.author.as_deref(), Some("Test Author"));
        assert_eq!(found.price, 10.99);
    }

    #[tokio::test]
    async fn find_by_unknown_id_is_none() {
        let repository = InMemoryBookRepository::new();
        assert!(repository.find_by_id(99).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn find_all_lists_every_live_book_in_id_order() {
        let repository = InMemoryBookRepository::new();
        for title in ["a", "b", "c"] {
            repository.save(Book::new(title, "x")).await.unwrap();
        }
        repository.delete_by_id(2).await.unwrap();

        let titles: Vec<_> = repository
            .find_all()
            .await
            .unwrap()
            .into_iter()
            .map(|book| book.title.unwrap())
            .collect();
        assert_eq!(titles, vec!["a", "c"]);
    }

    #[tokio::test]
    async fn delete_then_find_is_none_and_ids_are_not_reused() {
        let repository = InMemoryBookRepository::new();
        let saved = repository.save(Book::new("Gone", "Soon")).await.unwrap();
        let id = saved.id.unwrap();

        repository.delete_by_id(id).await.unwrap();
        assert!(repository.find_by_id(id).await.unwrap().is_none());

        let next = repository.save(Book::new("Next", "One")).await.unwrap();
        assert_eq!(next.id, Some(id + 1));
    }

    #[tokio::test]
    async fn delete_of_absent_id_is_ok() {
        let repository = InMemoryBookRepository::new();
        repository.delete_by_id(42).await.unwrap();
        assert!(repository.is_empty().await);
    }

    #[tokio::test]
    async fn save_with_stored_id_replaces_row() {
        let repository = InMemoryBookRepository::new();
        let saved = repository.save(Book::new("Draft", "Me")).await.unwrap();

        let updated = repository
            .save(Book {
                title: Some("Final".to_string()),
                ..saved.clone()
            })
            .await
            .unwrap();

        assert_eq!(updated.id, saved.id);
        assert_eq!(repository.len().await, 1);
        let found = repository
            .find_by_id(saved.id.unwrap())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found.title.as_deref(), Some("Final"));
    }

    #[tokio::test]
    async fn save_with_unknown_id_issues_fresh_id() {
        let repository = InMemoryBookRepository::new();
        let saved = repository
            .save(Book::new("Stray", "Id").with_id(500))
            .await
            .unwrap();

        assert_eq!(saved.id, Some(1));
        assert!(repository.find_by_id(500).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn null_title_round_trips() {
        let repository = InMemoryBookRepository::new();
        let saved = repository.save(Book::default()).await.unwrap();

        let found = repository
            .find_by_id(saved.id.unwrap())
            .await
            .unwrap()
            .unwrap();
        assert!(found.title.is_none());
    }

    #[tokio::test]
    async fn seeded_ids_are_kept_and_sequence_continues() {
        let repository = InMemoryBookRepository::with_books([
            Book::new("Seven", "S").with_id(7),
            Book::new("Unnumbered", "U"),
        ])
        .unwrap();

        assert_eq!(repository.len().await, 2);
        assert!(repository.find_by_id(7).await.unwrap().is_some());
        assert!(repository.find_by_id(8).await.unwrap().is_some());

        let next = repository.save(Book::new("Later", "L")).await.unwrap();
        assert_eq!(next.id, Some(9));
    }

    #[tokio::test]
    async fn exhausted_id_sequence_is_an_error() {
        let repository =
            InMemoryBookRepository::with_books([Book::new("Last", "L").with_id(i64::MAX)])
                .unwrap();

        let err = repository.save(Book::new("Overflow", "O")).await.unwrap_err();
        assert_eq!(err.to_string(), "book id sequence exhausted");
        assert_eq!(repository.len().await, 1);

        let replaced = repository
            .save(Book::new("Still", "Works").with_id(i64::MAX))
            .await
            .unwrap();
        assert_eq!(replaced.id, Some(i64::MAX));
    }

    #[test]
    fn seeding_past_the_last_id_is_an_error() {
        let seeded = InMemoryBookRepository::with_books([
            Book::new("Last", "L").with_id(i64::MAX),
            Book::new("Unnumbered", "U"),
        ]);
        assert!(seeded.is_err());
    }
}
