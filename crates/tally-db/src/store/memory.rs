//! # In-Memory Sale Store
//!
//! A process-local store with real per-product locks. Used by tests that
//! need to observe lock ordering, and by callers that want the sale
//! engine without a database file.
//!
//! ## Row Locks
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  products: id ──► Arc<tokio::Mutex<Product>>                            │
//! │                                                                         │
//! │  lock_product("P1")                                                    │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  mutex.lock_owned().await ──► OwnedMutexGuard kept in the transaction  │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  staged copy of P1 (stock changes go here)                             │
//! │       │                                                                 │
//! │       ├── commit:   staged copy written through the guard, then drop   │
//! │       └── rollback: guards dropped, staged copies discarded            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use tokio::sync::{Mutex as RowLock, OwnedMutexGuard};
use tracing::debug;

use crate::error::{DbError, DbResult, PRODUCT};
use crate::store::{SaleStore, SaleTransaction};
use tally_core::{Money, Product, Sale, SaleItem};

type ProductRow = Arc<RowLock<Product>>;

#[derive(Debug, Default)]
struct Tables {
    products: Mutex<HashMap<String, ProductRow>>,
    sales: Mutex<Vec<Sale>>,
    sale_items: Mutex<Vec<SaleItem>>,
}

/// Process-local sale store.
///
/// Cloning shares the same tables.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    tables: Arc<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        MemoryStore::default()
    }

    /// Adds or replaces a product.
    pub fn insert_product(&self, product: Product) {
        let mut products = self
            .tables
            .products
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        products.insert(product.id.clone(), Arc::new(RowLock::new(product)));
    }

    /// Current committed state of a product. Waits if a sale holds its lock.
    pub async fn product(&self, product_id: &str) -> Option<Product> {
        let row = self.row(product_id)?;
        let product = Product::clone(&*row.lock().await);
        Some(product)
    }

    /// Committed sales, oldest first.
    pub fn sales(&self) -> Vec<Sale> {
        self.tables
            .sales
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Committed items of one sale, in insertion order.
    pub fn sale_items(&self, sale_id: &str) -> Vec<SaleItem> {
        self.tables
            .sale_items
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|item| item.sale_id == sale_id)
            .cloned()
            .collect()
    }

    fn row(&self, product_id: &str) -> Option<ProductRow> {
        self.tables
            .products
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(product_id)
            .cloned()
    }
}

#[async_trait]
impl SaleStore for MemoryStore {
    type Tx = MemoryTransaction;

    async fn begin(&self) -> DbResult<MemoryTransaction> {
        Ok(MemoryTransaction {
            store: self.clone(),
            locked: HashMap::new(),
            sale: None,
            items: Vec::new(),
        })
    }
}

/// A lock held on one product plus this transaction's view of it.
struct LockedRow {
    guard: OwnedMutexGuard<Product>,
    staged: Product,
}

/// An open in-memory transaction. Dropping it releases every lock and
/// discards every write.
pub struct MemoryTransaction {
    store: MemoryStore,
    locked: HashMap<String, LockedRow>,
    sale: Option<Sale>,
    items: Vec<SaleItem>,
}

impl MemoryTransaction {
    /// This transaction's copy of a product it holds the lock on.
    fn staged_mut(&mut self, product_id: &str) -> Option<&mut Product> {
        self.locked.get_mut(product_id).map(|row| &mut row.staged)
    }
}

#[async_trait]
impl SaleTransaction for MemoryTransaction {
    async fn insert_sale(&mut self, sale: &Sale) -> DbResult<()> {
        if self.sale.is_some() {
            return Err(DbError::transaction("sale already recorded in this transaction"));
        }
        let exists = self
            .store
            .tables
            .sales
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .any(|s| s.id == sale.id);
        if exists {
            return Err(DbError::duplicate("sales.id", sale.id.clone()));
        }

        self.sale = Some(sale.clone());
        Ok(())
    }

    async fn lock_product(&mut self, product_id: &str) -> DbResult<Option<Product>> {
        if let Some(row) = self.locked.get(product_id) {
            return Ok((!row.staged.is_deleted()).then(|| row.staged.clone()));
        }

        let Some(row) = self.store.row(product_id) else {
            return Ok(None);
        };

        let guard = row.lock_owned().await;
        debug!(product_id = %product_id, "Product locked");

        let staged = Product::clone(&guard);
        let visible = (!staged.is_deleted()).then(|| staged.clone());
        self.locked
            .insert(product_id.to_string(), LockedRow { guard, staged });

        Ok(visible)
    }

    async fn insert_sale_item(&mut self, item: &SaleItem) -> DbResult<()> {
        let sale_matches = self.sale.as_ref().is_some_and(|s| s.id == item.sale_id);
        if !sale_matches || !self.locked.contains_key(&item.product_id) {
            return Err(DbError::ForeignKeyViolation {
                message: format!("sale item {} references unknown sale or product", item.id),
            });
        }
        if item.quantity <= 0 {
            return Err(DbError::CheckViolation {
                message: "quantity > 0".to_string(),
            });
        }

        self.items.push(item.clone());
        Ok(())
    }

    async fn update_stock(&mut self, product_id: &str, new_stock: i64) -> DbResult<()> {
        if new_stock < 0 {
            return Err(DbError::CheckViolation {
                message: "quantity_in_stock >= 0".to_string(),
            });
        }

        let staged = self
            .staged_mut(product_id)
            .ok_or_else(|| DbError::not_found(PRODUCT, product_id))?;
        staged.quantity_in_stock = new_stock;
        Ok(())
    }

    async fn update_sale_total(&mut self, sale_id: &str, total: Money) -> DbResult<()> {
        match self.sale.as_mut() {
            Some(sale) if sale.id == sale_id => {
                sale.total_amount_cents = total.cents();
                Ok(())
            }
            _ => Err(DbError::not_found("Sale", sale_id)),
        }
    }

    async fn commit(self) -> DbResult<()> {
        let MemoryTransaction {
            store,
            locked,
            sale,
            items,
        } = self;

        // Stock first, then the sale: a reader that sees the sale also sees
        // its deduction. Row locks stay held until both are in place.
        let mut guards = Vec::with_capacity(locked.len());
        for (_, LockedRow { mut guard, staged }) in locked {
            *guard = staged;
            guards.push(guard);
        }

        if let Some(sale) = sale {
            store
                .tables
                .sales
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .push(sale);
        }
        store
            .tables
            .sale_items
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .extend(items);

        drop(guards);
        Ok(())
    }

    async fn rollback(self) -> DbResult<()> {
        debug!(locks = self.locked.len(), "Rolling back in-memory transaction");
        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{product, sale};
    use std::time::Duration;

    #[tokio::test]
    async fn test_lock_is_exclusive_until_commit() {
        let store = MemoryStore::new();
        store.insert_product(product("p-1", "biz-1", 1000, 5));

        let mut first = store.begin().await.unwrap();
        first.lock_product("p-1").await.unwrap().unwrap();
        first.update_stock("p-1", 2).await.unwrap();

        let mut second = store.begin().await.unwrap();
        let blocked = tokio::time::timeout(Duration::from_millis(50), second.lock_product("p-1")).await;
        assert!(blocked.is_err(), "second lock must wait");

        first.commit().await.unwrap();

        let seen = second.lock_product("p-1").await.unwrap().unwrap();
        assert_eq!(seen.quantity_in_stock, 2);
    }

    #[tokio::test]
    async fn test_relock_returns_staged_view() {
        let store = MemoryStore::new();
        store.insert_product(product("p-1", "biz-1", 1000, 5));

        let mut tx = store.begin().await.unwrap();
        tx.lock_product("p-1").await.unwrap();
        tx.update_stock("p-1", 3).await.unwrap();

        let again = tx.lock_product("p-1").await.unwrap().unwrap();
        assert_eq!(again.quantity_in_stock, 3);
    }

    #[tokio::test]
    async fn test_rollback_and_drop_discard_everything() {
        let store = MemoryStore::new();
        store.insert_product(product("p-1", "biz-1", 1000, 5));

        let mut tx = store.begin().await.unwrap();
        tx.insert_sale(&sale("s-1", "biz-1", 0, 0)).await.unwrap();
        tx.lock_product("p-1").await.unwrap();
        tx.update_stock("p-1", 0).await.unwrap();
        tx.rollback().await.unwrap();

        {
            let mut tx = store.begin().await.unwrap();
            tx.lock_product("p-1").await.unwrap();
            tx.update_stock("p-1", 1).await.unwrap();
        }

        assert_eq!(store.product("p-1").await.unwrap().quantity_in_stock, 5);
        assert!(store.sales().is_empty());
    }

    #[tokio::test]
    async fn test_constraints() {
        let store = MemoryStore::new();
        store.insert_product(product("p-1", "biz-1", 1000, 5));

        let mut tx = store.begin().await.unwrap();
        assert!(matches!(
            tx.update_stock("p-1", 1).await,
            Err(DbError::NotFound { .. })
        ));

        tx.lock_product("p-1").await.unwrap();
        assert!(matches!(
            tx.update_stock("p-1", -1).await,
            Err(DbError::CheckViolation { .. })
        ));
        assert!(tx.lock_product("missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_soft_deleted_is_invisible() {
        let store = MemoryStore::new();
        let mut p = product("p-1", "biz-1", 1000, 5);
        p.deleted_at = Some(1);
        store.insert_product(p);

        let mut tx = store.begin().await.unwrap();
        assert!(tx.lock_product("p-1").await.unwrap().is_none());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_committed_sale_never_visible_before_its_stock() {
        let store = MemoryStore::new();
        store.insert_product(product("p-1", "biz-1", 100, 5));

        let observer = {
            let store = store.clone();
            tokio::spawn(async move {
                loop {
                    if !store.sales().is_empty() {
                        return store.product("p-1").await.unwrap().quantity_in_stock;
                    }
                    tokio::task::yield_now().await;
                }
            })
        };

        let mut tx = store.begin().await.unwrap();
        tx.insert_sale(&sale("s-1", "biz-1", 200, 0)).await.unwrap();
        tx.lock_product("p-1").await.unwrap().unwrap();
        tx.update_stock("p-1", 3).await.unwrap();
        tx.commit().await.unwrap();

        let seen = tokio::time::timeout(Duration::from_secs(5), observer)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(seen, 3);
    }
}
