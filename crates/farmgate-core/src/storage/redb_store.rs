//! # redb-backed Entity Storage
//!
//! A disk-backed `MarketStore` using the redb embedded database:
//! - ACID transactions
//! - Crash safety (copy-on-write B-trees)
//! - MVCC (concurrent readers, single writer)
//! - Zero configuration
//!
//! Records are postcard-encoded. Id counters live in the metadata table
//! and are cached in memory; each allocation persists the counter so
//! ids are never reused across restarts.

use crate::entity::{Notification, Order, Product, VerificationDocument};
use crate::event::LifecycleEvent;
use crate::export::MarketSnapshot;
use crate::registry::{MarketStore, StoreCounts};
use crate::types::{DocumentId, FarmgateError, NotificationId, OrderId, ProductId};
use redb::{Database, ReadableDatabase, ReadableTable, ReadableTableMetadata, TableDefinition};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::path::Path;

/// Table for orders: OrderId(u64) -> serialized Order bytes
const ORDERS: TableDefinition<u64, &[u8]> = TableDefinition::new("orders");

/// Table for products: ProductId(u64) -> serialized Product bytes
const PRODUCTS: TableDefinition<u64, &[u8]> = TableDefinition::new("products");

/// Table for documents: DocumentId(u64) -> serialized VerificationDocument bytes
const DOCUMENTS: TableDefinition<u64, &[u8]> = TableDefinition::new("documents");

/// Table for notifications: NotificationId(u64) -> serialized Notification bytes
const NOTIFICATIONS: TableDefinition<u64, &[u8]> = TableDefinition::new("notifications");

/// Table for the event log: seq(u64) -> serialized LifecycleEvent bytes
const EVENTS: TableDefinition<u64, &[u8]> = TableDefinition::new("events");

/// Table for metadata: counter name -> value u64
const METADATA: TableDefinition<&str, u64> = TableDefinition::new("metadata");

const ALL_RECORD_TABLES: [TableDefinition<u64, &[u8]>; 5] =
    [ORDERS, PRODUCTS, DOCUMENTS, NOTIFICATIONS, EVENTS];

fn io_err(e: impl std::fmt::Display) -> FarmgateError {
    FarmgateError::IoError(e.to_string())
}

fn ser_err(e: impl std::fmt::Display) -> FarmgateError {
    FarmgateError::SerializationError(e.to_string())
}

fn de_err(e: impl std::fmt::Display) -> FarmgateError {
    FarmgateError::DeserializationError(e.to_string())
}

/// A disk-backed entity store using redb.
pub struct RedbStore {
    /// The redb database handle.
    db: Database,
    /// Cached counters, mirrored in the metadata table.
    next_order_id: u64,
    next_product_id: u64,
    next_document_id: u64,
    next_notification_id: u64,
    next_event_seq: u64,
}

impl std::fmt::Debug for RedbStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedbStore")
            .field("next_order_id", &self.next_order_id)
            .field("next_event_seq", &self.next_event_seq)
            .finish_non_exhaustive()
    }
}

impl RedbStore {
    /// Open or create a store database at the given path.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, FarmgateError> {
        let db = Database::create(path.as_ref()).map_err(io_err)?;

        // Initialize tables if they don't exist
        {
            let write_txn = db.begin_write().map_err(io_err)?;
            for table in ALL_RECORD_TABLES {
                let _ = write_txn.open_table(table).map_err(io_err)?;
            }
            let _ = write_txn.open_table(METADATA).map_err(io_err)?;
            write_txn.commit().map_err(io_err)?;
        }

        // Load counters
        let read_txn = db.begin_read().map_err(io_err)?;
        let table = read_txn.open_table(METADATA).map_err(io_err)?;
        let load = |key: &str| -> Result<u64, FarmgateError> {
            Ok(table.get(key).map_err(io_err)?.map(|v| v.value()).unwrap_or(0))
        };
        let next_order_id = load("next_order_id")?;
        let next_product_id = load("next_product_id")?;
        let next_document_id = load("next_document_id")?;
        let next_notification_id = load("next_notification_id")?;
        let next_event_seq = load("next_event_seq")?;

        Ok(Self {
            db,
            next_order_id,
            next_product_id,
            next_document_id,
            next_notification_id,
            next_event_seq,
        })
    }

    /// Compact the database (optional optimization).
    pub fn compact(&mut self) -> Result<(), FarmgateError> {
        self.db.compact().map_err(io_err)?;
        Ok(())
    }

    // ---- generic record helpers ----------------------------------------

    fn put_record<T: Serialize>(
        &self,
        table: TableDefinition<u64, &[u8]>,
        id: u64,
        value: &T,
    ) -> Result<(), FarmgateError> {
        let bytes = postcard::to_allocvec(value).map_err(ser_err)?;
        let write_txn = self.db.begin_write().map_err(io_err)?;
        {
            let mut t = write_txn.open_table(table).map_err(io_err)?;
            t.insert(id, bytes.as_slice()).map_err(io_err)?;
        }
        write_txn.commit().map_err(io_err)
    }

    fn get_record<T: DeserializeOwned>(
        &self,
        table: TableDefinition<u64, &[u8]>,
        id: u64,
    ) -> Result<Option<T>, FarmgateError> {
        let read_txn = self.db.begin_read().map_err(io_err)?;
        let t = read_txn.open_table(table).map_err(io_err)?;
        match t.get(id).map_err(io_err)? {
            Some(bytes) => Ok(Some(postcard::from_bytes(bytes.value()).map_err(de_err)?)),
            None => Ok(None),
        }
    }

    fn scan_records<T: DeserializeOwned>(
        &self,
        table: TableDefinition<u64, &[u8]>,
    ) -> Result<Vec<T>, FarmgateError> {
        let read_txn = self.db.begin_read().map_err(io_err)?;
        let t = read_txn.open_table(table).map_err(io_err)?;
        let mut out = Vec::new();
        for entry in t.iter().map_err(io_err)? {
            let (_, bytes) = entry.map_err(io_err)?;
            out.push(postcard::from_bytes(bytes.value()).map_err(de_err)?);
        }
        Ok(out)
    }

    fn remove_record(
        &self,
        table: TableDefinition<u64, &[u8]>,
        id: u64,
    ) -> Result<bool, FarmgateError> {
        let write_txn = self.db.begin_write().map_err(io_err)?;
        let existed = {
            let mut t = write_txn.open_table(table).map_err(io_err)?;
            t.remove(id).map_err(io_err)?.is_some()
        };
        write_txn.commit().map_err(io_err)?;
        Ok(existed)
    }

    fn table_len(&self, table: TableDefinition<u64, &[u8]>) -> Result<usize, FarmgateError> {
        let read_txn = self.db.begin_read().map_err(io_err)?;
        let t = read_txn.open_table(table).map_err(io_err)?;
        Ok(t.len().map_err(io_err)? as usize)
    }

    /// Bump a cached counter and persist it in the metadata table.
    fn alloc_counter(&self, key: &str, cached: &mut u64) -> Result<u64, FarmgateError> {
        let next = cached.saturating_add(1);
        let write_txn = self.db.begin_write().map_err(io_err)?;
        {
            let mut t = write_txn.open_table(METADATA).map_err(io_err)?;
            t.insert(key, next).map_err(io_err)?;
        }
        write_txn.commit().map_err(io_err)?;
        *cached = next;
        Ok(next)
    }
}

impl MarketStore for RedbStore {
    fn alloc_order_id(&mut self) -> Result<OrderId, FarmgateError> {
        let mut cached = self.next_order_id;
        let id = self.alloc_counter("next_order_id", &mut cached)?;
        self.next_order_id = cached;
        Ok(OrderId(id))
    }

    fn alloc_product_id(&mut self) -> Result<ProductId, FarmgateError> {
        let mut cached = self.next_product_id;
        let id = self.alloc_counter("next_product_id", &mut cached)?;
        self.next_product_id = cached;
        Ok(ProductId(id))
    }

    fn alloc_document_id(&mut self) -> Result<DocumentId, FarmgateError> {
        let mut cached = self.next_document_id;
        let id = self.alloc_counter("next_document_id", &mut cached)?;
        self.next_document_id = cached;
        Ok(DocumentId(id))
    }

    fn alloc_notification_id(&mut self) -> Result<NotificationId, FarmgateError> {
        let mut cached = self.next_notification_id;
        let id = self.alloc_counter("next_notification_id", &mut cached)?;
        self.next_notification_id = cached;
        Ok(NotificationId(id))
    }

    fn put_order(&mut self, order: &Order) -> Result<(), FarmgateError> {
        self.put_record(ORDERS, order.id.0, order)
    }

    fn get_order(&self, id: OrderId) -> Result<Option<Order>, FarmgateError> {
        self.get_record(ORDERS, id.0)
    }

    fn orders(&self) -> Result<Vec<Order>, FarmgateError> {
        self.scan_records(ORDERS)
    }

    fn put_product(&mut self, product: &Product) -> Result<(), FarmgateError> {
        self.put_record(PRODUCTS, product.id.0, product)
    }

    fn get_product(&self, id: ProductId) -> Result<Option<Product>, FarmgateError> {
        self.get_record(PRODUCTS, id.0)
    }

    fn products(&self) -> Result<Vec<Product>, FarmgateError> {
        self.scan_records(PRODUCTS)
    }

    fn put_document(&mut self, document: &VerificationDocument) -> Result<(), FarmgateError> {
        self.put_record(DOCUMENTS, document.id.0, document)
    }

    fn get_document(&self, id: DocumentId) -> Result<Option<VerificationDocument>, FarmgateError> {
        self.get_record(DOCUMENTS, id.0)
    }

    fn documents(&self) -> Result<Vec<VerificationDocument>, FarmgateError> {
        self.scan_records(DOCUMENTS)
    }

    fn put_notification(&mut self, notification: &Notification) -> Result<(), FarmgateError> {
        self.put_record(NOTIFICATIONS, notification.id.0, notification)
    }

    fn get_notification(
        &self,
        id: NotificationId,
    ) -> Result<Option<Notification>, FarmgateError> {
        self.get_record(NOTIFICATIONS, id.0)
    }

    fn notifications(&self) -> Result<Vec<Notification>, FarmgateError> {
        self.scan_records(NOTIFICATIONS)
    }

    fn remove_notification(&mut self, id: NotificationId) -> Result<bool, FarmgateError> {
        self.remove_record(NOTIFICATIONS, id.0)
    }

    fn append_event(&mut self, mut event: LifecycleEvent) -> Result<LifecycleEvent, FarmgateError> {
        let seq = self.next_event_seq.saturating_add(1);
        event.seq = seq;
        let bytes = postcard::to_allocvec(&event).map_err(ser_err)?;

        // Event write and counter update commit atomically.
        let write_txn = self.db.begin_write().map_err(io_err)?;
        {
            let mut events = write_txn.open_table(EVENTS).map_err(io_err)?;
            events.insert(seq, bytes.as_slice()).map_err(io_err)?;
            let mut meta = write_txn.open_table(METADATA).map_err(io_err)?;
            meta.insert("next_event_seq", seq).map_err(io_err)?;
        }
        write_txn.commit().map_err(io_err)?;
        self.next_event_seq = seq;
        Ok(event)
    }

    fn events_since(&self, since: u64) -> Result<Vec<LifecycleEvent>, FarmgateError> {
        let read_txn = self.db.begin_read().map_err(io_err)?;
        let t = read_txn.open_table(EVENTS).map_err(io_err)?;
        let mut out = Vec::new();
        for entry in t.range(since.saturating_add(1)..).map_err(io_err)? {
            let (_, bytes) = entry.map_err(io_err)?;
            out.push(postcard::from_bytes(bytes.value()).map_err(de_err)?);
        }
        Ok(out)
    }

    fn counts(&self) -> Result<StoreCounts, FarmgateError> {
        Ok(StoreCounts {
            orders: self.table_len(ORDERS)?,
            products: self.table_len(PRODUCTS)?,
            documents: self.table_len(DOCUMENTS)?,
            notifications: self.table_len(NOTIFICATIONS)?,
            events: self.table_len(EVENTS)?,
        })
    }

    fn snapshot(&self) -> Result<MarketSnapshot, FarmgateError> {
        let mut snapshot = MarketSnapshot {
            orders: self.scan_records(ORDERS)?,
            products: self.scan_records(PRODUCTS)?,
            documents: self.scan_records(DOCUMENTS)?,
            notifications: self.scan_records(NOTIFICATIONS)?,
            events: self.scan_records(EVENTS)?,
        };
        snapshot.normalize();
        Ok(snapshot)
    }

    fn restore(&mut self, snapshot: &MarketSnapshot) -> Result<(), FarmgateError> {
        fn insert_all<T: Serialize>(
            txn: &redb::WriteTransaction,
            table: TableDefinition<u64, &[u8]>,
            records: impl Iterator<Item = (u64, T)>,
        ) -> Result<(), FarmgateError> {
            let mut t = txn.open_table(table).map_err(io_err)?;
            for (id, record) in records {
                let bytes = postcard::to_allocvec(&record).map_err(ser_err)?;
                t.insert(id, bytes.as_slice()).map_err(io_err)?;
            }
            Ok(())
        }

        let next_order_id = snapshot.orders.iter().map(|o| o.id.0).max().unwrap_or(0);
        let next_product_id = snapshot.products.iter().map(|p| p.id.0).max().unwrap_or(0);
        let next_document_id = snapshot.documents.iter().map(|d| d.id.0).max().unwrap_or(0);
        let next_notification_id = snapshot
            .notifications
            .iter()
            .map(|n| n.id.0)
            .max()
            .unwrap_or(0);
        let next_event_seq = snapshot.events.iter().map(|e| e.seq).max().unwrap_or(0);

        // The whole restore commits atomically: drop the old tables,
        // repopulate, rewrite every counter.
        let write_txn = self.db.begin_write().map_err(io_err)?;
        for table in ALL_RECORD_TABLES {
            let _ = write_txn.delete_table(table).map_err(io_err)?;
        }
        insert_all(
            &write_txn,
            ORDERS,
            snapshot.orders.iter().map(|o| (o.id.0, o)),
        )?;
        insert_all(
            &write_txn,
            PRODUCTS,
            snapshot.products.iter().map(|p| (p.id.0, p)),
        )?;
        insert_all(
            &write_txn,
            DOCUMENTS,
            snapshot.documents.iter().map(|d| (d.id.0, d)),
        )?;
        insert_all(
            &write_txn,
            NOTIFICATIONS,
            snapshot.notifications.iter().map(|n| (n.id.0, n)),
        )?;
        insert_all(
            &write_txn,
            EVENTS,
            snapshot.events.iter().map(|e| (e.seq, e)),
        )?;
        {
            let mut meta = write_txn.open_table(METADATA).map_err(io_err)?;
            meta.insert("next_order_id", next_order_id).map_err(io_err)?;
            meta.insert("next_product_id", next_product_id)
                .map_err(io_err)?;
            meta.insert("next_document_id", next_document_id)
                .map_err(io_err)?;
            meta.insert("next_notification_id", next_notification_id)
                .map_err(io_err)?;
            meta.insert("next_event_seq", next_event_seq)
                .map_err(io_err)?;
        }
        write_txn.commit().map_err(io_err)?;

        self.next_order_id = next_order_id;
        self.next_product_id = next_product_id;
        self.next_document_id = next_document_id;
        self.next_notification_id = next_notification_id;
        self.next_event_seq = next_event_seq;
        Ok(())
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ActorId;
    use tempfile::TempDir;

    fn temp_store() -> (TempDir, RedbStore) {
        let dir = TempDir::new().expect("tempdir");
        let store = RedbStore::open(dir.path().join("farmgate.db")).expect("open");
        (dir, store)
    }

    #[test]
    fn open_initializes_empty_tables() {
        let (_dir, store) = temp_store();
        let counts = store.counts().expect("counts");
        assert_eq!(counts, StoreCounts::default());
    }

    #[test]
    fn order_round_trip() {
        let (_dir, mut store) = temp_store();
        let id = store.alloc_order_id().expect("alloc");
        let order = Order::new(id, ActorId(1), ActorId(2), 1_500, 42);
        store.put_order(&order).expect("put");

        let loaded = store.get_order(id).expect("get").expect("exists");
        assert_eq!(loaded, order);
        assert!(store.get_order(OrderId(999)).expect("get").is_none());
    }

    #[test]
    fn counters_survive_reopen() {
        let dir = TempDir::new().expect("tempdir");
        let path = dir.path().join("farmgate.db");
        {
            let mut store = RedbStore::open(&path).expect("open");
            assert_eq!(store.alloc_order_id().expect("alloc"), OrderId(1));
            assert_eq!(store.alloc_order_id().expect("alloc"), OrderId(2));
        }
        let mut reopened = RedbStore::open(&path).expect("reopen");
        assert_eq!(reopened.alloc_order_id().expect("alloc"), OrderId(3));
    }

    #[test]
    fn restore_replaces_contents_atomically() {
        let (_dir, mut store) = temp_store();
        let id = store.alloc_order_id().expect("alloc");
        store
            .put_order(&Order::new(id, ActorId(1), ActorId(2), 100, 0))
            .expect("put");

        let snapshot = MarketSnapshot {
            orders: vec![Order::new(OrderId(7), ActorId(3), ActorId(4), 900, 5)],
            ..MarketSnapshot::default()
        };
        store.restore(&snapshot).expect("restore");

        assert!(store.get_order(id).expect("get").is_none());
        assert!(store.get_order(OrderId(7)).expect("get").is_some());
        // counters continue after the restored max id
        assert_eq!(store.alloc_order_id().expect("alloc"), OrderId(8));
    }
}
