//! # In-Memory Registry
//!
//! The `MarketStore` trait abstracts over entity storage so the
//! `Session` can run against an in-memory registry (fast, volatile) or
//! the redb-backed persistent store with identical semantics.
//!
//! The registry uses `BTreeMap` only, for deterministic iteration order.
//! Ids and event sequence numbers are allocated from saturating counters
//! starting at 1; 0 is never a valid id.

use crate::entity::{Notification, Order, Product, VerificationDocument};
use crate::event::LifecycleEvent;
use crate::export::MarketSnapshot;
use crate::types::{DocumentId, FarmgateError, NotificationId, OrderId, ProductId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// =============================================================================
// STORE COUNTS
// =============================================================================

/// Record counts per table, for the status endpoint and CLI output.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreCounts {
    pub orders: usize,
    pub products: usize,
    pub documents: usize,
    pub notifications: usize,
    pub events: usize,
}

// =============================================================================
// MARKET STORE TRAIT
// =============================================================================

/// Storage interface for all lifecycle-managed entities.
///
/// `put_*` is an upsert: it both creates and overwrites records. The
/// store never inspects status fields; legality is decided upstream by
/// the policy engine.
pub trait MarketStore {
    // ---- id allocation -------------------------------------------------

    /// Allocate the next order id.
    fn alloc_order_id(&mut self) -> Result<OrderId, FarmgateError>;
    /// Allocate the next product id.
    fn alloc_product_id(&mut self) -> Result<ProductId, FarmgateError>;
    /// Allocate the next document id.
    fn alloc_document_id(&mut self) -> Result<DocumentId, FarmgateError>;
    /// Allocate the next notification id.
    fn alloc_notification_id(&mut self) -> Result<NotificationId, FarmgateError>;

    // ---- orders --------------------------------------------------------

    /// Insert or overwrite an order record.
    fn put_order(&mut self, order: &Order) -> Result<(), FarmgateError>;
    /// Fetch an order by id.
    fn get_order(&self, id: OrderId) -> Result<Option<Order>, FarmgateError>;
    /// All orders, ordered by id.
    fn orders(&self) -> Result<Vec<Order>, FarmgateError>;

    // ---- products ------------------------------------------------------

    /// Insert or overwrite a product record.
    fn put_product(&mut self, product: &Product) -> Result<(), FarmgateError>;
    /// Fetch a product by id.
    fn get_product(&self, id: ProductId) -> Result<Option<Product>, FarmgateError>;
    /// All products, ordered by id.
    fn products(&self) -> Result<Vec<Product>, FarmgateError>;

    // ---- documents -----------------------------------------------------

    /// Insert or overwrite a document record.
    fn put_document(&mut self, document: &VerificationDocument) -> Result<(), FarmgateError>;
    /// Fetch a document by id.
    fn get_document(&self, id: DocumentId) -> Result<Option<VerificationDocument>, FarmgateError>;
    /// All documents, ordered by id.
    fn documents(&self) -> Result<Vec<VerificationDocument>, FarmgateError>;

    // ---- notifications -------------------------------------------------

    /// Insert or overwrite a notification record.
    fn put_notification(&mut self, notification: &Notification) -> Result<(), FarmgateError>;
    /// Fetch a notification by id.
    fn get_notification(&self, id: NotificationId)
    -> Result<Option<Notification>, FarmgateError>;
    /// All notifications, ordered by id.
    fn notifications(&self) -> Result<Vec<Notification>, FarmgateError>;
    /// Remove a notification. Returns whether it existed.
    fn remove_notification(&mut self, id: NotificationId) -> Result<bool, FarmgateError>;

    // ---- event log -----------------------------------------------------

    /// Append an event, assigning its sequence number. Returns the
    /// stored event.
    fn append_event(&mut self, event: LifecycleEvent) -> Result<LifecycleEvent, FarmgateError>;
    /// Events with `seq > since`, ordered by sequence number.
    fn events_since(&self, since: u64) -> Result<Vec<LifecycleEvent>, FarmgateError>;

    // ---- metrics & snapshot --------------------------------------------

    /// Record counts per table.
    fn counts(&self) -> Result<StoreCounts, FarmgateError>;
    /// Deterministic snapshot of every table, ordered by id.
    fn snapshot(&self) -> Result<MarketSnapshot, FarmgateError>;
    /// Replace all contents with a snapshot, rebuilding counters.
    fn restore(&mut self, snapshot: &MarketSnapshot) -> Result<(), FarmgateError>;
}

// =============================================================================
// IN-MEMORY REGISTRY
// =============================================================================

/// In-memory `MarketStore` backed by `BTreeMap`s.
#[derive(Debug, Clone, Default)]
pub struct Registry {
    orders: BTreeMap<OrderId, Order>,
    products: BTreeMap<ProductId, Product>,
    documents: BTreeMap<DocumentId, VerificationDocument>,
    notifications: BTreeMap<NotificationId, Notification>,
    events: Vec<LifecycleEvent>,
    next_order_id: u64,
    next_product_id: u64,
    next_document_id: u64,
    next_notification_id: u64,
    next_event_seq: u64,
}

impl Registry {
    /// Create a new empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn bump(counter: &mut u64) -> u64 {
        *counter = counter.saturating_add(1);
        *counter
    }
}

impl MarketStore for Registry {
    fn alloc_order_id(&mut self) -> Result<OrderId, FarmgateError> {
        Ok(OrderId(Self::bump(&mut self.next_order_id)))
    }

    fn alloc_product_id(&mut self) -> Result<ProductId, FarmgateError> {
        Ok(ProductId(Self::bump(&mut self.next_product_id)))
    }

    fn alloc_document_id(&mut self) -> Result<DocumentId, FarmgateError> {
        Ok(DocumentId(Self::bump(&mut self.next_document_id)))
    }

    fn alloc_notification_id(&mut self) -> Result<NotificationId, FarmgateError> {
        Ok(NotificationId(Self::bump(&mut self.next_notification_id)))
    }

    fn put_order(&mut self, order: &Order) -> Result<(), FarmgateError> {
        self.orders.insert(order.id, order.clone());
        Ok(())
    }

    fn get_order(&self, id: OrderId) -> Result<Option<Order>, FarmgateError> {
        Ok(self.orders.get(&id).cloned())
    }

    fn orders(&self) -> Result<Vec<Order>, FarmgateError> {
        Ok(self.orders.values().cloned().collect())
    }

    fn put_product(&mut self, product: &Product) -> Result<(), FarmgateError> {
        self.products.insert(product.id, product.clone());
        Ok(())
    }

    fn get_product(&self, id: ProductId) -> Result<Option<Product>, FarmgateError> {
        Ok(self.products.get(&id).cloned())
    }

    fn products(&self) -> Result<Vec<Product>, FarmgateError> {
        Ok(self.products.values().cloned().collect())
    }

    fn put_document(&mut self, document: &VerificationDocument) -> Result<(), FarmgateError> {
        self.documents.insert(document.id, document.clone());
        Ok(())
    }

    fn get_document(&self, id: DocumentId) -> Result<Option<VerificationDocument>, FarmgateError> {
        Ok(self.documents.get(&id).cloned())
    }

    fn documents(&self) -> Result<Vec<VerificationDocument>, FarmgateError> {
        Ok(self.documents.values().cloned().collect())
    }

    fn put_notification(&mut self, notification: &Notification) -> Result<(), FarmgateError> {
        self.notifications.insert(notification.id, notification.clone());
        Ok(())
    }

    fn get_notification(
        &self,
        id: NotificationId,
    ) -> Result<Option<Notification>, FarmgateError> {
        Ok(self.notifications.get(&id).cloned())
    }

    fn notifications(&self) -> Result<Vec<Notification>, FarmgateError> {
        Ok(self.notifications.values().cloned().collect())
    }

    fn remove_notification(&mut self, id: NotificationId) -> Result<bool, FarmgateError> {
        Ok(self.notifications.remove(&id).is_some())
    }

    fn append_event(&mut self, mut event: LifecycleEvent) -> Result<LifecycleEvent, FarmgateError> {
        event.seq = Self::bump(&mut self.next_event_seq);
        self.events.push(event.clone());
        Ok(event)
    }

    fn events_since(&self, since: u64) -> Result<Vec<LifecycleEvent>, FarmgateError> {
        Ok(self
            .events
            .iter()
            .filter(|e| e.seq > since)
            .cloned()
            .collect())
    }

    fn counts(&self) -> Result<StoreCounts, FarmgateError> {
        Ok(StoreCounts {
            orders: self.orders.len(),
            products: self.products.len(),
            documents: self.documents.len(),
            notifications: self.notifications.len(),
            events: self.events.len(),
        })
    }

    fn snapshot(&self) -> Result<MarketSnapshot, FarmgateError> {
        Ok(MarketSnapshot {
            orders: self.orders.values().cloned().collect(),
            products: self.products.values().cloned().collect(),
            documents: self.documents.values().cloned().collect(),
            notifications: self.notifications.values().cloned().collect(),
            events: self.events.clone(),
        })
    }

    fn restore(&mut self, snapshot: &MarketSnapshot) -> Result<(), FarmgateError> {
        self.orders = snapshot.orders.iter().map(|o| (o.id, o.clone())).collect();
        self.products = snapshot
            .products
            .iter()
            .map(|p| (p.id, p.clone()))
            .collect();
        self.documents = snapshot
            .documents
            .iter()
            .map(|d| (d.id, d.clone()))
            .collect();
        self.notifications = snapshot
            .notifications
            .iter()
            .map(|n| (n.id, n.clone()))
            .collect();
        self.events = snapshot.events.clone();
        self.events.sort_by_key(|e| e.seq);

        self.next_order_id = self.orders.keys().next_back().map_or(0, |id| id.0);
        self.next_product_id = self.products.keys().next_back().map_or(0, |id| id.0);
        self.next_document_id = self.documents.keys().next_back().map_or(0, |id| id.0);
        self.next_notification_id = self.notifications.keys().next_back().map_or(0, |id| id.0);
        self.next_event_seq = self.events.last().map_or(0, |e| e.seq);
        Ok(())
    }
}

// =============================================================================
// TESTS
// =============================================================================
