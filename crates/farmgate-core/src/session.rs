//! # Session Module
//!
//! The `Session` is the single authoritative entry point for every
//! lifecycle mutation. It:
//! - resolves the entity record from the configured backend,
//! - consults the policy engine (role gating) and the ownership rules,
//! - mutates only after every check has passed,
//! - appends exactly one lifecycle event per real status change.
//!
//! No transition is partially applied: checks happen before any write,
//! and an idempotent re-application of the current status returns
//! `Ok(None)` without touching the store.
//!
//! ## Storage Backends
//!
//! - `InMemory`: `Registry` (fast, volatile unless exported)
//! - `Persistent`: `RedbStore` for disk-backed ACID storage

use crate::entity::{Notification, Order, Product, VerificationDocument};
use crate::event::LifecycleEvent;
use crate::export::MarketSnapshot;
use crate::policy::Lifecycle;
use crate::primitives::{
    MAX_AMOUNT_CENTS, MAX_BODY_LENGTH, MAX_LABEL_LENGTH, MAX_LIST_PAGE, MAX_NAME_LENGTH,
};
use crate::registry::{MarketStore, Registry, StoreCounts};
use crate::storage::RedbStore;
use crate::types::{
    Actor, ActorId, DocumentId, EntityKind, FarmgateError, NotificationId, NotificationState,
    OrderId, OrderStatus, PaymentStatus, ProductId, ProductStatus, Role, VerificationStatus,
};
use std::path::Path;

// =============================================================================
// STORAGE BACKEND
// =============================================================================

/// Storage backend for a Session.
#[derive(Debug)]
pub enum StorageBackend {
    /// In-memory registry (fast, volatile).
    InMemory(Registry),
    /// Disk-backed store using redb (ACID, persistent).
    Persistent(RedbStore),
}

impl Default for StorageBackend {
    fn default() -> Self {
        Self::InMemory(Registry::new())
    }
}

// NOTE: StorageBackend does NOT implement Clone.
// RedbStore (database handle) cannot be safely cloned.

// =============================================================================
// SESSION
// =============================================================================

/// The authoritative lifecycle facade over a storage backend.
#[derive(Debug, Default)]
pub struct Session {
    backend: StorageBackend,
}

impl Session {
    /// Create a new empty session with in-memory storage.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a session with an existing in-memory registry.
    #[must_use]
    pub fn with_registry(registry: Registry) -> Self {
        Self {
            backend: StorageBackend::InMemory(registry),
        }
    }

    /// Create a session with persistent redb storage.
    ///
    /// Opens or creates a redb database at the given path.
    pub fn with_redb(path: impl AsRef<Path>) -> Result<Self, FarmgateError> {
        let store = RedbStore::open(path)?;
        Ok(Self {
            backend: StorageBackend::Persistent(store),
        })
    }

    /// Create a session with an existing RedbStore.
    #[must_use]
    pub fn with_redb_store(store: RedbStore) -> Self {
        Self {
            backend: StorageBackend::Persistent(store),
        }
    }

    /// Check if using persistent storage.
    #[must_use]
    pub fn is_persistent(&self) -> bool {
        matches!(self.backend, StorageBackend::Persistent(_))
    }

    fn store(&self) -> &dyn MarketStore {
        match &self.backend {
            StorageBackend::InMemory(registry) => registry,
            StorageBackend::Persistent(store) => store,
        }
    }

    fn store_mut(&mut self) -> &mut dyn MarketStore {
        match &mut self.backend {
            StorageBackend::InMemory(registry) => registry,
            StorageBackend::Persistent(store) => store,
        }
    }

    // =========================================================================
    // CREATION
    // =========================================================================

    /// Create a new pending order for a buyer against a farmer.
    pub fn create_order(
        &mut self,
        buyer: ActorId,
        farmer: ActorId,
        total_cents: u64,
        now_ms: u64,
    ) -> Result<Order, FarmgateError> {
        if total_cents == 0 || total_cents > MAX_AMOUNT_CENTS {
            return Err(FarmgateError::InvalidInput(format!(
                "order total {total_cents} cents out of range"
            )));
        }
        let store = self.store_mut();
        let id = store.alloc_order_id()?;
        let order = Order::new(id, buyer, farmer, total_cents, now_ms);
        store.put_order(&order)?;
        Ok(order)
    }

    /// Create a new unapproved product listing for a farmer.
    pub fn create_product(
        &mut self,
        farmer: ActorId,
        name: &str,
        unit_price_cents: u64,
        now_ms: u64,
    ) -> Result<Product, FarmgateError> {
        validate_text("product name", name, MAX_NAME_LENGTH)?;
        if unit_price_cents == 0 || unit_price_cents > MAX_AMOUNT_CENTS {
            return Err(FarmgateError::InvalidInput(format!(
                "unit price {unit_price_cents} cents out of range"
            )));
        }
        let store = self.store_mut();
        let id = store.alloc_product_id()?;
        let product = Product::new(id, farmer, name, unit_price_cents, now_ms);
        store.put_product(&product)?;
        Ok(product)
    }

    /// Submit a verification document for a farmer or logistics rider.
    pub fn submit_document(
        &mut self,
        owner: ActorId,
        owner_role: Role,
        label: &str,
        now_ms: u64,
    ) -> Result<VerificationDocument, FarmgateError> {
        validate_text("document label", label, MAX_LABEL_LENGTH)?;
        if !matches!(owner_role, Role::Farmer | Role::Logistics) {
            return Err(FarmgateError::InvalidInput(format!(
                "verification documents apply to farmers and logistics riders, not {owner_role}"
            )));
        }
        let store = self.store_mut();
        let id = store.alloc_document_id()?;
        let document = VerificationDocument::new(id, owner, owner_role, label, now_ms);
        store.put_document(&document)?;
        Ok(document)
    }

    /// Push a notification to a recipient.
    pub fn push_notification(
        &mut self,
        recipient: ActorId,
        body: &str,
        now_ms: u64,
    ) -> Result<Notification, FarmgateError> {
        validate_text("notification body", body, MAX_BODY_LENGTH)?;
        let store = self.store_mut();
        let id = store.alloc_notification_id()?;
        let notification = Notification::new(id, recipient, body, now_ms);
        store.put_notification(&notification)?;
        Ok(notification)
    }

    // =========================================================================
    // ORDER TRANSITIONS
    // =========================================================================

    /// Move an order to `target`.
    ///
    /// Returns `Ok(Some(event))` on a real change, `Ok(None)` if the
    /// order is already at `target` (idempotent no-op).
    pub fn transition_order(
        &mut self,
        id: OrderId,
        target: OrderStatus,
        actor: Actor,
        now_ms: u64,
    ) -> Result<Option<LifecycleEvent>, FarmgateError> {
        let mut order = self
            .store()
            .get_order(id)?
            .ok_or(FarmgateError::NotFound {
                kind: EntityKind::Order,
                id: id.0,
            })?;
        if order.order_status == target {
            return Ok(None);
        }
        order.order_status.check(target, actor.role)?;
        check_order_party(&order, actor)?;

        let old = order.order_status;
        order.order_status = target;
        order.updated_at_ms = now_ms;
        let store = self.store_mut();
        store.put_order(&order)?;
        let event = store.append_event(LifecycleEvent::pending(
            EntityKind::Order,
            id.0,
            old.as_str(),
            target.as_str(),
            actor,
            now_ms,
        ))?;
        Ok(Some(event))
    }

    /// Move an order's payment status to `target`.
    pub fn transition_payment(
        &mut self,
        id: OrderId,
        target: PaymentStatus,
        actor: Actor,
        now_ms: u64,
    ) -> Result<Option<LifecycleEvent>, FarmgateError> {
        let mut order = self
            .store()
            .get_order(id)?
            .ok_or(FarmgateError::NotFound {
                kind: EntityKind::Order,
                id: id.0,
            })?;
        if order.payment_status == target {
            return Ok(None);
        }
        order.payment_status.check(target, actor.role)?;
        // The paying party must be the owning buyer; admin refunds are
        // not ownership-gated.
        if actor.role == Role::Buyer && order.buyer != actor.id {
            return Err(FarmgateError::NotOwner {
                kind: EntityKind::Order,
                id: id.0,
            });
        }

        let old = order.payment_status;
        order.payment_status = target;
        order.updated_at_ms = now_ms;
        let store = self.store_mut();
        store.put_order(&order)?;
        let event = store.append_event(LifecycleEvent::pending(
            EntityKind::Payment,
            id.0,
            old.as_str(),
            target.as_str(),
            actor,
            now_ms,
        ))?;
        Ok(Some(event))
    }

    // =========================================================================
    // PRODUCT TRANSITIONS
    // =========================================================================

    /// Approve or reject a product listing (admin review).
    ///
    /// Approval makes the product visible to buyers; rejection returns
    /// it to unapproved, never to deleted.
    pub fn review_product(
        &mut self,
        id: ProductId,
        approve: bool,
        actor: Actor,
        now_ms: u64,
    ) -> Result<Option<LifecycleEvent>, FarmgateError> {
        let target = if approve {
            ProductStatus::Approved
        } else {
            ProductStatus::Unapproved
        };
        self.transition_product(id, target, actor, now_ms)
    }

    /// Soft-delete a product listing (admin or owning farmer).
    pub fn delete_product(
        &mut self,
        id: ProductId,
        actor: Actor,
        now_ms: u64,
    ) -> Result<Option<LifecycleEvent>, FarmgateError> {
        self.transition_product(id, ProductStatus::Deleted, actor, now_ms)
    }

    fn transition_product(
        &mut self,
        id: ProductId,
        target: ProductStatus,
        actor: Actor,
        now_ms: u64,
    ) -> Result<Option<LifecycleEvent>, FarmgateError> {
        let mut product = self
            .store()
            .get_product(id)?
            .ok_or(FarmgateError::NotFound {
                kind: EntityKind::Product,
                id: id.0,
            })?;
        if product.status == target {
            return Ok(None);
        }
        product.status.check(target, actor.role)?;
        // A farmer may only touch their own listings; admin is exempt.
        if actor.role == Role::Farmer && product.farmer != actor.id {
            return Err(FarmgateError::NotOwner {
                kind: EntityKind::Product,
                id: id.0,
            });
        }

        let old = product.status;
        product.status = target;
        product.updated_at_ms = now_ms;
        let store = self.store_mut();
        store.put_product(&product)?;
        let event = store.append_event(LifecycleEvent::pending(
            EntityKind::Product,
            id.0,
            old.as_str(),
            target.as_str(),
            actor,
            now_ms,
        ))?;
        Ok(Some(event))
    }

    // =========================================================================
    // DOCUMENT TRANSITIONS
    // =========================================================================

    /// Verify or reject a pending document (admin only).
    pub fn review_document(
        &mut self,
        id: DocumentId,
        verify: bool,
        actor: Actor,
        now_ms: u64,
    ) -> Result<Option<LifecycleEvent>, FarmgateError> {
        let target = if verify {
            VerificationStatus::Verified
        } else {
            VerificationStatus::Rejected
        };
        let mut document = self
            .store()
            .get_document(id)?
            .ok_or(FarmgateError::NotFound {
                kind: EntityKind::Document,
                id: id.0,
            })?;
        if document.status == target {
            return Ok(None);
        }
        document.status.check(target, actor.role)?;

        let old = document.status;
        document.status = target;
        document.reviewed_at_ms = Some(now_ms);
        let store = self.store_mut();
        store.put_document(&document)?;
        let event = store.append_event(LifecycleEvent::pending(
            EntityKind::Document,
            id.0,
            old.as_str(),
            target.as_str(),
            actor,
            now_ms,
        ))?;
        Ok(Some(event))
    }

    // =========================================================================
    // NOTIFICATION TRANSITIONS
    // =========================================================================

    /// Mark a notification as read (recipient only).
    pub fn read_notification(
        &mut self,
        id: NotificationId,
        actor: Actor,
        now_ms: u64,
    ) -> Result<Option<LifecycleEvent>, FarmgateError> {
        let mut notification =
            self.store()
                .get_notification(id)?
                .ok_or(FarmgateError::NotFound {
                    kind: EntityKind::Notification,
                    id: id.0,
                })?;
        if notification.state == NotificationState::Read {
            return Ok(None);
        }
        notification
            .state
            .check(NotificationState::Read, actor.role)?;
        if notification.recipient != actor.id {
            return Err(FarmgateError::NotOwner {
                kind: EntityKind::Notification,
                id: id.0,
            });
        }

        let old = notification.state;
        notification.state = NotificationState::Read;
        let store = self.store_mut();
        store.put_notification(&notification)?;
        let event = store.append_event(LifecycleEvent::pending(
            EntityKind::Notification,
            id.0,
            old.as_str(),
            NotificationState::Read.as_str(),
            actor,
            now_ms,
        ))?;
        Ok(Some(event))
    }

    /// Delete a notification (recipient or admin). Returns whether it
    /// existed. Deletion is a removal, not a status change, so it does
    /// not emit a lifecycle event.
    pub fn delete_notification(
        &mut self,
        id: NotificationId,
        actor: Actor,
    ) -> Result<bool, FarmgateError> {
        let notification =
            self.store()
                .get_notification(id)?
                .ok_or(FarmgateError::NotFound {
                    kind: EntityKind::Notification,
                    id: id.0,
                })?;
        if actor.role != Role::Admin && notification.recipient != actor.id {
            return Err(FarmgateError::NotOwner {
                kind: EntityKind::Notification,
                id: id.0,
            });
        }
        self.store_mut().remove_notification(id)
    }

    // =========================================================================
    // READS
    // =========================================================================

    /// Fetch an order by id.
    pub fn get_order(&self, id: OrderId) -> Result<Option<Order>, FarmgateError> {
        self.store().get_order(id)
    }

    /// List orders, optionally filtered by status. Bounded by
    /// `MAX_LIST_PAGE`.
    pub fn list_orders(
        &self,
        status: Option<OrderStatus>,
    ) -> Result<Vec<Order>, FarmgateError> {
        let mut orders = self.store().orders()?;
        if let Some(status) = status {
            orders.retain(|o| o.order_status == status);
        }
        orders.truncate(MAX_LIST_PAGE);
        Ok(orders)
    }

    /// Fetch a product by id.
    pub fn get_product(&self, id: ProductId) -> Result<Option<Product>, FarmgateError> {
        self.store().get_product(id)
    }

    /// List products, optionally filtered by status. Bounded by
    /// `MAX_LIST_PAGE`.
    pub fn list_products(
        &self,
        status: Option<ProductStatus>,
    ) -> Result<Vec<Product>, FarmgateError> {
        let mut products = self.store().products()?;
        if let Some(status) = status {
            products.retain(|p| p.status == status);
        }
        products.truncate(MAX_LIST_PAGE);
        Ok(products)
    }

    /// Fetch a document by id.
    pub fn get_document(
        &self,
        id: DocumentId,
    ) -> Result<Option<VerificationDocument>, FarmgateError> {
        self.store().get_document(id)
    }

    /// List documents, optionally filtered by status. Bounded by
    /// `MAX_LIST_PAGE`.
    pub fn list_documents(
        &self,
        status: Option<VerificationStatus>,
    ) -> Result<Vec<VerificationDocument>, FarmgateError> {
        let mut documents = self.store().documents()?;
        if let Some(status) = status {
            documents.retain(|d| d.status == status);
        }
        documents.truncate(MAX_LIST_PAGE);
        Ok(documents)
    }

    /// List notifications for a recipient. Bounded by `MAX_LIST_PAGE`.
    pub fn list_notifications(
        &self,
        recipient: ActorId,
    ) -> Result<Vec<Notification>, FarmgateError> {
        let mut notifications = self.store().notifications()?;
        notifications.retain(|n| n.recipient == recipient);
        notifications.truncate(MAX_LIST_PAGE);
        Ok(notifications)
    }

    /// Events with `seq > since`, bounded by `MAX_LIST_PAGE`.
    pub fn events_since(&self, since: u64) -> Result<Vec<LifecycleEvent>, FarmgateError> {
        let mut events = self.store().events_since(since)?;
        events.truncate(MAX_LIST_PAGE);
        Ok(events)
    }

    /// Record counts per table.
    pub fn metrics(&self) -> Result<StoreCounts, FarmgateError> {
        self.store().counts()
    }

    // =========================================================================
    // SNAPSHOT
    // =========================================================================

    /// Build a deterministic snapshot of every table.
    pub fn export_snapshot(&self) -> Result<MarketSnapshot, FarmgateError> {
        self.store().snapshot()
    }

    /// Replace all contents with a snapshot.
    pub fn import_snapshot(&mut self, snapshot: &MarketSnapshot) -> Result<(), FarmgateError> {
        self.store_mut().restore(snapshot)
    }
}

// =============================================================================
// HELPERS
// =============================================================================

fn validate_text(what: &str, text: &str, max: usize) -> Result<(), FarmgateError> {
    if text.is_empty() {
        return Err(FarmgateError::InvalidInput(format!("{what} is empty")));
    }
    if text.len() > max {
        return Err(FarmgateError::InvalidInput(format!(
            "{what} length {} exceeds maximum {max} bytes",
            text.len()
        )));
    }
    Ok(())
}

/// Ownership gate for order transitions: the buyer hop must come from
/// the owning buyer, the farmer hop from the fulfilling farmer. Any
/// logistics actor may perform the shipping hops (rider assignment is
/// not modeled).
fn check_order_party(order: &Order, actor: Actor) -> Result<(), FarmgateError> {
    let owns = match actor.role {
        Role::Buyer => order.buyer == actor.id,
        Role::Farmer => order.farmer == actor.id,
        Role::Logistics | Role::Admin => true,
    };
    if owns {
        Ok(())
    } else {
        Err(FarmgateError::NotOwner {
            kind: EntityKind::Order,
            id: order.id.0,
        })
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    const BUYER: Actor = Actor::new(ActorId(10), Role::Buyer);
    const FARMER: Actor = Actor::new(ActorId(20), Role::Farmer);
    const RIDER: Actor = Actor::new(ActorId(30), Role::Logistics);
    const ADMIN: Actor = Actor::new(ActorId(1), Role::Admin);

    fn session_with_order() -> (Session, OrderId) {
        let mut session = Session::new();
        let order = session
            .create_order(BUYER.id, FARMER.id, 2_500, 1_000)
            .expect("create");
        (session, order.id)
    }

    #[test]
    fn full_pipeline_emits_one_event_per_hop() {
        let (mut session, id) = session_with_order();

        let hops = [
            (OrderStatus::Confirmed, FARMER),
            (OrderStatus::Preparing, FARMER),
            (OrderStatus::Shipped, RIDER),
            (OrderStatus::Delivered, RIDER),
            (OrderStatus::Completed, BUYER),
        ];
        for (target, actor) in hops {
            let event = session
                .transition_order(id, target, actor, 2_000)
                .expect("transition")
                .expect("event");
            assert_eq!(event.new_status, target.as_str());
        }
        let events = session.events_since(0).expect("events");
        assert_eq!(events.len(), 5);
        assert_eq!(events[2].old_status, "preparing");
        assert_eq!(events[2].new_status, "shipped");
    }

    #[test]
    fn idempotent_target_is_a_no_op() {
        let (mut session, id) = session_with_order();
        let outcome = session
            .transition_order(id, OrderStatus::Pending, BUYER, 2_000)
            .expect("no-op");
        assert!(outcome.is_none());
        assert!(session.events_since(0).expect("events").is_empty());
        // timestamp untouched by the no-op
        let order = session.get_order(id).expect("get").expect("exists");
        assert_eq!(order.updated_at_ms, 1_000);
    }

    #[test]
    fn illegal_transition_leaves_order_unchanged() {
        let (mut session, id) = session_with_order();
        let err = session
            .transition_order(id, OrderStatus::Shipped, RIDER, 2_000)
            .expect_err("skip must fail");
        assert!(matches!(err, FarmgateError::InvalidTransition { .. }));

        let order = session.get_order(id).expect("get").expect("exists");
        assert_eq!(order.order_status, OrderStatus::Pending);
        assert_eq!(order.updated_at_ms, 1_000);
        assert!(session.events_since(0).expect("events").is_empty());
    }

    #[test]
    fn buyer_cannot_confirm() {
        let (mut session, id) = session_with_order();
        let err = session
            .transition_order(id, OrderStatus::Confirmed, BUYER, 2_000)
            .expect_err("must fail");
        assert!(matches!(err, FarmgateError::InvalidTransition { .. }));
    }

    #[test]
    fn wrong_buyer_cannot_cancel() {
        let (mut session, id) = session_with_order();
        let stranger = Actor::new(ActorId(99), Role::Buyer);
        let err = session
            .transition_order(id, OrderStatus::Cancelled, stranger, 2_000)
            .expect_err("must fail");
        assert!(matches!(err, FarmgateError::NotOwner { .. }));
    }

    #[test]
    fn unknown_order_is_not_found() {
        let mut session = Session::new();
        let err = session
            .transition_order(OrderId(404), OrderStatus::Cancelled, BUYER, 0)
            .expect_err("must fail");
        assert!(matches!(err, FarmgateError::NotFound { .. }));
    }

    #[test]
    fn payment_settles_and_refunds() {
        let (mut session, id) = session_with_order();
        session
            .transition_payment(id, PaymentStatus::Paid, BUYER, 2_000)
            .expect("pay")
            .expect("event");
        let err = session
            .transition_payment(id, PaymentStatus::Refunded, BUYER, 3_000)
            .expect_err("buyer refund must fail");
        assert!(matches!(err, FarmgateError::InvalidTransition { .. }));
        session
            .transition_payment(id, PaymentStatus::Refunded, ADMIN, 3_000)
            .expect("refund")
            .expect("event");
        let order = session.get_order(id).expect("get").expect("exists");
        assert_eq!(order.payment_status, PaymentStatus::Refunded);
    }

    #[test]
    fn product_approve_then_reject_is_unapproved_not_deleted() {
        let mut session = Session::new();
        let product = session
            .create_product(FARMER.id, "Heritage tomatoes", 450, 1_000)
            .expect("create");

        session
            .review_product(product.id, true, ADMIN, 2_000)
            .expect("approve")
            .expect("event");
        let approved = session
            .get_product(product.id)
            .expect("get")
            .expect("exists");
        assert!(approved.status.is_approved());

        session
            .review_product(product.id, false, ADMIN, 3_000)
            .expect("reject")
            .expect("event");
        let rejected = session
            .get_product(product.id)
            .expect("get")
            .expect("exists");
        assert_eq!(rejected.status, ProductStatus::Unapproved);
    }

    #[test]
    fn farmer_deletes_own_listing_only() {
        let mut session = Session::new();
        let product = session
            .create_product(FARMER.id, "Raw honey", 1_200, 1_000)
            .expect("create");

        let other_farmer = Actor::new(ActorId(77), Role::Farmer);
        let err = session
            .delete_product(product.id, other_farmer, 2_000)
            .expect_err("must fail");
        assert!(matches!(err, FarmgateError::NotOwner { .. }));

        session
            .delete_product(product.id, FARMER, 2_000)
            .expect("delete")
            .expect("event");
        let deleted = session
            .get_product(product.id)
            .expect("get")
            .expect("record survives");
        assert_eq!(deleted.status, ProductStatus::Deleted);
    }

    #[test]
    fn non_admin_cannot_verify_document() {
        let mut session = Session::new();
        let doc = session
            .submit_document(FARMER.id, Role::Farmer, "business licence", 1_000)
            .expect("submit");
        let err = session
            .review_document(doc.id, true, FARMER, 2_000)
            .expect_err("must fail");
        assert!(matches!(err, FarmgateError::InvalidTransition { .. }));

        session
            .review_document(doc.id, true, ADMIN, 2_000)
            .expect("verify")
            .expect("event");
        let verified = session.get_document(doc.id).expect("get").expect("exists");
        assert_eq!(verified.status, VerificationStatus::Verified);
        assert_eq!(verified.reviewed_at_ms, Some(2_000));
    }

    #[test]
    fn notification_read_and_delete_are_recipient_gated() {
        let mut session = Session::new();
        let note = session
            .push_notification(BUYER.id, "Your order shipped", 1_000)
            .expect("push");

        let err = session
            .read_notification(note.id, FARMER, 2_000)
            .expect_err("must fail");
        assert!(matches!(err, FarmgateError::NotOwner { .. }));

        // listing is scoped to the recipient
        assert_eq!(session.list_notifications(BUYER.id).expect("list").len(), 1);
        assert!(
            session
                .list_notifications(FARMER.id)
                .expect("list")
                .is_empty()
        );

        session
            .read_notification(note.id, BUYER, 2_000)
            .expect("read")
            .expect("event");
        // second read is a no-op
        assert!(
            session
                .read_notification(note.id, BUYER, 3_000)
                .expect("no-op")
                .is_none()
        );

        assert!(session.delete_notification(note.id, BUYER).expect("delete"));
        assert!(matches!(
            session.delete_notification(note.id, BUYER),
            Err(FarmgateError::NotFound { .. })
        ));
    }

    #[test]
    fn list_filters_by_status() {
        let (mut session, id) = session_with_order();
        session
            .create_order(BUYER.id, FARMER.id, 900, 1_100)
            .expect("create");
        session
            .transition_order(id, OrderStatus::Confirmed, FARMER, 2_000)
            .expect("confirm");

        let pending = session
            .list_orders(Some(OrderStatus::Pending))
            .expect("list");
        assert_eq!(pending.len(), 1);
        let all = session.list_orders(None).expect("list");
        assert_eq!(all.len(), 2);
    }

    #[test]
    fn snapshot_round_trip_preserves_state() {
        let (mut session, id) = session_with_order();
        session
            .transition_order(id, OrderStatus::Confirmed, FARMER, 2_000)
            .expect("confirm");

        let snapshot = session.export_snapshot().expect("snapshot");
        let mut restored = Session::new();
        restored.import_snapshot(&snapshot).expect("import");

        let order = restored.get_order(id).expect("get").expect("exists");
        assert_eq!(order.order_status, OrderStatus::Confirmed);
        assert_eq!(restored.events_since(0).expect("events").len(), 1);
    }

    #[test]
    fn create_order_rejects_zero_total() {
        let mut session = Session::new();
        let err = session
            .create_order(BUYER.id, FARMER.id, 0, 0)
            .expect_err("must fail");
        assert!(matches!(err, FarmgateError::InvalidInput(_)));
    }
}
