//! # Order Repository
//!
//! Database operations for orders and their line items.
//!
//! ## Order Creation
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                  Atomic Order Write                                     │
//! │                                                                         │
//! │  BEGIN                                                                 │
//! │   ├── INSERT INTO orders (...)            → order_id                   │
//! │   ├── INSERT INTO order_items (order_id, ...)   × N                    │
//! │   │      └── unknown menu_item_id → FOREIGN KEY failure ──┐            │
//! │  COMMIT ◄── all rows visible together                     │            │
//! │                                                           ▼            │
//! │                              transaction dropped → ROLLBACK           │
//! │                              (no order row, no item rows)              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Listing
//! Orders are read with the owner's name and email joined, then each order's
//! items are fetched with a second query (one per order). Pages are small,
//! so the extra round-trips are accepted.

use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::{debug, info};

use crate::error::{DbError, DbResult};
use cafe_core::{CheckoutPlan, Order, OrderItem, OrderStatus, Page, PageRequest};

const SELECT_ORDER: &str = r#"
    SELECT
        o.id,
        o.user_id,
        o.total_amount_cents,
        o.status,
        o.delivery_address,
        o.phone,
        o.notes,
        o.order_date,
        o.order_type,
        o.pickup_time,
        o.customer_name,
        o.customer_email,
        o.subtotal_cents,
        o.tax_cents,
        o.delivery_fee_cents,
        o.coupon_code,
        o.discount_cents,
        o.payment_method,
        o.payment_status,
        o.display_order_id,
        u.name AS user_name,
        u.email AS user_email
    FROM orders o
    LEFT JOIN users u ON u.id = o.user_id
"#;

/// One line of an order about to be written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewOrderLine {
    pub menu_item_id: i64,
    pub quantity: i64,
    pub price_cents: i64,
    pub name_snapshot: Option<String>,
}

/// An order placed through the plain `POST /api/orders` flow.
///
/// The total is taken as given; no checkout metadata is stored.
#[derive(Debug, Clone)]
pub struct NewSimpleOrder {
    pub user_id: i64,
    pub lines: Vec<NewOrderLine>,
    pub total_amount_cents: i64,
    pub delivery_address: Option<String>,
    pub phone: Option<String>,
}

/// Contact details captured by the checkout form.
#[derive(Debug, Clone, Default)]
pub struct CheckoutContact {
    pub customer_name: String,
    pub customer_email: String,
    pub phone: Option<String>,
    pub delivery_address: Option<String>,
    pub notes: Option<String>,
}

/// Repository for order database operations.
#[derive(Debug, Clone)]
pub struct OrderRepository {
    pool: SqlitePool,
}

impl OrderRepository {
    /// Creates a new OrderRepository.
    pub fn new(pool: SqlitePool) -> Self {
        OrderRepository { pool }
    }

    // =========================================================================
    // Writes
    // =========================================================================

    /// Persists a priced checkout: one order row plus one row per cart line,
    /// all or nothing.
    ///
    /// ## Returns
    /// The new order id.
    ///
    /// ## Errors
    /// Any failing insert (most often [`DbError::ForeignKeyViolation`] for an
    /// unknown menu item) rolls the whole order back.
    pub async fn create_checkout(
        &self,
        user_id: i64,
        contact: &CheckoutContact,
        plan: &CheckoutPlan,
    ) -> DbResult<i64> {
        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            r#"
            INSERT INTO orders (
                user_id, total_amount_cents, status,
                delivery_address, phone, notes, order_date,
                order_type, pickup_time, customer_name, customer_email,
                subtotal_cents, tax_cents, delivery_fee_cents,
                coupon_code, discount_cents,
                payment_method, payment_status, display_order_id
            ) VALUES (
                ?1, ?2, ?3,
                ?4, ?5, ?6, ?7,
                ?8, ?9, ?10, ?11,
                ?12, ?13, ?14,
                ?15, ?16,
                ?17, ?18, ?19
            )
            "#,
        )
        .bind(user_id)
        .bind(plan.breakdown.final_amount.cents())
        .bind(plan.status)
        .bind(&contact.delivery_address)
        .bind(&contact.phone)
        .bind(&contact.notes)
        .bind(Utc::now())
        .bind(plan.order_type)
        .bind(plan.pickup_time)
        .bind(&contact.customer_name)
        .bind(&contact.customer_email)
        .bind(plan.breakdown.subtotal.cents())
        .bind(plan.breakdown.tax.cents())
        .bind(plan.breakdown.delivery_fee.cents())
        .bind(&plan.coupon_code)
        .bind(plan.breakdown.discount.cents())
        .bind(plan.payment_method)
        .bind(plan.payment_status)
        .bind(&plan.display_order_id)
        .execute(&mut *tx)
        .await?;

        let order_id = result.last_insert_rowid();

        for line in &plan.lines {
            let line = NewOrderLine {
                menu_item_id: line.menu_item_id,
                quantity: line.quantity,
                price_cents: line.price.cents(),
                name_snapshot: line.name.clone(),
            };
            insert_line(&mut tx, order_id, &line).await?;
        }

        tx.commit().await?;

        info!(
            order_id,
            user_id,
            display_order_id = %plan.display_order_id,
            lines = plan.lines.len(),
            total_cents = plan.breakdown.final_amount.cents(),
            "Checkout order created"
        );

        Ok(order_id)
    }

    /// Persists a simple order with status `pending`, atomically.
    pub async fn create_simple(&self, order: &NewSimpleOrder) -> DbResult<i64> {
        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            r#"
            INSERT INTO orders (
                user_id, total_amount_cents, status,
                delivery_address, phone, order_date
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
        )
        .bind(order.user_id)
        .bind(order.total_amount_cents)
        .bind(OrderStatus::Pending)
        .bind(&order.delivery_address)
        .bind(&order.phone)
        .bind(Utc::now())
        .execute(&mut *tx)
        .await?;

        let order_id = result.last_insert_rowid();

        for line in &order.lines {
            insert_line(&mut tx, order_id, line).await?;
        }

        tx.commit().await?;

        info!(order_id, user_id = order.user_id, lines = order.lines.len(), "Order created");
        Ok(order_id)
    }

    /// Sets an order's status. The only mutation an order allows.
    ///
    /// ## Errors
    /// [`DbError::NotFound`] when no order has this id.
    pub async fn update_status(&self, id: i64, status: OrderStatus) -> DbResult<()> {
        let result = sqlx::query("UPDATE orders SET status = ?2 WHERE id = ?1")
            .bind(id)
            .bind(status)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Order", id));
        }

        info!(order_id = id, status = %status, "Order status updated");
        Ok(())
    }

    // =========================================================================
    // Reads
    // =========================================================================

    /// Gets an order by ID, items included.
    pub async fn get(&self, id: i64) -> DbResult<Option<Order>> {
        let sql = format!("{SELECT_ORDER} WHERE o.id = ?1");
        let order = sqlx::query_as::<_, Order>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        match order {
            Some(mut order) => {
                order.items = self.get_items(order.id).await?;
                Ok(Some(order))
            }
            None => Ok(None),
        }
    }

    /// Gets all items of an order, with the current menu name joined.
    pub async fn get_items(&self, order_id: i64) -> DbResult<Vec<OrderItem>> {
        let items = sqlx::query_as::<_, OrderItem>(
            r#"
            SELECT
                oi.id,
                oi.order_id,
                oi.menu_item_id,
                oi.quantity,
                oi.price_cents,
                oi.name_snapshot,
                mi.name AS menu_item_name
            FROM order_items oi
            LEFT JOIN menu_items mi ON mi.id = oi.menu_item_id
            WHERE oi.order_id = ?1
            ORDER BY oi.id
            "#,
        )
        .bind(order_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(items)
    }

    /// One page of all orders, newest first, with owner and items.
    pub async fn list_all(&self, request: PageRequest) -> DbResult<Page<Order>> {
        let total = self.count().await?;

        let sql = format!("{SELECT_ORDER} ORDER BY o.order_date DESC, o.id DESC LIMIT ?1 OFFSET ?2");
        let orders = sqlx::query_as::<_, Order>(&sql)
            .bind(request.limit() as i64)
            .bind(request.offset())
            .fetch_all(&self.pool)
            .await?;

        debug!(page = request.page(), rows = orders.len(), total, "Listed orders");

        let orders = self.attach_items(orders).await?;
        Ok(Page::new(orders, request, total))
    }

    /// Every order of one user, newest first, with items.
    pub async fn list_for_user(&self, user_id: i64) -> DbResult<Vec<Order>> {
        let sql = format!("{SELECT_ORDER} WHERE o.user_id = ?1 ORDER BY o.order_date DESC, o.id DESC");
        let orders = sqlx::query_as::<_, Order>(&sql)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?;

        self.attach_items(orders).await
    }

    /// The `limit` most recent orders, without items.
    pub async fn recent(&self, limit: i64) -> DbResult<Vec<Order>> {
        let sql = format!("{SELECT_ORDER} ORDER BY o.order_date DESC, o.id DESC LIMIT ?1");
        let orders = sqlx::query_as::<_, Order>(&sql)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;
        Ok(orders)
    }

    /// Counts orders.
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM orders")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    async fn attach_items(&self, mut orders: Vec<Order>) -> DbResult<Vec<Order>> {
        for order in &mut orders {
            order.items = self.get_items(order.id).await?;
        }
        Ok(orders)
    }
}

async fn insert_line(conn: &mut SqliteConnection, order_id: i64, line: &NewOrderLine) -> DbResult<()> {
    debug!(order_id, menu_item_id = line.menu_item_id, quantity = line.quantity, "Adding order item");

    sqlx::query(
        r#"
        INSERT INTO order_items (order_id, menu_item_id, quantity, price_cents, name_snapshot)
        VALUES (?1, ?2, ?3, ?4, ?5)
        "#,
    )
    .bind(order_id)
    .bind(line.menu_item_id)
    .bind(line.quantity)
    .bind(line.price_cents)
    .bind(&line.name_snapshot)
    .execute(conn)
    .await?;

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::menu::NewMenuItem;
    use crate::repository::test_support::test_db;
    use crate::repository::user::NewUser;
    use crate::Database;
    use cafe_core::checkout::CheckoutOptions;
    use cafe_core::{CartLine, Money, OrderType, PaymentMethod, PaymentStatus, PricingPolicy};

    async fn seed_user(db: &Database, email: &str) -> i64 {
        db.users()
            .create(&NewUser {
                name: "Asha".to_string(),
                email: email.to_string(),
                password_hash: "hash".to_string(),
                role: Default::default(),
                phone: None,
                address: None,
            })
            .await
            .unwrap()
            .id
    }

    async fn seed_item(db: &Database, name: &str, price_cents: i64) -> i64 {
        db.menu()
            .create(&NewMenuItem {
                name: name.to_string(),
                category_id: None,
                description: None,
                price_cents,
                image: None,
            })
            .await
            .unwrap()
            .id
    }

    fn plan_for(lines: Vec<CartLine>, method: PaymentMethod) -> CheckoutPlan {
        PricingPolicy::default()
            .plan(
                lines,
                &CheckoutOptions {
                    order_type: OrderType::Delivery,
                    pickup_slot: None,
                    payment_method: method,
                    coupon_code: None,
                },
                Utc::now(),
                "KK-ABCDEF".to_string(),
            )
            .unwrap()
    }

    fn cart_line(menu_item_id: i64, quantity: i64, price_cents: i64) -> CartLine {
        CartLine {
            menu_item_id,
            name: Some("Filter Coffee".to_string()),
            quantity,
            price: Money::from_cents(price_cents),
        }
    }

    async fn row_counts(db: &Database) -> (i64, i64) {
        let orders: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM orders")
            .fetch_one(db.pool())
            .await
            .unwrap();
        let items: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM order_items")
            .fetch_one(db.pool())
            .await
            .unwrap();
        (orders, items)
    }

    #[tokio::test]
    async fn test_checkout_writes_order_and_items() {
        let db = test_db().await;
        let user_id = seed_user(&db, "asha@kube.cafe").await;
        let coffee = seed_item(&db, "Filter Coffee", 5_000).await;
        let bun = seed_item(&db, "Bun Maska", 4_000).await;

        let plan = plan_for(
            vec![cart_line(coffee, 2, 5_000), cart_line(bun, 1, 4_000)],
            PaymentMethod::Cod,
        );
        let contact = CheckoutContact {
            customer_name: "Asha".to_string(),
            customer_email: "asha@kube.cafe".to_string(),
            phone: Some("9876543210".to_string()),
            delivery_address: Some("12 MG Road".to_string()),
            notes: Some("Less sugar".to_string()),
        };

        let order_id = db.orders().create_checkout(user_id, &contact, &plan).await.unwrap();
        assert_eq!(row_counts(&db).await, (1, 2));

        let order = db.orders().get(order_id).await.unwrap().unwrap();
        assert_eq!(order.status, OrderStatus::Preparing);
        assert_eq!(order.payment_status, Some(PaymentStatus::Pending));
        assert_eq!(order.total_amount_cents, plan.breakdown.final_amount.cents());
        assert_eq!(order.display_order_id.as_deref(), Some("KK-ABCDEF"));
        assert_eq!(order.notes.as_deref(), Some("Less sugar"));
        assert_eq!(order.user_name.as_deref(), Some("Asha"));
        assert_eq!(order.items.len(), 2);
        assert_eq!(order.items[0].name_snapshot.as_deref(), Some("Filter Coffee"));
    }

    #[tokio::test]
    async fn test_checkout_rolls_back_on_unknown_menu_item() {
        let db = test_db().await;
        let user_id = seed_user(&db, "ravi@kube.cafe").await;
        let coffee = seed_item(&db, "Filter Coffee", 5_000).await;

        let plan = plan_for(
            vec![cart_line(coffee, 1, 5_000), cart_line(9_999, 1, 5_000)],
            PaymentMethod::Upi,
        );

        let result = db
            .orders()
            .create_checkout(user_id, &CheckoutContact::default(), &plan)
            .await;

        assert!(matches!(result, Err(DbError::ForeignKeyViolation { .. })));
        assert_eq!(row_counts(&db).await, (0, 0));
    }

    #[tokio::test]
    async fn test_simple_order_is_pending_and_atomic() {
        let db = test_db().await;
        let user_id = seed_user(&db, "meera@kube.cafe").await;
        let tea = seed_item(&db, "Masala Chai", 3_000).await;

        let order_id = db
            .orders()
            .create_simple(&NewSimpleOrder {
                user_id,
                lines: vec![NewOrderLine {
                    menu_item_id: tea,
                    quantity: 2,
                    price_cents: 3_000,
                    name_snapshot: None,
                }],
                total_amount_cents: 6_000,
                delivery_address: None,
                phone: None,
            })
            .await
            .unwrap();

        let order = db.orders().get(order_id).await.unwrap().unwrap();
        assert_eq!(order.status, OrderStatus::Pending);
        assert_eq!(order.order_type, None);
        assert_eq!(order.items[0].menu_item_name.as_deref(), Some("Masala Chai"));

        let bad = db
            .orders()
            .create_simple(&NewSimpleOrder {
                user_id,
                lines: vec![NewOrderLine {
                    menu_item_id: tea,
                    quantity: 0,
                    price_cents: 3_000,
                    name_snapshot: None,
                }],
                total_amount_cents: 0,
                delivery_address: None,
                phone: None,
            })
            .await;
        assert!(matches!(bad, Err(DbError::CheckViolation { .. })));
        assert_eq!(row_counts(&db).await, (1, 1));
    }

    #[tokio::test]
    async fn test_list_all_paginates_newest_first() {
        let db = test_db().await;
        let user_id = seed_user(&db, "dev@kube.cafe").await;
        let coffee = seed_item(&db, "Filter Coffee", 5_000).await;

        let mut ids = Vec::new();
        for _ in 0..5 {
            let plan = plan_for(vec![cart_line(coffee, 1, 5_000)], PaymentMethod::Card);
            ids.push(
                db.orders()
                    .create_checkout(user_id, &CheckoutContact::default(), &plan)
                    .await
                    .unwrap(),
            );
        }

        let first = db.orders().list_all(PageRequest::new(Some(1), Some(2))).await.unwrap();
        assert_eq!(first.pagination.total, 5);
        assert_eq!(first.pagination.total_pages, 3);
        assert_eq!(first.items.len(), 2);
        assert_eq!(first.items[0].id, ids[4]);
        assert_eq!(first.items[0].items.len(), 1);
        assert_eq!(first.items[0].user_email.as_deref(), Some("dev@kube.cafe"));

        let last = db.orders().list_all(PageRequest::new(Some(3), Some(2))).await.unwrap();
        assert_eq!(last.items.len(), 1);
        assert_eq!(last.items[0].id, ids[0]);
    }

    #[tokio::test]
    async fn test_list_for_user_only_returns_own_orders() {
        let db = test_db().await;
        let a = seed_user(&db, "a@kube.cafe").await;
        let b = seed_user(&db, "b@kube.cafe").await;
        let coffee = seed_item(&db, "Filter Coffee", 5_000).await;

        let plan = plan_for(vec![cart_line(coffee, 1, 5_000)], PaymentMethod::Upi);
        db.orders().create_checkout(a, &CheckoutContact::default(), &plan).await.unwrap();
        db.orders().create_checkout(b, &CheckoutContact::default(), &plan).await.unwrap();

        let mine = db.orders().list_for_user(a).await.unwrap();
        assert_eq!(mine.len(), 1);
        assert_eq!(mine[0].user_id, Some(a));
    }

    #[tokio::test]
    async fn test_update_status() {
        let db = test_db().await;
        let user_id = seed_user(&db, "s@kube.cafe").await;
        let coffee = seed_item(&db, "Filter Coffee", 5_000).await;
        let plan = plan_for(vec![cart_line(coffee, 1, 5_000)], PaymentMethod::Upi);
        let id = db
            .orders()
            .create_checkout(user_id, &CheckoutContact::default(), &plan)
            .await
            .unwrap();

        db.orders().update_status(id, OrderStatus::Ready).await.unwrap();
        assert_eq!(db.orders().get(id).await.unwrap().unwrap().status, OrderStatus::Ready);

        assert!(matches!(
            db.orders().update_status(404, OrderStatus::Ready).await,
            Err(DbError::NotFound { .. })
        ));
    }
}
