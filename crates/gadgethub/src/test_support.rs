//! In-memory repositories and a wired-up service graph for unit tests.
//!
//! `MemoryStore` follows the Postgres repositories' rules: guarded writes
//! validate first and then mutate, returning the same conflict messages, and
//! restricted deletes report `ForeignKey`.

use crate::{
    abstract_trait::{
        auth::DynAuthService,
        cart::{CartRepositoryTrait, DynCartService},
        order::{
            DynOrderCommandService, DynOrderQueryService, OrderCommandRepositoryTrait,
            OrderQueryRepositoryTrait,
        },
        product::{
            DynProductCommandService, DynProductQueryService, ProductCommandRepositoryTrait,
            ProductQueryRepositoryTrait,
        },
        quotation::{
            DynQuotationCommandService, DynQuotationQueryService,
            QuotationCommandRepositoryTrait, QuotationQueryRepositoryTrait,
        },
        user::{
            DynUserCommandService, DynUserQueryService, UserCommandRepositoryTrait,
            UserQueryRepositoryTrait,
        },
    },
    di::{DependenciesInject, Repositories},
    domain::requests::{
        auth::AuthUser,
        cart::AddToCartRequest,
        order::CheckoutRecord,
        product::{FindAllProducts, ProductRecord},
        quotation::{ApproveQuotationRecord, CreateQuotationRecord},
        user::{CreateUserRecord, FindAllUsers, UpdateUserRecord},
    },
    model::{
        cart_item::{CartItem, CartLine},
        order::{DEFAULT_ORDER_STATUS, Order},
        order_item::OrderItem,
        product::Product,
        quotation::{Quotation, QuotationStatus},
        quotation_item::QuotationItem,
        user::User,
    },
    repository::{EMPTY_CART, MIXED_DISTRIBUTORS},
    state::AppState,
};
use async_trait::async_trait;
use chrono::{Duration, NaiveDateTime, Utc};
use prometheus_client::registry::Registry;
use rust_decimal::Decimal;
use shared::{
    abstract_trait::{DynHashing, DynJwtService},
    config::{Hashing, JwtConfig},
    errors::RepositoryError,
    model::UserRole,
};
use std::{
    collections::HashSet,
    str::FromStr,
    sync::{
        Arc, Mutex as StdMutex,
        atomic::{AtomicI32, Ordering},
    },
};
use tokio::sync::Mutex;

fn now() -> NaiveDateTime {
    Utc::now().naive_utc()
}

fn paginate<T>(rows: Vec<T>, page: i32, page_size: i32) -> (Vec<T>, i64) {
    let total = rows.len() as i64;
    let skip = ((page.max(1) - 1) * page_size) as usize;
    let page_rows = rows
        .into_iter()
        .skip(skip)
        .take(page_size as usize)
        .collect();
    (page_rows, total)
}

fn contains_ci(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

#[derive(Default)]
struct Tables {
    next_id: i32,
    users: Vec<User>,
    products: Vec<Product>,
    cart: Vec<CartItem>,
    quotations: Vec<Quotation>,
    quotation_items: Vec<QuotationItem>,
    orders: Vec<Order>,
    order_items: Vec<OrderItem>,
}

impl Tables {
    fn next_id(&mut self) -> i32 {
        self.next_id += 1;
        self.next_id
    }

    fn product(&self, id: i32) -> Option<&Product> {
        self.products.iter().find(|p| p.id == id)
    }

    fn product_name(&self, id: i32) -> String {
        self.product(id).map(|p| p.name.clone()).unwrap_or_default()
    }

    fn cart_lines(&self, user_id: i32) -> Vec<CartLine> {
        let mut items: Vec<&CartItem> = self.cart.iter().filter(|c| c.user_id == user_id).collect();
        items.sort_by_key(|c| c.id);

        items
            .into_iter()
            .filter_map(|c| {
                self.product(c.product_id).map(|p| CartLine {
                    id: c.id,
                    product_id: p.id,
                    product_name: p.name.clone(),
                    unit_price: p.price,
                    quantity: c.quantity,
                    stock_quantity: p.stock_quantity,
                    distributor_id: p.distributor_id,
                })
            })
            .collect()
    }

    fn quotation_items_named(&self, quotation_id: i32) -> Vec<QuotationItem> {
        self.quotation_items
            .iter()
            .filter(|i| i.quotation_id == quotation_id)
            .map(|i| QuotationItem {
                product_name: self.product_name(i.product_id),
                ..i.clone()
            })
            .collect()
    }
}

#[derive(Default)]
pub struct MemoryStore {
    tables: StdMutex<Tables>,
}

impl MemoryStore {
    fn lock(&self) -> std::sync::MutexGuard<'_, Tables> {
        self.tables.lock().unwrap()
    }

    pub fn seed_user(&self, name: &str, email: &str, role: UserRole) -> User {
        let mut t = self.lock();
        let user = User {
            id: t.next_id(),
            first_name: name.to_string(),
            last_name: "Tester".to_string(),
            email: email.to_string(),
            password: "$2b$04$not-a-real-hash".to_string(),
            role,
            company_name: (role == UserRole::Distributor).then(|| format!("{name} Traders")),
            created_at: now(),
        };
        t.users.push(user.clone());
        user
    }

    pub fn seed_product(&self, name: &str, price: &str, stock: i32, distributor_id: i32) -> Product {
        let mut t = self.lock();
        let product = Product {
            id: t.next_id(),
            name: name.to_string(),
            description: String::new(),
            price: Decimal::from_str(price).unwrap(),
            stock_quantity: stock,
            category: "General".to_string(),
            image_url: "default-gadget.png".to_string(),
            distributor_id,
            created_at: now(),
            updated_at: now(),
        };
        t.products.push(product.clone());
        product
    }

    pub fn user_by_email(&self, email: &str) -> Option<User> {
        self.lock()
            .users
            .iter()
            .find(|u| u.email.eq_ignore_ascii_case(email))
            .cloned()
    }

    fn with_product(&self, id: i32, f: impl FnOnce(&mut Product)) {
        let mut t = self.lock();
        let product = t.products.iter_mut().find(|p| p.id == id).unwrap();
        f(product);
    }

    pub fn set_category(&self, id: i32, category: &str) {
        self.with_product(id, |p| p.category = category.to_string());
    }

    pub fn set_price(&self, id: i32, price: &str) {
        self.with_product(id, |p| p.price = Decimal::from_str(price).unwrap());
    }

    pub fn set_stock(&self, id: i32, stock: i32) {
        self.with_product(id, |p| p.stock_quantity = stock);
    }

    pub fn stock_of(&self, id: i32) -> i32 {
        self.lock().product(id).unwrap().stock_quantity
    }

    pub fn product_updated_at(&self, id: i32) -> NaiveDateTime {
        self.lock().product(id).unwrap().updated_at
    }

    pub fn expire_quotation(&self, id: i32) {
        let mut t = self.lock();
        let quotation = t.quotations.iter_mut().find(|q| q.id == id).unwrap();
        quotation.expiry_date = now() - Duration::days(1);
    }

    pub fn first_product_of_quotation(&self, quotation_id: i32) -> i32 {
        self.lock()
            .quotation_items
            .iter()
            .find(|i| i.quotation_id == quotation_id)
            .map(|i| i.product_id)
            .unwrap()
    }
}

#[async_trait]
impl UserQueryRepositoryTrait for MemoryStore {
    async fn find_all(&self, req: &FindAllUsers) -> Result<(Vec<User>, i64), RepositoryError> {
        let t = self.lock();
        let mut rows: Vec<User> = t
            .users
            .iter()
            .filter(|u| {
                req.search.is_empty()
                    || contains_ci(&u.first_name, &req.search)
                    || contains_ci(&u.last_name, &req.search)
                    || contains_ci(&u.email, &req.search)
            })
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(paginate(rows, req.page, req.page_size))
    }

    async fn find_by_id(&self, id: i32) -> Result<Option<User>, RepositoryError> {
        Ok(self.lock().users.iter().find(|u| u.id == id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, RepositoryError> {
        Ok(self.user_by_email(email))
    }
}

#[async_trait]
impl UserCommandRepositoryTrait for MemoryStore {
    async fn create_user(&self, req: &CreateUserRecord) -> Result<User, RepositoryError> {
        let mut t = self.lock();
        if t.users.iter().any(|u| u.email.eq_ignore_ascii_case(&req.email)) {
            return Err(RepositoryError::AlreadyExists(format!(
                "Email {} already exists",
                req.email
            )));
        }

        let user = User {
            id: t.next_id(),
            first_name: req.first_name.clone(),
            last_name: req.last_name.clone(),
            email: req.email.clone(),
            password: req.password.clone(),
            role: req.role,
            company_name: req.company_name.clone(),
            created_at: now(),
        };
        t.users.push(user.clone());
        Ok(user)
    }

    async fn update_user(&self, req: &UpdateUserRecord) -> Result<User, RepositoryError> {
        let mut t = self.lock();
        let user = t
            .users
            .iter_mut()
            .find(|u| u.id == req.id)
            .ok_or(RepositoryError::NotFound)?;

        user.first_name = req.first_name.clone();
        user.last_name = req.last_name.clone();
        user.role = req.role;
        user.company_name = req.company_name.clone();
        Ok(user.clone())
    }

    async fn delete_user(&self, id: i32) -> Result<(), RepositoryError> {
        let mut t = self.lock();
        if !t.users.iter().any(|u| u.id == id) {
            return Err(RepositoryError::NotFound);
        }

        let referenced = t.products.iter().any(|p| p.distributor_id == id)
            || t
                .quotations
                .iter()
                .any(|q| q.customer_id == id || q.distributor_id == id)
            || t.orders.iter().any(|o| o.customer_id == id);
        if referenced {
            return Err(RepositoryError::ForeignKey(format!(
                "user {id} is still referenced"
            )));
        }

        t.cart.retain(|c| c.user_id != id);
        t.users.retain(|u| u.id != id);
        Ok(())
    }
}

#[async_trait]
impl ProductQueryRepositoryTrait for MemoryStore {
    async fn find_all(&self, req: &FindAllProducts) -> Result<(Vec<Product>, i64), RepositoryError> {
        let t = self.lock();
        let mut rows: Vec<Product> = t
            .products
            .iter()
            .filter(|p| {
                req.search.is_empty()
                    || contains_ci(&p.name, &req.search)
                    || contains_ci(&p.description, &req.search)
            })
            .filter(|p| req.category.as_ref().is_none_or(|c| &p.category == c))
            .cloned()
            .collect();
        rows.sort_by_key(|p| p.id);
        Ok(paginate(rows, req.page, req.page_size))
    }

    async fn find_by_id(&self, id: i32) -> Result<Option<Product>, RepositoryError> {
        Ok(self.lock().product(id).cloned())
    }
}

#[async_trait]
impl ProductCommandRepositoryTrait for MemoryStore {
    async fn create_product(&self, req: &ProductRecord) -> Result<Product, RepositoryError> {
        let mut t = self.lock();
        if !t.users.iter().any(|u| u.id == req.distributor_id) {
            return Err(RepositoryError::ForeignKey(format!(
                "distributor {} does not exist",
                req.distributor_id
            )));
        }

        let product = Product {
            id: t.next_id(),
            name: req.name.clone(),
            description: req.description.clone(),
            price: req.price,
            stock_quantity: req.stock_quantity,
            category: req.category.clone(),
            image_url: req.image_url.clone(),
            distributor_id: req.distributor_id,
            created_at: now(),
            updated_at: now(),
        };
        t.products.push(product.clone());
        Ok(product)
    }

    async fn update_product(&self, id: i32, req: &ProductRecord) -> Result<Product, RepositoryError> {
        let mut t = self.lock();
        let product = t
            .products
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or(RepositoryError::NotFound)?;

        product.name = req.name.clone();
        product.description = req.description.clone();
        product.price = req.price;
        product.stock_quantity = req.stock_quantity;
        product.category = req.category.clone();
        product.image_url = req.image_url.clone();
        product.distributor_id = req.distributor_id;
        product.updated_at = now();
        Ok(product.clone())
    }

    async fn delete_product(&self, id: i32) -> Result<(), RepositoryError> {
        let mut t = self.lock();
        if t.product(id).is_none() {
            return Err(RepositoryError::NotFound);
        }

        let referenced = t.quotation_items.iter().any(|i| i.product_id == id)
            || t.order_items.iter().any(|i| i.product_id == id);
        if referenced {
            return Err(RepositoryError::ForeignKey(format!(
                "product {id} is still referenced"
            )));
        }

        t.cart.retain(|c| c.product_id != id);
        t.products.retain(|p| p.id != id);
        Ok(())
    }
}

#[async_trait]
impl CartRepositoryTrait for MemoryStore {
    async fn find_by_user(&self, user_id: i32) -> Result<Vec<CartLine>, RepositoryError> {
        Ok(self.lock().cart_lines(user_id))
    }

    async fn find_item(
        &self,
        user_id: i32,
        product_id: i32,
    ) -> Result<Option<CartItem>, RepositoryError> {
        Ok(self
            .lock()
            .cart
            .iter()
            .find(|c| c.user_id == user_id && c.product_id == product_id)
            .cloned())
    }

    async fn add_quantity(
        &self,
        user_id: i32,
        product_id: i32,
        quantity: i32,
    ) -> Result<CartItem, RepositoryError> {
        let mut t = self.lock();
        if let Some(item) = t
            .cart
            .iter_mut()
            .find(|c| c.user_id == user_id && c.product_id == product_id)
        {
            item.quantity += quantity;
            return Ok(item.clone());
        }

        let item = CartItem {
            id: t.next_id(),
            user_id,
            product_id,
            quantity,
        };
        t.cart.push(item.clone());
        Ok(item)
    }

    async fn remove_item(&self, user_id: i32, item_id: i32) -> Result<bool, RepositoryError> {
        let mut t = self.lock();
        let before = t.cart.len();
        t.cart.retain(|c| !(c.id == item_id && c.user_id == user_id));
        Ok(t.cart.len() != before)
    }

    async fn clear(&self, user_id: i32) -> Result<u64, RepositoryError> {
        let mut t = self.lock();
        let before = t.cart.len();
        t.cart.retain(|c| c.user_id != user_id);
        Ok((before - t.cart.len()) as u64)
    }
}

#[async_trait]
impl QuotationQueryRepositoryTrait for MemoryStore {
    async fn find_by_id(&self, id: i32) -> Result<Option<Quotation>, RepositoryError> {
        Ok(self.lock().quotations.iter().find(|q| q.id == id).cloned())
    }

    async fn find_by_customer(&self, customer_id: i32) -> Result<Vec<Quotation>, RepositoryError> {
        let t = self.lock();
        let mut rows: Vec<Quotation> = t
            .quotations
            .iter()
            .filter(|q| q.customer_id == customer_id)
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(rows)
    }

    async fn find_pending(
        &self,
        distributor_id: Option<i32>,
    ) -> Result<Vec<Quotation>, RepositoryError> {
        let t = self.lock();
        let mut rows: Vec<Quotation> = t
            .quotations
            .iter()
            .filter(|q| q.status == QuotationStatus::Pending)
            .filter(|q| distributor_id.is_none_or(|d| q.distributor_id == d))
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(rows)
    }

    async fn find_items(
        &self,
        quotation_ids: &[i32],
    ) -> Result<Vec<QuotationItem>, RepositoryError> {
        let t = self.lock();
        Ok(quotation_ids
            .iter()
            .flat_map(|id| t.quotation_items_named(*id))
            .collect())
    }
}

#[async_trait]
impl QuotationCommandRepositoryTrait for MemoryStore {
    async fn create_from_cart(
        &self,
        req: &CreateQuotationRecord,
    ) -> Result<Quotation, RepositoryError> {
        let mut t = self.lock();
        let lines = t.cart_lines(req.customer_id);

        let Some(first) = lines.first() else {
            return Err(RepositoryError::Conflict(EMPTY_CART.to_string()));
        };
        let distributor_id = first.distributor_id;
        if lines.iter().any(|l| l.distributor_id != distributor_id) {
            return Err(RepositoryError::Conflict(MIXED_DISTRIBUTORS.to_string()));
        }

        let quotation = Quotation {
            id: t.next_id(),
            customer_id: req.customer_id,
            distributor_id,
            expiry_date: req.expiry_date,
            status: QuotationStatus::Pending,
            grand_total: lines.iter().map(CartLine::line_total).sum(),
            created_at: req.now,
            updated_at: req.now,
        };
        t.quotations.push(quotation.clone());

        for line in &lines {
            let id = t.next_id();
            t.quotation_items.push(QuotationItem {
                id,
                quotation_id: quotation.id,
                product_id: line.product_id,
                product_name: line.product_name.clone(),
                quantity: line.quantity,
                offered_unit_price: line.unit_price,
            });
        }

        t.cart.retain(|c| c.user_id != req.customer_id);
        Ok(quotation)
    }

    async fn approve(&self, req: &ApproveQuotationRecord) -> Result<Quotation, RepositoryError> {
        let mut t = self.lock();
        let quotation = t
            .quotations
            .iter()
            .find(|q| q.id == req.quotation_id)
            .cloned()
            .ok_or(RepositoryError::NotFound)?;

        if quotation.status != QuotationStatus::Pending {
            return Err(RepositoryError::Conflict(format!(
                "Quotation is {}, not Pending.",
                quotation.status
            )));
        }
        if quotation.is_expired(req.now) {
            return Err(RepositoryError::Conflict("Quotation has expired.".to_string()));
        }

        let products: HashSet<i32> = t
            .quotation_items
            .iter()
            .filter(|i| i.quotation_id == quotation.id)
            .map(|i| i.product_id)
            .collect();
        for update in &req.prices {
            if update.negotiated_price < Decimal::ZERO {
                return Err(RepositoryError::Conflict(format!(
                    "Negotiated price for product {} cannot be negative.",
                    update.product_id
                )));
            }
            if !products.contains(&update.product_id) {
                return Err(RepositoryError::Conflict(format!(
                    "Product {} is not part of this quotation.",
                    update.product_id
                )));
            }
        }

        for update in &req.prices {
            for item in t.quotation_items.iter_mut().filter(|i| {
                i.quotation_id == quotation.id && i.product_id == update.product_id
            }) {
                item.offered_unit_price = update.negotiated_price;
            }
        }

        let grand_total: Decimal = t
            .quotation_items
            .iter()
            .filter(|i| i.quotation_id == quotation.id)
            .map(|i| i.offered_unit_price * Decimal::from(i.quantity))
            .sum();

        let stored = t
            .quotations
            .iter_mut()
            .find(|q| q.id == quotation.id)
            .ok_or(RepositoryError::NotFound)?;
        stored.grand_total = grand_total;
        stored.status = QuotationStatus::Approved;
        stored.updated_at = req.now;
        Ok(stored.clone())
    }

    async fn reject(&self, id: i32) -> Result<Quotation, RepositoryError> {
        let mut t = self.lock();
        let quotation = t
            .quotations
            .iter_mut()
            .find(|q| q.id == id && q.status == QuotationStatus::Pending)
            .ok_or_else(|| {
                RepositoryError::Conflict("Only pending quotations can be rejected.".to_string())
            })?;

        quotation.status = QuotationStatus::Rejected;
        quotation.updated_at = now();
        Ok(quotation.clone())
    }
}

#[async_trait]
impl OrderQueryRepositoryTrait for MemoryStore {
    async fn find_all(&self) -> Result<Vec<Order>, RepositoryError> {
        let mut rows = self.lock().orders.clone();
        rows.sort_by(|a, b| b.order_date.cmp(&a.order_date).then(b.id.cmp(&a.id)));
        Ok(rows)
    }

    async fn find_by_customer(&self, customer_id: i32) -> Result<Vec<Order>, RepositoryError> {
        let mut rows: Vec<Order> = self
            .lock()
            .orders
            .iter()
            .filter(|o| o.customer_id == customer_id)
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.order_date.cmp(&a.order_date).then(b.id.cmp(&a.id)));
        Ok(rows)
    }

    async fn find_by_id(&self, id: i32) -> Result<Option<Order>, RepositoryError> {
        Ok(self.lock().orders.iter().find(|o| o.id == id).cloned())
    }

    async fn find_items(&self, order_ids: &[i32]) -> Result<Vec<OrderItem>, RepositoryError> {
        let t = self.lock();
        Ok(t.order_items
            .iter()
            .filter(|i| order_ids.contains(&i.order_id))
            .cloned()
            .collect())
    }
}

#[async_trait]
impl OrderCommandRepositoryTrait for MemoryStore {
    async fn checkout(&self, req: &CheckoutRecord) -> Result<Order, RepositoryError> {
        let mut t = self.lock();
        let convertible = t.quotations.iter().any(|q| {
            q.id == req.quotation_id
                && q.customer_id == req.customer_id
                && q.status == QuotationStatus::Approved
                && !q.is_expired(req.now)
        });
        if !convertible {
            return Err(RepositoryError::Conflict(
                "Quotation is not approved.".to_string(),
            ));
        }

        let items = t.quotation_items_named(req.quotation_id);
        for item in &items {
            let in_stock = t.product(item.product_id).map_or(0, |p| p.stock_quantity);
            if in_stock < item.quantity {
                return Err(RepositoryError::Conflict(format!(
                    "Insufficient stock for product '{}'.",
                    item.product_name
                )));
            }
        }

        for item in &items {
            if let Some(p) = t.products.iter_mut().find(|p| p.id == item.product_id) {
                p.stock_quantity -= item.quantity;
                p.updated_at = req.now;
            }
        }
        if let Some(q) = t.quotations.iter_mut().find(|q| q.id == req.quotation_id) {
            q.status = QuotationStatus::ConvertedToOrder;
            q.updated_at = req.now;
        }

        let order = Order {
            id: t.next_id(),
            customer_id: req.customer_id,
            order_date: req.now,
            total_amount: items
                .iter()
                .map(|i| i.offered_unit_price * Decimal::from(i.quantity))
                .sum(),
            status: DEFAULT_ORDER_STATUS.to_string(),
            from_quotation_id: Some(req.quotation_id),
        };
        t.orders.push(order.clone());

        for item in items {
            let id = t.next_id();
            t.order_items.push(OrderItem {
                id,
                order_id: order.id,
                product_id: item.product_id,
                product_name: item.product_name,
                quantity: item.quantity,
                unit_price: item.offered_unit_price,
            });
        }

        Ok(order)
    }

    async fn update_status(&self, id: i32, status: &str) -> Result<Order, RepositoryError> {
        let mut t = self.lock();
        let order = t
            .orders
            .iter_mut()
            .find(|o| o.id == id)
            .ok_or(RepositoryError::NotFound)?;
        order.status = status.to_string();
        Ok(order.clone())
    }

    async fn delete_order(&self, id: i32) -> Result<(), RepositoryError> {
        let mut t = self.lock();
        if !t.orders.iter().any(|o| o.id == id) {
            return Err(RepositoryError::NotFound);
        }
        t.order_items.retain(|i| i.order_id != id);
        t.orders.retain(|o| o.id != id);
        Ok(())
    }
}

pub const TEST_JWT_SECRET: &str = "test-secret";

/// The full service graph over one `MemoryStore`.
pub struct TestContext {
    pub store: Arc<MemoryStore>,
    pub jwt: DynJwtService,
    pub registry: Arc<Mutex<Registry>>,
    pub di: DependenciesInject,
    pub auth: DynAuthService,
    pub cart: DynCartService,
    pub product_query: DynProductQueryService,
    pub product_command: DynProductCommandService,
    pub user_query: DynUserQueryService,
    pub user_command: DynUserCommandService,
    pub quotation_query: DynQuotationQueryService,
    pub quotation_command: DynQuotationCommandService,
    pub order_query: DynOrderQueryService,
    pub order_command: DynOrderCommandService,
    seq: AtomicI32,
}

impl TestContext {
    pub async fn new() -> Self {
        let store = Arc::new(MemoryStore::default());
        let jwt: DynJwtService = Arc::new(JwtConfig::new(TEST_JWT_SECRET));
        let hashing: DynHashing = Arc::new(Hashing::with_cost(4));
        let registry = Arc::new(Mutex::new(Registry::default()));

        let repos = Repositories {
            user_query: store.clone(),
            user_command: store.clone(),
            product_query: store.clone(),
            product_command: store.clone(),
            cart: store.clone(),
            quotation_query: store.clone(),
            quotation_command: store.clone(),
            order_query: store.clone(),
            order_command: store.clone(),
        };

        let di =
            DependenciesInject::from_repositories(repos, hashing, jwt.clone(), 7, registry.clone())
                .await;

        Self {
            store,
            jwt,
            registry,
            auth: di.auth_service.clone(),
            cart: di.cart_service.clone(),
            product_query: di.product_query.clone(),
            product_command: di.product_command.clone(),
            user_query: di.user_query.clone(),
            user_command: di.user_command.clone(),
            quotation_query: di.quotation_query.clone(),
            quotation_command: di.quotation_command.clone(),
            order_query: di.order_query.clone(),
            order_command: di.order_command.clone(),
            di,
            seq: AtomicI32::new(0),
        }
    }

    pub async fn state(&self) -> AppState {
        AppState::from_parts(self.jwt.clone(), self.di.clone(), self.registry.clone()).await
    }

    /// Seeds a user and returns the identity the auth middleware would resolve.
    pub fn auth_user(&self, email: &str, role: UserRole) -> AuthUser {
        let user = self.store.seed_user("Test", email, role);
        AuthUser {
            user_id: user.id,
            email: user.email,
            role: user.role,
        }
    }

    pub fn token_for(&self, user: &AuthUser) -> String {
        self.jwt
            .generate_token(
                user.user_id as i64,
                &user.email,
                user.role,
                shared::config::ACCESS_TOKEN,
            )
            .unwrap()
    }

    /// A fresh customer, distributor and Pending quotation for one product.
    pub async fn pending_quotation(&self, price: &str, quantity: i32) -> (AuthUser, AuthUser, i32) {
        let n = self.seq.fetch_add(1, Ordering::SeqCst);
        let customer = self.auth_user(&format!("customer{n}@example.com"), UserRole::Customer);
        let distributor =
            self.auth_user(&format!("distributor{n}@example.com"), UserRole::Distributor);
        let product = self
            .store
            .seed_product(&format!("Gadget {n}"), price, quantity + 10, distributor.user_id);

        self.cart
            .add_to_cart(
                customer.user_id,
                &AddToCartRequest {
                    product_id: product.id,
                    quantity,
                },
            )
            .await
            .unwrap();

        let created = self
            .quotation_command
            .request_from_cart(&customer)
            .await
            .unwrap();

        (customer, distributor, created.data.quotation_id)
    }

    pub fn quotation_product(&self, quotation_id: i32) -> i32 {
        self.store.first_product_of_quotation(quotation_id)
    }
}
