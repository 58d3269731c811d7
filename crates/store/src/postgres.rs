use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::{CategoryId, ComunaId, FaqId, LineItemId, OrderId, ProductId, RegionId, UserId};
use domain::{
    Category, Comuna, DomainError, Faq, LineItem, Money, Order, OrderNumber, OrderState,
    PlaceOrder, Product, ProductPatch, Region, Role, ShippingDetails, User,
};
use sqlx::{
    PgConnection, PgPool, Postgres, Row,
    postgres::{PgArguments, PgPoolOptions, PgRow},
    query::Query,
};
use uuid::Uuid;

use crate::{
    FaqQuery, OrderQuery, ProductQuery, Result, StoreError, UserQuery,
    store::{CatalogStore, FaqStore, LocationStore, OrderStore, StateChange, UserStore},
};

const USER_COLUMNS: &str = "id, run, first_names, last_names, email, role, address, region_id, comuna_id, phone, registered_at, active";
const PRODUCT_COLUMNS: &str = "id, code, name, description, price, stock, critical_stock, image, category_id, active, created_at";
const ORDER_COLUMNS: &str = "id, number, user_id, subtotal, discount, total, state, shipping_address, shipping_region, shipping_comuna, notes, created_at, updated_at";
const FAQ_COLUMNS: &str = "id, question, answer, category, display_order, active";

/// PostgreSQL-backed store.
#[derive(Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    /// Creates a store over an existing pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Opens a pool against `database_url`.
    pub async fn connect(database_url: &str, max_connections: u32) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await?;
        Ok(Self::new(pool))
    }

    /// Gets a reference to the underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Runs the database migrations.
    pub async fn run_migrations(&self) -> Result<()> {
        sqlx::migrate!("../../migrations").run(&self.pool).await?;
        Ok(())
    }

    fn row_to_user(row: &PgRow) -> Result<User> {
        Ok(User {
            id: UserId::from_uuid(row.try_get("id")?),
            run: row.try_get("run")?,
            first_names: row.try_get("first_names")?,
            last_names: row.try_get("last_names")?,
            email: row.try_get("email")?,
            role: row.try_get::<String, _>("role")?.parse::<Role>()?,
            address: row.try_get("address")?,
            region_id: row
                .try_get::<Option<Uuid>, _>("region_id")?
                .map(RegionId::from_uuid),
            comuna_id: row
                .try_get::<Option<Uuid>, _>("comuna_id")?
                .map(ComunaId::from_uuid),
            phone: row.try_get("phone")?,
            registered_at: row.try_get("registered_at")?,
            active: row.try_get("active")?,
        })
    }

    fn row_to_category(row: &PgRow) -> Result<Category> {
        Ok(Category {
            id: CategoryId::from_uuid(row.try_get("id")?),
            name: row.try_get("name")?,
            description: row.try_get("description")?,
            active: row.try_get("active")?,
        })
    }

    fn row_to_product(row: &PgRow) -> Result<Product> {
        Ok(Product {
            id: ProductId::from_uuid(row.try_get("id")?),
            code: row.try_get("code")?,
            name: row.try_get("name")?,
            description: row.try_get("description")?,
            price: Money::new(row.try_get("price")?),
            stock: row.try_get("stock")?,
            critical_stock: row.try_get("critical_stock")?,
            image: row.try_get("image")?,
            category_id: row
                .try_get::<Option<Uuid>, _>("category_id")?
                .map(CategoryId::from_uuid),
            active: row.try_get("active")?,
            created_at: row.try_get("created_at")?,
        })
    }

    fn row_to_line_item(row: &PgRow) -> Result<LineItem> {
        let quantity: i32 = row.try_get("quantity")?;
        let quantity = u32::try_from(quantity)
            .map_err(|e| StoreError::Database(sqlx::Error::Decode(Box::new(e))))?;
        Ok(LineItem::restore(
            LineItemId::from_uuid(row.try_get("id")?),
            row.try_get::<Option<Uuid>, _>("product_id")?
                .map(ProductId::from_uuid),
            row.try_get::<String, _>("product_name")?,
            Money::new(row.try_get("unit_price")?),
            quantity,
        )?)
    }

    fn row_to_order(row: &PgRow, items: Vec<LineItem>) -> Result<Order> {
        Ok(Order {
            id: OrderId::from_uuid(row.try_get("id")?),
            number: OrderNumber::from_string(row.try_get::<String, _>("number")?),
            user_id: UserId::from_uuid(row.try_get("user_id")?),
            items,
            subtotal: Money::new(row.try_get("subtotal")?),
            discount: Money::new(row.try_get("discount")?),
            total: Money::new(row.try_get("total")?),
            state: row.try_get::<String, _>("state")?.parse::<OrderState>()?,
            shipping: ShippingDetails {
                address: row.try_get("shipping_address")?,
                region: row.try_get("shipping_region")?,
                comuna: row.try_get("shipping_comuna")?,
            },
            notes: row.try_get("notes")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }

    fn row_to_faq(row: &PgRow) -> Result<Faq> {
        Ok(Faq {
            id: FaqId::from_uuid(row.try_get("id")?),
            question: row.try_get("question")?,
            answer: row.try_get("answer")?,
            category: row.try_get("category")?,
            display_order: row.try_get("display_order")?,
            active: row.try_get("active")?,
        })
    }

    fn row_to_region(row: &PgRow) -> Result<Region> {
        Ok(Region {
            id: RegionId::from_uuid(row.try_get("id")?),
            name: row.try_get("name")?,
            code: row.try_get("code")?,
            active: row.try_get("active")?,
        })
    }

    fn row_to_comuna(row: &PgRow) -> Result<Comuna> {
        Ok(Comuna {
            id: ComunaId::from_uuid(row.try_get("id")?),
            name: row.try_get("name")?,
            region_id: RegionId::from_uuid(row.try_get("region_id")?),
            active: row.try_get("active")?,
        })
    }

    /// Loads the line items of `order_ids`, grouped by order in display order.
    async fn fetch_items(
        conn: &mut PgConnection,
        order_ids: Vec<Uuid>,
    ) -> Result<HashMap<Uuid, Vec<LineItem>>> {
        let rows = sqlx::query(
            r#"
            SELECT id, order_id, product_id, product_name, unit_price, quantity
            FROM line_items
            WHERE order_id = ANY($1)
            ORDER BY order_id, position ASC
            "#,
        )
        .bind(order_ids)
        .fetch_all(conn)
        .await?;

        let mut items: HashMap<Uuid, Vec<LineItem>> = HashMap::new();
        for row in &rows {
            let order_id: Uuid = row.try_get("order_id")?;
            items
                .entry(order_id)
                .or_default()
                .push(Self::row_to_line_item(row)?);
        }
        Ok(items)
    }

    /// Attaches line items to order rows, keeping the row order.
    async fn load_orders(conn: &mut PgConnection, rows: Vec<PgRow>) -> Result<Vec<Order>> {
        let ids = rows
            .iter()
            .map(|row| row.try_get::<Uuid, _>("id"))
            .collect::<std::result::Result<Vec<_>, _>>()?;
        let mut items = Self::fetch_items(conn, ids).await?;

        rows.iter()
            .map(|row| {
                let id: Uuid = row.try_get("id")?;
                Self::row_to_order(row, items.remove(&id).unwrap_or_default())
            })
            .collect()
    }

    async fn insert_order(conn: &mut PgConnection, order: &Order) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO orders (id, number, user_id, subtotal, discount, total, state,
                                shipping_address, shipping_region, shipping_comuna, notes,
                                created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            "#,
        )
        .bind(order.id.as_uuid())
        .bind(order.number.as_str())
        .bind(order.user_id.as_uuid())
        .bind(order.subtotal.amount())
        .bind(order.discount.amount())
        .bind(order.total.amount())
        .bind(order.state.as_str())
        .bind(&order.shipping.address)
        .bind(&order.shipping.region)
        .bind(&order.shipping.comuna)
        .bind(&order.notes)
        .bind(order.created_at)
        .bind(order.updated_at)
        .execute(&mut *conn)
        .await
        .map_err(map_write_error)?;

        for (position, item) in order.items.iter().enumerate() {
            sqlx::query(
                r#"
                INSERT INTO line_items (id, order_id, position, product_id, product_name,
                                        unit_price, quantity, subtotal)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
                "#,
            )
            .bind(item.id.as_uuid())
            .bind(order.id.as_uuid())
            .bind(i32::try_from(position).unwrap_or(i32::MAX))
            .bind(item.product_id.map(|id| id.as_uuid()))
            .bind(&item.product_name)
            .bind(item.unit_price.amount())
            .bind(units(i64::from(item.quantity)))
            .bind(item.subtotal().amount())
            .execute(&mut *conn)
            .await?;
        }

        Ok(())
    }
}

/// Converts a unit count that already passed a stock check into a column value.
fn units(quantity: i64) -> i32 {
    i32::try_from(quantity).unwrap_or(i32::MAX)
}

fn conflict_message(error: &sqlx::Error) -> Option<&'static str> {
    let sqlx::Error::Database(db_err) = error else {
        return None;
    };
    match db_err.constraint()? {
        "users_email_key" => Some("Email already registered"),
        "users_run_key" => Some("RUN already registered"),
        "categories_name_key" => Some("Category name already exists"),
        "products_code_key" => Some("Product code already exists"),
        "orders_number_key" => Some("Order number already exists"),
        "regions_name_key" => Some("Region already exists"),
        _ => None,
    }
}

/// Maps unique-constraint violations to `Conflict`.
fn map_write_error(error: sqlx::Error) -> StoreError {
    match conflict_message(&error) {
        Some(message) => StoreError::Conflict(message.to_string()),
        None => StoreError::Database(error),
    }
}

fn order_filters(query: &OrderQuery) -> String {
    let mut sql = String::from(" WHERE 1=1");
    let mut param_count = 0;

    if query.user_id.is_some() {
        param_count += 1;
        sql.push_str(&format!(" AND user_id = ${param_count}"));
    }
    if query.state.is_some() {
        param_count += 1;
        sql.push_str(&format!(" AND state = ${param_count}"));
    }
    if query.created_from.is_some() {
        param_count += 1;
        sql.push_str(&format!(" AND created_at >= ${param_count}"));
    }
    if query.created_to.is_some() {
        param_count += 1;
        sql.push_str(&format!(" AND created_at <= ${param_count}"));
    }
    sql
}

fn bind_order_filters<'q>(
    mut sqlx_query: Query<'q, Postgres, PgArguments>,
    query: &OrderQuery,
) -> Query<'q, Postgres, PgArguments> {
    if let Some(user_id) = query.user_id {
        sqlx_query = sqlx_query.bind(user_id.as_uuid());
    }
    if let Some(state) = query.state {
        sqlx_query = sqlx_query.bind(state.as_str());
    }
    if let Some(from) = query.created_from {
        sqlx_query = sqlx_query.bind(from);
    }
    if let Some(to) = query.created_to {
        sqlx_query = sqlx_query.bind(to);
    }
    sqlx_query
}

#[async_trait]
impl UserStore for PostgresStore {
    async fn insert_user(&self, user: User) -> Result<User> {
        sqlx::query(
            r#"
            INSERT INTO users (id, run, first_names, last_names, email, role, address,
                               region_id, comuna_id, phone, registered_at, active)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            "#,
        )
        .bind(user.id.as_uuid())
        .bind(&user.run)
        .bind(&user.first_names)
        .bind(&user.last_names)
        .bind(&user.email)
        .bind(user.role.as_str())
        .bind(&user.address)
        .bind(user.region_id.map(|id| id.as_uuid()))
        .bind(user.comuna_id.map(|id| id.as_uuid()))
        .bind(&user.phone)
        .bind(user.registered_at)
        .bind(user.active)
        .execute(&self.pool)
        .await
        .map_err(map_write_error)?;

        Ok(user)
    }

    async fn update_user(&self, user: User) -> Result<User> {
        let result = sqlx::query(
            r#"
            UPDATE users SET run = $2, first_names = $3, last_names = $4, email = $5, role = $6,
                             address = $7, region_id = $8, comuna_id = $9, phone = $10, active = $11
            WHERE id = $1
            "#,
        )
        .bind(user.id.as_uuid())
        .bind(&user.run)
        .bind(&user.first_names)
        .bind(&user.last_names)
        .bind(&user.email)
        .bind(user.role.as_str())
        .bind(&user.address)
        .bind(user.region_id.map(|id| id.as_uuid()))
        .bind(user.comuna_id.map(|id| id.as_uuid()))
        .bind(&user.phone)
        .bind(user.active)
        .execute(&self.pool)
        .await
        .map_err(map_write_error)?;

        if result.rows_affected() == 0 {
            return Err(StoreError::not_found("User", user.id));
        }
        Ok(user)
    }

    async fn delete_user(&self, id: UserId) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            "DELETE FROM line_items WHERE order_id IN (SELECT id FROM orders WHERE user_id = $1)",
        )
        .bind(id.as_uuid())
        .execute(&mut *tx)
        .await?;
        sqlx::query("DELETE FROM orders WHERE user_id = $1")
            .bind(id.as_uuid())
            .execute(&mut *tx)
            .await?;
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&mut *tx)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::not_found("User", id));
        }
        tx.commit().await?;
        Ok(())
    }

    async fn get_user(&self, id: UserId) -> Result<Option<User>> {
        let row = sqlx::query(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1"))
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(Self::row_to_user).transpose()
    }

    async fn list_users(&self, query: UserQuery) -> Result<Vec<User>> {
        let mut sql = format!("SELECT {USER_COLUMNS} FROM users WHERE 1=1");
        let mut param_count = 0;

        if query.role.is_some() {
            param_count += 1;
            sql.push_str(&format!(" AND role = ${param_count}"));
        }
        if query.name_contains.is_some() {
            param_count += 1;
            sql.push_str(&format!(
                " AND (strpos(lower(first_names), lower(${param_count})) > 0 \
                 OR strpos(lower(last_names), lower(${param_count})) > 0)"
            ));
        }
        sql.push_str(" ORDER BY registered_at ASC, email ASC");

        let mut sqlx_query = sqlx::query(&sql);
        if let Some(role) = query.role {
            sqlx_query = sqlx_query.bind(role.as_str());
        }
        if let Some(text) = query.name_contains {
            sqlx_query = sqlx_query.bind(text);
        }

        let rows = sqlx_query.fetch_all(&self.pool).await?;
        rows.iter().map(Self::row_to_user).collect()
    }
}

#[async_trait]
impl CatalogStore for PostgresStore {
    async fn insert_category(&self, category: Category) -> Result<Category> {
        sqlx::query("INSERT INTO categories (id, name, description, active) VALUES ($1, $2, $3, $4)")
            .bind(category.id.as_uuid())
            .bind(&category.name)
            .bind(&category.description)
            .bind(category.active)
            .execute(&self.pool)
            .await
            .map_err(map_write_error)?;
        Ok(category)
    }

    async fn update_category(&self, category: Category) -> Result<Category> {
        let result = sqlx::query(
            "UPDATE categories SET name = $2, description = $3, active = $4 WHERE id = $1",
        )
        .bind(category.id.as_uuid())
        .bind(&category.name)
        .bind(&category.description)
        .bind(category.active)
        .execute(&self.pool)
        .await
        .map_err(map_write_error)?;

        if result.rows_affected() == 0 {
            return Err(StoreError::not_found("Category", category.id));
        }
        Ok(category)
    }

    async fn delete_category(&self, id: CategoryId) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM categories WHERE id = $1)")
                .bind(id.as_uuid())
                .fetch_one(&mut *tx)
                .await?;
        if !exists {
            return Err(StoreError::not_found("Category", id));
        }

        let in_use: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM products WHERE category_id = $1)")
                .bind(id.as_uuid())
                .fetch_one(&mut *tx)
                .await?;
        if in_use {
            return Err(StoreError::CategoryInUse(id));
        }

        // A product inserted since the check trips the foreign key.
        sqlx::query("DELETE FROM categories WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&mut *tx)
            .await
            .map_err(|e| match &e {
                sqlx::Error::Database(db_err) if db_err.is_foreign_key_violation() => {
                    StoreError::CategoryInUse(id)
                }
                _ => StoreError::Database(e),
            })?;

        tx.commit().await?;
        Ok(())
    }

    async fn get_category(&self, id: CategoryId) -> Result<Option<Category>> {
        let row = sqlx::query("SELECT id, name, description, active FROM categories WHERE id = $1")
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(Self::row_to_category).transpose()
    }

    async fn list_categories(&self, active_only: bool) -> Result<Vec<Category>> {
        let rows = sqlx::query(
            r#"
            SELECT id, name, description, active
            FROM categories
            WHERE active OR NOT $1
            ORDER BY name ASC
            "#,
        )
        .bind(active_only)
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(Self::row_to_category).collect()
    }

    async fn product_counts_by_category(&self) -> Result<HashMap<CategoryId, u64>> {
        let rows = sqlx::query(
            r#"
            SELECT category_id, COUNT(*) AS count
            FROM products
            WHERE category_id IS NOT NULL
            GROUP BY category_id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        let mut counts = HashMap::with_capacity(rows.len());
        for row in &rows {
            let category_id: Uuid = row.try_get("category_id")?;
            let count: i64 = row.try_get("count")?;
            counts.insert(
                CategoryId::from_uuid(category_id),
                u64::try_from(count).unwrap_or_default(),
            );
        }
        Ok(counts)
    }

    async fn insert_product(&self, product: Product) -> Result<Product> {
        sqlx::query(
            r#"
            INSERT INTO products (id, code, name, description, price, stock, critical_stock,
                                  image, category_id, active, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            "#,
        )
        .bind(product.id.as_uuid())
        .bind(&product.code)
        .bind(&product.name)
        .bind(&product.description)
        .bind(product.price.amount())
        .bind(product.stock)
        .bind(product.critical_stock)
        .bind(&product.image)
        .bind(product.category_id.map(|id| id.as_uuid()))
        .bind(product.active)
        .bind(product.created_at)
        .execute(&self.pool)
        .await
        .map_err(map_write_error)?;

        Ok(product)
    }

    async fn update_product(&self, id: ProductId, patch: ProductPatch) -> Result<Product> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE id = $1 FOR UPDATE"
        ))
        .bind(id.as_uuid())
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| StoreError::not_found("Product", id))?;

        let mut product = Self::row_to_product(&row)?;
        product.apply(patch)?;

        sqlx::query(
            r#"
            UPDATE products SET name = $2, description = $3, price = $4, stock = $5,
                                critical_stock = $6, image = $7, category_id = $8, active = $9
            WHERE id = $1
            "#,
        )
        .bind(id.as_uuid())
        .bind(&product.name)
        .bind(&product.description)
        .bind(product.price.amount())
        .bind(product.stock)
        .bind(product.critical_stock)
        .bind(&product.image)
        .bind(product.category_id.map(|id| id.as_uuid()))
        .bind(product.active)
        .execute(&mut *tx)
        .await
        .map_err(map_write_error)?;

        tx.commit().await?;
        Ok(product)
    }

    async fn delete_product(&self, id: ProductId) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("UPDATE line_items SET product_id = NULL WHERE product_id = $1")
            .bind(id.as_uuid())
            .execute(&mut *tx)
            .await?;
        let result = sqlx::query("DELETE FROM products WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&mut *tx)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::not_found("Product", id));
        }
        tx.commit().await?;
        Ok(())
    }

    async fn get_product(&self, id: ProductId) -> Result<Option<Product>> {
        let row = sqlx::query(&format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE id = $1"))
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(Self::row_to_product).transpose()
    }

    async fn get_product_by_code(&self, code: &str) -> Result<Option<Product>> {
        let row = sqlx::query(&format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE code = $1"))
            .bind(code)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(Self::row_to_product).transpose()
    }

    async fn list_products(&self, query: ProductQuery) -> Result<Vec<Product>> {
        let mut sql = format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE 1=1");
        let mut param_count = 0;

        if query.active_only {
            sql.push_str(" AND active");
        }
        if query.low_stock_only {
            sql.push_str(" AND stock <= critical_stock");
        }
        if query.category_id.is_some() {
            param_count += 1;
            sql.push_str(&format!(" AND category_id = ${param_count}"));
        }
        if query.name_contains.is_some() {
            param_count += 1;
            sql.push_str(&format!(" AND strpos(lower(name), lower(${param_count})) > 0"));
        }
        sql.push_str(" ORDER BY created_at ASC, code ASC");

        let mut sqlx_query = sqlx::query(&sql);
        if let Some(category_id) = query.category_id {
            sqlx_query = sqlx_query.bind(category_id.as_uuid());
        }
        if let Some(text) = query.name_contains {
            sqlx_query = sqlx_query.bind(text);
        }

        let rows = sqlx_query.fetch_all(&self.pool).await?;
        rows.iter().map(Self::row_to_product).collect()
    }

    async fn adjust_stock(&self, id: ProductId, delta: i32) -> Result<Product> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE id = $1 FOR UPDATE"
        ))
        .bind(id.as_uuid())
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| StoreError::not_found("Product", id))?;

        let mut product = Self::row_to_product(&row)?;
        product.stock = product.adjusted_stock(delta)?;

        sqlx::query("UPDATE products SET stock = $2 WHERE id = $1")
            .bind(id.as_uuid())
            .bind(product.stock)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(product)
    }
}

#[async_trait]
impl OrderStore for PostgresStore {
    async fn place_order(
        &self,
        request: PlaceOrder,
        number: OrderNumber,
        now: DateTime<Utc>,
    ) -> Result<Order> {
        request.validate()?;

        let mut tx = self.pool.begin().await?;

        let user_exists: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM users WHERE id = $1)")
                .bind(request.user_id.as_uuid())
                .fetch_one(&mut *tx)
                .await?;
        if !user_exists {
            return Err(StoreError::not_found("User", request.user_id));
        }

        // Lock in id order so concurrent placements cannot deadlock.
        let mut ids: Vec<Uuid> = request
            .product_ids()
            .into_iter()
            .map(|id| id.as_uuid())
            .collect();
        ids.sort();
        let rows = sqlx::query(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE id = ANY($1) ORDER BY id FOR UPDATE"
        ))
        .bind(ids)
        .fetch_all(&mut *tx)
        .await?;
        let products = rows
            .iter()
            .map(|row| Self::row_to_product(row).map(|product| (product.id, product)))
            .collect::<Result<HashMap<_, _>>>()?;

        let order = Order::place(&request, &products, number, now)?;

        for (product_id, quantity) in request.quantities_by_product() {
            let result = sqlx::query(
                "UPDATE products SET stock = stock - $2 WHERE id = $1 AND stock >= $2",
            )
            .bind(product_id.as_uuid())
            .bind(units(quantity))
            .execute(&mut *tx)
            .await?;

            if result.rows_affected() == 0 {
                let product = products
                    .get(&product_id)
                    .ok_or(DomainError::UnknownProduct(product_id))?;
                return Err(DomainError::InsufficientStock {
                    product: product.name.clone(),
                    requested: quantity,
                    available: product.stock,
                }
                .into());
            }
        }

        Self::insert_order(&mut *tx, &order).await?;
        tx.commit().await?;

        tracing::debug!(order_id = %order.id, items = order.items.len(), "Order row written");
        Ok(order)
    }

    async fn transition_order(
        &self,
        id: OrderId,
        target: OrderState,
        now: DateTime<Utc>,
    ) -> Result<StateChange> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE id = $1 FOR UPDATE"
        ))
        .bind(id.as_uuid())
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| StoreError::not_found("Order", id))?;

        let mut order = Self::load_orders(&mut *tx, vec![row])
            .await?
            .pop()
            .ok_or_else(|| StoreError::not_found("Order", id))?;
        let previous = order.state;
        let restock = order.transition_to(target, now)?;

        let mut ids: Vec<Uuid> = restock.iter().map(|(id, _)| id.as_uuid()).collect();
        ids.sort();
        ids.dedup();
        let rows = sqlx::query(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE id = ANY($1) ORDER BY id FOR UPDATE"
        ))
        .bind(ids)
        .fetch_all(&mut *tx)
        .await?;
        let mut products = rows
            .iter()
            .map(|row| Self::row_to_product(row).map(|product| (product.id, product)))
            .collect::<Result<HashMap<_, _>>>()?;

        let mut restocked_units = 0;
        for (product_id, quantity) in restock {
            // Products deleted since the order was placed are skipped.
            if let Some(product) = products.get_mut(&product_id) {
                product.restock(quantity)?;
                restocked_units += u64::from(quantity);
            }
        }
        let mut restocked: Vec<&Product> = products.values().collect();
        restocked.sort_by_key(|product| product.id);
        for product in restocked {
            sqlx::query("UPDATE products SET stock = $2 WHERE id = $1")
                .bind(product.id.as_uuid())
                .bind(product.stock)
                .execute(&mut *tx)
                .await?;
        }

        sqlx::query("UPDATE orders SET state = $2, updated_at = $3 WHERE id = $1")
            .bind(id.as_uuid())
            .bind(order.state.as_str())
            .bind(order.updated_at)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(StateChange {
            order,
            previous,
            restocked_units,
        })
    }

    async fn get_order(&self, id: OrderId) -> Result<Option<Order>> {
        let mut conn = self.pool.acquire().await?;
        let row = sqlx::query(&format!("SELECT {ORDER_COLUMNS} FROM orders WHERE id = $1"))
            .bind(id.as_uuid())
            .fetch_optional(&mut *conn)
            .await?;
        match row {
            Some(row) => Ok(Self::load_orders(&mut *conn, vec![row]).await?.pop()),
            None => Ok(None),
        }
    }

    async fn get_order_by_number(&self, number: &str) -> Result<Option<Order>> {
        let mut conn = self.pool.acquire().await?;
        let row = sqlx::query(&format!("SELECT {ORDER_COLUMNS} FROM orders WHERE number = $1"))
            .bind(number)
            .fetch_optional(&mut *conn)
            .await?;
        match row {
            Some(row) => Ok(Self::load_orders(&mut *conn, vec![row]).await?.pop()),
            None => Ok(None),
        }
    }

    async fn list_orders(&self, query: OrderQuery) -> Result<Vec<Order>> {
        let mut sql = format!("SELECT {ORDER_COLUMNS} FROM orders");
        sql.push_str(&order_filters(&query));
        sql.push_str(" ORDER BY created_at DESC, number DESC");
        if let Some(limit) = query.limit {
            sql.push_str(&format!(" LIMIT {limit}"));
        }

        let mut conn = self.pool.acquire().await?;
        let rows = bind_order_filters(sqlx::query(&sql), &query)
            .fetch_all(&mut *conn)
            .await?;
        Self::load_orders(&mut *conn, rows).await
    }

    async fn count_orders_by_state(&self) -> Result<HashMap<OrderState, u64>> {
        let rows = sqlx::query("SELECT state, COUNT(*) AS count FROM orders GROUP BY state")
            .fetch_all(&self.pool)
            .await?;

        let mut counts = HashMap::with_capacity(rows.len());
        for row in &rows {
            let state = row.try_get::<String, _>("state")?.parse::<OrderState>()?;
            let count: i64 = row.try_get("count")?;
            counts.insert(state, u64::try_from(count).unwrap_or_default());
        }
        Ok(counts)
    }

    async fn sum_order_totals(&self, query: OrderQuery) -> Result<Money> {
        let mut sql = String::from("SELECT COALESCE(SUM(total), 0)::BIGINT AS total FROM orders");
        sql.push_str(&order_filters(&query));

        let row = bind_order_filters(sqlx::query(&sql), &query)
            .fetch_one(&self.pool)
            .await?;
        Ok(Money::new(row.try_get("total")?))
    }
}

#[async_trait]
impl FaqStore for PostgresStore {
    async fn insert_faq(&self, faq: Faq) -> Result<Faq> {
        sqlx::query(
            r#"
            INSERT INTO faqs (id, question, answer, category, display_order, active)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(faq.id.as_uuid())
        .bind(&faq.question)
        .bind(&faq.answer)
        .bind(&faq.category)
        .bind(faq.display_order)
        .bind(faq.active)
        .execute(&self.pool)
        .await?;
        Ok(faq)
    }

    async fn update_faq(&self, faq: Faq) -> Result<Faq> {
        let result = sqlx::query(
            r#"
            UPDATE faqs SET question = $2, answer = $3, category = $4, display_order = $5,
                            active = $6
            WHERE id = $1
            "#,
        )
        .bind(faq.id.as_uuid())
        .bind(&faq.question)
        .bind(&faq.answer)
        .bind(&faq.category)
        .bind(faq.display_order)
        .bind(faq.active)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::not_found("Faq", faq.id));
        }
        Ok(faq)
    }

    async fn delete_faq(&self, id: FaqId) -> Result<()> {
        let result = sqlx::query("DELETE FROM faqs WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::not_found("Faq", id));
        }
        Ok(())
    }

    async fn get_faq(&self, id: FaqId) -> Result<Option<Faq>> {
        let row = sqlx::query(&format!("SELECT {FAQ_COLUMNS} FROM faqs WHERE id = $1"))
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(Self::row_to_faq).transpose()
    }

    async fn list_faqs(&self, query: FaqQuery) -> Result<Vec<Faq>> {
        let mut sql = format!("SELECT {FAQ_COLUMNS} FROM faqs WHERE 1=1");
        let mut param_count = 0;

        if query.active_only {
            sql.push_str(" AND active");
        }
        if query.category.is_some() {
            param_count += 1;
            sql.push_str(&format!(" AND category = ${param_count}"));
        }
        if query.question_contains.is_some() {
            param_count += 1;
            sql.push_str(&format!(
                " AND strpos(lower(question), lower(${param_count})) > 0"
            ));
        }
        sql.push_str(" ORDER BY display_order ASC, question ASC");

        let mut sqlx_query = sqlx::query(&sql);
        if let Some(category) = query.category {
            sqlx_query = sqlx_query.bind(category);
        }
        if let Some(text) = query.question_contains {
            sqlx_query = sqlx_query.bind(text);
        }

        let rows = sqlx_query.fetch_all(&self.pool).await?;
        rows.iter().map(Self::row_to_faq).collect()
    }

    async fn faq_categories(&self) -> Result<Vec<String>> {
        let categories: Vec<String> = sqlx::query_scalar(
            r#"
            SELECT DISTINCT category
            FROM faqs
            WHERE active AND category IS NOT NULL AND btrim(category) <> ''
            ORDER BY category
            "#,
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(categories)
    }
}

#[async_trait]
impl LocationStore for PostgresStore {
    async fn insert_regions(&self, regions: Vec<(Region, Vec<Comuna>)>) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        for (region, comunas) in &regions {
            sqlx::query("INSERT INTO regions (id, name, code, active) VALUES ($1, $2, $3, $4)")
                .bind(region.id.as_uuid())
                .bind(&region.name)
                .bind(&region.code)
                .bind(region.active)
                .execute(&mut *tx)
                .await
                .map_err(map_write_error)?;

            for comuna in comunas {
                sqlx::query(
                    "INSERT INTO comunas (id, name, region_id, active) VALUES ($1, $2, $3, $4)",
                )
                .bind(comuna.id.as_uuid())
                .bind(&comuna.name)
                .bind(comuna.region_id.as_uuid())
                .bind(comuna.active)
                .execute(&mut *tx)
                .await?;
            }
        }

        tx.commit().await?;
        Ok(())
    }

    async fn count_regions(&self) -> Result<u64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM regions")
            .fetch_one(&self.pool)
            .await?;
        Ok(u64::try_from(count).unwrap_or_default())
    }

    async fn list_regions(&self, active_only: bool) -> Result<Vec<Region>> {
        let rows = sqlx::query(
            "SELECT id, name, code, active FROM regions WHERE active OR NOT $1 ORDER BY code ASC",
        )
        .bind(active_only)
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(Self::row_to_region).collect()
    }

    async fn get_region(&self, id: RegionId) -> Result<Option<Region>> {
        let row = sqlx::query("SELECT id, name, code, active FROM regions WHERE id = $1")
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(Self::row_to_region).transpose()
    }

    async fn list_comunas(
        &self,
        region_id: Option<RegionId>,
        active_only: bool,
    ) -> Result<Vec<Comuna>> {
        let rows = sqlx::query(
            r#"
            SELECT id, name, region_id, active
            FROM comunas
            WHERE ($1::UUID IS NULL OR region_id = $1) AND (active OR NOT $2)
            ORDER BY name ASC
            "#,
        )
        .bind(region_id.map(|id| id.as_uuid()))
        .bind(active_only)
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(Self::row_to_comuna).collect()
    }

    async fn get_comuna(&self, id: ComunaId) -> Result<Option<Comuna>> {
        let row = sqlx::query("SELECT id, name, region_id, active FROM comunas WHERE id = $1")
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(Self::row_to_comuna).transpose()
    }
}
