use chrono::{Duration, Utc};
use duckdb::{Connection, params};
use rand::Rng;
use rand::seq::SliceRandom;
use tracing::info;

pub const SAMPLE_PRODUCTS: usize = 1000;
const DEMO_USERS: usize = 25;
const DEMO_ORDERS: usize = 60;
const DEMO_INTERACTIONS: usize = 800;

const TABLES: &[(&str, &str)] = &[
    (
        "users",
        "CREATE TABLE IF NOT EXISTS users (
            id INTEGER PRIMARY KEY,
            username VARCHAR NOT NULL,
            email VARCHAR UNIQUE NOT NULL,
            password VARCHAR NOT NULL,
            created_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP
        )",
    ),
    (
        "products",
        "CREATE TABLE IF NOT EXISTS products (
            id INTEGER PRIMARY KEY,
            name VARCHAR NOT NULL,
            price DOUBLE NOT NULL,
            mrp DOUBLE,
            category VARCHAR,
            subcategory VARCHAR,
            brand VARCHAR,
            rating DOUBLE,
            num_reviews INTEGER DEFAULT 0,
            description VARCHAR,
            image_path VARCHAR,
            stock INTEGER DEFAULT 100,
            tags VARCHAR
        )",
    ),
    (
        "cart",
        "CREATE TABLE IF NOT EXISTS cart (
            id INTEGER PRIMARY KEY,
            user_id INTEGER NOT NULL,
            product_id INTEGER NOT NULL,
            name VARCHAR NOT NULL,
            price DOUBLE NOT NULL,
            quantity INTEGER DEFAULT 1,
            added_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP,
            UNIQUE (user_id, product_id)
        )",
    ),
    (
        "orders",
        "CREATE TABLE IF NOT EXISTS orders (
            id INTEGER PRIMARY KEY,
            user_id INTEGER NOT NULL,
            total DOUBLE NOT NULL,
            status VARCHAR DEFAULT 'placed',
            created_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP
        )",
    ),
    (
        "order_items",
        "CREATE TABLE IF NOT EXISTS order_items (
            id INTEGER PRIMARY KEY,
            order_id INTEGER NOT NULL,
            product_id INTEGER NOT NULL,
            name VARCHAR NOT NULL,
            price DOUBLE NOT NULL,
            quantity INTEGER DEFAULT 1
        )",
    ),
    (
        "interactions",
        "CREATE TABLE IF NOT EXISTS interactions (
            id INTEGER PRIMARY KEY,
            user_id INTEGER NOT NULL,
            product_id INTEGER NOT NULL,
            action VARCHAR NOT NULL,
            duration INTEGER DEFAULT 0,
            timestamp TIMESTAMP DEFAULT CURRENT_TIMESTAMP
        )",
    ),
];

const INDEXES: &[&str] = &[
    "CREATE INDEX IF NOT EXISTS idx_interactions_user ON interactions(user_id)",
    "CREATE INDEX IF NOT EXISTS idx_interactions_product ON interactions(product_id)",
    "CREATE INDEX IF NOT EXISTS idx_products_category ON products(category)",
    "CREATE INDEX IF NOT EXISTS idx_products_rating ON products(rating)",
];

const CATEGORIES: &[(&str, &[(&str, &[&str])])] = &[
    ("Men", &[("T-Shirts", &["Cotton T-Shirt", "Polo Shirt", "V-Neck Tee"]), ("Shirts", &["Casual Shirt", "Formal Shirt"])]),
    ("Women", &[("Tops", &["Blouse", "Tank Top"]), ("Dresses", &["Maxi Dress", "Midi Dress"])]),
    ("Kids", &[("Boys", &["Kids T-Shirt"]), ("Girls", &["Girls Dress"])]),
    ("Accessories", &[("Bags", &["Backpack", "Tote Bag"])]),
];

const BRANDS: &[&str] = &["Nike", "Adidas", "Puma", "H&M", "Zara", "Levis"];
const COLORS: &[&str] = &["Black", "White", "Navy", "Grey", "Red", "Blue"];
const ORDER_STATUSES: &[&str] = &["placed", "shipped", "delivered", "cancelled"];
// views dominate real traffic
const ACTIONS: &[&str] = &["view", "view", "view", "click", "add_to_cart", "purchase"];

struct SeededProduct {
    id: i64,
    name: String,
    price: f64,
}

pub fn create_tables(conn: &Connection) -> Result<(), duckdb::Error> {
    for (table_name, table_sql) in TABLES {
        conn.execute_batch(table_sql)?;
        info!("Ensured table {}", table_name);
    }

    for index_sql in INDEXES {
        conn.execute_batch(index_sql)?;
    }

    Ok(())
}

fn count(conn: &Connection, table: &str) -> Result<i64, duckdb::Error> {
    conn.query_row(&format!("SELECT COUNT(*) FROM {}", table), [], |row| row.get(0))
}

fn timestamp_within_days<R: Rng + ?Sized>(rng: &mut R, days: i64) -> String {
    let ts = Utc::now().naive_utc() - Duration::minutes(rng.gen_range(0..days * 24 * 60));
    ts.format("%Y-%m-%d %H:%M:%S").to_string()
}

/// Fills the catalog with randomized products (plus demo users, orders and
/// interactions) unless it already holds a full catalog. Returns whether
/// anything was written.
pub fn populate_sample_data<R: Rng + ?Sized>(conn: &Connection, rng: &mut R) -> Result<bool, duckdb::Error> {
    if count(conn, "products")? >= SAMPLE_PRODUCTS as i64 {
        return Ok(false);
    }

    // DuckDB rejects re-inserting a primary key deleted earlier in the same
    // transaction, so the partial catalog is cleared before BEGIN
    conn.execute_batch(
        "DELETE FROM interactions; DELETE FROM order_items; DELETE FROM cart; DELETE FROM orders; DELETE FROM products;",
    )?;

    conn.execute_batch("BEGIN TRANSACTION")?;
    match insert_sample_rows(conn, rng) {
        Ok(product_count) => {
            conn.execute_batch("COMMIT")?;
            info!("{} products generated", product_count);
            Ok(true)
        }
        Err(e) => {
            conn.execute_batch("ROLLBACK").ok();
            Err(e)
        }
    }
}

fn insert_sample_rows<R: Rng + ?Sized>(conn: &Connection, rng: &mut R) -> Result<usize, duckdb::Error> {
    let products = insert_products(conn, rng)?;

    if count(conn, "users")? == 0 {
        let mut stmt = conn.prepare(
            "INSERT INTO users (id, username, email, password, created_at) VALUES (?, ?, ?, ?, CAST(? AS TIMESTAMP))",
        )?;
        for i in 1..=DEMO_USERS as i64 {
            // demo accounts cannot log in
            stmt.execute(params![
                i,
                format!("user{}", i),
                format!("user{}@example.com", i),
                "!",
                timestamp_within_days(rng, 365)
            ])?;
        }
    }

    let user_ids: Vec<i64> = {
        let mut stmt = conn.prepare("SELECT id FROM users ORDER BY id")?;
        stmt.query_map([], |row| row.get(0))?.collect::<Result<_, _>>()?
    };
    if user_ids.is_empty() {
        return Ok(products.len());
    }

    insert_orders(conn, rng, &user_ids, &products)?;
    insert_interactions(conn, rng, &user_ids, &products)?;

    Ok(products.len())
}

fn insert_products<R: Rng + ?Sized>(conn: &Connection, rng: &mut R) -> Result<Vec<SeededProduct>, duckdb::Error> {
    let mut stmt = conn.prepare(
        "INSERT INTO products (id, name, price, mrp, category, subcategory, brand, rating,
                               num_reviews, description, image_path, stock, tags)
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
    )?;

    let mut products = Vec::with_capacity(SAMPLE_PRODUCTS);
    for i in 1..=SAMPLE_PRODUCTS as i64 {
        let (category, subcategories) = CATEGORIES[rng.gen_range(0..CATEGORIES.len())];
        let (subcategory, types) = subcategories[rng.gen_range(0..subcategories.len())];
        let product_type = types[rng.gen_range(0..types.len())];
        let brand = BRANDS[rng.gen_range(0..BRANDS.len())];
        let color = COLORS[rng.gen_range(0..COLORS.len())];

        let price = rng.gen_range(299..=9500) as f64;
        let mrp = (price * rng.gen_range(1.3..1.8)).floor();
        let rating = (rng.gen_range(3.2..=4.9_f64) * 10.0).round() / 10.0;
        let name = format!("{} {} {}", brand, color, product_type);

        stmt.execute(params![
            i,
            name,
            price,
            mrp,
            category,
            subcategory,
            brand,
            rating,
            rng.gen_range(10..=5000),
            format!("{} {} from {}", color, product_type, brand),
            format!("/static/imgs/downloaded_images/{}.jpg", ((i - 1) % 35) + 1),
            rng.gen_range(50..=500),
            format!("{},{},{}", category, brand, color).to_lowercase()
        ])?;

        products.push(SeededProduct { id: i, name, price });
    }

    Ok(products)
}

fn insert_orders<R: Rng + ?Sized>(
    conn: &Connection,
    rng: &mut R,
    user_ids: &[i64],
    products: &[SeededProduct],
) -> Result<(), duckdb::Error> {
    let mut order_stmt = conn.prepare(
        "INSERT INTO orders (id, user_id, total, status, created_at) VALUES (?, ?, ?, ?, CAST(? AS TIMESTAMP))",
    )?;
    let mut item_stmt = conn.prepare(
        "INSERT INTO order_items (id, order_id, product_id, name, price, quantity) VALUES (?, ?, ?, ?, ?, ?)",
    )?;

    let mut item_id = 0_i64;
    for order_id in 1..=DEMO_ORDERS as i64 {
        let user_id = user_ids.choose(rng).copied().unwrap_or(1);
        let line_count = rng.gen_range(1..=4);
        let mut total = 0.0;
        let mut lines = Vec::with_capacity(line_count);

        for _ in 0..line_count {
            let Some(product) = products.choose(rng) else { break };
            let quantity = rng.gen_range(1..=3_i64);
            total += product.price * quantity as f64;
            lines.push((product, quantity));
        }

        let status = ORDER_STATUSES[rng.gen_range(0..ORDER_STATUSES.len())];
        order_stmt.execute(params![order_id, user_id, total, status, timestamp_within_days(rng, 90)])?;

        for (product, quantity) in lines {
            item_id += 1;
            item_stmt.execute(params![item_id, order_id, product.id, product.name, product.price, quantity])?;
        }
    }

    Ok(())
}

fn insert_interactions<R: Rng + ?Sized>(
    conn: &Connection,
    rng: &mut R,
    user_ids: &[i64],
    products: &[SeededProduct],
) -> Result<(), duckdb::Error> {
    let mut stmt = conn.prepare(
        "INSERT INTO interactions (id, user_id, product_id, action, duration, timestamp)
         VALUES (?, ?, ?, ?, ?, CAST(? AS TIMESTAMP))",
    )?;

    for id in 1..=DEMO_INTERACTIONS as i64 {
        let user_id = user_ids.choose(rng).copied().unwrap_or(1);
        let product_id = products.choose(rng).map(|p| p.id).unwrap_or(1);
        let action = ACTIONS[rng.gen_range(0..ACTIONS.len())];
        stmt.execute(params![
            id,
            user_id,
            product_id,
            action,
            rng.gen_range(0..=300),
            timestamp_within_days(rng, 30)
        ])?;
    }

    Ok(())
}
