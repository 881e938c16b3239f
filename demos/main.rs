use repokit::*;

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS users (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL,
    email TEXT UNIQUE,
    is_active BOOLEAN
);

CREATE TABLE IF NOT EXISTS orders (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id INTEGER,
    total_price DECIMAL(10, 2) NOT NULL,
    status TEXT CHECK(status IN ('pending', 'delivered', 'cancelled')),
    FOREIGN KEY(user_id) REFERENCES users(id) ON DELETE CASCADE
);
"#;

#[tokio::main]
async fn main() -> Result<()> {
    let config = OrmConfig::from_env()?.with_indexes(["email"]);
    let _ = init_logging(&config.log_level);

    let orm = Orm::init(config, SCHEMA).await?;
    let users = orm.repository("users")?;
    let orders = orm.repository("orders")?;

    let mut ada = users
        .new_record()
        .with("name", "Ada")?
        .with("email", "ada@mail.com")?
        .with("is_active", true)?;
    users.save_single(&mut ada).await;
    println!("{}\n", ada);

    let mut batch = vec![
        orders
            .new_record()
            .with("user_id", ada.id())?
            .with("total_price", 19.5)?
            .with("status", "pending")?,
        orders
            .new_record()
            .with("user_id", ada.id())?
            .with("total_price", 5.0)?
            .with("status", "delivered")?,
    ];
    orders.save_many(&mut batch).await;

    let found = users
        .load_single(&Filters::new().with("email", "ada@mail.com"))
        .await;
    if let Some(user) = found.ok() {
        println!("{}\n", user);
    }

    let pending = orders
        .custom_query(
            "SELECT u.name, o.total_price FROM orders o JOIN users u ON u.id = o.user_id WHERE o.status = :status",
            &Params::new().with("status", "pending"),
        )
        .await;
    for row in pending.into_vec() {
        println!("{}", row.to_json());
    }

    users.delete(&Filters::new().with("id", ada.id())).await?;
    println!(
        "orders left after cascade: {}",
        orders.load_many(&Filters::new()).await.into_vec().len()
    );

    orm.clean_up(true).await
}
