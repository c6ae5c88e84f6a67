use log::*;
use sqlx::{migrate::MigrateDatabase, Sqlite};

use crate::{db_types::User, SqliteDatabase};

/// Creates a fresh, empty database at `url`, runs the migrations and returns a handle to it.
pub async fn prepare_test_env(url: &str) -> SqliteDatabase {
    dotenvy::from_filename(".env.test").ok();
    let _ = env_logger::try_init();
    debug!("🚀️ Logging initialised");
    create_database(url).await;
    let db = SqliteDatabase::new_with_url(url, 5).await.expect("Error creating connection to database");
    info!("🚀️ Migrations complete");
    db
}

/// A database url in the system temp directory that no other test is using.
pub fn random_db_path() -> String {
    let dir = std::env::temp_dir();
    format!("sqlite://{}/opg_test_{}.db", dir.display(), rand::random::<u64>())
}

pub async fn create_database(url: &str) {
    if Sqlite::database_exists(url).await.unwrap_or(false) {
        if let Err(e) = Sqlite::drop_database(url).await {
            warn!("Error dropping database {url}: {e:?}");
        }
    }
    Sqlite::create_database(url).await.expect("Error creating database");
    info!("Created Sqlite database {url}");
}

/// Seeds the users table with a customer and an administrator.
pub async fn seed_users(db: &SqliteDatabase) {
    let users = [
        User { id: "user-alice".into(), name: "Alice".into(), email: "alice@example.com".into(), role: "USER".into() },
        User { id: "user-bob".into(), name: "Bob".into(), email: "bob@example.com".into(), role: "USER".into() },
        User { id: "admin-1".into(), name: "Admin".into(), email: "admin@example.com".into(), role: "ADMIN".into() },
    ];
    for user in &users {
        db.upsert_user(user).await.expect("Error seeding users");
    }
}
