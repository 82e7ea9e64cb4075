//! Database migration runner for Spendgate.
//!
//! Usage:
//!   migrator up      - Apply pending migrations
//!   migrator down    - Roll back the last migration
//!   migrator status  - List applied and pending migrations
//!   migrator fresh   - Drop everything and migrate from scratch
//!
//! Reads `DATABASE_URL`, from the environment or a `.env` file.

use sea_orm_migration::prelude::*;
use spendgate_db::migration::Migrator;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // The CLI installs its own subscriber
    cli::run_cli(Migrator).await;
}
