//! Database seeder for Tandem development and testing.
//!
//! Seeds two users paired as a couple, a few categories, and a month of
//! unsettled expenses, then prints bearer tokens for both users.
//! Running it again reuses what already exists.
//!
//! Usage: cargo run --bin seeder

use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::{Datelike, NaiveDate, Utc};
use rust_decimal::Decimal;

use tandem_core::expense::{ExpenseError, NewCategory, NewExpense};
use tandem_db::entities::users;
use tandem_db::{
    CategoryRepository, Couple, CoupleRepository, ExpenseFilter, ExpenseRepository, UserRepository,
};
use tandem_shared::types::{CategoryId, PageRequest, UserId};
use tandem_shared::{AppConfig, JwtConfig, JwtService};

const CATEGORIES: [(&str, &str); 3] = [
    ("Groceries", "#4CAF50"),
    ("Rent", "#3F51B5"),
    ("Dining", "#FF9800"),
];

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let config = AppConfig::load().context("failed to load configuration")?;

    println!("Connecting to database...");
    let db = tandem_db::connect(&config.database.url)
        .await
        .context("failed to connect to database")
        .map(Arc::new)?;

    println!("Seeding users...");
    let users = UserRepository::new(Arc::clone(&db));
    let alice = seed_user(&users, "alice@tandem.dev", "Alice").await?;
    let bob = seed_user(&users, "bob@tandem.dev", "Bob").await?;

    println!("Seeding couple...");
    let couple = seed_couple(&CoupleRepository::new(Arc::clone(&db)), alice, bob).await?;

    println!("Seeding categories...");
    let categories = seed_categories(&CategoryRepository::new(Arc::clone(&db)), &couple).await?;

    println!("Seeding expenses...");
    let count = seed_expenses(&ExpenseRepository::new(db), &couple, &categories).await?;
    println!("  {count} expenses recorded");

    let jwt = JwtService::new(JwtConfig {
        secret: config.jwt.secret.clone(),
        #[allow(clippy::cast_possible_wrap)]
        access_token_expires_minutes: (config.jwt.access_token_expiry_secs / 60) as i64,
    });
    println!("Development tokens:");
    for (name, user_id) in [("alice", alice), ("bob", bob)] {
        let token = jwt.generate_access_token(user_id.into_inner())?;
        println!("  {name}: {token}");
    }

    println!("Seeding complete!");
    Ok(())
}

async fn seed_user(repo: &UserRepository, email: &str, name: &str) -> Result<UserId> {
    let user: users::Model = match repo.find_by_email(email).await? {
        Some(existing) => {
            println!("  {email} already exists, skipping...");
            existing
        }
        None => repo.create(email, name).await?,
    };
    Ok(UserId::from_uuid(user.id))
}

async fn seed_couple(repo: &CoupleRepository, user1: UserId, user2: UserId) -> Result<Couple> {
    if let Some(existing) = repo.find_by_user(user1).await? {
        println!("  Couple already exists, skipping...");
        return Ok(existing);
    }
    Ok(repo.create(user1, user2, Some("Alice & Bob".to_string())).await?)
}

async fn seed_categories(repo: &CategoryRepository, couple: &Couple) -> Result<Vec<CategoryId>> {
    let mut ids = Vec::with_capacity(CATEGORIES.len());
    for (name, color) in CATEGORIES {
        let input = NewCategory {
            name: name.to_string(),
            color: Some(color.to_string()),
        };
        match repo.create(couple.id, input).await {
            Ok(created) => ids.push(CategoryId::from_uuid(created.id)),
            Err(ExpenseError::DuplicateCategory(_)) => {
                println!("  {name} already exists, skipping...");
            }
            Err(e) => return Err(e.into()),
        }
    }
    if ids.is_empty() {
        ids = repo
            .list(couple.id)
            .await?
            .into_iter()
            .map(|c| CategoryId::from_uuid(c.id))
            .collect();
    }
    Ok(ids)
}

async fn seed_expenses(
    repo: &ExpenseRepository,
    couple: &Couple,
    categories: &[CategoryId],
) -> Result<usize> {
    let today = Utc::now().date_naive();
    let month_start = NaiveDate::from_ymd_opt(today.year(), today.month(), 1)
        .context("invalid month start")?;
    let existing = repo
        .list(
            couple.id,
            ExpenseFilter {
                from: Some(month_start),
                ..ExpenseFilter::default()
            },
            &PageRequest::default(),
        )
        .await?;
    if existing.meta.total > 0 {
        println!("  Expenses for this month already exist, skipping...");
        return Ok(0);
    }

    let (user1, user2) = (couple.partners.user1_id, couple.partners.user2_id);

    // (day, payer, amount, user1 share in basis points, description)
    let expenses = [
        (1, user1, 120_000, 5000, "Rent"),
        (3, user2, 8_400, 5000, "Weekly groceries"),
        (8, user1, 6_200, 5000, "Dinner out"),
        (12, user2, 15_000, 4000, "Electricity"),
        (20, user1, 3_300, 7000, "Pharmacy"),
    ];

    let mut count = 0;
    for (index, (day, payer_id, amount, ratio_bp, description)) in expenses.into_iter().enumerate()
    {
        let Some(expense_date) = month_start.with_day(day) else {
            continue;
        };
        let input = NewExpense {
            payer_id,
            category_id: categories.get(index % categories.len().max(1)).copied(),
            amount: Decimal::from(amount),
            split_ratio: Decimal::new(ratio_bp, 4),
            description: description.to_string(),
            expense_date,
        };
        repo.create(couple, payer_id, input).await?;
        count += 1;
    }
    Ok(count)
}
