//! Development seed data: a small demo directory with engagement snapshots.

use rust_decimal::Decimal;
use sqlx::PgPool;

use crate::businesses::NewBusiness;
use crate::{engagement_metrics, DbError};

/// Seed a handful of demo businesses with engagement metrics, skipping any
/// whose slug already exists. Returns the number of businesses inserted.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if any insert fails.
pub async fn seed_demo_directory(pool: &PgPool) -> Result<usize, DbError> {
    // (name, slug, category, verified, followers, reviews, rating x100,
    //  posts_engagement, followers_growth, recent_activity)
    let demo: &[(&str, &str, &str, bool, i32, i32, i64, f64, i32, i32)] = &[
        ("Corner Bakery", "corner-bakery", "food", true, 180, 42, 460, 64.0, 25, 9),
        ("Harbor Books", "harbor-books", "retail", true, 95, 18, 480, 38.5, 12, 5),
        ("Fern & Stone Yoga", "fern-stone-yoga", "fitness", true, 210, 33, 490, 71.2, 30, 12),
        ("Night Owl Records", "night-owl-records", "retail", true, 60, 9, 430, 22.0, 4, 3),
        ("Juniper Kitchen", "juniper-kitchen", "food", true, 140, 27, 450, 55.8, 18, 7),
        ("Atlas Climbing", "atlas-climbing", "fitness", false, 75, 12, 470, 31.0, 8, 4),
        ("The Print Shop", "the-print-shop", "services", true, 35, 6, 440, 12.4, 2, 2),
    ];

    let mut inserted = 0usize;
    for &(name, slug, category, verified, followers, reviews, rating_cents, posts, growth, activity) in
        demo
    {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM businesses WHERE slug = $1)")
                .bind(slug)
                .fetch_one(pool)
                .await?;
        if exists {
            continue;
        }

        let row = crate::businesses::insert_business(
            pool,
            &NewBusiness {
                name,
                slug,
                category: Some(category),
                is_verified: verified,
                follower_count: followers,
                review_count: reviews,
                rating: Decimal::new(rating_cents, 2),
            },
        )
        .await?;

        engagement_metrics::upsert_engagement_metrics(pool, row.id, growth, posts, activity)
            .await?;
        inserted += 1;
    }

    Ok(inserted)
}
