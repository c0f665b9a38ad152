//! Offline unit tests for vitrine-db pool configuration and row types.
//! These tests do not require a live database connection.

use chrono::{TimeZone, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;
use vitrine_core::{AppConfig, Business, Environment, PlacementType, Spotlight, SpotlightHistory};
use vitrine_db::{BusinessRow, PoolConfig, SpotlightHistoryRow, SpotlightRow};

#[test]
fn pool_config_from_app_config_uses_core_values() {
    let app_config = AppConfig {
        database_url: "postgres://example".to_string(),
        env: Environment::Test,
        log_level: "info".to_string(),
        rotation_tick_cron: "0 */5 * * * *".to_string(),
        db_max_connections: 42,
        db_min_connections: 7,
        db_acquire_timeout_secs: 9,
    };

    let pool_config = PoolConfig::from_app_config(&app_config);
    assert_eq!(pool_config.max_connections, 42);
    assert_eq!(pool_config.min_connections, 7);
    assert_eq!(pool_config.acquire_timeout_secs, 9);
}

#[test]
fn business_row_converts_to_domain_entity() {
    let created = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
    let row = BusinessRow {
        id: 7,
        public_id: Uuid::new_v4(),
        name: "Corner Bakery".to_string(),
        slug: "corner-bakery".to_string(),
        category: Some("food".to_string()),
        is_active: true,
        is_verified: true,
        follower_count: 180,
        review_count: 42,
        rating: Decimal::new(460, 2),
        created_at: created,
    };

    let business = Business::from(row);
    assert_eq!(business.id, 7);
    assert_eq!(business.slug, "corner-bakery");
    assert_eq!(business.category.as_deref(), Some("food"));
    assert!(business.is_verified);
    assert_eq!(business.created_at, created);
}

#[test]
fn spotlight_row_parses_placement_type() {
    let start = Utc.with_ymd_and_hms(2025, 6, 15, 12, 0, 0).unwrap();
    let row = SpotlightRow {
        id: 1,
        business_id: 7,
        placement_type: "weekly".to_string(),
        position: 2,
        start_date: start,
        end_date: start + chrono::Duration::days(7),
        is_active: true,
        created_at: start,
    };

    let spotlight = Spotlight::try_from(row).unwrap();
    assert_eq!(spotlight.placement, PlacementType::Weekly);
    assert_eq!(spotlight.position, 2);
}

#[test]
fn spotlight_row_with_unknown_placement_is_rejected() {
    let start = Utc.with_ymd_and_hms(2025, 6, 15, 12, 0, 0).unwrap();
    let row = SpotlightRow {
        id: 1,
        business_id: 7,
        placement_type: "hourly".to_string(),
        position: 1,
        start_date: start,
        end_date: start + chrono::Duration::days(1),
        is_active: true,
        created_at: start,
    };

    assert!(Spotlight::try_from(row).is_err());
}

#[test]
fn history_row_converts_with_score_preserved() {
    let start = Utc.with_ymd_and_hms(2025, 6, 1, 0, 0, 0).unwrap();
    let row = SpotlightHistoryRow {
        id: 11,
        public_id: Uuid::new_v4(),
        business_id: 7,
        placement_type: "monthly".to_string(),
        position: 1,
        start_date: start,
        end_date: start + chrono::Duration::days(30),
        total_score: 36.4,
        created_at: start,
    };

    let history = SpotlightHistory::try_from(row).unwrap();
    assert_eq!(history.placement, PlacementType::Monthly);
    assert!((history.total_score - 36.4).abs() < f64::EPSILON);
}
