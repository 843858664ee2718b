// Allow dead_code because these helpers are used across different test files
// which are compiled separately
#![allow(dead_code)]

use anyhow::Result;
use chrono::{DateTime, NaiveDate, Utc};
use tempfile::TempDir;

use aerario::application::LedgerService;
use aerario::domain::OwnerRef;

/// Helper to create a test service with a temporary database
pub async fn test_service() -> Result<(LedgerService, TempDir)> {
    let temp_dir = TempDir::new()?;
    let db_path = temp_dir.path().join("test.db");
    let service = LedgerService::init(db_path.to_str().unwrap()).await?;
    Ok((service, temp_dir))
}

/// Helper to create a bare repository with a temporary database,
/// for tests that need to set up state below the service layer.
pub async fn test_repository() -> Result<(aerario::Repository, TempDir)> {
    let temp_dir = TempDir::new()?;
    let db_path = temp_dir.path().join("test.db");
    let db_url = format!("sqlite:{}?mode=rwc", db_path.to_str().unwrap());
    let repo = aerario::Repository::init(&db_url).await?;
    Ok((repo, temp_dir))
}

/// Helper to parse a date string into DateTime<Utc>
pub fn parse_date(date_str: &str) -> DateTime<Utc> {
    NaiveDate::parse_from_str(date_str, "%Y-%m-%d")
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap()
        .and_utc()
}

/// Test fixture: a household with one user and one group the user belongs to.
pub struct Household {
    pub user: OwnerRef,
    pub group: OwnerRef,
}

impl Household {
    pub async fn create(service: &LedgerService) -> Result<Self> {
        let user = service.create_user("alice".into()).await?;
        let group = service.create_group("family".into()).await?;
        service.add_group_member(group.id, user.id).await?;

        Ok(Self {
            user: OwnerRef::User(user.id),
            group: OwnerRef::Group(group.id),
        })
    }
}
