/// All database primary keys are PostgreSQL BIGSERIAL.
pub type DbId = i64;

/// Users are referenced by their primary key.
pub type UserId = DbId;

/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;

/// Calendar dates without a time component (campaign start/end).
pub type Date = chrono::NaiveDate;
