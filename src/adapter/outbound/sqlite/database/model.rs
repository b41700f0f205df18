//! Database model types for Diesel ORM.

use diesel::prelude::*;

use super::schema::factions;

/// Database row for one faction record.
#[derive(Queryable, Selectable, Insertable, Debug, Clone)]
#[diesel(table_name = factions)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct FactionRow {
    pub id: String,
    pub body: String,
    pub updated_at: String,
}
