use crate::schema::{projects, time_entries, users};
use chrono::{NaiveDate, NaiveDateTime};
use diesel::prelude::*;
use serde::{de, Deserialize, Deserializer, Serialize};

use diesel::sql_types::{BigInt, Integer, Text};

// --- Helpers de désérialisation ---

// Pour Option<Option<String>> : champ absent -> None, null -> Some(None)
fn deserialize_opt_opt_string<'de, D>(deserializer: D) -> Result<Option<Option<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<String>::deserialize(deserializer).map(Some)
}

#[derive(Deserialize)]
#[serde(untagged)]
enum NumberOrString {
    Number(i64),
    Text(String),
}

// HTML <select> values arrive as strings ("3"); API clients send numbers.
fn deserialize_flexible_id<'de, D>(deserializer: D) -> Result<Option<i32>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = match Option::<NumberOrString>::deserialize(deserializer)? {
        None => return Ok(None),
        Some(NumberOrString::Number(n)) => n,
        Some(NumberOrString::Text(s)) if s.trim().is_empty() => return Ok(None),
        Some(NumberOrString::Text(s)) => s
            .trim()
            .parse::<i64>()
            .map_err(|_| de::Error::custom(format!("invalid id '{}'", s)))?,
    };
    i32::try_from(raw)
        .map(Some)
        .map_err(|_| de::Error::custom(format!("id {} is out of range", raw)))
}

// Search forms submit every field, so `?min_duration=` means "no filter".
fn deserialize_blank_i32<'de, D>(deserializer: D) -> Result<Option<i32>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<String>::deserialize(deserializer)? {
        None => Ok(None),
        Some(s) if s.trim().is_empty() => Ok(None),
        Some(s) => s
            .trim()
            .parse::<i32>()
            .map(Some)
            .map_err(|_| de::Error::custom(format!("invalid number '{}'", s))),
    }
}

// --- User Model ---
#[derive(Queryable, Selectable, Identifiable, Debug, Clone, PartialEq)]
#[diesel(table_name = users)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct User {
    pub id: i32,
    pub username: String,
    pub password_hash: String,
    pub created_at: NaiveDateTime,
}

#[derive(Insertable, Debug)]
#[diesel(table_name = users)]
pub struct NewUser {
    pub username: String,
    pub password_hash: String,
    pub created_at: NaiveDateTime,
}

// --- Project Model ---
#[derive(Queryable, Selectable, Identifiable, Associations, Debug, Clone, PartialEq)]
#[diesel(table_name = projects)]
#[diesel(belongs_to(User, foreign_key = owner_id))]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Project {
    pub id: i32,
    pub name: String,
    pub description: Option<String>,
    pub owner_id: i32,
    pub created_at: NaiveDateTime,
}

/// What clients see for a project; the owner is implicit in the token.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ProjectResponse {
    pub id: i32,
    pub name: String,
    pub description: Option<String>,
    pub created_at: NaiveDateTime,
}

impl From<Project> for ProjectResponse {
    fn from(project: Project) -> Self {
        ProjectResponse {
            id: project.id,
            name: project.name,
            description: project.description,
            created_at: project.created_at,
        }
    }
}

#[derive(Insertable, Debug)]
#[diesel(table_name = projects)]
pub struct NewProject {
    pub name: String,
    pub description: Option<String>,
    pub owner_id: i32,
    pub created_at: NaiveDateTime,
}

#[derive(AsChangeset, Debug, Default)]
#[diesel(table_name = projects)]
pub struct UpdateProjectChangeset {
    pub name: Option<String>,
    pub description: Option<Option<String>>,
}

impl UpdateProjectChangeset {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.description.is_none()
    }
}

// --- TimeEntry Model ---
#[derive(Queryable, Selectable, Identifiable, Associations, Debug, Clone, PartialEq)]
#[diesel(table_name = time_entries)]
#[diesel(belongs_to(Project))]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct TimeEntry {
    pub id: i32,
    pub project_id: i32,
    pub owner_id: i32,
    pub description: Option<String>,
    pub start_time: NaiveDateTime,
    pub end_time: NaiveDateTime,
    pub duration: i32,
    pub created_at: NaiveDateTime,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct TimeEntryResponse {
    pub id: i32,
    pub project_id: i32,
    pub project_name: Option<String>,
    pub description: Option<String>,
    pub start_time: NaiveDateTime,
    pub end_time: NaiveDateTime,
    pub duration: i32,
    pub created_at: NaiveDateTime,
}

impl TimeEntryResponse {
    pub fn new(entry: TimeEntry, project_name: Option<String>) -> Self {
        TimeEntryResponse {
            id: entry.id,
            project_id: entry.project_id,
            project_name,
            description: entry.description,
            start_time: entry.start_time,
            end_time: entry.end_time,
            duration: entry.duration,
            created_at: entry.created_at,
        }
    }
}

#[derive(Insertable, Debug)]
#[diesel(table_name = time_entries)]
pub struct NewTimeEntry {
    pub project_id: i32,
    pub owner_id: i32,
    pub description: Option<String>,
    pub start_time: NaiveDateTime,
    pub end_time: NaiveDateTime,
    pub duration: i32,
    pub created_at: NaiveDateTime,
}

#[derive(AsChangeset, Debug, Default)]
#[diesel(table_name = time_entries)]
pub struct UpdateTimeEntryChangeset {
    pub project_id: Option<i32>,
    pub description: Option<Option<String>>,
    pub start_time: Option<NaiveDateTime>,
    pub end_time: Option<NaiveDateTime>,
    pub duration: Option<i32>,
}

impl UpdateTimeEntryChangeset {
    pub fn is_empty(&self) -> bool {
        self.project_id.is_none()
            && self.description.is_none()
            && self.start_time.is_none()
            && self.end_time.is_none()
            && self.duration.is_none()
    }
}

// --- PAYLOAD DTOs ---
// Required fields are still Option here so that a missing field becomes our own
// 400 message instead of a serde rejection.

#[derive(Deserialize, Debug)]
pub struct CredentialsPayload {
    pub username: Option<String>,
    pub password: Option<String>,
}

#[derive(Deserialize, Debug)]
pub struct CreateProjectPayload {
    pub name: Option<String>,
    pub description: Option<String>,
}

#[derive(Deserialize, Debug)]
pub struct UpdateProjectPayload {
    pub name: Option<String>,
    #[serde(deserialize_with = "deserialize_opt_opt_string", default)]
    pub description: Option<Option<String>>,
}

#[derive(Deserialize, Debug)]
pub struct CreateTimeEntryPayload {
    #[serde(deserialize_with = "deserialize_flexible_id", default)]
    pub project_id: Option<i32>,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    pub description: Option<String>,
}

#[derive(Deserialize, Debug)]
pub struct UpdateTimeEntryPayload {
    #[serde(deserialize_with = "deserialize_flexible_id", default)]
    pub project_id: Option<i32>,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    #[serde(deserialize_with = "deserialize_opt_opt_string", default)]
    pub description: Option<Option<String>>,
}

// Query string filters for GET /time-entries
#[derive(Deserialize, Debug, Default)]
pub struct ListTimeEntriesQuery {
    #[serde(deserialize_with = "deserialize_blank_i32", default)]
    pub project_id: Option<i32>,
    pub description: Option<String>,
    #[serde(deserialize_with = "deserialize_blank_i32", default)]
    pub min_duration: Option<i32>,
    #[serde(deserialize_with = "deserialize_blank_i32", default)]
    pub max_duration: Option<i32>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

// --- Analytics Models ---

#[derive(Deserialize, Debug)]
pub struct AnalyticsQueryPeriod {
    // "this_week", "last_7_days", "this_month", "last_30_days"
    pub period: Option<String>,
    pub start_date: Option<NaiveDate>, // YYYY-MM-DD
    pub end_date: Option<NaiveDate>,   // YYYY-MM-DD, inclusive
}

#[derive(QueryableByName, Serialize, Deserialize, Debug, Clone, PartialEq)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct TimeByProjectStat {
    #[diesel(sql_type = Integer)]
    pub project_id: i32,
    #[diesel(sql_type = Text)]
    pub project_name: String,
    #[diesel(sql_type = BigInt)] // SUM sur int4 retourne bigint
    pub total_minutes: i64,
    #[diesel(sql_type = BigInt)]
    pub entry_count: i64,
}
