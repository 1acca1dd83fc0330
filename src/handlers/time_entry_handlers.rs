use crate::auth_utils::AuthenticatedUser;
use crate::error_handler::ServiceError;
use crate::models::{
    CreateTimeEntryPayload, ListTimeEntriesQuery, NewTimeEntry, TimeEntry, TimeEntryResponse,
    UpdateTimeEntryChangeset, UpdateTimeEntryPayload,
};
use crate::schema::{projects, time_entries};
use crate::state::AppState;
use crate::timestamps::{duration_minutes, parse_timestamp};
use actix_web::{delete, get, post, put, web, HttpResponse};
use chrono::Utc;
use diesel::prelude::*;
use diesel_async::{AsyncPgConnection, RunQueryDsl};
use serde_json::json;

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

fn entry_not_found() -> ServiceError {
    ServiceError::NotFound("Time entry not found".to_string())
}

// Escapes LIKE wildcards so user text matches literally.
fn like_pattern(needle: &str) -> String {
    let escaped = needle
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{}%", escaped)
}

/// Entries may only be filed under a project the caller owns.
async fn ensure_project_owned(
    conn: &mut AsyncPgConnection,
    project_to_check: i32,
    user_id: i32,
) -> Result<(), ServiceError> {
    projects::table
        .filter(projects::id.eq(project_to_check))
        .filter(projects::owner_id.eq(user_id))
        .select(projects::id)
        .first::<i32>(conn)
        .await
        .optional()?
        .map(|_| ())
        .ok_or_else(|| {
            log::warn!(
                "User {} referenced project {} they do not own",
                user_id,
                project_to_check
            );
            ServiceError::NotFound("Project not found".to_string())
        })
}

// === POST /time-entries ===
#[post("")]
pub async fn create_time_entry_handler(
    state: web::Data<AppState>,
    authenticated_user: AuthenticatedUser,
    payload: web::Json<CreateTimeEntryPayload>,
) -> Result<HttpResponse, ServiceError> {
    let user_id = authenticated_user.id;
    log::info!("User {} creating time entry with payload: {:?}", user_id, payload.0);

    let CreateTimeEntryPayload {
        project_id: target_project,
        start_time: raw_start,
        end_time: raw_end,
        description: entry_description,
    } = payload.into_inner();

    let (target_project, raw_start, raw_end) =
        match (target_project, non_blank(raw_start), non_blank(raw_end)) {
            (Some(p), Some(s), Some(e)) => (p, s, e),
            _ => {
                return Err(ServiceError::BadRequest(
                    "Missing project_id, start_time or end_time".to_string(),
                ))
            }
        };

    let entry_start = parse_timestamp("start_time", &raw_start)?;
    let entry_end = parse_timestamp("end_time", &raw_end)?;
    let minutes = duration_minutes(entry_start, entry_end)?;

    let mut conn = state.pool.get().await?;

    ensure_project_owned(&mut conn, target_project, user_id).await?;

    let new_time_entry_data = NewTimeEntry {
        project_id: target_project,
        owner_id: user_id,
        description: entry_description,
        start_time: entry_start,
        end_time: entry_end,
        duration: minutes,
        created_at: Utc::now().naive_utc(),
    };

    let new_id = diesel::insert_into(time_entries::table)
        .values(&new_time_entry_data)
        .returning(time_entries::id)
        .get_result::<i32>(&mut conn)
        .await?;

    log::info!("Time entry {} created ({} min)", new_id, minutes);
    Ok(HttpResponse::Ok().json(json!({ "message": "Time entry created", "id": new_id })))
}

// === GET /time-entries ===
#[get("")]
pub async fn list_time_entries_handler(
    state: web::Data<AppState>,
    authenticated_user: AuthenticatedUser,
    query_params: web::Query<ListTimeEntriesQuery>,
) -> Result<HttpResponse, ServiceError> {
    let user_id = authenticated_user.id;
    let query_options = query_params.into_inner();
    log::debug!(
        "User {} listing time entries with options: {:?}",
        user_id,
        query_options
    );

    let mut query = time_entries::table
        .left_join(projects::table)
        .filter(time_entries::owner_id.eq(user_id))
        .order((time_entries::start_time.desc(), time_entries::id.desc()))
        .select((TimeEntry::as_select(), projects::name.nullable()))
        .into_boxed();

    if let Some(p_id) = query_options.project_id {
        query = query.filter(time_entries::project_id.eq(p_id));
    }
    if let Some(needle) = non_blank(query_options.description) {
        query = query.filter(time_entries::description.ilike(like_pattern(needle.trim())));
    }
    if let Some(min) = query_options.min_duration {
        query = query.filter(time_entries::duration.ge(min));
    }
    if let Some(max) = query_options.max_duration {
        query = query.filter(time_entries::duration.le(max));
    }
    if let Some(raw) = non_blank(query_options.start_date) {
        let from = parse_timestamp("start_date", &raw)?;
        query = query.filter(time_entries::start_time.ge(from));
    }
    if let Some(raw) = non_blank(query_options.end_date) {
        let to = parse_timestamp("end_date", &raw)?;
        query = query.filter(time_entries::end_time.le(to));
    }

    let mut conn = state.pool.get().await?;

    let entries: Vec<TimeEntryResponse> = query
        .load::<(TimeEntry, Option<String>)>(&mut conn)
        .await?
        .into_iter()
        .map(|(entry, project_name)| TimeEntryResponse::new(entry, project_name))
        .collect();

    Ok(HttpResponse::Ok().json(entries))
}

// === GET /time-entries/{entry_id_path} ===
#[get("/{entry_id_path}")]
pub async fn get_time_entry_handler(
    state: web::Data<AppState>,
    authenticated_user: AuthenticatedUser,
    entry_id_path: web::Path<i32>,
) -> Result<HttpResponse, ServiceError> {
    let entry_to_find_id = entry_id_path.into_inner();

    let mut conn = state.pool.get().await?;

    let (entry, project_name) = time_entries::table
        .left_join(projects::table)
        .filter(time_entries::owner_id.eq(authenticated_user.id))
        .filter(time_entries::id.eq(entry_to_find_id))
        .select((TimeEntry::as_select(), projects::name.nullable()))
        .first::<(TimeEntry, Option<String>)>(&mut conn)
        .await
        .optional()?
        .ok_or_else(entry_not_found)?;

    Ok(HttpResponse::Ok().json(TimeEntryResponse::new(entry, project_name)))
}

// === PUT /time-entries/{entry_id_path} ===
#[put("/{entry_id_path}")]
pub async fn update_time_entry_handler(
    state: web::Data<AppState>,
    authenticated_user: AuthenticatedUser,
    entry_id_path: web::Path<i32>,
    payload: web::Json<UpdateTimeEntryPayload>,
) -> Result<HttpResponse, ServiceError> {
    let user_id = authenticated_user.id;
    let entry_to_update_id = entry_id_path.into_inner();
    log::info!(
        "User {} updating time_entry {} with payload: {:?}",
        user_id,
        entry_to_update_id,
        payload.0
    );

    let UpdateTimeEntryPayload {
        project_id: target_project,
        start_time: raw_start,
        end_time: raw_end,
        description: entry_description,
    } = payload.into_inner();

    // A supplied bound must parse; blank is not the same as absent.
    let new_start = raw_start
        .map(|raw| parse_timestamp("start_time", &raw))
        .transpose()?;
    let new_end = raw_end
        .map(|raw| parse_timestamp("end_time", &raw))
        .transpose()?;

    let mut conn = state.pool.get().await?;

    let current = time_entries::table
        .filter(time_entries::id.eq(entry_to_update_id))
        .filter(time_entries::owner_id.eq(user_id))
        .select(TimeEntry::as_select())
        .first::<TimeEntry>(&mut conn)
        .await
        .optional()?
        .ok_or_else(entry_not_found)?;

    let mut entry_changes = UpdateTimeEntryChangeset {
        description: entry_description,
        start_time: new_start,
        end_time: new_end,
        ..Default::default()
    };

    // Moving either bound re-derives the duration against the stored other bound.
    if entry_changes.start_time.is_some() || entry_changes.end_time.is_some() {
        entry_changes.duration = Some(duration_minutes(
            entry_changes.start_time.unwrap_or(current.start_time),
            entry_changes.end_time.unwrap_or(current.end_time),
        )?);
    }

    if let Some(p_id) = target_project.filter(|p| *p != current.project_id) {
        ensure_project_owned(&mut conn, p_id, user_id).await?;
        entry_changes.project_id = Some(p_id);
    }

    if !entry_changes.is_empty() {
        log::debug!(
            "Changeset for time_entry {}: {:?}",
            entry_to_update_id,
            entry_changes
        );
        let touched = diesel::update(
            time_entries::table
                .filter(time_entries::id.eq(entry_to_update_id))
                .filter(time_entries::owner_id.eq(user_id)),
        )
        .set(&entry_changes)
        .execute(&mut conn)
        .await?;

        if touched == 0 {
            // Deleted between the read and the write.
            return Err(entry_not_found());
        }
    }

    Ok(HttpResponse::Ok().json(json!({ "message": "Time entry updated" })))
}

// === DELETE /time-entries/{entry_id_path} ===
#[delete("/{entry_id_path}")]
pub async fn delete_time_entry_handler(
    state: web::Data<AppState>,
    authenticated_user: AuthenticatedUser,
    entry_id_path: web::Path<i32>,
) -> Result<HttpResponse, ServiceError> {
    let entry_to_delete_id = entry_id_path.into_inner();

    let mut conn = state.pool.get().await?;

    let num_deleted = diesel::delete(
        time_entries::table
            .filter(time_entries::owner_id.eq(authenticated_user.id))
            .filter(time_entries::id.eq(entry_to_delete_id)),
    )
    .execute(&mut conn)
    .await?;

    if num_deleted > 0 {
        log::info!(
            "User {} deleted time_entry {}",
            authenticated_user.id,
            entry_to_delete_id
        );
        Ok(HttpResponse::Ok().json(json!({ "message": "Time entry deleted" })))
    } else {
        Err(entry_not_found())
    }
}
