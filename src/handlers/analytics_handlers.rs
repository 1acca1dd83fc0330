// timetrack/backend-api/src/handlers/analytics_handlers.rs

use crate::auth_utils::AuthenticatedUser;
use crate::error_handler::ServiceError;
use crate::models::{AnalyticsQueryPeriod, TimeByProjectStat};
use crate::state::AppState;
use actix_web::{get, web, HttpResponse};
use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, Weekday};
use diesel::sql_query;
use diesel::sql_types::{Integer, Nullable, Timestamp};
use diesel_async::RunQueryDsl;

/// Inclusive day range. `None` on either side means unbounded.
type DateRange = (Option<NaiveDate>, Option<NaiveDate>);

// Helper to determine start and end dates based on period
fn calculate_date_range(
    query_params: &AnalyticsQueryPeriod,
    today: NaiveDate,
) -> Result<DateRange, ServiceError> {
    if query_params.start_date.is_some() || query_params.end_date.is_some() {
        if let (Some(start), Some(end)) = (query_params.start_date, query_params.end_date) {
            if start > end {
                return Err(ServiceError::BadRequest(
                    "start_date cannot be after end_date".to_string(),
                ));
            }
        }
        return Ok((query_params.start_date, query_params.end_date));
    }

    match query_params.period.as_deref() {
        None | Some("all") => Ok((None, None)),
        Some("this_week") => {
            let week = today.week(Weekday::Mon);
            Ok((Some(week.first_day()), Some(week.last_day())))
        }
        Some("last_7_days") => Ok((Some(today - Duration::days(6)), Some(today))),
        Some("this_month") => {
            let start_of_month = today.with_day(1).unwrap_or(today);
            let next_month = start_of_month
                .checked_add_months(chrono::Months::new(1))
                .unwrap_or(today);
            Ok((Some(start_of_month), Some(next_month - Duration::days(1))))
        }
        Some("last_30_days") => Ok((Some(today - Duration::days(29)), Some(today))),
        Some(other) => Err(ServiceError::BadRequest(format!(
            "Invalid period specified: {}. Supported: all, this_week, last_7_days, this_month, last_30_days or provide start_date / end_date.",
            other
        ))),
    }
}

// Half-open timestamp bounds: [start 00:00, day after end 00:00)
fn to_timestamp_bounds(range: DateRange) -> (Option<NaiveDateTime>, Option<NaiveDateTime>) {
    let (start, end) = range;
    (
        start.and_then(|d| d.and_hms_opt(0, 0, 0)),
        end.and_then(|d| d.succ_opt())
            .and_then(|d| d.and_hms_opt(0, 0, 0)),
    )
}

// === GET /analytics/time-by-project ===
#[get("/time-by-project")]
pub async fn get_time_by_project_handler(
    state: web::Data<AppState>,
    authenticated_user: AuthenticatedUser,
    query_params: web::Query<AnalyticsQueryPeriod>,
) -> Result<HttpResponse, ServiceError> {
    let user_id = authenticated_user.id;
    log::info!(
        "User {} fetching time_by_project with params: {:?}",
        user_id,
        query_params.0
    );

    let today = chrono::Utc::now().date_naive();
    let (range_start, range_end) = to_timestamp_bounds(calculate_date_range(&query_params.0, today)?);

    let mut conn = state.pool.get().await?;

    // Projects without entries in the range still show up with zero minutes.
    let query = sql_query(
        "SELECT p.id AS project_id, p.name AS project_name, \
                COALESCE(SUM(te.duration), 0)::BIGINT AS total_minutes, \
                COUNT(te.id) AS entry_count \
         FROM projects p \
         LEFT JOIN time_entries te \
                ON te.project_id = p.id \
               AND te.owner_id = $1 \
               AND ($2::timestamp IS NULL OR te.start_time >= $2) \
               AND ($3::timestamp IS NULL OR te.start_time < $3) \
         WHERE p.owner_id = $1 \
         GROUP BY p.id, p.name \
         ORDER BY total_minutes DESC, p.id ASC",
    )
    .bind::<Integer, _>(user_id)
    .bind::<Nullable<Timestamp>, _>(range_start)
    .bind::<Nullable<Timestamp>, _>(range_end);

    log::debug!("Executing SQL for time_by_project: {:?}", query);

    let stats = query
        .load::<TimeByProjectStat>(&mut conn)
        .await
        .map_err(|e| {
            log::error!("Database error in get_time_by_project_handler: {:?}", e);
            ServiceError::from(e)
        })?;

    Ok(HttpResponse::Ok().json(stats))
}
