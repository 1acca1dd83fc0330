// timetrack/backend-api/src/handlers/project_handlers.rs
use crate::auth_utils::AuthenticatedUser;
use crate::error_handler::ServiceError;
use crate::models::{
    CreateProjectPayload, NewProject, Project, ProjectResponse, UpdateProjectChangeset,
    UpdateProjectPayload,
};
use crate::schema::projects::{self, dsl::*};
use crate::state::AppState;
use actix_web::{delete, get, post, put, web, HttpResponse};
use chrono::Utc;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use serde_json::json;

const MAX_NAME_LEN: usize = 120;

fn validate_name(raw: &str) -> Result<String, ServiceError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(ServiceError::BadRequest("Project name is required".to_string()));
    }
    if trimmed.chars().count() > MAX_NAME_LEN {
        return Err(ServiceError::BadRequest(format!(
            "Project name must be at most {} characters",
            MAX_NAME_LEN
        )));
    }
    Ok(trimmed.to_string())
}

#[post("")]
pub async fn create_project_handler(
    state: web::Data<AppState>,
    authenticated_user: AuthenticatedUser,
    payload: web::Json<CreateProjectPayload>,
) -> Result<HttpResponse, ServiceError> {
    let CreateProjectPayload {
        name: raw_name,
        description: raw_description,
    } = payload.into_inner();
    let project_name = validate_name(raw_name.as_deref().unwrap_or_default())?;

    let new_project_data = NewProject {
        name: project_name,
        description: raw_description,
        owner_id: authenticated_user.id,
        created_at: Utc::now().naive_utc(),
    };

    let mut conn = state.pool.get().await?;

    let new_id = diesel::insert_into(projects::table)
        .values(&new_project_data)
        .returning(id)
        .get_result::<i32>(&mut conn)
        .await?;

    log::info!("User {} created project {}", authenticated_user.id, new_id);
    Ok(HttpResponse::Ok().json(json!({ "message": "Project created", "id": new_id })))
}

#[get("")]
pub async fn list_projects_handler(
    state: web::Data<AppState>,
    authenticated_user: AuthenticatedUser,
) -> Result<HttpResponse, ServiceError> {
    let mut conn = state.pool.get().await?;

    let project_list = projects
        .filter(owner_id.eq(authenticated_user.id))
        .order(id.asc())
        .select(Project::as_select())
        .load::<Project>(&mut conn)
        .await?;

    let body: Vec<ProjectResponse> = project_list.into_iter().map(ProjectResponse::from).collect();
    Ok(HttpResponse::Ok().json(body))
}

#[get("/{project_id_path}")]
pub async fn get_project_handler(
    state: web::Data<AppState>,
    authenticated_user: AuthenticatedUser,
    project_id_path: web::Path<i32>,
) -> Result<HttpResponse, ServiceError> {
    let project_to_find_id = project_id_path.into_inner();

    let mut conn = state.pool.get().await?;

    let project_option = projects
        .filter(owner_id.eq(authenticated_user.id))
        .filter(id.eq(project_to_find_id))
        .select(Project::as_select())
        .first::<Project>(&mut conn)
        .await
        .optional()?;

    match project_option {
        Some(project) => Ok(HttpResponse::Ok().json(ProjectResponse::from(project))),
        None => Err(ServiceError::NotFound("Project not found".to_string())),
    }
}

#[put("/{project_id_path}")]
pub async fn update_project_handler(
    state: web::Data<AppState>,
    authenticated_user: AuthenticatedUser,
    project_id_path: web::Path<i32>,
    payload: web::Json<UpdateProjectPayload>,
) -> Result<HttpResponse, ServiceError> {
    let project_to_update_id = project_id_path.into_inner();
    let UpdateProjectPayload {
        name: raw_name,
        description: raw_description,
    } = payload.into_inner();

    let project_changes = UpdateProjectChangeset {
        name: raw_name.as_deref().map(validate_name).transpose()?,
        description: raw_description,
    };

    let mut conn = state.pool.get().await?;

    // An empty changeset is not valid SQL; an empty body still has to prove ownership.
    let touched = if project_changes.is_empty() {
        projects
            .filter(id.eq(project_to_update_id))
            .filter(owner_id.eq(authenticated_user.id))
            .count()
            .get_result::<i64>(&mut conn)
            .await? as usize
    } else {
        diesel::update(
            projects
                .filter(id.eq(project_to_update_id))
                .filter(owner_id.eq(authenticated_user.id)),
        )
        .set(&project_changes)
        .execute(&mut conn)
        .await?
    };

    if touched == 0 {
        return Err(ServiceError::NotFound("Project not found".to_string()));
    }

    log::info!(
        "User {} updated project {}",
        authenticated_user.id,
        project_to_update_id
    );
    Ok(HttpResponse::Ok().json(json!({ "message": "Project updated" })))
}

#[delete("/{project_id_path}")]
pub async fn delete_project_handler(
    state: web::Data<AppState>,
    authenticated_user: AuthenticatedUser,
    project_id_path: web::Path<i32>,
) -> Result<HttpResponse, ServiceError> {
    let project_to_delete_id = project_id_path.into_inner();

    let mut conn = state.pool.get().await?;

    // time_entries.project_id is ON DELETE CASCADE
    let num_deleted = diesel::delete(
        projects
            .filter(owner_id.eq(authenticated_user.id))
            .filter(id.eq(project_to_delete_id)),
    )
    .execute(&mut conn)
    .await?;

    if num_deleted > 0 {
        log::info!(
            "User {} deleted project {}",
            authenticated_user.id,
            project_to_delete_id
        );
        Ok(HttpResponse::Ok().json(json!({ "message": "Project deleted" })))
    } else {
        Err(ServiceError::NotFound("Project not found".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use crate::handlers::configure_api;
    use crate::models::ProjectResponse;
    use crate::test_support::{db_state, lazy_state, seed_user};
    use actix_web::{http::header, http::StatusCode, test, web, App};
    use serde_json::json;

    #[actix_web::test]
    async fn projects_require_authentication() {
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(lazy_state()))
                .configure(configure_api),
        )
        .await;

        let req = test::TestRequest::get().uri("/api/projects").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    }

    #[actix_web::test]
    async fn create_rejects_blank_name() {
        let state = lazy_state();
        let bearer = format!("Bearer {}", state.tokens.issue(1, "judy").unwrap());
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(state))
                .configure(configure_api),
        )
        .await;

        for body in [json!({}), json!({ "name": "   ", "description": "d" })] {
            let req = test::TestRequest::post()
                .uri("/api/projects")
                .insert_header((header::AUTHORIZATION, bearer.clone()))
                .set_json(body)
                .to_request();
            let resp = test::call_service(&app, req).await;
            assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        }
    }

    #[actix_web::test]
    async fn non_numeric_id_is_a_bad_request() {
        let state = lazy_state();
        let bearer = format!("Bearer {}", state.tokens.issue(1, "judy").unwrap());
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(state))
                .configure(configure_api),
        )
        .await;

        let req = test::TestRequest::delete()
            .uri("/api/projects/abc")
            .insert_header((header::AUTHORIZATION, bearer))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn create_then_list_roundtrip() {
        let Some(state) = db_state().await else {
            return;
        };
        let (_, bearer) = seed_user(&state, "ken").await;
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(state))
                .configure(configure_api),
        )
        .await;

        let create = test::TestRequest::post()
            .uri("/api/projects")
            .insert_header((header::AUTHORIZATION, bearer.clone()))
            .set_json(json!({ "name": "Website", "description": "Redesign" }))
            .to_request();
        let created: serde_json::Value = test::call_and_read_body_json(&app, create).await;
        let new_id = created["id"].as_i64().unwrap() as i32;

        let list = test::TestRequest::get()
            .uri("/api/projects")
            .insert_header((header::AUTHORIZATION, bearer))
            .to_request();
        let listed: Vec<ProjectResponse> = test::call_and_read_body_json(&app, list).await;
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id, new_id);
        assert_eq!(listed[0].name, "Website");
        assert_eq!(listed[0].description.as_deref(), Some("Redesign"));
    }

    #[actix_web::test]
    async fn partial_update_keeps_other_fields() {
        let Some(state) = db_state().await else {
            return;
        };
        let (_, bearer) = seed_user(&state, "liam").await;
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(state))
                .configure(configure_api),
        )
        .await;

        let create = test::TestRequest::post()
            .uri("/api/projects")
            .insert_header((header::AUTHORIZATION, bearer.clone()))
            .set_json(json!({ "name": "Old", "description": "Keep me" }))
            .to_request();
        let created: serde_json::Value = test::call_and_read_body_json(&app, create).await;
        let project_id = created["id"].as_i64().unwrap();

        let update = test::TestRequest::put()
            .uri(&format!("/api/projects/{}", project_id))
            .insert_header((header::AUTHORIZATION, bearer.clone()))
            .set_json(json!({ "name": "New" }))
            .to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, update).await;
        assert_eq!(body["message"], "Project updated");

        let get = test::TestRequest::get()
            .uri(&format!("/api/projects/{}", project_id))
            .insert_header((header::AUTHORIZATION, bearer))
            .to_request();
        let project: ProjectResponse = test::call_and_read_body_json(&app, get).await;
        assert_eq!(project.name, "New");
        assert_eq!(project.description.as_deref(), Some("Keep me"));
    }

    #[actix_web::test]
    async fn other_users_projects_are_invisible() {
        let Some(state) = db_state().await else {
            return;
        };
        let (_, owner) = seed_user(&state, "mallory-owner").await;
        let (_, intruder) = seed_user(&state, "mallory").await;
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(state))
                .configure(configure_api),
        )
        .await;

        let create = test::TestRequest::post()
            .uri("/api/projects")
            .insert_header((header::AUTHORIZATION, owner.clone()))
            .set_json(json!({ "name": "Secret" }))
            .to_request();
        let created: serde_json::Value = test::call_and_read_body_json(&app, create).await;
        let uri = format!("/api/projects/{}", created["id"].as_i64().unwrap());

        let update = test::TestRequest::put()
            .uri(&uri)
            .insert_header((header::AUTHORIZATION, intruder.clone()))
            .set_json(json!({ "name": "X" }))
            .to_request();
        assert_eq!(test::call_service(&app, update).await.status(), StatusCode::NOT_FOUND);

        let delete = test::TestRequest::delete()
            .uri(&uri)
            .insert_header((header::AUTHORIZATION, intruder.clone()))
            .to_request();
        assert_eq!(test::call_service(&app, delete).await.status(), StatusCode::NOT_FOUND);

        let list = test::TestRequest::get()
            .uri("/api/projects")
            .insert_header((header::AUTHORIZATION, intruder))
            .to_request();
        let listed: Vec<ProjectResponse> = test::call_and_read_body_json(&app, list).await;
        assert!(listed.is_empty());

        let get = test::TestRequest::get()
            .uri(&uri)
            .insert_header((header::AUTHORIZATION, owner))
            .to_request();
        let project: ProjectResponse = test::call_and_read_body_json(&app, get).await;
        assert_eq!(project.name, "Secret");
    }
}
