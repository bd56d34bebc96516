use axum::Json;
use axum::extract::Query;
use axum::{Router, extract::State, http::StatusCode, routing::get};
use serde::Deserialize;
use tower_http::cors::{Any, CorsLayer};

use crate::db::repository;
use crate::error::AppError;
use crate::models::*;
use crate::state::AppState;

#[derive(Deserialize)]
struct DepartmentQueryParams {
    faculty_id: Option<i64>,
}

#[derive(Deserialize)]
struct CourseQueryParams {
    /// Department guid.
    id: Option<String>,
}

#[derive(Deserialize)]
struct CourseDetailQueryParams {
    code: Option<String>,
}

pub fn router(state: AppState) -> Router {
    // the mirror is read-only, so any origin may query it
    let cors = CorsLayer::new().allow_origin(Any);

    Router::new()
        .route("/health", get(health))
        .route("/api/faculties", get(list_faculties))
        .route("/api/departments", get(list_departments))
        .route("/api/courses", get(list_courses))
        .route("/api/course-detail", get(course_detail))
        .layer(cors)
        .with_state(state)
}

async fn health(State(state): State<AppState>) -> Result<StatusCode, AppError> {
    sqlx::query("select 1").execute(&state.db).await?;
    Ok(StatusCode::OK)
}

async fn list_faculties(State(state): State<AppState>) -> Result<Json<Vec<Faculty>>, AppError> {
    let faculties = repository::fetch_faculties(&state.db).await?;
    Ok(Json(faculties))
}

async fn list_departments(
    State(state): State<AppState>,
    Query(params): Query<DepartmentQueryParams>,
) -> Result<Json<Vec<Department>>, AppError> {
    let departments = repository::fetch_departments(&state.db, params.faculty_id).await?;
    Ok(Json(departments))
}

async fn list_courses(
    State(state): State<AppState>,
    Query(params): Query<CourseQueryParams>,
) -> Result<Json<Vec<Course>>, AppError> {
    let guid = required(params.id, "id")?;
    let department = repository::find_department_by_guid(&state.db, &guid)
        .await?
        .ok_or(AppError::NotFound)?;
    let courses = repository::fetch_courses_by_department(&state.db, department.id).await?;
    Ok(Json(courses))
}

async fn course_detail(
    State(state): State<AppState>,
    Query(params): Query<CourseDetailQueryParams>,
) -> Result<Json<CourseDetailResponse>, AppError> {
    let code = required(params.code, "code")?;
    let detail = repository::find_course_detail(&state.db, &code)
        .await?
        .ok_or(AppError::NotFound)?;
    Ok(Json(detail))
}

fn required(value: Option<String>, name: &str) -> Result<String, AppError> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or_else(|| AppError::BadRequest(format!("{} parameter is required", name)))
}
