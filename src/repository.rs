use std::collections::HashSet;

use async_trait::async_trait;
use sqlx::SqlitePool;

use crate::db::repository;
use crate::error::AppError;
use crate::models::{Course, CourseDetail, Department, Faculty};

/// Storage operations the sync engine needs. All upserts overwrite by key.
#[async_trait]
pub trait CatalogRepository: Send + Sync {
    async fn upsert_faculty(&self, faculty: &Faculty) -> Result<(), AppError>;
    async fn upsert_department(&self, department: &Department) -> Result<(), AppError>;
    async fn upsert_course(&self, course: &Course, department_id: i64) -> Result<(), AppError>;
    async fn upsert_course_detail(&self, detail: &CourseDetail) -> Result<(), AppError>;
    /// Codes already stored for the department, across all years.
    async fn existing_course_codes(&self, department_id: i64) -> Result<HashSet<String>, AppError>;
    /// Codes that already have a valid syllabus detail, catalog-wide.
    async fn codes_with_valid_detail(&self) -> Result<HashSet<String>, AppError>;
}

#[derive(Clone)]
pub struct SqliteRepository {
    db: SqlitePool,
}

impl SqliteRepository {
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl CatalogRepository for SqliteRepository {
    async fn upsert_faculty(&self, faculty: &Faculty) -> Result<(), AppError> {
        Ok(repository::upsert_faculty(&self.db, faculty).await?)
    }

    async fn upsert_department(&self, department: &Department) -> Result<(), AppError> {
        Ok(repository::upsert_department(&self.db, department).await?)
    }

    async fn upsert_course(&self, course: &Course, department_id: i64) -> Result<(), AppError> {
        Ok(repository::upsert_course(&self.db, course, department_id).await?)
    }

    async fn upsert_course_detail(&self, detail: &CourseDetail) -> Result<(), AppError> {
        Ok(repository::upsert_course_detail(&self.db, detail).await?)
    }

    async fn existing_course_codes(&self, department_id: i64) -> Result<HashSet<String>, AppError> {
        Ok(repository::fetch_course_codes(&self.db, department_id).await?)
    }

    async fn codes_with_valid_detail(&self) -> Result<HashSet<String>, AppError> {
        Ok(repository::fetch_codes_with_valid_detail(&self.db).await?)
    }
}
