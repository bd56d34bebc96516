use std::collections::HashSet;
use std::ops::ControlFlow;
use std::sync::Arc;

use chrono::{Datelike, Local, NaiveDate};
use serde::Serialize;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::ebs::{EbsClient, extract};
use crate::error::AppError;
use crate::models::{Course, Department};
use crate::repository::CatalogRepository;
use crate::services::throttle::Throttle;

/// How many academic years before the current one are scanned.
pub const BACKFILL_YEARS: i32 = 7;

/// Month in which a new academic year starts.
const ACADEMIC_YEAR_START_MONTH: u32 = 9;

/// Calendar year of `date`, minus one before September.
pub fn academic_year(date: NaiveDate) -> i32 {
    if date.month() < ACADEMIC_YEAR_START_MONTH {
        date.year() - 1
    } else {
        date.year()
    }
}

/// Years scanned for a department, newest first: `current` down to
/// `current - BACKFILL_YEARS` inclusive.
pub fn backfill_years(current: i32) -> impl Iterator<Item = i32> {
    (current - BACKFILL_YEARS..=current).rev()
}

pub struct SyncService {
    repo: Arc<dyn CatalogRepository>,
    ebs: Arc<dyn EbsClient>,
    throttle: Throttle,
}

#[derive(Debug, Default, Clone, PartialEq, Serialize)]
pub struct SyncStats {
    pub faculties: usize,
    pub departments: usize,
    pub departments_skipped: usize,
    pub listings_fetched: usize,
    pub listings_failed: usize,
    pub courses_saved: usize,
    pub courses_known: usize,
    pub courses_failed: usize,
    pub details_saved: usize,
    pub details_invalid: usize,
    pub details_failed: usize,
    pub cancelled: bool,
}

/// Bookkeeping owned by a single run.
struct RunState {
    current_year: i32,
    valid_details: HashSet<String>,
    stats: SyncStats,
}

fn is_cancelled(cancel: &watch::Receiver<bool>) -> bool {
    *cancel.borrow()
}

impl SyncService {
    pub fn new(repo: Arc<dyn CatalogRepository>, ebs: Arc<dyn EbsClient>, throttle: Throttle) -> Self {
        Self { repo, ebs, throttle }
    }

    /// Runs a full sync for today's academic year.
    pub async fn sync_all(&self, cancel: &watch::Receiver<bool>) -> Result<SyncStats, AppError> {
        self.sync_at(Local::now().date_naive(), cancel).await
    }

    /// Runs a full sync as if executed on `today`.
    ///
    /// Only a structure fetch/decode failure aborts the run. Every other
    /// failure is logged and the affected listing, course or detail is left
    /// for the next run.
    pub async fn sync_at(
        &self,
        today: NaiveDate,
        cancel: &watch::Receiver<bool>,
    ) -> Result<SyncStats, AppError> {
        info!("Starting catalog sync...");

        info!("Step 1: Fetching faculty/department structure");
        let payload = self.ebs.fetch_structure().await?;
        let (faculties, departments) = extract::parse_structure(&payload)?;
        info!(
            "Found {} faculties and {} departments",
            faculties.len(),
            departments.len()
        );

        let current_year = academic_year(today);
        let mut run = RunState {
            current_year,
            valid_details: HashSet::new(),
            stats: SyncStats::default(),
        };

        for faculty in &faculties {
            match self.repo.upsert_faculty(faculty).await {
                Ok(()) => run.stats.faculties += 1,
                Err(e) => warn!("Failed to save faculty {} ({}): {}", faculty.name, faculty.id, e),
            }
        }
        for department in &departments {
            match self.repo.upsert_department(department).await {
                Ok(()) => run.stats.departments += 1,
                Err(e) => warn!(
                    "Failed to save department {} ({}): {}",
                    department.name, department.id, e
                ),
            }
        }

        run.valid_details = match self.repo.codes_with_valid_detail().await {
            Ok(codes) => codes,
            Err(e) => {
                warn!("Could not load courses with details, refetching all: {}", e);
                HashSet::new()
            }
        };

        info!(
            "Step 2: Scanning listings from {} back to {}",
            current_year,
            current_year - BACKFILL_YEARS
        );
        for department in &departments {
            if is_cancelled(cancel) {
                run.stats.cancelled = true;
                break;
            }
            if department.guid.is_empty() {
                debug!("Skipping department without guid: {}", department.name);
                run.stats.departments_skipped += 1;
                continue;
            }
            if self.sync_department(department, &mut run, cancel).await.is_break() {
                run.stats.cancelled = true;
                break;
            }
        }

        if run.stats.cancelled {
            warn!("Catalog sync cancelled: {:?}", run.stats);
        } else {
            info!("Catalog sync completed: {:?}", run.stats);
        }
        Ok(run.stats)
    }

    async fn sync_department(
        &self,
        department: &Department,
        run: &mut RunState,
        cancel: &watch::Receiver<bool>,
    ) -> ControlFlow<()> {
        let mut seen = match self.repo.existing_course_codes(department.id).await {
            Ok(codes) => codes,
            Err(e) => {
                warn!("Could not load known courses of {}: {}", department.name, e);
                HashSet::new()
            }
        };

        for year in backfill_years(run.current_year) {
            if is_cancelled(cancel) {
                return ControlFlow::Break(());
            }

            self.throttle.before_listing().await;
            let courses = match self.fetch_listing(department, year).await {
                Ok(courses) => courses,
                Err(e) => {
                    warn!("Listing of {} ({}) failed: {}", department.name, year, e);
                    run.stats.listings_failed += 1;
                    continue;
                }
            };
            run.stats.listings_fetched += 1;

            if courses.is_empty() {
                continue;
            }
            debug!("{} ({}): {} courses", department.name, year, courses.len());

            for mut course in courses {
                course.department_id = department.id;
                course.year = year;
                course.is_removed = year < run.current_year;

                if seen.contains(&course.code) {
                    run.stats.courses_known += 1;
                } else {
                    match self.repo.upsert_course(&course, department.id).await {
                        Ok(()) => {
                            seen.insert(course.code.clone());
                            run.stats.courses_saved += 1;
                        }
                        Err(e) => {
                            warn!("Failed to save course {} ({}): {}", course.code, year, e);
                            run.stats.courses_failed += 1;
                        }
                    }
                }

                self.sync_detail(&course, run).await;
            }
        }

        ControlFlow::Continue(())
    }

    async fn fetch_listing(&self, department: &Department, year: i32) -> Result<Vec<Course>, AppError> {
        let html = self.ebs.fetch_listing(&department.guid, year).await?;
        extract::parse_listing(&html)
    }

    /// Pulls the syllabus for a course whose code has no valid detail yet.
    async fn sync_detail(&self, course: &Course, run: &mut RunState) {
        if run.valid_details.contains(&course.code) || !course.has_syllabus_link() {
            return;
        }

        self.throttle.before_syllabus().await;
        let mut detail = match self.ebs.fetch_syllabus(&course.link_id, &course.unit_id).await {
            Ok(html) => match extract::parse_syllabus(&html) {
                Ok(detail) => detail,
                Err(e) => {
                    warn!("Syllabus of {} could not be parsed: {}", course.code, e);
                    run.stats.details_failed += 1;
                    return;
                }
            },
            Err(e) => {
                warn!("Syllabus of {} failed: {}", course.code, e);
                run.stats.details_failed += 1;
                return;
            }
        };

        if detail.code.is_empty() {
            detail.code = course.code.clone();
        }
        if !detail.is_valid() {
            run.stats.details_invalid += 1;
            return;
        }

        match self.repo.upsert_course_detail(&detail).await {
            Ok(()) => {
                run.valid_details.insert(course.code.clone());
                run.stats.details_saved += 1;
            }
            Err(e) => {
                warn!("Failed to save syllabus of {}: {}", course.code, e);
                run.stats.details_failed += 1;
            }
        }
    }
}
