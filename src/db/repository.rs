use std::collections::HashSet;

use sqlx::{Row, SqlitePool};

use crate::models::{Course, CourseDetail, CourseDetailResponse, Department, Faculty};

const COURSE_COLUMNS: &str = r#"
    course_code AS code,
    department_id,
    course_name AS name,
    credit,
    ects,
    is_mandatory,
    theory_hours AS theory,
    practice_hours AS practice,
    lab_hours AS lab,
    semester,
    link_id,
    unit_id,
    year,
    is_removed
"#;

const DEPARTMENT_COLUMNS: &str = r#"
    department_id AS id,
    faculty_id,
    department_guid AS guid,
    department_name AS name,
    department_name_en AS name_en
"#;

pub async fn upsert_faculty(db: &SqlitePool, faculty: &Faculty) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO faculties (faculty_id, faculty_guid, faculty_name, faculty_name_en)
        VALUES (?, ?, ?, ?)
        ON CONFLICT (faculty_id) DO UPDATE SET
            faculty_guid = excluded.faculty_guid,
            faculty_name = excluded.faculty_name,
            faculty_name_en = excluded.faculty_name_en
        "#,
    )
    .bind(faculty.id)
    .bind(&faculty.guid)
    .bind(&faculty.name)
    .bind(&faculty.name_en)
    .execute(db)
    .await?;
    Ok(())
}

pub async fn fetch_faculties(db: &SqlitePool) -> Result<Vec<Faculty>, sqlx::Error> {
    sqlx::query_as::<_, Faculty>(
        r#"
        SELECT
            faculty_id AS id,
            faculty_guid AS guid,
            faculty_name AS name,
            faculty_name_en AS name_en
        FROM faculties
        ORDER BY faculty_id
        "#,
    )
    .fetch_all(db)
    .await
}

pub async fn upsert_department(db: &SqlitePool, department: &Department) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO departments
            (department_id, faculty_id, department_guid, department_name, department_name_en)
        VALUES (?, ?, ?, ?, ?)
        ON CONFLICT (department_id) DO UPDATE SET
            faculty_id = excluded.faculty_id,
            department_guid = excluded.department_guid,
            department_name = excluded.department_name,
            department_name_en = excluded.department_name_en
        "#,
    )
    .bind(department.id)
    .bind(department.faculty_id)
    .bind(&department.guid)
    .bind(&department.name)
    .bind(&department.name_en)
    .execute(db)
    .await?;
    Ok(())
}

pub async fn fetch_departments(
    db: &SqlitePool,
    faculty_id: Option<i64>,
) -> Result<Vec<Department>, sqlx::Error> {
    match faculty_id {
        Some(faculty_id) => {
            sqlx::query_as::<_, Department>(&format!(
                "SELECT {} FROM departments WHERE faculty_id = ? ORDER BY department_id",
                DEPARTMENT_COLUMNS
            ))
            .bind(faculty_id)
            .fetch_all(db)
            .await
        }
        None => {
            sqlx::query_as::<_, Department>(&format!(
                "SELECT {} FROM departments ORDER BY department_id",
                DEPARTMENT_COLUMNS
            ))
            .fetch_all(db)
            .await
        }
    }
}

pub async fn find_department_by_guid(
    db: &SqlitePool,
    guid: &str,
) -> Result<Option<Department>, sqlx::Error> {
    sqlx::query_as::<_, Department>(&format!(
        "SELECT {} FROM departments WHERE department_guid = ? LIMIT 1",
        DEPARTMENT_COLUMNS
    ))
    .bind(guid)
    .fetch_optional(db)
    .await
}

/// Writes the course under `department_id`, replacing any row with the same
/// (code, department, year).
pub async fn upsert_course(
    db: &SqlitePool,
    course: &Course,
    department_id: i64,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO courses
            (course_code, department_id, course_name, credit, ects, is_mandatory,
             theory_hours, practice_hours, lab_hours, semester, link_id, unit_id,
             year, is_removed)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        ON CONFLICT (course_code, department_id, year) DO UPDATE SET
            course_name = excluded.course_name,
            credit = excluded.credit,
            ects = excluded.ects,
            is_mandatory = excluded.is_mandatory,
            theory_hours = excluded.theory_hours,
            practice_hours = excluded.practice_hours,
            lab_hours = excluded.lab_hours,
            semester = excluded.semester,
            link_id = excluded.link_id,
            unit_id = excluded.unit_id,
            is_removed = excluded.is_removed
        "#,
    )
    .bind(&course.code)
    .bind(department_id)
    .bind(&course.name)
    .bind(course.credit)
    .bind(course.ects)
    .bind(course.is_mandatory)
    .bind(course.theory)
    .bind(course.practice)
    .bind(course.lab)
    .bind(&course.semester)
    .bind(&course.link_id)
    .bind(&course.unit_id)
    .bind(course.year)
    .bind(course.is_removed)
    .execute(db)
    .await?;
    Ok(())
}

pub async fn fetch_courses_by_department(
    db: &SqlitePool,
    department_id: i64,
) -> Result<Vec<Course>, sqlx::Error> {
    sqlx::query_as::<_, Course>(&format!(
        "SELECT {} FROM courses WHERE department_id = ? ORDER BY semester, course_code, year DESC",
        COURSE_COLUMNS
    ))
    .bind(department_id)
    .fetch_all(db)
    .await
}

/// Codes persisted for the department in any year.
pub async fn fetch_course_codes(
    db: &SqlitePool,
    department_id: i64,
) -> Result<HashSet<String>, sqlx::Error> {
    let codes: Vec<String> =
        sqlx::query_scalar("SELECT DISTINCT course_code FROM courses WHERE department_id = ?")
            .bind(department_id)
            .fetch_all(db)
            .await?;
    Ok(codes.into_iter().collect())
}

pub async fn upsert_course_detail(db: &SqlitePool, detail: &CourseDetail) -> Result<(), sqlx::Error> {
    let outcomes = serde_json::to_string(&detail.outcomes)
        .map_err(|e| sqlx::Error::Encode(Box::new(e)))?;

    sqlx::query(
        r#"
        INSERT INTO course_details
            (course_code, course_name, instructor, language, aim, content, resources, outcomes)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?)
        ON CONFLICT (course_code) DO UPDATE SET
            course_name = excluded.course_name,
            instructor = excluded.instructor,
            language = excluded.language,
            aim = excluded.aim,
            content = excluded.content,
            resources = excluded.resources,
            outcomes = excluded.outcomes
        "#,
    )
    .bind(&detail.code)
    .bind(&detail.name)
    .bind(&detail.instructor)
    .bind(&detail.language)
    .bind(&detail.aim)
    .bind(&detail.content)
    .bind(&detail.resources)
    .bind(outcomes)
    .execute(db)
    .await?;
    Ok(())
}

/// Codes whose stored detail has an aim, a content section or outcomes.
pub async fn fetch_codes_with_valid_detail(db: &SqlitePool) -> Result<HashSet<String>, sqlx::Error> {
    let codes: Vec<String> = sqlx::query_scalar(
        r#"
        SELECT course_code FROM course_details
        WHERE length(aim) > 0
           OR length(content) > 0
           OR outcomes NOT IN ('', '[]', 'null')
        "#,
    )
    .fetch_all(db)
    .await?;
    Ok(codes.into_iter().collect())
}

/// Course joined with its detail. Non-removed rows win, then the newest year.
pub async fn find_course_detail(
    db: &SqlitePool,
    code: &str,
) -> Result<Option<CourseDetailResponse>, sqlx::Error> {
    let row = sqlx::query(
        r#"
        SELECT
            c.course_code AS code,
            c.department_id,
            c.course_name AS name,
            c.credit,
            c.ects,
            c.is_mandatory,
            c.theory_hours AS theory,
            c.practice_hours AS practice,
            c.lab_hours AS lab,
            c.semester,
            c.link_id,
            c.unit_id,
            c.year,
            c.is_removed,
            d.course_name AS detail_name,
            d.instructor,
            d.language,
            d.aim,
            d.content,
            d.resources,
            d.outcomes
        FROM courses c
        JOIN course_details d ON c.course_code = d.course_code
        WHERE c.course_code = ?
        ORDER BY c.is_removed ASC, c.year DESC
        LIMIT 1
        "#,
    )
    .bind(code)
    .fetch_optional(db)
    .await?;

    let Some(row) = row else {
        return Ok(None);
    };

    let course = <Course as sqlx::FromRow<'_, sqlx::sqlite::SqliteRow>>::from_row(&row)?;
    let outcomes_json: String = row.try_get("outcomes")?;
    let outcomes: Vec<String> = serde_json::from_str(&outcomes_json).unwrap_or_default();

    let detail = CourseDetail {
        code: course.code.clone(),
        name: row.try_get("detail_name")?,
        instructor: row.try_get("instructor")?,
        language: row.try_get("language")?,
        aim: row.try_get("aim")?,
        content: row.try_get("content")?,
        resources: row.try_get("resources")?,
        outcomes,
    };

    Ok(Some(CourseDetailResponse::new(course, detail)))
}
