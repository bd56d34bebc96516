//! Pure extraction of catalog records from raw EBS payloads.
//!
//! Listing columns are read by position. A reordered upstream table
//! misassigns fields without any error.

use percent_encoding::percent_decode_str;
use scraper::{ElementRef, Html, Selector};
use url::Url;

use crate::ebs::dto::StructureNode;
use crate::error::AppError;
use crate::models::{Course, CourseDetail, Department, Faculty};

const SYLLABUS_FORM_PANEL: &str = "İzlence Formu";
const OUTCOMES_PANEL: &str = "Dersin Öğrenme Çıktıları";

/// Trims and collapses every whitespace run into a single space.
pub fn clean_text(raw: &str) -> String {
    raw.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn element_text(element: &ElementRef<'_>) -> String {
    clean_text(&element.text().collect::<String>())
}

fn next_element<'a>(element: ElementRef<'a>) -> Option<ElementRef<'a>> {
    element.next_siblings().find_map(ElementRef::wrap)
}

fn selector(css: &str) -> Result<Selector, AppError> {
    Selector::parse(css).map_err(|e| AppError::decode(format!("invalid selector '{}': {:?}", css, e)))
}

// --- Structure ---

/// Decodes the structure JSON and flattens it into faculties and departments.
pub fn parse_structure(payload: &str) -> Result<(Vec<Faculty>, Vec<Department>), AppError> {
    let nodes: Vec<StructureNode> = serde_json::from_str(payload)
        .map_err(|e| AppError::decode(format!("structure tree: {}", e)))?;
    Ok(flatten_structure(nodes))
}

/// Top-level nodes become faculties; every node below them becomes a
/// department of that faculty. Order follows the tree, depth first.
pub fn flatten_structure(nodes: Vec<StructureNode>) -> (Vec<Faculty>, Vec<Department>) {
    let mut faculties = Vec::with_capacity(nodes.len());
    let mut departments = Vec::new();

    for node in nodes {
        faculties.push(Faculty {
            id: node.id,
            guid: decode_guid(node.guid.as_deref()),
            name: clean_text(node.text.as_deref().unwrap_or_default()),
            name_en: clean_text(node.text_en.as_deref().unwrap_or_default()),
        });
        collect_departments(node.nodes.unwrap_or_default(), node.id, &mut departments);
    }

    (faculties, departments)
}

fn collect_departments(nodes: Vec<StructureNode>, faculty_id: i64, out: &mut Vec<Department>) {
    for node in nodes {
        out.push(Department {
            id: node.id,
            faculty_id,
            guid: decode_guid(node.guid.as_deref()),
            name: clean_text(node.text.as_deref().unwrap_or_default()),
            name_en: clean_text(node.text_en.as_deref().unwrap_or_default()),
        });
        collect_departments(node.nodes.unwrap_or_default(), faculty_id, out);
    }
}

fn decode_guid(raw: Option<&str>) -> String {
    raw.map(|guid| percent_decode_str(guid.trim()).decode_utf8_lossy().into_owned())
        .unwrap_or_default()
}

// --- Listing ---

/// Reads every `.panel-body` block: an `h4` sets the semester label and each
/// following `table` contributes one course per body row.
pub fn parse_listing(html: &str) -> Result<Vec<Course>, AppError> {
    let document = Html::parse_document(html);
    let panel_sel = selector(".panel-body")?;
    let row_sel = selector("tbody tr")?;
    let cell_sel = selector("td")?;
    let link_sel = selector("a[href]")?;

    let mut courses = Vec::new();
    let mut semester = String::new();

    for panel in document.select(&panel_sel) {
        for child in panel.children().filter_map(ElementRef::wrap) {
            match child.value().name() {
                "h4" => semester = element_text(&child),
                "table" if !semester.is_empty() => {
                    courses.extend(
                        child
                            .select(&row_sel)
                            .filter_map(|row| parse_course_row(row, &semester, &cell_sel, &link_sel)),
                    );
                }
                _ => {}
            }
        }
    }

    Ok(courses)
}

fn parse_course_row(
    row: ElementRef<'_>,
    semester: &str,
    cell_sel: &Selector,
    link_sel: &Selector,
) -> Option<Course> {
    let mut course = Course {
        semester: semester.to_string(),
        ..Course::default()
    };

    for (index, cell) in row.select(cell_sel).enumerate() {
        let text = element_text(&cell);
        match index {
            0 => course.code = text,
            1 => {
                course.name = text;
                if let Some(href) = cell.select(link_sel).next().and_then(|a| a.value().attr("href")) {
                    let (link_id, unit_id) = parse_link_ids(href);
                    course.link_id = link_id;
                    course.unit_id = unit_id;
                }
            }
            2 => course.credit = parse_decimal(&text),
            3 => course.ects = parse_decimal(&text),
            4 => course.is_mandatory = is_mandatory_marker(&text),
            5 => {
                let (theory, practice, lab) = parse_hours(&text);
                course.theory = theory;
                course.practice = practice;
                course.lab = lab;
            }
            _ => {}
        }
    }

    if course.code.is_empty() { None } else { Some(course) }
}

/// Returns the `id` and `bid` query values of a syllabus link, empty when absent.
pub fn parse_link_ids(href: &str) -> (String, String) {
    let Ok(url) = Url::parse("https://ebs.invalid/").and_then(|base| base.join(href.trim())) else {
        return (String::new(), String::new());
    };

    let mut link_id = String::new();
    let mut unit_id = String::new();
    for (key, value) in url.query_pairs() {
        match key.as_ref() {
            "id" if link_id.is_empty() => link_id = value.into_owned(),
            "bid" if unit_id.is_empty() => unit_id = value.into_owned(),
            _ => {}
        }
    }
    (link_id, unit_id)
}

fn parse_decimal(text: &str) -> f64 {
    text.replace(',', ".").parse::<f64>().unwrap_or(0.0)
}

fn is_mandatory_marker(text: &str) -> bool {
    text == "Z" || text == "Zorunlu"
}

/// Splits a `theory/practice/lab` triple; anything but three parts yields zeros.
fn parse_hours(text: &str) -> (i32, i32, i32) {
    let parts: Vec<&str> = text.split('/').collect();
    if parts.len() != 3 {
        return (0, 0, 0);
    }
    let hour = |s: &str| s.trim().parse::<i32>().unwrap_or(0);
    (hour(parts[0]), hour(parts[1]), hour(parts[2]))
}

// --- Syllabus ---

/// Extracts the syllabus form fields, the free-text sections and the
/// learning outcomes from an izlence page.
pub fn parse_syllabus(html: &str) -> Result<CourseDetail, AppError> {
    let document = Html::parse_document(html);
    let heading_sel = selector(".panel-heading")?;
    let title_sel = selector(".panel-heading h4")?;
    let row_sel = selector("table tr")?;
    let body_row_sel = selector("table tbody tr")?;
    let cell_sel = selector("td")?;

    let mut detail = CourseDetail::default();

    for panel in panels_titled(&document, &heading_sel, SYLLABUS_FORM_PANEL) {
        for row in panel.select(&row_sel) {
            let cells: Vec<ElementRef<'_>> = row.select(&cell_sel).collect();
            let mut index = 0;
            while index < cells.len() {
                let label = element_text(&cells[index]);
                let value = || cells.get(index + 1).map(element_text).unwrap_or_default();

                let slot = if label.contains("Ders Adı") {
                    Some(&mut detail.name)
                } else if label.contains("Kod") {
                    Some(&mut detail.code)
                } else if label.contains("Ders Dili") {
                    Some(&mut detail.language)
                } else if label.contains("Dersi Veren") {
                    Some(&mut detail.instructor)
                } else {
                    None
                };

                match slot {
                    Some(field) => {
                        *field = value();
                        // the value cell is never read as a label
                        index += 2;
                    }
                    None => index += 1,
                }
            }
        }
    }

    for title in document.select(&title_sel) {
        let Some(heading) = title
            .ancestors()
            .filter_map(ElementRef::wrap)
            .find(|el| el.value().classes().any(|c| c == "panel-heading"))
        else {
            continue;
        };
        let body = next_element(heading).map(|el| element_text(&el)).unwrap_or_default();

        match element_text(&title).as_str() {
            "Dersin Amacı" => detail.aim = body,
            "İçerik" => detail.content = body,
            "Kaynaklar" => detail.resources = body,
            _ => {}
        }
    }

    for panel in panels_titled(&document, &heading_sel, OUTCOMES_PANEL) {
        for row in panel.select(&body_row_sel) {
            if let Some(cell) = row.select(&cell_sel).nth(1) {
                let outcome = element_text(&cell);
                if !outcome.is_empty() {
                    detail.outcomes.push(outcome);
                }
            }
        }
    }

    Ok(detail)
}

/// Panels (parents of a `.panel-heading`) whose heading text contains `title`.
fn panels_titled<'a>(document: &'a Html, heading_sel: &Selector, title: &str) -> Vec<ElementRef<'a>> {
    let mut panels: Vec<ElementRef<'a>> = Vec::new();
    for heading in document.select(heading_sel) {
        if !element_text(&heading).contains(title) {
            continue;
        }
        if let Some(panel) = heading.parent().and_then(ElementRef::wrap) {
            if !panels.iter().any(|p| p.id() == panel.id()) {
                panels.push(panel);
            }
        }
    }
    panels
}
