#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use catalog_mirror::ebs::EbsClient;
use catalog_mirror::error::AppError;
use sqlx::SqlitePool;
use sqlx::sqlite::SqlitePoolOptions;
use tokio::sync::watch;

/// In-memory SQLite with the catalog schema applied.
pub async fn memory_pool() -> SqlitePool {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect("sqlite::memory:")
        .await
        .expect("Failed to create database");
    catalog_mirror::db::migrate(&pool)
        .await
        .expect("Failed to apply migrations");
    pool
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Structure,
    Listing(String, i32),
    Syllabus(String, String),
}

/// Canned EBS responses keyed by request parameters. Unknown listings come
/// back as empty pages, unknown syllabi as 404s.
#[derive(Default)]
pub struct FixtureEbs {
    structure: String,
    listings: HashMap<(String, i32), String>,
    failing_listings: HashSet<(String, i32)>,
    syllabi: HashMap<(String, String), String>,
    listing_delay: Option<Duration>,
    cancel_after: Option<((String, i32), watch::Sender<bool>)>,
    calls: Mutex<Vec<Call>>,
}

impl FixtureEbs {
    pub fn new(structure: impl Into<String>) -> Self {
        Self {
            structure: structure.into(),
            ..Self::default()
        }
    }

    pub fn listing(mut self, guid: &str, year: i32, html: impl Into<String>) -> Self {
        self.listings.insert((guid.to_string(), year), html.into());
        self
    }

    pub fn failing_listing(mut self, guid: &str, year: i32) -> Self {
        self.failing_listings.insert((guid.to_string(), year));
        self
    }

    pub fn syllabus(mut self, link_id: &str, unit_id: &str, html: impl Into<String>) -> Self {
        self.syllabi
            .insert((link_id.to_string(), unit_id.to_string()), html.into());
        self
    }

    pub fn slow_listings(mut self, delay: Duration) -> Self {
        self.listing_delay = Some(delay);
        self
    }

    /// Raises `signal` right after the given listing has been served.
    pub fn cancel_after_listing(mut self, guid: &str, year: i32, signal: watch::Sender<bool>) -> Self {
        self.cancel_after = Some(((guid.to_string(), year), signal));
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn listing_calls(&self) -> Vec<(String, i32)> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::Listing(guid, year) => Some((guid, year)),
                _ => None,
            })
            .collect()
    }

    pub fn syllabus_calls(&self) -> Vec<(String, String)> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::Syllabus(link, unit) => Some((link, unit)),
                _ => None,
            })
            .collect()
    }

    pub fn structure_calls(&self) -> usize {
        self.calls()
            .iter()
            .filter(|call| matches!(call, Call::Structure))
            .count()
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl EbsClient for FixtureEbs {
    async fn fetch_structure(&self) -> Result<String, AppError> {
        self.record(Call::Structure);
        Ok(self.structure.clone())
    }

    async fn fetch_listing(&self, department_guid: &str, year: i32) -> Result<String, AppError> {
        self.record(Call::Listing(department_guid.to_string(), year));
        if let Some(delay) = self.listing_delay {
            tokio::time::sleep(delay).await;
        }

        let key = (department_guid.to_string(), year);
        if let Some((trigger, signal)) = &self.cancel_after {
            if *trigger == key {
                let _ = signal.send(true);
            }
        }
        if self.failing_listings.contains(&key) {
            return Err(AppError::Upstream {
                url: format!("/home/dersprogram/?id={}&yil={}", department_guid, year),
                status: 500,
            });
        }
        Ok(self
            .listings
            .get(&key)
            .cloned()
            .unwrap_or_else(|| "<html><body></body></html>".to_string()))
    }

    async fn fetch_syllabus(&self, link_id: &str, unit_id: &str) -> Result<String, AppError> {
        self.record(Call::Syllabus(link_id.to_string(), unit_id.to_string()));
        self.syllabi
            .get(&(link_id.to_string(), unit_id.to_string()))
            .cloned()
            .ok_or(AppError::Upstream {
                url: format!("/home/izlence/?id={}&bid={}", link_id, unit_id),
                status: 404,
            })
    }
}

/// Structure payload: one faculty per entry, each with `(id, guid)` departments.
pub fn structure_json(faculties: &[(i64, &[(i64, &str)])]) -> String {
    let nodes: Vec<serde_json::Value> = faculties
        .iter()
        .map(|(faculty_id, departments)| {
            let children: Vec<serde_json::Value> = departments
                .iter()
                .map(|(id, guid)| {
                    serde_json::json!({
                        "id": id,
                        "guid": guid,
                        "text": format!("Bölüm {}", id),
                        "textEn": format!("Department {}", id),
                        "ustbirimid": faculty_id,
                        "nodes": []
                    })
                })
                .collect();
            serde_json::json!({
                "id": faculty_id,
                "guid": format!("f{}", faculty_id),
                "text": format!("Fakülte {}", faculty_id),
                "textEn": format!("Faculty {}", faculty_id),
                "ustbirimid": 0,
                "nodes": children
            })
        })
        .collect();
    serde_json::Value::Array(nodes).to_string()
}

pub struct Row<'a> {
    pub code: &'a str,
    pub name: &'a str,
    pub link: Option<(&'a str, &'a str)>,
    pub credit: &'a str,
    pub ects: &'a str,
    pub marker: &'a str,
    pub hours: &'a str,
}

impl<'a> Row<'a> {
    pub fn new(code: &'a str, name: &'a str) -> Self {
        Self {
            code,
            name,
            link: None,
            credit: "3",
            ects: "5",
            marker: "Z",
            hours: "2/1/0",
        }
    }

    pub fn link(mut self, link_id: &'a str, unit_id: &'a str) -> Self {
        self.link = Some((link_id, unit_id));
        self
    }

    pub fn credit(mut self, credit: &'a str) -> Self {
        self.credit = credit;
        self
    }

    fn html(&self) -> String {
        let name = match self.link {
            Some((link_id, unit_id)) => format!(
                r#"<a href="/home/izlence/?id={}&amp;bid={}">{}</a>"#,
                link_id, unit_id, self.name
            ),
            None => self.name.to_string(),
        };
        format!(
            "<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>",
            self.code, name, self.credit, self.ects, self.marker, self.hours
        )
    }
}

pub fn listing_html(semester: &str, rows: &[Row<'_>]) -> String {
    let body: String = rows.iter().map(Row::html).collect();
    format!(
        r#"<html><body><div class="panel-body"><h4>{}</h4><table><thead><tr><th>Kod</th></tr></thead><tbody>{}</tbody></table></div></body></html>"#,
        semester, body
    )
}

pub fn syllabus_html(code: Option<&str>, aim: &str, outcomes: &[&str]) -> String {
    let code_row = code
        .map(|c| format!("<tr><td>Ders Kodu</td><td>{}</td></tr>", c))
        .unwrap_or_default();
    let outcome_rows: String = outcomes
        .iter()
        .enumerate()
        .map(|(i, o)| format!("<tr><td>{}</td><td>{}</td></tr>", i + 1, o))
        .collect();
    format!(
        r#"<html><body>
        <div class="panel"><div class="panel-heading">İzlence Formu</div>
          <table><tr><td>Ders Dili</td><td>Türkçe</td></tr>{}
          <tr><td>Dersi Veren</td><td>Dr. Test</td></tr></table></div>
        <div class="panel"><div class="panel-heading"><h4>Dersin Amacı</h4></div><div class="panel-body">{}</div></div>
        <div class="panel"><div class="panel-heading"><h4>Dersin Öğrenme Çıktıları</h4></div>
          <div class="panel-body"><table><tbody>{}</tbody></table></div></div>
        </body></html>"#,
        code_row, aim, outcome_rows
    )
}
