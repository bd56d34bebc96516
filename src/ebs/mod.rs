pub mod dto;
pub mod extract;

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tracing::debug;
use url::Url;

use crate::config::AppConfig;
use crate::error::AppError;

/// Fixed id of the catalog root on `/home/getdata/`.
pub const STRUCTURE_ROOT_ID: &str = "OStuSxOSf/8=";

const USER_AGENT: &str = concat!("catalog-mirror/", env!("CARGO_PKG_VERSION"));

/// Raw access to the three EBS endpoints. Each call is a single request:
/// no retries and no caching.
#[async_trait]
pub trait EbsClient: Send + Sync {
    /// JSON faculty/department tree.
    async fn fetch_structure(&self) -> Result<String, AppError>;
    /// HTML course listing of one department for one academic year.
    async fn fetch_listing(&self, department_guid: &str, year: i32) -> Result<String, AppError>;
    /// HTML syllabus page of one course.
    async fn fetch_syllabus(&self, link_id: &str, unit_id: &str) -> Result<String, AppError>;
}

#[derive(Clone, Debug)]
pub struct EbsConfig {
    pub base_url: String,
    pub timeout: Duration,
}

impl From<&AppConfig> for EbsConfig {
    fn from(config: &AppConfig) -> Self {
        Self {
            base_url: config.ebs_base_url.clone(),
            timeout: config.http_timeout,
        }
    }
}

pub struct HttpEbsClient {
    client: Client,
    base_url: Url,
}

impl HttpEbsClient {
    pub fn new(config: EbsConfig) -> Result<Self, AppError> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(config.timeout)
            .build()?;
        let base_url = Url::parse(&config.base_url)?;
        Ok(Self { client, base_url })
    }

    /// Joins `path` onto the base URL and appends percent-encoded query pairs.
    fn endpoint(&self, path: &str, params: &[(&str, &str)]) -> Result<Url, AppError> {
        let mut url = self.base_url.join(path)?;
        url.query_pairs_mut().extend_pairs(params);
        Ok(url)
    }

    async fn get_text(&self, url: Url) -> Result<String, AppError> {
        debug!("GET {}", url);
        let response = self.client.get(url.clone()).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::Upstream {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        Ok(response.text().await?)
    }
}

#[async_trait]
impl EbsClient for HttpEbsClient {
    async fn fetch_structure(&self) -> Result<String, AppError> {
        let url = self.endpoint("/home/getdata/", &[("id", STRUCTURE_ROOT_ID)])?;
        self.get_text(url).await
    }

    async fn fetch_listing(&self, department_guid: &str, year: i32) -> Result<String, AppError> {
        let year = year.to_string();
        let url = self.endpoint(
            "/home/dersprogram/",
            &[("id", department_guid), ("yil", year.as_str())],
        )?;
        self.get_text(url).await
    }

    async fn fetch_syllabus(&self, link_id: &str, unit_id: &str) -> Result<String, AppError> {
        let url = self.endpoint("/home/izlence/", &[("id", link_id), ("bid", unit_id)])?;
        self.get_text(url).await
    }
}
