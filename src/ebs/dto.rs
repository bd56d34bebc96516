use serde::Deserialize;

/// One node of the faculty/department tree returned by `/home/getdata/`.
#[derive(Debug, Clone, Deserialize)]
pub struct StructureNode {
    pub id: i64,
    #[serde(default)]
    pub guid: Option<String>,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default, rename = "textEn")]
    pub text_en: Option<String>,
    #[serde(default, rename = "ustbirimid")]
    pub parent_id: Option<i64>,
    #[serde(default)]
    pub nodes: Option<Vec<StructureNode>>,
}
