use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Faculty {
    pub id: i64,
    pub guid: String,
    pub name: String,
    pub name_en: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Department {
    pub id: i64,
    pub faculty_id: i64,
    pub guid: String,
    pub name: String,
    pub name_en: String,
}
