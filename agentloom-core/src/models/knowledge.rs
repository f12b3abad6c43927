use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    pub id: String,
    #[serde(default, alias = "filename")]
    pub name: String,
    #[serde(default)]
    pub source_type: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub chunk_count: Option<u64>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScrapeRequest {
    pub url: String,
    #[serde(default)]
    pub recursive: bool,
    #[serde(default = "default_max_pages")]
    pub max_pages: u32,
}

fn default_max_pages() -> u32 {
    10
}

impl ScrapeRequest {
    pub fn single(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            recursive: false,
            max_pages: 1,
        }
    }
}

/// Free-text knowledge entered by hand instead of uploaded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextEntry {
    pub title: String,
    pub content: String,
}

/// Tabular knowledge: a header row plus data rows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableEntry {
    pub name: String,
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl TableEntry {
    /// Parse a CSV-ish block: first line is the header, fields split on commas.
    pub fn from_csv(name: impl Into<String>, text: &str) -> Option<Self> {
        let mut lines = text.lines().map(str::trim).filter(|l| !l.is_empty());
        let columns: Vec<String> = lines
            .next()?
            .split(',')
            .map(|c| c.trim().to_string())
            .collect();
        let rows = lines
            .map(|l| l.split(',').map(|c| c.trim().to_string()).collect())
            .collect();
        Some(Self {
            name: name.into(),
            columns,
            rows,
        })
    }

    pub fn is_rectangular(&self) -> bool {
        self.rows.iter().all(|r| r.len() == self.columns.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_from_csv() {
        let table = TableEntry::from_csv("prices", "sku, price\nA1, 10\n\nB2, 20\n").unwrap();
        assert_eq!(table.columns, vec!["sku", "price"]);
        assert_eq!(table.rows.len(), 2);
        assert!(table.is_rectangular());
    }

    #[test]
    fn test_table_from_csv_ragged() {
        let table = TableEntry::from_csv("t", "a,b\n1\n").unwrap();
        assert!(!table.is_rectangular());
        assert!(TableEntry::from_csv("t", "   \n").is_none());
    }
}
