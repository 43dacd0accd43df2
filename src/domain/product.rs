use serde::{Deserialize, Serialize};

/// Prefix a cell must start with to be read as an image reference.
pub const URL_PREFIX: &str = "http";

/// One product record from the catalog workbook
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductRow {
    /// Position among the data rows of the source sheet (0-based, header excluded)
    #[serde(rename = "rowIndex")]
    pub row_index: usize,
    #[serde(rename = "idSku")]
    pub id_sku: String,
    pub name: String,
    pub brand: String,
    pub category: String,
    pub description: String,
    /// Image reference read from the configured image column.
    /// `None` when the cell is empty or not URL-shaped.
    #[serde(rename = "imageUrl")]
    pub image_url: Option<String>,
}

impl ProductRow {
    /// Free-text query handed to the image-discovery backend.
    ///
    /// Brand, name and SKU are joined with single spaces and the result is
    /// trimmed. Empty inner fields are kept as-is, so a row without a name
    /// yields `"Brand  SKU"`.
    pub fn search_query(&self) -> String {
        format!("{} {} {}", self.brand, self.name, self.id_sku)
            .trim()
            .to_string()
    }

    pub fn in_category(&self, category: &str) -> bool {
        self.category == category
    }
}

/// Interpret raw cell text as an image reference.
///
/// Only text whose trimmed form starts with [`URL_PREFIX`] counts; relative
/// paths, placeholders and blanks map to `None`.
pub fn parse_image_ref(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    trimmed
        .starts_with(URL_PREFIX)
        .then(|| trimmed.to_string())
}
