use serde::{Deserialize, Serialize};

use super::product::ProductRow;

/// Which rows a batch job looks at: an optional category filter followed by
/// an optional head-of-list limit, both applied in source order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowSelection {
    pub category: Option<String>,
    pub limit: Option<usize>,
}

impl RowSelection {
    pub fn new(category: Option<String>, limit: Option<usize>) -> Self {
        // An empty category means "no filter", as a blank CLI/config value would.
        let category = category.filter(|c| !c.trim().is_empty());
        Self { category, limit }
    }

    pub fn all() -> Self {
        Self::default()
    }

    fn matches(&self, row: &ProductRow) -> bool {
        self.category
            .as_deref()
            .is_none_or(|category| row.in_category(category))
    }

    /// Selected rows, borrowed, in source order.
    pub fn select<'a>(&'a self, rows: &'a [ProductRow]) -> impl Iterator<Item = &'a ProductRow> + 'a {
        rows.iter()
            .filter(move |row| self.matches(row))
            .take(self.limit.unwrap_or(usize::MAX))
    }

    /// Positions of the selected rows within `rows`.
    pub fn indices(&self, rows: &[ProductRow]) -> Vec<usize> {
        rows.iter()
            .enumerate()
            .filter(|(_, row)| self.matches(row))
            .map(|(idx, _)| idx)
            .take(self.limit.unwrap_or(usize::MAX))
            .collect()
    }
}
