//! Product workbook reader and writer
//!
//! The first worksheet of an `.xlsx` file is loaded into a [`Worksheet`]
//! grid that keeps every cell with its type, so the repair job can write the
//! same columns back out with only the image column changed.

use calamine::{Data, Reader, Xlsx, open_workbook};
use rust_xlsxwriter::Workbook;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::domain::product::{ProductRow, parse_image_ref};
pub use crate::infrastructure::spreadsheet_error::{SpreadsheetError, SpreadsheetResult};

/// Column headers the jobs rely on
pub mod columns {
    pub const ID_SKU: &str = "ID/SKU";
    pub const NAME: &str = "Name";
    pub const BRAND: &str = "Brand";
    pub const CATEGORY: &str = "Category";
    pub const DESCRIPTION: &str = "Description";
}

const XLSX_EXTENSION: &str = "xlsx";

/// One cell, reduced to the types the writer can reproduce
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Empty,
    Text(String),
    Number(f64),
    Bool(bool),
}

impl CellValue {
    /// Cell rendered as text; integral numbers lose their `.0`.
    #[allow(clippy::cast_possible_truncation)]
    pub fn as_text(&self) -> String {
        match self {
            Self::Empty => String::new(),
            Self::Text(text) => text.clone(),
            Self::Number(n) if n.fract() == 0.0 && n.abs() < 1e15 => format!("{}", *n as i64),
            Self::Number(n) => n.to_string(),
            Self::Bool(b) => b.to_string(),
        }
    }
}

impl From<&Data> for CellValue {
    #[allow(clippy::cast_precision_loss)]
    fn from(data: &Data) -> Self {
        match data {
            Data::Empty => Self::Empty,
            Data::String(text) => Self::Text(text.clone()),
            Data::Float(n) => Self::Number(*n),
            Data::Int(n) => Self::Number(*n as f64),
            Data::Bool(b) => Self::Bool(*b),
            Data::DateTime(dt) => Self::Number(dt.as_f64()),
            other => Self::Text(other.to_string()),
        }
    }
}

/// Column positions resolved from the header row
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnMap {
    pub id_sku: usize,
    pub name: usize,
    pub brand: usize,
    pub category: usize,
    pub description: usize,
    pub image: usize,
}

/// First worksheet of a workbook: header row plus data rows
#[derive(Debug, Clone, PartialEq)]
pub struct Worksheet {
    pub name: String,
    /// Sheet position (row, column) of the header row's first cell, 0-based
    pub origin: (u32, u32),
    pub headers: Vec<String>,
    pub rows: Vec<Vec<CellValue>>,
}

impl Worksheet {
    pub fn column_index(&self, column: &str) -> SpreadsheetResult<usize> {
        self.headers
            .iter()
            .position(|header| header == column)
            .ok_or_else(|| SpreadsheetError::MissingColumn {
                column: column.to_string(),
                sheet: self.name.clone(),
            })
    }

    /// Resolve the required columns plus the image column.
    pub fn column_map(&self, image_column: &str) -> SpreadsheetResult<ColumnMap> {
        Ok(ColumnMap {
            id_sku: self.column_index(columns::ID_SKU)?,
            name: self.column_index(columns::NAME)?,
            brand: self.column_index(columns::BRAND)?,
            category: self.column_index(columns::CATEGORY)?,
            description: self.column_index(columns::DESCRIPTION)?,
            image: self.column_index(image_column)?,
        })
    }

    fn text_at(row: &[CellValue], col: usize) -> String {
        row.get(col)
            .map(CellValue::as_text)
            .unwrap_or_default()
            .trim()
            .to_string()
    }

    /// Project every data row onto [`ProductRow`], in sheet order.
    pub fn product_rows(&self, image_column: &str) -> SpreadsheetResult<Vec<ProductRow>> {
        let map = self.column_map(image_column)?;
        Ok(self
            .rows
            .iter()
            .enumerate()
            .map(|(row_index, row)| ProductRow {
                row_index,
                id_sku: Self::text_at(row, map.id_sku),
                name: Self::text_at(row, map.name),
                brand: Self::text_at(row, map.brand),
                category: Self::text_at(row, map.category),
                description: Self::text_at(row, map.description),
                image_url: match row.get(map.image) {
                    Some(CellValue::Text(text)) => parse_image_ref(text),
                    _ => None,
                },
            })
            .collect())
    }

    /// Write each row's `image_url` back into the image column where it
    /// differs from the cell. Rows without an image URL leave their cell as-is.
    /// Returns the number of cells changed.
    pub fn apply_image_urls(&mut self, products: &[ProductRow], image_column: &str) -> SpreadsheetResult<usize> {
        let image_col = self.column_index(image_column)?;
        let width = self.headers.len();
        let mut changed = 0;

        for product in products {
            let Some(url) = product.image_url.as_deref() else {
                continue;
            };
            let Some(row) = self.rows.get_mut(product.row_index) else {
                continue;
            };
            let current = match row.get(image_col) {
                Some(CellValue::Text(text)) => parse_image_ref(text),
                _ => None,
            };
            if current.as_deref() == Some(url) {
                continue;
            }
            if row.len() < width {
                row.resize(width, CellValue::Empty);
            }
            row[image_col] = CellValue::Text(url.to_string());
            changed += 1;
        }

        Ok(changed)
    }
}

fn ensure_xlsx(path: &Path) -> SpreadsheetResult<()> {
    let is_xlsx = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case(XLSX_EXTENSION));
    if is_xlsx {
        Ok(())
    } else {
        Err(SpreadsheetError::UnsupportedFormat {
            path: path.to_path_buf(),
        })
    }
}

/// Read the first worksheet of an `.xlsx` workbook.
pub fn read_workbook(path: &Path) -> SpreadsheetResult<Worksheet> {
    ensure_xlsx(path)?;

    let mut workbook: Xlsx<_> = open_workbook(path).map_err(|source| SpreadsheetError::Open {
        path: path.to_path_buf(),
        source,
    })?;

    let name = workbook
        .sheet_names()
        .first()
        .cloned()
        .ok_or_else(|| SpreadsheetError::NoWorksheet {
            path: path.to_path_buf(),
        })?;

    let range = workbook
        .worksheet_range(&name)
        .map_err(|source| SpreadsheetError::Open {
            path: path.to_path_buf(),
            source,
        })?;

    // 표가 A1이 아닌 곳에서 시작할 수 있음
    let origin = range.start().unwrap_or((0, 0));
    let mut grid = range.rows();
    let headers: Vec<String> = grid
        .next()
        .ok_or_else(|| SpreadsheetError::EmptySheet { sheet: name.clone() })?
        .iter()
        .map(|cell| CellValue::from(cell).as_text().trim().to_string())
        .collect();

    let rows: Vec<Vec<CellValue>> = grid
        .map(|row| row.iter().map(CellValue::from).collect())
        .collect();

    info!("📄 Loaded {} rows from {:?} (sheet '{}')", rows.len(), path, name);
    debug!("Columns: {:?}", headers);

    Ok(Worksheet {
        name,
        origin,
        headers,
        rows,
    })
}

/// Write `sheet` as a single-worksheet `.xlsx` workbook.
pub fn write_workbook(sheet: &Worksheet, path: &Path) -> SpreadsheetResult<()> {
    ensure_xlsx(path)?;

    let write_err = |source| SpreadsheetError::Write {
        path: path.to_path_buf(),
        source,
    };

    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    worksheet.set_name(&sheet.name).map_err(write_err)?;

    for (col, header) in sheet.headers.iter().enumerate() {
        let (excel_row, excel_col) = cell_position(sheet.origin, 0, col)?;
        worksheet
            .write_string(excel_row, excel_col, header)
            .map_err(write_err)?;
    }

    for (idx, row) in sheet.rows.iter().enumerate() {
        for (col, cell) in row.iter().enumerate() {
            let (excel_row, col) = cell_position(sheet.origin, idx + 1, col)?;
            match cell {
                CellValue::Empty => {}
                CellValue::Text(text) => {
                    worksheet.write_string(excel_row, col, text).map_err(write_err)?;
                }
                CellValue::Number(n) => {
                    worksheet.write_number(excel_row, col, *n).map_err(write_err)?;
                }
                CellValue::Bool(b) => {
                    worksheet.write_boolean(excel_row, col, *b).map_err(write_err)?;
                }
            }
        }
    }

    workbook.save(path).map_err(write_err)?;
    info!("💾 Wrote {} rows to {:?}", sheet.rows.len(), path);
    Ok(())
}

/// Sheet coordinates of grid cell (`row`, `col`) for a table at `origin`.
fn cell_position(origin: (u32, u32), row: usize, col: usize) -> SpreadsheetResult<(u32, u16)> {
    let excel_row = u32::try_from(row)
        .ok()
        .and_then(|r| origin.0.checked_add(r))
        .ok_or_else(|| SpreadsheetError::TooLarge {
            reason: format!("row {row} exceeds the xlsx row range"),
        })?;
    let excel_col = u32::try_from(col)
        .ok()
        .and_then(|c| origin.1.checked_add(c))
        .and_then(|c| u16::try_from(c).ok())
        .ok_or_else(|| SpreadsheetError::TooLarge {
            reason: format!("column {col} exceeds the xlsx column range"),
        })?;
    Ok((excel_row, excel_col))
}

/// Output path for an updated copy: `<stem><suffix><.ext>` next to `input`.
///
/// `assets/Products_List.xlsx` with `_updated` becomes
/// `assets/Products_List_updated.xlsx`.
pub fn updated_path(input: &Path, suffix: &str) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default();
    let file_name = match input.extension() {
        Some(ext) => format!("{stem}{suffix}.{}", ext.to_string_lossy()),
        None => format!("{stem}{suffix}"),
    };
    input.with_file_name(file_name)
}
