//! Data-Dictionary Spreadsheet
//!
//! Builds one worksheet documenting every table: a title block, then one
//! section per table (in name order) with a highlighted table-name row, a
//! header row, one row per column and a blank separator row.
//!
//! Row derivation ([`DictionaryRow`]) and layout ([`DictionarySheet`]) are
//! plain data so they can be checked without opening the XLSX file.

use std::collections::{HashMap, HashSet};
use std::path::Path;

use rust_xlsxwriter::{Color, DocProperties, Format, FormatAlign, FormatBorder, Workbook, XlsxError};

use crate::config::ReportDetails;
use crate::engine::{SchemaInfo, TableInfo};
use crate::error::{AutodocError, Result};

pub const SHEET_NAME: &str = "Dicionário de Dados";
pub const SHEET_TITLE: &str = "Dicionário de dados";

/// Column labels of every table section
pub const HEADERS: [&str; 9] = [
    "Campo",
    "Tipo",
    "Tamanho",
    "Precisão",
    "Obrigatório",
    "Único",
    "Chave primária",
    "Auto Incremento",
    "Chave estrangeira",
];

pub const COLUMN_WIDTHS: [f64; 9] = [20.0, 15.0, 10.0, 10.0, 12.0, 10.0, 15.0, 18.0, 20.0];

const HEADER_FILL: u32 = 0xB2D235;
const LAST_COL: u16 = 8;

/// Zero-based row of the first table section (row 5 in the sheet)
pub const FIRST_SECTION_ROW: u32 = 4;

const YES: &str = "Sim";
const NO: &str = "Não";
const NONE: &str = "-";

/// One documented column
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DictionaryRow {
    pub name: String,
    pub data_type: String,
    pub length: Option<i32>,
    pub precision: Option<i32>,
    pub required: bool,
    pub unique: bool,
    pub primary_key: bool,
    pub autoincrement: bool,
    pub foreign_key: Option<String>,
}

impl DictionaryRow {
    /// Derive the rows of `table`, in column order
    #[must_use]
    pub fn for_table(table: &TableInfo) -> Vec<Self> {
        let unique = unique_columns(table);
        let foreign_keys = foreign_key_targets(table);

        table
            .columns
            .iter()
            .map(|column| Self {
                name: column.name.clone(),
                data_type: simplify_type(&column.data_type).to_string(),
                length: column.length,
                precision: column.precision,
                required: !column.nullable,
                unique: unique.contains(column.name.as_str()),
                primary_key: column.primary_key,
                autoincrement: column.autoincrement,
                foreign_key: foreign_keys.get(column.name.as_str()).map(|t| (*t).to_string()),
            })
            .collect()
    }

    /// Cell values in header order
    #[must_use]
    pub fn cells(&self) -> [String; 9] {
        [
            self.name.clone(),
            self.data_type.clone(),
            self.length.map_or_else(|| NONE.to_string(), |l| l.to_string()),
            self.precision.map_or_else(|| NONE.to_string(), |p| p.to_string()),
            yes_no(self.required),
            yes_no(self.unique),
            yes_no(self.primary_key),
            yes_no(self.autoincrement),
            self.foreign_key.clone().unwrap_or_else(|| NONE.to_string()),
        ]
    }
}

fn yes_no(flag: bool) -> String {
    let label = if flag { YES } else { NO };
    label.to_string()
}

/// Type name without any parenthesised modifier (`varchar(100)` → `varchar`)
#[must_use]
pub fn simplify_type(data_type: &str) -> &str {
    data_type.split('(').next().unwrap_or(data_type).trim()
}

/// Columns that are the sole member of a unique constraint or unique index
#[must_use]
pub fn unique_columns(table: &TableInfo) -> HashSet<&str> {
    let constraints = table.unique_constraints.iter().map(|c| &c.columns);
    let indexes = table.indexes.iter().filter(|i| i.unique).map(|i| &i.columns);

    constraints
        .chain(indexes)
        .filter_map(|columns| match columns.as_slice() {
            [only] => Some(only.as_str()),
            _ => None,
        })
        .collect()
}

/// Map each local FK column to its referenced table; later constraints win
#[must_use]
pub fn foreign_key_targets(table: &TableInfo) -> HashMap<&str, &str> {
    let mut targets = HashMap::new();
    for fk in &table.foreign_keys {
        for column in &fk.columns {
            targets.insert(column.as_str(), fk.referenced_table.as_str());
        }
    }
    targets
}

/// A table section placed on the sheet
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SheetSection {
    /// Zero-based row of the table-name header
    pub row: u32,
    pub table: String,
    pub rows: Vec<DictionaryRow>,
}

impl SheetSection {
    #[must_use]
    pub const fn header_row(&self) -> u32 {
        self.row + 1
    }

    #[must_use]
    pub const fn first_data_row(&self) -> u32 {
        self.row + 2
    }

    /// Row of the next section: data rows plus one blank separator
    #[must_use]
    pub fn next_section_row(&self) -> u32 {
        self.first_data_row() + self.rows.len() as u32 + 1
    }
}

/// Layout of the whole worksheet
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DictionarySheet {
    pub sections: Vec<SheetSection>,
}

impl DictionarySheet {
    /// Lay out one section per table, in schema order
    #[must_use]
    pub fn build(schema: &SchemaInfo) -> Self {
        let mut sections = Vec::with_capacity(schema.tables.len());
        let mut row = FIRST_SECTION_ROW;

        for table in &schema.tables {
            let section = SheetSection {
                row,
                table: table.name.clone(),
                rows: DictionaryRow::for_table(table),
            };
            row = section.next_section_row();
            sections.push(section);
        }

        Self { sections }
    }

    /// Render the sheet into a workbook
    fn to_workbook(&self, details: &ReportDetails) -> std::result::Result<Workbook, XlsxError> {
        let mut workbook = Workbook::new();
        let properties =
            DocProperties::new().set_title(&details.project).set_subject(&details.title);
        workbook.set_properties(&properties);

        let title_format = Format::new()
            .set_font_name("Arial")
            .set_font_size(14)
            .set_bold()
            .set_align(FormatAlign::Center)
            .set_align(FormatAlign::VerticalCenter);
        let header_format = Format::new()
            .set_bold()
            .set_align(FormatAlign::Center)
            .set_align(FormatAlign::VerticalCenter)
            .set_background_color(Color::RGB(HEADER_FILL))
            .set_border(FormatBorder::Thin);
        let cell_format =
            Format::new().set_align(FormatAlign::Center).set_border(FormatBorder::Thin);

        let worksheet = workbook.add_worksheet();
        worksheet.set_name(SHEET_NAME)?;

        // Title block spans A2:I3, no fill or border
        worksheet.merge_range(1, 0, 2, LAST_COL, SHEET_TITLE, &title_format)?;

        for section in &self.sections {
            let (row, header_row) = (section.row, section.header_row());
            worksheet.merge_range(row, 0, row, LAST_COL, &section.table, &header_format)?;

            for (col, label) in (0u16..).zip(HEADERS) {
                worksheet.write_string_with_format(header_row, col, label, &header_format)?;
            }

            for (sheet_row, row) in (section.first_data_row()..).zip(&section.rows) {
                for (col, value) in (0u16..).zip(row.cells()) {
                    worksheet.write_string_with_format(sheet_row, col, value, &cell_format)?;
                }
            }
        }

        for (col, width) in (0u16..).zip(COLUMN_WIDTHS) {
            worksheet.set_column_width(col, width)?;
        }

        // Landscape, one page wide, as many pages tall as needed
        worksheet.set_landscape();
        worksheet.set_print_fit_to_pages(1, 0);

        Ok(workbook)
    }
}

/// Write the data dictionary for `schema` to `path`
///
/// The file is only created once the whole sheet has been rendered.
pub fn write_xlsx(schema: &SchemaInfo, details: &ReportDetails, path: &Path) -> Result<()> {
    tracing::info!(tables = schema.tables.len(), "Generating data dictionary");

    let sheet = DictionarySheet::build(schema);
    let mut workbook = sheet.to_workbook(details).map_err(|e| {
        AutodocError::document_error(format!("Failed to build data dictionary: {e}"))
    })?;

    workbook.save(path).map_err(|e| {
        AutodocError::document_error(format!(
            "Failed to save data dictionary {}: {e}",
            path.display()
        ))
    })?;

    tracing::info!(path = %path.display(), "Data dictionary created");
    Ok(())
}
