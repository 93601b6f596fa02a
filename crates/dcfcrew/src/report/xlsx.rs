//! Single-sheet forecast workbook (`dcf_10_year_forecast.xlsx`).

use super::archive::write_zip;
use super::xml::XmlBuilder;
use super::ReportError;
use crate::extraction::{ForecastYear, ValuationData};

pub const SHEET_NAME: &str = "DCF_10Y_Model";

const SHEET_NS: &str = "http://schemas.openxmlformats.org/spreadsheetml/2006/main";

pub const FORECAST_HEADERS: [&str; 13] = [
    "Year",
    "Revenue ($M)",
    "Revenue Growth %",
    "EBIT Margin %",
    "EBIT ($M)",
    "Tax Rate %",
    "NOPAT ($M)",
    "D&A ($M)",
    "Capex ($M)",
    "Change in NWC ($M)",
    "FCFF ($M)",
    "Discount Factor",
    "PV of FCF ($M)",
];

const COLUMN_WIDTHS: [u32; 13] = [8, 16, 16, 14, 14, 12, 14, 12, 12, 16, 14, 14, 16];

/// Indices into `cellXfs` in [`STYLES`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum CellStyle {
    Header = 1,
    Year = 2,
    Number = 3,
    Percent = 4,
    DiscountFactor = 5,
    SummaryLabel = 6,
    SummaryNumber = 7,
    SummaryShares = 8,
    SummaryPerShare = 9,
}

impl CellStyle {
    fn index(self) -> String {
        (self as u8).to_string()
    }
}

const CONTENT_TYPES: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/><Override PartName="/xl/workbook.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml"/><Override PartName="/xl/worksheets/sheet1.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml"/><Override PartName="/xl/styles.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.styles+xml"/></Types>"#;

const ROOT_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="xl/workbook.xml"/></Relationships>"#;

const WORKBOOK: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<workbook xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships"><sheets><sheet name="DCF_10Y_Model" sheetId="1" r:id="rId1"/></sheets></workbook>"#;

const WORKBOOK_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="worksheets/sheet1.xml"/><Relationship Id="rId2" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles" Target="styles.xml"/></Relationships>"#;

const STYLES: &str = r##"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<styleSheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main"><numFmts count="4"><numFmt numFmtId="164" formatCode="#,##0.0"/><numFmt numFmtId="165" formatCode="0.0%"/><numFmt numFmtId="166" formatCode="0.0000"/><numFmt numFmtId="167" formatCode="&quot;$&quot;#,##0.00"/></numFmts><fonts count="4"><font><sz val="10"/><name val="Calibri"/></font><font><b/><sz val="11"/><color rgb="FFFFFFFF"/><name val="Calibri"/></font><font><b/><sz val="10"/><name val="Calibri"/></font><font><b/><sz val="11"/><color rgb="FF1B5E20"/><name val="Calibri"/></font></fonts><fills count="4"><fill><patternFill patternType="none"/></fill><fill><patternFill patternType="gray125"/></fill><fill><patternFill patternType="solid"><fgColor rgb="FF667EEA"/><bgColor indexed="64"/></patternFill></fill><fill><patternFill patternType="solid"><fgColor rgb="FFE8F5E9"/><bgColor indexed="64"/></patternFill></fill></fills><borders count="2"><border><left/><right/><top/><bottom/><diagonal/></border><border><left style="thin"><color rgb="FFD0D0D0"/></left><right style="thin"><color rgb="FFD0D0D0"/></right><top style="thin"><color rgb="FFD0D0D0"/></top><bottom style="thin"><color rgb="FFD0D0D0"/></bottom><diagonal/></border></borders><cellStyleXfs count="1"><xf numFmtId="0" fontId="0" fillId="0" borderId="0"/></cellStyleXfs><cellXfs count="10"><xf numFmtId="0" fontId="0" fillId="0" borderId="0" xfId="0"/><xf numFmtId="0" fontId="1" fillId="2" borderId="1" xfId="0" applyFont="1" applyFill="1" applyBorder="1" applyAlignment="1"><alignment horizontal="center" vertical="center" wrapText="1"/></xf><xf numFmtId="1" fontId="0" fillId="0" borderId="1" xfId="0" applyNumberFormat="1" applyBorder="1" applyAlignment="1"><alignment horizontal="center"/></xf><xf numFmtId="164" fontId="0" fillId="0" borderId="1" xfId="0" applyNumberFormat="1" applyBorder="1" applyAlignment="1"><alignment horizontal="right" vertical="center"/></xf><xf numFmtId="165" fontId="0" fillId="0" borderId="1" xfId="0" applyNumberFormat="1" applyBorder="1" applyAlignment="1"><alignment horizontal="right" vertical="center"/></xf><xf numFmtId="166" fontId="0" fillId="0" borderId="1" xfId="0" applyNumberFormat="1" applyBorder="1" applyAlignment="1"><alignment horizontal="right" vertical="center"/></xf><xf numFmtId="0" fontId="2" fillId="3" borderId="1" xfId="0" applyFont="1" applyFill="1" applyBorder="1" applyAlignment="1"><alignment horizontal="left" vertical="center"/></xf><xf numFmtId="164" fontId="0" fillId="3" borderId="1" xfId="0" applyNumberFormat="1" applyFill="1" applyBorder="1" applyAlignment="1"><alignment horizontal="right" vertical="center"/></xf><xf numFmtId="4" fontId="0" fillId="3" borderId="1" xfId="0" applyNumberFormat="1" applyFill="1" applyBorder="1" applyAlignment="1"><alignment horizontal="right" vertical="center"/></xf><xf numFmtId="167" fontId="3" fillId="3" borderId="1" xfId="0" applyNumberFormat="1" applyFont="1" applyFill="1" applyBorder="1" applyAlignment="1"><alignment horizontal="right" vertical="center"/></xf></cellXfs><cellStyles count="1"><cellStyle name="Normal" xfId="0" builtinId="0"/></cellStyles></styleSheet>"##;

/// Spreadsheet column letters for a 1-based column index.
fn column_letter(mut column: usize) -> String {
    let mut letters = Vec::new();
    while column > 0 {
        let rem = (column - 1) % 26;
        letters.push(b'A' + rem as u8);
        column = (column - 1) / 26;
    }
    letters.reverse();
    String::from_utf8_lossy(&letters).into_owned()
}

fn cell_ref(row: usize, column: usize) -> String {
    format!("{}{}", column_letter(column), row)
}

/// A value written into one cell.
enum Cell<'a> {
    Text(&'a str),
    Number(Option<f64>),
}

struct SheetWriter {
    xml: XmlBuilder,
}

impl SheetWriter {
    fn row(&mut self, row: usize, cells: &[(Cell<'_>, CellStyle)]) -> Result<(), ReportError> {
        let row_number = row.to_string();
        self.xml.open("row", &[("r", row_number.as_str())])?;
        for (idx, (cell, style)) in cells.iter().enumerate() {
            let reference = cell_ref(row, idx + 1);
            let style = style.index();
            match cell {
                Cell::Text(text) => {
                    self.xml.open(
                        "c",
                        &[
                            ("r", reference.as_str()),
                            ("s", style.as_str()),
                            ("t", "inlineStr"),
                        ],
                    )?;
                    self.xml.open("is", &[])?;
                    self.xml.text("t", &[], text)?;
                    self.xml.close("is")?;
                    self.xml.close("c")?;
                }
                Cell::Number(Some(value)) if value.is_finite() => {
                    self.xml
                        .open("c", &[("r", reference.as_str()), ("s", style.as_str())])?;
                    self.xml.text("v", &[], &value.to_string())?;
                    self.xml.close("c")?;
                }
                Cell::Number(_) => {
                    self.xml
                        .empty("c", &[("r", reference.as_str()), ("s", style.as_str())])?;
                }
            }
        }
        self.xml.close("row")
    }
}

/// Fraction of a plain percentage; missing values count as zero.
fn fraction(pct: Option<f64>) -> Option<f64> {
    Some(pct.unwrap_or(0.0) / 100.0)
}

fn forecast_cells(year: &ForecastYear) -> Vec<(Cell<'static>, CellStyle)> {
    vec![
        (Cell::Number(year.year.map(|y| y as f64)), CellStyle::Year),
        (Cell::Number(year.revenue), CellStyle::Number),
        (Cell::Number(fraction(year.revenue_growth_pct)), CellStyle::Percent),
        (Cell::Number(fraction(year.ebit_margin_pct)), CellStyle::Percent),
        (Cell::Number(year.ebit), CellStyle::Number),
        (Cell::Number(fraction(year.tax_rate)), CellStyle::Percent),
        (Cell::Number(year.nopat), CellStyle::Number),
        (Cell::Number(year.depreciation_amortization), CellStyle::Number),
        (Cell::Number(year.capex), CellStyle::Number),
        (Cell::Number(year.change_nwc), CellStyle::Number),
        (Cell::Number(year.fcff), CellStyle::Number),
        (Cell::Number(year.discount_factor), CellStyle::DiscountFactor),
        (Cell::Number(year.pv_fcf), CellStyle::Number),
    ]
}

/// Builds `xl/worksheets/sheet1.xml`.
pub fn sheet_xml(data: &ValuationData) -> Result<Vec<u8>, ReportError> {
    let mut xml = XmlBuilder::new()?;
    xml.open("worksheet", &[("xmlns", SHEET_NS)])?;

    xml.open("cols", &[])?;
    for (idx, width) in COLUMN_WIDTHS.iter().enumerate() {
        let column = (idx + 1).to_string();
        let width = width.to_string();
        xml.empty(
            "col",
            &[
                ("min", column.as_str()),
                ("max", column.as_str()),
                ("width", width.as_str()),
                ("customWidth", "1"),
            ],
        )?;
    }
    xml.close("cols")?;

    xml.open("sheetData", &[])?;
    let mut sheet = SheetWriter { xml };

    let header: Vec<(Cell<'_>, CellStyle)> = FORECAST_HEADERS
        .iter()
        .map(|h| (Cell::Text(*h), CellStyle::Header))
        .collect();
    sheet.row(1, &header)?;

    for (idx, year) in data.forecast.iter().enumerate() {
        sheet.row(idx + 2, &forecast_cells(year))?;
    }

    // Summary block sits two rows below the last forecast row.
    let summary_start = data.forecast.len() + 3;
    let summary = [
        ("Terminal Value ($M)", data.terminal_value, CellStyle::SummaryNumber),
        ("PV of Terminal Value ($M)", data.pv_terminal_value, CellStyle::SummaryNumber),
        ("Enterprise Value ($M)", data.enterprise_value, CellStyle::SummaryNumber),
        ("Net Debt ($M)", data.net_debt, CellStyle::SummaryNumber),
        ("Equity Value ($M)", data.equity_value, CellStyle::SummaryNumber),
        ("Shares Outstanding (M)", data.shares_outstanding, CellStyle::SummaryShares),
        (
            "Intrinsic Value Per Share ($)",
            data.intrinsic_value_per_share,
            CellStyle::SummaryPerShare,
        ),
    ];
    for (offset, (label, value, style)) in summary.into_iter().enumerate() {
        sheet.row(
            summary_start + offset,
            &[
                (Cell::Text(label), CellStyle::SummaryLabel),
                (Cell::Number(value), style),
            ],
        )?;
    }

    let mut xml = sheet.xml;
    xml.close("sheetData")?;
    xml.close("worksheet")?;
    Ok(xml.finish())
}

/// Renders the complete `.xlsx` package.
pub fn render_xlsx(data: &ValuationData) -> Result<Vec<u8>, ReportError> {
    let sheet = sheet_xml(data)?;
    write_zip(&[
        ("[Content_Types].xml", CONTENT_TYPES.as_bytes()),
        ("_rels/.rels", ROOT_RELS.as_bytes()),
        ("xl/workbook.xml", WORKBOOK.as_bytes()),
        ("xl/_rels/workbook.xml.rels", WORKBOOK_RELS.as_bytes()),
        ("xl/styles.xml", STYLES.as_bytes()),
        ("xl/worksheets/sheet1.xml", &sheet),
    ])
}
