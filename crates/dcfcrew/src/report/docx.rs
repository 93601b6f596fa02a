//! Narrative Word report (`valuation_report.docx`).

use chrono::NaiveDate;

use super::archive::write_zip;
use super::format::{fmt_dollars, fmt_num, fmt_pct, NOT_AVAILABLE};
use super::xml::XmlBuilder;
use super::ReportError;
use crate::extraction::ValuationData;

const W_NS: &str = "http://schemas.openxmlformats.org/wordprocessingml/2006/main";
const TITLE_COLOR: &str = "1A365D";
const SUBTITLE_COLOR: &str = "4A5568";
const MUTED_COLOR: &str = "718096";
const VALUE_COLOR: &str = "1B5E20";
const PASS_COLOR: &str = "48BB78";
const FAIL_COLOR: &str = "E53E3E";
const DISCLAIMER_COLOR: &str = "A0AEC0";
const TABLE_WIDTH: u32 = 9000;

const DEFAULT_METHOD_SUMMARY: &str = "A Discounted Cash Flow (DCF) analysis was performed to \
    estimate the intrinsic value of the company based on projected free cash flows discounted \
    at the weighted average cost of capital (WACC).";

const DISCLAIMER: &str = "This report was generated by DCF Production. It is intended for \
    informational purposes only and does not constitute financial advice.";

const CONTENT_TYPES: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/><Override PartName="/word/document.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml"/><Override PartName="/word/styles.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.styles+xml"/></Types>"#;

const ROOT_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="word/document.xml"/></Relationships>"#;

const DOCUMENT_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles" Target="styles.xml"/></Relationships>"#;

const STYLES: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:styles xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:docDefaults><w:rPrDefault><w:rPr><w:rFonts w:ascii="Calibri" w:hAnsi="Calibri" w:cs="Calibri"/><w:sz w:val="20"/><w:szCs w:val="20"/></w:rPr></w:rPrDefault><w:pPrDefault><w:pPr><w:spacing w:after="120"/></w:pPr></w:pPrDefault></w:docDefaults><w:style w:type="paragraph" w:default="1" w:styleId="Normal"><w:name w:val="Normal"/></w:style><w:style w:type="paragraph" w:styleId="Title"><w:name w:val="Title"/><w:basedOn w:val="Normal"/><w:pPr><w:spacing w:after="240"/></w:pPr><w:rPr><w:b/><w:sz w:val="52"/></w:rPr></w:style><w:style w:type="paragraph" w:styleId="Heading1"><w:name w:val="heading 1"/><w:basedOn w:val="Normal"/><w:pPr><w:keepNext/><w:spacing w:before="360" w:after="120"/><w:outlineLvl w:val="0"/></w:pPr><w:rPr><w:b/><w:color w:val="1A365D"/><w:sz w:val="28"/></w:rPr></w:style><w:style w:type="paragraph" w:styleId="ListBullet"><w:name w:val="List Bullet"/><w:basedOn w:val="Normal"/><w:pPr><w:ind w:left="360" w:hanging="360"/></w:pPr></w:style></w:styles>"#;

/// Formatting of one text run.
#[derive(Default, Clone, Copy)]
struct RunStyle<'a> {
    bold: bool,
    /// Font size in half-points.
    size: Option<u32>,
    color: Option<&'a str>,
}

impl<'a> RunStyle<'a> {
    fn bold() -> Self {
        Self {
            bold: true,
            ..Self::default()
        }
    }

    fn sized(size: u32, color: &'a str) -> Self {
        Self {
            size: Some(size),
            color: Some(color),
            ..Self::default()
        }
    }
}

#[derive(Default, Clone, Copy)]
struct ParagraphStyle<'a> {
    style_id: Option<&'a str>,
    centered: bool,
}

/// Table row emphasis.
#[derive(Clone, Copy, PartialEq, Eq)]
enum RowKind {
    Header,
    Body,
    Highlight,
}

struct DocumentBody {
    xml: XmlBuilder,
}

impl DocumentBody {
    fn new() -> Result<Self, ReportError> {
        let mut xml = XmlBuilder::new()?;
        xml.open("w:document", &[("xmlns:w", W_NS)])?;
        xml.open("w:body", &[])?;
        Ok(Self { xml })
    }

    fn run(&mut self, text: &str, style: RunStyle<'_>) -> Result<(), ReportError> {
        self.xml.open("w:r", &[])?;
        if style.bold || style.size.is_some() || style.color.is_some() {
            self.xml.open("w:rPr", &[])?;
            if style.bold {
                self.xml.empty("w:b", &[])?;
            }
            if let Some(color) = style.color {
                self.xml.empty("w:color", &[("w:val", color)])?;
            }
            if let Some(size) = style.size {
                let size = size.to_string();
                self.xml.empty("w:sz", &[("w:val", size.as_str())])?;
                self.xml.empty("w:szCs", &[("w:val", size.as_str())])?;
            }
            self.xml.close("w:rPr")?;
        }
        self.xml.text("w:t", &[("xml:space", "preserve")], text)?;
        self.xml.close("w:r")
    }

    fn paragraph(
        &mut self,
        text: &str,
        paragraph: ParagraphStyle<'_>,
        run: RunStyle<'_>,
    ) -> Result<(), ReportError> {
        self.xml.open("w:p", &[])?;
        if paragraph.style_id.is_some() || paragraph.centered {
            self.xml.open("w:pPr", &[])?;
            if let Some(style_id) = paragraph.style_id {
                self.xml.empty("w:pStyle", &[("w:val", style_id)])?;
            }
            if paragraph.centered {
                self.xml.empty("w:jc", &[("w:val", "center")])?;
            }
            self.xml.close("w:pPr")?;
        }
        if !text.is_empty() {
            self.run(text, run)?;
        }
        self.xml.close("w:p")
    }

    fn plain(&mut self, text: &str) -> Result<(), ReportError> {
        self.paragraph(text, ParagraphStyle::default(), RunStyle::default())
    }

    fn spacer(&mut self) -> Result<(), ReportError> {
        self.plain("")
    }

    fn heading(&mut self, text: &str) -> Result<(), ReportError> {
        self.paragraph(
            text,
            ParagraphStyle {
                style_id: Some("Heading1"),
                centered: false,
            },
            RunStyle::default(),
        )
    }

    fn centered(&mut self, text: &str, run: RunStyle<'_>) -> Result<(), ReportError> {
        self.paragraph(
            text,
            ParagraphStyle {
                style_id: None,
                centered: true,
            },
            run,
        )
    }

    fn bullet(&mut self, text: &str) -> Result<(), ReportError> {
        self.paragraph(
            &format!("\u{2022}\t{}", text),
            ParagraphStyle {
                style_id: Some("ListBullet"),
                centered: false,
            },
            RunStyle::default(),
        )
    }

    fn table(&mut self, rows: &[(RowKind, Vec<String>)]) -> Result<(), ReportError> {
        let columns = rows.first().map_or(1, |(_, cells)| cells.len().max(1));
        let cell_width = (TABLE_WIDTH / columns as u32).to_string();

        self.xml.open("w:tbl", &[])?;
        self.xml.open("w:tblPr", &[])?;
        self.xml.empty("w:tblW", &[("w:w", "0"), ("w:type", "auto")])?;
        self.xml.empty("w:jc", &[("w:val", "center")])?;
        self.xml.open("w:tblBorders", &[])?;
        for side in ["w:top", "w:left", "w:bottom", "w:right", "w:insideH", "w:insideV"] {
            self.xml.empty(
                side,
                &[
                    ("w:val", "single"),
                    ("w:sz", "4"),
                    ("w:space", "0"),
                    ("w:color", "A0AEC0"),
                ],
            )?;
        }
        self.xml.close("w:tblBorders")?;
        self.xml.close("w:tblPr")?;

        self.xml.open("w:tblGrid", &[])?;
        for _ in 0..columns {
            self.xml.empty("w:gridCol", &[("w:w", cell_width.as_str())])?;
        }
        self.xml.close("w:tblGrid")?;

        for (kind, cells) in rows {
            self.xml.open("w:tr", &[])?;
            for (idx, cell) in cells.iter().enumerate() {
                self.xml.open("w:tc", &[])?;
                self.xml.open("w:tcPr", &[])?;
                self.xml
                    .empty("w:tcW", &[("w:w", cell_width.as_str()), ("w:type", "dxa")])?;
                if *kind == RowKind::Header {
                    self.xml.empty(
                        "w:shd",
                        &[("w:val", "clear"), ("w:color", "auto"), ("w:fill", "E2E8F0")],
                    )?;
                }
                self.xml.close("w:tcPr")?;
                let run = match kind {
                    RowKind::Header => RunStyle::bold(),
                    RowKind::Highlight if idx > 0 => RunStyle {
                        bold: true,
                        size: None,
                        color: Some(VALUE_COLOR),
                    },
                    RowKind::Highlight => RunStyle::bold(),
                    RowKind::Body => RunStyle::default(),
                };
                self.paragraph(cell, ParagraphStyle::default(), run)?;
                self.xml.close("w:tc")?;
            }
            self.xml.close("w:tr")?;
        }

        self.xml.close("w:tbl")
    }

    fn finish(mut self) -> Result<Vec<u8>, ReportError> {
        self.xml.open("w:sectPr", &[])?;
        self.xml
            .empty("w:pgSz", &[("w:w", "12240"), ("w:h", "15840")])?;
        self.xml.empty(
            "w:pgMar",
            &[
                ("w:top", "1440"),
                ("w:right", "1440"),
                ("w:bottom", "1440"),
                ("w:left", "1440"),
                ("w:header", "720"),
                ("w:footer", "720"),
                ("w:gutter", "0"),
            ],
        )?;
        self.xml.close("w:sectPr")?;
        self.xml.close("w:body")?;
        self.xml.close("w:document")?;
        Ok(self.xml.finish())
    }
}

fn header(cells: &[&str]) -> (RowKind, Vec<String>) {
    (RowKind::Header, cells.iter().map(|c| c.to_string()).collect())
}

fn body(label: &str, value: String) -> (RowKind, Vec<String>) {
    (RowKind::Body, vec![label.to_string(), value])
}

/// Builds `word/document.xml`.
pub fn document_xml(
    data: &ValuationData,
    company_name: &str,
    today: NaiveDate,
) -> Result<Vec<u8>, ReportError> {
    let mut doc = DocumentBody::new()?;

    // Title block
    doc.paragraph(
        "DCF Valuation Report",
        ParagraphStyle {
            style_id: Some("Title"),
            centered: true,
        },
        RunStyle {
            color: Some(TITLE_COLOR),
            ..RunStyle::default()
        },
    )?;
    let display_name = data.company_name.as_deref().unwrap_or(company_name);
    doc.centered(
        display_name,
        RunStyle {
            bold: true,
            size: Some(32),
            color: Some(SUBTITLE_COLOR),
        },
    )?;
    if let Some(ticker) = data.ticker.as_deref() {
        doc.centered(
            &format!(
                "Ticker: {} | {} | {}",
                ticker,
                data.industry.as_deref().unwrap_or(NOT_AVAILABLE),
                data.country.as_deref().unwrap_or(NOT_AVAILABLE)
            ),
            RunStyle::sized(20, MUTED_COLOR),
        )?;
    }
    let date = data
        .analysis_date
        .clone()
        .unwrap_or_else(|| today.format("%Y-%m-%d").to_string());
    doc.centered(
        &format!("Date of Analysis: {}", date),
        RunStyle::sized(20, MUTED_COLOR),
    )?;
    doc.spacer()?;

    doc.heading("1. Summary of Method")?;
    doc.plain(
        data.method_summary
            .as_deref()
            .unwrap_or(DEFAULT_METHOD_SUMMARY),
    )?;

    doc.heading("2. Key Assumptions")?;
    let a = &data.assumptions;
    doc.table(&[
        header(&["Parameter", "Value"]),
        body(
            "Revenue Growth Rates",
            a.revenue_growth_rates
                .clone()
                .unwrap_or_else(|| NOT_AVAILABLE.to_string()),
        ),
        body(
            "Margin Assumptions",
            a.margin_assumptions
                .clone()
                .unwrap_or_else(|| NOT_AVAILABLE.to_string()),
        ),
        body("WACC", fmt_pct(a.wacc, 2)),
        body("Terminal Growth Rate", fmt_pct(a.terminal_growth_rate, 2)),
        body(
            "Exit Multiple",
            match a.exit_multiple {
                Some(_) => format!("{}x", fmt_num(a.exit_multiple, 1, false)),
                None => NOT_AVAILABLE.to_string(),
            },
        ),
        body("Tax Rate", fmt_pct(a.tax_rate, 1)),
        body("Risk-Free Rate", fmt_pct(a.risk_free_rate, 2)),
        body("Beta", fmt_num(a.beta, 2, false)),
        body("Equity Risk Premium", fmt_pct(a.equity_risk_premium, 2)),
    ])?;

    doc.heading("3. 10-Year Forecast Overview")?;
    if data.forecast.is_empty() {
        doc.plain("Forecast data not available.")?;
    } else {
        let mut rows = vec![header(&[
            "Year",
            "Revenue ($M)",
            "EBIT ($M)",
            "FCFF ($M)",
            "PV of FCF ($M)",
        ])];
        rows.extend(data.forecast.iter().map(|year| {
            (
                RowKind::Body,
                vec![
                    year.year.map(|y| y.to_string()).unwrap_or_default(),
                    fmt_num(year.revenue, 1, true),
                    fmt_num(year.ebit, 1, true),
                    fmt_num(year.fcff, 1, true),
                    fmt_num(year.pv_fcf, 1, true),
                ],
            )
        }));
        doc.table(&rows)?;
    }

    doc.heading("4. Valuation Summary")?;
    doc.table(&[
        header(&["Metric", "Value"]),
        body("Terminal Value ($M)", fmt_num(data.terminal_value, 1, true)),
        body(
            "PV of Terminal Value ($M)",
            fmt_num(data.pv_terminal_value, 1, true),
        ),
        body(
            "Enterprise Value ($M)",
            fmt_num(data.enterprise_value, 1, true),
        ),
        body("Net Debt ($M)", fmt_num(data.net_debt, 1, true)),
        body("Equity Value ($M)", fmt_num(data.equity_value, 1, true)),
        body(
            "Shares Outstanding (M)",
            fmt_num(data.shares_outstanding, 2, true),
        ),
        (
            RowKind::Highlight,
            vec![
                "Intrinsic Value Per Share".to_string(),
                fmt_dollars(data.intrinsic_value_per_share),
            ],
        ),
    ])?;

    doc.heading("5. Sensitivity Analysis")?;
    if data.sensitivity.is_empty() {
        doc.plain("Sensitivity data not available.")?;
    } else {
        let mut rows = vec![header(&[
            "WACC (%)",
            "Terminal Growth (%)",
            "Value / Share ($)",
        ])];
        rows.extend(data.sensitivity.iter().map(|point| {
            (
                RowKind::Body,
                vec![
                    fmt_pct(point.wacc, 1),
                    fmt_pct(point.growth, 1),
                    fmt_dollars(point.value_per_share),
                ],
            )
        }));
        doc.table(&rows)?;
    }

    doc.heading("6. Key Risk Notes")?;
    if data.risk_notes.is_empty() {
        doc.plain("No specific risk notes flagged.")?;
    } else {
        for note in &data.risk_notes {
            doc.bullet(note)?;
        }
    }

    doc.heading("7. Validation Status")?;
    let status = data.validation_status.as_deref().unwrap_or(NOT_AVAILABLE);
    let status_color = if status.to_lowercase().contains("validated") {
        PASS_COLOR
    } else {
        FAIL_COLOR
    };
    doc.paragraph(
        &format!("Status: {}", status),
        ParagraphStyle::default(),
        RunStyle {
            bold: true,
            size: None,
            color: Some(status_color),
        },
    )?;
    for note in &data.validation_notes {
        doc.bullet(note)?;
    }

    doc.spacer()?;
    doc.centered(DISCLAIMER, RunStyle::sized(16, DISCLAIMER_COLOR))?;

    doc.finish()
}

/// Renders the complete `.docx` package.
pub fn render_docx(
    data: &ValuationData,
    company_name: &str,
    today: NaiveDate,
) -> Result<Vec<u8>, ReportError> {
    let document = document_xml(data, company_name, today)?;
    write_zip(&[
        ("[Content_Types].xml", CONTENT_TYPES.as_bytes()),
        ("_rels/.rels", ROOT_RELS.as_bytes()),
        ("word/_rels/document.xml.rels", DOCUMENT_RELS.as_bytes()),
        ("word/styles.xml", STYLES.as_bytes()),
        ("word/document.xml", &document),
    ])
}
