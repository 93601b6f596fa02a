//! Conversion of free-form agent output into a structured valuation document.

pub mod llm;
pub mod schema;

use async_trait::async_trait;
use thiserror::Error;
use tracing::warn;

use crate::jobs::StageResult;

pub use schema::{Assumptions, ForecastYear, SensitivityPoint, ValuationData};

/// Number of yearly records the forecast is expected to contain.
pub const FORECAST_YEARS: usize = 10;

#[derive(Error, Debug)]
pub enum ExtractionError {
    #[error("Extraction request failed: {0}")]
    Agent(#[from] crate::agents::AgentError),

    #[error("Extraction returned malformed JSON: {0}")]
    MalformedJson(#[source] serde_json::Error),

    #[error("Extraction returned JSON that is not an object")]
    NotAnObject,

    #[error("Extraction returned an unexpected document shape: {0}")]
    Schema(#[source] serde_json::Error),
}

/// Turns the combined stage outputs into a valuation document.
#[async_trait]
pub trait StructuredExtractor: Send + Sync {
    async fn extract(
        &self,
        company_name: &str,
        stage_results: &[StageResult],
    ) -> Result<ValuationData, ExtractionError>;
}

pub const EXTRACTION_PROMPT: &str = r#"You are a financial data extraction specialist.
You receive the complete output of a four-agent DCF analysis. Extract ALL numerical
and textual data into the exact JSON structure below.

RULES:
- Monetary values are numbers (not strings), in millions USD unless stated otherwise.
- Percentages are plain numbers (12.5 for 12.5%, NOT 0.125).
- Use null for values that are truly missing.
- The forecast array must contain exactly 10 years.
- Do NOT invent data. Extract only what is present in the agent outputs.
- Return ONLY valid JSON.

Required JSON structure:
{
  "company_name": "string",
  "ticker": "string or null",
  "country": "string",
  "industry": "string",
  "analysis_date": "YYYY-MM-DD",
  "method_summary": "string - 2-3 sentence professional DCF explanation",
  "assumptions": {
    "revenue_growth_rates": "string describing growth rate assumptions",
    "margin_assumptions": "string describing margin assumptions",
    "wacc": number,
    "terminal_growth_rate": number,
    "exit_multiple": number or null,
    "tax_rate": number,
    "risk_free_rate": number,
    "beta": number,
    "equity_risk_premium": number
  },
  "forecast": [
    {
      "year": number,
      "revenue": number,
      "revenue_growth_pct": number,
      "ebit_margin_pct": number,
      "ebit": number,
      "tax_rate": number,
      "nopat": number,
      "depreciation_amortization": number,
      "capex": number,
      "change_nwc": number,
      "fcff": number,
      "discount_factor": number,
      "pv_fcf": number
    }
  ],
  "terminal_value": number,
  "pv_terminal_value": number,
  "enterprise_value": number,
  "net_debt": number,
  "equity_value": number,
  "shares_outstanding": number,
  "intrinsic_value_per_share": number,
  "sensitivity": [
    {"wacc": number, "growth": number, "value_per_share": number}
  ],
  "risk_notes": ["string"],
  "validation_status": "Validated / Adjusted & Validated / Rejected",
  "validation_notes": ["string"]
}"#;

/// Joins stage outputs as `=== AGENT n: name ===` blocks separated by blank lines.
pub fn combine_stage_outputs(stage_results: &[StageResult]) -> String {
    stage_results
        .iter()
        .map(|r| format!("=== AGENT {}: {} ===\n{}", r.stage_index, r.stage_name, r.text))
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// User message sent alongside [`EXTRACTION_PROMPT`].
pub fn extraction_user_message(company_name: &str, stage_results: &[StageResult]) -> String {
    format!(
        "Company analyzed: {}\n\nFull agent outputs:\n{}",
        company_name,
        combine_stage_outputs(stage_results)
    )
}

/// Parses extractor output into a [`ValuationData`].
///
/// The content must be a JSON object. A forecast that is not exactly
/// [`FORECAST_YEARS`] long is accepted with a warning.
pub fn parse_valuation(content: &str) -> Result<ValuationData, ExtractionError> {
    let value: serde_json::Value =
        serde_json::from_str(content.trim()).map_err(ExtractionError::MalformedJson)?;
    if !value.is_object() {
        return Err(ExtractionError::NotAnObject);
    }

    let data: ValuationData = serde_json::from_value(value).map_err(ExtractionError::Schema)?;
    if data.forecast.len() != FORECAST_YEARS {
        warn!(
            years = data.forecast.len(),
            "extracted forecast does not cover {} years", FORECAST_YEARS
        );
    }
    Ok(data)
}
