//! Typed form of the structured valuation document.
//!
//! Every field is optional. Model output is loosely typed in practice, so
//! numbers are accepted as JSON numbers, numeric strings (`"12.5"`, `"12.5%"`,
//! `"1,234"`) or null, and string lists tolerate scalars.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ValuationData {
    #[serde(default, deserialize_with = "lenient_string")]
    pub company_name: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub ticker: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub country: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub industry: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub analysis_date: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub method_summary: Option<String>,
    #[serde(default)]
    pub assumptions: Assumptions,
    #[serde(default, deserialize_with = "lenient_list")]
    pub forecast: Vec<ForecastYear>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub terminal_value: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub pv_terminal_value: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub enterprise_value: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub net_debt: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub equity_value: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub shares_outstanding: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub intrinsic_value_per_share: Option<f64>,
    #[serde(default, deserialize_with = "lenient_list")]
    pub sensitivity: Vec<SensitivityPoint>,
    #[serde(default, deserialize_with = "lenient_strings")]
    pub risk_notes: Vec<String>,
    /// One of `Validated`, `Adjusted & Validated`, `Rejected`.
    #[serde(default, deserialize_with = "lenient_string")]
    pub validation_status: Option<String>,
    #[serde(default, deserialize_with = "lenient_strings")]
    pub validation_notes: Vec<String>,
}

/// Model inputs. Percentages are plain numbers (12.5 means 12.5%).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Assumptions {
    #[serde(default, deserialize_with = "lenient_string")]
    pub revenue_growth_rates: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub margin_assumptions: Option<String>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub wacc: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub terminal_growth_rate: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub exit_multiple: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub tax_rate: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub risk_free_rate: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub beta: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub equity_risk_premium: Option<f64>,
}

/// One forecast year. Money in millions USD, percentages as plain numbers.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ForecastYear {
    #[serde(default, deserialize_with = "lenient_year")]
    pub year: Option<i64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub revenue: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub revenue_growth_pct: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub ebit_margin_pct: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub ebit: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub tax_rate: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub nopat: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub depreciation_amortization: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub capex: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub change_nwc: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub fcff: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub discount_factor: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub pv_fcf: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SensitivityPoint {
    #[serde(default, deserialize_with = "lenient_f64")]
    pub wacc: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub growth: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub value_per_share: Option<f64>,
}

// ─── Lenient field parsers ──────────────────────────────────────────────────

pub(crate) fn number_from_value(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s
            .trim()
            .trim_end_matches('%')
            .replace([',', '$'], "")
            .trim()
            .parse()
            .ok(),
        _ => None,
    }
}

fn lenient_f64<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<f64>, D::Error> {
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(number_from_value))
}

fn lenient_year<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<i64>, D::Error> {
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value
        .as_ref()
        .and_then(number_from_value)
        .map(|year| year.round() as i64))
}

fn scalar_to_string(value: Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s),
        other => Some(other.to_string()),
    }
}

fn lenient_string<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<String>, D::Error> {
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value
        .and_then(scalar_to_string)
        .filter(|s| !s.trim().is_empty()))
}

fn lenient_strings<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<String>, D::Error> {
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::Array(items)) => items.into_iter().filter_map(scalar_to_string).collect(),
        Some(other) => scalar_to_string(other).into_iter().collect(),
        None => Vec::new(),
    })
}

/// Accepts an array of records; null or a non-array value yields an empty list.
fn lenient_list<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: serde::de::DeserializeOwned,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    match value {
        Some(Value::Array(items)) => items
            .into_iter()
            .filter(Value::is_object)
            .map(|item| {
                serde_json::from_value(item).map_err(<D::Error as serde::de::Error>::custom)
            })
            .collect(),
        _ => Ok(Vec::new()),
    }
}
