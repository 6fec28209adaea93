//! Wire shapes of the upstream JSON APIs. Only the fields we read are modelled.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Deserialize)]
pub struct FredObservationsResponse {
    #[serde(default)]
    pub observations: Vec<FredObservation>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FredObservation {
    pub date: String,
    /// Numeric text, or "." for a missing data point.
    pub value: String,
}

/// ECB SDMX-JSON (`format=jsondata`).
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SdmxResponse {
    #[serde(default)]
    pub data_sets: Vec<SdmxDataSet>,
    #[serde(default)]
    pub structure: Option<SdmxStructure>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SdmxDataSet {
    #[serde(default)]
    pub series: BTreeMap<String, SdmxSeries>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SdmxSeries {
    /// Observation index -> `[value, ...attributes]`.
    #[serde(default)]
    pub observations: BTreeMap<String, Vec<Option<serde_json::Value>>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SdmxStructure {
    #[serde(default)]
    pub dimensions: SdmxDimensions,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SdmxDimensions {
    #[serde(default)]
    pub observation: Vec<SdmxDimension>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SdmxDimension {
    pub id: String,
    #[serde(default)]
    pub values: Vec<SdmxDimensionValue>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SdmxDimensionValue {
    pub id: String,
}

/// Bank of Canada Valet: `{"observations": [{"d": "2025-01-29", "V39079": {"v": "3.00"}}]}`.
#[derive(Debug, Clone, Deserialize)]
pub struct ValetResponse {
    #[serde(default)]
    pub observations: Vec<BTreeMap<String, serde_json::Value>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PmiResponse {
    pub currency: String,
    #[serde(default)]
    pub manufacturing: Option<PmiSeries>,
    #[serde(default)]
    pub services: Option<PmiSeries>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PmiSeries {
    pub value: f64,
    #[serde(default)]
    pub previous: Option<f64>,
    #[serde(default)]
    pub date: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResponse {
    #[serde(default)]
    pub results: Vec<SearchHit>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchHit {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub snippet: String,
    #[serde(default)]
    pub url: String,
}

/// CFTC Socrata row. Socrata serializes numbers as strings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CftcRow {
    pub report_date_as_yyyy_mm_dd: String,
    #[serde(default)]
    pub noncomm_positions_long_all: Option<String>,
    #[serde(default)]
    pub noncomm_positions_short_all: Option<String>,
    #[serde(default)]
    pub open_interest_all: Option<String>,
}
