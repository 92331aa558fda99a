// Copyright 2025 Chris Custine
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Category data sources.
//!
//! A source is either an HTTP endpoint returning JSON records or a local CSV
//! file. Both produce raw JSON records that are normalized once by
//! [`PlaceNormalizer`]. Failures are reported per category and never retried.

mod csv_source;

pub use csv_source::read_csv_records;

use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use log::{debug, info};
use serde_json::Value;
use shelter_core::environment::{mosquito_date_param, AirQualityReport, MosquitoIndex};
use shelter_core::{Category, CategoryPlace, CoordinatePolicy, PlaceNormalizer};
use thiserror::Error;

use crate::config::DataSourceConfig;

/// Errors raised while fetching a category dataset.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Invalid JSON payload: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid CSV data: {0}")]
    Csv(#[from] csv::Error),

    #[error("Cannot read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Payload has no record array")]
    NoRecords,

    #[error("No usable source configured for {0}")]
    NoSource(Category),
}

/// Pull the record array out of a payload.
///
/// Accepts a bare array, or the open-data envelope
/// `{"<Service>": {"row": [...]}}`, or `{"data": [...]}`.
pub fn extract_rows(payload: Value) -> Result<Vec<Value>, FetchError> {
    match payload {
        Value::Array(rows) => Ok(rows),
        Value::Object(mut object) => {
            if let Some(Value::Array(rows)) = object.remove("data") {
                return Ok(rows);
            }
            object
                .into_iter()
                .find_map(|(_, service)| match service {
                    Value::Object(mut inner) => match inner.remove("row") {
                        Some(Value::Array(rows)) => Some(rows),
                        _ => None,
                    },
                    _ => None,
                })
                .ok_or(FetchError::NoRecords)
        }
        _ => Err(FetchError::NoRecords),
    }
}

/// GET a JSON payload and return its records.
pub async fn fetch_json_rows(client: &reqwest::Client, url: &str) -> Result<Vec<Value>, FetchError> {
    debug!("GET {}", redact(url));
    let payload: Value = client.get(url).send().await?.error_for_status()?.json().await?;
    extract_rows(payload)
}

/// Fetch the averaged air-quality report.
pub async fn fetch_air_quality(client: &reqwest::Client, url: &str) -> Result<AirQualityReport, FetchError> {
    fetch_json_rows(client, url)
        .await?
        .first()
        .and_then(AirQualityReport::from_row)
        .ok_or(FetchError::NoRecords)
}

/// Fetch yesterday's mosquito index. `{date}` in the template is filled in.
pub async fn fetch_mosquito_index(
    client: &reqwest::Client,
    url_template: &str,
    today: NaiveDate,
) -> Result<MosquitoIndex, FetchError> {
    let url = url_template.replace("{date}", &mosquito_date_param(today));
    fetch_json_rows(client, &url)
        .await?
        .first()
        .and_then(MosquitoIndex::from_row)
        .ok_or(FetchError::NoRecords)
}

/// Fetches one category's dataset from its configured source.
#[derive(Debug, Clone)]
pub struct CategorySource {
    config: DataSourceConfig,
    normalizer: PlaceNormalizer,
    csv_path: Option<PathBuf>,
}

impl CategorySource {
    pub fn new(config: DataSourceConfig, data_dir: &Path, policy: CoordinatePolicy) -> Self {
        let normalizer = PlaceNormalizer::new(config.category, config.fields.clone(), policy);
        let csv_path = config.csv_file.as_ref().map(|file| data_dir.join(file));
        Self {
            config,
            normalizer,
            csv_path,
        }
    }

    pub fn category(&self) -> Category {
        self.config.category
    }

    /// Load the dataset: HTTP when a URL is usable and `online`, CSV otherwise.
    pub async fn load(
        &self,
        client: &reqwest::Client,
        api_key: Option<&str>,
        online: bool,
    ) -> Result<Vec<CategoryPlace>, FetchError> {
        let url = online.then(|| self.config.resolved_url(api_key)).flatten();
        let records = match (url, &self.csv_path) {
            (Some(url), _) => fetch_json_rows(client, &url).await?,
            (None, Some(path)) => read_csv_records(path)?,
            (None, None) => return Err(FetchError::NoSource(self.category())),
        };

        let places = self.normalizer.normalize_all(&records);
        info!("{}: {} records, {} places", self.category(), records.len(), places.len());
        Ok(places)
    }
}

/// Strip the API key path segment before logging a Seoul open-data URL.
fn redact(url: &str) -> String {
    let Some((scheme, rest)) = url.split_once("://") else {
        return url.to_string();
    };
    let mut parts: Vec<&str> = rest.split('/').collect();
    if parts.len() > 2 && parts[2] == "json" {
        parts[1] = "***";
    }
    format!("{scheme}://{}", parts.join("/"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_extract_bare_array() {
        let rows = extract_rows(json!([{ "name": "a" }, { "name": "b" }])).unwrap();
        assert_eq!(rows.len(), 2);
    }

    #[test]
    fn test_extract_service_envelope() {
        let payload = json!({
            "TbGtnHwcwP": {
                "list_total_count": 2,
                "RESULT": { "CODE": "INFO-000" },
                "row": [{ "R_AREA_NM": "경로당" }, { "R_AREA_NM": "주민센터" }]
            }
        });
        let rows = extract_rows(payload).unwrap();
        assert_eq!(rows[1]["R_AREA_NM"], "주민센터");
    }

    #[test]
    fn test_extract_data_envelope() {
        let rows = extract_rows(json!({ "data": [{ "id": 1 }] })).unwrap();
        assert_eq!(rows.len(), 1);
    }

    #[test]
    fn test_extract_rejects_other_shapes() {
        assert!(matches!(extract_rows(json!({ "RESULT": { "CODE": "ERROR-500" } })), Err(FetchError::NoRecords)));
        assert!(matches!(extract_rows(json!("oops")), Err(FetchError::NoRecords)));
    }

    #[test]
    fn test_redact_api_key() {
        assert_eq!(
            redact("http://openapi.seoul.go.kr:8088/SECRET/json/MosquitoStatus/1/5/2025-05-04"),
            "http://openapi.seoul.go.kr:8088/***/json/MosquitoStatus/1/5/2025-05-04"
        );
        assert_eq!(redact("https://example.org/aed.json"), "https://example.org/aed.json");
    }

    #[tokio::test]
    async fn test_missing_source_is_error() {
        let config = DataSourceConfig {
            category: Category::Aed,
            url: None,
            csv_file: None,
            fields: shelter_core::FieldMap::default(),
            enabled: true,
        };
        let source = CategorySource::new(config, Path::new("."), CoordinatePolicy::Coerce);
        let result = source.load(&reqwest::Client::new(), None, true).await;
        assert!(matches!(result, Err(FetchError::NoSource(Category::Aed))));
    }
}
