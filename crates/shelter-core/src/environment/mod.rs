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

//! City-wide environment readings shown next to the dust shelters.
//!
//! Covers the averaged air-quality report and the daily mosquito index. Both
//! arrive as rows of string-valued fields; numbers are coerced once here.

use chrono::NaiveDate;
use serde::Serialize;
use serde_json::Value;

use crate::places::number;

/// Air-quality grade as published by the city.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum AirQualityGrade {
    Good,
    Moderate,
    Bad,
    VeryBad,
    Unknown,
}

impl AirQualityGrade {
    #[must_use]
    pub fn from_label(label: &str) -> Self {
        match label.trim() {
            "좋음" => AirQualityGrade::Good,
            "보통" => AirQualityGrade::Moderate,
            "나쁨" => AirQualityGrade::Bad,
            "매우나쁨" => AirQualityGrade::VeryBad,
            _ => AirQualityGrade::Unknown,
        }
    }

    /// Badge colour for the grade.
    #[must_use]
    pub const fn color(self) -> &'static str {
        match self {
            AirQualityGrade::Good => "#4caf50",
            AirQualityGrade::Moderate => "#2196f3",
            AirQualityGrade::Bad => "#ff9800",
            AirQualityGrade::VeryBad => "#f44336",
            AirQualityGrade::Unknown => "#9e9e9e",
        }
    }
}

/// Averaged real-time air quality.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AirQualityReport {
    pub grade: AirQualityGrade,
    /// Integrated air-quality index.
    pub index: Option<f64>,
    /// Dominant pollutant, e.g. `"PM-2.5"`.
    pub pollutant: Option<String>,
    /// PM10 in µg/m³.
    pub pm10: Option<f64>,
    /// PM2.5 in µg/m³.
    pub pm25: Option<f64>,
}

impl AirQualityReport {
    /// Build from a `{GRADE, IDEX_MVL, POLLUTANT, PM10, PM25}` row.
    #[must_use]
    pub fn from_row(row: &Value) -> Option<Self> {
        let object = row.as_object()?;
        let text = |key: &str| {
            object
                .get(key)
                .and_then(Value::as_str)
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(ToString::to_string)
        };
        let num = |key: &str| object.get(key).and_then(number);

        Some(Self {
            grade: text("GRADE").map_or(AirQualityGrade::Unknown, |g| AirQualityGrade::from_label(&g)),
            index: num("IDEX_MVL"),
            pollutant: text("POLLUTANT"),
            pm10: num("PM10"),
            pm25: num("PM25"),
        })
    }
}

/// Daily mosquito activity index by environment.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MosquitoIndex {
    pub date: Option<NaiveDate>,
    pub water: f64,
    pub house: f64,
    pub park: f64,
}

impl MosquitoIndex {
    /// Build from a `{MOSQUITO_DATE, MOSQUITO_VALUE_WATER, _HOUSE, _PARK}` row.
    /// Missing values read as `0`.
    #[must_use]
    pub fn from_row(row: &Value) -> Option<Self> {
        let object = row.as_object()?;
        let num = |key: &str| object.get(key).and_then(number).unwrap_or(0.0);
        let date = object
            .get("MOSQUITO_DATE")
            .and_then(Value::as_str)
            .and_then(|s| NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").ok());

        Some(Self {
            date,
            water: num("MOSQUITO_VALUE_WATER"),
            house: num("MOSQUITO_VALUE_HOUSE"),
            park: num("MOSQUITO_VALUE_PARK"),
        })
    }
}

/// Date parameter for the mosquito service: the day before `today`, since
/// the current day's index is published late.
#[must_use]
pub fn mosquito_date_param(today: NaiveDate) -> String {
    today
        .pred_opt()
        .unwrap_or(today)
        .format("%Y-%m-%d")
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_air_quality_row() {
        let row = json!({
            "GRADE": "나쁨",
            "IDEX_MVL": "112",
            "POLLUTANT": "PM-2.5",
            "PM10": "68",
            "PM25": "41"
        });
        let report = AirQualityReport::from_row(&row).unwrap();
        assert_eq!(report.grade, AirQualityGrade::Bad);
        assert_eq!(report.grade.color(), "#ff9800");
        assert_eq!(report.index, Some(112.0));
        assert_eq!(report.pm25, Some(41.0));
        assert_eq!(report.pollutant.as_deref(), Some("PM-2.5"));
    }

    #[test]
    fn test_air_quality_missing_fields() {
        let report = AirQualityReport::from_row(&json!({ "PM10": "" })).unwrap();
        assert_eq!(report.grade, AirQualityGrade::Unknown);
        assert_eq!(report.pm10, None);
        assert!(AirQualityReport::from_row(&json!(null)).is_none());
    }

    #[test]
    fn test_mosquito_row() {
        let row = json!({
            "MOSQUITO_DATE": "2025-05-04",
            "MOSQUITO_VALUE_WATER": "23.5",
            "MOSQUITO_VALUE_HOUSE": "11",
        });
        let index = MosquitoIndex::from_row(&row).unwrap();
        assert_eq!(index.date, NaiveDate::from_ymd_opt(2025, 5, 4));
        assert!((index.water - 23.5).abs() < f64::EPSILON);
        assert!(index.park.abs() < f64::EPSILON);
    }

    #[test]
    fn test_mosquito_date_param_crosses_month() {
        let today = NaiveDate::from_ymd_opt(2025, 3, 1).unwrap();
        assert_eq!(mosquito_date_param(today), "2025-02-28");
    }
}
