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

//! Place categories and record normalization.
//!
//! Every data source hands back loosely-typed JSON records whose field names
//! differ per provider. This module turns those into one normalized
//! [`CategoryPlace`] type at the store boundary, so field coercion happens
//! exactly once instead of in every consumer.

use std::fmt;

use log::warn;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

use crate::geo::GeoPoint;

/// One class of point of interest shown on the map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    /// Cold-wave shelter.
    Cold,
    /// Heat-wave shelter.
    Hot,
    /// Earthquake outdoor evacuation site.
    Earthquake,
    /// Fine-dust shelter.
    Dust,
    /// Automated external defibrillator.
    Aed,
}

impl Category {
    /// Number of categories.
    pub const COUNT: usize = 5;

    /// All categories in display order.
    pub const ALL: [Category; Category::COUNT] = [
        Category::Cold,
        Category::Hot,
        Category::Earthquake,
        Category::Dust,
        Category::Aed,
    ];

    /// Stable index into per-category arrays.
    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Category::Cold => 0,
            Category::Hot => 1,
            Category::Earthquake => 2,
            Category::Dust => 3,
            Category::Aed => 4,
        }
    }

    /// Display label used for list rows and toggle buttons.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Category::Cold => "한파 대피소",
            Category::Hot => "무더위 쉼터",
            Category::Earthquake => "지진 대피소",
            Category::Dust => "미세먼지 대피소",
            Category::Aed => "AED",
        }
    }

    /// Marker icon asset key.
    #[must_use]
    pub const fn icon(self) -> &'static str {
        match self {
            Category::Cold => "marker-cold",
            Category::Hot => "marker-hot",
            Category::Earthquake => "marker-earthquake",
            Category::Dust => "marker-dust",
            Category::Aed => "marker-aed",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Category::Cold => "cold",
            Category::Hot => "hot",
            Category::Earthquake => "earthquake",
            Category::Dust => "dust",
            Category::Aed => "aed",
        };
        f.write_str(name)
    }
}

/// Compact set of categories, used to detect filter-configuration changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub struct CategorySet(u8);

impl CategorySet {
    #[must_use]
    pub const fn empty() -> Self {
        Self(0)
    }

    #[must_use]
    pub fn all() -> Self {
        Category::ALL.iter().copied().collect()
    }

    pub fn insert(&mut self, category: Category) {
        self.0 |= 1 << category.index();
    }

    pub fn remove(&mut self, category: Category) {
        self.0 &= !(1 << category.index());
    }

    #[must_use]
    pub const fn contains(&self, category: Category) -> bool {
        self.0 & (1 << category.index()) != 0
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.0 == 0
    }

    /// Categories in display order.
    pub fn iter(&self) -> impl Iterator<Item = Category> + '_ {
        Category::ALL.into_iter().filter(|c| self.contains(*c))
    }
}

impl FromIterator<Category> for CategorySet {
    fn from_iter<I: IntoIterator<Item = Category>>(iter: I) -> Self {
        let mut set = Self::empty();
        for category in iter {
            set.insert(category);
        }
        set
    }
}

/// A normalized point of interest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryPlace {
    /// Provider identifier, when the source has one. Used for dedup.
    pub id: Option<String>,
    pub name: String,
    pub address: String,
    pub location: GeoPoint,
    pub category: Category,
}

impl CategoryPlace {
    #[must_use]
    pub fn new(
        category: Category,
        name: impl Into<String>,
        address: impl Into<String>,
        location: GeoPoint,
    ) -> Self {
        Self {
            id: None,
            name: name.into(),
            address: address.into(),
            location,
            category,
        }
    }

    /// Builder method to attach a provider id.
    #[must_use]
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }
}

/// Errors that can occur while normalizing a record.
#[derive(Debug, Error, PartialEq)]
pub enum RecordError {
    #[error("record is not an object")]
    NotAnObject,

    #[error("missing or malformed coordinate field: {0}")]
    MalformedCoordinate(&'static str),
}

/// What to do with records whose coordinates are missing or unparseable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CoordinatePolicy {
    /// Substitute `0.0`, matching what the providers' own apps do.
    #[default]
    Coerce,
    /// Drop the record.
    Reject,
}

/// Candidate JSON keys for each normalized field; the first key present wins.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldMap {
    #[serde(default = "default_id_keys")]
    pub id: Vec<String>,
    #[serde(default = "default_name_keys")]
    pub name: Vec<String>,
    #[serde(default = "default_address_keys")]
    pub address: Vec<String>,
    #[serde(default = "default_latitude_keys")]
    pub latitude: Vec<String>,
    #[serde(default = "default_longitude_keys")]
    pub longitude: Vec<String>,
}

fn keys(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| (*s).to_string()).collect()
}

fn default_id_keys() -> Vec<String> {
    keys(&["id", "R_SEQ_NO", "SN"])
}

fn default_name_keys() -> Vec<String> {
    keys(&["name", "R_AREA_NM", "FACIL_NM", "buildPlace"])
}

fn default_address_keys() -> Vec<String> {
    keys(&["address", "R_DETL_ADD", "DTL_ADRES", "buildAddress"])
}

fn default_latitude_keys() -> Vec<String> {
    keys(&["latitude", "lat", "LA", "wgs84Lat", "YCORD"])
}

fn default_longitude_keys() -> Vec<String> {
    keys(&["longitude", "lon", "lng", "LO", "wgs84Lon", "XCORD"])
}

impl Default for FieldMap {
    fn default() -> Self {
        Self {
            id: default_id_keys(),
            name: default_name_keys(),
            address: default_address_keys(),
            latitude: default_latitude_keys(),
            longitude: default_longitude_keys(),
        }
    }
}

/// Converts raw provider records into [`CategoryPlace`] values.
#[derive(Debug, Clone)]
pub struct PlaceNormalizer {
    category: Category,
    fields: FieldMap,
    policy: CoordinatePolicy,
}

impl PlaceNormalizer {
    #[must_use]
    pub fn new(category: Category, fields: FieldMap, policy: CoordinatePolicy) -> Self {
        Self {
            category,
            fields,
            policy,
        }
    }

    #[must_use]
    pub fn category(&self) -> Category {
        self.category
    }

    /// Normalize a single record.
    pub fn normalize(&self, record: &Value) -> Result<CategoryPlace, RecordError> {
        let object = record.as_object().ok_or(RecordError::NotAnObject)?;

        let latitude = self.coordinate(lookup(object, &self.fields.latitude), "latitude")?;
        let longitude = self.coordinate(lookup(object, &self.fields.longitude), "longitude")?;

        Ok(CategoryPlace {
            id: lookup(object, &self.fields.id).and_then(text),
            name: lookup(object, &self.fields.name)
                .and_then(text)
                .unwrap_or_default(),
            address: lookup(object, &self.fields.address)
                .and_then(text)
                .unwrap_or_default(),
            location: GeoPoint::new(latitude, longitude),
            category: self.category,
        })
    }

    /// Normalize a batch, logging and skipping records that fail.
    #[must_use]
    pub fn normalize_all(&self, records: &[Value]) -> Vec<CategoryPlace> {
        let mut places = Vec::with_capacity(records.len());
        let mut rejected = 0usize;
        for record in records {
            match self.normalize(record) {
                Ok(place) => places.push(place),
                Err(_) => rejected += 1,
            }
        }
        if rejected > 0 {
            warn!(
                "Skipped {} malformed {} records ({} kept)",
                rejected,
                self.category,
                places.len()
            );
        }
        places
    }

    fn coordinate(&self, value: Option<&Value>, field: &'static str) -> Result<f64, RecordError> {
        match (value.and_then(number), self.policy) {
            (Some(v), _) => Ok(v),
            (None, CoordinatePolicy::Coerce) => Ok(0.0),
            (None, CoordinatePolicy::Reject) => Err(RecordError::MalformedCoordinate(field)),
        }
    }
}

fn lookup<'a>(object: &'a Map<String, Value>, candidates: &[String]) -> Option<&'a Value> {
    candidates.iter().find_map(|key| object.get(key))
}

/// Read a finite number from a JSON number or numeric string.
pub(crate) fn number(value: &Value) -> Option<f64> {
    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    parsed.filter(|v| v.is_finite())
}

fn text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
