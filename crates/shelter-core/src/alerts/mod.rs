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

//! Emergency alert messages and their filter.

use serde::{Deserialize, Serialize};

/// Label meaning "every kind" in the kind picker.
pub const ALL_KINDS_LABEL: &str = "전체";

/// Hazard type of an emergency text alert.
///
/// Serialized as its Korean label; unknown labels deserialize as `Other`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum AlertKind {
    HeavyRain,
    Earthquake,
    StrongWind,
    Wildfire,
    Fire,
    Typhoon,
    Other,
}

impl From<String> for AlertKind {
    fn from(label: String) -> Self {
        Self::from_label(&label)
    }
}

impl From<AlertKind> for String {
    fn from(kind: AlertKind) -> Self {
        kind.label().to_string()
    }
}

impl AlertKind {
    /// Kinds in picker order.
    pub const ALL: [AlertKind; 7] = [
        AlertKind::HeavyRain,
        AlertKind::Earthquake,
        AlertKind::StrongWind,
        AlertKind::Wildfire,
        AlertKind::Fire,
        AlertKind::Typhoon,
        AlertKind::Other,
    ];

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            AlertKind::HeavyRain => "호우",
            AlertKind::Earthquake => "지진",
            AlertKind::StrongWind => "강풍",
            AlertKind::Wildfire => "산불",
            AlertKind::Fire => "화재",
            AlertKind::Typhoon => "태풍",
            AlertKind::Other => "기타",
        }
    }

    /// Parse a picker label. Unknown labels map to [`AlertKind::Other`].
    #[must_use]
    pub fn from_label(label: &str) -> Self {
        Self::ALL
            .into_iter()
            .find(|k| k.label() == label.trim())
            .unwrap_or(AlertKind::Other)
    }
}

/// One emergency text alert.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmergencyMessage {
    pub id: String,
    pub content: String,
    pub region: String,
    #[serde(rename = "type")]
    pub kind: AlertKind,
}

/// Kind selection plus free-text search over message content.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AlertFilter {
    /// `None` matches every kind.
    pub kind: Option<AlertKind>,
    pub search: String,
}

impl AlertFilter {
    /// Build from the picker label (`"전체"` = all kinds) and a search term.
    #[must_use]
    pub fn from_picker(label: &str, search: impl Into<String>) -> Self {
        let kind = (label.trim() != ALL_KINDS_LABEL).then(|| AlertKind::from_label(label));
        Self {
            kind,
            search: search.into(),
        }
    }

    #[must_use]
    pub fn matches(&self, message: &EmergencyMessage) -> bool {
        self.kind.map_or(true, |k| k == message.kind) && message.content.contains(self.search.as_str())
    }

    /// Messages passing the filter, in original order.
    #[must_use]
    pub fn apply<'a>(&self, messages: &'a [EmergencyMessage]) -> Vec<&'a EmergencyMessage> {
        messages.iter().filter(|m| self.matches(m)).collect()
    }
}
