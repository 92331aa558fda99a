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

//! CSV dataset loading.
//!
//! Rows are read as string maps keyed by the header line and handed to the
//! normalizer like any JSON record, so the same field mapping applies.

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use log::info;
use serde_json::{Map, Value};

use super::FetchError;

/// Load a CSV file as JSON records.
pub fn read_csv_records(path: &Path) -> Result<Vec<Value>, FetchError> {
    let file = File::open(path).map_err(|source| FetchError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let records = records_from_reader(BufReader::new(file))?;
    info!("Loaded {} rows from {}", records.len(), path.display());
    Ok(records)
}

fn records_from_reader<R: Read>(reader: R) -> Result<Vec<Value>, FetchError> {
    let mut csv_reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
    let headers = csv_reader.headers()?.clone();

    let mut records = Vec::new();
    for result in csv_reader.records() {
        let row = result?;
        let object: Map<String, Value> = headers
            .iter()
            .zip(row.iter())
            .map(|(key, value)| (key.to_string(), Value::String(value.to_string())))
            .collect();
        records.push(Value::Object(object));
    }
    Ok(records)
}
