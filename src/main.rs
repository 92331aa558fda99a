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

//! Headless shelter map screen.
//!
//! Loads the category datasets, replays a session script against the screen
//! engine and prints the resulting render snapshots as JSON.

mod config;
mod runtime;
mod script;
mod sources;

use std::error::Error;
use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use log::{info, warn};
use shelter_core::alerts::{AlertFilter, EmergencyMessage, ALL_KINDS_LABEL};
use shelter_core::{ScreenEvent, ScreenOrchestrator};

use crate::config::{AppConfig, API_KEY_ENV, API_KEY_PLACEHOLDER};
use crate::runtime::{RuntimeConfig, ScreenRuntime};
use crate::script::{load_script, replay, LabelledSnapshot};
use crate::sources::{fetch_air_quality, fetch_mosquito_index, CategorySource};

#[derive(Parser, Debug)]
#[command(name = "shelter-map", version, about = "Headless disaster-shelter map screen")]
struct Args {
    /// Session script (JSON step list) to replay
    #[arg(long)]
    script: Option<PathBuf>,

    /// Directory holding the category CSV files
    #[arg(long)]
    csv_dir: Option<PathBuf>,

    /// Initial camera latitude
    #[arg(long, requires = "longitude", allow_hyphen_values = true)]
    latitude: Option<f64>,

    /// Initial camera longitude
    #[arg(long, requires = "latitude", allow_hyphen_values = true)]
    longitude: Option<f64>,

    /// Print the config file path and exit
    #[arg(long)]
    print_config_path: bool,

    /// Skip HTTP sources and read CSV files only
    #[arg(long)]
    offline: bool,

    /// Write the effective configuration back to disk
    #[arg(long)]
    save_config: bool,

    /// Time given to the initial fetches before the script starts, in ms
    #[arg(long, default_value_t = 2000)]
    startup_wait_ms: u64,

    /// Emergency messages (JSON array) to filter and print
    #[arg(long)]
    alerts: Option<PathBuf>,

    /// Alert kind label, e.g. "호우"
    #[arg(long, default_value = ALL_KINDS_LABEL)]
    alert_kind: String,

    /// Search term matched against alert content
    #[arg(long, default_value = "")]
    alert_search: String,
}

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    if args.print_config_path {
        println!("{}", AppConfig::get_config_path()?.display());
        return Ok(());
    }

    let mut config = match AppConfig::load() {
        Ok(config) => config,
        Err(e) => {
            warn!("Failed to load config, using defaults: {}", e);
            AppConfig::default()
        }
    };
    if let Some(dir) = &args.csv_dir {
        config.data_dir = Some(dir.clone());
    }
    if let (Some(latitude), Some(longitude)) = (args.latitude, args.longitude) {
        config.initial_latitude = latitude;
        config.initial_longitude = longitude;
    }
    if args.save_config {
        config.save()?;
        info!("Saved configuration to {}", AppConfig::get_config_path()?.display());
    }

    if let Some(path) = &args.alerts {
        return print_alerts(path, &args.alert_kind, &args.alert_search);
    }

    let rt = tokio::runtime::Builder::new_current_thread().enable_all().build()?;
    rt.block_on(run(&config, &args))
}

async fn run(config: &AppConfig, args: &Args) -> Result<(), Box<dyn Error>> {
    let api_key = config.resolve_api_key();
    let online = !args.offline;
    if online && api_key.is_none() {
        warn!("No API key in {} or config, key-protected sources are skipped", API_KEY_ENV);
    }

    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(15))
        .build()?;

    let mut runtime = ScreenRuntime::new(
        ScreenOrchestrator::new(config.screen_config()),
        RuntimeConfig {
            page_load_latency: config.page_load_latency(),
            info_duration: config.info_duration(),
            ..RuntimeConfig::default()
        },
    );
    if let Some(location) = config.user_location() {
        runtime.dispatch(ScreenEvent::UserLocation(location));
    }
    runtime.dispatch(ScreenEvent::Camera(config.initial_camera()));

    let data_dir = config.data_dir();
    info!("Reading CSV datasets from {}", data_dir.display());
    let sources = config
        .sources
        .iter()
        .cloned()
        .map(|source| CategorySource::new(source, &data_dir, config.coordinate_policy))
        .collect();
    runtime.spawn_fetches(sources, &client, api_key.as_deref(), online);

    if let (true, Some(key)) = (online, api_key.as_deref()) {
        report_environment(&client, config, key).await;
    }

    runtime.run_for(Duration::from_millis(args.startup_wait_ms)).await;
    info!(
        "{} places in view after startup",
        runtime.screen().store().combined_visible_count()
    );

    let snapshots = match &args.script {
        Some(path) => {
            let steps = load_script(path)?;
            info!("Replaying {} steps from {}", steps.len(), path.display());
            replay(&mut runtime, &steps).await
        }
        None => vec![LabelledSnapshot {
            label: Some("initial".to_string()),
            snapshot: runtime.snapshot(),
        }],
    };

    for snapshot in snapshots {
        let json = serde_json::to_string_pretty(&snapshot.snapshot)?;
        println!("# {}", snapshot.label.as_deref().unwrap_or("snapshot"));
        println!("{json}");
    }

    runtime.shutdown();
    Ok(())
}

async fn report_environment(client: &reqwest::Client, config: &AppConfig, api_key: &str) {
    let url = config.air_quality_url.replace(API_KEY_PLACEHOLDER, api_key);
    match fetch_air_quality(client, &url).await {
        Ok(report) => info!(
            "Air quality {:?} ({}): PM10 {:?}, PM2.5 {:?}",
            report.grade,
            report.grade.color(),
            report.pm10,
            report.pm25
        ),
        Err(e) => warn!("Air quality unavailable: {}", e),
    }

    let template = config.mosquito_url.replace(API_KEY_PLACEHOLDER, api_key);
    match fetch_mosquito_index(client, &template, chrono::Local::now().date_naive()).await {
        Ok(index) => info!(
            "Mosquito index water {:.1}, house {:.1}, park {:.1}",
            index.water, index.house, index.park
        ),
        Err(e) => warn!("Mosquito index unavailable: {}", e),
    }
}

fn print_alerts(path: &std::path::Path, kind: &str, search: &str) -> Result<(), Box<dyn Error>> {
    let text = std::fs::read_to_string(path)?;
    let messages: Vec<EmergencyMessage> = serde_json::from_str(&text)?;
    let filter = AlertFilter::from_picker(kind, search);
    let matching = filter.apply(&messages);
    info!("{} of {} alerts match", matching.len(), messages.len());
    println!("{}", serde_json::to_string_pretty(&matching)?);
    Ok(())
}
