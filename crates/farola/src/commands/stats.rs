//! `farola stats`: fleet statistics over a record file.

use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use tabled::Tabled;

use farola_core::{DeviceState, FleetStats, FleetView, Normalizer, SnapshotMap, ZoneFilter};

use crate::cli::{OutputFormat, StatsArgs};
use crate::config::Context;
use crate::error::CliError;
use crate::input;
use crate::output;

use super::util::DeviceRow;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct StatsReport<'a> {
    filter: String,
    stats: FleetStats,
    zones: &'a [String],
    devices: &'a [Arc<DeviceState>],
}

#[derive(Tabled)]
struct MetricRow {
    #[tabled(rename = "Metric")]
    metric: &'static str,
    #[tabled(rename = "Value")]
    value: String,
}

fn summary_rows(stats: &FleetStats) -> Vec<MetricRow> {
    let row = |metric, value: String| MetricRow { metric, value };
    vec![
        row("Devices", stats.total.to_string()),
        row(
            "Online",
            format!("{} ({}%)", stats.online_count, stats.online_percent),
        ),
        row(
            "Powered on",
            format!("{} ({}%)", stats.powered_on_count, stats.powered_on_percent),
        ),
        row(
            "Automatic",
            format!("{} ({}%)", stats.automatic_count, stats.automatic_percent),
        ),
        row("Power draw", format!("{:.1} W", stats.total_power_draw)),
        row("Energy today", format!("{:.2} kWh", stats.total_energy_today)),
    ]
}

pub fn handle(args: &StatsArgs, ctx: &Context) -> Result<(), CliError> {
    let records = input::read_records(&args.file)?;
    let normalizer = Normalizer::new(ctx.dashboard.online_window);
    let now = Utc::now();

    let devices: SnapshotMap = records
        .iter()
        .map(|(id, raw)| (id.clone(), Arc::new(normalizer.normalize(raw, id, now))))
        .collect();
    let view = FleetView::compute(&devices, &ZoneFilter::parse(args.zone.as_deref()));

    let out = match ctx.output {
        OutputFormat::Table => {
            let rows: Vec<DeviceRow> = view
                .filtered_devices
                .iter()
                .map(|d| DeviceRow::new(d, ctx.color))
                .collect();
            let zones = if view.available_zones.is_empty() {
                "-".to_owned()
            } else {
                view.available_zones.join(", ")
            };
            format!(
                "{}\nZones: {zones}\nShowing {} of {} devices (zone: {})\n{}",
                output::render_table(&summary_rows(&view.stats)),
                view.filtered_devices.len(),
                view.stats.total,
                view.filter,
                output::render_table(&rows),
            )
        }
        OutputFormat::Json | OutputFormat::JsonCompact => {
            let report = StatsReport {
                filter: view.filter.to_string(),
                stats: view.stats,
                zones: &view.available_zones,
                devices: &view.filtered_devices,
            };
            output::render_json(&report, ctx.output == OutputFormat::JsonCompact)
                .map_err(|e| CliError::Internal(e.to_string()))?
        }
        OutputFormat::Plain => view
            .filtered_devices
            .iter()
            .map(|d| d.id.as_str())
            .collect::<Vec<_>>()
            .join("\n"),
    };
    output::print_output(&out, ctx.quiet);
    Ok(())
}
