//! `farola watch`: follow a JSON-lines feed through a live `Dashboard`.
//!
//! Prints one summary whenever the fleet view changes. Rapid batches may
//! coalesce into a single summary. Stream errors are reported on stderr
//! and the watch keeps going; it ends when the feed is exhausted or on
//! Ctrl-C.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::info;

use farola_core::{Dashboard, FleetStats, FleetView, SourceError, StoreError, ZoneFilter};

use crate::cli::{OutputFormat, WatchArgs};
use crate::config::Context;
use crate::error::CliError;
use crate::feed::LineFeed;
use crate::output;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct BatchSummary {
    updated_at: DateTime<Utc>,
    filter: String,
    visible: usize,
    zones: Vec<String>,
    stats: FleetStats,
}

fn summary_line(view: &FleetView, updated_at: DateTime<Utc>) -> String {
    let s = &view.stats;
    let mut line = format!(
        "[{}] {} devices, {} online ({}%), {} on ({}%), {} automatic ({}%), {:.1} W",
        updated_at.format("%H:%M:%S"),
        s.total,
        s.online_count,
        s.online_percent,
        s.powered_on_count,
        s.powered_on_percent,
        s.automatic_count,
        s.automatic_percent,
        s.total_power_draw,
    );
    if view.filter != ZoneFilter::All {
        line.push_str(&format!(
            ", {} in zone {}",
            view.filtered_devices.len(),
            view.filter
        ));
    }
    line
}

fn render(
    view: &FleetView,
    updated_at: DateTime<Utc>,
    format: OutputFormat,
) -> Result<String, CliError> {
    match format {
        OutputFormat::Table | OutputFormat::Plain => Ok(summary_line(view, updated_at)),
        // One JSON document per line, whatever the JSON flavour.
        OutputFormat::Json | OutputFormat::JsonCompact => {
            let summary = BatchSummary {
                updated_at,
                filter: view.filter.to_string(),
                visible: view.filtered_devices.len(),
                zones: view.available_zones.clone(),
                stats: view.stats,
            };
            output::render_json(&summary, true).map_err(|e| CliError::Internal(e.to_string()))
        }
    }
}

pub async fn handle(args: &WatchArgs, ctx: &Context) -> Result<(), CliError> {
    let dashboard = Dashboard::new(ctx.dashboard.clone(), LineFeed::new(&args.feed));
    dashboard.set_zone_filter(ZoneFilter::parse(args.zone.as_deref()));

    let mut views = dashboard.subscribe_view();
    let mut status = dashboard.subscribe_status();
    dashboard.start().await?;

    let closed = StoreError::from(SourceError::Closed);
    let mut last_printed = None;
    let mut last_error: Option<StoreError> = None;

    loop {
        tokio::select! {
            biased;
            _ = tokio::signal::ctrl_c() => {
                info!("interrupted");
                break;
            }
            Some(view) = views.changed() => {
                let Some(updated_at) = dashboard.status().updated_at else {
                    continue;
                };
                if last_printed == Some(updated_at) {
                    continue;
                }
                last_printed = Some(updated_at);
                output::print_output(&render(&view, updated_at, ctx.output)?, ctx.quiet);
            }
            changed = status.changed() => {
                if changed.is_err() {
                    break;
                }
                let error = status.borrow_and_update().error.clone();
                match error {
                    Some(e) if e == closed => break,
                    Some(e) if last_error.as_ref() != Some(&e) => {
                        eprintln!("{} {e}", output::error_label(ctx.color));
                        last_error = Some(e);
                    }
                    Some(_) => {}
                    None => last_error = None,
                }
            }
        }
    }

    dashboard.stop().await;
    Ok(())
}
