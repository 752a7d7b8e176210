//! `farola normalize`: raw records to canonical device states.

use chrono::Utc;

use farola_core::{DeviceState, Normalizer};

use crate::cli::NormalizeArgs;
use crate::config::Context;
use crate::error::CliError;
use crate::input;
use crate::output;

use super::util::DeviceRow;

pub fn handle(args: &NormalizeArgs, ctx: &Context) -> Result<(), CliError> {
    let records = input::read_records(&args.file)?;
    let normalizer = Normalizer::new(ctx.dashboard.online_window);
    let now = Utc::now();

    let states: Vec<DeviceState> = records
        .iter()
        .map(|(id, raw)| normalizer.normalize(raw, id, now))
        .collect();
    tracing::debug!(devices = states.len(), "normalized records");

    let out = output::render_list(
        ctx.output,
        &states,
        |d| DeviceRow::new(d, ctx.color),
        |d| d.id.clone(),
    )
    .map_err(|e| CliError::Internal(e.to_string()))?;
    output::print_output(&out, ctx.quiet);
    Ok(())
}
