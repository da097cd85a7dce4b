//! httpstat-style phase diagram

use super::colored::Palette;
use crate::{
    error::Result,
    models::{Endpoint, PhaseTrace},
};
use std::fmt::Write as _;
use std::time::Duration;

const RULE_WIDTH: usize = 91;

/// Top bar cell: right-aligned whole milliseconds
fn bar_cell(palette: &Palette, d: Duration) -> String {
    palette.value(&format!("{:>7}ms", d.as_millis())).to_string()
}

/// Marker cell: left-aligned in nine columns
fn marker_cell(palette: &Palette, d: Duration) -> String {
    palette.value(&format!("{:<9}", format!("{}ms", d.as_millis()))).to_string()
}

/// The fixed phase template filled with `trace`. Durations are truncated
/// to whole milliseconds.
pub fn phase_diagram(trace: &PhaseTrace, palette: &Palette) -> Result<String> {
    let [dns, connect, tls, server, transfer] = trace.phases().map(|d| bar_cell(palette, d));
    let [namelookup, connect_total, pretransfer, starttransfer, total] =
        trace.markers().map(|d| marker_cell(palette, d));

    let mut out = String::new();
    writeln!(
        out,
        "{}",
        palette.header("  DNS Lookup   TCP Connection   TLS Handshake   Server Processing   Content Transfer")
    )?;
    writeln!(out, "[{}  |     {}  |    {}  |        {}  |       {}  ]", dns, connect, tls, server, transfer)?;
    writeln!(out, "            |                |               |                   |                  |")?;
    writeln!(out, "   namelookup:{}      |               |                   |                  |", namelookup)?;
    writeln!(out, "                       connect:{}     |                   |                  |", connect_total)?;
    writeln!(out, "                                   pretransfer:{}         |                  |", pretransfer)?;
    writeln!(out, "                                                     starttransfer:{}        |", starttransfer)?;
    writeln!(out, "                                                                                total:{}", total)?;

    Ok(out)
}

/// Heading, rules and diagram for one traced region
pub fn trace_block(endpoint: &Endpoint, trace: &PhaseTrace, palette: &Palette) -> Result<String> {
    let rule = "-".repeat(RULE_WIDTH);
    let mut out = String::new();

    writeln!(out)?;
    writeln!(out, "HTTP(S) trace of region [{}] - {}", endpoint.code, endpoint.name)?;
    writeln!(out, "{}", rule)?;
    out.push_str(&phase_diagram(trace, palette)?);
    writeln!(out, "{}", rule)?;

    Ok(out)
}
