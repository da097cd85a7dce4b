//! Report rendering
//!
//! Everything written to stdout goes through [`Presenter`]: the sweep table,
//! region listings, trace blocks, usage hints and the ranking listing.
//! Renderers return strings; the caller decides when to write them.

mod colored;
mod table;
mod trace;

pub use colored::Palette;
pub use table::{fixed_row, pad_cell, visible_width, TableWriter};
pub use trace::{phase_diagram, trace_block};

use crate::{
    defaults,
    error::{AppError, Result},
    models::{Endpoint, PhaseTrace, ProbeResult},
    registry::EndpointRegistry,
    stats::RegionRanking,
    types::Provider,
};

/// Separator cell under each header column
const SEPARATOR: &str = "------------------------------";

/// Renders reports for one provider
#[derive(Debug, Clone, Copy)]
pub struct Presenter {
    provider: Provider,
    palette: Palette,
}

impl Presenter {
    pub fn new(provider: Provider, use_color: bool) -> Self {
        Self {
            provider,
            palette: Palette::new(use_color),
        }
    }

    pub fn provider(&self) -> Provider {
        self.provider
    }

    pub fn palette(&self) -> &Palette {
        &self.palette
    }

    /// Header and separator printed before a sweep starts
    pub fn sweep_header(&self) -> String {
        let label = self.provider.display_name();
        let mut out = String::new();
        out.push_str(&stream_row(&[
            format!("{} Region Code", label),
            format!("{} Region Name", label),
            "Latency".to_string(),
        ]));
        out.push('\n');
        out.push_str(&stream_row(&[SEPARATOR.to_string(), SEPARATOR.to_string(), SEPARATOR.to_string()]));
        out.push('\n');
        out
    }

    /// One sweep row: coloured latency for a 200, the status otherwise
    pub fn probe_row(&self, result: &ProbeResult) -> String {
        let outcome = match result.tier() {
            Some(tier) => self.palette.tier(&format!("{:?}", result.latency), tier).to_string(),
            None => match (&result.error, result.status_code) {
                (Some(error), _) => error.clone(),
                (None, Some(status)) => AppError::protocol(status).to_string(),
                (None, None) => "Ping failed".to_string(),
            },
        };
        self.endpoint_row(&result.endpoint, outcome)
    }

    /// Sweep row for a transport failure reported inline
    pub fn failure_row(&self, endpoint: &Endpoint, error: &AppError) -> String {
        self.endpoint_row(endpoint, format!("Ping failed: {}", error))
    }

    fn endpoint_row(&self, endpoint: &Endpoint, outcome: String) -> String {
        let mut row = stream_row(&[format!("[{}]", endpoint.code), format!("[{}]", endpoint.name), outcome]);
        row.push('\n');
        row
    }

    /// Hint printed after a sweep
    pub fn sweep_footer(&self) -> String {
        format!(
            "\nYou can also add region after command if you want http trace information of the specific region\nex> {} {} {}\n",
            crate::PKG_NAME,
            self.provider,
            self.provider.example_region()
        )
    }

    /// Two-column listing of every region in the registry
    pub fn region_listing(&self, registry: &EndpointRegistry) -> String {
        let label = self.provider.display_name();
        let mut table = TableWriter::standard();
        table.push_row([format!("{} Region Code", label), format!("{} Region Name", label)]);
        table.push_row([SEPARATOR, SEPARATOR]);
        for endpoint in registry.iter() {
            table.push_row([format!("[{}]", endpoint.code), format!("[{}]", endpoint.name)]);
        }
        table.render()
    }

    pub fn trace_block(&self, endpoint: &Endpoint, trace: &PhaseTrace) -> Result<String> {
        trace_block(endpoint, trace, &self.palette)
    }

    /// Trace heading followed by the failure, for failures reported inline
    pub fn trace_failure(&self, endpoint: &Endpoint, error: &AppError) -> String {
        format!(
            "\nHTTP(S) trace of region [{}] - {}\nPing failed: {}\n",
            endpoint.code, endpoint.name, error
        )
    }

    /// Usage hint for a region code that is not in the registry
    pub fn unresolved_hint(&self, code: &str) -> String {
        format!(
            "Region code [{code}] is wrong.  To check available region codes run the command with -l or --list flag\n\
             Usage: {bin} {provider} -l\n\
             Usage: {bin} {provider} --list\n",
            code = code,
            bin = crate::PKG_NAME,
            provider = self.provider,
        )
    }

    /// Numbered ranking, fastest median first
    pub fn ranking(&self, rankings: &[RegionRanking]) -> String {
        let mut table = TableWriter::new(3, defaults::TABLE_PADDING);

        for ranking in rankings {
            let median = match ranking.median {
                Some(median) => format!("{:?}", median),
                None => "no samples".to_string(),
            };

            let mut cells = vec![format!("{:2}.", ranking.rank), format!("[{}]", ranking.code), median];
            if ranking.errors > 0 {
                cells.push(format!("({} errors)", ranking.errors));
            }
            table.push_row(cells);
        }

        table.render()
    }
}

/// Row in the fixed layout shared by the sweep header and streamed results
fn stream_row(cells: &[String]) -> String {
    fixed_row(cells, defaults::TABLE_MIN_WIDTH, defaults::TABLE_PADDING)
}
