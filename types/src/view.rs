//! Display projections: pure functions from the model to the strings and
//! grids a presentation layer renders.

use crate::advanced::{AdvancedRouting, RouteState};
use crate::channel::Channel;
use crate::crossover::{Alignment, Crossover};
use crate::filter::{Filter, ResolvedFilter};
use crate::output::Output;
use std::collections::BTreeMap;
use std::fmt::Write;

/// One row of the advanced routing matrix: an input and one cell per
/// output channel, both in canonical order.
#[derive(Debug, Clone, PartialEq)]
pub struct RouteRow {
    pub input: Channel,
    pub cells: Vec<RouteState>,
}

/// The full 8x8 routing matrix.
pub fn route_table(advanced: &AdvancedRouting) -> Vec<RouteRow> {
    Channel::ALL
        .iter()
        .map(|&input| RouteRow {
            input,
            cells: Channel::ALL
                .iter()
                .map(|&output| advanced.route_state(input, output))
                .collect(),
        })
        .collect()
}

/// Tooltip for one matrix cell.
pub fn route_title(input: Channel, output: Channel) -> String {
    format!("Route \"{}\" to \"{}\"", input.name(), output.name())
}

/// Multi-line description of a definition: the type on the first line,
/// then its parameters.
pub fn filter_summary(filter: &Filter) -> String {
    let mut text = filter.filter_type().label().to_string();
    match filter {
        Filter::LowPass(crossover) | Filter::HighPass(crossover) => {
            write_crossover(&mut text, crossover);
        }
        Filter::LowShelf(shelf) | Filter::HighShelf(shelf) => {
            let _ = write!(
                text,
                "\nFrequency: {}Hz\nGain: {}dB\nQ-value: {}",
                shelf.freq, shelf.gain, shelf.q
            );
        }
        Filter::Peq(peq) => {
            let _ = write!(
                text,
                "\nFrequency: {}Hz\nGain: {}dB\nQ-value: {}",
                peq.freq, peq.gain, peq.q
            );
        }
        Filter::BandPass(band) | Filter::Notch(band) => {
            let _ = write!(
                text,
                "\nFrequency: {}Hz\nGain: {}dB\nBandwidth: {}",
                band.freq, band.gain, band.bandwidth
            );
        }
        Filter::LinkwitzTransform(lt) => {
            let _ = write!(
                text,
                "\nF0: {}Hz\nQ0: {}\nFp: {}Hz\nQp: {}",
                lt.f0, lt.q0, lt.fp, lt.qp
            );
        }
        Filter::Biquad(biquad) => {
            let _ = write!(
                text,
                "\nb0: {}\nb1: {}\nb2: {}\na0: {}\na1: {}\na2: {}",
                biquad.b0, biquad.b1, biquad.b2, biquad.a0, biquad.a1, biquad.a2
            );
        }
        Filter::Fir(fir) => {
            let _ = write!(text, "\nFile: {}", fir.file);
        }
    }
    text
}

fn write_crossover(text: &mut String, crossover: &Crossover) {
    let _ = write!(
        text,
        "\nType: {}\nFrequency: {}Hz\nOrder: {} ({}dB/oct)",
        crossover.crossover_type().label(),
        crossover.freq,
        crossover.order,
        crossover.slope_db_per_octave()
    );
    match &crossover.alignment {
        Alignment::Custom { q } => {
            let values: Vec<String> = q.iter().map(f64::to_string).collect();
            let _ = write!(text, "\nQ-values: {}", values.join(", "));
        }
        other => {
            if let Some(q_offset) = other.q_offset() {
                let _ = write!(text, "\nQ-offset: {q_offset}");
            }
        }
    }
}

/// One row of an output's filter list.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterListEntry {
    /// Store name, for reference elements.
    pub name: Option<String>,
    /// Summary text, or the error line for a broken reference.
    pub text: String,
    pub dangling: bool,
}

/// Rows for an output's filter list, references resolved against the
/// store. Broken references come back as error rows, never as failures.
pub fn output_filter_summaries(
    output: &Output,
    filters: &BTreeMap<String, Filter>,
) -> Vec<FilterListEntry> {
    output
        .filters
        .iter()
        .map(|element| match element.resolve(filters) {
            ResolvedFilter::Inline(filter) => FilterListEntry {
                name: None,
                text: filter_summary(filter),
                dangling: false,
            },
            ResolvedFilter::Named { name, filter } => FilterListEntry {
                name: Some(name.to_string()),
                text: filter_summary(filter),
                dangling: false,
            },
            ResolvedFilter::Dangling { path } => FilterListEntry {
                name: None,
                text: format!("Missing reference: {path}"),
                dangling: true,
            },
        })
        .collect()
}

/// Header line for an output: the channel names it drives.
pub fn output_summary(output: &Output) -> String {
    if output.channels.is_empty() {
        return "No channels selected".to_string();
    }
    output
        .channels
        .iter()
        .map(|channel| channel.name())
        .collect::<Vec<_>>()
        .join(", ")
}
