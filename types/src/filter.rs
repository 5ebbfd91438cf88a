//! Filter definitions: the tagged union of DSP filter types, plus the
//! reference form outputs use to share definitions from the store.

use crate::crossover::{Crossover, DEFAULT_Q};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

const REF_PREFIX: &str = "filters/";

/// The available filter types, as their wire tags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FilterType {
    LowPass,
    HighPass,
    LowShelf,
    HighShelf,
    Peq,
    BandPass,
    Notch,
    LinkwitzTransform,
    Biquad,
    Fir,
}

impl FilterType {
    /// All types in selector order.
    pub const ALL: [FilterType; 10] = [
        FilterType::LowPass,
        FilterType::HighPass,
        FilterType::LowShelf,
        FilterType::HighShelf,
        FilterType::Peq,
        FilterType::BandPass,
        FilterType::Notch,
        FilterType::LinkwitzTransform,
        FilterType::Biquad,
        FilterType::Fir,
    ];

    /// Display name: the tag words in lowercase, acronyms kept as-is.
    pub fn label(&self) -> &'static str {
        match self {
            FilterType::LowPass => "Low pass",
            FilterType::HighPass => "High pass",
            FilterType::LowShelf => "Low shelf",
            FilterType::HighShelf => "High shelf",
            FilterType::Peq => "PEQ",
            FilterType::BandPass => "Band pass",
            FilterType::Notch => "Notch",
            FilterType::LinkwitzTransform => "Linkwitz transform",
            FilterType::Biquad => "Biquad",
            FilterType::Fir => "FIR",
        }
    }
}

/// Shelving filter parameters, shared by low and high shelf.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Shelf {
    #[serde(default)]
    pub freq: f64,
    #[serde(default)]
    pub gain: f64,
    #[serde(default = "default_shelf_q")]
    pub q: f64,
}

fn default_shelf_q() -> f64 {
    DEFAULT_Q
}

impl Default for Shelf {
    fn default() -> Self {
        Self {
            freq: 0.0,
            gain: 0.0,
            q: DEFAULT_Q,
        }
    }
}

/// Parametric EQ band.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Peq {
    #[serde(default)]
    pub freq: f64,
    #[serde(default)]
    pub gain: f64,
    #[serde(default)]
    pub q: f64,
}

/// Bandwidth-based band parameters, shared by band pass and notch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Band {
    #[serde(default)]
    pub freq: f64,
    #[serde(default)]
    pub gain: f64,
    #[serde(default)]
    pub bandwidth: f64,
}

/// Linkwitz transform: measured pole and target pole.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct LinkwitzTransform {
    #[serde(default)]
    pub f0: f64,
    #[serde(default)]
    pub q0: f64,
    #[serde(default)]
    pub fp: f64,
    #[serde(default)]
    pub qp: f64,
}

/// Raw biquad coefficients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Biquad {
    #[serde(default)]
    pub b0: f64,
    #[serde(default)]
    pub b1: f64,
    #[serde(default)]
    pub b2: f64,
    #[serde(default = "default_a0")]
    pub a0: f64,
    #[serde(default)]
    pub a1: f64,
    #[serde(default)]
    pub a2: f64,
}

fn default_a0() -> f64 {
    1.0
}

impl Default for Biquad {
    fn default() -> Self {
        Self {
            b0: 0.0,
            b1: 0.0,
            b2: 0.0,
            a0: 1.0,
            a1: 0.0,
            a2: 0.0,
        }
    }
}

/// FIR convolution from an impulse response file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Fir {
    #[serde(default)]
    pub file: String,
}

/// One filter definition, tagged on the wire by its `type` field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Filter {
    LowPass(Crossover),
    HighPass(Crossover),
    LowShelf(Shelf),
    HighShelf(Shelf),
    Peq(Peq),
    BandPass(Band),
    Notch(Band),
    LinkwitzTransform(LinkwitzTransform),
    Biquad(Biquad),
    Fir(Fir),
}

impl Filter {
    /// The wire tag of this definition.
    pub fn filter_type(&self) -> FilterType {
        match self {
            Filter::LowPass(_) => FilterType::LowPass,
            Filter::HighPass(_) => FilterType::HighPass,
            Filter::LowShelf(_) => FilterType::LowShelf,
            Filter::HighShelf(_) => FilterType::HighShelf,
            Filter::Peq(_) => FilterType::Peq,
            Filter::BandPass(_) => FilterType::BandPass,
            Filter::Notch(_) => FilterType::Notch,
            Filter::LinkwitzTransform(_) => FilterType::LinkwitzTransform,
            Filter::Biquad(_) => FilterType::Biquad,
            Filter::Fir(_) => FilterType::Fir,
        }
    }

    /// A definition of the given type at its init values.
    pub fn default_of(filter_type: FilterType) -> Filter {
        match filter_type {
            FilterType::LowPass => Filter::LowPass(Crossover::default_low_pass()),
            FilterType::HighPass => Filter::HighPass(Crossover::default_high_pass()),
            FilterType::LowShelf => Filter::LowShelf(Shelf::default()),
            FilterType::HighShelf => Filter::HighShelf(Shelf::default()),
            FilterType::Peq => Filter::Peq(Peq::default()),
            FilterType::BandPass => Filter::BandPass(Band::default()),
            FilterType::Notch => Filter::Notch(Band::default()),
            FilterType::LinkwitzTransform => Filter::LinkwitzTransform(LinkwitzTransform::default()),
            FilterType::Biquad => Filter::Biquad(Biquad::default()),
            FilterType::Fir => Filter::Fir(Fir::default()),
        }
    }
}

/// A by-name reference into the document's filter store.
///
/// Wire form `{"#ref": "filters/<name>"}`. References are weak: nothing
/// stops the named definition from disappearing, resolution just reports
/// the hole.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterRef {
    /// Reference path: `filters/` followed by the definition name.
    #[serde(rename = "#ref")]
    pub path: String,
}

impl FilterRef {
    /// A reference to the named definition.
    pub fn named(name: &str) -> Self {
        Self {
            path: format!("{REF_PREFIX}{name}"),
        }
    }

    /// The referenced name: everything after the last `/`.
    pub fn name(&self) -> &str {
        match self.path.rfind('/') {
            Some(at) => &self.path[at + 1..],
            None => &self.path,
        }
    }

    /// Point this reference at a different name.
    pub fn set_name(&mut self, name: &str) {
        self.path = format!("{REF_PREFIX}{name}");
    }
}

/// One element of an output's filter chain: a shared definition by
/// reference, or a one-off inline definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OutputFilter {
    Ref(FilterRef),
    Inline(Filter),
}

impl OutputFilter {
    /// The referenced name, when this element is a reference.
    pub fn ref_name(&self) -> Option<&str> {
        match self {
            OutputFilter::Ref(filter_ref) => Some(filter_ref.name()),
            OutputFilter::Inline(_) => None,
        }
    }

    /// Resolve against the filter store. Never fails: a reference whose
    /// definition is gone comes back as `Dangling`.
    pub fn resolve<'a>(&'a self, filters: &'a BTreeMap<String, Filter>) -> ResolvedFilter<'a> {
        match self {
            OutputFilter::Inline(filter) => ResolvedFilter::Inline(filter),
            OutputFilter::Ref(filter_ref) => match filters.get(filter_ref.name()) {
                Some(filter) => ResolvedFilter::Named {
                    name: filter_ref.name(),
                    filter,
                },
                None => ResolvedFilter::Dangling {
                    path: &filter_ref.path,
                },
            },
        }
    }
}

/// Outcome of resolving one output-filter element.
#[derive(Debug, Clone, PartialEq)]
pub enum ResolvedFilter<'a> {
    /// Inline definition, local to the output.
    Inline(&'a Filter),
    /// Reference resolved against the store.
    Named { name: &'a str, filter: &'a Filter },
    /// Reference whose definition is gone.
    Dangling { path: &'a str },
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crossover::CrossoverType;

    #[test]
    fn crossover_filters_flatten_behind_the_type_tag() {
        let filter = Filter::default_of(FilterType::LowPass);
        let json = serde_json::to_value(&filter).unwrap();
        assert_eq!(json["type"], "LOW_PASS");
        assert_eq!(json["crossoverType"], "BUTTERWORTH");
        assert_eq!(json["freq"], 80.0);
        assert_eq!(json["order"], 5);

        let reparsed: Filter = serde_json::from_value(json).unwrap();
        assert_eq!(reparsed, filter);
    }

    #[test]
    fn tag_dispatch_covers_acronym_types() {
        let peq: Filter =
            serde_json::from_str(r#"{"type": "PEQ", "freq": 1200, "gain": -2, "q": 1.5}"#).unwrap();
        assert_eq!(peq.filter_type(), FilterType::Peq);

        let fir: Filter = serde_json::from_str(r#"{"type": "FIR", "file": "ir.wav"}"#).unwrap();
        assert_eq!(fir, Filter::Fir(Fir { file: "ir.wav".into() }));
    }

    #[test]
    fn init_values_match_the_type() {
        assert_eq!(
            Filter::default_of(FilterType::HighShelf),
            Filter::HighShelf(Shelf {
                freq: 0.0,
                gain: 0.0,
                q: 0.707,
            })
        );
        assert_eq!(
            Filter::default_of(FilterType::Biquad),
            Filter::Biquad(Biquad {
                a0: 1.0,
                ..Biquad::default()
            })
        );
        match Filter::default_of(FilterType::HighPass) {
            Filter::HighPass(crossover) => {
                assert_eq!(crossover.crossover_type(), CrossoverType::Butterworth);
                assert_eq!(crossover.order, 3);
            }
            other => panic!("expected a high pass, got {other:?}"),
        }
    }

    #[test]
    fn partial_payloads_take_field_defaults() {
        let filter: Filter = serde_json::from_str(r#"{"type": "BIQUAD", "b0": 0.5}"#).unwrap();
        assert_eq!(
            filter,
            Filter::Biquad(Biquad {
                b0: 0.5,
                ..Biquad::default()
            })
        );
    }

    #[test]
    fn ref_name_is_the_last_path_segment() {
        let filter_ref = FilterRef::named("Bass boost");
        assert_eq!(filter_ref.path, "filters/Bass boost");
        assert_eq!(filter_ref.name(), "Bass boost");

        let odd = FilterRef {
            path: "just-a-name".into(),
        };
        assert_eq!(odd.name(), "just-a-name");
    }

    #[test]
    fn output_filter_parses_refs_and_inline_definitions() {
        let chain: Vec<OutputFilter> = serde_json::from_str(
            r##"[{"#ref": "filters/Sub EQ"}, {"type": "NOTCH", "freq": 50, "bandwidth": 2}]"##,
        )
        .unwrap();
        assert_eq!(chain[0].ref_name(), Some("Sub EQ"));
        assert_eq!(chain[1].ref_name(), None);

        let json = serde_json::to_value(&chain).unwrap();
        assert_eq!(json[0]["#ref"], "filters/Sub EQ");
        assert_eq!(json[1]["type"], "NOTCH");
    }

    #[test]
    fn resolution_reports_dangling_references() {
        let mut filters = BTreeMap::new();
        filters.insert("Sub EQ".to_string(), Filter::default_of(FilterType::Peq));

        let present = OutputFilter::Ref(FilterRef::named("Sub EQ"));
        let missing = OutputFilter::Ref(FilterRef::named("Gone"));

        match present.resolve(&filters) {
            ResolvedFilter::Named { name, .. } => assert_eq!(name, "Sub EQ"),
            other => panic!("expected a named resolution, got {other:?}"),
        }
        assert_eq!(
            missing.resolve(&filters),
            ResolvedFilter::Dangling {
                path: "filters/Gone"
            }
        );
    }
}
