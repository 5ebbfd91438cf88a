//! The document root: everything the router reads from one JSON file.

use crate::advanced::AdvancedRouting;
use crate::basic::BasicRouting;
use crate::channel::Channel;
use crate::filter::{Filter, FilterType, OutputFilter};
use crate::output::{used_channels, Output};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

#[cfg(feature = "openapi")]
use utoipa::ToSchema;

/// Problems a document can have on load.
#[derive(Debug, thiserror::Error)]
pub enum DocumentError {
    #[error("both basic and advanced routing present")]
    BothRoutingModes,
}

/// The active routing scheme and its payload.
#[derive(Debug, Clone, PartialEq)]
pub enum RoutingMode {
    Basic(BasicRouting),
    Advanced(AdvancedRouting),
}

impl RoutingMode {
    /// The payload's tag.
    pub fn kind(&self) -> RoutingModeKind {
        match self {
            RoutingMode::Basic(_) => RoutingModeKind::Basic,
            RoutingMode::Advanced(_) => RoutingModeKind::Advanced,
        }
    }
}

/// Names a routing scheme without its payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
pub enum RoutingModeKind {
    Basic,
    Advanced,
}

/// Audio endpoint selection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct Devices {
    /// Capture endpoint name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub capture: Option<String>,
    /// Render endpoint name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub render: Option<String>,
    /// Drive the render endpoint through ASIO.
    #[serde(default)]
    pub render_asio: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub asio_buffer_size: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub asio_num_channels: Option<u32>,
}

impl Devices {
    /// Switch ASIO on or off. Turning it off drops the ASIO-only fields in
    /// the same update.
    pub fn set_render_asio(&mut self, on: bool) {
        self.render_asio = on;
        if !on {
            self.asio_buffer_size = None;
            self.asio_num_channels = None;
        }
    }
}

/// The router's configuration document.
///
/// Wire form is one JSON object; the routing payload appears as a `basic`
/// or `advanced` top-level key, of which at most one may be present. A file
/// carrying both is rejected; a file carrying neither is legal and leaves
/// the router at its identity defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "DocumentRepr", into = "DocumentRepr")]
pub struct Document {
    /// Launch the router when the OS starts.
    pub start_with_os: bool,
    /// Start minimized.
    pub minimize: bool,
    /// Hide the tray icon.
    pub hide: bool,
    /// Verbose engine logging.
    pub debug: bool,
    /// Free-form description shown in the editor.
    pub description: String,
    pub devices: Devices,
    /// Routing payload, when one is explicit.
    pub routing: Option<RoutingMode>,
    /// Named, shareable filter definitions, ordered by name.
    pub filters: BTreeMap<String, Filter>,
    pub outputs: Vec<Output>,
}

impl Default for Document {
    /// The document a fresh install starts from: basic routing at its
    /// defaults and one full-range output on the front pair.
    fn default() -> Self {
        Self {
            start_with_os: false,
            minimize: false,
            hide: false,
            debug: false,
            description: "Default config".to_string(),
            devices: Devices::default(),
            routing: Some(RoutingMode::Basic(BasicRouting::default())),
            filters: BTreeMap::new(),
            outputs: vec![Output::with_channels(vec![Channel::L, Channel::R])],
        }
    }
}

impl Document {
    /// Tag of the active routing scheme, if one is explicit.
    pub fn routing_mode(&self) -> Option<RoutingModeKind> {
        self.routing.as_ref().map(RoutingMode::kind)
    }

    /// Create a definition under the first free generated name and return
    /// the name. Numbering starts at the current definition count and walks
    /// past collisions.
    pub fn add_filter(&mut self) -> String {
        let mut n = self.filters.len();
        let mut name = format!("Filter_{n}");
        while self.filters.contains_key(&name) {
            n += 1;
            name = format!("Filter_{n}");
        }
        self.filters
            .insert(name.clone(), Filter::default_of(FilterType::LowPass));
        name
    }

    /// Delete a definition. References are left to dangle; callers gate
    /// removal of in-use names on `used_filter_names`.
    pub fn remove_filter(&mut self, name: &str) -> Option<Filter> {
        self.filters.remove(name)
    }

    /// Replace a definition with the given type at its init values, keeping
    /// the name and therefore every reference to it.
    pub fn change_filter_type(&mut self, name: &str, filter_type: FilterType) -> bool {
        match self.filters.get_mut(name) {
            Some(slot) => {
                *slot = Filter::default_of(filter_type);
                true
            }
            None => false,
        }
    }

    /// Rename a definition and rewrite every reference to it in the same
    /// update. Rejected when the new name is empty or already taken.
    pub fn rename_filter(&mut self, old: &str, new: &str) -> bool {
        if new.is_empty() || self.filters.contains_key(new) {
            return false;
        }
        let Some(definition) = self.filters.remove(old) else {
            return false;
        };
        self.filters.insert(new.to_string(), definition);
        for output in &mut self.outputs {
            for element in &mut output.filters {
                if let OutputFilter::Ref(filter_ref) = element {
                    if filter_ref.name() == old {
                        filter_ref.set_name(new);
                    }
                }
            }
        }
        true
    }

    /// Names referenced by any output.
    pub fn used_filter_names(&self) -> BTreeSet<String> {
        self.outputs
            .iter()
            .flat_map(Output::referenced_filter_names)
            .collect()
    }

    /// Defined names the given output does not reference yet, in name
    /// order. Reuse across *other* outputs stays legal.
    pub fn unused_filter_names(&self, output: &Output) -> Vec<String> {
        let referenced = output.referenced_filter_names();
        self.filters
            .keys()
            .filter(|name| !referenced.contains(*name))
            .cloned()
            .collect()
    }

    /// Append a new output and return its index. The document's first
    /// output starts on the front pair; later ones start empty.
    pub fn add_output(&mut self) -> usize {
        let channels = if self.outputs.is_empty() {
            vec![Channel::L, Channel::R]
        } else {
            Vec::new()
        };
        self.outputs.push(Output::with_channels(channels));
        self.outputs.len() - 1
    }

    /// Remove the output at `index`.
    pub fn remove_output(&mut self, index: usize) -> Option<Output> {
        if index < self.outputs.len() {
            Some(self.outputs.remove(index))
        } else {
            None
        }
    }

    /// Toggle a channel on one output, holding channels exclusive across
    /// all outputs.
    pub fn toggle_output_channel(&mut self, output_index: usize, channel: Channel) -> bool {
        let used = used_channels(&self.outputs);
        match self.outputs.get_mut(output_index) {
            Some(output) => output.toggle_channel(channel, &used),
            None => false,
        }
    }
}

/// Wire form: the two routing payloads are sibling optional keys.
#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DocumentRepr {
    #[serde(rename = "startWithOS", default)]
    start_with_os: bool,
    #[serde(default)]
    minimize: bool,
    #[serde(default)]
    hide: bool,
    #[serde(default)]
    debug: bool,
    #[serde(default)]
    description: String,
    #[serde(default)]
    devices: Devices,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    basic: Option<BasicRouting>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    advanced: Option<AdvancedRouting>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    filters: BTreeMap<String, Filter>,
    #[serde(default)]
    outputs: Vec<Output>,
}

impl TryFrom<DocumentRepr> for Document {
    type Error = DocumentError;

    fn try_from(repr: DocumentRepr) -> Result<Self, Self::Error> {
        let routing = match (repr.basic, repr.advanced) {
            (Some(_), Some(_)) => return Err(DocumentError::BothRoutingModes),
            (Some(basic), None) => Some(RoutingMode::Basic(basic)),
            (None, Some(advanced)) => Some(RoutingMode::Advanced(advanced)),
            (None, None) => None,
        };
        Ok(Document {
            start_with_os: repr.start_with_os,
            minimize: repr.minimize,
            hide: repr.hide,
            debug: repr.debug,
            description: repr.description,
            devices: repr.devices,
            routing,
            filters: repr.filters,
            outputs: repr.outputs,
        })
    }
}

impl From<Document> for DocumentRepr {
    fn from(document: Document) -> Self {
        let (basic, advanced) = match document.routing {
            Some(RoutingMode::Basic(basic)) => (Some(basic), None),
            Some(RoutingMode::Advanced(advanced)) => (None, Some(advanced)),
            None => (None, None),
        };
        DocumentRepr {
            start_with_os: document.start_with_os,
            minimize: document.minimize,
            hide: document.hide,
            debug: document.debug,
            description: document.description,
            devices: document.devices,
            basic,
            advanced,
            filters: document.filters,
            outputs: document.outputs,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::advanced::RouteState;
    use crate::filter::{FilterRef, ResolvedFilter};

    fn doc_with_named_filter(name: &str) -> Document {
        let mut document = Document::default();
        document
            .filters
            .insert(name.to_string(), Filter::default_of(FilterType::Peq));
        document
    }

    #[test]
    fn default_document_wire_shape() {
        let json = serde_json::to_value(Document::default()).unwrap();
        assert_eq!(json["description"], "Default config");
        assert_eq!(json["basic"]["subwoofer"], "Sub");
        assert!(json.get("advanced").is_none());
        assert!(json.get("filters").is_none());
        assert_eq!(json["outputs"][0]["channels"], serde_json::json!(["L", "R"]));
        assert_eq!(json["startWithOS"], false);
    }

    #[test]
    fn both_routing_payloads_are_rejected() {
        let err = serde_json::from_str::<Document>(r#"{"basic": {}, "advanced": {}}"#)
            .unwrap_err()
            .to_string();
        assert!(err.contains("both basic and advanced"), "{err}");
    }

    #[test]
    fn missing_routing_payload_is_legal() {
        let document: Document = serde_json::from_str("{}").unwrap();
        assert_eq!(document.routing, None);
        assert_eq!(document.routing_mode(), None);
    }

    #[test]
    fn rename_updates_definition_and_references_together() {
        let mut document = doc_with_named_filter("Old");
        document.outputs[0].import_filter("Old");
        let second = document.add_output();
        document.outputs[second].import_filter("Old");

        assert!(document.rename_filter("Old", "New"));

        assert!(document.filters.contains_key("New"));
        assert!(!document.filters.contains_key("Old"));
        for output in &document.outputs {
            assert_eq!(
                output.referenced_filter_names().into_iter().collect::<Vec<_>>(),
                vec!["New".to_string()]
            );
        }
        let wire = serde_json::to_string(&document).unwrap();
        assert!(!wire.contains("filters/Old"));
    }

    #[test]
    fn rename_rejects_empty_and_taken_names() {
        let mut document = doc_with_named_filter("A");
        document
            .filters
            .insert("B".to_string(), Filter::default_of(FilterType::Notch));

        assert!(!document.rename_filter("A", ""));
        assert!(!document.rename_filter("A", "B"));
        assert!(!document.rename_filter("A", "A"));
        assert!(!document.rename_filter("Missing", "C"));
        assert!(document.filters.contains_key("A"));
    }

    #[test]
    fn generated_names_start_at_count_and_skip_collisions() {
        let mut document = Document::default();
        assert_eq!(document.add_filter(), "Filter_0");
        assert_eq!(document.add_filter(), "Filter_1");

        assert!(document.rename_filter("Filter_0", "Filter_2"));
        assert_eq!(document.add_filter(), "Filter_3");
    }

    #[test]
    fn removing_a_referenced_definition_leaves_a_dangling_reference() {
        let mut document = doc_with_named_filter("Sub EQ");
        document.outputs[0].import_filter("Sub EQ");

        assert!(document.remove_filter("Sub EQ").is_some());

        let resolved = document.outputs[0].filters[0].resolve(&document.filters);
        assert_eq!(
            resolved,
            ResolvedFilter::Dangling {
                path: "filters/Sub EQ"
            }
        );
    }

    #[test]
    fn change_type_resets_parameters_but_keeps_references_valid() {
        let mut document = doc_with_named_filter("X");
        document.outputs[0].import_filter("X");

        assert!(document.change_filter_type("X", FilterType::Fir));
        assert_eq!(document.filters["X"], Filter::default_of(FilterType::Fir));
        assert!(matches!(
            document.outputs[0].filters[0].resolve(&document.filters),
            ResolvedFilter::Named { name: "X", .. }
        ));
        assert!(!document.change_filter_type("Y", FilterType::Fir));
    }

    #[test]
    fn unused_names_are_relative_to_one_output() {
        let mut document = doc_with_named_filter("A");
        document
            .filters
            .insert("B".to_string(), Filter::default_of(FilterType::Notch));
        document.outputs[0].import_filter("A");
        let second = document.add_output();
        document.outputs[second].import_filter("A");
        document.outputs[second].import_filter("B");

        assert_eq!(
            document.unused_filter_names(&document.outputs[0]),
            vec!["B".to_string()]
        );
        assert!(document.unused_filter_names(&document.outputs[second]).is_empty());
        assert_eq!(
            document.used_filter_names().into_iter().collect::<Vec<_>>(),
            vec!["A".to_string(), "B".to_string()]
        );
    }

    #[test]
    fn channel_exclusivity_holds_across_outputs() {
        let mut document = Document::default();
        let second = document.add_output();

        assert!(!document.toggle_output_channel(second, Channel::L));
        assert!(document.toggle_output_channel(second, Channel::SW));
        // Freed channels become claimable again.
        assert!(document.toggle_output_channel(0, Channel::L));
        assert!(document.toggle_output_channel(second, Channel::L));
        assert_eq!(
            document.outputs[second].channels,
            vec![Channel::L, Channel::SW]
        );
        assert!(!document.toggle_output_channel(9, Channel::R));
    }

    #[test]
    fn first_output_starts_on_the_front_pair() {
        let mut document = Document::default();
        document.outputs.clear();
        let first = document.add_output();
        let second = document.add_output();
        assert_eq!(document.outputs[first].channels, vec![Channel::L, Channel::R]);
        assert!(document.outputs[second].channels.is_empty());
        assert!(document.remove_output(second).is_some());
        assert!(document.remove_output(7).is_none());
    }

    #[test]
    fn editing_scenario_stays_consistent_end_to_end() {
        let mut document = Document::default();

        let generated = document.add_filter();
        assert!(document.rename_filter(&generated, "Room EQ"));
        document.outputs[0].import_filter("Room EQ");

        // Flip to an advanced matrix and punch a cross-feed route.
        let mut advanced = AdvancedRouting::default();
        advanced.set_gain(Channel::L, Channel::SW, -10.0);
        document.routing = Some(RoutingMode::Advanced(advanced));
        assert_eq!(document.routing_mode(), Some(RoutingModeKind::Advanced));

        let second = document.add_output();
        assert!(document.toggle_output_channel(second, Channel::SW));
        assert!(!document.toggle_output_channel(second, Channel::L));

        assert!(document.remove_filter("Room EQ").is_some());
        assert!(matches!(
            document.outputs[0].filters[0].resolve(&document.filters),
            ResolvedFilter::Dangling { .. }
        ));

        let wire = serde_json::to_string(&document).unwrap();
        let reparsed: Document = serde_json::from_str(&wire).unwrap();
        assert_eq!(reparsed, document);
        match &reparsed.routing {
            Some(RoutingMode::Advanced(advanced)) => {
                assert_eq!(
                    advanced.route_state(Channel::L, Channel::SW),
                    RouteState::Gain(-10.0)
                );
            }
            other => panic!("expected advanced routing, got {other:?}"),
        }
    }

    #[test]
    fn devices_drop_asio_fields_when_asio_turns_off() {
        let mut devices = Devices {
            render_asio: true,
            asio_buffer_size: Some(512),
            asio_num_channels: Some(8),
            ..Devices::default()
        };
        devices.set_render_asio(false);
        assert_eq!(devices.asio_buffer_size, None);
        assert_eq!(devices.asio_num_channels, None);

        let json = serde_json::to_value(&devices).unwrap();
        assert!(json.get("asioBufferSize").is_none());
    }

    #[test]
    fn dangling_reference_survives_serialization() {
        let mut document = Document::default();
        document.outputs[0]
            .filters
            .push(OutputFilter::Ref(FilterRef::named("Ghost")));

        let wire = serde_json::to_string(&document).unwrap();
        let reparsed: Document = serde_json::from_str(&wire).unwrap();
        assert_eq!(
            reparsed.outputs[0].filters[0].resolve(&reparsed.filters),
            ResolvedFilter::Dangling {
                path: "filters/Ghost"
            }
        );
    }
}
