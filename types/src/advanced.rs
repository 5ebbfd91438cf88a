//! Advanced routing: an explicit input-to-output gain matrix.

use crate::channel::Channel;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One explicit route from an input to an output channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Route {
    /// Output channel.
    pub out: Channel,
    /// Gain in dB.
    #[serde(default)]
    pub gain: f64,
}

/// What one input/output pair currently does.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RouteState {
    /// Routed at the given gain, dB.
    Gain(f64),
    /// Not routed.
    Off,
}

impl RouteState {
    pub fn is_off(&self) -> bool {
        matches!(self, RouteState::Off)
    }
}

impl std::fmt::Display for RouteState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RouteState::Gain(gain) => write!(f, "{gain}dB"),
            RouteState::Off => write!(f, "Off"),
        }
    }
}

/// The advanced routing matrix.
///
/// Wire form: an object keyed by input channel code, each value a route
/// sequence. A missing key means the input feeds its own channel at 0 dB.
/// An **empty** sequence is not the same thing: it records that the user
/// disabled that identity route, and must survive a reload.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AdvancedRouting {
    #[serde(flatten)]
    pub routes: BTreeMap<Channel, Vec<Route>>,
}

impl AdvancedRouting {
    /// Resolve an input/output pair.
    pub fn route_state(&self, input: Channel, output: Channel) -> RouteState {
        match self.routes.get(&input) {
            Some(routes) => routes
                .iter()
                .find(|route| route.out == output)
                .map(|route| RouteState::Gain(route.gain))
                .unwrap_or(RouteState::Off),
            None if input == output => RouteState::Gain(0.0),
            None => RouteState::Off,
        }
    }

    /// Disable a route. Disabling an implicit identity route inserts the
    /// empty sequence, so the default stays off after a reload; otherwise
    /// the matching entry is removed and an emptied sequence stays behind
    /// as that same marker.
    pub fn disable_route(&mut self, input: Channel, output: Channel) {
        match self.routes.get_mut(&input) {
            Some(routes) => routes.retain(|route| route.out != output),
            None => {
                if input == output {
                    self.routes.insert(input, Vec::new());
                }
            }
        }
    }

    /// Enable a route at 0 dB. Re-enabling an identity route that holds the
    /// empty disable marker removes the key, restoring the implicit
    /// default. Pairs that are already routed are left alone.
    pub fn enable_route(&mut self, input: Channel, output: Channel) {
        if !self.route_state(input, output).is_off() {
            return;
        }
        if input == output {
            if let Some(routes) = self.routes.get(&input) {
                if routes.is_empty() {
                    self.routes.remove(&input);
                    return;
                }
            }
        }
        self.routes.entry(input).or_default().push(Route {
            out: output,
            gain: 0.0,
        });
    }

    /// Set a pair's gain, materializing the route when the pair is
    /// currently implicit or off.
    pub fn set_gain(&mut self, input: Channel, output: Channel, gain: f64) {
        let routes = self.routes.entry(input).or_default();
        match routes.iter_mut().find(|route| route.out == output) {
            Some(route) => route.gain = gain,
            None => routes.push(Route { out: output, gain }),
        }
    }
}
