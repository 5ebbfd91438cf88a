//! Output definitions: the speaker-side endpoints of the router.

use crate::channel::Channel;
use crate::filter::{FilterRef, OutputFilter};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Output delay.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", from = "DelayRepr")]
pub struct Delay {
    pub value: f64,
    /// Interpret `value` as meters of listening distance instead of
    /// milliseconds.
    pub unit_in_meter: bool,
}

/// Older documents stored the delay as a bare number of milliseconds.
#[derive(Deserialize)]
#[serde(untagged)]
enum DelayRepr {
    Record {
        #[serde(default)]
        value: f64,
        #[serde(rename = "unitInMeter", default)]
        unit_in_meter: bool,
    },
    Legacy(f64),
}

impl From<DelayRepr> for Delay {
    fn from(repr: DelayRepr) -> Self {
        match repr {
            DelayRepr::Record {
                value,
                unit_in_meter,
            } => Delay {
                value,
                unit_in_meter,
            },
            DelayRepr::Legacy(value) => Delay {
                value,
                unit_in_meter: false,
            },
        }
    }
}

/// Dynamic range compression, present while enabled on an output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Compression {
    /// Level above which compression kicks in, dB.
    #[serde(default)]
    pub threshold: f64,
    #[serde(default = "default_ratio")]
    pub ratio: f64,
    /// Attack time, ms.
    #[serde(default = "default_attack")]
    pub attack: f64,
    /// Release time, ms.
    #[serde(default = "default_release")]
    pub release: f64,
    /// Level detection window, ms.
    #[serde(default = "default_window")]
    pub window: f64,
}

fn default_ratio() -> f64 {
    0.5
}

fn default_attack() -> f64 {
    1.0
}

fn default_release() -> f64 {
    100.0
}

fn default_window() -> f64 {
    1.0
}

impl Default for Compression {
    fn default() -> Self {
        Self {
            threshold: 0.0,
            ratio: default_ratio(),
            attack: default_attack(),
            release: default_release(),
            window: default_window(),
        }
    }
}

/// Driver cancellation notch, present while enabled on an output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Cancellation {
    #[serde(default)]
    pub freq: f64,
    #[serde(default)]
    pub gain: f64,
}

/// One physical output: the channels it drives and its processing chain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", from = "OutputRepr")]
pub struct Output {
    /// Channels this output drives. Mutations keep the list in canonical
    /// order.
    pub channels: Vec<Channel>,
    /// Output gain, dB.
    pub gain: f64,
    pub mute: bool,
    /// Invert polarity.
    pub invert: bool,
    pub delay: Delay,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub compression: Option<Compression>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cancellation: Option<Cancellation>,
    /// Processing chain: inline definitions and store references, in order.
    pub filters: Vec<OutputFilter>,
}

/// Wire form, including the legacy singular `channel` key.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct OutputRepr {
    #[serde(default)]
    channel: Option<Channel>,
    #[serde(default)]
    channels: Option<Vec<Channel>>,
    #[serde(default)]
    gain: f64,
    #[serde(default)]
    mute: bool,
    #[serde(default)]
    invert: bool,
    #[serde(default)]
    delay: Delay,
    #[serde(default)]
    compression: Option<Compression>,
    #[serde(default)]
    cancellation: Option<Cancellation>,
    #[serde(default)]
    filters: Vec<OutputFilter>,
}

impl From<OutputRepr> for Output {
    fn from(repr: OutputRepr) -> Self {
        let channels = match (repr.channels, repr.channel) {
            (Some(channels), _) => channels,
            (None, Some(single)) => vec![single],
            (None, None) => Vec::new(),
        };
        Output {
            channels,
            gain: repr.gain,
            mute: repr.mute,
            invert: repr.invert,
            delay: repr.delay,
            compression: repr.compression,
            cancellation: repr.cancellation,
            filters: repr.filters,
        }
    }
}

impl Output {
    /// An output driving the given channels, everything else at defaults.
    pub fn with_channels(channels: Vec<Channel>) -> Self {
        Self {
            channels,
            gain: 0.0,
            mute: false,
            invert: false,
            delay: Delay::default(),
            compression: None,
            cancellation: None,
            filters: Vec::new(),
        }
    }

    /// Toggle a channel on this output against the set of channels claimed
    /// anywhere. Removing is always allowed; adding is rejected while any
    /// output holds the channel. Additions re-sort into canonical order.
    pub fn toggle_channel(&mut self, channel: Channel, used: &BTreeSet<Channel>) -> bool {
        if let Some(at) = self.channels.iter().position(|c| *c == channel) {
            self.channels.remove(at);
            return true;
        }
        if used.contains(&channel) {
            return false;
        }
        self.channels.push(channel);
        self.channels.sort();
        true
    }

    /// Store names referenced by this output's chain. Inline definitions
    /// have no name and do not appear.
    pub fn referenced_filter_names(&self) -> BTreeSet<String> {
        self.filters
            .iter()
            .filter_map(|filter| filter.ref_name().map(str::to_string))
            .collect()
    }

    /// Append a reference to the named store definition.
    pub fn import_filter(&mut self, name: &str) {
        self.filters.push(OutputFilter::Ref(FilterRef::named(name)));
    }

    /// Remove the chain element at `index`.
    pub fn remove_filter(&mut self, index: usize) -> Option<OutputFilter> {
        if index < self.filters.len() {
            Some(self.filters.remove(index))
        } else {
            None
        }
    }

    /// Enable compression at its init values, or disable it. Enabling while
    /// already enabled keeps the current parameters.
    pub fn set_compression(&mut self, on: bool) {
        if on {
            if self.compression.is_none() {
                self.compression = Some(Compression::default());
            }
        } else {
            self.compression = None;
        }
    }

    /// Enable cancellation at its init values, or disable it.
    pub fn set_cancellation(&mut self, on: bool) {
        if on {
            if self.cancellation.is_none() {
                self.cancellation = Some(Cancellation::default());
            }
        } else {
            self.cancellation = None;
        }
    }
}

/// Channels claimed by any output.
pub fn used_channels(outputs: &[Output]) -> BTreeSet<Channel> {
    outputs
        .iter()
        .flat_map(|output| output.channels.iter().copied())
        .collect()
}
