//! The fixed eight-channel registry.

use serde::{Deserialize, Serialize};

#[cfg(feature = "openapi")]
use utoipa::ToSchema;

/// One of the eight routable audio channels.
///
/// Declaration order is the canonical order used for display and iteration,
/// and `Ord` follows it, so sorted channel collections come out canonical
/// for free. The serialized form is the short code (`"L"`, `"SBR"`, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
pub enum Channel {
    /// Front left
    L,
    /// Front right
    R,
    /// Center
    C,
    /// Subwoofer
    SW,
    /// Surround left
    SL,
    /// Surround right
    SR,
    /// Surround back left
    SBL,
    /// Surround back right
    SBR,
}

impl Channel {
    /// All channels in canonical order.
    pub const ALL: [Channel; 8] = [
        Channel::L,
        Channel::R,
        Channel::C,
        Channel::SW,
        Channel::SL,
        Channel::SR,
        Channel::SBL,
        Channel::SBR,
    ];

    /// The short code used on the wire and in route maps.
    pub fn code(&self) -> &'static str {
        match self {
            Channel::L => "L",
            Channel::R => "R",
            Channel::C => "C",
            Channel::SW => "SW",
            Channel::SL => "SL",
            Channel::SR => "SR",
            Channel::SBL => "SBL",
            Channel::SBR => "SBR",
        }
    }

    /// The full name shown to users.
    pub fn name(&self) -> &'static str {
        match self {
            Channel::L => "Front left",
            Channel::R => "Front right",
            Channel::C => "Center",
            Channel::SW => "Subwoofer",
            Channel::SL => "Surround left",
            Channel::SR => "Surround right",
            Channel::SBL => "Surround back left",
            Channel::SBR => "Surround back right",
        }
    }

    /// Position in the canonical order.
    pub fn index(&self) -> usize {
        *self as usize
    }

    /// Look up a channel by its short code.
    pub fn from_code(code: &str) -> Option<Channel> {
        Self::ALL.iter().copied().find(|c| c.code() == code)
    }

    /// Look up a channel by its full name.
    pub fn from_name(name: &str) -> Option<Channel> {
        Self::ALL.iter().copied().find(|c| c.name() == name)
    }
}

impl std::fmt::Display for Channel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}
