//! Basic routing: one role per speaker group plus bass-management flags.

use crate::crossover::Crossover;
use serde::{Deserialize, Serialize};

/// What a speaker group does in the basic routing scheme.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SpeakerRole {
    /// Full-range speaker, plays its channel unfiltered.
    Large,
    /// Bass-managed speaker, low content is redirected to the subwoofers.
    Small,
    /// The group's outputs act as subwoofers.
    Sub,
    /// Not connected.
    Off,
}

impl SpeakerRole {
    /// True for roles that are actual speakers.
    pub fn is_speaker(&self) -> bool {
        matches!(self, SpeakerRole::Large | SpeakerRole::Small)
    }
}

impl std::fmt::Display for SpeakerRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SpeakerRole::Large => write!(f, "Large"),
            SpeakerRole::Small => write!(f, "Small"),
            SpeakerRole::Sub => write!(f, "Sub"),
            SpeakerRole::Off => write!(f, "Off"),
        }
    }
}

/// The five role positions of the basic scheme.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoleSlot {
    Front,
    Center,
    Subwoofer,
    Surround,
    SurroundBack,
}

impl RoleSlot {
    /// All slots in display order.
    pub const ALL: [RoleSlot; 5] = [
        RoleSlot::Front,
        RoleSlot::Center,
        RoleSlot::Subwoofer,
        RoleSlot::Surround,
        RoleSlot::SurroundBack,
    ];

    /// Roles a selector may offer for this slot. The front pair is always a
    /// speaker and the subwoofer slot never is.
    pub fn allowed_roles(&self) -> &'static [SpeakerRole] {
        match self {
            RoleSlot::Front => &[SpeakerRole::Large, SpeakerRole::Small],
            RoleSlot::Subwoofer => &[SpeakerRole::Sub, SpeakerRole::Off],
            _ => &[
                SpeakerRole::Large,
                SpeakerRole::Small,
                SpeakerRole::Sub,
                SpeakerRole::Off,
            ],
        }
    }

    /// Row label.
    pub fn label(&self) -> &'static str {
        match self {
            RoleSlot::Front => "Front",
            RoleSlot::Center => "Center",
            RoleSlot::Subwoofer => "Subwoofer",
            RoleSlot::Surround => "Surround",
            RoleSlot::SurroundBack => "Surround back",
        }
    }
}

/// Speaker roles and bass management for the basic routing mode.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BasicRouting {
    #[serde(default = "default_large")]
    pub front: SpeakerRole,
    #[serde(default = "default_large")]
    pub center: SpeakerRole,
    #[serde(default = "default_sub")]
    pub subwoofer: SpeakerRole,
    #[serde(default = "default_large")]
    pub surround: SpeakerRole,
    #[serde(default = "default_large")]
    pub surround_back: SpeakerRole,
    /// Gain applied to the LFE channel, dB.
    #[serde(default)]
    pub lfe_gain: f64,
    /// Split redirected bass into a left/right subwoofer pair instead of
    /// summing it. Only meaningful with an even, non-zero subwoofer count.
    #[serde(default)]
    pub stereo_bass: bool,
    /// Feed side surround content to the back pair as well. Needs speakers
    /// in both surround slots.
    #[serde(default)]
    pub expand_surround: bool,
    /// Applied to redirected bass; live while any slot is `Sub`.
    #[serde(default = "Crossover::default_low_pass")]
    pub low_pass: Crossover,
    /// Applied to `Small` speakers; live while any slot is `Small`.
    #[serde(default = "Crossover::default_high_pass")]
    pub high_pass: Crossover,
}

fn default_large() -> SpeakerRole {
    SpeakerRole::Large
}

fn default_sub() -> SpeakerRole {
    SpeakerRole::Sub
}

impl Default for BasicRouting {
    fn default() -> Self {
        Self {
            front: default_large(),
            center: default_large(),
            subwoofer: default_sub(),
            surround: default_large(),
            surround_back: default_large(),
            lfe_gain: 0.0,
            stereo_bass: false,
            expand_surround: false,
            low_pass: Crossover::default_low_pass(),
            high_pass: Crossover::default_high_pass(),
        }
    }
}

impl BasicRouting {
    /// Current role of a slot.
    pub fn role(&self, slot: RoleSlot) -> SpeakerRole {
        match slot {
            RoleSlot::Front => self.front,
            RoleSlot::Center => self.center,
            RoleSlot::Subwoofer => self.subwoofer,
            RoleSlot::Surround => self.surround,
            RoleSlot::SurroundBack => self.surround_back,
        }
    }

    fn role_mut(&mut self, slot: RoleSlot) -> &mut SpeakerRole {
        match slot {
            RoleSlot::Front => &mut self.front,
            RoleSlot::Center => &mut self.center,
            RoleSlot::Subwoofer => &mut self.subwoofer,
            RoleSlot::Surround => &mut self.surround,
            RoleSlot::SurroundBack => &mut self.surround_back,
        }
    }

    /// Assign a role to a slot. A role the slot does not allow is rejected;
    /// otherwise the role is applied and any flag the change just made
    /// ineligible is cleared in the same update.
    pub fn set_role(&mut self, slot: RoleSlot, role: SpeakerRole) -> bool {
        if !slot.allowed_roles().contains(&role) {
            return false;
        }
        *self.role_mut(slot) = role;
        if self.stereo_bass && !self.stereo_bass_eligible() {
            self.stereo_bass = false;
        }
        if self.expand_surround && !self.expand_surround_eligible() {
            self.expand_surround = false;
        }
        true
    }

    /// Subwoofer drivers implied by the roles: the surround slots are
    /// stereo pairs, center and the subwoofer slot are single drivers.
    pub fn virtual_subwoofer_count(&self) -> u32 {
        let mut count = 0;
        if self.center == SpeakerRole::Sub {
            count += 1;
        }
        if self.subwoofer == SpeakerRole::Sub {
            count += 1;
        }
        if self.surround == SpeakerRole::Sub {
            count += 2;
        }
        if self.surround_back == SpeakerRole::Sub {
            count += 2;
        }
        count
    }

    /// Stereo bass needs subwoofers that pair up left/right.
    pub fn stereo_bass_eligible(&self) -> bool {
        let count = self.virtual_subwoofer_count();
        count > 0 && count % 2 == 0
    }

    /// Expanding surround needs speakers in both surround slots.
    pub fn expand_surround_eligible(&self) -> bool {
        self.surround.is_speaker() && self.surround_back.is_speaker()
    }

    /// Turn stereo bass on or off; turning it on is rejected while
    /// ineligible.
    pub fn set_stereo_bass(&mut self, on: bool) -> bool {
        if on && !self.stereo_bass_eligible() {
            return false;
        }
        self.stereo_bass = on;
        true
    }

    /// Turn surround expansion on or off; turning it on is rejected while
    /// ineligible.
    pub fn set_expand_surround(&mut self, on: bool) -> bool {
        if on && !self.expand_surround_eligible() {
            return false;
        }
        self.expand_surround = on;
        true
    }

    /// Whether any slot currently holds the given role.
    pub fn has_role(&self, role: SpeakerRole) -> bool {
        RoleSlot::ALL.iter().any(|slot| self.role(*slot) == role)
    }

    /// The shared low-pass applies while bass is redirected anywhere.
    pub fn low_pass_active(&self) -> bool {
        self.has_role(SpeakerRole::Sub)
    }

    /// The shared high-pass applies while any speaker is bass-managed.
    pub fn high_pass_active(&self) -> bool {
        self.has_role(SpeakerRole::Small)
    }
}
