//! Crossover records, shared by basic routing and standalone filter
//! definitions.

use serde::{Deserialize, Serialize};

/// Default Q for newly created second-order sections.
pub const DEFAULT_Q: f64 = 0.707;

/// Crossover alignment family, the wire value of `crossoverType`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CrossoverType {
    #[default]
    Butterworth,
    LinkwitzRiley,
    Bessel,
    Custom,
}

impl CrossoverType {
    /// All families in selector order.
    pub const ALL: [CrossoverType; 4] = [
        CrossoverType::Butterworth,
        CrossoverType::LinkwitzRiley,
        CrossoverType::Bessel,
        CrossoverType::Custom,
    ];

    /// Filter orders this family supports.
    pub fn legal_orders(&self) -> &'static [u8] {
        match self {
            CrossoverType::Butterworth | CrossoverType::Custom => &[1, 2, 3, 4, 5, 6, 7, 8],
            CrossoverType::LinkwitzRiley => &[2, 4, 8],
            CrossoverType::Bessel => &[2, 3, 4, 5, 6, 7, 8],
        }
    }

    /// Lowest legal order, used when a switch invalidates the current one.
    pub fn first_legal_order(&self) -> u8 {
        self.legal_orders()[0]
    }

    /// Display name.
    pub fn label(&self) -> &'static str {
        match self {
            CrossoverType::Butterworth => "Butterworth",
            CrossoverType::LinkwitzRiley => "Linkwitz-Riley",
            CrossoverType::Bessel => "Bessel",
            CrossoverType::Custom => "Custom",
        }
    }
}

/// Alignment family together with its Q representation.
///
/// The named families carry a scalar offset the DSP applies to its own Q
/// tables; `Custom` carries one explicit Q per second-order section. Keying
/// the representation on the family makes "exactly one of `qOffset`/`q`"
/// impossible to violate.
#[derive(Debug, Clone, PartialEq)]
pub enum Alignment {
    Butterworth { q_offset: f64 },
    LinkwitzRiley { q_offset: f64 },
    Bessel { q_offset: f64 },
    Custom { q: Vec<f64> },
}

impl Alignment {
    /// The family tag for this alignment.
    pub fn crossover_type(&self) -> CrossoverType {
        match self {
            Alignment::Butterworth { .. } => CrossoverType::Butterworth,
            Alignment::LinkwitzRiley { .. } => CrossoverType::LinkwitzRiley,
            Alignment::Bessel { .. } => CrossoverType::Bessel,
            Alignment::Custom { .. } => CrossoverType::Custom,
        }
    }

    /// Scalar Q offset, for the named families.
    pub fn q_offset(&self) -> Option<f64> {
        match self {
            Alignment::Butterworth { q_offset }
            | Alignment::LinkwitzRiley { q_offset }
            | Alignment::Bessel { q_offset } => Some(*q_offset),
            Alignment::Custom { .. } => None,
        }
    }

    /// Per-section Q values, for `Custom`.
    pub fn q_values(&self) -> Option<&[f64]> {
        match self {
            Alignment::Custom { q } => Some(q),
            _ => None,
        }
    }
}

/// A low- or high-pass crossover: alignment, corner frequency and order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "CrossoverRepr", into = "CrossoverRepr")]
pub struct Crossover {
    /// Alignment family and its Q representation.
    pub alignment: Alignment,
    /// Corner frequency in Hz.
    pub freq: f64,
    /// Filter order, always within the alignment's legal set.
    pub order: u8,
}

impl Crossover {
    /// A crossover of the given family at its init Q values. An order the
    /// family does not support falls back to its first legal order.
    pub fn new(crossover_type: CrossoverType, freq: f64, order: u8) -> Self {
        let order = coerce_order(crossover_type, order);
        let alignment = match crossover_type {
            CrossoverType::Butterworth => Alignment::Butterworth { q_offset: 0.0 },
            CrossoverType::LinkwitzRiley => Alignment::LinkwitzRiley { q_offset: 0.0 },
            CrossoverType::Bessel => Alignment::Bessel { q_offset: 0.0 },
            CrossoverType::Custom => {
                let mut q = Vec::new();
                resize_q(&mut q, order);
                Alignment::Custom { q }
            }
        };
        Self {
            alignment,
            freq,
            order,
        }
    }

    /// Init values for a low-pass crossover.
    pub fn default_low_pass() -> Self {
        Self::new(CrossoverType::Butterworth, 80.0, 5)
    }

    /// Init values for a high-pass crossover.
    pub fn default_high_pass() -> Self {
        Self::new(CrossoverType::Butterworth, 80.0, 3)
    }

    /// The alignment family tag.
    pub fn crossover_type(&self) -> CrossoverType {
        self.alignment.crossover_type()
    }

    /// Switch alignment family.
    ///
    /// The scalar Q offset survives moves between the named families; a move
    /// into `Custom` builds one default Q per section, and a move out of it
    /// starts the offset at zero. An order illegal for the new family resets
    /// to the family's first legal order.
    pub fn set_crossover_type(&mut self, crossover_type: CrossoverType) {
        if crossover_type == self.crossover_type() {
            return;
        }
        if !crossover_type.legal_orders().contains(&self.order) {
            self.order = crossover_type.first_legal_order();
        }
        let q_offset = self.alignment.q_offset().unwrap_or(0.0);
        self.alignment = match crossover_type {
            CrossoverType::Butterworth => Alignment::Butterworth { q_offset },
            CrossoverType::LinkwitzRiley => Alignment::LinkwitzRiley { q_offset },
            CrossoverType::Bessel => Alignment::Bessel { q_offset },
            CrossoverType::Custom => {
                let mut q = Vec::new();
                resize_q(&mut q, self.order);
                Alignment::Custom { q }
            }
        };
    }

    /// Set the filter order. Rejected when the alignment does not support
    /// it; under `Custom` the Q list is resized, keeping existing values.
    pub fn set_order(&mut self, order: u8) -> bool {
        if !self.crossover_type().legal_orders().contains(&order) {
            return false;
        }
        self.order = order;
        if let Alignment::Custom { q } = &mut self.alignment {
            resize_q(q, order);
        }
        true
    }

    /// Set the scalar Q offset. Rejected under `Custom`.
    pub fn set_q_offset(&mut self, value: f64) -> bool {
        match &mut self.alignment {
            Alignment::Butterworth { q_offset }
            | Alignment::LinkwitzRiley { q_offset }
            | Alignment::Bessel { q_offset } => {
                *q_offset = value;
                true
            }
            Alignment::Custom { .. } => false,
        }
    }

    /// Set one section's Q value. Rejected outside `Custom` or out of range.
    pub fn set_q_value(&mut self, section: usize, value: f64) -> bool {
        match &mut self.alignment {
            Alignment::Custom { q } if section < q.len() => {
                q[section] = value;
                true
            }
            _ => false,
        }
    }

    /// Slope implied by the order, in dB per octave.
    pub fn slope_db_per_octave(&self) -> u16 {
        u16::from(self.order) * 6
    }
}

fn coerce_order(crossover_type: CrossoverType, order: u8) -> u8 {
    if crossover_type.legal_orders().contains(&order) {
        order
    } else {
        crossover_type.first_legal_order()
    }
}

/// One Q per second-order section: grow with defaults, shrink from the end,
/// never touch surviving entries.
fn resize_q(q: &mut Vec<f64>, order: u8) {
    q.resize(usize::from(order / 2), DEFAULT_Q);
}

/// Wire form: `crossoverType`, `freq`, `order`, and `qOffset` or `q`
/// depending on the family.
#[derive(Serialize, Deserialize)]
struct CrossoverRepr {
    #[serde(rename = "crossoverType", default)]
    crossover_type: CrossoverType,
    #[serde(default)]
    freq: f64,
    #[serde(default)]
    order: u8,
    #[serde(rename = "qOffset", default, skip_serializing_if = "Option::is_none")]
    q_offset: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    q: Option<Vec<f64>>,
}

impl From<CrossoverRepr> for Crossover {
    fn from(repr: CrossoverRepr) -> Self {
        let order = coerce_order(repr.crossover_type, repr.order);
        let q_offset = repr.q_offset.unwrap_or(0.0);
        let alignment = match repr.crossover_type {
            CrossoverType::Butterworth => Alignment::Butterworth { q_offset },
            CrossoverType::LinkwitzRiley => Alignment::LinkwitzRiley { q_offset },
            CrossoverType::Bessel => Alignment::Bessel { q_offset },
            CrossoverType::Custom => {
                let mut q = repr.q.unwrap_or_default();
                resize_q(&mut q, order);
                Alignment::Custom { q }
            }
        };
        Crossover {
            alignment,
            freq: repr.freq,
            order,
        }
    }
}

impl From<Crossover> for CrossoverRepr {
    fn from(crossover: Crossover) -> Self {
        let crossover_type = crossover.crossover_type();
        let (q_offset, q) = match crossover.alignment {
            Alignment::Butterworth { q_offset }
            | Alignment::LinkwitzRiley { q_offset }
            | Alignment::Bessel { q_offset } => (Some(q_offset), None),
            Alignment::Custom { q } => (None, Some(q)),
        };
        CrossoverRepr {
            crossover_type,
            freq: crossover.freq,
            order: crossover.order,
            q_offset,
            q,
        }
    }
}
