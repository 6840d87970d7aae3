//! Sample identifiers and acquisition order.

use core::fmt;
use core::str::FromStr;

use serde::{Deserialize, Serialize, Serializer};

use crate::error::Error;

/// Numbered slots per field type.
pub const SAMPLES_PER_FIELD: u8 = 10;

/// Numbered slots across both field types.
pub const TOTAL_SAMPLES: usize = 2 * SAMPLES_PER_FIELD as usize;

/// Microscope field: low-power or high-power.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    /// Low-power field
    Lpf,
    /// High-power field
    Hpf,
}

impl FieldType {
    /// Lowercase name as used in sample identifiers.
    pub const fn as_str(self) -> &'static str {
        match self {
            FieldType::Lpf => "lpf",
            FieldType::Hpf => "hpf",
        }
    }

    /// Uppercase label for operator messages.
    pub const fn label(self) -> &'static str {
        match self {
            FieldType::Lpf => "LPF",
            FieldType::Hpf => "HPF",
        }
    }

    pub(crate) const fn index(self) -> usize {
        match self {
            FieldType::Lpf => 0,
            FieldType::Hpf => 1,
        }
    }
}

impl FromStr for FieldType {
    type Err = Error;

    /// Case-insensitive: `"LPF"` and `"lpf"` are the same mode.
    fn from_str(mode: &str) -> Result<Self, Self::Err> {
        if mode.eq_ignore_ascii_case("lpf") {
            Ok(FieldType::Lpf)
        } else if mode.eq_ignore_ascii_case("hpf") {
            Ok(FieldType::Hpf)
        } else {
            Err(Error::InvalidMode(mode.to_string()))
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A numbered sample slot, `{lpf|hpf}_{1..10}`.
///
/// Always refers to an existing slot; construction checks the index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SampleId {
    field: FieldType,
    index: u8,
}

impl SampleId {
    /// First slot of every collection run.
    pub const FIRST: SampleId = SampleId {
        field: FieldType::Lpf,
        index: 1,
    };

    /// Last slot of every collection run.
    pub const LAST: SampleId = SampleId {
        field: FieldType::Hpf,
        index: SAMPLES_PER_FIELD,
    };

    /// Create a sample id, or `None` if `index` is outside `1..=10`.
    pub fn new(field: FieldType, index: u32) -> Option<Self> {
        if (1..=u32::from(SAMPLES_PER_FIELD)).contains(&index) {
            Some(Self {
                field,
                index: index as u8,
            })
        } else {
            None
        }
    }

    /// Parse `lpf_3` style names. The bare home alias is not a slot.
    pub fn parse(name: &str) -> Option<Self> {
        let (field, index) = name.split_once('_')?;
        let field = match field {
            "lpf" => FieldType::Lpf,
            "hpf" => FieldType::Hpf,
            _ => return None,
        };
        // Reject "lpf_01" and "lpf_+1" so every slot has exactly one name
        if index.starts_with('0') || !index.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        Self::new(field, index.parse().ok()?)
    }

    /// Field type of this slot.
    #[inline]
    pub const fn field(self) -> FieldType {
        self.field
    }

    /// Slot number within its field, `1..=10`.
    #[inline]
    pub const fn index(self) -> u8 {
        self.index
    }

    /// Next slot in acquisition order.
    ///
    /// `lpf_1 .. lpf_10`, then `hpf_1 .. hpf_10`; `None` after `hpf_10`.
    pub fn next(self) -> Option<Self> {
        if self.index < SAMPLES_PER_FIELD {
            return Some(Self {
                field: self.field,
                index: self.index + 1,
            });
        }
        match self.field {
            FieldType::Lpf => Some(Self {
                field: FieldType::Hpf,
                index: 1,
            }),
            FieldType::Hpf => None,
        }
    }

    /// Every slot in acquisition order.
    pub fn sequence() -> impl Iterator<Item = SampleId> {
        core::iter::successors(Some(Self::FIRST), |id| id.next())
    }

    /// Name as a fixed-capacity string.
    pub fn name(self) -> heapless::String<8> {
        use core::fmt::Write;
        let mut name = heapless::String::new();
        let _ = write!(name, "{}", self);
        name
    }
}

impl fmt::Display for SampleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}", self.field, self.index)
    }
}

impl Serialize for SampleId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// A key of the sample table: a numbered slot or the `lpf` home alias.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SampleKey {
    /// The `lpf` alias for the stage origin
    Home,
    /// A numbered slot
    Slot(SampleId),
}

impl SampleKey {
    /// Parse a sample table key.
    pub fn parse(name: &str) -> Option<Self> {
        if name == "lpf" {
            Some(SampleKey::Home)
        } else {
            SampleId::parse(name).map(SampleKey::Slot)
        }
    }
}
