//! Sample registry for named position lookup.

use tracing::error;

use crate::config::{SampleTable, StageConfig, StagePosition};
use crate::error::{ConfigError, Error, Result};

use super::id::{FieldType, SampleId, SampleKey, SAMPLES_PER_FIELD};

const SLOTS: usize = SAMPLES_PER_FIELD as usize;

/// Read-only map from sample slots to stage coordinates.
///
/// Built once from the configured table. Holds exactly ten LPF and ten HPF
/// positions, so every [`SampleId`] resolves.
#[derive(Debug, Clone)]
pub struct SampleRegistry {
    home: StagePosition,
    slots: [[StagePosition; SLOTS]; 2],
}

impl SampleRegistry {
    /// Build the registry from a sample table.
    ///
    /// # Errors
    ///
    /// Returns an error if a key is not a sample name, a coordinate is not
    /// finite, or any numbered slot is missing.
    pub fn from_table(table: &SampleTable) -> Result<Self> {
        let mut home = StagePosition::default();
        let mut slots: [[Option<StagePosition>; SLOTS]; 2] = [[None; SLOTS]; 2];

        for (name, position) in table.iter() {
            let key = SampleKey::parse(name.as_str())
                .ok_or_else(|| ConfigError::UnknownSample(name.to_string()))?;

            if !position.is_finite() {
                return Err(ConfigError::InvalidCoordinate(name.to_string()).into());
            }

            match key {
                SampleKey::Home => home = *position,
                SampleKey::Slot(id) => {
                    slots[id.field().index()][id.index() as usize - 1] = Some(*position)
                }
            }
        }

        let mut resolved = [[StagePosition::default(); SLOTS]; 2];
        for id in SampleId::sequence() {
            let (field, slot) = (id.field().index(), id.index() as usize - 1);
            resolved[field][slot] =
                slots[field][slot].ok_or_else(|| ConfigError::MissingSample(id.to_string()))?;
        }

        Ok(Self {
            home,
            slots: resolved,
        })
    }

    /// Build the registry from a stage configuration.
    pub fn from_config(config: &StageConfig) -> Result<Self> {
        Self::from_table(&config.samples)
    }

    /// Coordinates of a slot.
    #[inline]
    pub fn get(&self, id: SampleId) -> StagePosition {
        self.slots[id.field().index()][id.index() as usize - 1]
    }

    /// Coordinates by name; accepts the `lpf` home alias.
    pub fn lookup(&self, name: &str) -> Option<StagePosition> {
        match SampleKey::parse(name)? {
            SampleKey::Home => Some(self.home),
            SampleKey::Slot(id) => Some(self.get(id)),
        }
    }

    /// Coordinates by name, with [`Error::NotFound`] on a miss.
    pub fn get_or_error(&self, name: &str) -> Result<StagePosition> {
        self.lookup(name)
            .ok_or_else(|| Error::NotFound(name.to_string()))
    }

    /// Resolve an external `(mode, sample_number)` pair.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidMode`] unless `mode` is `lpf` or `hpf`
    /// - [`Error::NotFound`] if the slot number is outside `1..=10`
    pub fn resolve(&self, mode: &str, sample_number: u32) -> Result<(SampleId, StagePosition)> {
        let field: FieldType = mode.parse()?;
        let id = SampleId::new(field, sample_number)
            .ok_or_else(|| Error::NotFound(format!("{}_{}", field, sample_number)))?;
        Ok((id, self.get(id)))
    }

    /// Coordinates of the `lpf` home alias.
    #[inline]
    pub fn home(&self) -> StagePosition {
        self.home
    }

    /// Number of numbered slots.
    #[inline]
    pub fn len(&self) -> usize {
        super::TOTAL_SAMPLES
    }

    /// Never empty; present for API symmetry with `len`.
    #[inline]
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Slots and coordinates in acquisition order.
    pub fn iter(&self) -> impl Iterator<Item = (SampleId, StagePosition)> + '_ {
        SampleId::sequence().map(move |id| (id, self.get(id)))
    }
}

impl Default for SampleRegistry {
    /// The stock slide layout.
    fn default() -> Self {
        Self::from_table(&crate::config::default_sample_table()).unwrap_or_else(|e| {
            error!(error = %e, "Built-in sample table is invalid; using the origin for every slot");
            Self {
                home: StagePosition::default(),
                slots: [[StagePosition::default(); SLOTS]; 2],
            }
        })
    }
}
