//! Regions and comunas used for addresses.

mod chile;

use common::{ComunaId, RegionId};
use serde::{Deserialize, Serialize};

/// A first-level administrative region. Owns its comunas.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Region {
    pub id: RegionId,
    pub name: String,
    /// Two-digit code, `"01"` for the northernmost region.
    pub code: String,
    pub active: bool,
}

/// A municipality inside a region.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comuna {
    pub id: ComunaId,
    pub name: String,
    pub region_id: RegionId,
    pub active: bool,
}

impl Region {
    pub fn new(name: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            id: RegionId::new(),
            name: name.into(),
            code: code.into(),
            active: true,
        }
    }
}

impl Comuna {
    pub fn new(name: impl Into<String>, region_id: RegionId) -> Self {
        Self {
            id: ComunaId::new(),
            name: name.into(),
            region_id,
            active: true,
        }
    }
}

/// Builds the 16 Chilean regions with fresh ids, each paired with its comunas.
pub fn chile() -> Vec<(Region, Vec<Comuna>)> {
    chile::REGIONS
        .iter()
        .enumerate()
        .map(|(index, (name, comunas))| {
            let region = Region::new(*name, format!("{:02}", index + 1));
            let comunas = comunas
                .iter()
                .map(|comuna| Comuna::new(*comuna, region.id))
                .collect();
            (region, comunas)
        })
        .collect()
}
