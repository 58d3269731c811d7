//! Region and comuna lookup, plus first-run seeding.

use std::collections::HashMap;

use common::RegionId;
use domain::{Comuna, Region};
use store::{Store, StoreError};

use crate::error::{Result, ServiceError};

/// A region with its active comunas.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegionWithComunas {
    pub region: Region,
    pub comunas: Vec<Comuna>,
}

/// A comuna with the name of its region.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComunaView {
    pub comuna: Comuna,
    pub region_name: String,
}

pub struct LocationService<S: Store> {
    store: S,
}

impl<S: Store> LocationService<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Inserts the Chilean regions and comunas unless any region exists.
    ///
    /// The whole set is written in one unit of work, so a failed seed leaves
    /// no regions behind and the next start tries again. Losing a race with
    /// another instance seeding at the same time counts as already seeded.
    ///
    /// Returns the number of regions inserted.
    #[tracing::instrument(skip(self))]
    pub async fn seed_if_empty(&self) -> Result<usize> {
        if self.store.count_regions().await? > 0 {
            tracing::debug!("Regions already present, skipping seed");
            return Ok(0);
        }

        let regions = domain::location::chile();
        let region_count = regions.len();
        let comuna_count: usize = regions.iter().map(|(_, comunas)| comunas.len()).sum();
        match self.store.insert_regions(regions).await {
            Ok(()) => {}
            Err(StoreError::Conflict(reason)) => {
                tracing::warn!(%reason, "Regions seeded concurrently, skipping seed");
                return Ok(0);
            }
            Err(e) => return Err(e.into()),
        }
        tracing::info!(
            regions = region_count,
            comunas = comuna_count,
            "Seeded regions and comunas"
        );
        Ok(region_count)
    }

    /// Active regions in code order.
    pub async fn regions(&self) -> Result<Vec<Region>> {
        Ok(self.store.list_regions(true).await?)
    }

    pub async fn regions_with_comunas(&self) -> Result<Vec<RegionWithComunas>> {
        let regions = self.store.list_regions(true).await?;
        let mut by_region: HashMap<RegionId, Vec<Comuna>> = HashMap::new();
        for comuna in self.store.list_comunas(None, true).await? {
            by_region.entry(comuna.region_id).or_default().push(comuna);
        }
        Ok(regions
            .into_iter()
            .map(|region| RegionWithComunas {
                comunas: by_region.remove(&region.id).unwrap_or_default(),
                region,
            })
            .collect())
    }

    pub async fn region(&self, id: RegionId) -> Result<RegionWithComunas> {
        let region = self
            .store
            .get_region(id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Region", id))?;
        let comunas = self.store.list_comunas(Some(id), true).await?;
        Ok(RegionWithComunas { region, comunas })
    }

    pub async fn comunas_of_region(&self, id: RegionId) -> Result<Vec<ComunaView>> {
        let RegionWithComunas { region, comunas } = self.region(id).await?;
        Ok(comunas
            .into_iter()
            .map(|comuna| ComunaView {
                comuna,
                region_name: region.name.clone(),
            })
            .collect())
    }

    /// Every active comuna, by name.
    pub async fn comunas(&self) -> Result<Vec<ComunaView>> {
        let names: HashMap<RegionId, String> = self
            .store
            .list_regions(false)
            .await?
            .into_iter()
            .map(|region| (region.id, region.name))
            .collect();
        Ok(self
            .store
            .list_comunas(None, true)
            .await?
            .into_iter()
            .map(|comuna| ComunaView {
                region_name: names.get(&comuna.region_id).cloned().unwrap_or_default(),
                comuna,
            })
            .collect())
    }
}
