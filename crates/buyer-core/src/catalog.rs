//! Asset catalog with per-turn price drift

use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// An asset the buyer can purchase
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Asset {
    pub name: String,
    pub description: String,
    /// Current price in whole currency units
    pub price: u64,
}

impl Asset {
    pub fn new(name: impl Into<String>, description: impl Into<String>, price: u64) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            price,
        }
    }

    /// The five assets on offer when nothing is configured
    pub fn defaults() -> Vec<Asset> {
        vec![
            Asset::new("Laptop", "A portable computer for work and personal use.", 1_200),
            Asset::new(
                "Smartphone",
                "A mobile device for communication and internet access.",
                800,
            ),
            Asset::new("Car", "A vehicle for transportation.", 25_000),
            Asset::new("House", "A residential property for living.", 350_000),
            Asset::new("Stock", "A share of ownership in a company.", 150),
        ]
    }

    /// "Name: description", as announced to the buyer
    pub fn summary(&self) -> String {
        format!("{}: {}", self.name, self.description)
    }
}

/// Ordered collection of assets keyed by name
#[derive(Debug, Clone)]
pub struct Catalog {
    assets: Vec<Asset>,
}

impl Default for Catalog {
    fn default() -> Self {
        Self::from_assets(Asset::defaults())
    }
}

impl Catalog {
    pub fn from_assets(assets: Vec<Asset>) -> Self {
        Self { assets }
    }

    /// Case-insensitive lookup by name
    pub fn get(&self, name: &str) -> Option<&Asset> {
        self.assets
            .iter()
            .find(|a| a.name.eq_ignore_ascii_case(name.trim()))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Asset> {
        self.assets.iter()
    }

    pub fn len(&self) -> usize {
        self.assets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assets.is_empty()
    }

    /// Move every price to a uniformly random integer within `percent` of
    /// its current value.
    ///
    /// The band is `floor(price * percent / 100)` on each side, so the new
    /// price never leaves `[0.95p, 1.05p]` for the default of 5. Bands wider
    /// than the price are clamped so prices bottom out at zero.
    pub fn apply_drift<R: Rng + ?Sized>(&mut self, rng: &mut R, percent: u64) {
        for asset in &mut self.assets {
            let band = (asset.price.saturating_mul(percent) / 100).min(asset.price);
            let low = asset.price - band;
            let high = asset.price.saturating_add(band);
            let old = asset.price;
            asset.price = rng.gen_range(low..=high);
            debug!(asset = %asset.name, old, new = asset.price, "price_drift");
        }
    }

    /// One line per asset with its current price, for prompts and listings
    pub fn describe(&self) -> String {
        self.assets
            .iter()
            .map(|a| format!("{}: {} Price: {}.", a.name, a.description, a.price))
            .collect::<Vec<_>>()
            .join("\n")
    }
}
