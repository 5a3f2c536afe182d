//! Snapshot store: pre-fetched collaborator responses on disk.
//!
//! Layout of the snapshot directory:
//!
//! ```text
//! snapshots/
//!   securities.json      # [SecurityIdentity, ...]
//!   600519.SH.json       # SecuritySnapshot
//!   000001.SZ.json
//! ```
//!
//! A missing file or section is reported as `DataNotAvailable` for that
//! dataset only, so the aggregator can name the failing step.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::{OnceCell, RwLock};
use tracing::debug;

use super::provider::{
    CompanyProfileProvider, DisclosureDateProvider, FinancialHistoryProvider, OrgRatingProvider,
    PeHistoryProvider, PriceHistoryProvider, ProfitForecastProvider, ProviderError,
    ValuationStatusProvider,
};
use super::{
    CompanyProfile, FinancialHistory, OrgRating, PeHistory, PriceSeries, ProfitForecast,
    SecurityIdentity, ValuationStatus,
};

const LISTING_FILE: &str = "securities.json";

/// Every collaborator response for one security.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SecuritySnapshot {
    #[serde(default)]
    pub financial_history: Option<FinancialHistory>,
    #[serde(default)]
    pub valuation_status: Option<ValuationStatus>,
    #[serde(default)]
    pub pe_history: Option<PeHistory>,
    #[serde(default)]
    pub price_history: Option<PriceSeries>,
    #[serde(default)]
    pub company_profile: Option<CompanyProfile>,
    #[serde(default)]
    pub next_disclosure_date: Option<String>,
    #[serde(default)]
    pub org_ratings: Option<Vec<OrgRating>>,
    #[serde(default)]
    pub profit_forecasts: Option<Vec<ProfitForecast>>,
}

/// File-backed provider serving every dataset.
pub struct SnapshotStore {
    dir: PathBuf,
    listing: OnceCell<Vec<SecurityIdentity>>,
    cache: RwLock<HashMap<String, Arc<SecuritySnapshot>>>,
}

impl SnapshotStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            listing: OnceCell::new(),
            cache: RwLock::new(HashMap::new()),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Read the security listing.
    pub async fn list_securities(&self) -> Result<Vec<SecurityIdentity>, ProviderError> {
        Ok(self.listing().await?.to_vec())
    }

    /// The listing, parsed on first use and kept for the store's lifetime.
    async fn listing(&self) -> Result<&[SecurityIdentity], ProviderError> {
        let listing = self
            .listing
            .get_or_try_init(|| async {
                let path = self.dir.join(LISTING_FILE);
                let content = read_file(&path).await?;
                let listing: Vec<SecurityIdentity> = serde_json::from_str(&content)
                    .map_err(|e| ProviderError::Parse(format!("{}: {}", path.display(), e)))?;
                debug!(path = %path.display(), count = listing.len(), "Loaded listing");
                Ok::<_, ProviderError>(listing)
            })
            .await?;
        Ok(listing)
    }

    /// Load (or reuse) the snapshot of one security.
    pub async fn load(&self, secucode: &str) -> Result<Arc<SecuritySnapshot>, ProviderError> {
        if let Some(snapshot) = self.cache.read().await.get(secucode) {
            return Ok(Arc::clone(snapshot));
        }

        if secucode.is_empty() || secucode.contains(['/', '\\']) || secucode.starts_with('.') {
            return Err(ProviderError::InvalidRequest(format!(
                "invalid security code: {:?}",
                secucode
            )));
        }

        let path = self.dir.join(format!("{}.json", secucode));
        let content = read_file(&path).await?;
        let snapshot: SecuritySnapshot = serde_json::from_str(&content)
            .map_err(|e| ProviderError::Parse(format!("{}: {}", path.display(), e)))?;
        debug!(secucode, path = %path.display(), "Loaded snapshot");

        let snapshot = Arc::new(snapshot);
        self.cache
            .write()
            .await
            .insert(secucode.to_string(), Arc::clone(&snapshot));
        Ok(snapshot)
    }

    /// Pull one section out of a security's snapshot.
    async fn section<T, F>(&self, secucode: &str, name: &str, pick: F) -> Result<T, ProviderError>
    where
        F: FnOnce(&SecuritySnapshot) -> Option<T>,
    {
        let snapshot = self.load(secucode).await?;
        pick(&snapshot).ok_or_else(|| {
            ProviderError::DataNotAvailable(format!("{} has no {} section", secucode, name))
        })
    }

    /// Map a bare code back to its suffixed form through the listing.
    async fn resolve_security_code(&self, security_code: &str) -> Result<String, ProviderError> {
        self.listing()
            .await?
            .iter()
            .find(|s| s.security_code() == security_code)
            .map(|s| s.secucode.clone())
            .ok_or_else(|| {
                ProviderError::DataNotAvailable(format!("{} is not listed", security_code))
            })
    }
}

async fn read_file(path: &Path) -> Result<String, ProviderError> {
    tokio::fs::read_to_string(path).await.map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            ProviderError::DataNotAvailable(format!("{} not found", path.display()))
        } else {
            ProviderError::Internal(format!("{}: {}", path.display(), e))
        }
    })
}

#[async_trait]
impl FinancialHistoryProvider for SnapshotStore {
    async fn fetch_financial_history(
        &self,
        secucode: &str,
    ) -> Result<FinancialHistory, ProviderError> {
        self.section(secucode, "financial_history", |s| s.financial_history.clone())
            .await
    }
}

#[async_trait]
impl ValuationStatusProvider for SnapshotStore {
    async fn fetch_valuation_status(
        &self,
        secucode: &str,
    ) -> Result<ValuationStatus, ProviderError> {
        self.section(secucode, "valuation_status", |s| s.valuation_status.clone())
            .await
    }
}

#[async_trait]
impl PeHistoryProvider for SnapshotStore {
    async fn fetch_pe_history(&self, secucode: &str) -> Result<PeHistory, ProviderError> {
        self.section(secucode, "pe_history", |s| s.pe_history.clone())
            .await
    }
}

#[async_trait]
impl PriceHistoryProvider for SnapshotStore {
    async fn fetch_price_history(&self, secucode: &str) -> Result<PriceSeries, ProviderError> {
        self.section(secucode, "price_history", |s| s.price_history.clone())
            .await
    }
}

#[async_trait]
impl CompanyProfileProvider for SnapshotStore {
    async fn fetch_company_profile(
        &self,
        secucode: &str,
    ) -> Result<CompanyProfile, ProviderError> {
        self.section(secucode, "company_profile", |s| s.company_profile.clone())
            .await
    }
}

#[async_trait]
impl DisclosureDateProvider for SnapshotStore {
    async fn fetch_next_disclosure_date(
        &self,
        security_code: &str,
    ) -> Result<String, ProviderError> {
        let secucode = self.resolve_security_code(security_code).await?;
        let snapshot = self.load(&secucode).await?;
        // No scheduled disclosure is a valid, empty answer.
        Ok(snapshot.next_disclosure_date.clone().unwrap_or_default())
    }
}

#[async_trait]
impl OrgRatingProvider for SnapshotStore {
    async fn fetch_org_ratings(&self, secucode: &str) -> Result<Vec<OrgRating>, ProviderError> {
        self.section(secucode, "org_ratings", |s| s.org_ratings.clone())
            .await
    }
}

#[async_trait]
impl ProfitForecastProvider for SnapshotStore {
    async fn fetch_profit_forecasts(
        &self,
        secucode: &str,
    ) -> Result<Vec<ProfitForecast>, ProviderError> {
        self.section(secucode, "profit_forecasts", |s| s.profit_forecasts.clone())
            .await
    }
}

// ============================================================================
// Tests
// ============================================================================
