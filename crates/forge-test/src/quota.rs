//! In-memory `TenantQuota` double.

use std::collections::HashMap;

use forge_core::error::{Error, Result};
use forge_core::quota::{QuotaSnapshot, TenantQuota};
use parking_lot::Mutex;
use uuid::Uuid;

/// A `TenantQuota` backed by an in-process map of remaining pages. Tenants
/// not present default to unlimited, so tests that don't care about quota
/// enforcement can ignore it entirely.
#[derive(Default)]
pub struct InMemoryQuota {
    remaining: Mutex<HashMap<Uuid, i64>>,
    unlimited: Mutex<HashMap<Uuid, bool>>,
}

impl InMemoryQuota {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_remaining(&self, tenant_id: Uuid, pages: i64) {
        self.remaining.lock().insert(tenant_id, pages);
    }

    pub fn set_unlimited(&self, tenant_id: Uuid, unlimited: bool) {
        self.unlimited.lock().insert(tenant_id, unlimited);
    }
}

#[async_trait::async_trait]
impl TenantQuota for InMemoryQuota {
    async fn check(&self, tenant_id: Uuid) -> Result<QuotaSnapshot> {
        let unlimited = *self.unlimited.lock().get(&tenant_id).unwrap_or(&true);
        let remaining = *self.remaining.lock().get(&tenant_id).unwrap_or(&i64::MAX);
        Ok(QuotaSnapshot {
            remaining,
            unlimited,
        })
    }

    async fn deduct(&self, tenant_id: Uuid, pages: u32) -> Result<QuotaSnapshot> {
        let unlimited = *self.unlimited.lock().get(&tenant_id).unwrap_or(&true);
        if unlimited {
            return Ok(QuotaSnapshot {
                remaining: i64::MAX,
                unlimited: true,
            });
        }
        let mut remaining_map = self.remaining.lock();
        let remaining = remaining_map.entry(tenant_id).or_insert(0);
        if *remaining < pages as i64 {
            return Err(Error::insufficient_pages());
        }
        *remaining -= pages as i64;
        Ok(QuotaSnapshot {
            remaining: *remaining,
            unlimited: false,
        })
    }
}
