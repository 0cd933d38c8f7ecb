//! Tenant quota external collaborator (§3, §6).

use uuid::Uuid;

use crate::error::Result;

/// A point-in-time read of a tenant's remaining page budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuotaSnapshot {
    pub remaining: i64,
    pub unlimited: bool,
}

/// External collaborator tracking per-tenant page consumption.
///
/// Implementations are supplied by the host (this workspace's own
/// subscription/billing schema is explicitly out of scope, §1); `Check`
/// and `Deduct` errors are treated as transient unless the tenant's
/// remaining pages are actually exhausted, in which case `Submit` must
/// reject with `InsufficientPages` (§6).
#[async_trait::async_trait]
pub trait TenantQuota: Send + Sync {
    async fn check(&self, tenant_id: Uuid) -> Result<QuotaSnapshot>;

    /// Deducts `pages` from the tenant's remaining budget. A no-op when
    /// the tenant is `unlimited`.
    async fn deduct(&self, tenant_id: Uuid, pages: u32) -> Result<QuotaSnapshot>;
}
