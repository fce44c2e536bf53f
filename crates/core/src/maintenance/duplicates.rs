//! Duplicate detection over historical domain records.
//!
//! Records are grouped by a natural key. Within a group of size > 1 the
//! earliest record (by recorded instant, then id) is kept and the rest are
//! marked for removal.

use std::collections::HashMap;
use std::hash::Hash;

use chrono::{DateTime, SubsecRound, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;

use cashdesk_shared::types::{CurrencyId, PointId};

/// A record considered for duplicate detection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DuplicateCandidate<K> {
    /// Row id.
    pub id: Uuid,
    /// Natural key.
    pub key: K,
    /// When the row was recorded.
    pub recorded_at: DateTime<Utc>,
}

/// A group of records sharing a natural key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DuplicateGroup<K> {
    /// Shared key.
    pub key: K,
    /// Earliest record, kept.
    pub keep: Uuid,
    /// Later records, removed on execute.
    pub remove: Vec<Uuid>,
}

/// Groups candidates by key, returning only groups with duplicates in the
/// order their first member was seen.
#[must_use]
pub fn find_duplicate_groups<K, I>(candidates: I) -> Vec<DuplicateGroup<K>>
where
    K: Eq + Hash + Clone,
    I: IntoIterator<Item = DuplicateCandidate<K>>,
{
    let mut index: HashMap<K, usize> = HashMap::new();
    let mut buckets: Vec<Vec<DuplicateCandidate<K>>> = Vec::new();

    for candidate in candidates {
        match index.get(&candidate.key) {
            Some(&slot) => buckets[slot].push(candidate),
            None => {
                index.insert(candidate.key.clone(), buckets.len());
                buckets.push(vec![candidate]);
            }
        }
    }

    buckets
        .into_iter()
        .filter(|bucket| bucket.len() > 1)
        .filter_map(|mut bucket| {
            bucket.sort_by(|a, b| a.recorded_at.cmp(&b.recorded_at).then(a.id.cmp(&b.id)));
            let mut members = bucket.into_iter();
            let first = members.next()?;
            Some(DuplicateGroup {
                key: first.key,
                keep: first.id,
                remove: members.map(|c| c.id).collect(),
            })
        })
        .collect()
}

/// Truncates to whole seconds so rows written a few milliseconds apart by a
/// double submit share a key.
fn key_instant(instant: DateTime<Utc>) -> DateTime<Utc> {
    instant.trunc_subsecs(0)
}

/// Natural key of a currency exchange.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ExchangeKey {
    /// Point.
    pub point_id: PointId,
    /// Currency handed over by the customer.
    pub origin_currency: CurrencyId,
    /// Currency handed to the customer.
    pub destination_currency: CurrencyId,
    /// Origin amount.
    pub origin_amount: Decimal,
    /// Destination amount.
    pub destination_amount: Decimal,
    /// `BUY` or `SELL`.
    pub operation: String,
    /// Receipt number, if any.
    pub receipt_number: Option<String>,
    /// Creation instant, to the second.
    pub created_at: DateTime<Utc>,
}

impl ExchangeKey {
    /// Builds a key; the instant is truncated to seconds.
    #[must_use]
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        point_id: PointId,
        origin_currency: CurrencyId,
        destination_currency: CurrencyId,
        origin_amount: Decimal,
        destination_amount: Decimal,
        operation: impl Into<String>,
        receipt_number: Option<String>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            point_id,
            origin_currency,
            destination_currency,
            origin_amount: origin_amount.normalize(),
            destination_amount: destination_amount.normalize(),
            operation: operation.into(),
            receipt_number,
            created_at: key_instant(created_at),
        }
    }
}

/// Natural key of a transfer.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TransferKey {
    /// Sending point, if any.
    pub origin_point: Option<PointId>,
    /// Receiving point.
    pub destination_point: PointId,
    /// Currency.
    pub currency_id: CurrencyId,
    /// Amount.
    pub amount: Decimal,
    /// Receipt number, if any.
    pub receipt_number: Option<String>,
    /// Creation instant, to the second.
    pub created_at: DateTime<Utc>,
}

impl TransferKey {
    /// Builds a key; the instant is truncated to seconds.
    #[must_use]
    pub fn new(
        origin_point: Option<PointId>,
        destination_point: PointId,
        currency_id: CurrencyId,
        amount: Decimal,
        receipt_number: Option<String>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            origin_point,
            destination_point,
            currency_id,
            amount: amount.normalize(),
            receipt_number,
            created_at: key_instant(created_at),
        }
    }
}

/// Natural key of an external-service guide movement.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ServiceMovementKey {
    /// Point.
    pub point_id: PointId,
    /// Service name.
    pub service: String,
    /// `INGRESO` or `EGRESO`.
    pub kind: String,
    /// Amount.
    pub amount: Decimal,
    /// Guide number.
    pub guide_reference: String,
    /// Creation instant, to the second.
    pub created_at: DateTime<Utc>,
}

impl ServiceMovementKey {
    /// Builds a key; the instant is truncated to seconds.
    #[must_use]
    pub fn new(
        point_id: PointId,
        service: impl Into<String>,
        kind: impl Into<String>,
        amount: Decimal,
        guide_reference: impl Into<String>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            point_id,
            service: service.into(),
            kind: kind.into(),
            amount: amount.normalize(),
            guide_reference: guide_reference.into(),
            created_at: key_instant(created_at),
        }
    }
}
