//! Status Reconciler
//!
//! Pure comparison of the gateway's observed state against the stored record.
//! The caller persists the result when `changed` is true; `entered_connected`
//! tells it when to stamp `last_connected_at`.

use super::types::InstanceRecord;
use crate::gateway::{InstanceStatus, ObservedInstance};
use chrono::{DateTime, Utc};

/// Outcome of one reconciliation pass.
#[derive(Debug, Clone)]
pub struct Reconciled {
    /// The stored record with the observation folded in.
    pub record: InstanceRecord,
    /// True iff the observation diverged from the stored record.
    pub changed: bool,
    /// True iff this pass transitioned the record into `connected`.
    pub entered_connected: bool,
}

/// Fold a gateway observation into the stored record.
///
/// `changed` is true iff the observed status differs, or an observed phone is
/// present and differs. An absent observed phone never clears a stored phone;
/// only an explicit disconnect does that. Idempotent: applying the same
/// observation twice yields `changed = false` the second time.
pub fn reconcile(
    stored: &InstanceRecord,
    observed: &ObservedInstance,
    now: DateTime<Utc>,
) -> Reconciled {
    let status_changed = observed.status != stored.status;
    let phone_changed =
        observed.phone_number.is_some() && observed.phone_number != stored.phone_number;
    let entered_connected =
        observed.status == InstanceStatus::Connected && stored.status != InstanceStatus::Connected;

    let mut record = stored.clone();
    record.status = observed.status;
    if let Some(ref phone) = observed.phone_number {
        record.phone_number = Some(phone.clone());
    }
    if entered_connected {
        record.last_connected_at = Some(now);
    }

    Reconciled {
        record,
        changed: status_changed || phone_changed,
        entered_connected,
    }
}
