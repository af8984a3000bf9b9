//! Record identity

use tracing::info;
use uuid::Uuid;

use certvec_core::{Error, Record, Result};

/// Give every record a fresh UUID v4 `id`, replacing any existing one
pub fn assign_ids(records: &mut [Record]) {
    for record in records.iter_mut() {
        record.set_id(Uuid::new_v4().to_string());
    }
    info!(records = records.len(), "assigned ids");
}

/// Fail on the first record without an `id`, naming its position
pub fn ensure_ids(records: &[Record]) -> Result<()> {
    match records.iter().position(|record| record.id().is_none()) {
        Some(index) => Err(Error::InvalidInput(format!(
            "record {} of {} has no 'id'; run assign-ids first",
            index + 1,
            records.len()
        ))),
        None => Ok(()),
    }
}
