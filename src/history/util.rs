use anyhow::Result;
use std::time::{SystemTime, UNIX_EPOCH};

/// Wall-clock seconds, for journals only. Commit metadata never uses this.
pub fn now_epoch_secs() -> Result<u64> {
    Ok(SystemTime::now().duration_since(UNIX_EPOCH)?.as_secs())
}
