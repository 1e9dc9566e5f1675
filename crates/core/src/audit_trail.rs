// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use crate::repository::AuditSink;
use anarchy_audit::AuditLogEntry;
use tracing::{debug, warn};

/// Writes an audit entry, logging and swallowing any failure.
///
/// A successful mutation is never undone because its audit entry failed.
pub fn record(sink: &dyn AuditSink, entry: &AuditLogEntry) {
    match sink.log_action(entry) {
        Ok(()) => debug!(
            guild_id = %entry.guild_id,
            action = %entry.action,
            "Audit entry recorded"
        ),
        Err(err) => warn!(
            guild_id = %entry.guild_id,
            action = %entry.action,
            error = %err,
            "Failed to record audit entry"
        ),
    }
}
