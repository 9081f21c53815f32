//! Mapping from SQLite errors to gateway errors.

use gradebook_core::gateway::GatewayOp;
use gradebook_core::StoreError;
use rusqlite::ErrorCode;

/// A statement failed inside a transaction.
///
/// A busy or locked database means another process holds it, which callers
/// treat like an unreachable store.
pub(crate) fn operation_failed(op: GatewayOp) -> impl FnOnce(rusqlite::Error) -> StoreError {
    move |err| {
        if is_busy(&err) {
            StoreError::Connection(format!("{}: {err}", op.name()))
        } else {
            StoreError::operation(op.name(), err.to_string())
        }
    }
}

/// The database could not be opened or prepared for use.
pub(crate) fn open_failed(context: &str, err: rusqlite::Error) -> StoreError {
    StoreError::Connection(format!("{context}: {err}"))
}

fn is_busy(err: &rusqlite::Error) -> bool {
    matches!(
        err.sqlite_error_code(),
        Some(ErrorCode::DatabaseBusy | ErrorCode::DatabaseLocked)
    )
}
