//! Wire payloads for the change-notification WebSocket.

use serde::{Deserialize, Serialize};

use crate::domain::{ChangeEvent, ChangeOp, ChangeTable};

/// Notification pushed to subscribed clients.
///
/// Deliberately carries no row data; clients re-fetch the affected resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct ChangeNotification {
    /// Table the change originated from.
    pub table: ChangeTable,
    /// Kind of mutation.
    pub op: ChangeOp,
}

impl From<ChangeEvent> for ChangeNotification {
    fn from(event: ChangeEvent) -> Self {
        Self {
            table: event.table,
            op: event.op,
        }
    }
}
