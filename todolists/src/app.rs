//! Process-wide operation status.

use crate::types::RequestStatus;
use serde::{Deserialize, Serialize};

/// Status of the most recently started or completed network operation
///
/// `Loading` when an intent is dispatched, then `Succeeded` or `Failed` when
/// its terminal action is reduced. The error persists until the next failure
/// overwrites it or [`AppStatusState::dismiss_error`] clears it.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppStatusState {
    /// Current request status
    pub status: RequestStatus,
    /// Last failure message
    pub error: Option<String>,
}

impl AppStatusState {
    /// An operation was dispatched
    pub fn start(&mut self) {
        self.status = RequestStatus::Loading;
    }

    /// An operation was confirmed
    pub fn succeed(&mut self) {
        self.status = RequestStatus::Succeeded;
    }

    /// An operation failed
    pub fn fail(&mut self, message: impl Into<String>) {
        self.status = RequestStatus::Failed;
        self.error = Some(message.into());
    }

    /// Clear the error slot
    pub fn dismiss_error(&mut self) {
        self.error = None;
    }

    /// Returns `true` while an operation is in flight
    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.status == RequestStatus::Loading
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_survives_later_success() {
        let mut app = AppStatusState::default();
        app.start();
        app.fail("Some error occurred");
        app.start();
        app.succeed();

        assert_eq!(app.status, RequestStatus::Succeeded);
        assert_eq!(app.error.as_deref(), Some("Some error occurred"));

        app.dismiss_error();
        assert_eq!(app.error, None);
    }
}
