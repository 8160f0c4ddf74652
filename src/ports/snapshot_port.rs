//! Push-notification port for published snapshots.

use crate::domain::engine::PublishedView;
use crate::domain::error::LivefolioError;

/// Receives every view the engine publishes, after publication.
pub trait SnapshotListener {
    fn on_publish(&mut self, view: &PublishedView) -> Result<(), LivefolioError>;
}
