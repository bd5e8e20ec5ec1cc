//! Page-layer errors

use thiserror::Error;

#[derive(Debug, Error)]
pub enum PageError {
    /// A described section could not be resolved
    #[error("Section not found")]
    SectionNotFound,

    /// A described element could not be resolved
    #[error("element not found: {0}")]
    ElementNotFound(String),

    /// Click was requested on a non-interactive element
    #[error("element is not clickable: {0}")]
    NotClickable(String),

    /// The node id refers to a node outside the current document generation
    #[error("stale node reference {0}")]
    StaleNode(blitsum_core::NodeId),
}
