//! Host page model
//!
//! The browser DOM is expressed as a retained page document: an arena of
//! nodes parsed from host HTML, with a synthetic vertical layout, an
//! inline-style overlay and a mutation event channel. On top of it sit the
//! extractor (semantic page context), the content cache (TTL + mutation
//! invalidation), the element finder and the action executor.

pub mod actions;
pub mod cache;
pub mod document;
pub mod error;
pub mod extract;
pub mod finder;

pub use actions::ActionExecutor;
pub use cache::{CacheWatch, ContentCache};
pub use document::{MutationEvent, MutationKind, PageDocument, Rect, Viewport};
pub use error::PageError;
pub use extract::PageExtractor;
pub use finder::ElementFinder;
