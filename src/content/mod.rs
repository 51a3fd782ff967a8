//! Content entities: the authored input the feed engine syndicates.
//!
//! - `entity` - the closed [`ContentEntity`] sum type and its variants
//! - `provider` - the [`ContentProvider`] seam plus in-memory and JSON-file
//!   implementations

mod entity;
mod provider;

pub use entity::{
    Article, ChangelogEntry, ContentEntity, ContentKind, ImageRef, Project, ProjectLink,
};
pub use provider::{ContentError, ContentProvider, ContentSet, JsonContentFile};
