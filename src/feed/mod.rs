//! Feed generation: from content entities to syndication documents.
//!
//! - [`normalize`] - one [`FeedItem`] per content entity
//! - [`encode`] - RSS 2.0, Atom 1.0 and JSON Feed 1.1 encoders
//! - `assembler` - filtering, ordering, concurrent normalization, encoding
//! - `routes` - feed variants, formats, canonical paths, and legacy paths
//!
//! # Example
//!
//! ```no_run
//! use syndicate::config::SiteConfig;
//! use syndicate::content::{ContentProvider, JsonContentFile};
//! use syndicate::feed::{Assembler, FeedVariant};
//!
//! # async fn run() -> anyhow::Result<()> {
//! let site = SiteConfig::load("syndicate.toml".as_ref())?;
//! let entities = JsonContentFile::new("content.json").entities()?;
//!
//! let assembler = Assembler::new(site)?;
//! for (route, document) in assembler.assemble_all(FeedVariant::Blog, &entities, None).await {
//!     println!("{route}: {} bytes", document?.body.len());
//! }
//! # Ok(())
//! # }
//! ```

mod assembler;
pub mod encode;
pub mod normalize;
mod routes;
mod types;

pub use assembler::{select_entities, AssembleError, Assembler, FeedDocument, MAX_CONCURRENCY};
pub use encode::EncodeError;
pub use normalize::{infer_timeline_year, NormalizeWarning};
pub use routes::{
    resolve_legacy, FeedFormat, FeedRoute, FeedVariant, RouteParseError, LEGACY_PATHS,
};
pub use types::{Categories, FeedAuthor, FeedConfig, FeedImage, FeedItem, Generator};
