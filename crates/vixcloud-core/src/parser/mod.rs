//! Parsers for player pages and playlists
//!
//! Contains one module per stage of the manifest pipeline.

pub mod embed;
pub mod fields;
pub mod object;
pub mod playlist;

pub use embed::{collect_scripts, locate_embed};
pub use fields::{FieldRecoverer, FieldStrategy, RecoveredFields, RegexStrategy, StructuralStrategy};
pub use object::extract_object;
pub use playlist::{best_rendition, parse_renditions, select_rendition_url};
