//! Core entry point for the study_pdf crate.
//!
//! Composes study-note PDFs: a main heading, per-topic notes and optional mindmap diagrams laid
//! out over a background template that is stamped onto every page.

pub mod builder;
pub mod composer;
pub mod dataurl;
pub mod elements;
pub mod error;
pub mod filename;
pub mod fonts;
pub mod geometry;
pub mod model;

#[cfg(feature = "bookmarks")]
pub mod bookmarks;

pub use composer::{ComposedDocument, Composer, DIAGRAM_NOTICE};
pub use dataurl::{decode_data_url, encode_data_url};
pub use error::{ComposeError, DecodeError, ErrorCategory};
pub use filename::{export_filename, safe_filename, ExportKind};
pub use model::{ComposeOptions, ContentMode, DiagramSource, Section, SectionLayout};
