//! Data structures describing the study content handed to the composer.
//!
//! The types stay independent of `genpdf` so request handlers can assemble them straight from
//! JSON payloads. Decoding of diagram images is deferred to the composer so that a single broken
//! diagram degrades into an inline notice instead of failing the whole export.

use std::borrow::Cow;

use crate::dataurl::decode_data_url;
use crate::error::DecodeError;

/// Where the bytes of a section diagram come from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DiagramSource {
    /// Raw, already decoded image bytes.
    Bytes(Vec<u8>),
    /// A base64 data URL that has not been decoded yet.
    DataUrl(String),
}

impl DiagramSource {
    /// Creates a diagram from raw image bytes.
    pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> Self {
        Self::Bytes(bytes.into())
    }

    /// Creates a diagram from a data URL.
    pub fn from_data_url(data_url: impl Into<String>) -> Self {
        Self::DataUrl(data_url.into())
    }

    /// Returns the encoded image bytes, decoding the data URL if necessary.
    pub fn bytes(&self) -> Result<Cow<'_, [u8]>, DecodeError> {
        match self {
            Self::Bytes(bytes) => Ok(Cow::Borrowed(bytes)),
            Self::DataUrl(url) => decode_data_url(url).map(Cow::Owned),
        }
    }
}

/// One heading + body unit, optionally followed by a diagram.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Section {
    title: Option<String>,
    body: String,
    diagram: Option<DiagramSource>,
}

impl Section {
    /// Creates a section with the given title and an empty body.
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            ..Self::default()
        }
    }

    /// Creates a section without a title; it is labelled by position when rendered.
    pub fn untitled() -> Self {
        Self::default()
    }

    /// Returns the raw title, if any.
    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    /// Returns the body text.
    pub fn body(&self) -> &str {
        &self.body
    }

    /// Returns the diagram, if any.
    pub fn diagram(&self) -> Option<&DiagramSource> {
        self.diagram.as_ref()
    }

    /// Returns the title to render for the section at `index` (0-based).
    ///
    /// Blank or missing titles are replaced with `Topic N`, where N is 1-indexed.
    pub fn display_title(&self, index: usize) -> String {
        match self.title.as_deref().map(str::trim) {
            Some(title) if !title.is_empty() => title.to_owned(),
            _ => format!("Topic {}", index + 1),
        }
    }

    /// Sets the title and returns the updated section.
    pub fn with_title(mut self, title: impl Into<Option<String>>) -> Self {
        self.title = title.into();
        self
    }

    /// Sets the body text and returns the updated section.
    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = body.into();
        self
    }

    /// Attaches a diagram and returns the updated section.
    pub fn with_diagram(mut self, diagram: impl Into<Option<DiagramSource>>) -> Self {
        self.diagram = diagram.into();
        self
    }
}

/// Which parts of each section end up in the document.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ContentMode {
    /// Body text only.
    #[default]
    NotesOnly,
    /// Diagrams only.
    MindmapOnly,
    /// Body text followed by the diagram.
    NotesAndMindmap,
}

impl ContentMode {
    /// Whether section bodies are drawn.
    pub fn includes_notes(self) -> bool {
        matches!(self, Self::NotesOnly | Self::NotesAndMindmap)
    }

    /// Whether section diagrams are drawn.
    pub fn includes_diagrams(self) -> bool {
        matches!(self, Self::MindmapOnly | Self::NotesAndMindmap)
    }
}

/// How sections are arranged under the main heading.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SectionLayout {
    /// A single topic: no per-section heading, content starts at a fixed offset.
    #[default]
    Topic,
    /// A chapter: every section gets its own heading and content follows the main heading.
    Chapter,
}

/// Options selecting what a composition draws.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ComposeOptions {
    /// Parts of each section to draw.
    pub content: ContentMode,
    /// Section arrangement.
    pub layout: SectionLayout,
}

impl ComposeOptions {
    /// Creates options from a content mode and layout.
    pub fn new(content: ContentMode, layout: SectionLayout) -> Self {
        Self { content, layout }
    }
}
