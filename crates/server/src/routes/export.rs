//! PDF export endpoints.

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::header::{CONTENT_DISPOSITION, CONTENT_TYPE};
use axum::response::{IntoResponse, Response};
use log::info;
use serde::Deserialize;
use study_pdf::{
    decode_data_url, export_filename, ComposeOptions, ContentMode, DiagramSource, ExportKind,
    Section, SectionLayout,
};

use super::{non_empty, parse_json, run_blocking};
use crate::error::ApiError;
use crate::AppState;

const DEFAULT_TOPIC_NAME: &str = "Untitled Topic";
const DEFAULT_CHAPTER_TITLE: &str = "Chapter Notes";
const DEFAULT_COMBINED_CHAPTER_TITLE: &str = "Chapter Notes + Mindmaps";
const TEMPLATE_DECODE_ERROR: &str = "Template decode error";
const DECODE_ERROR: &str = "Decode error";

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct TopicExportRequest {
    pub topic_name: Option<String>,
    pub content: Option<String>,
    pub mindmap_image_data_url: Option<String>,
    pub template_data_url: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ChapterExportRequest {
    pub chapter_title: Option<String>,
    pub topics: Option<Vec<ChapterTopic>>,
    pub template_data_url: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ChapterTopic {
    pub topic: Option<String>,
    pub content: Option<String>,
    pub mindmap_image_data_url: Option<String>,
}

impl ChapterTopic {
    fn into_section(self, with_diagram: bool) -> Section {
        let diagram = with_diagram
            .then(|| non_empty(self.mindmap_image_data_url))
            .flatten()
            .map(DiagramSource::from_data_url);

        Section::untitled()
            .with_title(self.topic)
            .with_body(self.content.unwrap_or_default())
            .with_diagram(diagram)
    }
}

/// One composition ready to run: everything the composer needs plus the download name.
struct ExportJob {
    heading: String,
    template: Vec<u8>,
    sections: Vec<Section>,
    options: ComposeOptions,
    kind: ExportKind,
}

fn require_template(template_data_url: Option<String>) -> Result<String, ApiError> {
    non_empty(template_data_url).ok_or_else(|| ApiError::bad_request("Template missing"))
}

fn require_mindmap(mindmap_data_url: Option<String>) -> Result<String, ApiError> {
    non_empty(mindmap_data_url).ok_or_else(|| ApiError::bad_request("Mindmap image missing"))
}

/// Decodes a data URL; `prefix` names the failure in the error message.
fn decode(data_url: &str, prefix: &str) -> Result<Vec<u8>, ApiError> {
    decode_data_url(data_url).map_err(|err| ApiError::decode(prefix, err))
}

fn require_topics(topics: Option<Vec<ChapterTopic>>) -> Result<Vec<ChapterTopic>, ApiError> {
    topics
        .filter(|topics| !topics.is_empty())
        .ok_or_else(|| ApiError::bad_request("Topics missing"))
}

async fn export(state: AppState, job: ExportJob) -> Result<Response, ApiError> {
    let filename = export_filename(&job.heading, job.kind);
    let composer = Arc::clone(&state.composer);

    let document = run_blocking(move || {
        composer
            .compose(&job.heading, &job.template, &job.sections, job.options)
            .map_err(ApiError::from)
    })
    .await?;

    info!(
        "exported {} ({} page(s), {} byte(s))",
        filename,
        document.page_count,
        document.bytes.len()
    );
    Ok(pdf_response(document.bytes, &filename))
}

fn pdf_response(bytes: Vec<u8>, filename: &str) -> Response {
    (
        [
            (CONTENT_TYPE, "application/pdf".to_owned()),
            (CONTENT_DISPOSITION, content_disposition(filename)),
        ],
        bytes,
    )
        .into_response()
}

/// Titles may keep non-ASCII letters, which only fit a header in RFC 5987 form.
fn content_disposition(filename: &str) -> String {
    if filename.is_ascii() {
        return format!("attachment; filename=\"{filename}\"");
    }

    let encoded: String = filename
        .bytes()
        .map(|byte| {
            if byte.is_ascii_alphanumeric() || matches!(byte, b'-' | b'_' | b'.') {
                char::from(byte).to_string()
            } else {
                format!("%{byte:02X}")
            }
        })
        .collect();
    format!("attachment; filename*=UTF-8''{encoded}")
}

/// `POST /export/notes/pdf`: a single topic, notes only.
pub async fn notes_pdf(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Response, ApiError> {
    let request: TopicExportRequest = parse_json(&body)?;
    let template = require_template(request.template_data_url)?;
    let template = decode(&template, TEMPLATE_DECODE_ERROR)?;

    let heading = request
        .topic_name
        .unwrap_or_else(|| DEFAULT_TOPIC_NAME.to_owned());
    let section = Section::new(heading.clone()).with_body(request.content.unwrap_or_default());

    export(
        state,
        ExportJob {
            heading,
            template,
            sections: vec![section],
            options: ComposeOptions::new(ContentMode::NotesOnly, SectionLayout::Topic),
            kind: ExportKind::Notes,
        },
    )
    .await
}

/// `POST /export/mindmap/pdf`: a single topic, diagram only.
pub async fn mindmap_pdf(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Response, ApiError> {
    let request: TopicExportRequest = parse_json(&body)?;
    let template = require_template(request.template_data_url)?;
    let mindmap = require_mindmap(request.mindmap_image_data_url)?;
    let template = decode(&template, DECODE_ERROR)?;
    let diagram = DiagramSource::from_bytes(decode(&mindmap, DECODE_ERROR)?);

    let heading = request
        .topic_name
        .unwrap_or_else(|| DEFAULT_TOPIC_NAME.to_owned());
    let section = Section::new(heading.clone()).with_diagram(diagram);

    export(
        state,
        ExportJob {
            heading,
            template,
            sections: vec![section],
            options: ComposeOptions::new(ContentMode::MindmapOnly, SectionLayout::Topic),
            kind: ExportKind::Mindmap,
        },
    )
    .await
}

/// `POST /export/topic/combined/pdf`: a single topic, notes followed by the diagram.
pub async fn topic_combined_pdf(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Response, ApiError> {
    let request: TopicExportRequest = parse_json(&body)?;
    let template = require_template(request.template_data_url)?;
    let mindmap = require_mindmap(request.mindmap_image_data_url)?;
    let template = decode(&template, DECODE_ERROR)?;
    let diagram = DiagramSource::from_bytes(decode(&mindmap, DECODE_ERROR)?);

    let heading = request
        .topic_name
        .unwrap_or_else(|| DEFAULT_TOPIC_NAME.to_owned());
    let section = Section::new(heading.clone())
        .with_body(request.content.unwrap_or_default())
        .with_diagram(diagram);

    export(
        state,
        ExportJob {
            heading,
            template,
            sections: vec![section],
            options: ComposeOptions::new(ContentMode::NotesAndMindmap, SectionLayout::Topic),
            kind: ExportKind::TopicCombined,
        },
    )
    .await
}

/// `POST /export/chapter/pdf`: every topic with its own heading, notes only.
pub async fn chapter_pdf(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Response, ApiError> {
    let request: ChapterExportRequest = parse_json(&body)?;
    let template = require_template(request.template_data_url)?;
    let topics = require_topics(request.topics)?;
    let template = decode(&template, TEMPLATE_DECODE_ERROR)?;

    let sections = topics
        .into_iter()
        .map(|topic| topic.into_section(false))
        .collect();

    export(
        state,
        ExportJob {
            heading: request
                .chapter_title
                .unwrap_or_else(|| DEFAULT_CHAPTER_TITLE.to_owned()),
            template,
            sections,
            options: ComposeOptions::new(ContentMode::NotesOnly, SectionLayout::Chapter),
            kind: ExportKind::Chapter,
        },
    )
    .await
}

/// `POST /export/chapter/combined/pdf`: every topic with notes and its optional diagram.
///
/// Topic diagrams are decoded during composition; a broken one is replaced by an inline notice.
pub async fn chapter_combined_pdf(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Response, ApiError> {
    let request: ChapterExportRequest = parse_json(&body)?;
    let template = require_template(request.template_data_url)?;
    let topics = require_topics(request.topics)?;
    let template = decode(&template, TEMPLATE_DECODE_ERROR)?;

    let sections = topics
        .into_iter()
        .map(|topic| topic.into_section(true))
        .collect();

    export(
        state,
        ExportJob {
            heading: request
                .chapter_title
                .unwrap_or_else(|| DEFAULT_COMBINED_CHAPTER_TITLE.to_owned()),
            template,
            sections,
            options: ComposeOptions::new(ContentMode::NotesAndMindmap, SectionLayout::Chapter),
            kind: ExportKind::ChapterCombined,
        },
    )
    .await
}
