//! Download filename derivation for exported documents.

const MAX_BASE_CHARS: usize = 80;
const FALLBACK_BASE: &str = "file";

/// The kind of export, which selects the filename suffix.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExportKind {
    /// Single topic, notes only.
    Notes,
    /// Single topic, mind map only.
    Mindmap,
    /// Single topic, notes followed by the mind map.
    TopicCombined,
    /// Whole chapter, notes only.
    Chapter,
    /// Whole chapter, notes and per-topic mind maps.
    ChapterCombined,
}

impl ExportKind {
    fn suffix(self) -> &'static str {
        match self {
            Self::Notes => "_notes.pdf",
            Self::Mindmap => "_mindmap.pdf",
            Self::TopicCombined => "_notes_mindmap.pdf",
            Self::Chapter | Self::ChapterCombined => ".pdf",
        }
    }
}

/// Reduces a human-supplied title to a filesystem-safe base name.
///
/// Whitespace becomes `_`, anything other than alphanumerics, `_` and `-` is dropped, case is
/// preserved and the result is capped at 80 characters. Falls back to `file` when nothing is left.
pub fn safe_filename(name: Option<&str>) -> String {
    let cleaned: String = name
        .unwrap_or(FALLBACK_BASE)
        .trim()
        .chars()
        .map(|ch| if ch.is_whitespace() { '_' } else { ch })
        .filter(|ch| ch.is_alphanumeric() || matches!(ch, '_' | '-'))
        .take(MAX_BASE_CHARS)
        .collect();

    if cleaned.is_empty() {
        FALLBACK_BASE.to_owned()
    } else {
        cleaned
    }
}

/// Builds the attachment filename for an export of the given kind.
pub fn export_filename(title: &str, kind: ExportKind) -> String {
    format!("{}{}", safe_filename(Some(title)), kind.suffix())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_punctuation_and_keeps_case() {
        assert_eq!(
            safe_filename(Some("Newton's Laws!! (Part 1)")),
            "Newtons_Laws_Part_1"
        );
    }

    #[test]
    fn notes_export_uses_notes_suffix() {
        assert_eq!(
            export_filename("Newton's Laws!! (Part 1)", ExportKind::Notes),
            "Newtons_Laws_Part_1_notes.pdf"
        );
        assert_eq!(
            export_filename("Cells", ExportKind::TopicCombined),
            "Cells_notes_mindmap.pdf"
        );
        assert_eq!(export_filename("Cells", ExportKind::Chapter), "Cells.pdf");
    }

    #[test]
    fn falls_back_when_nothing_survives() {
        assert_eq!(safe_filename(Some("!!! ???")), "_");
        assert_eq!(safe_filename(Some("?!")), "file");
        assert_eq!(safe_filename(Some("   ")), "file");
        assert_eq!(safe_filename(None), "file");
    }

    #[test]
    fn truncates_to_eighty_characters() {
        let long = "a".repeat(200);
        assert_eq!(safe_filename(Some(&long)).chars().count(), 80);
    }

    #[test]
    fn keeps_non_ascii_letters() {
        assert_eq!(safe_filename(Some("Kräfte und Bewegung")), "Kräfte_und_Bewegung");
    }
}
