//! Section outline (bookmark) injection built on top of `lopdf`.

use lopdf::{Dictionary, Document, Object, ObjectId, StringFormat};
use thiserror::Error;

/// Errors that can occur while embedding bookmarks into a rendered PDF document.
#[derive(Debug, Error)]
pub enum BookmarkError {
    /// The PDF bytes could not be parsed or written by `lopdf`.
    #[error("Failed to process PDF bytes: {0}")]
    Pdf(#[from] lopdf::Error),
    /// The trailer has no usable `/Root` catalog reference.
    #[error("PDF catalog entry is missing")]
    MissingCatalog,
    /// The catalog object was not a dictionary.
    #[error("PDF catalog entry is not a dictionary")]
    InvalidCatalog,
    /// A recorded page number did not exist in the rendered document.
    #[error("Section {section_index} refers to missing page {page_number}")]
    MissingPage {
        section_index: usize,
        page_number: usize,
    },
}

impl From<std::io::Error> for BookmarkError {
    fn from(err: std::io::Error) -> Self {
        Self::Pdf(err.into())
    }
}

/// Adds a flat outline with one entry per section pointing at the section's first page.
///
/// Sections without a recorded page are skipped. The bytes are returned unchanged when no entry
/// remains.
pub fn apply_section_bookmarks(
    pdf_bytes: &[u8],
    titles: &[String],
    section_pages: &[Option<usize>],
) -> Result<Vec<u8>, BookmarkError> {
    let mut document = Document::load_mem(pdf_bytes)?;
    let targets = resolve_targets(&document, titles, section_pages)?;
    if targets.is_empty() {
        return Ok(pdf_bytes.to_vec());
    }

    let root_id = document.new_object_id();
    let entry_ids: Vec<ObjectId> = targets.iter().map(|_| document.new_object_id()).collect();

    for (position, (title, page_id)) in targets.iter().enumerate() {
        let mut entry = Dictionary::new();
        entry.set("Title", outline_title(title));
        entry.set("Parent", Object::Reference(root_id));
        entry.set(
            "Dest",
            Object::Array(vec![
                Object::Reference(*page_id),
                Object::Name(b"Fit".to_vec()),
            ]),
        );
        if let Some(previous) = position.checked_sub(1).map(|index| entry_ids[index]) {
            entry.set("Prev", Object::Reference(previous));
        }
        if let Some(next) = entry_ids.get(position + 1) {
            entry.set("Next", Object::Reference(*next));
        }
        document
            .objects
            .insert(entry_ids[position], Object::Dictionary(entry));
    }

    let mut root = Dictionary::new();
    root.set("Type", Object::Name(b"Outlines".to_vec()));
    root.set("Count", Object::Integer(entry_ids.len() as i64));
    root.set("First", Object::Reference(entry_ids[0]));
    root.set("Last", Object::Reference(entry_ids[entry_ids.len() - 1]));
    document.objects.insert(root_id, Object::Dictionary(root));

    let catalog_id = document
        .trailer
        .get(b"Root")
        .and_then(Object::as_reference)
        .map_err(|_| BookmarkError::MissingCatalog)?;
    let catalog = document
        .objects
        .get_mut(&catalog_id)
        .ok_or(BookmarkError::MissingCatalog)?
        .as_dict_mut()
        .map_err(|_| BookmarkError::InvalidCatalog)?;
    catalog.set("Outlines", Object::Reference(root_id));
    catalog.set("PageMode", Object::Name(b"UseOutlines".to_vec()));

    let mut buffer = Vec::new();
    document.save_to(&mut buffer)?;
    Ok(buffer)
}

/// Pairs each section title with the object id of its first page.
fn resolve_targets<'a>(
    document: &Document,
    titles: &'a [String],
    section_pages: &[Option<usize>],
) -> Result<Vec<(&'a str, ObjectId)>, BookmarkError> {
    let pages = document.get_pages();

    titles
        .iter()
        .zip(section_pages)
        .enumerate()
        .filter_map(|(index, (title, page))| page.map(|page| (index, title, page)))
        .map(|(section_index, title, page_number)| {
            u32::try_from(page_number)
                .ok()
                .and_then(|number| pages.get(&number).copied())
                .map(|page_id| (title.as_str(), page_id))
                .ok_or(BookmarkError::MissingPage {
                    section_index,
                    page_number,
                })
        })
        .collect()
}

/// Encodes an outline title as a PDF text string.
///
/// Printable ASCII is written as a literal; anything else becomes UTF-16BE with a byte order mark,
/// since raw UTF-8 is not a valid PDF text string encoding.
fn outline_title(title: &str) -> Object {
    if title.bytes().all(|byte| byte == b' ' || byte.is_ascii_graphic()) {
        return Object::string_literal(title);
    }

    let mut bytes = vec![0xFE, 0xFF];
    bytes.extend(title.encode_utf16().flat_map(u16::to_be_bytes));
    Object::String(bytes, StringFormat::Hexadecimal)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unparseable_bytes_are_reported() {
        let err = apply_section_bookmarks(b"not a pdf", &["Topic 1".to_owned()], &[Some(1)])
            .unwrap_err();
        assert!(matches!(err, BookmarkError::Pdf(_)));
    }

    fn encoded(object: Object) -> (Vec<u8>, bool) {
        let Object::String(bytes, format) = object else {
            panic!("outline titles are strings");
        };
        (bytes, matches!(format, StringFormat::Hexadecimal))
    }

    #[test]
    fn ascii_titles_stay_literal() {
        assert_eq!(encoded(outline_title("Topic 1")), (b"Topic 1".to_vec(), false));
    }

    #[test]
    fn other_titles_are_utf16_with_a_byte_order_mark() {
        let (bytes, hex) = encoded(outline_title("Énergie"));
        assert!(hex);
        assert_eq!(bytes[..4], [0xFE, 0xFF, 0x00, 0xC9]);
        assert_eq!(bytes.len(), 2 + 2 * "Énergie".chars().count());

        let (bytes, _) = encoded(outline_title("बल"));
        assert_eq!(bytes, vec![0xFE, 0xFF, 0x09, 0x2C, 0x09, 0x32]);
    }
}
