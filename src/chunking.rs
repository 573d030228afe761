use crate::document::SourceDocument;

/// A passage of a source document, the unit that gets embedded and retrieved
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Passage {
    /// `{source_id}#{chunk_index}`
    pub passage_id: String,
    /// File name of the document this passage was cut from
    pub source_id: String,
    /// The passage text
    pub text: String,
    /// Character offset of the passage in the original document
    pub start_offset: usize,
}

impl Passage {
    /// Number of characters in the passage
    pub fn char_len(&self) -> usize {
        self.text.chars().count()
    }

    /// Character offset just past the end of the passage
    pub fn end_offset(&self) -> usize {
        self.start_offset + self.char_len()
    }
}

/// Break levels tried in order when looking for a place to end a passage:
/// paragraph, line, sentence. A match ends the passage right after the separator.
const BREAKS: &[&[&str]] = &[&["\n\n"], &["\n"], &[". ", "! ", "? "]];

/// Split a document into overlapping passages of at most `chunk_size` characters.
///
/// Each passage after the first starts `chunk_overlap` characters before the
/// end of the previous one, so the passages cover the whole text with no gaps.
/// Passages end on a paragraph, line, sentence or word boundary when one is
/// found in the second half of the window, otherwise the window is cut hard.
pub fn split_into_passages(
    document: &SourceDocument,
    chunk_size: usize,
    chunk_overlap: usize,
) -> Vec<Passage> {
    let chunk_size = chunk_size.max(1);
    let chunk_overlap = chunk_overlap.min(chunk_size - 1);

    let chars: Vec<char> = document.raw_text.chars().collect();
    let total = chars.len();

    let mut passages = Vec::new();
    let mut start = 0;

    while start < total {
        let window_end = (start + chunk_size).min(total);
        let end = if window_end == total {
            total
        } else {
            // The passage must reach past the overlap, or the next one would not advance
            let min_end = start + (chunk_overlap + 1).max(chunk_size / 2);
            find_break(&chars, min_end, window_end).unwrap_or(window_end)
        };

        passages.push(Passage {
            passage_id: format!("{}#{}", document.source_id, passages.len()),
            source_id: document.source_id.clone(),
            text: chars[start..end].iter().collect(),
            start_offset: start,
        });

        if end == total {
            break;
        }
        start = end - chunk_overlap;
    }

    passages
}

/// Split every document, keeping document order
pub fn split_documents(
    documents: &[SourceDocument],
    chunk_size: usize,
    chunk_overlap: usize,
) -> Vec<Passage> {
    documents
        .iter()
        .flat_map(|document| split_into_passages(document, chunk_size, chunk_overlap))
        .collect()
}

/// Find the latest end position in `min_end..=max_end` that follows a natural break
fn find_break(chars: &[char], min_end: usize, max_end: usize) -> Option<usize> {
    if min_end > max_end {
        return None;
    }

    for level in BREAKS {
        let found = (min_end..=max_end)
            .rev()
            .find(|&end| level.iter().any(|separator| ends_with(chars, end, separator)));
        if found.is_some() {
            return found;
        }
    }

    // Fall back to any whitespace
    (min_end..=max_end)
        .rev()
        .find(|&end| end > 0 && chars[end - 1].is_whitespace())
}

fn ends_with(chars: &[char], end: usize, separator: &str) -> bool {
    let len = separator.chars().count();
    end >= len && chars[end - len..end].iter().copied().eq(separator.chars())
}
