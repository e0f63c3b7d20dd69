use crate::error::{Result, StorytimeError};
use tracing::debug;

/// A text blob cut into pages of a fixed number of characters.
///
/// Page boundaries fall on `char` boundaries, so a page never splits a UTF-8
/// sequence. Empty text is a single empty page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PagedText {
    text: String,
    page_size: usize,
    /// Byte offset of every page start, followed by `text.len()`.
    offsets: Vec<usize>,
}

impl PagedText {
    pub fn new(text: String, page_size: usize) -> Result<Self> {
        if page_size == 0 {
            return Err(StorytimeError::InvalidPageSize);
        }

        let mut offsets = vec![0];
        for (count, (byte_idx, _)) in text.char_indices().enumerate() {
            if count > 0 && count % page_size == 0 {
                offsets.push(byte_idx);
            }
        }
        offsets.push(text.len());

        debug!(
            "Paginated {} bytes into {} pages of {} chars",
            text.len(),
            offsets.len() - 1,
            page_size
        );

        Ok(Self {
            text,
            page_size,
            offsets,
        })
    }

    /// Always at least 1.
    pub fn total_pages(&self) -> usize {
        self.offsets.len() - 1
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    /// Content of page `index`; indices past the end clamp to the last page.
    pub fn page(&self, index: usize) -> &str {
        let index = index.min(self.total_pages() - 1);
        &self.text[self.offsets[index]..self.offsets[index + 1]]
    }

    pub fn pages(&self) -> impl Iterator<Item = &str> + '_ {
        self.offsets.windows(2).map(|w| &self.text[w[0]..w[1]])
    }

    /// Clamp a requested page into `[0, total_pages - 1]`.
    pub fn clamp_index(&self, requested: i64) -> usize {
        let last = self.total_pages() - 1;
        if requested <= 0 {
            0
        } else {
            usize::try_from(requested).map_or(last, |idx| idx.min(last))
        }
    }
}
