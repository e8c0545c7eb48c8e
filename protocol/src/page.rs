//! Paginated list results.

use serde::{Deserialize, Serialize};

/// One merged window of a list query.
///
/// `items` preserves server return order (creation time descending);
/// `next_offset` is the cursor for the next fetch, or `None` once the
/// server has been exhausted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub next_offset: Option<u32>,
}

impl<T> Page<T> {
    /// Build a page from one raw fetch. A short page (fewer rows than
    /// requested) always exhausts the cursor, even when it carried rows;
    /// an empty page at offset 0 is the terminal "no records" state.
    pub fn from_fetch(items: Vec<T>, offset: u32, limit: u32) -> Self {
        let next_offset = if (items.len() as u32) < limit {
            None
        } else {
            Some(offset + limit)
        };
        Self { items, next_offset }
    }

    pub fn empty() -> Self {
        Self {
            items: Vec::new(),
            next_offset: None,
        }
    }

    pub fn is_exhausted(&self) -> bool {
        self.next_offset.is_none()
    }
}

impl<T> Default for Page<T> {
    fn default() -> Self {
        Self::empty()
    }
}
