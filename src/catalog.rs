//! The ordered list of displayable objects and the cursor over it.

use crate::scene::Model;

/// Which way the cursor moves.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Direction {
    Next,
    Previous,
}

impl Direction {
    /// Maps a `KeyboardEvent.key` value to a direction; anything else is ignored.
    pub fn from_key(key: &str) -> Option<Self> {
        match key {
            "ArrowRight" => Some(Direction::Next),
            "ArrowLeft" => Some(Direction::Previous),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct CatalogEntry {
    name: String,
    pub model: Model,
}

impl CatalogEntry {
    pub fn new(name: impl Into<String>, model: Model) -> Self {
        Self { name: name.into(), model }
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

/// Append-only list with a wrapping cursor. Names may repeat.
#[derive(Debug, Default)]
pub struct Catalog {
    entries: Vec<CatalogEntry>,
    cursor: usize,
}

impl Catalog {
    pub fn new(entries: Vec<CatalogEntry>) -> Self {
        Self { entries, cursor: 0 }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn entries(&self) -> &[CatalogEntry] {
        &self.entries
    }

    pub fn current(&self) -> Option<&CatalogEntry> {
        self.entries.get(self.cursor)
    }

    pub fn current_mut(&mut self) -> Option<&mut CatalogEntry> {
        self.entries.get_mut(self.cursor)
    }

    pub fn entry_mut(&mut self, index: usize) -> Option<&mut CatalogEntry> {
        self.entries.get_mut(index)
    }

    /// Moves the cursor one step, wrapping at both ends. Returns the new entry.
    pub fn step(&mut self, direction: Direction) -> Option<&CatalogEntry> {
        let len = self.entries.len();
        if len == 0 {
            return None;
        }
        self.cursor = match direction {
            Direction::Next => (self.cursor + 1) % len,
            Direction::Previous => (self.cursor + len - 1) % len,
        };
        self.current()
    }

    pub fn advance(&mut self) -> Option<&CatalogEntry> {
        self.step(Direction::Next)
    }

    pub fn retreat(&mut self) -> Option<&CatalogEntry> {
        self.step(Direction::Previous)
    }

    /// Appends an entry; the cursor stays where it is.
    pub fn push(&mut self, entry: CatalogEntry) {
        self.entries.push(entry);
    }

    /// Drops every entry. Only used when the viewer is torn down.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.cursor = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Geometry;

    fn catalog(n: usize) -> Catalog {
        let entries = (0..n)
            .map(|i| {
                let g = Geometry::new(vec![[0.0; 3]; 3], Vec::new(), vec![0, 1, 2]);
                CatalogEntry::new(format!("entry-{i}"), Model::from_geometry(g))
            })
            .collect();
        Catalog::new(entries)
    }

    #[test]
    fn advancing_len_times_returns_to_start() {
        for n in 1..=6 {
            for start in 0..n {
                let mut c = catalog(n);
                for _ in 0..start {
                    c.advance();
                }
                let before = c.current().unwrap().name().to_owned();
                for _ in 0..n {
                    c.advance();
                }
                assert_eq!(c.current().unwrap().name(), before, "n={n} start={start}");
            }
        }
    }

    #[test]
    fn retreat_from_first_selects_last() {
        let mut c = catalog(4);
        assert_eq!(c.retreat().unwrap().name(), "entry-3");
        assert_eq!(c.cursor(), 3);
    }

    #[test]
    fn advance_from_last_selects_first() {
        let mut c = catalog(3);
        c.retreat();
        assert_eq!(c.advance().unwrap().name(), "entry-0");
    }

    #[test]
    fn single_entry_stays_put() {
        let mut c = catalog(1);
        assert_eq!(c.advance().unwrap().name(), "entry-0");
        assert_eq!(c.retreat().unwrap().name(), "entry-0");
    }

    #[test]
    fn empty_catalog_has_no_current() {
        let mut c = Catalog::default();
        assert!(c.advance().is_none());
        assert!(c.current().is_none());
    }

    #[test]
    fn push_keeps_cursor_and_allows_duplicate_names() {
        let mut c = catalog(2);
        c.advance();
        let dup = c.entries()[0].clone();
        c.push(dup);
        assert_eq!(c.len(), 3);
        assert_eq!(c.cursor(), 1);
        assert_eq!(c.entries()[2].name(), c.entries()[0].name());
    }

    #[test]
    fn only_arrow_keys_map_to_directions() {
        assert_eq!(Direction::from_key("ArrowRight"), Some(Direction::Next));
        assert_eq!(Direction::from_key("ArrowLeft"), Some(Direction::Previous));
        assert_eq!(Direction::from_key("Enter"), None);
        assert_eq!(Direction::from_key("arrowright"), None);
    }
}
