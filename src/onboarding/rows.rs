//! Dynamic form rows that can never be emptied.

/// A list of form rows with at least one row at all times.
///
/// Removing the only row is refused; the form shows the remove button as
/// disabled (`can_remove() == false`).
#[derive(Debug, Clone, PartialEq)]
pub struct RowList<T> {
    rows: Vec<T>,
}

impl<T: Default> RowList<T> {
    /// One blank row.
    pub fn new() -> Self {
        Self {
            rows: vec![T::default()],
        }
    }

    /// Seed from saved rows; an empty list still yields one blank row.
    pub fn from_rows(rows: Vec<T>) -> Self {
        if rows.is_empty() {
            Self::new()
        } else {
            Self { rows }
        }
    }

    /// Append a blank row and return it for editing.
    pub fn add(&mut self) -> &mut T {
        self.rows.push(T::default());
        let last = self.rows.len() - 1;
        &mut self.rows[last]
    }
}

impl<T> RowList<T> {
    /// Remove the row at `index`. Returns false (and changes nothing) when it
    /// is the last row or the index is out of range.
    pub fn remove(&mut self, index: usize) -> bool {
        if !self.can_remove() || index >= self.rows.len() {
            return false;
        }
        self.rows.remove(index);
        true
    }

    pub fn can_remove(&self) -> bool {
        self.rows.len() > 1
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Always false; kept for API symmetry with `len`.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&T> {
        self.rows.get(index)
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut T> {
        self.rows.get_mut(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.rows.iter()
    }
}

impl<T: Default> Default for RowList<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a, T> IntoIterator for &'a RowList<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_with_one_blank_row() {
        let rows: RowList<String> = RowList::new();
        assert_eq!(rows.len(), 1);
        assert!(!rows.can_remove());
        assert!(!rows.is_empty());
    }

    #[test]
    fn removing_sole_row_is_noop() {
        let mut rows: RowList<String> = RowList::new();
        *rows.get_mut(0).unwrap() = "kept".into();
        assert!(!rows.remove(0));
        assert_eq!(rows.len(), 1);
        assert_eq!(rows.get(0).map(String::as_str), Some("kept"));
    }

    #[test]
    fn add_and_remove() {
        let mut rows: RowList<String> = RowList::new();
        rows.add().push_str("second");
        rows.add().push_str("third");
        assert_eq!(rows.len(), 3);

        assert!(rows.remove(1));
        let left: Vec<&str> = rows.iter().map(String::as_str).collect();
        assert_eq!(left, vec!["", "third"]);

        assert!(!rows.remove(7));
        assert!(rows.remove(0));
        assert!(!rows.remove(0));
        assert_eq!(rows.len(), 1);
    }

    #[test]
    fn from_empty_rows_yields_blank_row() {
        let rows: RowList<u8> = RowList::from_rows(Vec::new());
        assert_eq!(rows.len(), 1);
        let rows = RowList::from_rows(vec![1u8, 2]);
        assert_eq!(rows.len(), 2);
    }
}
