use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Elements of an embedded collection are addressed by their own id.
pub trait Keyed {
    fn key(&self) -> Uuid;
}

/// Ordered, id-keyed collection embedded in a parent document.
///
/// New elements go to the head, so iteration yields most-recent-first.
/// All removal is by identity or predicate; callers never handle indices.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EmbeddedList<T>(Vec<T>);

impl<T> Default for EmbeddedList<T> {
    fn default() -> Self {
        Self(Vec::new())
    }
}

impl<T: Keyed> EmbeddedList<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.0.iter()
    }

    pub fn find(&self, id: Uuid) -> Option<&T> {
        self.0.iter().find(|item| item.key() == id)
    }

    pub fn any(&self, predicate: impl Fn(&T) -> bool) -> bool {
        self.0.iter().any(predicate)
    }

    pub fn insert_head(&mut self, item: T) {
        self.0.insert(0, item);
    }

    /// Remove the element with the given id, returning it if present.
    pub fn remove_by_id(&mut self, id: Uuid) -> Option<T> {
        let position = self.0.iter().position(|item| item.key() == id)?;
        Some(self.0.remove(position))
    }

    /// Remove the first element (in sequence order) matching `predicate`.
    pub fn remove_first_where(&mut self, predicate: impl Fn(&T) -> bool) -> Option<T> {
        let position = self.0.iter().position(predicate)?;
        Some(self.0.remove(position))
    }

    pub fn as_slice(&self) -> &[T] {
        &self.0
    }
}

impl<T> From<Vec<T>> for EmbeddedList<T> {
    fn from(items: Vec<T>) -> Self {
        Self(items)
    }
}

impl<'a, T> IntoIterator for &'a EmbeddedList<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    struct Item {
        id: Uuid,
        tag: &'static str,
    }

    impl Keyed for Item {
        fn key(&self) -> Uuid {
            self.id
        }
    }

    fn item(tag: &'static str) -> Item {
        Item { id: Uuid::new_v4(), tag }
    }

    #[test]
    fn test_insert_head_orders_newest_first() {
        let mut list = EmbeddedList::new();
        list.insert_head(item("first"));
        list.insert_head(item("second"));
        let tags: Vec<_> = list.iter().map(|i| i.tag).collect();
        assert_eq!(tags, vec!["second", "first"]);
    }

    #[test]
    fn test_remove_by_id_removes_only_target() {
        let a = item("a");
        let b = item("b");
        let c = item("c");
        let mut list = EmbeddedList::from(vec![a.clone(), b.clone(), c.clone()]);

        assert_eq!(list.remove_by_id(b.id), Some(b));
        assert_eq!(list.as_slice(), &[a, c]);
    }

    #[test]
    fn test_remove_missing_id_is_none_and_unchanged() {
        let a = item("a");
        let mut list = EmbeddedList::from(vec![a.clone()]);
        assert_eq!(list.remove_by_id(Uuid::new_v4()), None);
        assert_eq!(list.as_slice(), &[a]);
    }

    #[test]
    fn test_remove_first_where_takes_earliest_match() {
        let first = item("dup");
        let second = item("dup");
        let mut list = EmbeddedList::from(vec![first.clone(), second.clone()]);

        assert_eq!(list.remove_first_where(|i| i.tag == "dup"), Some(first));
        assert_eq!(list.as_slice(), &[second]);
    }
}
