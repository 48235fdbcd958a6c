//! Item Collection Module
//!
//! Ordered, keyed result of a multi-key fetch. Only hits are included.

use std::collections::HashMap;

use crate::backend::Backend;
use crate::cache::Item;

// == Item Collection ==
/// Immutable set of items in the order their keys were requested.
#[derive(Debug)]
pub struct ItemCollection<B: Backend> {
    items: Vec<Item<B>>,
    index: HashMap<String, usize>,
}

impl<B: Backend> ItemCollection<B> {
    /// Builds the collection. A repeated key keeps its first position.
    pub(crate) fn new(items: Vec<Item<B>>) -> Self {
        let mut index = HashMap::with_capacity(items.len());
        let mut unique = Vec::with_capacity(items.len());

        for item in items {
            if !index.contains_key(item.key()) {
                index.insert(item.key().to_string(), unique.len());
                unique.push(item);
            }
        }

        Self {
            items: unique,
            index,
        }
    }

    /// Items in insertion order.
    pub fn iter(&self) -> std::slice::Iter<'_, Item<B>> {
        self.items.iter()
    }

    /// Looks up an item by key. Unknown keys return `None`.
    pub fn get_item(&self, key: &str) -> Option<&Item<B>> {
        self.index.get(key).map(|&pos| &self.items[pos])
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.items.iter().map(Item::key)
    }

    /// Number of hits held.
    pub fn count(&self) -> usize {
        self.items.len()
    }

    /// Same as [`ItemCollection::count`], under the std collection name.
    pub fn len(&self) -> usize {
        self.count()
    }

    /// True when none of the requested keys were hits.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl<'a, B: Backend> IntoIterator for &'a ItemCollection<B> {
    type Item = &'a Item<B>;
    type IntoIter = std::slice::Iter<'a, Item<B>>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

impl<B: Backend> IntoIterator for ItemCollection<B> {
    type Item = Item<B>;
    type IntoIter = std::vec::IntoIter<Item<B>>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}
