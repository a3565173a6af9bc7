//! Per-plugin annotation storage.
//!
//! Every namespace, entity and property carries a [`DataBag`]. A plugin
//! defines its own annotation structs and reaches them through typed
//! accessors, so many plugins can decorate the same graph without
//! colliding.

use std::any::{Any, TypeId};
use std::collections::BTreeMap;
use std::fmt;

/// A plugin-owned annotation stored in a [`DataBag`].
pub trait Annotation: Any + Send + Sync {
    /// Identifier of the plugin owning this annotation.
    const PLUGIN: &'static str;
}

type Slot = (&'static str, TypeId);

/// Typed map of plugin annotations.
#[derive(Default)]
pub struct DataBag {
    slots: BTreeMap<Slot, Box<dyn Any + Send + Sync>>,
}

fn slot<T: Annotation>() -> Slot {
    (T::PLUGIN, TypeId::of::<T>())
}

impl DataBag {
    /// Create an empty bag.
    pub fn new() -> Self {
        Self::default()
    }

    /// Get an annotation.
    pub fn get<T: Annotation>(&self) -> Option<&T> {
        self.slots.get(&slot::<T>()).and_then(|b| b.downcast_ref())
    }

    /// Get an annotation mutably.
    pub fn get_mut<T: Annotation>(&mut self) -> Option<&mut T> {
        self.slots.get_mut(&slot::<T>()).and_then(|b| b.downcast_mut())
    }

    /// Get an annotation, inserting its default first if absent.
    pub fn get_or_insert_default<T: Annotation + Default>(&mut self) -> &mut T {
        let boxed = self
            .slots
            .entry(slot::<T>())
            .or_insert_with(|| Box::new(T::default()));
        // The slot key pins the concrete type.
        match boxed.downcast_mut::<T>() {
            Some(value) => value,
            None => unreachable!("data bag slot holds a foreign type"),
        }
    }

    /// Insert an annotation, returning the previous value.
    pub fn insert<T: Annotation>(&mut self, value: T) -> Option<T> {
        self.slots
            .insert(slot::<T>(), Box::new(value))
            .and_then(|old| old.downcast::<T>().ok())
            .map(|old| *old)
    }

    /// Remove an annotation.
    pub fn remove<T: Annotation>(&mut self) -> Option<T> {
        self.slots
            .remove(&slot::<T>())
            .and_then(|old| old.downcast::<T>().ok())
            .map(|old| *old)
    }

    /// Check whether an annotation is present.
    pub fn contains<T: Annotation>(&self) -> bool {
        self.slots.contains_key(&slot::<T>())
    }

    /// Plugins with at least one annotation in this bag.
    pub fn plugins(&self) -> impl Iterator<Item = &'static str> + '_ {
        let mut last = None;
        self.slots.keys().filter_map(move |(plugin, _)| {
            if last == Some(*plugin) {
                None
            } else {
                last = Some(*plugin);
                Some(*plugin)
            }
        })
    }

    /// Check whether the bag is empty.
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

impl fmt::Debug for DataBag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DataBag")
            .field("plugins", &self.plugins().collect::<Vec<_>>())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Default, PartialEq)]
    struct Tagged {
        label: String,
    }

    impl Annotation for Tagged {
        const PLUGIN: &'static str = "tagging";
    }

    #[derive(Debug, Default, PartialEq)]
    struct Counted(u32);

    impl Annotation for Counted {
        const PLUGIN: &'static str = "counting";
    }

    #[test]
    fn test_insert_and_get() {
        let mut bag = DataBag::new();
        assert!(bag.get::<Tagged>().is_none());

        bag.insert(Tagged {
            label: "first".into(),
        });
        assert_eq!(bag.get::<Tagged>().map(|t| t.label.as_str()), Some("first"));
        assert!(bag.get::<Counted>().is_none());

        let previous = bag.insert(Tagged {
            label: "second".into(),
        });
        assert_eq!(previous.map(|t| t.label), Some("first".to_string()));
    }

    #[test]
    fn test_get_or_insert_default() {
        let mut bag = DataBag::new();
        bag.get_or_insert_default::<Counted>().0 += 2;
        bag.get_or_insert_default::<Counted>().0 += 3;
        assert_eq!(bag.get::<Counted>(), Some(&Counted(5)));
    }

    #[test]
    fn test_plugins_and_remove() {
        let mut bag = DataBag::new();
        bag.insert(Counted(1));
        bag.insert(Tagged::default());
        assert_eq!(bag.plugins().collect::<Vec<_>>(), vec!["counting", "tagging"]);

        assert_eq!(bag.remove::<Counted>(), Some(Counted(1)));
        assert!(!bag.contains::<Counted>());
        assert!(!bag.is_empty());
    }
}
