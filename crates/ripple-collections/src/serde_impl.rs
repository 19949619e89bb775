#![forbid(unsafe_code)]

//! `serde` support: containers serialize as their contents.
//!
//! Lists serialize in index order, stacks top to bottom, maps as maps.
//! Caching wrappers serialize their contents only; deserializing one yields
//! an unbounded wrapper. Subscribers are never serialized.

use std::hash::Hash;

use ahash::AHashMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::caching::{CachingList, CachingMap, CachingStack, EvictionConfig, TrimEnd};
use crate::list::ObservableList;
use crate::map::ObservableMap;
use crate::stack::ObservableStack;

impl<T: Serialize> Serialize for ObservableList<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.iter())
    }
}

impl<'de, T: Deserialize<'de>> Deserialize<'de> for ObservableList<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Vec::<T>::deserialize(deserializer).map(Self::from_vec)
    }
}

impl<T: Serialize> Serialize for ObservableStack<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.iter())
    }
}

impl<'de, T: Deserialize<'de>> Deserialize<'de> for ObservableStack<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Vec::<T>::deserialize(deserializer).map(Self::from_top_first)
    }
}

impl<K: Serialize, V: Serialize> Serialize for ObservableMap<K, V> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_map(self.iter())
    }
}

impl<'de, K, V> Deserialize<'de> for ObservableMap<K, V>
where
    K: Deserialize<'de> + Eq + Hash,
    V: Deserialize<'de>,
{
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        AHashMap::<K, V>::deserialize(deserializer).map(Self::from)
    }
}

impl<T: Serialize> Serialize for CachingList<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        (**self).serialize(serializer)
    }
}

impl<'de, T: Deserialize<'de>> Deserialize<'de> for CachingList<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        ObservableList::deserialize(deserializer)
            .map(|list| Self::from_list(list, EvictionConfig::unbounded()))
    }
}

impl<T: Serialize> Serialize for CachingStack<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        (**self).serialize(serializer)
    }
}

impl<'de, T: Deserialize<'de>> Deserialize<'de> for CachingStack<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let config = EvictionConfig::unbounded().with_trim_end(TrimEnd::End);
        ObservableStack::deserialize(deserializer).map(|stack| Self::from_stack(stack, config))
    }
}

impl<K: Serialize, V: Serialize> Serialize for CachingMap<K, V> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        (**self).serialize(serializer)
    }
}

impl<'de, K, V> Deserialize<'de> for CachingMap<K, V>
where
    K: Deserialize<'de> + Eq + Hash + Clone,
    V: Deserialize<'de>,
{
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        ObservableMap::deserialize(deserializer)
            .map(|map| Self::from_map(map, EvictionConfig::unbounded()))
    }
}
