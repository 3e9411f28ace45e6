//! Collection helpers

use indexmap::IndexMap;
use std::hash::Hash;

/// Split key/value pairs into a map of agreeing keys and a list of conflicts
///
/// Keys whose values are all equal end up in the map once. A key seen with
/// two or more different values is dropped from the map and every one of
/// its pairs, in input order, goes to the duplicates list.
///
/// ```
/// use hed_core::util::filter_non_equal_duplicates;
///
/// let (map, duplicates) =
///     filter_non_equal_duplicates([("a", 1), ("b", 2), ("a", 1), ("a", 3)]);
/// assert_eq!(map.into_iter().collect::<Vec<_>>(), vec![("b", 2)]);
/// assert_eq!(duplicates, vec![("a", 1), ("a", 1), ("a", 3)]);
/// ```
pub fn filter_non_equal_duplicates<K, V>(
    pairs: impl IntoIterator<Item = (K, V)>,
) -> (IndexMap<K, V>, Vec<(K, V)>)
where
    K: Hash + Eq + Clone,
    V: PartialEq,
{
    let mut grouped: IndexMap<K, Vec<V>> = IndexMap::new();
    for (key, value) in pairs {
        grouped.entry(key).or_default().push(value);
    }

    let mut map = IndexMap::new();
    let mut conflicting: IndexMap<K, Vec<V>> = IndexMap::new();
    for (key, mut values) in grouped {
        let agree = values.windows(2).all(|pair| pair[0] == pair[1]);
        if agree {
            if let Some(value) = values.pop() {
                map.insert(key, value);
            }
        } else {
            conflicting.insert(key, values);
        }
    }

    let duplicates = conflicting
        .into_iter()
        .flat_map(|(key, values)| values.into_iter().map(move |value| (key.clone(), value)))
        .collect();
    (map, duplicates)
}
