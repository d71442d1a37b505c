//! Purchased-item entitlements owned by the current session.

use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Validation error for [`ItemId`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("item id must not be empty")]
pub struct EmptyItemIdError;

/// Identifier of a purchasable catalogue item (a material pack).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ItemId(String);

impl ItemId {
    /// Validate and construct an [`ItemId`]; surrounding whitespace is trimmed.
    pub fn new(raw: impl AsRef<str>) -> Result<Self, EmptyItemIdError> {
        let trimmed = raw.as_ref().trim();
        if trimmed.is_empty() {
            return Err(EmptyItemIdError);
        }
        Ok(Self(trimmed.to_owned()))
    }
}

impl AsRef<str> for ItemId {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_ref())
    }
}

impl TryFrom<String> for ItemId {
    type Error = EmptyItemIdError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<ItemId> for String {
    fn from(value: ItemId) -> Self {
        value.0
    }
}

/// Set of items the current session may access.
///
/// The set is scoped to a single identity: session state clears it on every
/// login and logout, and it is never persisted.
///
/// # Examples
/// ```
/// use client::domain::{EntitlementSet, ItemId};
///
/// let mut owned = EntitlementSet::default();
/// let item = ItemId::new("oak-planks-4k").expect("valid id");
/// assert!(owned.insert(item.clone()));
/// assert!(!owned.insert(item.clone()));
/// assert!(owned.contains(&item));
/// assert_eq!(owned.len(), 1);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EntitlementSet(HashSet<ItemId>);

impl EntitlementSet {
    /// Insert an item; returns `true` when it was not already owned.
    pub fn insert(&mut self, item: ItemId) -> bool {
        self.0.insert(item)
    }

    /// Membership query.
    pub fn contains(&self, item: &ItemId) -> bool {
        self.0.contains(item)
    }

    /// Number of owned items.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether no items are owned.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Drop every entitlement.
    pub fn clear(&mut self) {
        self.0.clear();
    }

    /// Owned items in a stable (sorted) order.
    pub fn sorted(&self) -> Vec<ItemId> {
        let mut items: Vec<ItemId> = self.0.iter().cloned().collect();
        items.sort();
        items
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("")]
    #[case("   ")]
    fn blank_item_ids_are_rejected(#[case] raw: &str) {
        assert_eq!(ItemId::new(raw), Err(EmptyItemIdError));
    }

    #[rstest]
    fn item_ids_are_trimmed() {
        let item = ItemId::new("  brick-wall  ").expect("valid id");
        assert_eq!(item.as_ref(), "brick-wall");
    }

    #[rstest]
    fn clear_empties_the_set() {
        let mut owned = EntitlementSet::default();
        owned.insert(ItemId::new("a").expect("id"));
        owned.insert(ItemId::new("b").expect("id"));
        owned.clear();
        assert!(owned.is_empty());
    }

    #[rstest]
    fn sorted_lists_items_in_order() {
        let mut owned = EntitlementSet::default();
        for raw in ["moss", "granite", "birch"] {
            owned.insert(ItemId::new(raw).expect("id"));
        }
        let names: Vec<String> = owned.sorted().into_iter().map(String::from).collect();
        assert_eq!(names, ["birch", "granite", "moss"]);
    }
}
