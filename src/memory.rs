// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2025 Daniel Negri
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program. If not, see <https://www.gnu.org/licenses/>.

//! In-process reference stores.
//!
//! [`MemoryItemStore`] and [`MemoryLedger`] back the CLI, the demo server,
//! and the test suite. Both use [`DashMap`] so independent items and users
//! can be touched concurrently; each trait call is atomic on its own.

use crate::base::{ItemId, UserId};
use crate::error::StoreError;
use crate::store::{ItemRecord, ItemStore, UserLedger, UserRecord};
use dashmap::DashMap;

/// Item catalog held in memory.
#[derive(Debug, Default)]
pub struct MemoryItemStore {
    items: DashMap<ItemId, ItemRecord>,
}

impl MemoryItemStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces an item.
    pub fn insert_item(&self, id: ItemId, record: ItemRecord) {
        self.items.insert(id, record);
    }

    /// Overwrites an item's daily price, leaving bookings untouched.
    ///
    /// Exists so tests can show that `total_price` is frozen at creation.
    pub fn set_price(&self, id: &ItemId, price: u64) -> Result<(), StoreError> {
        let mut item = self.items.get_mut(id).ok_or(StoreError::NotFound)?;
        item.price = price;
        Ok(())
    }

    /// Deletes an item, simulating catalog CRUD happening elsewhere.
    pub fn remove_item(&self, id: &ItemId) {
        self.items.remove(id);
    }
}

impl ItemStore for MemoryItemStore {
    fn get_item(&self, id: &ItemId) -> Result<Option<ItemRecord>, StoreError> {
        Ok(self.items.get(id).map(|item| item.value().clone()))
    }

    fn set_available(&self, id: &ItemId, available: bool) -> Result<(), StoreError> {
        let mut item = self.items.get_mut(id).ok_or(StoreError::NotFound)?;
        item.available = available;
        Ok(())
    }

    fn owned_by(&self, owner: &UserId) -> Result<Vec<ItemId>, StoreError> {
        Ok(self
            .items
            .iter()
            .filter(|entry| &entry.owner == owner)
            .map(|entry| entry.key().clone())
            .collect())
    }
}

/// User ledger held in memory.
#[derive(Debug, Default)]
pub struct MemoryLedger {
    users: DashMap<UserId, UserRecord>,
}

impl MemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces a user account.
    pub fn insert_user(&self, id: UserId, record: UserRecord) {
        self.users.insert(id, record);
    }

    /// Current balance, for assertions and reports. `None` for unknown users.
    pub fn credits_of(&self, id: &UserId) -> Option<u64> {
        self.users.get(id).map(|user| user.credits)
    }

    /// All accounts, sorted by id for stable report output.
    pub fn snapshot(&self) -> Vec<(UserId, UserRecord)> {
        let mut rows: Vec<(UserId, UserRecord)> = self
            .users
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().clone()))
            .collect();
        rows.sort_by(|a, b| a.0.cmp(&b.0));
        rows
    }
}

impl UserLedger for MemoryLedger {
    fn get_user(&self, id: &UserId) -> Result<Option<UserRecord>, StoreError> {
        Ok(self.users.get(id).map(|user| user.value().clone()))
    }

    fn adjust_credits(&self, id: &UserId, delta: i64) -> Result<(), StoreError> {
        // get_mut keeps the check-and-apply atomic per user.
        let mut user = self.users.get_mut(id).ok_or(StoreError::NotFound)?;
        let next = (user.credits as i64).checked_add(delta);
        match next {
            Some(value) if value >= 0 => {
                user.credits = value as u64;
                Ok(())
            }
            _ => Err(StoreError::CreditUnderflow),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(credits: u64) -> UserRecord {
        UserRecord {
            name: "Alice".into(),
            email: "alice@example.com".into(),
            image: None,
            credits,
        }
    }

    fn item(owner: &str, price: u64) -> ItemRecord {
        ItemRecord {
            title: "Cordless drill".into(),
            owner: UserId::from(owner),
            price,
            available: true,
        }
    }

    #[test]
    fn adjust_credits_applies_signed_deltas() {
        let ledger = MemoryLedger::new();
        ledger.insert_user(UserId::from("alice"), user(100));

        ledger.adjust_credits(&UserId::from("alice"), -30).unwrap();
        assert_eq!(ledger.credits_of(&UserId::from("alice")), Some(70));

        ledger.adjust_credits(&UserId::from("alice"), 45).unwrap();
        assert_eq!(ledger.credits_of(&UserId::from("alice")), Some(115));
    }

    #[test]
    fn adjust_credits_refuses_underflow() {
        let ledger = MemoryLedger::new();
        ledger.insert_user(UserId::from("alice"), user(10));

        let result = ledger.adjust_credits(&UserId::from("alice"), -11);
        assert_eq!(result, Err(StoreError::CreditUnderflow));
        // Balance unchanged, not clamped.
        assert_eq!(ledger.credits_of(&UserId::from("alice")), Some(10));
    }

    #[test]
    fn adjust_credits_unknown_user_is_not_found() {
        let ledger = MemoryLedger::new();
        let result = ledger.adjust_credits(&UserId::from("ghost"), 5);
        assert_eq!(result, Err(StoreError::NotFound));
    }

    #[test]
    fn set_available_round_trips() {
        let store = MemoryItemStore::new();
        store.insert_item(ItemId::from("drill"), item("alice", 10));

        store.set_available(&ItemId::from("drill"), false).unwrap();
        let record = store.get_item(&ItemId::from("drill")).unwrap().unwrap();
        assert!(!record.available);

        store.set_available(&ItemId::from("drill"), true).unwrap();
        let record = store.get_item(&ItemId::from("drill")).unwrap().unwrap();
        assert!(record.available);
    }

    #[test]
    fn set_available_unknown_item_is_not_found() {
        let store = MemoryItemStore::new();
        let result = store.set_available(&ItemId::from("ghost"), false);
        assert_eq!(result, Err(StoreError::NotFound));
    }

    #[test]
    fn owned_by_filters_on_owner() {
        let store = MemoryItemStore::new();
        store.insert_item(ItemId::from("drill"), item("alice", 10));
        store.insert_item(ItemId::from("tent"), item("alice", 25));
        store.insert_item(ItemId::from("bike"), item("carol", 15));

        let mut owned = store.owned_by(&UserId::from("alice")).unwrap();
        owned.sort();
        assert_eq!(owned, vec![ItemId::from("drill"), ItemId::from("tent")]);
        assert!(store.owned_by(&UserId::from("nobody")).unwrap().is_empty());
    }

    #[test]
    fn snapshot_is_sorted_by_user_id() {
        let ledger = MemoryLedger::new();
        ledger.insert_user(UserId::from("carol"), user(1));
        ledger.insert_user(UserId::from("alice"), user(2));
        ledger.insert_user(UserId::from("bob"), user(3));

        let ids: Vec<String> = ledger.snapshot().into_iter().map(|(id, _)| id.0).collect();
        assert_eq!(ids, vec!["alice", "bob", "carol"]);
    }
}
