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

//! Collaborator contracts consumed by the booking engine.
//!
//! The item catalog, the user ledger, and the identity provider are owned by
//! other services; the engine talks to them through these traits and is
//! handed concrete store handles at construction time. [`crate::memory`]
//! provides the in-process reference implementations.

use crate::base::{ItemId, UserId};
use crate::error::StoreError;
use serde::{Deserialize, Serialize};

/// Catalog row for a lendable item.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ItemRecord {
    pub title: String,
    pub owner: UserId,
    /// Credits per day.
    pub price: u64,
    pub available: bool,
}

/// Ledger row for a user.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UserRecord {
    pub name: String,
    pub email: String,
    pub image: Option<String>,
    pub credits: u64,
}

/// Item catalog contract.
pub trait ItemStore: Send + Sync {
    /// Fetches an item by id. `Ok(None)` when the item does not exist.
    fn get_item(&self, id: &ItemId) -> Result<Option<ItemRecord>, StoreError>;

    /// Writes the availability flag.
    ///
    /// # Errors
    ///
    /// [`StoreError::NotFound`] when the item does not exist.
    fn set_available(&self, id: &ItemId, available: bool) -> Result<(), StoreError>;

    /// Ids of all items owned by `owner`, used by the lent-side queries.
    fn owned_by(&self, owner: &UserId) -> Result<Vec<ItemId>, StoreError>;
}

/// User ledger contract. Balances are mutated only through the engine.
pub trait UserLedger: Send + Sync {
    /// Fetches a user by id. `Ok(None)` when the user does not exist.
    fn get_user(&self, id: &UserId) -> Result<Option<UserRecord>, StoreError>;

    /// Applies `delta` to the user's balance; `delta` may be negative. The
    /// engine validates sufficiency before requesting a debit.
    ///
    /// # Errors
    ///
    /// - [`StoreError::NotFound`] when the user does not exist.
    /// - [`StoreError::CreditUnderflow`] when the result would be negative.
    fn adjust_credits(&self, id: &UserId, delta: i64) -> Result<(), StoreError>;
}

/// Trusted identity for operations keyed off the acting user.
///
/// Supplied by the external authentication provider; queries such as
/// [`crate::Engine::user_history`] accept only this, never a caller-chosen
/// user id.
pub trait IdentityProvider: Send + Sync {
    fn current_user(&self) -> Option<UserId>;
}

/// Identity backed by a fixed session, for tests and demos.
#[derive(Debug, Clone, Default)]
pub struct StaticIdentity(pub Option<UserId>);

impl IdentityProvider for StaticIdentity {
    fn current_user(&self) -> Option<UserId> {
        self.0.clone()
    }
}
