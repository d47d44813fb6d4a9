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

//! Read-only query layer for dashboards.
//!
//! These operations never mutate bookings, items, or balances. They feed
//! non-critical dashboard surfaces, so a store fault here degrades to an
//! empty result (logged at `warn!`) instead of failing the caller — a policy
//! that never applies to the write path in [`crate::engine`].

use crate::base::{ItemId, UserId};
use crate::booking::{Booking, BookingStatus};
use crate::engine::Engine;
use crate::error::StoreError;
use crate::store::IdentityProvider;
use serde::Serialize;
use std::collections::HashSet;

/// Denormalized user identity for display, joined at query time.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct UserSummary {
    pub id: UserId,
    pub name: String,
    pub email: String,
    pub image: Option<String>,
}

/// Denormalized item identity for display, joined at query time.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ItemSummary {
    pub id: ItemId,
    pub title: String,
    pub price: u64,
    pub owner: UserId,
}

/// A booking joined with the identities a dashboard needs to render it.
#[derive(Debug, Clone, Serialize)]
pub struct BookingView {
    pub booking: Booking,
    pub item: ItemSummary,
    pub owner: UserSummary,
    pub borrower: UserSummary,
}

/// Bookings involving one user, from both sides of the marketplace.
#[derive(Debug, Clone, Default, Serialize)]
pub struct UserBookings {
    /// Bookings where the user is the borrower, newest first.
    pub borrowed: Vec<BookingView>,
    /// Bookings against items the user owns, newest first.
    pub lent: Vec<BookingView>,
}

/// Aggregate counts shown on a public profile.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub struct ProfileStats {
    /// Bookings of the user's items that reached `approved` or `returned`.
    pub lending_count: usize,
    /// The user's own bookings that reached `approved` or `returned`.
    pub borrowing_count: usize,
    /// Items the user has listed.
    pub items_count: usize,
}

fn counts_for_profile(status: BookingStatus) -> bool {
    matches!(status, BookingStatus::Approved | BookingStatus::Returned)
}

impl Engine {
    /// Bookings where the user is the borrower, and bookings against the
    /// user's items, each sorted newest-created-first.
    ///
    /// Entries carry the joined item/owner/borrower identity for display.
    /// A store fault degrades to empty lists.
    pub fn bookings_by_user(&self, user_id: &UserId) -> UserBookings {
        match self.try_bookings_by_user(user_id) {
            Ok(bookings) => bookings,
            Err(err) => {
                tracing::warn!(user = %user_id, error = %err, "booking query degraded to empty");
                UserBookings::default()
            }
        }
    }

    fn try_bookings_by_user(&self, user_id: &UserId) -> Result<UserBookings, StoreError> {
        let owned: HashSet<ItemId> = self
            .item_store()
            .owned_by(user_id)?
            .into_iter()
            .collect();

        let mut borrowed = Vec::new();
        let mut lent = Vec::new();
        for entry in self.bookings.iter() {
            if &entry.borrower == user_id {
                if let Some(view) = self.join_booking(&entry)? {
                    borrowed.push(view);
                }
            }
            if owned.contains(&entry.item) {
                if let Some(view) = self.join_booking(&entry)? {
                    lent.push(view);
                }
            }
        }
        sort_newest_first(&mut borrowed);
        sort_newest_first(&mut lent);
        Ok(UserBookings { borrowed, lent })
    }

    /// Count of `pending` bookings against the user's items.
    ///
    /// Backs notification badges, so it only counts — no views are built.
    /// A store fault degrades to 0.
    pub fn pending_lender_count(&self, user_id: &UserId) -> usize {
        let owned: HashSet<ItemId> = match self.item_store().owned_by(user_id) {
            Ok(ids) => ids.into_iter().collect(),
            Err(err) => {
                tracing::warn!(user = %user_id, error = %err, "pending count degraded to zero");
                return 0;
            }
        };
        self.bookings
            .iter()
            .filter(|booking| booking.status == BookingStatus::Pending && owned.contains(&booking.item))
            .count()
    }

    /// [`Self::bookings_by_user`] keyed off the authenticated identity only.
    ///
    /// Returns `None` when no user is signed in; there is no way to request
    /// another user's history through this operation.
    pub fn user_history(&self, identity: &dyn IdentityProvider) -> Option<UserBookings> {
        let user_id = identity.current_user()?;
        Some(self.bookings_by_user(&user_id))
    }

    /// Lending/borrowing/listing counts for a public profile.
    ///
    /// Returns `None` for an unknown user; a store fault also degrades to
    /// `None`.
    pub fn profile_stats(&self, user_id: &UserId) -> Option<ProfileStats> {
        let looked_up = match self.user_ledger().get_user(user_id) {
            Ok(user) => user,
            Err(err) => {
                tracing::warn!(user = %user_id, error = %err, "profile stats degraded to none");
                return None;
            }
        };
        looked_up?;

        let owned: HashSet<ItemId> = match self.item_store().owned_by(user_id) {
            Ok(ids) => ids.into_iter().collect(),
            Err(err) => {
                tracing::warn!(user = %user_id, error = %err, "profile stats degraded to none");
                return None;
            }
        };

        let mut lending_count = 0;
        let mut borrowing_count = 0;
        for booking in self.bookings.iter() {
            if !counts_for_profile(booking.status) {
                continue;
            }
            if owned.contains(&booking.item) {
                lending_count += 1;
            }
            if &booking.borrower == user_id {
                borrowing_count += 1;
            }
        }

        Some(ProfileStats {
            lending_count,
            borrowing_count,
            items_count: owned.len(),
        })
    }

    /// Joins one booking with its item and counterparty records.
    ///
    /// A booking whose item or user records have vanished is dropped from
    /// the listing (with a `warn!`) rather than failing the whole query.
    fn join_booking(&self, booking: &Booking) -> Result<Option<BookingView>, StoreError> {
        let Some(item) = self.item_store().get_item(&booking.item)? else {
            tracing::warn!(booking = %booking.id, item = %booking.item, "skipping booking with missing item");
            return Ok(None);
        };
        let Some(owner) = self.user_ledger().get_user(&item.owner)? else {
            tracing::warn!(booking = %booking.id, user = %item.owner, "skipping booking with missing owner");
            return Ok(None);
        };
        let Some(borrower) = self.user_ledger().get_user(&booking.borrower)? else {
            tracing::warn!(booking = %booking.id, user = %booking.borrower, "skipping booking with missing borrower");
            return Ok(None);
        };

        Ok(Some(BookingView {
            booking: booking.clone(),
            item: ItemSummary {
                id: booking.item.clone(),
                title: item.title,
                price: item.price,
                owner: item.owner.clone(),
            },
            owner: UserSummary {
                id: item.owner,
                name: owner.name,
                email: owner.email,
                image: owner.image,
            },
            borrower: UserSummary {
                id: booking.borrower.clone(),
                name: borrower.name,
                email: borrower.email,
                image: borrower.image,
            },
        }))
    }
}

fn sort_newest_first(views: &mut [BookingView]) {
    views.sort_by(|a, b| {
        b.booking
            .created_at
            .cmp(&a.booking.created_at)
            .then(b.booking.id.cmp(&a.booking.id))
    });
}
