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

//! Booking engine.
//!
//! The [`Engine`] owns booking records and drives the credit escrow tied to
//! the booking lifecycle. Creating a booking debits the borrower and parks
//! the amount in escrow; a rejection refunds it; a return pays it out to the
//! item owner.
//!
//! # Atomicity
//!
//! Each operation is one all-or-nothing unit. All reads and writes for an
//! item happen inside that item's critical section (a keyed
//! [`parking_lot::Mutex`]), so two concurrent bookings cannot both observe
//! `available == true`, and two concurrent transitions cannot double-apply a
//! transfer. Balance checks and debits additionally hold the affected user's
//! lock. If a store write fails mid-unit, the effects already applied are
//! reversed before the error is returned.

use crate::base::{BookingId, ItemId, UserId};
use crate::booking::{Booking, BookingStatus, CreditEffect};
use crate::error::BookingError;
use crate::store::{ItemStore, UserLedger};
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use parking_lot::Mutex;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

/// Request to create a booking.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct CreateBooking {
    pub item_id: ItemId,
    pub borrower: UserId,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
}

/// Number of billable days between two instants.
///
/// Any fraction of a day rounds up, so a positive sub-day range bills one
/// full day. Inherited pricing policy: a one-hour booking costs a day.
pub fn duration_days(start: DateTime<Utc>, end: DateTime<Utc>) -> u64 {
    const DAY_MS: i64 = 24 * 60 * 60 * 1000;
    debug_assert!(end > start, "caller validates the date range");
    ((end - start).num_milliseconds() as u64).div_ceil(DAY_MS as u64).max(1)
}

/// Booking engine over injected item-store and ledger handles.
///
/// # Invariants
///
/// - A user's balance never goes negative: debits are preceded by a
///   sufficiency check under that user's lock.
/// - At most one booking per item is in a non-terminal status; the item's
///   `available` flag is false exactly while such a booking exists.
/// - `total_price` is written once at creation and never recomputed.
/// - The owner is credited only on `approved → returned` (escrow).
pub struct Engine {
    items: Arc<dyn ItemStore>,
    ledger: Arc<dyn UserLedger>,
    /// Booking records indexed by id.
    pub(crate) bookings: DashMap<BookingId, Booking>,
    /// Per-item critical sections serializing check-then-set on `available`.
    item_locks: DashMap<ItemId, Arc<Mutex<()>>>,
    /// Per-user critical sections serializing balance check + debit.
    user_locks: DashMap<UserId, Arc<Mutex<()>>>,
    booking_seq: AtomicU64,
}

impl Engine {
    /// Creates an engine over the given collaborator stores.
    pub fn new(items: Arc<dyn ItemStore>, ledger: Arc<dyn UserLedger>) -> Self {
        Engine {
            items,
            ledger,
            bookings: DashMap::new(),
            item_locks: DashMap::new(),
            user_locks: DashMap::new(),
            booking_seq: AtomicU64::new(0),
        }
    }

    pub(crate) fn item_store(&self) -> &dyn ItemStore {
        self.items.as_ref()
    }

    pub(crate) fn user_ledger(&self) -> &dyn UserLedger {
        self.ledger.as_ref()
    }

    // Lock order is always item before user; at most one of each is held.
    fn item_lock(&self, id: &ItemId) -> Arc<Mutex<()>> {
        self.item_locks.entry(id.clone()).or_default().clone()
    }

    fn user_lock(&self, id: &UserId) -> Arc<Mutex<()>> {
        self.user_locks.entry(id.clone()).or_default().clone()
    }

    /// Creates a booking in `pending` status.
    ///
    /// Validates in order: required fields, date range, item existence,
    /// availability, self-booking, borrower existence, credit sufficiency.
    /// On success the borrower is debited `ceil(duration) * price`, the
    /// booking is recorded with that price frozen, and the item is flipped
    /// unavailable — all inside the item's critical section. The owner is
    /// not credited until the item comes back.
    ///
    /// # Errors
    ///
    /// - [`BookingError::MissingField`] - `item_id` or `borrower` is empty.
    /// - [`BookingError::InvalidDateRange`] - end not after start.
    /// - [`BookingError::ItemNotFound`] / [`BookingError::BorrowerNotFound`]
    ///   - referenced records absent.
    /// - [`BookingError::ItemUnavailable`] - another active booking holds
    ///   the item.
    /// - [`BookingError::SelfBooking`] - borrower owns the item.
    /// - [`BookingError::InsufficientCredits`] - balance below the computed
    ///   price; reports both amounts.
    /// - [`BookingError::Persistence`] - a store write failed; any partial
    ///   effect has been rolled back.
    pub fn create_booking(&self, request: CreateBooking) -> Result<BookingId, BookingError> {
        let CreateBooking {
            item_id,
            borrower,
            start_date,
            end_date,
        } = request;

        if item_id.is_empty() {
            return Err(BookingError::MissingField("itemId"));
        }
        if borrower.is_empty() {
            return Err(BookingError::MissingField("borrower"));
        }
        if end_date <= start_date {
            return Err(BookingError::InvalidDateRange);
        }

        let item_lock = self.item_lock(&item_id);
        let _item_guard = item_lock.lock();

        let item = self
            .items
            .get_item(&item_id)?
            .ok_or(BookingError::ItemNotFound)?;
        if !item.available {
            return Err(BookingError::ItemUnavailable);
        }
        if item.owner == borrower {
            return Err(BookingError::SelfBooking);
        }

        let user_lock = self.user_lock(&borrower);
        let _user_guard = user_lock.lock();

        let user = self
            .ledger
            .get_user(&borrower)?
            .ok_or(BookingError::BorrowerNotFound)?;

        let total_price = duration_days(start_date, end_date).saturating_mul(item.price);
        if user.credits < total_price {
            return Err(BookingError::InsufficientCredits {
                required: total_price,
                available: user.credits,
            });
        }

        // Escrow: debit now, pay the owner only on return.
        self.ledger.adjust_credits(&borrower, -(total_price as i64))?;

        let id = BookingId(self.booking_seq.fetch_add(1, Ordering::Relaxed) + 1);
        let booking = Booking {
            id,
            item: item_id.clone(),
            borrower: borrower.clone(),
            start_date,
            end_date,
            total_price,
            status: BookingStatus::Pending,
            created_at: Utc::now(),
        };
        self.bookings.insert(id, booking);

        if let Err(err) = self.items.set_available(&item_id, false) {
            // Unwind the debit and the record so nothing partial survives.
            self.bookings.remove(&id);
            if let Err(revert) = self.ledger.adjust_credits(&borrower, total_price as i64) {
                tracing::error!(
                    booking = %id,
                    user = %borrower,
                    error = %revert,
                    "failed to revert debit while unwinding booking creation"
                );
            }
            return Err(err.into());
        }

        tracing::info!(
            booking = %id,
            item = %item_id,
            borrower = %borrower,
            total_price,
            "booking created"
        );
        Ok(id)
    }

    /// Applies a status transition and its credit/availability effects.
    ///
    /// The transfer is decided from the status as it stands *before* the
    /// overwrite, looked up in the [`BookingStatus::transition`] table:
    /// `pending → rejected` refunds the borrower, `approved → returned` pays
    /// the owner, everything else moves nothing. Transitions out of a
    /// terminal status, and re-applying the current status, are rejected
    /// outright, so a duplicate call can never double-apply a transfer.
    ///
    /// # Errors
    ///
    /// - [`BookingError::BookingNotFound`] - no such booking.
    /// - [`BookingError::ItemNotFound`] - the booked item has vanished from
    ///   the catalog; nothing is changed.
    /// - [`BookingError::InvalidTransition`] - `(current, new)` is not in
    ///   the table.
    /// - [`BookingError::Persistence`] - a store write failed; the unit was
    ///   rolled back.
    pub fn update_status(
        &self,
        booking_id: BookingId,
        new_status: BookingStatus,
    ) -> Result<(), BookingError> {
        let item_id = self
            .bookings
            .get(&booking_id)
            .ok_or(BookingError::BookingNotFound)?
            .item
            .clone();

        let item_lock = self.item_lock(&item_id);
        let _item_guard = item_lock.lock();

        let (previous, total_price, borrower) = {
            let booking = self
                .bookings
                .get(&booking_id)
                .ok_or(BookingError::BookingNotFound)?;
            (booking.status, booking.total_price, booking.borrower.clone())
        };
        let effect = previous.transition(new_status)?;

        let item = self
            .items
            .get_item(&item_id)?
            .ok_or(BookingError::ItemNotFound)?;

        let credited = match effect.credit {
            CreditEffect::None => None,
            CreditEffect::RefundBorrower => Some(borrower),
            CreditEffect::PayOwner => Some(item.owner),
        };

        if let Some(user) = &credited {
            let user_lock = self.user_lock(user);
            let _user_guard = user_lock.lock();
            self.ledger.adjust_credits(user, total_price as i64)?;
        }

        if let Some(mut booking) = self.bookings.get_mut(&booking_id) {
            booking.status = new_status;
        }

        if effect.frees_item {
            if let Err(err) = self.items.set_available(&item_id, true) {
                // Put the status and the transfer back the way they were.
                if let Some(mut booking) = self.bookings.get_mut(&booking_id) {
                    booking.status = previous;
                }
                if let Some(user) = &credited {
                    if let Err(revert) = self.ledger.adjust_credits(user, -(total_price as i64)) {
                        tracing::error!(
                            booking = %booking_id,
                            user = %user,
                            error = %revert,
                            "failed to revert transfer while unwinding status update"
                        );
                    }
                }
                return Err(err.into());
            }
        }

        tracing::info!(
            booking = %booking_id,
            from = %previous,
            to = %new_status,
            "booking status updated"
        );
        Ok(())
    }

    /// Re-inserts a persisted booking record and advances the id sequence
    /// past it.
    ///
    /// Load path for records round-tripped through serialization, including
    /// legacy rows that carried no `total_price` (deserialized as 0). The
    /// caller is responsible for the item's availability flag matching the
    /// restored status.
    pub fn restore_booking(&self, booking: Booking) {
        self.booking_seq.fetch_max(booking.id.0, Ordering::Relaxed);
        self.bookings.insert(booking.id, booking);
    }

    /// Retrieves a booking by id.
    ///
    /// Returns `None` if no booking exists for the given id.
    pub fn get_booking(&self, id: &BookingId) -> Option<Booking> {
        self.bookings.get(id).map(|booking| booking.value().clone())
    }

    /// Number of booking records held by the engine.
    pub fn booking_count(&self) -> usize {
        self.bookings.len()
    }
}
