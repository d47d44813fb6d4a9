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

//! Error types for booking operations and the underlying stores.

use crate::booking::BookingStatus;
use thiserror::Error;

/// Booking operation errors.
///
/// Every validation failure is detected before any mutation; the rendered
/// message is suitable for showing to the caller verbatim.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BookingError {
    /// A required field of the request is missing or empty
    #[error("missing required booking field: {0}")]
    MissingField(&'static str),

    /// End date is not strictly after the start date
    #[error("end date must be after start date")]
    InvalidDateRange,

    /// Referenced item does not exist
    #[error("item not found")]
    ItemNotFound,

    /// Item is already committed to another active booking
    #[error("item is not available")]
    ItemUnavailable,

    /// Owner attempting to borrow their own item
    #[error("you cannot borrow your own item")]
    SelfBooking,

    /// Referenced borrower does not exist in the ledger
    #[error("borrower not found")]
    BorrowerNotFound,

    /// Referenced booking does not exist
    #[error("booking not found")]
    BookingNotFound,

    /// Borrower balance is below the computed booking price
    #[error("insufficient credits: need {required} but have {available}")]
    InsufficientCredits { required: u64, available: u64 },

    /// The requested status change is not in the transition table
    #[error("cannot change booking status from {from} to {to}")]
    InvalidTransition {
        from: BookingStatus,
        to: BookingStatus,
    },

    /// An underlying store write failed; the in-flight unit was rolled back
    #[error("storage failure: {0}")]
    Persistence(#[from] StoreError),
}

/// Faults surfaced by the item store and user ledger collaborators.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// Referenced record does not exist
    #[error("record not found")]
    NotFound,

    /// Adjustment would take a credit balance below zero
    #[error("credit balance cannot go negative")]
    CreditUnderflow,

    /// Storage backend failed mid-operation
    #[error("storage backend failure: {0}")]
    Backend(String),
}
