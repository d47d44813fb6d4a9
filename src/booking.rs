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

//! Booking entity and status state machine.
//!
//! Bookings follow a fixed lifecycle:
//! - [`Pending`] → [`Approved`] (lender accepts) or [`Rejected`] (refund)
//! - [`Approved`] → [`Returned`] (owner is paid) or [`Rejected`]
//! - [`Returned`] and [`Rejected`] are terminal.
//!
//! [`Pending`]: BookingStatus::Pending
//! [`Approved`]: BookingStatus::Approved
//! [`Rejected`]: BookingStatus::Rejected
//! [`Returned`]: BookingStatus::Returned

use crate::base::{BookingId, ItemId, UserId};
use crate::error::BookingError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Booking lifecycle status.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum BookingStatus {
    Pending,
    Approved,
    Returned,
    Rejected,
}

/// Who receives `total_price` when a transition commits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CreditEffect {
    /// No credits move.
    None,
    /// The escrowed amount goes back to the borrower.
    RefundBorrower,
    /// The escrowed amount is paid out to the item owner.
    PayOwner,
}

/// Side effects of one legal status transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransitionEffect {
    pub credit: CreditEffect,
    /// Whether the item becomes available again once the transition commits.
    pub frees_item: bool,
}

impl BookingStatus {
    /// Returns true for statuses with no outgoing transitions.
    pub fn is_terminal(self) -> bool {
        matches!(self, BookingStatus::Returned | BookingStatus::Rejected)
    }

    /// Returns true while the booking still holds the item.
    pub fn is_active(self) -> bool {
        !self.is_terminal()
    }

    /// Looks up `(self, to)` in the transition table.
    ///
    /// | from     | to       | credit effect   | frees item |
    /// |----------|----------|-----------------|------------|
    /// | pending  | approved | none            | no         |
    /// | pending  | rejected | refund borrower | yes        |
    /// | approved | returned | pay owner       | yes        |
    /// | approved | rejected | none            | yes        |
    ///
    /// Every other pair, including terminal → anything and re-applying the
    /// current status, is an [`BookingError::InvalidTransition`]. The
    /// `approved → rejected` row intentionally moves no credits; the escrow
    /// stays with the platform until a product decision says otherwise.
    pub fn transition(self, to: BookingStatus) -> Result<TransitionEffect, BookingError> {
        use BookingStatus::*;
        match (self, to) {
            (Pending, Approved) => Ok(TransitionEffect {
                credit: CreditEffect::None,
                frees_item: false,
            }),
            (Pending, Rejected) => Ok(TransitionEffect {
                credit: CreditEffect::RefundBorrower,
                frees_item: true,
            }),
            (Approved, Returned) => Ok(TransitionEffect {
                credit: CreditEffect::PayOwner,
                frees_item: true,
            }),
            (Approved, Rejected) => Ok(TransitionEffect {
                credit: CreditEffect::None,
                frees_item: true,
            }),
            (from, to) => Err(BookingError::InvalidTransition { from, to }),
        }
    }
}

impl fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            BookingStatus::Pending => "pending",
            BookingStatus::Approved => "approved",
            BookingStatus::Returned => "returned",
            BookingStatus::Rejected => "rejected",
        };
        write!(f, "{name}")
    }
}

/// A time-bounded reservation of an item by a borrower.
///
/// `total_price` is computed once at creation and frozen for the life of the
/// booking; later price changes on the item do not affect it. Records
/// persisted before the field existed deserialize with `total_price = 0` and
/// re-serialize with the explicit zero.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Booking {
    pub id: BookingId,
    pub item: ItemId,
    pub borrower: UserId,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    #[serde(default)]
    pub total_price: u64,
    pub status: BookingStatus,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn legal_transitions_match_table() {
        let approve = BookingStatus::Pending
            .transition(BookingStatus::Approved)
            .unwrap();
        assert_eq!(approve.credit, CreditEffect::None);
        assert!(!approve.frees_item);

        let reject = BookingStatus::Pending
            .transition(BookingStatus::Rejected)
            .unwrap();
        assert_eq!(reject.credit, CreditEffect::RefundBorrower);
        assert!(reject.frees_item);

        let ret = BookingStatus::Approved
            .transition(BookingStatus::Returned)
            .unwrap();
        assert_eq!(ret.credit, CreditEffect::PayOwner);
        assert!(ret.frees_item);

        let late_reject = BookingStatus::Approved
            .transition(BookingStatus::Rejected)
            .unwrap();
        assert_eq!(late_reject.credit, CreditEffect::None);
        assert!(late_reject.frees_item);
    }

    #[test]
    fn terminal_states_have_no_outgoing_transitions() {
        use BookingStatus::*;
        for from in [Returned, Rejected] {
            for to in [Pending, Approved, Returned, Rejected] {
                assert_eq!(
                    from.transition(to),
                    Err(BookingError::InvalidTransition { from, to })
                );
            }
        }
    }

    #[test]
    fn reapplying_current_status_is_rejected() {
        use BookingStatus::*;
        for status in [Pending, Approved] {
            assert_eq!(
                status.transition(status),
                Err(BookingError::InvalidTransition {
                    from: status,
                    to: status
                })
            );
        }
    }

    #[test]
    fn no_path_back_to_pending() {
        use BookingStatus::*;
        for from in [Approved, Returned, Rejected] {
            assert!(from.transition(Pending).is_err());
        }
    }

    #[test]
    fn status_serializes_lowercase() {
        assert_eq!(
            serde_json::to_string(&BookingStatus::Pending).unwrap(),
            "\"pending\""
        );
        assert_eq!(
            serde_json::from_str::<BookingStatus>("\"returned\"").unwrap(),
            BookingStatus::Returned
        );
    }

    #[test]
    fn legacy_record_without_total_price_loads_as_zero() {
        let json = r#"{
            "id": 7,
            "item": "drill",
            "borrower": "bob",
            "start_date": "2024-06-01T00:00:00Z",
            "end_date": "2024-06-03T00:00:00Z",
            "status": "approved",
            "created_at": "2024-05-30T12:00:00Z"
        }"#;
        let booking: Booking = serde_json::from_str(json).unwrap();
        assert_eq!(booking.total_price, 0);

        // The zero is persisted explicitly on the way back out.
        let out = serde_json::to_string(&booking).unwrap();
        assert!(out.contains("\"total_price\":0"));
    }

    #[test]
    fn booking_round_trips_through_json() {
        let booking = Booking {
            id: BookingId(1),
            item: ItemId::from("tent"),
            borrower: UserId::from("bob"),
            start_date: Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap(),
            end_date: Utc.with_ymd_and_hms(2024, 6, 3, 0, 0, 0).unwrap(),
            total_price: 20,
            status: BookingStatus::Pending,
            created_at: Utc.with_ymd_and_hms(2024, 5, 30, 12, 0, 0).unwrap(),
        };
        let json = serde_json::to_string(&booking).unwrap();
        let back: Booking = serde_json::from_str(&json).unwrap();
        assert_eq!(back, booking);
    }
}
