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

//! # Lend Ledger
//!
//! This library provides the booking and credits engine for a peer-to-peer
//! item-lending marketplace: borrowers book items priced in platform
//! credits, the booked amount sits in escrow while the booking is active,
//! and the status lifecycle (pending, approved, returned, rejected) decides
//! whether the escrow flows back to the borrower or out to the item owner.
//!
//! ## Core Components
//!
//! - [`Engine`]: booking creation and status transitions as atomic units
//! - [`Booking`] / [`BookingStatus`]: the booking entity and its explicit
//!   transition table
//! - [`ItemStore`] / [`UserLedger`]: contracts for the injected collaborator
//!   stores, with in-process implementations in [`memory`]
//! - [`BookingError`]: failure taxonomy for booking operations
//!
//! ## Example
//!
//! ```
//! use chrono::{TimeZone, Utc};
//! use lendledger_rs::{
//!     CreateBooking, Engine, ItemId, ItemRecord, MemoryItemStore, MemoryLedger, UserId,
//!     UserRecord,
//! };
//! use std::sync::Arc;
//!
//! let items = Arc::new(MemoryItemStore::new());
//! let ledger = Arc::new(MemoryLedger::new());
//!
//! ledger.insert_user(
//!     UserId::from("alice"),
//!     UserRecord {
//!         name: "Alice".into(),
//!         email: "alice@example.com".into(),
//!         image: None,
//!         credits: 0,
//!     },
//! );
//! ledger.insert_user(
//!     UserId::from("bob"),
//!     UserRecord {
//!         name: "Bob".into(),
//!         email: "bob@example.com".into(),
//!         image: None,
//!         credits: 50,
//!     },
//! );
//! items.insert_item(
//!     ItemId::from("drill"),
//!     ItemRecord {
//!         title: "Cordless drill".into(),
//!         owner: UserId::from("alice"),
//!         price: 10,
//!         available: true,
//!     },
//! );
//!
//! let engine = Engine::new(items, ledger.clone());
//!
//! // Two days at 10 credits/day: 20 credits move into escrow.
//! engine
//!     .create_booking(CreateBooking {
//!         item_id: ItemId::from("drill"),
//!         borrower: UserId::from("bob"),
//!         start_date: Utc.with_ymd_and_hms(2024, 6, 1, 9, 0, 0).unwrap(),
//!         end_date: Utc.with_ymd_and_hms(2024, 6, 3, 9, 0, 0).unwrap(),
//!     })
//!     .unwrap();
//!
//! assert_eq!(ledger.credits_of(&UserId::from("bob")), Some(30));
//! ```
//!
//! ## Thread Safety
//!
//! The engine serializes work per item and per user, so bookings against
//! different items proceed in parallel while racing operations on one item
//! resolve to exactly one winner.

mod base;
pub mod booking;
mod engine;
pub mod error;
pub mod memory;
pub mod query;
pub mod store;

pub use base::{BookingId, ItemId, UserId};
pub use booking::{Booking, BookingStatus, CreditEffect, TransitionEffect};
pub use engine::{CreateBooking, Engine, duration_days};
pub use error::{BookingError, StoreError};
pub use memory::{MemoryItemStore, MemoryLedger};
pub use query::{BookingView, ItemSummary, ProfileStats, UserBookings, UserSummary};
pub use store::{IdentityProvider, ItemRecord, ItemStore, StaticIdentity, UserLedger, UserRecord};
