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

//! Benchmarks for the booking engine.
//!
//! Run with: cargo bench
//!
//! Benchmarks include:
//! - Single-threaded booking creation and lifecycle transitions
//! - Multi-threaded bookings across independent items
//! - Query layer reads over a populated engine

use chrono::{DateTime, TimeZone, Utc};
use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use lendledger_rs::{
    BookingStatus, CreateBooking, Engine, ItemId, ItemRecord, MemoryItemStore, MemoryLedger,
    UserId, UserRecord,
};
use rayon::prelude::*;
use std::sync::Arc;

// =============================================================================
// Helper Functions
// =============================================================================

fn day(d: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, d, 0, 0, 0).unwrap()
}

fn seed(
    num_items: usize,
    num_borrowers: usize,
) -> (Arc<Engine>, Arc<MemoryItemStore>, Arc<MemoryLedger>) {
    let items = Arc::new(MemoryItemStore::new());
    let ledger = Arc::new(MemoryLedger::new());

    ledger.insert_user(
        UserId::from("owner"),
        UserRecord {
            name: "Owner".into(),
            email: "owner@example.com".into(),
            image: None,
            credits: 0,
        },
    );
    for i in 0..num_borrowers {
        ledger.insert_user(
            UserId(format!("borrower-{i}")),
            UserRecord {
                name: format!("Borrower {i}"),
                email: format!("borrower-{i}@example.com"),
                image: None,
                credits: 1_000_000_000,
            },
        );
    }
    for i in 0..num_items {
        items.insert_item(
            ItemId(format!("item-{i}")),
            ItemRecord {
                title: format!("Item {i}"),
                owner: UserId::from("owner"),
                price: 10,
                available: true,
            },
        );
    }

    (
        Arc::new(Engine::new(items.clone(), ledger.clone())),
        items,
        ledger,
    )
}

fn request(item: usize, borrower: usize) -> CreateBooking {
    CreateBooking {
        item_id: ItemId(format!("item-{item}")),
        borrower: UserId(format!("borrower-{borrower}")),
        start_date: day(1),
        end_date: day(3),
    }
}

// =============================================================================
// Single-Threaded Benchmarks
// =============================================================================

fn bench_single_booking(c: &mut Criterion) {
    c.bench_function("single_booking", |b| {
        let (engine, _items, _ledger) = seed(1, 1);
        b.iter(|| {
            let id = engine.create_booking(black_box(request(0, 0))).unwrap();
            // Reject to free the item for the next iteration.
            engine.update_status(id, BookingStatus::Rejected).unwrap();
        })
    });
}

fn bench_booking_throughput(c: &mut Criterion) {
    let mut group = c.benchmark_group("booking_throughput");

    for count in [100, 1_000, 10_000].iter() {
        group.throughput(Throughput::Elements(*count as u64));
        group.bench_with_input(BenchmarkId::from_parameter(count), count, |b, &count| {
            b.iter(|| {
                let (engine, _items, _ledger) = seed(count, 1);
                for i in 0..count {
                    engine.create_booking(request(i, 0)).unwrap();
                }
                black_box(&engine);
            })
        });
    }
    group.finish();
}

// =============================================================================
// Lifecycle Benchmarks
// =============================================================================

fn bench_booking_lifecycle(c: &mut Criterion) {
    let mut group = c.benchmark_group("booking_lifecycle");

    // Create and immediately reject (refund path).
    group.bench_function("create_reject", |b| {
        let (engine, _items, _ledger) = seed(1, 1);
        b.iter(|| {
            let id = engine.create_booking(request(0, 0)).unwrap();
            engine
                .update_status(black_box(id), BookingStatus::Rejected)
                .unwrap();
        })
    });

    // Full happy path (payout path).
    group.bench_function("create_approve_return", |b| {
        let (engine, _items, _ledger) = seed(1, 1);
        b.iter(|| {
            let id = engine.create_booking(request(0, 0)).unwrap();
            engine.update_status(id, BookingStatus::Approved).unwrap();
            engine
                .update_status(black_box(id), BookingStatus::Returned)
                .unwrap();
        })
    });

    group.finish();
}

// =============================================================================
// Multi-Threaded Benchmarks
// =============================================================================

fn bench_parallel_independent_items(c: &mut Criterion) {
    let mut group = c.benchmark_group("parallel_independent_items");

    for num_items in [8, 64, 256].iter() {
        group.throughput(Throughput::Elements(*num_items as u64));
        group.bench_with_input(
            BenchmarkId::from_parameter(num_items),
            num_items,
            |b, &num_items| {
                let (engine, _items, _ledger) = seed(num_items, num_items);
                b.iter(|| {
                    (0..num_items).into_par_iter().for_each(|i| {
                        let id = engine.create_booking(request(i, i)).unwrap();
                        engine.update_status(id, BookingStatus::Rejected).unwrap();
                    });
                })
            },
        );
    }
    group.finish();
}

// =============================================================================
// Query Benchmarks
// =============================================================================

fn bench_queries(c: &mut Criterion) {
    let mut group = c.benchmark_group("queries");

    // One lender with many historical bookings against their items.
    const NUM_BOOKINGS: usize = 1_000;
    let (engine, _items, _ledger) = seed(NUM_BOOKINGS, 1);
    for i in 0..NUM_BOOKINGS {
        let id = engine.create_booking(request(i, 0)).unwrap();
        if i % 2 == 0 {
            engine.update_status(id, BookingStatus::Approved).unwrap();
            engine.update_status(id, BookingStatus::Returned).unwrap();
        }
    }

    group.bench_function("bookings_by_user", |b| {
        b.iter(|| black_box(engine.bookings_by_user(&UserId::from("owner"))))
    });

    group.bench_function("pending_lender_count", |b| {
        b.iter(|| black_box(engine.pending_lender_count(&UserId::from("owner"))))
    });

    group.bench_function("profile_stats", |b| {
        b.iter(|| black_box(engine.profile_stats(&UserId::from("owner"))))
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_single_booking,
    bench_booking_throughput,
    bench_booking_lifecycle,
    bench_parallel_independent_items,
    bench_queries,
);
criterion_main!(benches);
