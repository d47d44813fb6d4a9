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

use chrono::{DateTime, Utc};
use clap::Parser;
use csv::{ReaderBuilder, Trim, Writer};
use lendledger_rs::{
    BookingId, BookingStatus, CreateBooking, Engine, ItemId, ItemRecord, MemoryItemStore,
    MemoryLedger, UserId, UserRecord,
};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, Read, Write};
use std::path::PathBuf;
use std::process;
use std::sync::Arc;

/// Lend Ledger - Replay booking operation CSV files
///
/// Reads marketplace operations from a CSV file, runs them through the
/// booking engine, and writes the resulting credit balances to stdout.
/// Supports seeding users and items, creating bookings, and the
/// approve/reject/return transitions.
#[derive(Parser, Debug)]
#[command(name = "lendledger-rs")]
#[command(about = "A booking engine that replays operation CSVs", long_about = None)]
struct Args {
    /// Path to CSV file with operations
    ///
    /// Expected format: op,subject,actor,amount,start,end
    /// Example: cargo run -- operations.csv > balances.csv
    #[arg(value_name = "FILE")]
    input: PathBuf,
}

fn main() {
    tracing_subscriber::fmt::init();

    // Parse command line arguments
    let args = Args::parse();

    // Open input file
    let file = match File::open(&args.input) {
        Ok(f) => f,
        Err(e) => {
            eprintln!("Error opening file '{}': {}", args.input.display(), e);
            process::exit(1);
        }
    };

    // Replay operations from CSV
    let app = match process_operations(BufReader::new(file)) {
        Ok(app) => app,
        Err(e) => {
            eprintln!("Error processing operations: {}", e);
            process::exit(1);
        }
    };

    // Write results to stdout
    if let Err(e) = write_balances(&app.ledger, std::io::stdout()) {
        eprintln!("Error writing output: {}", e);
        process::exit(1);
    }
}

/// Engine plus the store handles it was constructed over.
pub struct App {
    pub engine: Engine,
    pub items: Arc<MemoryItemStore>,
    pub ledger: Arc<MemoryLedger>,
}

/// Raw CSV record matching the input format.
///
/// Fields: `op, subject, actor, amount, start, end`
#[derive(Debug, Deserialize)]
struct CsvRecord {
    op: String,
    subject: String,
    #[serde(default)]
    actor: Option<String>,
    #[serde(default, deserialize_with = "csv::invalid_option")]
    amount: Option<u64>,
    #[serde(default, deserialize_with = "csv::invalid_option")]
    start: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "csv::invalid_option")]
    end: Option<DateTime<Utc>>,
}

/// One replayable marketplace operation.
#[derive(Debug)]
enum Operation {
    SeedUser {
        id: UserId,
        name: String,
        credits: u64,
    },
    SeedItem {
        id: ItemId,
        owner: UserId,
        price: u64,
    },
    Book {
        item: ItemId,
        borrower: UserId,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    },
    Transition {
        booking: BookingId,
        status: BookingStatus,
    },
}

impl CsvRecord {
    /// Converts a CSV record to an operation.
    ///
    /// Returns `None` for unknown ops or missing required fields.
    fn into_operation(self) -> Option<Operation> {
        match self.op.to_lowercase().as_str() {
            "user" => Some(Operation::SeedUser {
                name: self.actor.unwrap_or_else(|| self.subject.clone()),
                id: UserId(self.subject),
                credits: self.amount?,
            }),
            "item" => Some(Operation::SeedItem {
                id: ItemId(self.subject),
                owner: UserId(self.actor?),
                price: self.amount?,
            }),
            "book" => Some(Operation::Book {
                item: ItemId(self.subject),
                borrower: UserId(self.actor?),
                start: self.start?,
                end: self.end?,
            }),
            op @ ("approve" | "reject" | "return") => {
                let status = match op {
                    "approve" => BookingStatus::Approved,
                    "reject" => BookingStatus::Rejected,
                    _ => BookingStatus::Returned,
                };
                Some(Operation::Transition {
                    booking: BookingId(self.subject.parse().ok()?),
                    status,
                })
            }
            _ => None,
        }
    }
}

/// Replay operations from a CSV reader.
///
/// Streaming parse, so arbitrarily large operation files work without
/// loading everything into memory. Malformed rows and operations the engine
/// rejects are skipped with a warning; the replay continues. Bookings are
/// assigned ids 1, 2, ... in file order, which is how transition rows
/// reference them.
///
/// # CSV Format
///
/// Expected columns: `op, subject, actor, amount, start, end`
/// - `user,<id>,<name>,<credits>,,` - seed a ledger account
/// - `item,<id>,<owner>,<price>,,` - seed a catalog item
/// - `book,<item>,<borrower>,,<start>,<end>` - create a booking
/// - `approve|reject|return,<booking>,,,,` - transition a booking
///
/// # Example
///
/// ```csv
/// op,subject,actor,amount,start,end
/// user,alice,Alice,0,,
/// user,bob,Bob,50,,
/// item,drill,alice,10,,
/// book,drill,bob,,2024-06-01T00:00:00Z,2024-06-03T00:00:00Z
/// approve,1,,,,
/// return,1,,,,
/// ```
///
/// # Errors
///
/// Returns a CSV error if the reader fails or the CSV structure is invalid.
pub fn process_operations<R: Read>(reader: R) -> Result<App, csv::Error> {
    let items = Arc::new(MemoryItemStore::new());
    let ledger = Arc::new(MemoryLedger::new());
    let engine = Engine::new(items.clone(), ledger.clone());

    let mut rdr = ReaderBuilder::new()
        .trim(Trim::All) // Handle whitespace in fields like " book "
        .flexible(true) // Allow trailing empty fields to be omitted
        .has_headers(true) // Skip first row as header
        .from_reader(reader);

    for result in rdr.deserialize::<CsvRecord>() {
        match result {
            Ok(record) => {
                let Some(op) = record.into_operation() else {
                    tracing::warn!("skipping invalid operation record");
                    continue;
                };
                apply_operation(&engine, &items, &ledger, op);
            }
            Err(e) => {
                // Skip malformed rows
                tracing::warn!(error = %e, "skipping malformed row");
                continue;
            }
        }
    }

    Ok(App {
        engine,
        items,
        ledger,
    })
}

fn apply_operation(engine: &Engine, items: &MemoryItemStore, ledger: &MemoryLedger, op: Operation) {
    match op {
        Operation::SeedUser { id, name, credits } => {
            let email = format!("{id}@lendledger.local");
            ledger.insert_user(
                id,
                UserRecord {
                    name,
                    email,
                    image: None,
                    credits,
                },
            );
        }
        Operation::SeedItem { id, owner, price } => {
            let title = id.0.clone();
            items.insert_item(
                id,
                ItemRecord {
                    title,
                    owner,
                    price,
                    available: true,
                },
            );
        }
        Operation::Book {
            item,
            borrower,
            start,
            end,
        } => {
            if let Err(e) = engine.create_booking(CreateBooking {
                item_id: item,
                borrower,
                start_date: start,
                end_date: end,
            }) {
                tracing::warn!(error = %e, "skipping booking");
            }
        }
        Operation::Transition { booking, status } => {
            if let Err(e) = engine.update_status(booking, status) {
                tracing::warn!(booking = %booking, error = %e, "skipping transition");
            }
        }
    }
}

/// One row of the balance report.
#[derive(Debug, Serialize)]
struct BalanceRow {
    user: String,
    name: String,
    credits: u64,
}

/// Write the credit balance report to a CSV writer.
///
/// Outputs every ledger account, sorted by user id.
///
/// # CSV Format
///
/// Columns: `user, name, credits`
///
/// # Example
///
/// ```csv
/// user,name,credits
/// alice,Alice,20
/// bob,Bob,30
/// ```
///
/// # Errors
///
/// Returns a CSV error if writing fails.
pub fn write_balances<W: Write>(ledger: &MemoryLedger, writer: W) -> Result<(), csv::Error> {
    let mut wtr = Writer::from_writer(writer);

    for (id, record) in ledger.snapshot() {
        wtr.serialize(BalanceRow {
            user: id.0,
            name: record.name,
            credits: record.credits,
        })?;
    }

    // Flush to ensure all data is written
    wtr.flush()?;
    Ok(())
}
