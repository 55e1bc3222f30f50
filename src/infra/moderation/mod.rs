// Offender ledger implementations.
// - `in_memory_ledger.rs`: default, lives for the process lifetime
// - `sqlite_ledger.rs`: durable, survives restarts

mod in_memory_ledger;
mod sqlite_ledger;

pub use in_memory_ledger::InMemoryOffenderLedger;
pub use sqlite_ledger::SqliteOffenderLedger;
