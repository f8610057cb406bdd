// # Persistence
//
// Flat snapshot persistence used by the result cache and the watchlist.

pub mod snapshot;

pub use snapshot::SnapshotFile;
