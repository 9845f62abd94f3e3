//! Persistent state: the baseline snapshot and the append-only change log.
//!
//! Both live as plain files in the data directory. The baseline is
//! rewritten wholesale after every successful run; the change log only ever
//! grows.
pub mod baseline;
pub mod change_log;

pub use baseline::BaselineStore;
pub use change_log::ChangeLog;
