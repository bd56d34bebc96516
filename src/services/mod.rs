pub mod sync_service;
pub mod scheduler;
pub mod throttle;

pub use sync_service::{BACKFILL_YEARS, SyncService, SyncStats, academic_year, backfill_years};
pub use scheduler::SyncScheduler;
pub use throttle::Throttle;
