pub mod admin_service;
pub mod allocation_service;
pub mod backup_service;
pub mod balance_history_service;
pub mod failure_cache;
pub mod holdings_service;
pub mod price_service;
pub mod snapshot_service;
pub mod summary_service;
pub mod validation_service;
pub mod valuation_service;
