// HormiTraza - Waste-management traceability core
// Exposes the mass-balance engine for CLI, presentation and export consumers

pub mod store;
pub mod registry;
pub mod validation;
pub mod filter;
pub mod balance;
pub mod report;
pub mod export;
pub mod session;

// Re-export commonly used types
pub use store::{EventStore, IntakeEvent, OuttakeEvent, OuttakeType};
pub use registry::CategoryRegistry;
pub use validation::{SubmissionValidator, ValidationError, ValidationResult};
pub use filter::{month_range, PeriodFilter};
pub use balance::{
    compute_balance, stock_quality_signals, BalanceTotals, MaterialBalanceRow, QualityIssue,
    Severity,
};
pub use report::{
    BalanceTable, BalanceTableRow, EmptyResultWarning, RecyclerRanking, RecyclerRankingRow,
    RouteBreakdown, RouteBreakdownRow, SettlementCut,
};
pub use export::{
    export_balance_csv, export_intakes_csv, export_outtakes_csv, export_settlement_csv,
    read_intakes_csv, read_outtakes_csv, to_json,
};
pub use session::TraceSession;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
