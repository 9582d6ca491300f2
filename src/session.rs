// 🤝 Trace Session - The core's external interface
// One explicitly-owned value holding the Event Store and the Category
// Registry. The presentation layer gets handed a session; there is no
// ambient singleton. Single-threaded, synchronous, non-durable: the
// session's memory IS the data for this process.

use chrono::NaiveDate;
use uuid::Uuid;

use crate::balance::{compute_balance, MaterialBalanceRow};
use crate::filter::PeriodFilter;
use crate::registry::CategoryRegistry;
use crate::report::{BalanceTable, RecyclerRanking, RouteBreakdown, SettlementCut};
use crate::store::{EventStore, IntakeEvent, OuttakeEvent, OuttakeType};
use crate::validation::{SubmissionValidator, ValidationError};

// ============================================================================
// TRACE SESSION
// ============================================================================

pub struct TraceSession {
    store: EventStore,
    registry: CategoryRegistry,
}

impl TraceSession {
    /// Session with the association's default category sets.
    pub fn new() -> Self {
        Self::with_registry(CategoryRegistry::with_defaults())
    }

    /// Session with an injected registry (tests, future config loading).
    pub fn with_registry(registry: CategoryRegistry) -> Self {
        TraceSession {
            store: EventStore::new(),
            registry,
        }
    }

    pub fn registry(&self) -> &CategoryRegistry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut CategoryRegistry {
        &mut self.registry
    }

    pub fn store(&self) -> &EventStore {
        &self.store
    }

    // ========================================================================
    // SUBMISSION (módulos 1 y 2)
    // ========================================================================

    /// Register a weighed intake. Validates against the current registry
    /// and the store invariants; on failure the submission is rejected
    /// with the first error (the full list is available via
    /// `SubmissionValidator` for form-level display).
    pub fn submit_intake(
        &mut self,
        date: NaiveDate,
        recycler: &str,
        origin: &str,
        material: &str,
        weight_kg: f64,
    ) -> Result<Uuid, ValidationError> {
        SubmissionValidator::new(&self.registry)
            .validate_intake(recycler, origin, material, weight_kg)
            .map_err(first_error)?;

        self.store
            .append_intake(IntakeEvent::new(date, recycler, origin, material, weight_kg))
    }

    /// Register a weighed outtake (sale, reject or transfer).
    pub fn submit_outtake(
        &mut self,
        date: NaiveDate,
        buyer: &str,
        outtake_type: OuttakeType,
        material: &str,
        weight_kg: f64,
    ) -> Result<Uuid, ValidationError> {
        SubmissionValidator::new(&self.registry)
            .validate_outtake(buyer, material, weight_kg)
            .map_err(first_error)?;

        self.store.append_outtake(OuttakeEvent::new(
            date,
            buyer,
            outtake_type,
            material,
            weight_kg,
        ))
    }

    /// Load historical events (e.g. re-imported CSV exports) straight into
    /// the store. Store invariants still apply, but the registry is NOT
    /// consulted: old records may carry categories no longer in the active
    /// list, and must load anyway.
    pub fn import_events(
        &mut self,
        intakes: Vec<IntakeEvent>,
        outtakes: Vec<OuttakeEvent>,
    ) -> Result<(usize, usize), ValidationError> {
        let mut intake_count = 0;
        for event in intakes {
            self.store.append_intake(event)?;
            intake_count += 1;
        }
        let mut outtake_count = 0;
        for event in outtakes {
            self.store.append_outtake(event)?;
            outtake_count += 1;
        }
        Ok((intake_count, outtake_count))
    }

    // ========================================================================
    // AGGREGATION & REPORTS (módulos 3 y 4)
    // ========================================================================

    /// Mass-balance rows over the whole session, or over a filtered period.
    pub fn compute_balance(&self, filter: Option<&PeriodFilter>) -> Vec<MaterialBalanceRow> {
        match filter {
            Some(filter) => {
                let intakes = filter.filter_intakes(self.store.intakes());
                let outtakes = filter.filter_outtakes(self.store.outtakes());
                compute_balance(&intakes, &outtakes)
            }
            None => compute_balance(self.store.intakes(), self.store.outtakes()),
        }
    }

    /// Display-ready balance table (KPIs + rounded per-material detail).
    pub fn balance_table(&self, filter: Option<&PeriodFilter>) -> BalanceTable {
        BalanceTable::project(&self.compute_balance(filter))
    }

    /// Intake weight by Origin × Material.
    pub fn route_breakdown(&self, filter: Option<&PeriodFilter>) -> RouteBreakdown {
        match filter {
            Some(filter) => RouteBreakdown::project(&filter.filter_intakes(self.store.intakes())),
            None => RouteBreakdown::project(self.store.intakes()),
        }
    }

    /// Per-recycler throughput ranking, heaviest first.
    pub fn recycler_ranking(&self, filter: Option<&PeriodFilter>) -> RecyclerRanking {
        match filter {
            Some(filter) => RecyclerRanking::project(&filter.filter_intakes(self.store.intakes())),
            None => RecyclerRanking::project(self.store.intakes()),
        }
    }

    /// Settlement cut for a calendar month: effective sales only,
    /// totalled in tons.
    pub fn monthly_settlement_cut(
        &self,
        year: i32,
        month: u32,
    ) -> Result<SettlementCut, ValidationError> {
        SettlementCut::for_month(self.store.outtakes(), year, month)
    }
}

impl Default for TraceSession {
    fn default() -> Self {
        Self::new()
    }
}

fn first_error(mut errors: Vec<ValidationError>) -> ValidationError {
    if errors.is_empty() {
        // The validator never returns Err with an empty list
        ValidationError::new("submission", "Rejected", "Validación")
    } else {
        errors.remove(0)
    }
}

// ============================================================================
// TESTS
// ============================================================================
