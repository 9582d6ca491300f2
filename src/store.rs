// 📥 Event Store - Append-only intake/outtake log
// Two ordered collections held in memory for the session's lifetime.
// No update, no delete: corrections are registered as offsetting entries.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::validation::{check_positive_weight, check_required_text, ValidationError};

// ============================================================================
// OUTTAKE TYPE
// ============================================================================

/// Destination of material leaving the facility.
///
/// Labels are stable across registry revisions: they are the strings the
/// historical CSV exports carry, and the strings the balance pivot keys on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OuttakeType {
    /// Sold to a buyer - counts toward the settlement cut
    #[serde(rename = "Venta (Aprovechamiento Efectivo)")]
    SaleEffective,

    /// Rejected to landfill - tracked for the reduction target
    #[serde(rename = "Rechazo (Relleno Sanitario)")]
    RejectLandfill,

    /// Transferred to another facility - subtracts from stock,
    /// excluded from settlement totals
    #[serde(rename = "Venta Interinstitucional")]
    InterFacilitySale,
}

impl OuttakeType {
    pub fn label(&self) -> &'static str {
        match self {
            OuttakeType::SaleEffective => "Venta (Aprovechamiento Efectivo)",
            OuttakeType::RejectLandfill => "Rechazo (Relleno Sanitario)",
            OuttakeType::InterFacilitySale => "Venta Interinstitucional",
        }
    }

    /// All variants, in registry order.
    pub fn all() -> [OuttakeType; 3] {
        [
            OuttakeType::SaleEffective,
            OuttakeType::RejectLandfill,
            OuttakeType::InterFacilitySale,
        ]
    }
}

impl std::fmt::Display for OuttakeType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

// ============================================================================
// INTAKE EVENT
// ============================================================================

/// A weighed reception of material at the facility (módulo Recepción/ECA).
///
/// Core fields are immutable once appended. Column renames match the
/// historical spreadsheet export format.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IntakeEvent {
    /// Stable identity - NEVER changes. Not part of the tabular export;
    /// regenerated when a CSV is re-imported into a fresh session.
    #[serde(skip_serializing, default = "new_event_id")]
    pub id: Uuid,

    /// Business date: when the material was actually received
    #[serde(rename = "Fecha")]
    pub date: NaiveDate,

    /// Recycler / operator who delivered the material
    #[serde(rename = "Reciclador")]
    pub recycler: String,

    /// Collection origin (route, direct delivery, partner association).
    /// Stored as the observed value - may outlive the active registry list.
    #[serde(rename = "Origen")]
    pub origin: String,

    /// Material category, as observed at weigh-in
    #[serde(rename = "Material")]
    pub material: String,

    /// Gross weight in kilograms, strictly positive
    #[serde(rename = "Peso_Kg")]
    pub weight_kg: f64,

    /// System time: when this record entered the session
    #[serde(skip_serializing, default = "Utc::now")]
    pub recorded_at: DateTime<Utc>,
}

impl IntakeEvent {
    pub fn new(
        date: NaiveDate,
        recycler: impl Into<String>,
        origin: impl Into<String>,
        material: impl Into<String>,
        weight_kg: f64,
    ) -> Self {
        IntakeEvent {
            id: new_event_id(),
            date,
            recycler: recycler.into(),
            origin: origin.into(),
            material: material.into(),
            weight_kg,
            recorded_at: Utc::now(),
        }
    }
}

// ============================================================================
// OUTTAKE EVENT
// ============================================================================

/// A weighed dispatch of material (módulo Comercialización/Salidas):
/// a sale, a landfill reject, or an inter-facility transfer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OuttakeEvent {
    /// Stable identity - NEVER changes
    #[serde(skip_serializing, default = "new_event_id")]
    pub id: Uuid,

    /// Business date: when the material left the facility
    #[serde(rename = "Fecha")]
    pub date: NaiveDate,

    /// Buying company or destination
    #[serde(rename = "Comprador")]
    pub buyer: String,

    /// Destination class (sale / reject / transfer)
    #[serde(rename = "Tipo_Salida")]
    pub outtake_type: OuttakeType,

    /// Material category, as observed at weigh-out
    #[serde(rename = "Material")]
    pub material: String,

    /// Weight in kilograms, strictly positive
    #[serde(rename = "Peso_Kg")]
    pub weight_kg: f64,

    /// System time: when this record entered the session
    #[serde(skip_serializing, default = "Utc::now")]
    pub recorded_at: DateTime<Utc>,
}

impl OuttakeEvent {
    pub fn new(
        date: NaiveDate,
        buyer: impl Into<String>,
        outtake_type: OuttakeType,
        material: impl Into<String>,
        weight_kg: f64,
    ) -> Self {
        OuttakeEvent {
            id: new_event_id(),
            date,
            buyer: buyer.into(),
            outtake_type,
            material: material.into(),
            weight_kg,
            recorded_at: Utc::now(),
        }
    }
}

fn new_event_id() -> Uuid {
    Uuid::new_v4()
}

// ============================================================================
// EVENT STORE
// ============================================================================

/// The sole owner of all events for the process session.
///
/// Append-only and insertion-ordered. Non-durable: the session is the
/// lifetime of the data (documented limitation - a durable deployment
/// would put two append-only tables behind this same contract).
#[derive(Debug, Default)]
pub struct EventStore {
    intakes: Vec<IntakeEvent>,
    outtakes: Vec<OuttakeEvent>,
}

impl EventStore {
    pub fn new() -> Self {
        EventStore {
            intakes: Vec::new(),
            outtakes: Vec::new(),
        }
    }

    /// Append an intake event, validating store invariants
    /// (positive weight, required text fields). Returns the event identity.
    ///
    /// The `submit_*` path already ran these checks via
    /// `SubmissionValidator`, but events can also arrive through bulk
    /// import without a form in front; both layers call the same
    /// `check_*` helpers, so the invariants cannot drift.
    pub fn append_intake(&mut self, event: IntakeEvent) -> Result<Uuid, ValidationError> {
        if let Some(err) = check_positive_weight("Peso_Kg", "Ingreso", event.weight_kg) {
            return Err(err);
        }
        if let Some(err) = check_required_text("Reciclador", "Ingreso", &event.recycler) {
            return Err(err);
        }
        if let Some(err) = check_required_text("Material", "Ingreso", &event.material) {
            return Err(err);
        }
        if let Some(err) = check_required_text("Origen", "Ingreso", &event.origin) {
            return Err(err);
        }
        let id = event.id;
        self.intakes.push(event);
        Ok(id)
    }

    /// Append an outtake event, validating store invariants.
    pub fn append_outtake(&mut self, event: OuttakeEvent) -> Result<Uuid, ValidationError> {
        if let Some(err) = check_positive_weight("Peso_Kg", "Salida", event.weight_kg) {
            return Err(err);
        }
        if let Some(err) = check_required_text("Comprador", "Salida", &event.buyer) {
            return Err(err);
        }
        if let Some(err) = check_required_text("Material", "Salida", &event.material) {
            return Err(err);
        }
        let id = event.id;
        self.outtakes.push(event);
        Ok(id)
    }

    pub fn intakes(&self) -> &[IntakeEvent] {
        &self.intakes
    }

    pub fn outtakes(&self) -> &[OuttakeEvent] {
        &self.outtakes
    }

    pub fn intake_count(&self) -> usize {
        self.intakes.len()
    }

    pub fn outtake_count(&self) -> usize {
        self.outtakes.len()
    }

    /// Most recent N intakes for the history view: newest business date
    /// first, newest insertion first among equal dates.
    pub fn recent_intakes(&self, n: usize) -> Vec<&IntakeEvent> {
        let mut recent: Vec<&IntakeEvent> = self.intakes.iter().rev().collect();
        recent.sort_by(|a, b| b.date.cmp(&a.date));
        recent.truncate(n);
        recent
    }

    /// Most recent N outtakes, same ordering as `recent_intakes`.
    pub fn recent_outtakes(&self, n: usize) -> Vec<&OuttakeEvent> {
        let mut recent: Vec<&OuttakeEvent> = self.outtakes.iter().rev().collect();
        recent.sort_by(|a, b| b.date.cmp(&a.date));
        recent.truncate(n);
        recent
    }
}

// ============================================================================
// TESTS
// ============================================================================
