// ⚖️ Aggregation Engine - Mass balance per material
// Resolución 276 de 2016, Art 5: Q_entrada = Q_aprovechada + Q_rechazo + Q_almacenada
//
// Groups the two event streams by material, pivots outtakes per
// destination type, and joins the aggregates with a FULL OUTER union of
// material keys: a material with rejects but no intake this period (or
// the reverse) still gets a row, with missing metrics at zero.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::store::{IntakeEvent, OuttakeEvent, OuttakeType};

// ============================================================================
// MATERIAL BALANCE ROW
// ============================================================================

/// One material's mass balance, derived on every view and never stored.
///
/// Sums are unrounded f64 kilograms - display rounding belongs to the
/// Report Projector, so re-aggregating at a different granularity stays
/// consistent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaterialBalanceRow {
    pub material: String,

    /// Σ intake weight for this material
    pub entrada_kg: f64,

    /// Per-outtake-type sums, keyed by the observed type label.
    /// BTreeMap so column order is deterministic.
    pub salidas_by_type: BTreeMap<String, f64>,

    /// Σ over all outtake-type columns
    pub total_salidas_kg: f64,

    /// entrada − total salidas. Negative stock is a data-quality signal,
    /// not an error.
    pub stock_kg: f64,
}

impl MaterialBalanceRow {
    /// Per-type sum with the outer-join zero-fill: a type absent from the
    /// pivot reads as 0.0.
    pub fn salida_kg(&self, outtake_type: OuttakeType) -> f64 {
        self.salida_kg_for_label(outtake_type.label())
    }

    pub fn salida_kg_for_label(&self, label: &str) -> f64 {
        self.salidas_by_type.get(label).copied().unwrap_or(0.0)
    }

    pub fn has_negative_stock(&self) -> bool {
        self.stock_kg < 0.0
    }
}

// ============================================================================
// COMPUTE BALANCE
// ============================================================================

/// Derive the per-material balance rows from the two event streams.
///
/// 1. Group intakes by material, sum weights (Entrada map).
/// 2. Group outtakes by (material, type label), sum weights (pivot).
/// 3. Full outer union of material keys; missing metrics default to 0.
/// 4. total_salidas = Σ per-type columns; stock = entrada − total_salidas.
///
/// Grouping is by the OBSERVED value: a material or type no longer in the
/// active registry still aggregates cleanly. Rows come back ordered by
/// material, ascending lexicographic.
pub fn compute_balance(
    intakes: &[IntakeEvent],
    outtakes: &[OuttakeEvent],
) -> Vec<MaterialBalanceRow> {
    let mut entrada: BTreeMap<String, f64> = BTreeMap::new();
    for event in intakes {
        *entrada.entry(event.material.clone()).or_insert(0.0) += event.weight_kg;
    }

    let mut salidas: BTreeMap<String, BTreeMap<String, f64>> = BTreeMap::new();
    for event in outtakes {
        let per_type = salidas.entry(event.material.clone()).or_default();
        *per_type
            .entry(event.outtake_type.label().to_string())
            .or_insert(0.0) += event.weight_kg;
    }

    let materials: BTreeSet<&String> = entrada.keys().chain(salidas.keys()).collect();

    materials
        .into_iter()
        .map(|material| {
            let entrada_kg = entrada.get(material).copied().unwrap_or(0.0);
            let salidas_by_type = salidas.get(material).cloned().unwrap_or_default();
            // fold from +0.0: std's empty-float-sum identity is -0.0, which
            // would render as "-0.0" through format_kg
            let total_salidas_kg: f64 = salidas_by_type.values().fold(0.0, |acc, kg| acc + kg);
            MaterialBalanceRow {
                material: material.clone(),
                entrada_kg,
                salidas_by_type,
                total_salidas_kg,
                stock_kg: entrada_kg - total_salidas_kg,
            }
        })
        .collect()
}

// ============================================================================
// BALANCE TOTALS (dashboard KPIs)
// ============================================================================

/// The four headline figures of the mass-balance view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BalanceTotals {
    pub entrada_kg: f64,
    pub aprovechado_kg: f64,
    pub rechazo_kg: f64,
    pub stock_kg: f64,
}

impl BalanceTotals {
    pub fn from_rows(rows: &[MaterialBalanceRow]) -> Self {
        BalanceTotals {
            // fold from +0.0 to avoid std's -0.0 empty-float-sum identity
            entrada_kg: rows.iter().map(|r| r.entrada_kg).fold(0.0, |acc, kg| acc + kg),
            aprovechado_kg: rows
                .iter()
                .map(|r| r.salida_kg(OuttakeType::SaleEffective))
                .fold(0.0, |acc, kg| acc + kg),
            rechazo_kg: rows
                .iter()
                .map(|r| r.salida_kg(OuttakeType::RejectLandfill))
                .fold(0.0, |acc, kg| acc + kg),
            stock_kg: rows.iter().map(|r| r.stock_kg).fold(0.0, |acc, kg| acc + kg),
        }
    }
}

// ============================================================================
// DATA QUALITY SIGNALS
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Severity {
    Critical,
    Warning,
    Info,
}

/// A balance anomaly worth reviewing. Surfaced alongside the rows, never
/// raised as an error.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QualityIssue {
    pub severity: Severity,
    pub material: String,
    pub issue: String,
    pub recommendation: String,
}

/// Flag every material whose outtakes exceed its intakes in the period.
pub fn stock_quality_signals(rows: &[MaterialBalanceRow]) -> Vec<QualityIssue> {
    rows.iter()
        .filter(|row| row.has_negative_stock())
        .map(|row| QualityIssue {
            severity: Severity::Warning,
            material: row.material.clone(),
            issue: format!(
                "Negative stock: {:.1} Kg out vs {:.1} Kg in ({:.1} Kg)",
                row.total_salidas_kg, row.entrada_kg, row.stock_kg
            ),
            recommendation:
                "Check for intakes recorded outside the period or missing weigh-in entries"
                    .to_string(),
        })
        .collect()
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, d).unwrap()
    }

    fn intake(material: &str, kg: f64) -> IntakeEvent {
        IntakeEvent::new(date(1), "María", "Entrega Directa", material, kg)
    }

    fn outtake(material: &str, outtake_type: OuttakeType, kg: f64) -> OuttakeEvent {
        OuttakeEvent::new(date(15), "EcoCompra SAS", outtake_type, material, kg)
    }

    #[test]
    fn test_pet_scenario() {
        // intake 100 + 50; sale 80; reject 20 → entrada 150, stock 50
        let intakes = vec![intake("PET", 100.0), intake("PET", 50.0)];
        let outtakes = vec![
            outtake("PET", OuttakeType::SaleEffective, 80.0),
            outtake("PET", OuttakeType::RejectLandfill, 20.0),
        ];

        let rows = compute_balance(&intakes, &outtakes);
        assert_eq!(rows.len(), 1);

        let pet = &rows[0];
        assert_eq!(pet.material, "PET");
        assert_eq!(pet.entrada_kg, 150.0);
        assert_eq!(pet.salida_kg(OuttakeType::SaleEffective), 80.0);
        assert_eq!(pet.salida_kg(OuttakeType::RejectLandfill), 20.0);
        assert_eq!(pet.total_salidas_kg, 100.0);
        assert_eq!(pet.stock_kg, 50.0);
    }

    #[test]
    fn test_outer_join_outtake_without_intake() {
        // Glass leaves with no matching intake: row appears, stock negative
        let intakes = vec![intake("PET", 100.0)];
        let outtakes = vec![outtake("Vidrio", OuttakeType::RejectLandfill, 35.0)];

        let rows = compute_balance(&intakes, &outtakes);
        assert_eq!(rows.len(), 2);

        let vidrio = rows.iter().find(|r| r.material == "Vidrio").unwrap();
        assert_eq!(vidrio.entrada_kg, 0.0);
        assert_eq!(vidrio.total_salidas_kg, 35.0);
        assert_eq!(vidrio.stock_kg, -35.0);
        assert!(vidrio.has_negative_stock());

        let pet = rows.iter().find(|r| r.material == "PET").unwrap();
        assert_eq!(pet.total_salidas_kg, 0.0);
        assert_eq!(pet.stock_kg, 100.0);
    }

    #[test]
    fn test_every_material_appears_exactly_once() {
        let intakes = vec![intake("PET", 10.0), intake("Cartón", 20.0), intake("PET", 5.0)];
        let outtakes = vec![
            outtake("Cartón", OuttakeType::SaleEffective, 8.0),
            outtake("Vidrio", OuttakeType::RejectLandfill, 3.0),
        ];

        let rows = compute_balance(&intakes, &outtakes);
        let materials: Vec<&str> = rows.iter().map(|r| r.material.as_str()).collect();
        assert_eq!(materials, vec!["Cartón", "PET", "Vidrio"]);
    }

    #[test]
    fn test_conservation() {
        let intakes = vec![
            intake("PET", 12.3),
            intake("Cartón", 45.6),
            intake("Vidrio", 7.89),
        ];
        let outtakes = vec![
            outtake("PET", OuttakeType::SaleEffective, 10.0),
            outtake("Cartón", OuttakeType::RejectLandfill, 5.5),
            outtake("Metales", OuttakeType::InterFacilitySale, 2.25),
        ];

        let rows = compute_balance(&intakes, &outtakes);

        let entrada_total: f64 = rows.iter().map(|r| r.entrada_kg).sum();
        let salidas_total: f64 = rows.iter().map(|r| r.total_salidas_kg).sum();
        let intake_sum: f64 = intakes.iter().map(|e| e.weight_kg).sum();
        let outtake_sum: f64 = outtakes.iter().map(|e| e.weight_kg).sum();

        assert!((entrada_total - intake_sum).abs() < 1e-9);
        assert!((salidas_total - outtake_sum).abs() < 1e-9);
    }

    #[test]
    fn test_idempotent() {
        let intakes = vec![intake("PET", 100.0), intake("Cartón", 40.0)];
        let outtakes = vec![outtake("PET", OuttakeType::SaleEffective, 60.0)];

        let first = compute_balance(&intakes, &outtakes);
        let second = compute_balance(&intakes, &outtakes);
        assert_eq!(first, second);
    }

    #[test]
    fn test_groups_by_observed_value_outside_registry() {
        // "Chatarra" was retired from the active list years ago; its
        // historical events must still aggregate.
        let intakes = vec![intake("Chatarra", 14.0)];
        let outtakes = vec![outtake("Chatarra", OuttakeType::SaleEffective, 4.0)];

        let rows = compute_balance(&intakes, &outtakes);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].material, "Chatarra");
        assert_eq!(rows[0].stock_kg, 10.0);
    }

    #[test]
    fn test_empty_inputs_yield_no_rows() {
        assert!(compute_balance(&[], &[]).is_empty());
    }

    #[test]
    fn test_balance_totals_kpis() {
        let intakes = vec![intake("PET", 100.0), intake("Cartón", 50.0)];
        let outtakes = vec![
            outtake("PET", OuttakeType::SaleEffective, 60.0),
            outtake("Cartón", OuttakeType::RejectLandfill, 10.0),
            outtake("Cartón", OuttakeType::InterFacilitySale, 5.0),
        ];

        let rows = compute_balance(&intakes, &outtakes);
        let totals = BalanceTotals::from_rows(&rows);

        assert_eq!(totals.entrada_kg, 150.0);
        assert_eq!(totals.aprovechado_kg, 60.0);
        assert_eq!(totals.rechazo_kg, 10.0);
        // Inter-facility transfer subtracts from stock even though it is
        // neither aprovechado nor rechazo
        assert_eq!(totals.stock_kg, 75.0);
    }

    #[test]
    fn test_negative_stock_signals() {
        let intakes = vec![intake("PET", 10.0)];
        let outtakes = vec![outtake("PET", OuttakeType::SaleEffective, 25.0)];

        let rows = compute_balance(&intakes, &outtakes);
        let signals = stock_quality_signals(&rows);

        assert_eq!(signals.len(), 1);
        assert_eq!(signals[0].severity, Severity::Warning);
        assert_eq!(signals[0].material, "PET");
        assert!(signals[0].issue.contains("Negative stock"));
    }
}
