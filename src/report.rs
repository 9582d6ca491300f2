// 📊 Report Projector - Derived views for presentation/export
// Shapes the engine's unrounded aggregates into what the downstream
// presentation and export collaborators consume. Display rounding
// (1 decimal) happens here and only here.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

use crate::balance::{BalanceTotals, MaterialBalanceRow};
use crate::filter::PeriodFilter;
use crate::store::{IntakeEvent, OuttakeEvent, OuttakeType};
use crate::validation::ValidationError;

// ============================================================================
// EMPTY RESULT WARNING
// ============================================================================

/// A filter/period that yields zero rows. This is an explicit "no data"
/// state to render, never a failure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmptyResultWarning {
    pub context: String,
}

impl EmptyResultWarning {
    pub fn new(context: impl Into<String>) -> Self {
        EmptyResultWarning {
            context: context.into(),
        }
    }
}

impl std::fmt::Display for EmptyResultWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "No data for {}", self.context)
    }
}

impl std::error::Error for EmptyResultWarning {}

/// Display rounding to 1 decimal. Projector concern only - engine rows
/// keep the unrounded sums.
fn round1(kg: f64) -> f64 {
    (kg * 10.0).round() / 10.0
}

// ============================================================================
// BALANCE TABLE (per-material detail + KPI header)
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BalanceTableRow {
    pub material: String,
    pub entrada_kg: f64,
    /// Aligned with `BalanceTable::columns`
    pub salidas_kg: Vec<f64>,
    pub total_salidas_kg: f64,
    pub stock_kg: f64,
}

/// The mass-balance detail table, one row per material, rounded for
/// display. Per-type columns are the union of observed type labels so a
/// long-tail label from old records still gets its column.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BalanceTable {
    pub totals: BalanceTotals,
    pub columns: Vec<String>,
    pub rows: Vec<BalanceTableRow>,
}

impl BalanceTable {
    pub fn project(rows: &[MaterialBalanceRow]) -> Self {
        // Registry order first, then any long-tail labels observed in the data
        let mut columns: Vec<String> = OuttakeType::all()
            .iter()
            .map(|t| t.label().to_string())
            .collect();
        for row in rows {
            for label in row.salidas_by_type.keys() {
                if !columns.contains(label) {
                    columns.push(label.clone());
                }
            }
        }

        let table_rows = rows
            .iter()
            .map(|row| BalanceTableRow {
                material: row.material.clone(),
                entrada_kg: round1(row.entrada_kg),
                salidas_kg: columns
                    .iter()
                    .map(|label| round1(row.salida_kg_for_label(label)))
                    .collect(),
                total_salidas_kg: round1(row.total_salidas_kg),
                stock_kg: round1(row.stock_kg),
            })
            .collect();

        BalanceTable {
            totals: BalanceTotals::from_rows(rows),
            columns,
            rows: table_rows,
        }
    }

    pub fn empty_warning(&self) -> Option<EmptyResultWarning> {
        if self.rows.is_empty() {
            Some(EmptyResultWarning::new("balance de masas"))
        } else {
            None
        }
    }
}

// ============================================================================
// ROUTE BREAKDOWN (Origin × Material)
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteBreakdownRow {
    pub origin: String,
    pub material: String,
    pub weight_kg: f64,
}

/// Intake weight discriminated by collection origin and material, for the
/// per-route reporting the regulation asks for.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouteBreakdown {
    pub rows: Vec<RouteBreakdownRow>,
}

impl RouteBreakdown {
    pub fn project(intakes: &[IntakeEvent]) -> Self {
        let mut sums: BTreeMap<(String, String), f64> = BTreeMap::new();
        for event in intakes {
            *sums
                .entry((event.origin.clone(), event.material.clone()))
                .or_insert(0.0) += event.weight_kg;
        }

        let rows = sums
            .into_iter()
            .map(|((origin, material), kg)| RouteBreakdownRow {
                origin,
                material,
                weight_kg: round1(kg),
            })
            .collect();

        RouteBreakdown { rows }
    }

    pub fn empty_warning(&self) -> Option<EmptyResultWarning> {
        if self.rows.is_empty() {
            Some(EmptyResultWarning::new("desglose por ruta/origen"))
        } else {
            None
        }
    }
}

// ============================================================================
// RECYCLER RANKING (per-recycler throughput)
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecyclerRankingRow {
    pub recycler: String,
    pub weight_kg: f64,
    pub intake_count: usize,
}

/// Per-recycler intake totals, heaviest first. Ties keep first-seen order
/// (stable sort over the first-appearance sequence - no secondary key is
/// defined for the payout view).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecyclerRanking {
    pub rows: Vec<RecyclerRankingRow>,
}

impl RecyclerRanking {
    pub fn project(intakes: &[IntakeEvent]) -> Self {
        let mut index: HashMap<String, usize> = HashMap::new();
        let mut rows: Vec<RecyclerRankingRow> = Vec::new();

        for event in intakes {
            match index.get(&event.recycler) {
                Some(&i) => {
                    rows[i].weight_kg += event.weight_kg;
                    rows[i].intake_count += 1;
                }
                None => {
                    index.insert(event.recycler.clone(), rows.len());
                    rows.push(RecyclerRankingRow {
                        recycler: event.recycler.clone(),
                        weight_kg: event.weight_kg,
                        intake_count: 1,
                    });
                }
            }
        }

        // Stable sort: equal weights stay in first-seen order
        rows.sort_by(|a, b| {
            b.weight_kg
                .partial_cmp(&a.weight_kg)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        for row in &mut rows {
            row.weight_kg = round1(row.weight_kg);
        }

        RecyclerRanking { rows }
    }

    pub fn empty_warning(&self) -> Option<EmptyResultWarning> {
        if self.rows.is_empty() {
            Some(EmptyResultWarning::new("ranking de recicladores"))
        } else {
            None
        }
    }
}

// ============================================================================
// SETTLEMENT CUT (corte de conciliación)
// ============================================================================

/// Monthly reconciliation report for the settlement committee: effective
/// sales only, totalled in metric tons. Landfill rejects and
/// inter-facility transfers never enter the total.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SettlementCut {
    pub year: i32,
    pub month: u32,
    pub total_tons: f64,
    pub line_items: Vec<OuttakeEvent>,
}

impl SettlementCut {
    pub fn for_month(
        outtakes: &[OuttakeEvent],
        year: i32,
        month: u32,
    ) -> Result<Self, ValidationError> {
        let period = PeriodFilter::for_month(year, month)?;
        let line_items: Vec<OuttakeEvent> = outtakes
            .iter()
            .filter(|e| e.outtake_type == OuttakeType::SaleEffective && period.matches_outtake(e))
            .cloned()
            .collect();

        // fold from +0.0: std's empty-float-sum identity is -0.0, which would
        // leak "-0.000" into the committee CSV
        let total_kg: f64 = line_items.iter().map(|e| e.weight_kg).fold(0.0, |acc, kg| acc + kg);

        Ok(SettlementCut {
            year,
            month,
            total_tons: total_kg / 1000.0,
            line_items,
        })
    }

    pub fn empty_warning(&self) -> Option<EmptyResultWarning> {
        if self.line_items.is_empty() {
            Some(EmptyResultWarning::new(format!(
                "corte de conciliación {}-{:02}",
                self.year, self.month
            )))
        } else {
            None
        }
    }

    pub fn summary(&self) -> String {
        format!(
            "Corte {}-{:02}: {:.3} Ton across {} sales",
            self.year,
            self.month,
            self.total_tons,
            self.line_items.len()
        )
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::balance::compute_balance;
    use chrono::NaiveDate;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn intake(d: NaiveDate, recycler: &str, origin: &str, material: &str, kg: f64) -> IntakeEvent {
        IntakeEvent::new(d, recycler, origin, material, kg)
    }

    fn sale(d: NaiveDate, material: &str, kg: f64) -> OuttakeEvent {
        OuttakeEvent::new(d, "EcoCompra SAS", OuttakeType::SaleEffective, material, kg)
    }

    #[test]
    fn test_balance_table_rounds_and_aligns_columns() {
        let intakes = vec![intake(
            date(2024, 6, 1),
            "María",
            "Entrega Directa",
            "PET",
            100.04,
        )];
        let outtakes = vec![sale(date(2024, 6, 2), "PET", 33.36)];

        let rows = compute_balance(&intakes, &outtakes);
        let table = BalanceTable::project(&rows);

        assert_eq!(table.columns[0], "Venta (Aprovechamiento Efectivo)");
        assert_eq!(table.rows.len(), 1);
        assert_eq!(table.rows[0].entrada_kg, 100.0);
        assert_eq!(table.rows[0].salidas_kg[0], 33.4);
        assert_eq!(table.rows[0].salidas_kg.len(), table.columns.len());
        // Engine totals stay unrounded underneath
        assert!((table.totals.entrada_kg - 100.04).abs() < 1e-9);
        assert!(table.empty_warning().is_none());
    }

    #[test]
    fn test_empty_projections_warn() {
        let table = BalanceTable::project(&[]);
        assert!(table.empty_warning().is_some());

        let routes = RouteBreakdown::project(&[]);
        assert!(routes.empty_warning().is_some());

        let ranking = RecyclerRanking::project(&[]);
        assert!(ranking.empty_warning().is_some());

        let cut = SettlementCut::for_month(&[], 2024, 6).unwrap();
        let warning = cut.empty_warning().unwrap();
        assert!(warning.to_string().contains("2024-06"));
    }

    #[test]
    fn test_route_breakdown_groups_origin_by_material() {
        let intakes = vec![
            intake(date(2024, 6, 1), "María", "Ruta Selectiva Ibagué", "PET", 10.0),
            intake(date(2024, 6, 2), "Pedro", "Ruta Selectiva Ibagué", "PET", 15.0),
            intake(date(2024, 6, 3), "María", "Entrega Directa", "PET", 7.0),
            intake(date(2024, 6, 4), "María", "Ruta Selectiva Ibagué", "Vidrio", 5.0),
        ];

        let breakdown = RouteBreakdown::project(&intakes);
        assert_eq!(breakdown.rows.len(), 3);

        let route_pet = breakdown
            .rows
            .iter()
            .find(|r| r.origin == "Ruta Selectiva Ibagué" && r.material == "PET")
            .unwrap();
        assert_eq!(route_pet.weight_kg, 25.0);
    }

    #[test]
    fn test_recycler_ranking_descending_stable_ties() {
        let intakes = vec![
            intake(date(2024, 6, 1), "María", "Entrega Directa", "PET", 10.0),
            intake(date(2024, 6, 1), "Pedro", "Entrega Directa", "PET", 30.0),
            intake(date(2024, 6, 2), "Lucía", "Entrega Directa", "PET", 10.0),
            intake(date(2024, 6, 3), "María", "Entrega Directa", "Cartón", 0.0001),
        ];
        // María first-seen before Lucía; both at ~10 Kg, Pedro at 30 Kg

        let ranking = RecyclerRanking::project(&intakes);
        let names: Vec<&str> = ranking.rows.iter().map(|r| r.recycler.as_str()).collect();
        assert_eq!(names, vec!["Pedro", "María", "Lucía"]);
        assert_eq!(ranking.rows[0].weight_kg, 30.0);
        assert_eq!(ranking.rows[1].intake_count, 2);
    }

    #[test]
    fn test_settlement_cut_june_scenario() {
        // Three effective sales of 200 + 300 + 500 Kg → exactly 1.000 Ton;
        // a 999 Kg reject in the same month stays out of the cut.
        let outtakes = vec![
            sale(date(2024, 6, 3), "PET", 200.0),
            sale(date(2024, 6, 10), "Cartón", 300.0),
            sale(date(2024, 6, 24), "Vidrio", 500.0),
            OuttakeEvent::new(
                date(2024, 6, 15),
                "Relleno La Miel",
                OuttakeType::RejectLandfill,
                "Vidrio",
                999.0,
            ),
            // Sale in July: outside the cut
            sale(date(2024, 7, 1), "PET", 400.0),
        ];

        let cut = SettlementCut::for_month(&outtakes, 2024, 6).unwrap();
        assert_eq!(cut.line_items.len(), 3);
        assert!((cut.total_tons - 1.0).abs() < 1e-9);
        assert!(cut.summary().contains("1.000 Ton"));
    }

    #[test]
    fn test_inter_facility_sale_excluded_from_cut() {
        let outtakes = vec![
            sale(date(2024, 6, 3), "PET", 100.0),
            OuttakeEvent::new(
                date(2024, 6, 4),
                "ECA Norte",
                OuttakeType::InterFacilitySale,
                "PET",
                250.0,
            ),
        ];

        let cut = SettlementCut::for_month(&outtakes, 2024, 6).unwrap();
        assert_eq!(cut.line_items.len(), 1);
        assert!((cut.total_tons - 0.1).abs() < 1e-9);
    }
}
