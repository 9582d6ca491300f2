// 💾 Export - Tabular encodings for downstream collaborators
// CSV round-trips the historical spreadsheet format (headers come from the
// serde renames on the event types); JSON feeds the presentation layer.
// Shape and content of the rows are owned upstream - this module only
// encodes.

use std::path::Path;

use anyhow::{Context, Result};
use serde::Serialize;

use crate::report::{BalanceTable, SettlementCut};
use crate::store::{IntakeEvent, OuttakeEvent};

// ============================================================================
// CSV WRITERS
// ============================================================================

/// Serialize any flat row set to CSV bytes.
pub fn rows_to_csv<T: Serialize>(rows: &[T]) -> Result<Vec<u8>> {
    let mut wtr = csv::Writer::from_writer(Vec::new());
    for row in rows {
        wtr.serialize(row).context("Failed to serialize CSV row")?;
    }
    let bytes = wtr
        .into_inner()
        .context("Failed to flush CSV writer")?;
    Ok(bytes)
}

pub fn export_intakes_csv(intakes: &[IntakeEvent]) -> Result<Vec<u8>> {
    rows_to_csv(intakes)
}

pub fn export_outtakes_csv(outtakes: &[OuttakeEvent]) -> Result<Vec<u8>> {
    rows_to_csv(outtakes)
}

/// Balance table CSV. The per-type columns vary with the observed labels,
/// so the record is written by hand instead of via serde.
pub fn export_balance_csv(table: &BalanceTable) -> Result<Vec<u8>> {
    let mut wtr = csv::Writer::from_writer(Vec::new());

    let mut header = vec!["Material".to_string(), "Entrada_Kg".to_string()];
    header.extend(table.columns.iter().cloned());
    header.push("Total_Salidas_Kg".to_string());
    header.push("Stock_Almacenado_Kg".to_string());
    wtr.write_record(&header)
        .context("Failed to write balance header")?;

    for row in &table.rows {
        let mut record = vec![row.material.clone(), format_kg(row.entrada_kg)];
        record.extend(row.salidas_kg.iter().map(|kg| format_kg(*kg)));
        record.push(format_kg(row.total_salidas_kg));
        record.push(format_kg(row.stock_kg));
        wtr.write_record(&record)
            .context("Failed to write balance row")?;
    }

    let bytes = wtr
        .into_inner()
        .context("Failed to flush CSV writer")?;
    Ok(bytes)
}

/// Settlement cut CSV (corte_conciliacion.csv): the effective-sale line
/// items under the historical outtake headers, closed by a total row in
/// metric tons for the committee.
pub fn export_settlement_csv(cut: &SettlementCut) -> Result<Vec<u8>> {
    let mut wtr = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(Vec::new());

    wtr.write_record(["Fecha", "Comprador", "Tipo_Salida", "Material", "Peso_Kg"])
        .context("Failed to write settlement header")?;

    for item in &cut.line_items {
        wtr.write_record([
            item.date.to_string(),
            item.buyer.clone(),
            item.outtake_type.label().to_string(),
            item.material.clone(),
            format_kg(item.weight_kg),
        ])
        .context("Failed to write settlement row")?;
    }

    wtr.write_record([
        "Total_Toneladas".to_string(),
        String::new(),
        String::new(),
        String::new(),
        format!("{:.3}", cut.total_tons),
    ])
    .context("Failed to write settlement total")?;

    let bytes = wtr
        .into_inner()
        .context("Failed to flush CSV writer")?;
    Ok(bytes)
}

fn format_kg(kg: f64) -> String {
    format!("{:.1}", kg)
}

// ============================================================================
// CSV READERS (historical exports back into a session)
// ============================================================================

pub fn read_intakes_csv(csv_path: &Path) -> Result<Vec<IntakeEvent>> {
    let mut rdr = csv::Reader::from_path(csv_path)
        .with_context(|| format!("Failed to open intake CSV {}", csv_path.display()))?;

    let mut intakes = Vec::new();
    for (line, result) in rdr.deserialize().enumerate() {
        let event: IntakeEvent =
            result.with_context(|| format!("Failed to deserialize intake row {}", line + 1))?;
        intakes.push(event);
    }
    Ok(intakes)
}

pub fn read_outtakes_csv(csv_path: &Path) -> Result<Vec<OuttakeEvent>> {
    let mut rdr = csv::Reader::from_path(csv_path)
        .with_context(|| format!("Failed to open outtake CSV {}", csv_path.display()))?;

    let mut outtakes = Vec::new();
    for (line, result) in rdr.deserialize().enumerate() {
        let event: OuttakeEvent =
            result.with_context(|| format!("Failed to deserialize outtake row {}", line + 1))?;
        outtakes.push(event);
    }
    Ok(outtakes)
}

// ============================================================================
// JSON
// ============================================================================

/// Pretty JSON for any report payload the presentation layer consumes.
pub fn to_json<T: Serialize>(value: &T) -> Result<String> {
    serde_json::to_string_pretty(value).context("Failed to encode report as JSON")
}

// ============================================================================
// TESTS
// ============================================================================
