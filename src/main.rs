use anyhow::Result;
use chrono::{Datelike, NaiveDate};
use std::env;
use std::path::Path;

use hormitraza::{
    read_intakes_csv, read_outtakes_csv, stock_quality_signals, OuttakeType, PeriodFilter,
    TraceSession,
};

fn main() -> Result<()> {
    let args: Vec<String> = env::args().collect();

    if args.len() > 3 && args[1] == "import" {
        // Import mode: reload historical CSV exports
        run_import(Path::new(&args[2]), Path::new(&args[3]))?;
    } else {
        // Demo mode (default)
        run_demo()?;
    }

    Ok(())
}

fn run_import(intakes_path: &Path, outtakes_path: &Path) -> Result<()> {
    println!("🐜 HormiTraza v{} - CSV Import", hormitraza::VERSION);
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    println!("\n📂 Loading event tables...");
    let intakes = read_intakes_csv(intakes_path)?;
    let outtakes = read_outtakes_csv(outtakes_path)?;
    println!(
        "✓ Loaded {} intakes, {} outtakes",
        intakes.len(),
        outtakes.len()
    );

    let latest = intakes
        .iter()
        .map(|e| e.date)
        .chain(outtakes.iter().map(|e| e.date))
        .max();

    let mut session = TraceSession::new();
    let (intake_count, outtake_count) = session.import_events(intakes, outtakes)?;
    println!("✓ Session loaded ({} + {} events)", intake_count, outtake_count);

    print_reports(&session, None)?;

    // Settlement cut for the latest month seen in the data
    if let Some(latest) = latest {
        print_settlement(&session, latest.year(), latest.month())?;
    }

    Ok(())
}

fn run_demo() -> Result<()> {
    println!("🐜 HormiTraza v{} - Demo Session", hormitraza::VERSION);
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    let mut session = TraceSession::new();
    seed_demo_events(&mut session)?;
    println!(
        "\n✓ Registered {} intakes, {} outtakes",
        session.store().intake_count(),
        session.store().outtake_count()
    );

    let june = PeriodFilter::for_month(2024, 6)?;
    print_reports(&session, Some(&june))?;
    print_settlement(&session, 2024, 6)?;

    Ok(())
}

fn seed_demo_events(session: &mut TraceSession) -> Result<()> {
    let entries = [
        (date(2024, 6, 3), "María Rojas", "Ruta Selectiva Ibagué", "PET", 120.5),
        (date(2024, 6, 3), "Pedro Gil", "Ruta Selectiva Ibagué", "Cartón", 210.0),
        (date(2024, 6, 10), "María Rojas", "Entrega Directa", "Vidrio", 95.2),
        (date(2024, 6, 17), "Lucía Mora", "Otra Asociación", "PET", 64.3),
        (date(2024, 6, 24), "Pedro Gil", "Ruta Selectiva Ibagué", "Archivo", 48.0),
    ];
    for (d, recycler, origin, material, kg) in entries {
        session.submit_intake(d, recycler, origin, material, kg)?;
    }

    let exits = [
        (date(2024, 6, 12), "EcoCompra SAS", OuttakeType::SaleEffective, "Cartón", 180.0),
        (date(2024, 6, 20), "Plásticos del Tolima", OuttakeType::SaleEffective, "PET", 140.0),
        (date(2024, 6, 21), "Relleno La Miel", OuttakeType::RejectLandfill, "Vidrio", 22.5),
        (date(2024, 6, 28), "ECA Norte", OuttakeType::InterFacilitySale, "Archivo", 15.0),
    ];
    for (d, buyer, outtake_type, material, kg) in exits {
        session.submit_outtake(d, buyer, outtake_type, material, kg)?;
    }

    Ok(())
}

fn print_reports(session: &TraceSession, filter: Option<&PeriodFilter>) -> Result<()> {
    println!("\n⚖️  Balance de Masas");
    let table = session.balance_table(filter);
    if let Some(warning) = table.empty_warning() {
        println!("   {}", warning);
        return Ok(());
    }

    println!(
        "   Entrada {:.1} Kg | Aprovechado {:.1} Kg | Rechazo {:.1} Kg | Stock {:.1} Kg",
        table.totals.entrada_kg,
        table.totals.aprovechado_kg,
        table.totals.rechazo_kg,
        table.totals.stock_kg
    );
    for row in &table.rows {
        println!(
            "   {:<12} entrada {:>8.1}  salidas {:>8.1}  stock {:>8.1}",
            row.material, row.entrada_kg, row.total_salidas_kg, row.stock_kg
        );
    }

    let signals = stock_quality_signals(&session.compute_balance(filter));
    for signal in &signals {
        println!("   ⚠️  {}: {}", signal.material, signal.issue);
    }

    println!("\n🚛 Desglose por Origen");
    for row in &session.route_breakdown(filter).rows {
        println!("   {:<24} {:<12} {:>8.1} Kg", row.origin, row.material, row.weight_kg);
    }

    println!("\n🏅 Ranking de Recicladores");
    for (i, row) in session.recycler_ranking(filter).rows.iter().enumerate() {
        println!(
            "   {}. {:<16} {:>8.1} Kg ({} entregas)",
            i + 1,
            row.recycler,
            row.weight_kg,
            row.intake_count
        );
    }

    Ok(())
}

fn print_settlement(session: &TraceSession, year: i32, month: u32) -> Result<()> {
    println!("\n🤝 Corte de Conciliación {}-{:02}", year, month);
    let cut = session.monthly_settlement_cut(year, month)?;

    match cut.empty_warning() {
        Some(warning) => println!("   {}", warning),
        None => {
            println!("   Total a conciliar: {:.3} Ton", cut.total_tons);
            for item in &cut.line_items {
                println!(
                    "   {} {:<20} {:<10} {:>8.1} Kg",
                    item.date, item.buyer, item.material, item.weight_kg
                );
            }
        }
    }

    Ok(())
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap_or_default()
}
