use std::path::PathBuf;

use anyhow::Context;
use chart_core::{summarize_str, ChartConfig, ChartSnapshot, FlowSheetRow, UNDATED_KEY};
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(
    name = "chart-cli",
    about = "Hợp nhất y lệnh và chỉ số sống đã tải từ file JSON."
)]
struct Args {
    /// Đường dẫn tới file JSON bệnh án.
    #[arg(short, long)]
    input: PathBuf,

    /// File JSON cấu hình, ghi đè thứ tự ưu tiên mặc định.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// In toàn bộ snapshot dạng JSON thay vì bản tóm tắt.
    #[arg(long)]
    json: bool,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("chart=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args = Args::parse();
    let data = std::fs::read_to_string(&args.input)
        .with_context(|| format!("Không đọc được file {:?}", args.input))?;

    let config = match &args.config {
        Some(path) => {
            let raw = std::fs::read_to_string(path)
                .with_context(|| format!("Không đọc được config {path:?}"))?;
            serde_json::from_str::<ChartConfig>(&raw)
                .with_context(|| format!("Config không hợp lệ {path:?}"))?
        }
        None => ChartConfig::default(),
    };

    let snapshot = summarize_str(&data, &config)
        .with_context(|| format!("Không tóm tắt được {:?}", args.input))?;
    tracing::info!(
        order_days = snapshot.orders.len(),
        medications = snapshot.medications.len(),
        flowsheet_rows = snapshot.flowsheet.rows.len(),
        "summarized chart"
    );

    if args.json {
        println!("{}", serde_json::to_string_pretty(&snapshot)?);
    } else {
        print_summary(&snapshot);
    }

    Ok(())
}

fn print_summary(snapshot: &ChartSnapshot) {
    println!("Generated at: {}", snapshot.generated_at);

    println!("\nOrders:");
    for group in &snapshot.orders {
        let day = if group.key == UNDATED_KEY {
            "undated"
        } else {
            group.key.as_str()
        };
        println!("  {day}");
        for order in &group.items {
            println!(
                "    [{}] {} ({})",
                order.status.as_deref().unwrap_or("-"),
                order.display,
                order.priority.as_deref().unwrap_or("-")
            );
        }
    }

    println!("\nMedications:");
    for med in &snapshot.medications {
        println!(
            "  [{}] {} {}",
            med.status.as_deref().unwrap_or("-"),
            med.drug,
            med.dose.as_deref().unwrap_or("")
        );
    }

    println!("\nVitals ({} timestamps):", snapshot.flowsheet.timestamps.len());
    for row in &snapshot.flowsheet.rows {
        let latest = match row {
            FlowSheetRow::Group { cells, .. } => cells.first().map(|cell| {
                let flag = if cell.abnormal { " !" } else { "" };
                format!("{}{flag}", cell.value)
            }),
            FlowSheetRow::Concept { cells, .. } => cells.first().map(|cell| match cell {
                Some(observed) if observed.abnormal => format!("{} !", observed.value),
                Some(observed) => observed.value.clone(),
                None => "-".to_string(),
            }),
        };
        println!("  {}: {}", row.label(), latest.unwrap_or_default());
    }
}
