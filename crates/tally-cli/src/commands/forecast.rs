//! Forecast command

use anyhow::{anyhow, Context, Result};
use chrono::{Datelike, Months};
use tally_core::Engine;

/// Parse "YYYY-MM", defaulting to the month after today
fn resolve_month(month: Option<&str>) -> Result<(i32, u32)> {
    match month {
        Some(s) => {
            let (y, m) = s
                .split_once('-')
                .ok_or_else(|| anyhow!("Invalid month '{}' (use YYYY-MM)", s))?;
            let year: i32 = y.parse().context("Invalid year")?;
            let month: u32 = m.parse().context("Invalid month")?;
            if !(1..=12).contains(&month) {
                return Err(anyhow!("Month must be 1-12"));
            }
            Ok((year, month))
        }
        None => {
            let next = chrono::Local::now()
                .date_naive()
                .checked_add_months(Months::new(1))
                .expect("next month");
            Ok((next.year(), next.month()))
        }
    }
}

pub async fn cmd_forecast(engine: &Engine, month: Option<&str>, json: bool) -> Result<()> {
    let (year, month) = resolve_month(month)?;
    let today = chrono::Local::now().date_naive();

    println!("🔮 Forecasting {}-{:02}... (training on full history)", year, month);
    let report = engine.forecast_report(year, month, today).join().await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!();
    println!("📊 Predicted Spending");
    println!("   ─────────────────────────────");
    for c in &report.forecast.categories {
        println!("   {:<16} {:>10.2}", c.category, c.amount);
    }
    println!("   {:<16} {:>10.2}", "TOTAL", report.forecast.total);

    if report.last_month_actual > 0.0 {
        let direction = if report.difference > 0.0 { "more" } else { "less" };
        println!();
        println!(
            "   {:.2} {} than last month's actual ({:.2})",
            report.difference.abs(),
            direction,
            report.last_month_actual
        );
    }

    println!();
    if report.breaches.is_empty() {
        println!("✅ Predicted spending is within all configured budgets.");
    } else {
        println!("⚠️  Projected budget overruns:");
        for b in &report.breaches {
            println!(
                "   {:<16} projected {:>10.2} vs limit {:>10.2} (over by {:.2})",
                b.category, b.projected, b.monthly_limit, b.overspend
            );
        }
        println!(
            "   Trimming the flagged categories would save {:.2}.",
            report.total_projected_overspend
        );
    }

    Ok(())
}
