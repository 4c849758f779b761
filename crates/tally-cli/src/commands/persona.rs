//! Persona command

use anyhow::Result;
use tally_core::Engine;

pub async fn cmd_persona(engine: &Engine) -> Result<()> {
    println!("🔬 Clustering your spending history...");
    match engine.generate_persona().join().await? {
        None => {
            println!("Not enough history yet (30+ transactions needed).");
        }
        Some(persona) => {
            println!();
            println!("🧬 {}", persona.title);
            println!("   ─────────────────────────────");
            for cluster in &persona.clusters {
                println!("   {}", cluster.label);
                println!(
                    "      {} transactions, avg {:.2}, mostly {}",
                    cluster.transaction_count,
                    cluster.avg_amount,
                    cluster.time_focus
                );
                println!("      Top categories: {}", cluster.top_categories.join(", "));
            }
        }
    }
    Ok(())
}
