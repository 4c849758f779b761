//! Classifier commands: classify, train

use anyhow::Result;
use tally_core::Engine;

pub fn cmd_classify(engine: &Engine, description: &str, top: Option<usize>) -> Result<()> {
    match top {
        Some(k) => {
            let candidates = engine.classify_top_k(description, k);
            if candidates.is_empty() {
                println!("No candidates. Is a model trained? Try 'tally train'.");
                return Ok(());
            }
            println!("Top categories for \"{}\":", description);
            for (i, p) in candidates.iter().enumerate() {
                println!("  {}. {:<16} {:>5.1}%", i + 1, p.category, p.confidence * 100.0);
            }
        }
        None => {
            let prediction = engine.classify(description);
            println!(
                "{} ({:.1}% confident)",
                prediction.category,
                prediction.confidence * 100.0
            );
        }
    }
    Ok(())
}

pub async fn cmd_train(engine: &Engine) -> Result<()> {
    println!("🧠 Retraining classifier...");
    let outcome = engine.retrain_classifier().join().await?;
    println!(
        "✅ Trained on {} examples across {} categories",
        outcome.examples, outcome.labels
    );
    println!("   Model swapped in and persisted.");
    Ok(())
}
