use imgharvest::{AutoMapOutcome, SiteLayout, automap};

use crate::shared::rule_line;

pub fn run(layout: &SiteLayout) -> Result<(), i32> {
    let required = layout.collect_required_paths();
    println!("Required image paths: {}", required.len());

    let report = automap(layout, &required).map_err(|e| {
        eprintln!("Error: {e}");
        1
    })?;

    for entry in report.missing() {
        println!("  [MISSING] {}", entry.required);
    }
    println!("{}", rule_line());

    for entry in report.missing() {
        match &entry.outcome {
            AutoMapOutcome::Mapped { source, target } => {
                println!("  [OK] Mapped: {source} -> {target}");
            }
            AutoMapOutcome::NotFound => {
                println!("  [FAIL] Could not find replacement for {}", entry.required);
            }
            AutoMapOutcome::CopyFailed { source, message } => {
                println!("  [FAIL] Could not copy {source} -> {}: {message}", entry.required);
            }
            AutoMapOutcome::Present => {}
        }
    }

    println!("\n{}", rule_line());
    println!("[COMPLETE] Auto-mapping finished!");
    println!("  Mapped: {}", report.mapped());
    println!("  Not found: {}", report.not_found());
    Ok(())
}
