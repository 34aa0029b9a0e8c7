use imgharvest::imgharvest_core::naming::size_from_stem;
use imgharvest::imgharvest_core::rules::file_stem;
use imgharvest::{HarvestConfig, MapOutcome, SiteLayout, map_staged};

use crate::shared::rule_line;

pub fn run(config: &HarvestConfig, layout: &SiteLayout) -> Result<(), i32> {
    println!("Mapping staged images to site folders...");
    println!("Source: {}", layout.display_path(layout.staging_dir()));
    println!("{}", rule_line());

    let report = map_staged(layout, &config.mapping).map_err(|e| {
        eprintln!("Error: {e}");
        1
    })?;

    for outcome in &report.outcomes {
        let rule = &outcome.rule;
        match &outcome.outcome {
            MapOutcome::Mapped {
                source,
                target,
                adjusted_from,
                fallback,
            } => {
                if let Some(original) = adjusted_from {
                    println!("  [INFO] Adjusting extension: {original} -> {target}");
                }
                if *fallback {
                    println!("  [INFO] No exact match for {}, using {source}", outcome.pattern);
                }
                let size = size_from_stem(file_stem(source))
                    .map_or(String::new(), |(w, h)| format!(" ({w}x{h}px)"));
                println!("  [OK] Mapped: {source}{size} -> {}/{target}", rule.category);
            }
            MapOutcome::NotFound => println!(
                "  [FAIL] Could not find image for {} -> {}/{}",
                outcome.pattern, rule.category, rule.target
            ),
            MapOutcome::CopyFailed {
                source,
                target,
                message,
            } => println!(
                "  [FAIL] Could not copy {source} -> {}/{target}: {message}",
                rule.category
            ),
            MapOutcome::UnknownCategory => println!(
                "  [FAIL] Unknown category '{}' for {}",
                rule.category, outcome.pattern
            ),
            MapOutcome::InvalidRule => println!(
                "  [FAIL] Rule for {}/{} has no source pattern",
                rule.category, rule.target
            ),
        }
    }

    println!("\n{}", rule_line());
    println!("[COMPLETE] Mapping finished!");
    println!("  Successfully mapped: {}", report.mapped());
    println!("  Failed: {}", report.failed());
    Ok(())
}
