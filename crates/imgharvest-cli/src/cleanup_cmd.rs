use imgharvest::{HarvestConfig, SiteLayout, execute_cleanup, plan_cleanup};

use crate::shared::rule_line;

pub fn run(config: &HarvestConfig, layout: &SiteLayout, dry_run: bool) -> Result<(), i32> {
    let required = layout.collect_required_paths();
    println!("Required image paths ({}):", required.len());
    for path in &required {
        println!("  {path}");
    }
    println!("{}", rule_line());

    let plan = plan_cleanup(layout, &required, &config.mapping.categories, &config.cleanup)
        .map_err(|e| {
            eprintln!("Error: {e}");
            1
        })?;

    println!("Unused images ({}):", plan.unused.len());
    for path in &plan.unused {
        println!("  {}", layout.display_path(path));
    }
    println!(
        "Staging files to delete ({}): {}",
        plan.staging_files.len(),
        layout.display_path(&plan.staging_dir)
    );

    if dry_run {
        println!("\n[DRY RUN] Nothing deleted.");
        return Ok(());
    }

    println!("{}", rule_line());
    let report = execute_cleanup(&plan);
    for path in &report.deleted {
        println!("  [DELETED] {}", layout.display_path(path));
    }
    for (path, message) in &report.failures {
        println!("  [FAIL] Could not delete {}: {message}", layout.display_path(path));
    }
    for dir in &report.removed_dirs {
        println!("  [DELETED] {}/", layout.display_path(dir));
    }

    println!("\n{}", rule_line());
    println!("[COMPLETE] Cleanup finished!");
    println!("  Total files deleted: {}", report.deleted.len());
    Ok(())
}
