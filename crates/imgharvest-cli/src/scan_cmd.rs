use imgharvest::SiteLayout;

use crate::shared::rule_line;

pub fn run(layout: &SiteLayout) -> Result<(), i32> {
    println!("Scanning site sources...");
    for source in layout.source_files() {
        let state = if source.is_file() { "" } else { " (not found)" };
        println!("  {}{state}", layout.display_path(&source));
    }
    println!("{}", rule_line());

    let required = layout.collect_required_paths();
    println!("Found {} referenced image path(s):", required.len());
    let mut missing = 0;
    for path in &required {
        if layout.asset_path(path).exists() {
            println!("  [OK] {path}");
        } else {
            missing += 1;
            println!("  [MISSING] {path}");
        }
    }
    println!("\n[INFO] Present: {}", required.len() - missing);
    println!("[INFO] Missing: {missing}");
    Ok(())
}
