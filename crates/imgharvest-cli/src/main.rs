mod automap_cmd;
mod cleanup_cmd;
mod cli;
mod extract_cmd;
mod images_cmd;
mod map_cmd;
mod scan_cmd;
mod shared;

use clap::Parser;
use cli::{Cli, Commands};
use imgharvest::SiteLayout;

fn main() {
    let cli = Cli::parse();
    shared::init_tracing(cli.verbose);

    let result = shared::load_config(&cli.config).and_then(|config| {
        let layout = SiteLayout::new(&config);
        match cli.command {
            Commands::Images { ref format } => images_cmd::run(&config, &layout, format),
            Commands::Extract { strategy } => extract_cmd::run(&config, &layout, strategy),
            Commands::Scan => scan_cmd::run(&layout),
            Commands::Map => map_cmd::run(&config, &layout),
            Commands::Automap => automap_cmd::run(&layout),
            Commands::Cleanup { dry_run } => cleanup_cmd::run(&config, &layout, dry_run),
        }
    });

    if let Err(code) = result {
        std::process::exit(code);
    }
}
