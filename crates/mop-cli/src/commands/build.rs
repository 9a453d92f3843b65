use crate::cli::BuildArgs;
use crate::config::PartialAssemblyConfig;
use crate::error::{CliError, Result};
use crate::utils::progress::CliProgressHandler;
use mopbuild::{
    core::io::{bgf::BgfFile, traits::MolecularFile},
    engine::progress::ProgressReporter,
    workflows::assemble::{self, AssemblyResult},
};
use tracing::{debug, info};

pub fn run(args: BuildArgs) -> Result<()> {
    let partial_config = match &args.config {
        Some(path) => PartialAssemblyConfig::from_file(path)?,
        None => PartialAssemblyConfig::default(),
    };
    info!("Merging configuration from file and CLI arguments...");
    let final_config = partial_config.merge_with_cli(&args)?;
    debug!("Resolved assembly configuration: {:?}", &final_config);

    info!("Loading ligand template from {:?}", &args.input);
    let (ligand, metadata) =
        BgfFile::read_from_path(&args.input).map_err(|e| CliError::FileParsing {
            path: args.input.clone(),
            source: e.into(),
        })?;

    let progress_handler = CliProgressHandler::new();
    let reporter = ProgressReporter::with_callback(progress_handler.get_callback());

    println!(
        "Assembling '{}' on a {} ({} mode)...",
        ligand.name(),
        final_config.shape,
        final_config.mode
    );
    let (sim_box, result) = assemble::build(&ligand, &final_config, &reporter)?;

    info!("Writing assembled structure to {:?}", &args.output);
    BgfFile::write_to_path(&sim_box, &metadata, &args.output).map_err(|e| {
        CliError::FileParsing {
            path: args.output.clone(),
            source: e.into(),
        }
    })?;

    println!("{}", summarize(&result, sim_box.boundary().dimensions().map(|d| [d.x, d.y, d.z])));
    println!("✓ Structure written to: {}", args.output.display());
    Ok(())
}

fn summarize(result: &AssemblyResult, box_lengths: Option<[f64; 3]>) -> String {
    let box_line = match box_lengths {
        Some([a, b, c]) => format!("{:.3} x {:.3} x {:.3} Å", a, b, c),
        None => "open".to_string(),
    };
    format!(
        "  Copies placed:          {}\n  Coordinate multiplier:  {:.5}\n  Worst anchor deviation: {:.2e} Å\n  Box:                    {}",
        result.placements.len(),
        result.coordinate_multiplier,
        result.worst_anchor_deviation(),
        box_line
    )
}
