//! dab-coarse - coarse frequency correction for DAB symbol streams

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::info;

use dab_sync::geometry::DabMode;
use dab_tools::correct::run_correct;
use dab_tools::synth::run_synth;
use dab_tools::{init_logging, CorrectConfig, SynthConfig};

/// DAB coarse frequency correction tool
#[derive(Parser)]
#[command(name = "dab-coarse")]
#[command(about = "Integer carrier offset estimation and correction for DAB OFDM symbols")]
#[command(version)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Enable debug output
    #[arg(long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Estimate and remove the carrier offset of a symbol stream
    Correct(CorrectConfig),
    /// Generate a symbol stream with a known carrier offset
    Synth(SynthConfig),
    /// Show the DAB mode parameters
    Info,
}

fn show_info() {
    println!("\n=== DAB Transmission Modes ===");
    println!(
        "  {:<5} {:>6} {:>5} {:>9} {:>8} {:>6} {:>12}",
        "mode", "fft", "cp", "carriers", "symbols", "null", "spacing (Hz)"
    );
    for mode in DabMode::ALL {
        let geometry = mode.geometry();
        println!(
            "  {:<5} {:>6} {:>5} {:>9} {:>8} {:>6} {:>12.0}",
            mode.to_string(),
            mode.fft_length(),
            mode.cp_length(),
            mode.num_carriers(),
            mode.symbols_per_frame(),
            mode.null_symbol_length(),
            mode.carrier_spacing()
        );
        println!(
            "        guard bins {}/{}, DC bin {:?}, correctable offsets {:?}",
            geometry.zeros_on_left(),
            geometry.zeros_on_right(),
            geometry.dc_bin(),
            geometry.shift_range()
        );
    }

    println!("\n=== Example Usage ===");
    println!("  Synth:   dab-coarse synth -m II --offset -7 --frames 2 -o shifted.cf32");
    println!("  Correct: dab-coarse correct -m II -i shifted.cf32 -o fixed.cf32 --report report.json");
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose, cli.debug);

    info!("dab-coarse starting");

    match cli.command {
        Commands::Correct(config) => {
            info!("Correcting symbols from {:?}", config.input);

            let report = run_correct(&config)?;

            println!("✓ Processed {} symbols", report.symbols);
            for estimate in &report.estimates {
                println!(
                    "  symbol {:>6}: offset {:>+5} carriers ({:>+10.1} Hz), concentration {:.3}",
                    estimate.symbol_index,
                    estimate.delta_f,
                    estimate.offset_hz,
                    estimate.concentration
                );
            }
            if let Some(ref output) = config.output {
                println!("✓ Corrected symbols written to {:?}", output);
            }
        }

        Commands::Synth(config) => {
            info!("Generating mode {} symbols with offset {}", config.mode, config.offset);

            let samples = run_synth(&config)?;

            println!("✓ Generated {} samples to {:?}", samples, config.output);
        }

        Commands::Info => {
            show_info();
        }
    }

    Ok(())
}
