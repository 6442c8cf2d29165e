use anyhow::{Context, Result};
use clap::Parser;
use log::info;
use std::path::PathBuf;

use presser::io::wav;
use presser::params::ParamId;
use presser::plugin::{ControlSurface, create_plugin};
use presser::preset::{Manager, Preset};

#[derive(Parser, Debug)]
#[command(name = "presser")]
#[command(author = "OpenSauce")]
#[command(version)]
#[command(about = "A gain/compressor effect for WAV files.")]
struct Args {
    #[arg(help = "Input WAV file")]
    input: PathBuf,

    #[arg(help = "Output WAV file")]
    output: PathBuf,

    #[arg(long, default_value_t = 1.0, help = "Input gain, linear 0.0..=2.0")]
    input_gain: f32,

    #[arg(long, default_value_t = 1.0, help = "Output gain, linear 0.0..=2.0")]
    output_gain: f32,

    #[arg(long, default_value_t = -12.0, help = "Threshold in dB, -60.0..=0.0")]
    threshold: f32,

    #[arg(long, default_value_t = 4.0, help = "Compression ratio, 1.0..=20.0")]
    ratio: f32,

    #[arg(long, default_value_t = 20.0, help = "Attack in ms, 1.0..=1000.0")]
    attack: f32,

    #[arg(long, default_value_t = 200.0, help = "Release in ms, 10.0..=10000.0")]
    release: f32,

    #[arg(
        long,
        env = "PRESET_DIR",
        default_value = "./presets",
        help = "Directory holding preset files"
    )]
    preset_dir: String,

    #[arg(long, help = "Load this preset instead of the parameter flags")]
    preset: Option<String>,

    #[arg(long, help = "Save the effective parameters under this preset name")]
    save_preset: Option<String>,
}

fn main() -> Result<()> {
    dotenv::dotenv().ok();
    env_logger::init();

    let args = Args::parse();
    info!("presser v{}", env!("CARGO_PKG_VERSION"));

    let mut plugin = create_plugin();
    let bindings = plugin.bindings();

    if let Some(ref name) = args.preset {
        let manager = Manager::new(&args.preset_dir)
            .with_context(|| format!("failed to open preset directory '{}'", args.preset_dir))?;
        let preset = manager
            .get(name)
            .with_context(|| format!("preset '{name}' not found in '{}'", args.preset_dir))?;
        preset.apply_to(plugin.registry());
        info!("Loaded preset '{name}'");
    } else {
        bindings.set_param(ParamId::InputGain.index(), args.input_gain);
        bindings.set_param(ParamId::OutputGain.index(), args.output_gain);
        bindings.set_param(ParamId::Threshold.index(), args.threshold);
        bindings.set_param(ParamId::Ratio.index(), args.ratio);
        bindings.set_param(ParamId::Attack.index(), args.attack);
        bindings.set_param(ParamId::Release.index(), args.release);
    }

    if let Some(ref name) = args.save_preset {
        let mut manager = Manager::new(&args.preset_dir)
            .with_context(|| format!("failed to open preset directory '{}'", args.preset_dir))?;
        manager.save(&Preset::from_registry(name.clone(), plugin.registry()))?;
        info!("Saved preset '{name}'");
    }

    wav::process_file(&mut plugin, &args.input, &args.output)?;

    Ok(())
}
