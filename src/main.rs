//! Lotto Drum headless runner
//!
//! Runs complete draws at a fixed 60 Hz step on virtual time and prints the
//! results, or prints the per-number statistics of a history file.

use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use rand::SeedableRng;
use rand_pcg::Pcg32;

use lotto_drum::audio::{AudioManager, LogBackend};
use lotto_drum::blower::{BlowerInput, BlowerMode};
use lotto_drum::consts::SIM_DT;
use lotto_drum::history::{DrawHistory, HistoryCache, NumberField};
use lotto_drum::sim::{DrawEvent, DrawRequest, SimState, TickInput, tick};
use lotto_drum::stats::{prepare_plan, stats_table};
use lotto_drum::view;
use lotto_drum::{DrawSettings, Preset};

/// Virtual-time guard: no draw should take longer than this
const MAX_DRAW_SECONDS: f32 = 3600.0;

#[derive(Parser)]
#[command(name = "lotto-drum")]
#[command(about = "Simulate lottery drum draws", long_about = None)]
struct Cli {
    /// Settings JSON file (defaults are used when missing)
    #[arg(long, global = true)]
    settings: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run one or more complete draws
    Draw {
        /// Preset: euromillions, eurojackpot, swisslotto, custom
        #[arg(long)]
        preset: Option<String>,

        /// Auto-mix seconds before each ejection
        #[arg(long)]
        mix_time: Option<f32>,

        /// Blower mode: constant, shake, breath
        #[arg(long)]
        blower: Option<String>,

        /// RNG seed (random when omitted)
        #[arg(long)]
        seed: Option<u64>,

        /// Historical draws JSON for weighted selection
        #[arg(long)]
        history: Option<PathBuf>,

        /// Bias the draw by historical frequency and recency
        #[arg(long, default_value = "false")]
        weighted: bool,

        /// Number of consecutive draws
        #[arg(long, default_value = "1")]
        rounds: u32,

        /// Write the effective settings back to the settings file
        #[arg(long, default_value = "false")]
        save: bool,
    },

    /// Print per-number weights for a history file
    Stats {
        /// Historical draws JSON
        #[arg(long)]
        history: PathBuf,

        /// Report the secondary numbers (stars / extra) instead of the main ones
        #[arg(long, default_value = "false")]
        second: bool,

        /// Weighting strength override (0..1)
        #[arg(long)]
        strength: Option<f64>,
    },
}

fn main() -> Result<()> {
    env_logger::init();

    let cli = Cli::parse();
    let mut settings = match &cli.settings {
        Some(path) => DrawSettings::load_or_default(path),
        None => DrawSettings::default(),
    };

    match cli.command {
        Commands::Draw {
            preset,
            mix_time,
            blower,
            seed,
            history,
            weighted,
            rounds,
            save,
        } => {
            if let Some(name) = preset {
                let preset = Preset::from_str(&name)
                    .with_context(|| format!("unknown preset '{}'", name))?;
                settings.apply_preset(preset);
            }
            if let Some(secs) = mix_time {
                settings.mix_time = secs;
            }
            if let Some(name) = blower {
                settings.blower_mode = BlowerMode::from_str(&name)
                    .with_context(|| format!("unknown blower mode '{}'", name))?;
            }
            settings.sanitize();

            if save {
                let Some(path) = &cli.settings else {
                    bail!("--save needs --settings <FILE>");
                };
                settings.save(path).context("failed to save settings")?;
            }

            let seed = seed.unwrap_or_else(rand::random);
            run_draws(&settings, seed, history.filter(|_| weighted), rounds)
        }
        Commands::Stats {
            history,
            second,
            strength,
        } => {
            let history = DrawHistory::load(&history)
                .with_context(|| format!("failed to read {}", history.display()))?;
            let (field, max_number) = if second {
                (NumberField::Second, settings.second_count)
            } else {
                (NumberField::Main, settings.main_count)
            };
            let strength = strength.unwrap_or(settings.stat_weight).clamp(0.0, 1.0);

            println!("{:>4} {:>8} {:>6} {:>6}", "#", "weight", "freq", "delay");
            for row in stats_table(&history, field, max_number, strength) {
                println!(
                    "{:>4} {:>7.2}% {:>6} {:>6}",
                    row.number, row.percent, row.freq, row.delay
                );
            }
            Ok(())
        }
    }
}

fn run_draws(
    settings: &DrawSettings,
    seed: u64,
    history_path: Option<PathBuf>,
    rounds: u32,
) -> Result<()> {
    log::info!("Seed {}", seed);

    let config = settings.draw_config();
    let mut state = SimState::new(seed, config);
    let mut plan_rng = Pcg32::seed_from_u64(seed.wrapping_add(1));
    let mut cache = HistoryCache::new();
    let mut blower = BlowerInput::new(settings.blower_mode);
    let mut audio = AudioManager::new(Some(Box::new(LogBackend)));
    audio.set_muted(settings.muted);
    audio.set_blower_mode(settings.blower_mode);

    for round in 1..=rounds {
        let plan = history_path.as_ref().and_then(|path| {
            let history = cache.get_or_load(|| DrawHistory::load(path)).ok()?;
            prepare_plan(history, &config, settings.stat_weight, &mut plan_rng)
        });
        let request = match plan {
            Some(plan) => DrawRequest::Weighted(config, plan),
            None => DrawRequest::Random(config),
        };

        let mut input = TickInput {
            start: Some(request),
            ..Default::default()
        };
        let mut elapsed = 0.0;
        let mut result = None;

        while result.is_none() {
            if elapsed > MAX_DRAW_SECONDS {
                bail!("draw {} did not finish after {} s of virtual time", round, MAX_DRAW_SECONDS);
            }
            input.jet_multiplier = blower.jet_multiplier();
            tick(&mut state, &input, SIM_DT);
            if input.start.take().is_some() && state.mode.is_idle() {
                bail!("nothing to draw: {} of {}", config.main_target, config.main_count);
            }
            blower.decay();
            elapsed += SIM_DT;

            let events = state.drain_events();
            audio.handle_events(&events);
            for event in events {
                match event {
                    DrawEvent::ModeChanged { to, .. } => {
                        let hint = blower.show_blow_hint(to.is_airblast());
                        let frame = view::drum_view(&state, hint);
                        log::debug!("{} with {} balls visible", frame.mode, frame.balls.len());
                    }
                    DrawEvent::ResultCommitted { number, phase } => {
                        log::info!("{:?}: {}", phase, number);
                    }
                    DrawEvent::DrawComplete { main, second } => result = Some((main, second)),
                    _ => {}
                }
            }
        }

        if let Some((main, second)) = result {
            let prefix = if rounds > 1 { format!("#{} ", round) } else { String::new() };
            println!("{}{}", prefix, view::format_results(&main, &second, settings.second_kind));
        }

        // Let the fanfare cue fire before the next round
        for _ in 0..30 {
            tick(&mut state, &TickInput::default(), SIM_DT);
            audio.handle_events(&state.drain_events());
        }
    }
    Ok(())
}
