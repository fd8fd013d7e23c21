use std::path::PathBuf;

use clap::{Args, ValueEnum};
use control_predict_core::{
    Config, MemoryProgress, Phase, ProgressStore, Scenario, ScenarioSequencer, SequenceMode,
    SequencerEvent, StaticCatalog,
};
use tracing::info;

use crate::clock::Clock;

/// Outcome badge hold when the config leaves it unset.
const DEFAULT_OUTCOME_HOLD_MS: u64 = 2_500;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Answer {
    Correct,
    Wrong,
}

#[derive(Args)]
pub struct PlayArgs {
    /// Location id (e.g. "home", "park")
    #[arg(long)]
    location: String,
    /// Catalog file; defaults to catalog.path from the config
    #[arg(long)]
    catalog: Option<PathBuf>,
    /// Answers for successive pauses; "correct" once exhausted
    #[arg(long, value_enum, value_delimiter = ',')]
    answers: Vec<Answer>,
    /// Scenario index to start from
    #[arg(long, default_value = "0")]
    start: usize,
    /// Sleep until each deadline instead of jumping to it
    #[arg(long)]
    realtime: bool,
}

fn pick_choice(scenario: &Scenario, answer: Answer) -> Option<String> {
    let wanted = answer == Answer::Correct;
    scenario
        .choices
        .iter()
        .find(|c| c.is_correct == wanted)
        .or_else(|| scenario.choices.first())
        .map(|c| c.id.clone())
}

fn emit(events: Vec<SequencerEvent>) -> Result<(), Box<dyn std::error::Error>> {
    for event in events {
        println!("{}", serde_json::to_string(&event)?);
    }
    Ok(())
}

pub fn run(args: PlayArgs) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load_or_default();
    let catalog = StaticCatalog::open(args.catalog.as_deref(), &config)?;

    let mut playback = config.playback.clone();
    playback.outcome_hold_ms.get_or_insert(DEFAULT_OUTCOME_HOLD_MS);

    let mut seq = ScenarioSequencer::from_catalog(
        &catalog,
        &args.location,
        playback,
        MemoryProgress::new(),
    );
    if seq.is_empty() {
        return Err(format!("no scenarios for location: {}", args.location).into());
    }
    if args.start >= seq.len() {
        return Err(format!("start index {} out of range (0..{})", args.start, seq.len()).into());
    }
    info!(location = %args.location, scenarios = seq.len(), "playing location");

    let mut clock = Clock::new(args.realtime);
    let mut answers = args.answers.into_iter();
    emit(seq.select(args.start, clock.now_ms()))?;

    while seq.mode() == SequenceMode::Playing {
        let now = clock.now_ms();
        if seq.awaiting_decision() {
            emit(seq.advance_or_exit(now))?;
            continue;
        }
        match seq.phase() {
            Phase::PausedForPrediction => {
                let answer = answers.next().unwrap_or(Answer::Correct);
                let choice = seq
                    .active_scenario()
                    .and_then(|s| pick_choice(s, answer))
                    .ok_or("scenario has no choices")?;
                emit(seq.select_choice(&choice, now))?;
            }
            Phase::Outcome if seq.next_deadline().is_none() => {
                emit(seq.acknowledge_outcome(now))?;
            }
            _ => match seq.next_deadline() {
                Some(deadline) => {
                    clock.wait_until(deadline);
                    emit(seq.tick(clock.now_ms()))?;
                }
                None => return Err(format!("playback stalled in {}", seq.phase()).into()),
            },
        }
    }

    println!("{}", seq.into_progress().snapshot().to_json()?);
    Ok(())
}
