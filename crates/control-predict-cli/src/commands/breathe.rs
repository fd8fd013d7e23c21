use clap::Args;
use control_predict_core::{BreathingEvent, BreathingExercise, Config};

use crate::clock::Clock;

#[derive(Args)]
pub struct BreatheArgs {
    /// Number of breaths; defaults to breathing.cycles from the config
    #[arg(long)]
    cycles: Option<u32>,
    /// Sleep through each phase instead of jumping to its end
    #[arg(long)]
    realtime: bool,
}

fn emit(events: &[BreathingEvent]) -> Result<(), Box<dyn std::error::Error>> {
    for event in events {
        println!("{}", serde_json::to_string(event)?);
    }
    Ok(())
}

pub fn run(args: BreatheArgs) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load_or_default();
    let mut pattern = config.breathing;
    if let Some(cycles) = args.cycles {
        pattern.cycles = cycles;
    }

    let mut clock = Clock::new(args.realtime);
    let mut exercise = BreathingExercise::with_interval(pattern, config.countdown.tick_interval_ms);
    emit(&exercise.start(clock.now_ms()))?;

    while !exercise.is_finished() {
        let Some(deadline) = exercise.next_deadline() else {
            break;
        };
        clock.wait_until(deadline);
        emit(&exercise.tick(clock.now_ms()))?;
    }
    Ok(())
}
