use clap::Subcommand;
use control_predict_core::{spawn_countdown, Config, CountdownStatus};

#[derive(Subcommand)]
pub enum TimerAction {
    /// Run a countdown, printing each tick as JSON
    Start {
        /// Duration in seconds
        secs: Option<u64>,
        /// Use the n-th calming preset instead (0-based)
        #[arg(long, conflicts_with_all = ["secs", "routine"])]
        preset: Option<usize>,
        /// Use the n-th routine practice preset instead (0-based)
        #[arg(long, conflicts_with = "secs")]
        routine: Option<usize>,
    },
    /// List the configured preset durations
    Presets,
}

fn preset(presets: &[u64], n: usize, kind: &str) -> Result<u64, String> {
    presets
        .get(n)
        .copied()
        .ok_or_else(|| format!("no {kind} preset #{n} (have {})", presets.len()))
}

pub fn run(action: TimerAction) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load_or_default();
    match action {
        TimerAction::Start {
            secs,
            preset: calming,
            routine,
        } => {
            let countdown = &config.countdown;
            let secs = match (secs, calming, routine) {
                (Some(secs), _, _) => secs,
                (None, Some(n), _) => preset(&countdown.presets_secs, n, "calming")?,
                (None, None, Some(n)) => preset(&countdown.routine_presets_secs, n, "routine")?,
                (None, None, None) => {
                    return Err("pass a duration in seconds, --preset or --routine".into())
                }
            };
            let duration_ms = secs.checked_mul(1_000).ok_or("duration too large")?;
            let interval_ms = countdown.tick_interval_ms;

            let runtime = tokio::runtime::Runtime::new()?;
            let status = runtime.block_on(async move {
                let (_handle, mut events, task) = spawn_countdown(duration_ms, interval_ms);
                while let Some(event) = events.recv().await {
                    match serde_json::to_string(&event) {
                        Ok(line) => println!("{line}"),
                        Err(e) => eprintln!("error: {e}"),
                    }
                }
                task.await
            })?;

            if status != CountdownStatus::Expired {
                return Err(format!("countdown ended as {status:?}").into());
            }
        }
        TimerAction::Presets => {
            let json = serde_json::to_string_pretty(&serde_json::json!({
                "calming": config.countdown.presets_secs,
                "routine": config.countdown.routine_presets_secs,
            }))?;
            println!("{json}");
        }
    }
    Ok(())
}
