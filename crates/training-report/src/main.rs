mod bootstrap;
mod render;

use std::io::IsTerminal;

use anyhow::Result;
use tokio::io::{AsyncBufReadExt, BufReader};
use training_core::settings::{OutputFormat, Settings};
use training_core::time_utils::DateParser;
use training_data::analysis::build_dashboard;
use training_data::filter::FilterEvaluator;
use training_data::lms::TrainingRecordBuilder;
use training_runtime::data_manager::DataManager;

#[tokio::main]
async fn main() -> Result<()> {
    let settings = Settings::load();

    bootstrap::setup_logging(&settings.log_level)?;

    tracing::info!("Training report v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!("Timezone: {}, format: {:?}", settings.timezone, settings.format);

    settings.require_data_source()?;
    let spec = settings.filter_spec()?;

    let paths = bootstrap::resolve_data_paths(&settings);
    tracing::info!(
        "LMS export: {}, StoryLane export: {}",
        paths.lms.display(),
        paths.engagement.display()
    );

    let parser = DateParser::new(&settings.timezone);
    let builder = TrainingRecordBuilder::new(parser.clone(), settings.missing_enrollment_date);
    let mut manager = DataManager::new(paths, builder);
    manager.load().await;

    offer_retry(&mut manager).await?;

    if let Some(err) = manager.last_error() {
        if manager.dataset().engagement.is_empty() {
            anyhow::bail!("{}", err);
        }
    }

    let report = build_dashboard(manager.dataset(), &spec, &FilterEvaluator::new(parser));

    let output = match settings.format {
        OutputFormat::Json => report.to_json()?,
        OutputFormat::Text => {
            let loads: Vec<_> = [manager.lms_report(), manager.engagement_report()]
                .into_iter()
                .flatten()
                .collect();
            render::render_text(&report, &loads, manager.last_error())?
        }
    };
    println!("{}", output);

    Ok(())
}

/// While the LMS export is failing and a person is at the terminal, let them
/// fix the file and retry.
async fn offer_retry(manager: &mut DataManager) -> Result<()> {
    if !std::io::stdin().is_terminal() {
        return Ok(());
    }

    let mut stdin = BufReader::new(tokio::io::stdin());
    while let Some(err) = manager.last_error().map(str::to_string) {
        eprintln!("LMS data unavailable: {}", err);
        eprintln!("Press Enter to retry, or type q to continue without it.");

        let mut line = String::new();
        let read = stdin.read_line(&mut line).await?;
        if read == 0 || line.trim().eq_ignore_ascii_case("q") {
            break;
        }
        manager.reload().await;
    }
    Ok(())
}
