mod bootstrap;
mod report;

use std::process::ExitCode;

use anyhow::Result;
use msgstats_core::settings::Settings;
use msgstats_data::aggregator::{MessageAnalyzer, SpanPolicy};
use msgstats_data::analysis::analyze_archive;
use msgstats_data::reader::JsonFileSource;
use msgstats_data::sentiment::LexiconScorer;
use msgstats_data::text::{SplitMode, StopWords};

fn main() -> ExitCode {
    let settings = match Settings::load() {
        Ok(settings) => settings,
        Err(err) => {
            eprintln!("{}", err);
            return ExitCode::FAILURE;
        }
    };

    if let Err(err) = bootstrap::setup_logging(&settings.log_level) {
        eprintln!("Failed to initialise logging: {}", err);
    }

    tracing::info!("msgstats v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::debug!(
        "Timezone: {}, top-k: {}, split: {}, charts: {}",
        settings.timezone,
        settings.top_k,
        settings.split,
        settings.charts.join(",")
    );

    match run(&settings) {
        Ok(output) => {
            print!("{}", output);
            ExitCode::SUCCESS
        }
        Err(err) => {
            tracing::error!("{}", err);
            eprintln!("{}", err);
            ExitCode::FAILURE
        }
    }
}

/// Load, aggregate and render; nothing is printed unless every step
/// succeeded.
fn run(settings: &Settings) -> Result<String> {
    let analyzer = build_analyzer(settings)?;
    let mut source = JsonFileSource::new();
    let analysis = analyze_archive(&mut source, &settings.file, &analyzer, settings.top_k())?;

    let output = if settings.wants_json() {
        let mut json = report::render_json(&analysis)?;
        json.push('\n');
        json
    } else {
        report::render_text(&analysis.result, &settings.charts, usize::from(settings.width))
    };
    Ok(output)
}

fn build_analyzer(settings: &Settings) -> Result<MessageAnalyzer> {
    let split_mode: SplitMode = settings.split.parse()?;
    let span_policy = if settings.strict_span {
        SpanPolicy::Reject
    } else {
        SpanPolicy::Clamp
    };

    let stop_words = match &settings.stop_words {
        Some(path) => {
            let words = StopWords::load_from_file(path)?;
            tracing::info!("Loaded {} stop words from {}", words.len(), path.display());
            words
        }
        None => StopWords::english(),
    };

    let mut analyzer = MessageAnalyzer::new(settings.timezone_handler)
        .with_stop_words(stop_words)
        .with_split_mode(split_mode)
        .with_span_policy(span_policy);

    if let Some(path) = &settings.lexicon {
        let scorer = LexiconScorer::load_from_file(path)?;
        tracing::info!("Loaded {} lexicon entries from {}", scorer.len(), path.display());
        analyzer = analyzer.with_scorer(scorer);
    }

    Ok(analyzer)
}
