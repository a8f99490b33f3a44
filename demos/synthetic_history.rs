//! Build six weekly assessment sessions with a gradual decline and print the report
//!
//! Run with: cargo run --example synthetic_history

use cogflux::schema::{
    AssessmentSession, LanguageMetrics, MemoryMetrics, PatternMetrics, PatternRound,
    RawSessionMetrics, ReactionMetrics, ReactionTrial,
};
use cogflux::CognitiveProcessor;
use std::error::Error;

const WEEK_MS: i64 = 7 * 86_400_000;
const START_MS: i64 = 1_717_200_000_000;

const WORDS: [&str; 10] = [
    "apple", "river", "candle", "garden", "pencil", "window", "basket", "mirror", "ladder",
    "cloud",
];

fn session(week: usize) -> AssessmentSession {
    let decline = week as f64;

    let reaction = ReactionMetrics {
        trials: (0..10)
            .map(|i| ReactionTrial::new(310.0 + decline * 28.0 + (i % 3) as f64 * 6.0))
            .collect(),
    };

    let recalled = WORDS.len().saturating_sub(1 + week);
    let memory = MemoryMetrics {
        presented_words: WORDS.iter().map(|w| w.to_string()).collect(),
        recalled_words: WORDS[..recalled].iter().map(|w| w.to_string()).collect(),
        response_latency_ms: 9_000.0 + decline * 800.0,
        interference_score: None,
    };

    let levels = 7u32.saturating_sub(week as u32).max(2);
    let rounds = (1..=levels)
        .map(|level| {
            let target: Vec<u32> = (0..level + 2).map(|k| (k * 5 + level) % 16).collect();
            let correct = level < levels;
            let mut user_input = target.clone();
            if !correct {
                user_input.reverse();
            }
            PatternRound {
                level,
                grid_size: 4,
                response_latencies_ms: vec![450.0 + decline * 40.0; target.len()],
                target_sequence: target,
                user_input,
                correct,
                completion_time_ms: None,
            }
        })
        .collect();

    let word_count = 72usize.saturating_sub(week * 8);
    let transcript = vec!["today", "I", "walked", "um", "to", "the", "market"]
        .into_iter()
        .cycle()
        .take(word_count)
        .collect::<Vec<_>>()
        .join(" ");
    let language = LanguageMetrics {
        transcript,
        duration_sec: 30.0,
        pause_count: Some(2 + week as u32),
        total_pause_ms: Some(1_500.0 + decline * 400.0),
    };

    AssessmentSession::new(START_MS + week as i64 * WEEK_MS)
        .with_session_id(format!("week-{}", week + 1))
        .with_task(RawSessionMetrics::Reaction(reaction))
        .with_task(RawSessionMetrics::Memory(memory))
        .with_task(RawSessionMetrics::Pattern(PatternMetrics { rounds }))
        .with_task(RawSessionMetrics::Language(language))
}

fn main() -> Result<(), Box<dyn Error>> {
    let sessions: Vec<AssessmentSession> = (0..6).map(session).collect();
    let raw_json = serde_json::to_string(&sessions)?;

    let mut processor = CognitiveProcessor::new();
    let added = processor.ingest_sessions_json(&raw_json)?;
    eprintln!("ingested {} sessions", added);

    print!("{}", processor.report()?);
    println!();
    Ok(())
}
