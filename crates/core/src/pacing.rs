use std::time::Duration;

/// What kind of utterance is being played back.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Utterance {
    Intro,
    Turn,
    Closing,
}

/// Estimated time for a spoken reply to finish playing, from its word count.
pub fn playback_estimate(text: &str, kind: Utterance) -> Duration {
    let words = text.split_whitespace().count() as f64;
    let secs = match kind {
        Utterance::Intro => (words / 2.0).max(4.0) + 2.0,
        Utterance::Turn => (words / 2.3).max(3.0) + 1.0,
        // Closing summaries run longer.
        Utterance::Closing => (words / 2.0).max(8.0) + 3.0,
    };
    Duration::from_secs_f64(secs)
}
