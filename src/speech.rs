use std::time::Duration;

use tracing::info;

/// Result of handing a line to the speech backend. The session fires the
/// completion `latency` later and only looks at `success`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpeechJob {
    pub latency: Duration,
    pub success: bool,
}

pub trait SpeechOutput {
    fn synthesize(&mut self, text: &str) -> SpeechJob;
}

/// Stand-in for a TTS service: fixed latency, always succeeds.
#[derive(Debug, Clone)]
pub struct SimulatedSpeech {
    latency: Duration,
}

impl SimulatedSpeech {
    pub fn new(latency: Duration) -> Self {
        SimulatedSpeech { latency }
    }
}

impl SpeechOutput for SimulatedSpeech {
    fn synthesize(&mut self, text: &str) -> SpeechJob {
        info!(text, "TTS");
        SpeechJob {
            latency: self.latency,
            success: true,
        }
    }
}
