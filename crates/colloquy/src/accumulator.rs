use crate::models::event::{StreamEvent, StreamKey, TaggedEvent};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TranscriptState {
    Open,
    Complete,
    Failed,
}

/// The accumulated text for one stream key
#[derive(Debug, Clone)]
pub struct Transcript {
    pub key: StreamKey,
    pub text: String,
    pub state: TranscriptState,
    /// The terminal error message, for failed transcripts
    pub error: Option<String>,
}

impl Transcript {
    fn open(key: StreamKey) -> Self {
        Transcript {
            key,
            text: String::new(),
            state: TranscriptState::Open,
            error: None,
        }
    }
}

/// Folds a tagged event stream into per-key transcripts.
///
/// Transcripts appear in the order their first event arrived and freeze at
/// their terminal: whatever else the stream delivers for that key is
/// dropped. Only transcripts that ended with a clean `end` count as
/// completed, so later phases never consume partial output.
#[derive(Debug, Default)]
pub struct Accumulator {
    entries: Vec<Transcript>,
}

impl Accumulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, event: &TaggedEvent) {
        let index = match self.entries.iter().position(|t| t.key == event.key) {
            Some(index) => index,
            None => {
                self.entries.push(Transcript::open(event.key.clone()));
                self.entries.len() - 1
            }
        };
        let entry = &mut self.entries[index];
        if entry.state != TranscriptState::Open {
            return;
        }
        match &event.event {
            StreamEvent::Chunk { content } => entry.text.push_str(content),
            StreamEvent::End => entry.state = TranscriptState::Complete,
            StreamEvent::Error { error } => {
                entry.state = TranscriptState::Failed;
                entry.error = Some(error.clone());
            }
        }
    }

    pub fn get(&self, key: &StreamKey) -> Option<&Transcript> {
        self.entries.iter().find(|t| t.key == *key)
    }

    /// All transcripts, in order of first appearance
    pub fn transcripts(&self) -> impl Iterator<Item = &Transcript> {
        self.entries.iter()
    }

    /// Transcripts that ended cleanly, in order of first appearance
    pub fn completed(&self) -> impl Iterator<Item = &Transcript> {
        self.entries
            .iter()
            .filter(|t| t.state == TranscriptState::Complete)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
