use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use futures::stream;

use super::base::{FragmentStream, Provider};
use crate::errors::{ProviderError, ProviderResult};
use crate::models::message::Message;

/// One scripted `stream_chat` outcome: either a sequence of fragment
/// results or an up-front failure.
pub type ScriptedCall = ProviderResult<Vec<ProviderResult<String>>>;

/// A call the mock has served, captured for assertions
#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub model: String,
    pub messages: Vec<Message>,
    pub system: Option<String>,
}

/// Scripted provider for orchestration tests. Calls consume script entries
/// in order; once the script is exhausted the mock streams nothing.
/// Clones share the same script and call log.
#[derive(Clone, Default)]
pub struct MockProvider {
    script: Arc<Mutex<Vec<ScriptedCall>>>,
    calls: Arc<Mutex<Vec<RecordedCall>>>,
}

impl MockProvider {
    pub fn new(script: Vec<ScriptedCall>) -> Self {
        MockProvider {
            script: Arc::new(Mutex::new(script)),
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// A call that streams the given pieces then ends cleanly
    pub fn fragments(pieces: &[&str]) -> ScriptedCall {
        Ok(pieces.iter().map(|piece| Ok(piece.to_string())).collect())
    }

    /// A call that streams the given pieces then fails
    pub fn failing(pieces: &[&str], error: ProviderError) -> ScriptedCall {
        let mut items: Vec<ProviderResult<String>> =
            pieces.iter().map(|piece| Ok(piece.to_string())).collect();
        items.push(Err(error));
        Ok(items)
    }

    /// A call that fails before producing any stream
    pub fn refused(error: ProviderError) -> ScriptedCall {
        Err(error)
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl Provider for MockProvider {
    async fn stream_chat(
        &self,
        model: &str,
        messages: &[Message],
        system: Option<&str>,
    ) -> ProviderResult<FragmentStream> {
        self.calls.lock().unwrap().push(RecordedCall {
            model: model.to_string(),
            messages: messages.to_vec(),
            system: system.map(str::to_string),
        });
        let mut script = self.script.lock().unwrap();
        if script.is_empty() {
            Ok(Box::pin(stream::empty()))
        } else {
            let items = script.remove(0)?;
            Ok(Box::pin(stream::iter(items)))
        }
    }
}
