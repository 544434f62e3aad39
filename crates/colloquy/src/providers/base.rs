use async_trait::async_trait;
use futures::stream::BoxStream;

use crate::errors::ProviderResult;
use crate::models::message::Message;

/// A finite sequence of response text fragments from one completion.
/// The stream ends after the last fragment; a failed fragment is the
/// last item the stream produces.
pub type FragmentStream = BoxStream<'static, ProviderResult<String>>;

/// Base trait for streaming chat providers
#[async_trait]
pub trait Provider: Send + Sync {
    /// Open a streaming completion of `messages` against `model`.
    ///
    /// `system` is a vendor-neutral system instruction; each provider maps
    /// it onto its own request shape. Separator turns in `messages` are
    /// never forwarded upstream.
    async fn stream_chat(
        &self,
        model: &str,
        messages: &[Message],
        system: Option<&str>,
    ) -> ProviderResult<FragmentStream>;
}
