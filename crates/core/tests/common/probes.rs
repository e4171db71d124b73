//! Scripted probe behaviors that record what the runtime does with them.

use async_trait::async_trait;
use colloquy_acl::Message;
use colloquy_core::agent::AgentContext;
use colloquy_core::behavior::{Behavior, BehaviorError, Completable, Matchable};
use colloquy_core::template::MessageTemplate;
use tokio::sync::mpsc;

/// Standing behavior that forwards every matched message to a channel.
///
/// Lets a test observe, from the outside, exactly which messages reached a
/// hosted agent and in what order.
pub struct RecordingBehavior {
    template: MessageTemplate,
    forward: mpsc::Sender<Message>,
}

impl RecordingBehavior {
    /// Creates the behavior together with the receiving end of its channel.
    #[allow(dead_code)]
    pub fn new(template: MessageTemplate) -> (Self, mpsc::Receiver<Message>) {
        let (forward, received) = mpsc::channel(32);
        (Self { template, forward }, received)
    }
}

impl Matchable for RecordingBehavior {
    fn template(&self) -> &MessageTemplate {
        &self.template
    }
}

impl Completable for RecordingBehavior {
    fn is_done(&self) -> bool {
        false
    }
}

#[async_trait]
impl Behavior for RecordingBehavior {
    async fn on_message(
        &mut self,
        _ctx: &AgentContext,
        message: &Message,
    ) -> Result<(), BehaviorError> {
        self.forward
            .send(message.clone())
            .await
            .map_err(|_| BehaviorError::failed("recording channel closed"))
    }
}
