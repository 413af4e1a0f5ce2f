//! Outbound reply helper handed to command handlers.

use chat_platform::{format::split_message, Localizer, Outbound, PlatformError};
use std::sync::Arc;

/// Sends localized, length-limited replies into the invoking channel.
#[derive(Clone)]
pub struct Responder {
    outbound: Arc<dyn Outbound>,
    localizer: Arc<Localizer>,
    channel_id: String,
    lang: String,
    max_message_len: usize,
}

impl Responder {
    pub(crate) fn new(
        outbound: Arc<dyn Outbound>,
        localizer: Arc<Localizer>,
        channel_id: String,
        lang: String,
        max_message_len: usize,
    ) -> Self {
        Self {
            outbound,
            localizer,
            channel_id,
            lang,
            max_message_len,
        }
    }

    pub fn channel_id(&self) -> &str {
        &self.channel_id
    }

    /// Send raw text, chunked over the platform length limit.
    pub async fn say(&self, text: &str) -> Result<(), PlatformError> {
        for chunk in split_message(text, self.max_message_len) {
            self.outbound.send(&self.channel_id, chunk).await?;
        }
        Ok(())
    }

    /// Render a catalog key with tags and send it.
    pub async fn notice(&self, key: &str, tags: &[(&str, String)]) -> Result<(), PlatformError> {
        let text = self.localizer.render(&self.lang, key, tags);
        self.say(&text).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chat_platform::RecordingOutbound;

    #[tokio::test]
    async fn test_say_chunks_long_output() {
        let outbound = RecordingOutbound::new();
        let responder = Responder::new(
            outbound.clone(),
            Arc::new(Localizer::with_defaults()),
            "c1".into(),
            "en".into(),
            8,
        );

        responder.say("0123456789abcdef").await.unwrap();
        let sent = outbound.sent().await;
        assert_eq!(sent.len(), 2);
        assert_eq!(sent[0].1, "01234567");
        assert_eq!(sent[1].1, "89abcdef");
    }

    #[tokio::test]
    async fn test_notice_renders_catalog_key() {
        let outbound = RecordingOutbound::new();
        let responder = Responder::new(
            outbound.clone(),
            Arc::new(Localizer::with_defaults()),
            "c1".into(),
            "en".into(),
            2000,
        );

        responder
            .notice(
                "gate.cooldown",
                &[("command", "ping".into()), ("remaining", "4".into())],
            )
            .await
            .unwrap();

        let sent = outbound.sent().await;
        assert_eq!(sent[0].1, "You can use ping again in 4 second(s).");
    }
}
