use ondemand_providers::InfraProvider;
use tracing::{error, info, warn};

pub const BIND_FAILURE_SUBJECT: &str = "EIP Association Failure";

/// Best-effort operator notifications. Nothing here can fail the caller.
#[derive(Debug, Clone, Default)]
pub struct Notifier {
    channel: Option<String>,
}

impl Notifier {
    pub fn new(channel: Option<String>) -> Self {
        Self { channel }
    }

    /// Returns whether a notification was actually delivered.
    pub async fn notify_bind_failure(
        &self,
        provider: &(impl InfraProvider + ?Sized),
        instance_id: &str,
        error_message: &str,
    ) -> bool {
        let Some(channel) = self.channel.as_deref() else {
            info!("[Notifier] No notification channel configured for notifications");
            return false;
        };
        let message = format!(
            "Failed to associate Elastic IP with instance {}. Error: {}",
            instance_id, error_message
        );
        match provider
            .publish_notification(channel, BIND_FAILURE_SUBJECT, &message)
            .await
        {
            Ok(true) => true,
            Ok(false) => {
                warn!("[Notifier] Provider does not support notifications, dropped");
                false
            }
            Err(e) => {
                error!("[Notifier] Error sending notification: {:#}", e);
                false
            }
        }
    }
}
