//! services/api/src/web/notify.rs
//!
//! Fire-and-forget staff notifications for board changes.

use crate::config::Config;
use crate::web::state::AppState;
use call_desk_core::notification::Notification;
use call_desk_core::ports::OutboundEmail;
use std::sync::Arc;
use tracing::{error, info};

/// Renders `notification` into an email from the configured sender to the staff list.
pub fn compose_email(config: &Config, notification: &Notification) -> OutboundEmail {
    let rendered = notification.render(&config.app_url);
    OutboundEmail {
        from: config.mail_from.clone(),
        to: config.notify_recipients.clone(),
        subject: rendered.subject,
        html: rendered.html,
    }
}

/// Sends `notification` in the background when change notifications are enabled.
///
/// The caller never waits for the email; failures are only logged.
pub fn spawn_notification(app_state: &Arc<AppState>, notification: Notification) {
    if !app_state.config.notify_on_changes {
        return;
    }
    let Some(mailer) = app_state.mailer.clone() else {
        return;
    };
    let email = compose_email(&app_state.config, &notification);
    let kind = notification.kind().as_str();
    tokio::spawn(async move {
        match mailer.send_email(&email).await {
            Ok(id) => info!("Change notification '{}' sent: {:?}", kind, id),
            Err(e) => error!("Change notification '{}' failed: {:?}", kind, e),
        }
    });
}
