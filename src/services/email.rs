use serde_json::json;

use crate::settings;

/// Fire-and-forget mail delivery through an HTTP mail API. Failures are
/// logged and never propagated to the caller.
#[derive(Clone)]
pub struct Mailer {
    client: reqwest::Client,
    settings: settings::Email,
}

impl Mailer {
    pub fn new(settings: settings::Email) -> Self {
        Mailer {
            client: reqwest::Client::new(),
            settings,
        }
    }

    pub fn send_welcome(&self, email: &str, full_name: &str) {
        self.send(
            email,
            "Welcome to fintrack",
            format!(
                "Hi {},\n\nYour fintrack account is ready. A default wallet and \
                 starter categories have been set up for you.",
                full_name
            ),
        );
    }

    fn send(&self, to: &str, subject: &str, text: String) {
        if !self.settings.enabled {
            log::debug!("Mailer disabled, skipping '{}' to {}", subject, to);
            return;
        }

        let client = self.client.clone();
        let settings = self.settings.clone();
        let to = to.to_string();
        let subject = subject.to_string();

        tokio::spawn(async move {
            let result = client
                .post(&settings.url)
                .bearer_auth(&settings.api_key)
                .json(&json!({
                    "from": settings.sender,
                    "to": to,
                    "subject": subject,
                    "text": text,
                }))
                .send()
                .await;

            match result {
                Ok(response) if response.status().is_success() => {
                    log::info!("Sent '{}' to {}", subject, to);
                }
                Ok(response) => {
                    log::warn!(
                        "Mail API rejected '{}' to {}: {}",
                        subject,
                        to,
                        response.status()
                    );
                }
                Err(e) => log::warn!("Could not send '{}' to {}: {}", subject, to, e),
            }
        });
    }
}
