use crate::config::MailerConfig;
use crate::core::{AppError, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::json;
use tracing::info;

/// Everything the confirmation email template needs
#[derive(Debug, Clone)]
pub struct ReservationConfirmation {
    pub to: String,
    pub reservation_id: String,
    pub court_name: String,
    pub starts_at_local: String,
    pub receipt_url: String,
    pub pass_url: String,
    /// Inline SVG; None means QR rendering failed and the email shows
    /// the plain pass URL instead
    pub pass_qr_svg: Option<String>,
    pub calendar_url: String,
}

/// Sends the reservation confirmation email
#[async_trait]
pub trait ConfirmationMailer: Send + Sync {
    async fn send_reservation_confirmation(
        &self,
        confirmation: &ReservationConfirmation,
    ) -> Result<()>;
}

/// Mailer backed by an HTTP mail API (JSON POST with bearer auth)
pub struct HttpMailer {
    client: Client,
    config: MailerConfig,
}

impl HttpMailer {
    pub fn new(config: MailerConfig) -> Self {
        Self {
            client: Client::new(),
            config,
        }
    }

    fn render_html(confirmation: &ReservationConfirmation) -> String {
        let qr_block = match &confirmation.pass_qr_svg {
            Some(svg) => format!("<div class=\"pass-qr\">{}</div>", svg),
            None => format!(
                "<p>Entry pass: <a href=\"{url}\">{url}</a></p>",
                url = confirmation.pass_url
            ),
        };

        format!(
            "<h1>Reservation confirmed</h1>\
             <p>{court} &mdash; {when}</p>\
             {qr}\
             <p><a href=\"{receipt}\">Receipt</a> &middot; <a href=\"{calendar}\">Add to calendar</a></p>",
            court = confirmation.court_name,
            when = confirmation.starts_at_local,
            qr = qr_block,
            receipt = confirmation.receipt_url,
            calendar = confirmation.calendar_url,
        )
    }
}

#[async_trait]
impl ConfirmationMailer for HttpMailer {
    async fn send_reservation_confirmation(
        &self,
        confirmation: &ReservationConfirmation,
    ) -> Result<()> {
        let body = json!({
            "from": self.config.from_address,
            "to": confirmation.to,
            "subject": format!("Reservation confirmed: {}", confirmation.court_name),
            "html": Self::render_html(confirmation),
        });

        let response = self
            .client
            .post(&self.config.api_url)
            .bearer_auth(&self.config.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| AppError::gateway(format!("Mail API request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(AppError::gateway(format!(
                "Mail API error - HTTP {} ({})",
                status.as_u16(),
                detail
            )));
        }

        info!(
            reservation = %confirmation.reservation_id,
            to = %confirmation.to,
            "Confirmation email sent"
        );

        Ok(())
    }
}
