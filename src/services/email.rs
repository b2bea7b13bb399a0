//! Email delivery
//!
//! Outbound mail goes through a transactional email HTTP API; the trait
//! seam keeps checkout testable without a network and lets deployments
//! swap providers behind a config change.

use async_trait::async_trait;
use serde::Serialize;

/// Sends a single HTML email. Implementations must be cheap to share.
#[async_trait]
pub trait EmailSender: Send + Sync {
    async fn send(&self, to: &str, subject: &str, html_body: &str) -> anyhow::Result<()>;
}

/// Delivery via a transactional email provider's HTTP API
pub struct HttpEmailService {
    client: reqwest::Client,
    api_url: String,
    api_key: String,
    sender_name: String,
    sender_email: String,
}

#[derive(Serialize)]
struct OutboundMessage<'a> {
    sender_name: &'a str,
    sender_email: &'a str,
    to: &'a str,
    subject: &'a str,
    html: &'a str,
}

impl HttpEmailService {
    pub fn new(
        api_url: String,
        api_key: String,
        sender_name: String,
        sender_email: String,
    ) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_url,
            api_key,
            sender_name,
            sender_email,
        }
    }
}

#[async_trait]
impl EmailSender for HttpEmailService {
    async fn send(&self, to: &str, subject: &str, html_body: &str) -> anyhow::Result<()> {
        let payload = OutboundMessage {
            sender_name: &self.sender_name,
            sender_email: &self.sender_email,
            to,
            subject,
            html: html_body,
        };
        let response = self
            .client
            .post(&self.api_url)
            .bearer_auth(&self.api_key)
            .json(&payload)
            .send()
            .await?;
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("email provider returned {status}: {body}");
        }
        tracing::debug!(to, subject, "Email dispatched");
        Ok(())
    }
}

/// Logs instead of sending; used in development and tests
pub struct NoopEmailService;

#[async_trait]
impl EmailSender for NoopEmailService {
    async fn send(&self, to: &str, subject: &str, _html_body: &str) -> anyhow::Result<()> {
        tracing::info!(to, subject, "Email suppressed (noop sender)");
        Ok(())
    }
}

/// Minimal HTML entity escaping for values interpolated into email bodies
fn escape_html(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            other => escaped.push(other),
        }
    }
    escaped
}

/// Build the order confirmation message; returns `(subject, html_body)`.
///
/// The confirmation link carries the single-use token and stays valid for
/// 24 hours from checkout. The customer name is client-supplied and must
/// be escaped before it lands in markup.
pub fn order_confirmation_message(
    order_number: &str,
    customer_name: &str,
    total_amount: f64,
    confirmation_link: &str,
) -> (String, String) {
    let subject = format!("Confirme seu pedido #{order_number}");
    let customer_name = escape_html(customer_name);
    let body = format!(
        "<html><body style=\"font-family: Arial, sans-serif; color: #333;\">\
         <h2>Olá, {customer_name}!</h2>\
         <p>Recebemos seu pedido <strong>#{order_number}</strong> no valor total de \
         <strong>R$ {total_amount:.2}</strong>.</p>\
         <p>Para confirmar o pagamento e concluir a compra, clique no botão abaixo:</p>\
         <p><a href=\"{confirmation_link}\" \
         style=\"background-color: #28a745; color: #fff; padding: 12px 24px; \
         text-decoration: none; border-radius: 4px; display: inline-block;\">\
         Confirmar Pagamento</a></p>\
         <p>Este link é válido por <strong>24 horas</strong> e pode ser usado uma única vez.</p>\
         <p>Se você não realizou esta compra, ignore este email.</p>\
         </body></html>"
    );
    (subject, body)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn confirmation_message_carries_order_and_link() {
        let (subject, body) = order_confirmation_message(
            "PED-2025-000042",
            "João",
            149.9,
            "https://loja.example.com/confirm?token=abc123",
        );
        assert_eq!(subject, "Confirme seu pedido #PED-2025-000042");
        assert!(body.contains("João"));
        assert!(body.contains("R$ 149.90"));
        assert!(body.contains("https://loja.example.com/confirm?token=abc123"));
        assert!(body.contains("24 horas"));
    }

    #[test]
    fn customer_name_is_escaped_in_the_body() {
        let (_, body) = order_confirmation_message(
            "PED-2025-000001",
            "<img src=x onerror=alert(1)>",
            10.0,
            "https://loja.example.com/confirm?token=abc",
        );
        assert!(!body.contains("<img"));
        assert!(body.contains("&lt;img src=x onerror=alert(1)&gt;"));
    }
}
