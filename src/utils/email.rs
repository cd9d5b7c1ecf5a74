use lettre::message::{MultiPart, SinglePart, header};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Message, SmtpTransport, Transport};
use tracing::{info, instrument};

use bursar_models::money::display_minor;

use crate::config::email::EmailConfig;
use crate::utils::errors::AppError;

pub struct EmailService {
    config: EmailConfig,
}

impl EmailService {
    pub fn new(config: EmailConfig) -> Self {
        Self { config }
    }

    /// Send a payment receipt once a gateway callback confirms an intent.
    /// Best-effort: the payment is already committed when this runs.
    #[instrument(skip(self))]
    pub async fn send_payment_receipt(
        &self,
        to_email: &str,
        reference: &str,
        amount_minor: i64,
        gateway_txn_id: &str,
    ) -> Result<(), AppError> {
        let amount = display_minor(amount_minor);
        let html_body = self.receipt_template(reference, &amount, gateway_txn_id);
        let text_body = format!(
            "Payment received.\n\n\
             Reference: {}\n\
             Amount: {}\n\
             Gateway transaction: {}\n\n\
             This receipt was generated automatically by the bursar's office.\n\
             Keep it for your records.",
            reference, amount, gateway_txn_id
        );

        self.send_email(to_email, "Fee Payment Receipt", &text_body, &html_body)
            .await
    }

    async fn send_email(
        &self,
        to_email: &str,
        subject: &str,
        text_body: &str,
        html_body: &str,
    ) -> Result<(), AppError> {
        if !self.config.enabled {
            info!(to = %to_email, subject = %subject, "SMTP disabled, skipping email");
            return Ok(());
        }

        let from = format!("{} <{}>", self.config.from_name, self.config.from_email);

        let email = Message::builder()
            .from(
                from.parse()
                    .map_err(|e| AppError::internal(anyhow::anyhow!("Invalid from email: {}", e)))?,
            )
            .to(to_email
                .parse()
                .map_err(|e| AppError::internal(anyhow::anyhow!("Invalid to email: {}", e)))?)
            .subject(subject)
            .multipart(
                MultiPart::alternative()
                    .singlepart(
                        SinglePart::builder()
                            .header(header::ContentType::TEXT_PLAIN)
                            .body(text_body.to_string()),
                    )
                    .singlepart(
                        SinglePart::builder()
                            .header(header::ContentType::TEXT_HTML)
                            .body(html_body.to_string()),
                    ),
            )
            .map_err(|e| AppError::internal(anyhow::anyhow!("Failed to build email: {}", e)))?;

        let mailer = SmtpTransport::relay(&self.config.smtp_host)
            .map_err(|e| AppError::internal(anyhow::anyhow!("SMTP relay error: {}", e)))?
            .port(self.config.smtp_port)
            .credentials(Credentials::new(
                self.config.smtp_username.clone(),
                self.config.smtp_password.clone(),
            ))
            .build();

        mailer
            .send(&email)
            .map_err(|e| AppError::internal(anyhow::anyhow!("Failed to send email: {}", e)))?;

        Ok(())
    }

    fn receipt_template(&self, reference: &str, amount: &str, gateway_txn_id: &str) -> String {
        format!(
            r#"<html>
<body style="font-family: sans-serif; color: #333;">
  <h2>Fee Payment Receipt</h2>
  <p>Your payment has been received and applied to your fee account.</p>
  <table cellpadding="6">
    <tr><td><b>Reference</b></td><td>{}</td></tr>
    <tr><td><b>Amount</b></td><td>{}</td></tr>
    <tr><td><b>Gateway transaction</b></td><td>{}</td></tr>
  </table>
  <p>This receipt was generated automatically by the bursar's office.</p>
</body>
</html>"#,
            reference, amount, gateway_txn_id
        )
    }
}
