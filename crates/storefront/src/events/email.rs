//! Email notification subscriber.
//!
//! Sends a plain-text order confirmation to the customer over SMTP via
//! lettre. Only registered when SMTP settings are configured.

use async_trait::async_trait;
use lettre::{
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
    message::header::ContentType,
    transport::smtp::{Error as SmtpError, authentication::Credentials},
};
use secrecy::ExposeSecret;

use crate::config::SmtpConfig;
use crate::events::{OrderCreated, OrderSubscriber, SubscriberError};

/// Sends an order confirmation email to the customer.
#[derive(Clone)]
pub struct EmailSubscriber {
    mailer: AsyncSmtpTransport<Tokio1Executor>,
    from_address: String,
}

impl EmailSubscriber {
    /// Build the SMTP transport from configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the relay hostname is rejected.
    pub fn new(config: &SmtpConfig) -> Result<Self, SmtpError> {
        let mut builder =
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)?.port(config.port);

        if let (Some(username), Some(password)) = (&config.username, &config.password) {
            builder = builder.credentials(Credentials::new(
                username.clone(),
                password.expose_secret().to_owned(),
            ));
        }

        Ok(Self {
            mailer: builder.build(),
            from_address: config.from.clone(),
        })
    }

    fn confirmation_body(event: &OrderCreated) -> String {
        format!(
            "Thank you for your order!\n\n\
             Order number: {}\n\
             Items: {}\n\
             Total: {}\n\n\
             We'll let you know as soon as it ships.\n",
            event.order_id, event.line_count, event.total,
        )
    }
}

#[async_trait]
impl OrderSubscriber for EmailSubscriber {
    fn name(&self) -> &'static str {
        "email"
    }

    async fn order_created(&self, event: &OrderCreated) -> Result<(), SubscriberError> {
        let message = Message::builder()
            .from(self.from_address.parse()?)
            .to(event.customer_email.as_str().parse()?)
            .subject(format!("Order confirmation #{}", event.order_id))
            .header(ContentType::TEXT_PLAIN)
            .body(Self::confirmation_body(event))?;

        self.mailer.send(message).await?;

        tracing::info!(order_id = %event.order_id, "confirmation email sent");
        Ok(())
    }
}
