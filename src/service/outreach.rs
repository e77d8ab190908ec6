//! Outreach service
//!
//! Contact form messages and newsletter subscriptions. Both public entry
//! points are gated on bot verification like comments are.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;

use super::retry::with_deadline;
use super::validate;
use crate::data::{ContactMessage, Database, EntityId, Subscriber};
use crate::error::AppError;
use crate::verification::{BotVerifier, require_human};

const MAX_SUBJECT_CHARS: usize = 200;
const MAX_MESSAGE_CHARS: usize = 5000;

/// Contact form fields
#[derive(Debug, Clone, Default)]
pub struct ContactInput {
    pub name: String,
    pub email: String,
    pub subject: String,
    pub message: String,
}

/// Subscription form fields
#[derive(Debug, Clone, Default)]
pub struct SubscriptionInput {
    pub email: String,
    pub name: Option<String>,
}

/// Outreach service
pub struct OutreachService {
    db: Arc<Database>,
    verifier: Arc<dyn BotVerifier>,
    store_timeout: Duration,
    verify_timeout: Duration,
}

impl OutreachService {
    /// Create new outreach service
    pub fn new(
        db: Arc<Database>,
        verifier: Arc<dyn BotVerifier>,
        store_timeout: Duration,
        verify_timeout: Duration,
    ) -> Self {
        Self {
            db,
            verifier,
            store_timeout,
            verify_timeout,
        }
    }

    // =========================================================================
    // Contact messages
    // =========================================================================

    /// Store a contact form message
    pub async fn submit_contact(
        &self,
        input: ContactInput,
        bot_token: &str,
    ) -> Result<ContactMessage, AppError> {
        let name = validate::required("Name", &input.name)?;
        validate::max_chars("Name", &name, validate::MAX_NAME_CHARS)?;
        let email = validate::email(&input.email)?;
        let subject = validate::required("Subject", &input.subject)?;
        validate::max_chars("Subject", &subject, MAX_SUBJECT_CHARS)?;
        let message = validate::required("Message", &input.message)?;
        validate::max_chars("Message", &message, MAX_MESSAGE_CHARS)?;

        require_human(self.verifier.as_ref(), bot_token, self.verify_timeout).await?;

        let now = Utc::now();
        let contact = ContactMessage {
            id: EntityId::new().0,
            name,
            email,
            subject,
            message,
            is_read: false,
            created_at: now,
            updated_at: now,
        };
        self.store("insert_contact_message", self.db.insert_contact_message(&contact))
            .await?;

        tracing::info!(message_id = %contact.id, "Contact message received");
        Ok(contact)
    }

    /// Contact messages, newest first
    pub async fn list_messages(&self) -> Result<Vec<ContactMessage>, AppError> {
        self.store("list_contact_messages", self.db.list_contact_messages())
            .await
    }

    /// Mark a message read or unread
    pub async fn set_message_read(
        &self,
        id: &str,
        is_read: bool,
    ) -> Result<ContactMessage, AppError> {
        self.store(
            "set_contact_message_read",
            self.db.set_contact_message_read(id, is_read),
        )
        .await?
        .ok_or(AppError::NotFound("Contact message"))
    }

    /// Delete a message
    pub async fn delete_message(&self, id: &str) -> Result<(), AppError> {
        if !self
            .store("delete_contact_message", self.db.delete_contact_message(id))
            .await?
        {
            return Err(AppError::NotFound("Contact message"));
        }
        Ok(())
    }

    // =========================================================================
    // Subscribers
    // =========================================================================

    /// Subscribe an email address
    ///
    /// A previously unsubscribed address is reactivated.
    ///
    /// # Errors
    /// `Conflict` if the address is already an active subscriber
    pub async fn subscribe(
        &self,
        input: SubscriptionInput,
        bot_token: &str,
    ) -> Result<Subscriber, AppError> {
        let email = validate::email(&input.email)?.to_lowercase();
        let name = match input.name.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(name) => {
                validate::max_chars("Name", name, validate::MAX_NAME_CHARS)?;
                Some(name.to_string())
            }
        };

        require_human(self.verifier.as_ref(), bot_token, self.verify_timeout).await?;

        let existing = self
            .store(
                "get_subscriber_by_email",
                self.db.get_subscriber_by_email(&email),
            )
            .await?;

        match existing {
            Some(subscriber) if subscriber.is_active => Err(AppError::Conflict(
                "This email is already subscribed".to_string(),
            )),
            Some(subscriber) => {
                let reactivated = self
                    .store(
                        "set_subscriber_active",
                        self.db
                            .set_subscriber_active(&subscriber.id, true, name.as_deref()),
                    )
                    .await?
                    .ok_or(AppError::NotFound("Subscriber"))?;
                tracing::info!(subscriber_id = %reactivated.id, "Subscriber reactivated");
                Ok(reactivated)
            }
            None => {
                let now = Utc::now();
                let subscriber = Subscriber {
                    id: EntityId::new().0,
                    email,
                    name,
                    is_active: true,
                    created_at: now,
                    updated_at: now,
                };
                self.store("insert_subscriber", self.db.insert_subscriber(&subscriber))
                    .await?;
                tracing::info!(subscriber_id = %subscriber.id, "New subscriber");
                Ok(subscriber)
            }
        }
    }

    /// Subscribers, newest first
    pub async fn list_subscribers(&self) -> Result<Vec<Subscriber>, AppError> {
        self.store("list_subscribers", self.db.list_subscribers())
            .await
    }

    /// Activate or deactivate a subscriber
    pub async fn set_subscriber_active(
        &self,
        id: &str,
        is_active: bool,
    ) -> Result<Subscriber, AppError> {
        self.store(
            "set_subscriber_active",
            self.db.set_subscriber_active(id, is_active, None),
        )
        .await?
        .ok_or(AppError::NotFound("Subscriber"))
    }

    /// Delete a subscriber
    pub async fn delete_subscriber(&self, id: &str) -> Result<(), AppError> {
        if !self
            .store("delete_subscriber", self.db.delete_subscriber(id))
            .await?
        {
            return Err(AppError::NotFound("Subscriber"));
        }
        Ok(())
    }

    async fn store<T>(
        &self,
        operation: &'static str,
        future: impl std::future::Future<Output = Result<T, AppError>>,
    ) -> Result<T, AppError> {
        with_deadline("content store", operation, self.store_timeout, future).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::verification::{MockBotVerifier, StaticVerifier};
    use tempfile::TempDir;

    async fn service_with(verifier: Arc<dyn BotVerifier>) -> (OutreachService, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let db = Database::connect(&temp_dir.path().join("test.db"))
            .await
            .unwrap();
        let service = OutreachService::new(
            Arc::new(db),
            verifier,
            Duration::from_secs(5),
            Duration::from_secs(5),
        );
        (service, temp_dir)
    }

    fn subscription(email: &str) -> SubscriptionInput {
        SubscriptionInput {
            email: email.to_string(),
            name: None,
        }
    }

    #[tokio::test]
    async fn contact_message_lifecycle() {
        let (service, _temp_dir) = service_with(Arc::new(StaticVerifier)).await;

        let message = service
            .submit_contact(
                ContactInput {
                    name: "Ana".to_string(),
                    email: "ana@example.com".to_string(),
                    subject: "Hello".to_string(),
                    message: "Loved the last poem".to_string(),
                },
                "token",
            )
            .await
            .unwrap();
        assert!(!message.is_read);

        let read = service.set_message_read(&message.id, true).await.unwrap();
        assert!(read.is_read);

        service.delete_message(&message.id).await.unwrap();
        assert!(service.list_messages().await.unwrap().is_empty());
        assert!(matches!(
            service.delete_message(&message.id).await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn contact_requires_verification() {
        let mut verifier = MockBotVerifier::new();
        verifier.expect_verify().returning(|_| Ok(false));
        let (service, _temp_dir) = service_with(Arc::new(verifier)).await;

        let result = service
            .submit_contact(
                ContactInput {
                    name: "Bot".to_string(),
                    email: "bot@example.com".to_string(),
                    subject: "Buy".to_string(),
                    message: "Cheap".to_string(),
                },
                "forged",
            )
            .await;

        assert!(matches!(result, Err(AppError::Verification(_))));
        assert!(service.list_messages().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn subscribe_reactivates_and_rejects_duplicates() {
        let (service, _temp_dir) = service_with(Arc::new(StaticVerifier)).await;

        let subscriber = service
            .subscribe(subscription("Reader@Example.com"), "token")
            .await
            .unwrap();
        assert_eq!(subscriber.email, "reader@example.com");

        assert!(matches!(
            service
                .subscribe(subscription("reader@example.com"), "token")
                .await,
            Err(AppError::Conflict(_))
        ));

        service
            .set_subscriber_active(&subscriber.id, false)
            .await
            .unwrap();
        let reactivated = service
            .subscribe(subscription("reader@example.com"), "token")
            .await
            .unwrap();
        assert_eq!(reactivated.id, subscriber.id);
        assert!(reactivated.is_active);
    }
}
