//! Email Dispatch
//! Mission: Notify users of generated passwords

use anyhow::Result;
use async_trait::async_trait;
use tracing::info;

/// Outbound mail seam. Registration and password reset hand generated
/// passwords to this trait; delivery transport is a deployment
/// concern.
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send_new_password_email(
        &self,
        first_name: &str,
        password: &str,
        email: &str,
    ) -> Result<()>;
}

/// Default mailer: records the dispatch in the log without sending
/// anything. The password itself is never logged.
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send_new_password_email(
        &self,
        first_name: &str,
        _password: &str,
        email: &str,
    ) -> Result<()> {
        info!(first_name, email, "Dispatching new-password email");
        Ok(())
    }
}
