//! Send command implementation

use anyhow::Result;

use pl_core::traits::Connector;
use pl_session::SessionManager;

use super::report;
use crate::output::print_success;

/// Execute the send command
pub async fn send_command<C: Connector>(
    manager: &SessionManager<C>,
    phone: &str,
    message: &str,
) -> Result<()> {
    match manager.send_message(phone, message).await {
        Ok(receipt) => {
            tracing::info!("Delivered {} to {}", receipt.message_id, receipt.recipient);
            print_success("Message sent!");
            Ok(())
        }
        Err(e) => report(e, "Error sending message"),
    }
}
