//! Logout command implementation

use anyhow::Result;

use pl_core::traits::Connector;
use pl_session::{LogoutOutcome, SessionManager};

use super::report;
use crate::output::{print_error, print_info, print_success, print_warning};

/// Execute the logout command
pub async fn logout_command<C: Connector>(manager: &SessionManager<C>) -> Result<()> {
    match manager.logout().await {
        Ok(LogoutOutcome::Revoked) => {
            print_success("Logged out successfully");
            Ok(())
        }
        Ok(LogoutOutcome::AlreadyExpired) => {
            print_warning("Session had already expired; local credentials removed");
            Ok(())
        }
        Ok(LogoutOutcome::RevokeFailed(e)) => {
            print_error(&format!("Error logging out: {}", e));
            print_info("Local credentials were removed anyway; run --login to pair again");
            Ok(())
        }
        Err(e) => report(e, "Error logging out"),
    }
}
