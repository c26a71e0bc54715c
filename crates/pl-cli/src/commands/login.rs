//! Login command implementation

use anyhow::Result;

use pl_core::traits::Connector;
use pl_session::{LoginOutcome, SessionManager};

use super::report;
use crate::output::{print_info, print_success};

/// Execute the login command
pub async fn login_command<C: Connector>(manager: &SessionManager<C>) -> Result<()> {
    match manager.login().await {
        Ok(LoginOutcome::AlreadyAuthenticated) => {
            print_info("Already logged in");
            Ok(())
        }
        Ok(LoginOutcome::Paired(device_id)) => {
            tracing::info!("Paired as {}", device_id);
            print_success("Login successful");
            Ok(())
        }
        Err(e) => report(e, "Login failed"),
    }
}
