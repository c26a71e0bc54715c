//! CLI command implementations

mod login;
mod logout;
mod send;

pub use login::login_command;
pub use logout::logout_command;
pub use send::send_command;

use anyhow::Result;

use pl_core::{ConnectError, SessionError};

use crate::output::{print_error, print_warning};

pub const USAGE: &str =
    "Usage: pairlink --login | --send --phone=<number> --message=<msg> | --logout";

/// The command selected on the command line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Login,
    Send { phone: String, message: String },
    Logout,
}

impl Action {
    /// Pick the command from the selector flags.
    ///
    /// Exactly one selector must be set; anything else yields `None`.
    pub fn select(
        login: bool,
        send: bool,
        logout: bool,
        phone: Option<String>,
        message: Option<String>,
    ) -> Option<Self> {
        match (login, send, logout) {
            (true, false, false) => Some(Action::Login),
            (false, true, false) => Some(Action::Send {
                phone: phone.unwrap_or_default(),
                message: message.unwrap_or_default(),
            }),
            (false, false, true) => Some(Action::Logout),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Action::Login => "login",
            Action::Send { .. } => "send",
            Action::Logout => "logout",
        }
    }
}

/// Report a failed operation.
///
/// Fatal errors are returned so the process exits non-zero; everything
/// else is printed and the command finishes normally.
fn report(err: SessionError, context: &str) -> Result<()> {
    if err.is_fatal() {
        return Err(anyhow::Error::new(err).context(context.to_string()));
    }

    match err {
        SessionError::Connect(ConnectError::SessionExpired) => print_warning(&err.to_string()),
        SessionError::NotPaired => print_error(&err.to_string()),
        err => print_error(&format!("{}: {}", context, err)),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pl_core::{StoreError, TransportError};

    #[test]
    fn test_select_single_selector() {
        assert_eq!(Action::select(true, false, false, None, None), Some(Action::Login));
        assert_eq!(Action::select(false, false, true, None, None), Some(Action::Logout));
        assert_eq!(
            Action::select(false, true, false, Some("628".into()), Some("hi".into())),
            Some(Action::Send {
                phone: "628".to_string(),
                message: "hi".to_string()
            })
        );
    }

    #[test]
    fn test_select_missing_send_args_are_empty() {
        assert_eq!(
            Action::select(false, true, false, None, None),
            Some(Action::Send {
                phone: String::new(),
                message: String::new()
            })
        );
    }

    #[test]
    fn test_select_none_or_several() {
        assert_eq!(Action::select(false, false, false, None, None), None);
        assert_eq!(Action::select(true, false, true, None, None), None);
        assert_eq!(Action::select(true, true, true, None, None), None);
    }

    #[test]
    fn test_report_fatal_is_returned() {
        let err = SessionError::Connect(ConnectError::Transport("refused".to_string()));
        let reported = report(err, "Login failed").unwrap_err();
        assert_eq!(reported.to_string(), "Login failed");
        assert!(format!("{:#}", reported).contains("refused"));

        let err = SessionError::StorageUnavailable(StoreError::Corrupt("bad".to_string()));
        assert!(report(err, "Logout failed").is_err());
    }

    #[test]
    fn test_report_non_fatal_is_printed() {
        assert!(report(SessionError::NotPaired, "Error sending message").is_ok());
        assert!(report(
            SessionError::Transport(TransportError::Timeout),
            "Error sending message"
        )
        .is_ok());
        assert!(report(
            SessionError::Connect(ConnectError::SessionExpired),
            "Error sending message"
        )
        .is_ok());
    }
}
