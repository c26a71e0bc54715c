//! Terminal output for the CLI
//!
//! Coloured one-line status messages, the QR code renderer used while
//! pairing, and the console handler for incoming chat messages.

use std::io::Write;

use crossterm::style::{Color, Print, ResetColor, SetForegroundColor};
use qrcode::render::unicode;
use qrcode::QrCode;

use pl_core::traits::{CodeRenderer, MessageHandler};
use pl_core::IncomingMessage;

fn print_prefixed(mut out: impl Write, color: Color, symbol: &str, msg: &str) {
    let _ = crossterm::execute!(
        out,
        SetForegroundColor(color),
        Print(symbol),
        ResetColor,
        Print(msg),
        Print("\n")
    );
}

/// Print a success message in green with a checkmark prefix
pub fn print_success(msg: &str) {
    print_prefixed(std::io::stdout(), Color::Green, "✓ ", msg);
}

/// Print an error message to stderr in red with an X prefix
pub fn print_error(msg: &str) {
    print_prefixed(std::io::stderr(), Color::Red, "✗ ", msg);
}

/// Print a warning message to stderr in yellow
pub fn print_warning(msg: &str) {
    print_prefixed(std::io::stderr(), Color::Yellow, "⚠ ", msg);
}

/// Print an informational message in cyan
pub fn print_info(msg: &str) {
    print_prefixed(std::io::stdout(), Color::Cyan, "ℹ ", msg);
}

/// Render a pairing code as a half-block QR code.
///
/// Colours are inverted so the code scans on dark terminal backgrounds.
pub fn render_qr(code: &str) -> Result<String, qrcode::types::QrError> {
    let qr = QrCode::new(code.as_bytes())?;
    Ok(qr
        .render::<unicode::Dense1x2>()
        .dark_color(unicode::Dense1x2::Light)
        .light_color(unicode::Dense1x2::Dark)
        .quiet_zone(true)
        .build())
}

/// Prints each pairing code to stdout as a QR code
#[derive(Debug, Default, Clone, Copy)]
pub struct QrRenderer;

impl CodeRenderer for QrRenderer {
    fn render(&self, code: &str) {
        print_info("Scan the QR code below:");
        match render_qr(code) {
            Ok(qr) => println!("{}", qr),
            Err(e) => {
                tracing::warn!("Cannot render pairing code as QR: {}", e);
                println!("{}", code);
            }
        }
    }
}

/// Prints chat messages that arrive while a command runs
#[derive(Debug, Default, Clone, Copy)]
pub struct ConsoleMessageHandler;

impl MessageHandler for ConsoleMessageHandler {
    fn on_message(&self, message: &IncomingMessage) {
        tracing::debug!(from = %message.from, id = %message.message_id, "Incoming message");
        print_info(&format!("Received a message! {}", message.body));
    }
}
