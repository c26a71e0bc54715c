//! pl-cli: Command-line interface for pairlink
//!
//! Provides the `pairlink` binary: `--login` pairs this machine by QR code,
//! `--send` delivers one text message and `--logout` unlinks the device.

pub mod commands;
pub mod output;
