//! # ZaTix Core
//!
//! Pure domain logic for the crew ticket-validation pipeline: the canonical
//! ticket-code type with its normalization strategies, and the scan-gate
//! state machine that debounces camera input.
//!
//! This crate performs no I/O. The HTTP client lives in `zatix-client`; the
//! offline queue, history store and service facade live in
//! `zatix-validation`.

pub mod scan_gate;
pub mod ticket;

pub use scan_gate::{DEFAULT_COOLDOWN, ScanGate};
pub use ticket::{FormatError, TicketCode};
