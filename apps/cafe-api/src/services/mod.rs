//! Multi-step operations that sit between handlers and repositories.

pub mod checkout;
pub mod uploads;
