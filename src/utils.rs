//! Utility functions shared by the control math.

pub mod safe_cast;
