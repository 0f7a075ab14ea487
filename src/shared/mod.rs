//! Helpers shared by the printer, processor and config modules

pub mod json;
