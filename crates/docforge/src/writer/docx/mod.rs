//! DOCX writer implementation using docx-rs
//!
//! This module is organized into three components:
//! - Writer: renders the blocks of a [`crate::ir::Document`] phase by phase
//! - Styles: page geometry and named paragraph styles
//! - Image processor: loads and sizes the header logo

mod image_processor;
mod styles;
mod writer;

pub use image_processor::{EMU_PER_CM, logo_extent};
pub use writer::DocxWriter;
