//! Writer implementations for assembled documents

pub mod docx;

pub use self::docx::DocxWriter;
