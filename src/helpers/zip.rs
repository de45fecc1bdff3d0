//! ZIP archive helper utilities for writing Excel (.xlsx) packages

use crate::error::RustyMergeError;
use std::io::Seek;
use std::io::Write;
use zip::write::SimpleFileOptions;
use zip::CompressionMethod;
use zip::DateTime;
use zip::ZipWriter;

/// Helper trait for writing package parts into a ZIP archive
pub(crate) trait ZipHelper {
    /// Writes a deflated part with a fixed timestamp so identical input yields identical bytes
    fn write_part(&mut self, name: &str, content: &[u8]) -> Result<(), RustyMergeError>;
}

impl<W: Write + Seek> ZipHelper for ZipWriter<W> {
    fn write_part(&mut self, name: &str, content: &[u8]) -> Result<(), RustyMergeError> {
        let options = SimpleFileOptions::default()
            .compression_method(CompressionMethod::Deflated)
            .last_modified_time(DateTime::default());
        self.start_file(name, options)?;
        self.write_all(content)?;
        Ok(())
    }
}
