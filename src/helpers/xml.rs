//! XML writing utilities for Office Open XML (.xlsx) package parts
//! Provides a writer wrapper that emits escaped elements into an in-memory buffer

use crate::error::RustyMergeError;
use quick_xml::events::BytesDecl;
use quick_xml::events::BytesEnd;
use quick_xml::events::BytesStart;
use quick_xml::events::BytesText;
use quick_xml::events::Event;
use quick_xml::Writer;

/// XML writer wrapper producing a standalone UTF-8 document
pub(crate) struct XmlWriter {
    writer: Writer<Vec<u8>>,
}

impl XmlWriter {
    /// Creates a new writer and emits the XML declaration
    pub(crate) fn new() -> Result<XmlWriter, RustyMergeError> {
        let mut writer = Writer::new(Vec::with_capacity(4096));
        writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), Some("yes"))))?;
        Ok(XmlWriter { writer })
    }

    /// Opens an element with the given attributes
    pub(crate) fn start(&mut self, name: &str, attributes: &[(&str, &str)]) -> Result<(), RustyMergeError> {
        let element = BytesStart::new(name).with_attributes(attributes.iter().copied());
        self.writer.write_event(Event::Start(element))?;
        Ok(())
    }

    /// Closes an element
    pub(crate) fn end(&mut self, name: &str) -> Result<(), RustyMergeError> {
        self.writer.write_event(Event::End(BytesEnd::new(name)))?;
        Ok(())
    }

    /// Writes an element without content
    pub(crate) fn empty(&mut self, name: &str, attributes: &[(&str, &str)]) -> Result<(), RustyMergeError> {
        let element = BytesStart::new(name).with_attributes(attributes.iter().copied());
        self.writer.write_event(Event::Empty(element))?;
        Ok(())
    }

    /// Writes escaped text, dropping control characters XML 1.0 cannot carry
    pub(crate) fn text(&mut self, text: &str) -> Result<(), RustyMergeError> {
        let text: String = text
            .chars()
            .filter(|character| matches!(character, '\t' | '\n' | '\r') || !character.is_control())
            .collect();
        self.writer.write_event(Event::Text(BytesText::new(&text)))?;
        Ok(())
    }

    /// Writes an element holding only text
    pub(crate) fn element(&mut self, name: &str, attributes: &[(&str, &str)], text: &str) -> Result<(), RustyMergeError> {
        self.start(name, attributes)?;
        self.text(text)?;
        self.end(name)
    }

    /// Returns the written document
    pub(crate) fn into_bytes(self) -> Vec<u8> {
        self.writer.into_inner()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn writes_escaped_elements() {
        let mut writer = XmlWriter::new().unwrap();
        writer.start("row", &[("r", "1")]).unwrap();
        writer.element("t", &[], "a < b & \u{1}c").unwrap();
        writer.empty("c", &[("r", "B1")]).unwrap();
        writer.end("row").unwrap();
        let xml = String::from_utf8(writer.into_bytes()).unwrap();
        assert!(xml.starts_with("<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>"));
        assert!(xml.ends_with("<row r=\"1\"><t>a &lt; b &amp; c</t><c r=\"B1\"/></row>"));
    }
}
