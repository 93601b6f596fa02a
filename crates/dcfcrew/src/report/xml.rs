use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;

use super::ReportError;

/// Small streaming helper over `quick_xml::Writer` for OOXML parts.
pub(crate) struct XmlBuilder {
    writer: Writer<Vec<u8>>,
}

fn start<'a>(name: &'a str, attrs: &[(&str, &str)]) -> BytesStart<'a> {
    let mut element = BytesStart::new(name);
    for attr in attrs {
        element.push_attribute(*attr);
    }
    element
}

impl XmlBuilder {
    /// Starts a standalone UTF-8 document.
    pub fn new() -> Result<Self, ReportError> {
        let mut writer = Writer::new(Vec::new());
        writer
            .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), Some("yes"))))
            .map_err(|e| ReportError::Xml(e.to_string()))?;
        Ok(Self { writer })
    }

    fn emit(&mut self, event: Event<'_>) -> Result<(), ReportError> {
        self.writer
            .write_event(event)
            .map_err(|e| ReportError::Xml(e.to_string()))
    }

    pub fn open(&mut self, name: &str, attrs: &[(&str, &str)]) -> Result<(), ReportError> {
        self.emit(Event::Start(start(name, attrs)))
    }

    pub fn close(&mut self, name: &str) -> Result<(), ReportError> {
        self.emit(Event::End(BytesEnd::new(name)))
    }

    pub fn empty(&mut self, name: &str, attrs: &[(&str, &str)]) -> Result<(), ReportError> {
        self.emit(Event::Empty(start(name, attrs)))
    }

    /// Writes `<name attrs>text</name>` with the text escaped.
    pub fn text(
        &mut self,
        name: &str,
        attrs: &[(&str, &str)],
        text: &str,
    ) -> Result<(), ReportError> {
        self.open(name, attrs)?;
        self.emit(Event::Text(BytesText::new(text)))?;
        self.close(name)
    }

    pub fn finish(self) -> Vec<u8> {
        self.writer.into_inner()
    }
}
