//! XML serializer
//!
//! ```text
//! <?xml version="1.0" encoding="UTF-8"?>
//! <web_data>
//!   <page>
//!     <url>..</url>
//!     <depth>..</depth>
//!     <title>..</title>
//!     <content>..</content>
//!     <links>
//!       <link>..</link>
//!     </links>
//!   </page>
//! </web_data>
//! ```

use crate::output::traits::{ExportError, ExportFormat, ExportResult, RecordSerializer};
use crate::record::PageRecord;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use std::io::Write;

#[derive(Debug, Clone, Copy, Default)]
pub struct XmlSerializer;

impl RecordSerializer for XmlSerializer {
    fn format(&self) -> ExportFormat {
        ExportFormat::Xml
    }

    fn serialize(&self, records: &[PageRecord]) -> ExportResult<String> {
        let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);

        writer
            .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))
            .map_err(xml_error)?;
        start(&mut writer, "web_data")?;

        for record in records {
            start(&mut writer, "page")?;
            text_element(&mut writer, "url", &record.url)?;
            text_element(&mut writer, "depth", &record.depth.to_string())?;
            text_element(&mut writer, "title", &record.title)?;
            text_element(&mut writer, "content", &record.content)?;

            start(&mut writer, "links")?;
            for link in &record.links {
                text_element(&mut writer, "link", link)?;
            }
            end(&mut writer, "links")?;

            end(&mut writer, "page")?;
        }

        end(&mut writer, "web_data")?;

        let mut bytes = writer.into_inner();
        bytes.push(b'\n');
        String::from_utf8(bytes).map_err(|e| ExportError::Encoding(e.to_string()))
    }
}

fn start<W: Write>(writer: &mut Writer<W>, name: &str) -> ExportResult<()> {
    writer
        .write_event(Event::Start(BytesStart::new(name)))
        .map_err(xml_error)
}

fn end<W: Write>(writer: &mut Writer<W>, name: &str) -> ExportResult<()> {
    writer
        .write_event(Event::End(BytesEnd::new(name)))
        .map_err(xml_error)
}

/// Writes `<name>text</name>`; the text event is always emitted so empty
/// values stay on one line
fn text_element<W: Write>(writer: &mut Writer<W>, name: &str, text: &str) -> ExportResult<()> {
    let text = sanitize_xml_text(text);
    start(writer, name)?;
    writer
        .write_event(Event::Text(BytesText::new(&text)))
        .map_err(xml_error)?;
    end(writer, name)
}

/// Drops characters XML 1.0 cannot carry (control characters other than tab, LF, CR)
fn sanitize_xml_text(text: &str) -> String {
    text.chars()
        .filter(|c| !c.is_control() || matches!(c, '\t' | '\n' | '\r'))
        .collect()
}

fn xml_error<E: std::fmt::Display>(error: E) -> ExportError {
    ExportError::Xml(error.to_string())
}
