use std::io::BufRead;

use odata_common::{ODataError, ODataResult, ServiceVersion};
use quick_xml::events::Event;
use quick_xml::Reader;
use tracing::debug;

use super::*;
use crate::element::{next_subtree, xml_err, Cut, TreeBuilder};
use crate::resource::{WireEntry, WireFeed};

/// Reads the entries of an Atom feed one at a time.
///
/// Only the entry currently being read is held in memory. Feed-level data
/// that precedes the entries (base, context, count) is available as soon as
/// the stream is opened; data that follows them (the next link) once the
/// stream is exhausted.
pub struct AtomEntryStream<R: BufRead> {
    reader: Reader<R>,
    builder: TreeBuilder,
    buf: Vec<u8>,
    de: AtomDeserializer,
    header: WireFeed,
    done: bool,
}

impl<R: BufRead> AtomEntryStream<R> {
    pub(crate) fn open(input: R, version: ServiceVersion) -> ODataResult<Self> {
        let mut reader = Reader::from_reader(input);
        let mut builder = TreeBuilder::default();
        let mut buf = Vec::new();
        let de = AtomDeserializer::new(version);

        let done = loop {
            buf.clear();
            match reader.read_event_into(&mut buf).map_err(xml_err)? {
                Event::Start(e) => {
                    builder.open(&e)?;
                    break false;
                }
                Event::Empty(e) => {
                    builder.open(&e)?;
                    break true;
                }
                Event::Eof => {
                    return Err(ODataError::MalformedPayload("empty Atom document".to_string()))
                }
                _ => {}
            }
        };

        let header = match builder.root() {
            Some(root) if root.name == FEED => de.feed_header(root),
            Some(root) => {
                return Err(ODataError::MalformedPayload(format!(
                    "expected Atom feed but found '{}'",
                    root.name
                )))
            }
            None => return Err(ODataError::MalformedPayload("missing feed".to_string())),
        };
        debug!(base = ?header.base, "Opened Atom entry stream");

        Ok(Self {
            reader,
            builder,
            buf,
            de,
            header,
            done,
        })
    }

    /// The feed without its entries, as far as it has been read.
    pub fn header(&self) -> &WireFeed {
        &self.header
    }

    pub fn next_entry(&mut self) -> ODataResult<Option<WireEntry>> {
        if self.done {
            return Ok(None);
        }

        let cut = next_subtree(&mut self.reader, &mut self.builder, &mut self.buf, 1, |e| {
            e.name == ENTRY
        })?;
        match cut {
            Cut::Kept(entry) => {
                if self.header.count.is_none() {
                    if let Some(root) = self.builder.root() {
                        self.header.count = self.de.feed_header(root).count;
                    }
                }
                self.de.entry_from(&entry).map(Some)
            }
            Cut::Root(root) => {
                self.done = true;
                let trailer = self.de.feed_header(&root);
                self.header.count = self.header.count.or(trailer.count);
                self.header.next = trailer.next;
                Ok(None)
            }
            Cut::Eof => {
                self.done = true;
                Err(ODataError::MalformedPayload(
                    "Atom feed ended before it was closed".to_string(),
                ))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FEED_XML: &str = r##"<feed xmlns="http://www.w3.org/2005/Atom"
      xmlns:m="http://docs.oasis-open.org/odata/ns/metadata"
      xml:base="http://h/svc/">
  <m:count>2</m:count>
  <entry><category term="#NS.A" scheme="http://docs.oasis-open.org/odata/ns/scheme"/></entry>
  <entry><category term="#NS.B" scheme="http://docs.oasis-open.org/odata/ns/scheme"/></entry>
  <link rel="next" href="./p2"/>
</feed>"##;

    #[test]
    fn test_streams_entries_in_order() {
        let mut stream = AtomEntryStream::open(FEED_XML.as_bytes(), ServiceVersion::V4).unwrap();
        assert_eq!(stream.header().base.as_deref(), Some("http://h/svc/"));

        let first = stream.next_entry().unwrap().unwrap();
        assert_eq!(first.type_name.as_deref(), Some("NS.A"));
        assert_eq!(stream.header().count, Some(2));
        let second = stream.next_entry().unwrap().unwrap();
        assert_eq!(second.type_name.as_deref(), Some("NS.B"));
        assert!(stream.next_entry().unwrap().is_none());
        assert_eq!(stream.header().next.as_deref(), Some("./p2"));
        assert!(stream.next_entry().unwrap().is_none());
    }

    #[test]
    fn test_empty_feed_element() {
        let xml = r#"<feed xmlns="http://www.w3.org/2005/Atom"/>"#;
        let mut stream = AtomEntryStream::open(xml.as_bytes(), ServiceVersion::V3).unwrap();
        assert!(stream.next_entry().unwrap().is_none());
    }

    #[test]
    fn test_truncated_feed() {
        let xml = r#"<feed xmlns="http://www.w3.org/2005/Atom"><entry>"#;
        let mut stream = AtomEntryStream::open(xml.as_bytes(), ServiceVersion::V3).unwrap();
        assert!(stream.next_entry().is_err());
    }
}
