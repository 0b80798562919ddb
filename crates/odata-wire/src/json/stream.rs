use std::io::Read;
use std::sync::mpsc::{self, Receiver, SyncSender};
use std::thread::{self, JoinHandle};

use odata_common::{ODataError, ODataResult, ServiceVersion};
use serde::de::{self, DeserializeSeed, Deserializer as _, MapAccess, SeqAccess, Visitor};
use serde_json::{Map, Value};
use tracing::debug;

use super::*;
use crate::resource::{ResourceFamily, WireEntry, WireFeed};

/// Reads the entries of a JSON feed one at a time.
///
/// A worker thread drives `serde_json` over the input and hands over the
/// members before `value` when the stream opens, then each element of the
/// `value` array on demand, then the members after the array (the next
/// link). The channel has no buffer, so at most one entry is decoded ahead
/// of the caller. Dropping the stream stops the worker and releases the
/// input before returning.
pub struct JsonEntryStream {
    de: JsonDeserializer,
    header: WireFeed,
    events: Option<Receiver<Event>>,
    worker: Option<JoinHandle<()>>,
    done: bool,
}

/// What the worker reports, in document order.
enum Event {
    Header(Map<String, Value>),
    Entry(Map<String, Value>),
    Trailer(Map<String, Value>),
    Failed(serde_json::Error),
}

impl JsonEntryStream {
    pub(crate) fn open<R>(input: R, version: ServiceVersion) -> ODataResult<Self>
    where
        R: Read + Send + 'static,
    {
        let (sender, events) = mpsc::sync_channel(0);
        let worker = thread::Builder::new()
            .name("odata-json-stream".to_string())
            .spawn(move || read_feed(input, sender))?;

        let mut stream = Self {
            de: JsonDeserializer::new(version),
            header: WireFeed::empty(ResourceFamily::Json),
            events: Some(events),
            worker: Some(worker),
            done: false,
        };
        match stream.recv()? {
            Event::Header(head) => stream.header = stream.de.feed_from(&head)?,
            // a document with no `value` array at all
            Event::Trailer(tail) => {
                stream.header = stream.de.feed_from(&tail)?;
                stream.done = true;
            }
            Event::Failed(e) => return Err(e.into()),
            Event::Entry(_) => {
                return Err(ODataError::MalformedPayload(
                    "feed entry arrived before the feed header".to_string(),
                ))
            }
        }
        debug!(base = ?stream.header.base, "Opened JSON entry stream");
        Ok(stream)
    }

    /// The feed without its entries, as far as it has been read.
    pub fn header(&self) -> &WireFeed {
        &self.header
    }

    pub fn next_entry(&mut self) -> ODataResult<Option<WireEntry>> {
        if self.done {
            return Ok(None);
        }
        match self.recv() {
            Ok(Event::Entry(object)) => self.de.entry_from(&object).map(Some),
            Ok(Event::Trailer(tail)) => {
                self.done = true;
                let trailer = self.de.feed_from(&tail)?;
                self.header.count = self.header.count.or(trailer.count);
                self.header.next = trailer.next.or(self.header.next.take());
                Ok(None)
            }
            Ok(Event::Header(_)) => {
                self.done = true;
                Err(ODataError::MalformedPayload(
                    "feed header repeated".to_string(),
                ))
            }
            Ok(Event::Failed(e)) => {
                self.done = true;
                Err(e.into())
            }
            Err(e) => {
                self.done = true;
                Err(e)
            }
        }
    }

    fn recv(&self) -> ODataResult<Event> {
        self.events
            .as_ref()
            .and_then(|events| events.recv().ok())
            .ok_or_else(|| {
                ODataError::MalformedPayload("JSON entry stream ended unexpectedly".to_string())
            })
    }
}

impl Drop for JsonEntryStream {
    fn drop(&mut self) {
        // The worker sees the closed channel at its next hand-over and stops.
        self.events.take();
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                debug!("JSON stream worker panicked");
            }
        }
    }
}

fn read_feed<R: Read>(input: R, events: SyncSender<Event>) {
    let mut json = serde_json::Deserializer::from_reader(input);
    let result = (&mut json)
        .deserialize_map(FeedVisitor { events: &events })
        .and_then(|()| json.end());
    if let Err(e) = result {
        // nobody is listening once the stream has been dropped
        let _ = events.send(Event::Failed(e));
    }
}

fn hand_over<E: de::Error>(events: &SyncSender<Event>, event: Event) -> Result<(), E> {
    events
        .send(event)
        .map_err(|_| E::custom("entry stream closed"))
}

/// The feed object: members before and after the `value` array are
/// collected whole, the array itself goes to [`EntriesSeed`].
struct FeedVisitor<'a> {
    events: &'a SyncSender<Event>,
}

impl<'de> Visitor<'de> for FeedVisitor<'_> {
    type Value = ();

    fn expecting(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.write_str("a JSON feed object")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<(), A::Error> {
        let mut members = Map::new();
        let mut seen_entries = false;
        while let Some(key) = map.next_key::<String>()? {
            if key == VALUE && !seen_entries {
                seen_entries = true;
                hand_over::<A::Error>(self.events, Event::Header(std::mem::take(&mut members)))?;
                map.next_value_seed(EntriesSeed {
                    events: self.events,
                })?;
            } else {
                let value = map.next_value::<Value>()?;
                members.insert(key, value);
            }
        }
        hand_over(self.events, Event::Trailer(members))
    }
}

/// The `value` array, handed over one entry object at a time.
struct EntriesSeed<'a> {
    events: &'a SyncSender<Event>,
}

impl<'de> DeserializeSeed<'de> for EntriesSeed<'_> {
    type Value = ();

    fn deserialize<D: de::Deserializer<'de>>(self, deserializer: D) -> Result<(), D::Error> {
        deserializer.deserialize_seq(self)
    }
}

impl<'de> Visitor<'de> for EntriesSeed<'_> {
    type Value = ();

    fn expecting(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.write_str("an array of entry objects")
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<(), A::Error> {
        while let Some(entry) = seq.next_element::<Map<String, Value>>()? {
            hand_over::<A::Error>(self.events, Event::Entry(entry))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_streams_entries_and_trailer() {
        let doc = r#"{
            "@odata.context": "http://h/svc/$metadata#Customers",
            "@odata.count": 2,
            "value": [
                {"Name": "a \"quoted\" ] name"},
                {"Name": "b", "Tags": [1, [2, 3]]}
            ],
            "@odata.nextLink": "http://h/svc/Customers?$skip=2"
        }"#;
        let mut stream = JsonEntryStream::open(doc.as_bytes(), ServiceVersion::V4).unwrap();
        assert_eq!(stream.header().count, Some(2));
        assert_eq!(stream.header().base.as_deref(), Some("http://h/svc/"));

        let first = stream.next_entry().unwrap().unwrap();
        assert_eq!(first.properties[0].name, "Name");
        assert!(stream.next_entry().unwrap().is_some());
        assert!(stream.next_entry().unwrap().is_none());
        assert_eq!(
            stream.header().next.as_deref(),
            Some("http://h/svc/Customers?$skip=2")
        );
        assert!(stream.next_entry().unwrap().is_none());
    }

    #[test]
    fn test_empty_value_array() {
        let mut stream =
            JsonEntryStream::open(r#"{"value": []}"#.as_bytes(), ServiceVersion::V3).unwrap();
        assert!(stream.next_entry().unwrap().is_none());
    }

    #[test]
    fn test_drop_mid_stream_releases_input() {
        use std::sync::atomic::{AtomicBool, Ordering};
        use std::sync::Arc;

        struct Flagged {
            inner: std::io::Cursor<Vec<u8>>,
            dropped: Arc<AtomicBool>,
        }
        impl Read for Flagged {
            fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
                self.inner.read(buf)
            }
        }
        impl Drop for Flagged {
            fn drop(&mut self) {
                self.dropped.store(true, Ordering::SeqCst);
            }
        }

        let doc = r#"{"value": [{"ID": 1}, {"ID": 2}, {"ID": 3}]}"#;
        let dropped = Arc::new(AtomicBool::new(false));
        let input = Flagged {
            inner: std::io::Cursor::new(doc.as_bytes().to_vec()),
            dropped: dropped.clone(),
        };
        let mut stream = JsonEntryStream::open(input, ServiceVersion::V4).unwrap();
        assert!(stream.next_entry().unwrap().is_some());
        assert!(!dropped.load(Ordering::SeqCst));

        drop(stream);
        assert!(dropped.load(Ordering::SeqCst));
    }

    #[test]
    fn test_non_object_root_fails_on_open() {
        assert!(JsonEntryStream::open(&b"[1, 2]"[..], ServiceVersion::V4).is_err());
    }

    #[test]
    fn test_truncated_stream() {
        let mut stream =
            JsonEntryStream::open(r#"{"value": [{"Name": "a"#.as_bytes(), ServiceVersion::V4)
                .unwrap();
        assert!(stream.next_entry().is_err());
    }
}
