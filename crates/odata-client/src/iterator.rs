//! Streaming entity-set iterator.

use std::io::{BufReader, Read};

use odata_common::uri::{parse_base, resolve};
use odata_common::{Entity, ODataResult, Url};
use odata_wire::{ResourceFamily, WireEntryStream};
use tracing::debug;

use crate::binder::Binder;

/// Boxed payload source owned by an iterator.
pub type PayloadSource = Box<dyn Read + Send>;

/// Yields the entities of a feed one at a time while the payload is read.
///
/// The iterator owns its input. Closing it releases the input; closing is
/// idempotent and also happens on drop. Feed-level data (count, next link)
/// is available once the parser has passed it, which for payloads that put
/// it after the entries means once iteration has finished.
pub struct EntitySetIterator {
    stream: Option<WireEntryStream<BufReader<PayloadSource>>>,
    binder: Binder,
    base: Option<Url>,
    count: Option<i64>,
    next: Option<String>,
    header_base: Option<String>,
    yielded: usize,
}

impl EntitySetIterator {
    pub(crate) fn open(
        input: PayloadSource,
        family: ResourceFamily,
        binder: Binder,
        base: Option<Url>,
    ) -> ODataResult<Self> {
        let stream = binder.factory().entry_stream(BufReader::new(input), family)?;
        let mut iterator = Self {
            stream: Some(stream),
            binder,
            base,
            count: None,
            next: None,
            header_base: None,
            yielded: 0,
        };
        iterator.snapshot_header();
        Ok(iterator)
    }

    /// The next entity, or `None` once the feed is exhausted or closed.
    pub fn next_entity(&mut self) -> ODataResult<Option<Entity>> {
        let Some(stream) = self.stream.as_mut() else {
            return Ok(None);
        };
        let entry = match stream.next_entry() {
            Ok(entry) => entry,
            Err(e) => {
                self.close();
                return Err(e);
            }
        };
        self.snapshot_header();

        let Some(entry) = entry else {
            self.close();
            return Ok(None);
        };
        let base = self.entry_base()?;
        let entity = self.binder.unbind_entry(&entry, base.as_ref())?;
        self.yielded += 1;
        Ok(Some(entity))
    }

    /// Total count announced by the feed, if seen so far.
    pub fn count(&self) -> Option<i64> {
        self.count
    }

    /// Resolved next-page link, if seen so far.
    pub fn next_link(&self) -> ODataResult<Option<Url>> {
        let base = self.entry_base()?;
        self.next
            .as_deref()
            .map(|next| resolve(base.as_ref(), next))
            .transpose()
    }

    /// Release the underlying input. Safe to call more than once.
    pub fn close(&mut self) {
        if let Some(stream) = self.stream.take() {
            drop(stream);
            debug!(entities = self.yielded, "Closed entity set iterator");
        }
    }

    pub fn is_closed(&self) -> bool {
        self.stream.is_none()
    }

    fn snapshot_header(&mut self) {
        if let Some(stream) = &self.stream {
            let header = stream.header();
            self.count = header.count.or(self.count);
            self.next = header.next.clone().or_else(|| self.next.take());
            self.header_base = header.base.clone().or_else(|| self.header_base.take());
        }
    }

    fn entry_base(&self) -> ODataResult<Option<Url>> {
        match &self.base {
            Some(base) => Ok(Some(base.clone())),
            None => parse_base(self.header_base.as_deref()),
        }
    }
}

impl Iterator for EntitySetIterator {
    type Item = ODataResult<Entity>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_entity().transpose()
    }
}

impl Drop for EntitySetIterator {
    fn drop(&mut self) {
        self.close();
    }
}

impl std::fmt::Debug for EntitySetIterator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EntitySetIterator")
            .field("closed", &self.is_closed())
            .field("count", &self.count)
            .field("next", &self.next)
            .field("yielded", &self.yielded)
            .finish()
    }
}
