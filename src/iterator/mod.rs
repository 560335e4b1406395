pub mod merge;
pub mod source;

use crate::error::Result;
use crate::types::Record;

/// The central stream abstraction for the engine.
///
/// Every record source (table artifact, chunk file, JSON-lines input, the
/// k-way merger, the merge-updater) implements this trait. This enables
/// composability: the merger takes `Vec<Box<dyn RecordStream>>` and is
/// itself a `RecordStream` that the index builder drains.
///
/// End of stream is an explicit `Ok(None)`, polled by the merge loops.
/// Once a stream has returned `Ok(None)` it keeps returning it.
pub trait RecordStream {
    /// Returns the next record, or `Ok(None)` once the stream is exhausted.
    fn next_record(&mut self) -> Result<Option<Record>>;
}

impl<S: RecordStream + ?Sized> RecordStream for Box<S> {
    fn next_record(&mut self) -> Result<Option<Record>> {
        (**self).next_record()
    }
}

/// Adapts any iterator of `Result<Record>` into a [`RecordStream`].
pub struct IterStream<I> {
    inner: I,
}

impl<I> IterStream<I>
where
    I: Iterator<Item = Result<Record>>,
{
    pub fn new(inner: I) -> Self {
        IterStream { inner }
    }
}

impl<I> RecordStream for IterStream<I>
where
    I: Iterator<Item = Result<Record>>,
{
    fn next_record(&mut self) -> Result<Option<Record>> {
        self.inner.next().transpose()
    }
}

/// Stream over an in-memory list of records.
pub fn from_records(
    records: Vec<Record>,
) -> IterStream<std::iter::Map<std::vec::IntoIter<Record>, fn(Record) -> Result<Record>>> {
    IterStream::new(records.into_iter().map(Ok as fn(Record) -> Result<Record>))
}

/// Drain a stream into a vector. Intended for tests and small tables.
pub fn collect(stream: &mut dyn RecordStream) -> Result<Vec<Record>> {
    let mut out = Vec::new();
    while let Some(record) = stream.next_record()? {
        out.push(record);
    }
    Ok(out)
}
