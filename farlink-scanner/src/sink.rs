use crate::link::Link;
use std::io;

/// Result of writing one page's links to a sink.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SinkWrite {
    /// Whether the sink's target already held data before this write.
    pub existed: bool,
    pub written: usize,
}

/// Destination for the links discovered on each fetched page.
///
/// One call carries one page's links and must be written as a unit.
pub trait LinkSink: Send {
    fn write_batch(&mut self, links: &[Link]) -> io::Result<SinkWrite>;
}

/// Keeps every batch in memory.
#[derive(Debug, Default)]
pub struct MemorySink {
    pub batches: Vec<Vec<Link>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lines(&self) -> Vec<String> {
        self.batches
            .iter()
            .flatten()
            .map(|link| link.to_string())
            .collect()
    }
}

impl LinkSink for MemorySink {
    fn write_batch(&mut self, links: &[Link]) -> io::Result<SinkWrite> {
        let existed = !self.batches.is_empty();
        self.batches.push(links.to_vec());
        Ok(SinkWrite {
            existed,
            written: links.len(),
        })
    }
}
