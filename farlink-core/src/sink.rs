use farlink_scanner::{Link, LinkSink, SinkWrite};
use std::fs::OpenOptions;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

/// Appends each page's links to a file, one URL per line.
///
/// The file is opened (created if missing) and closed again for every batch,
/// so nothing is held open between pages.
#[derive(Debug, Clone)]
pub struct FileSink {
    path: PathBuf,
}

impl FileSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl LinkSink for FileSink {
    fn write_batch(&mut self, links: &[Link]) -> io::Result<SinkWrite> {
        let existed = self.path.exists();

        let mut batch = String::new();
        for link in links {
            batch.push_str(link.as_str());
            batch.push('\n');
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        file.write_all(batch.as_bytes())?;
        file.flush()?;

        Ok(SinkWrite {
            existed,
            written: links.len(),
        })
    }
}
