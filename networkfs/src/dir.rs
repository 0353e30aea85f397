//! Cursor-driven directory iteration.
//!
//! Cursor positions map onto entries as follows:
//!
//! ```text
//! cursor   entry
//! ------   ---------------------------
//!   0      "."   (the directory itself)
//!   1      ".."  (its parent)
//!   2+i    page[i] for i < page.len()
//!   ...    end of iteration
//! ```
//!
//! The page is fetched again on every pass and the cursor alone says where
//! to resume. Entries created or removed between passes can shift which
//! remote entry a cursor maps to; the adapter does not hide this.

use tracing::trace;

use crate::error::FsResult;
use crate::mount::MountContext;
use crate::remote::RemoteCall;
use crate::resolver::EntryResolver;
use crate::types::{DirEntry, Inode, NodeKind};

/// Cursor positions taken by the synthetic `.` and `..` entries.
const SYNTHETIC_ENTRIES: u64 = 2;

/// Where one iteration pass stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IterateOutcome {
    /// Cursor to pass to the next call.
    pub cursor: u64,
    /// Entries the sink accepted during this pass.
    pub emitted: usize,
}

/// Produces the entries of one directory, `.` and `..` first.
pub struct DirectoryIterator<'a, C> {
    resolver: EntryResolver<'a, C>,
}

impl<'a, C: RemoteCall> DirectoryIterator<'a, C> {
    pub fn new(resolver: EntryResolver<'a, C>) -> Self {
        Self { resolver }
    }

    /// Emit entries of `dir` starting at `cursor`.
    ///
    /// `sink` receives each entry together with the cursor that resumes
    /// after it, and returns `false` when it cannot take the entry (for
    /// example a full host buffer). A refused entry is not counted and the
    /// returned cursor points at it.
    pub fn iterate<F>(
        &self,
        ctx: &MountContext,
        dir: Inode,
        parent: Inode,
        cursor: u64,
        mut sink: F,
    ) -> FsResult<IterateOutcome>
    where
        F: FnMut(&DirEntry, u64) -> bool,
    {
        let page = self.resolver.list(ctx, dir)?;
        let mut cursor = cursor;
        let mut emitted = 0;

        loop {
            let entry = match cursor {
                0 => DirEntry::new(".", dir, NodeKind::Directory),
                1 => DirEntry::new("..", parent, NodeKind::Directory),
                n => match page.get((n - SYNTHETIC_ENTRIES) as usize) {
                    Some(entry) => entry.clone(),
                    None => break,
                },
            };

            if !sink(&entry, cursor + 1) {
                break;
            }
            emitted += 1;
            cursor += 1;
        }

        trace!(dir, cursor, emitted, "Directory pass finished");
        Ok(IterateOutcome { cursor, emitted })
    }

    /// Collect every entry from cursor 0 to exhaustion.
    pub fn collect_all(
        &self,
        ctx: &MountContext,
        dir: Inode,
        parent: Inode,
    ) -> FsResult<Vec<DirEntry>> {
        let mut entries = Vec::new();
        self.iterate(ctx, dir, parent, 0, |entry, _| {
            entries.push(entry.clone());
            true
        })?;
        Ok(entries)
    }
}
