use crate::link::Link;
use std::collections::{HashSet, VecDeque};

/// Visited and pending sets for one traversal.
///
/// Pending links are handed out first-in first-out. `queued` mirrors the
/// queue so a link is pending at most once.
#[derive(Debug, Default)]
pub struct Frontier {
    visited: HashSet<Link>,
    pending: VecDeque<Link>,
    queued: HashSet<Link>,
}

impl Frontier {
    pub fn new(start: Link) -> Self {
        let mut frontier = Self::default();
        frontier.queued.insert(start.clone());
        frontier.pending.push_back(start);
        frontier
    }

    pub fn pop(&mut self) -> Option<Link> {
        let link = self.pending.pop_front()?;
        self.queued.remove(&link);
        Some(link)
    }

    pub fn is_visited(&self, link: &Link) -> bool {
        self.visited.contains(link)
    }

    /// Records `link` as visited. Returns false if it already was.
    pub fn mark_visited(&mut self, link: Link) -> bool {
        self.visited.insert(link)
    }

    /// Queues every link that is neither visited nor already pending.
    /// Returns how many were queued.
    pub fn merge<'a, I>(&mut self, links: I) -> usize
    where
        I: IntoIterator<Item = &'a Link>,
    {
        let mut added = 0;
        for link in links {
            if self.visited.contains(link) || self.queued.contains(link) {
                continue;
            }
            self.queued.insert(link.clone());
            self.pending.push_back(link.clone());
            added += 1;
        }
        added
    }

    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }

    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    pub fn into_visited(self) -> HashSet<Link> {
        self.visited
    }
}
