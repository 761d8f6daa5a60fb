use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use log::{debug, info};

/// A line breakpoint. Lines are 1-based.
#[derive(Debug)]
pub struct Breakpoint {
    line: u32,
    ignore_count: u64,
    hit_count: AtomicU64,
}

impl Breakpoint {
    pub fn new(line: u32) -> Self {
        Self {
            line,
            ignore_count: 0,
            hit_count: AtomicU64::new(0),
        }
    }

    /// Skip the first `count` hits before pausing.
    pub fn with_ignore_count(mut self, count: u64) -> Self {
        self.ignore_count = count;
        self
    }

    pub fn line(&self) -> u32 {
        self.line
    }

    pub fn ignore_count(&self) -> u64 {
        self.ignore_count
    }

    pub fn hit_count(&self) -> u64 {
        self.hit_count.load(Ordering::Relaxed)
    }

    /// Count a hit and report whether execution should pause.
    fn hit(&self) -> bool {
        let hits = self.hit_count.fetch_add(1, Ordering::Relaxed) + 1;
        hits > self.ignore_count
    }
}

impl From<u32> for Breakpoint {
    fn from(line: u32) -> Self {
        Self::new(line)
    }
}

type LineTable = Arc<HashMap<u32, Breakpoint>>;

/// Per-source line breakpoints.
///
/// Each source maps to an immutable line table that is swapped out whole by
/// [`set_breakpoints`](Self::set_breakpoints), so a reader never observes a
/// half-written entry.
#[derive(Debug, Default)]
pub struct BreakpointTable {
    sources: Mutex<HashMap<String, LineTable>>,
}

impl BreakpointTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_breakpoints<I, B>(&self, source: &str, breakpoints: I)
    where
        I: IntoIterator<Item = B>,
        B: Into<Breakpoint>,
    {
        let mut lines = HashMap::new();
        for bp in breakpoints {
            let bp = bp.into();
            info!("Set breakpoint in {}: {}", source, bp.line());
            lines.insert(bp.line(), bp);
        }

        let mut sources = self.sources.lock().unwrap_or_else(PoisonError::into_inner);
        if lines.is_empty() {
            sources.remove(source);
        } else {
            sources.insert(source.to_string(), Arc::new(lines));
        }
    }

    fn lines_for(&self, source: &str) -> Option<LineTable> {
        let sources = self.sources.lock().unwrap_or_else(PoisonError::into_inner);
        sources.get(source).cloned()
    }

    pub fn is_breakpoint(&self, source: &str, line: u32) -> bool {
        self.lines_for(source)
            .map_or(false, |lines| lines.contains_key(&line))
    }

    /// Record that execution reached `(source, line)`. Returns true when a
    /// breakpoint is registered there and its ignore count is exhausted.
    pub fn hit(&self, source: &str, line: u32) -> bool {
        let Some(lines) = self.lines_for(source) else {
            return false;
        };
        match lines.get(&line) {
            Some(bp) => {
                let stop = bp.hit();
                if !stop {
                    debug!(
                        "Ignoring breakpoint {}:{} (hit {} of {} ignored)",
                        source,
                        line,
                        bp.hit_count(),
                        bp.ignore_count()
                    );
                }
                stop
            }
            None => false,
        }
    }

    pub fn hit_count(&self, source: &str, line: u32) -> Option<u64> {
        self.lines_for(source)
            .and_then(|lines| lines.get(&line).map(Breakpoint::hit_count))
    }

    /// Sorted breakpoint lines for `source`.
    pub fn breakpoints(&self, source: &str) -> Vec<u32> {
        let mut lines: Vec<u32> = self
            .lines_for(source)
            .map(|lines| lines.keys().copied().collect())
            .unwrap_or_default();
        lines.sort_unstable();
        lines
    }

    pub fn is_empty(&self) -> bool {
        self.sources
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_empty()
    }

    pub fn clear(&self) {
        self.sources
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_replaces_whole_source() {
        let table = BreakpointTable::new();
        table.set_breakpoints("a.robot", [5u32, 10, 15]);
        assert!(table.is_breakpoint("a.robot", 5));
        assert!(table.is_breakpoint("a.robot", 10));
        assert!(!table.is_breakpoint("a.robot", 7));

        table.set_breakpoints("a.robot", [7u32]);
        assert!(table.is_breakpoint("a.robot", 7));
        assert!(!table.is_breakpoint("a.robot", 5), "old lines must be gone");
        assert_eq!(table.breakpoints("a.robot"), vec![7]);
    }

    #[test]
    fn test_sources_are_independent() {
        let table = BreakpointTable::new();
        table.set_breakpoints("a.robot", [1u32]);
        table.set_breakpoints("b.robot", [2u32]);
        table.set_breakpoints("a.robot", Vec::<u32>::new());

        assert!(!table.is_breakpoint("a.robot", 1));
        assert!(table.is_breakpoint("b.robot", 2));
        assert!(!table.is_breakpoint("unknown.robot", 2));
    }

    #[test]
    fn test_ignore_count_and_hit_counts() {
        let table = BreakpointTable::new();
        table.set_breakpoints("a.robot", [Breakpoint::new(3).with_ignore_count(2)]);

        assert!(!table.hit("a.robot", 3));
        assert!(!table.hit("a.robot", 3));
        assert!(table.hit("a.robot", 3));
        assert_eq!(table.hit_count("a.robot", 3), Some(3));
        assert!(!table.hit("a.robot", 4));

        table.set_breakpoints("a.robot", [Breakpoint::new(3).with_ignore_count(2)]);
        assert_eq!(table.hit_count("a.robot", 3), Some(0), "replacing starts a fresh count");
    }

    #[test]
    fn test_lookup_is_pure() {
        let table = BreakpointTable::new();
        table.set_breakpoints("a.robot", [3u32]);
        assert!(table.is_breakpoint("a.robot", 3));
        assert!(table.is_breakpoint("a.robot", 3));
        assert_eq!(table.hit_count("a.robot", 3), Some(0));
    }

    #[test]
    fn test_clear() {
        let table = BreakpointTable::new();
        table.set_breakpoints("a.robot", [3u32]);
        assert!(!table.is_empty());
        table.clear();
        assert!(table.is_empty());
        assert!(table.breakpoints("a.robot").is_empty());
    }
}
