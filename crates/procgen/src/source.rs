//! Text line sources feeding the terrain generator.
//!
//! Both accessors are polled once per frame from the simulation thread and
//! must never block on input.

use std::collections::VecDeque;
use std::io::BufRead;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread::JoinHandle;

/// A stream of text lines.
pub trait LineSource {
    /// Next line if one is ready. Never blocks.
    fn pop_next_line(&mut self) -> Option<String>;

    /// True once end-of-input was reached and every line was handed out.
    fn is_exhausted(&self) -> bool;

    /// Restart from the first line. Returns false if the source cannot
    /// replay what it already produced.
    fn rewind(&mut self) -> bool {
        false
    }
}

impl<S: LineSource + ?Sized> LineSource for Box<S> {
    fn pop_next_line(&mut self) -> Option<String> {
        (**self).pop_next_line()
    }

    fn is_exhausted(&self) -> bool {
        (**self).is_exhausted()
    }

    fn rewind(&mut self) -> bool {
        (**self).rewind()
    }
}

/// Built-in passage used when there is no piped input.
pub const FALLBACK_TEXT: &str = "\
Lorem ipsum dolor sit amet, consectetur adipiscing elit.
Sed do eiusmod tempor incididunt ut labore et dolore magna aliqua.
Ut enim ad minim veniam, quis nostrud exercitation ullamco laboris.
Nisi ut aliquip ex ea commodo consequat.
Duis aute irure dolor in reprehenderit in voluptate velit esse cillum dolore.
Eu fugiat nulla pariatur.
Excepteur sint occaecat cupidatat non proident.
Sunt in culpa qui officia deserunt mollit anim id est laborum.
Curabitur pretium tincidunt lacus, nulla gravida orci a odio.
Nullam varius, turpis et commodo pharetra, est eros bibendum elit.
Nec luctus magna felis sollicitudin mauris.
Integer in mauris eu nibh euismod gravida.
Duis ac tellus et risus vulputate vehicula.
Donec lobortis risus a elit. Etiam tempor.
Ut ullamcorper, ligula eu tempor congue, eros est euismod turpis.
Id tincidunt sapien risus a quam.
Maecenas fermentum consequat mi. Donec fermentum.
Pellentesque malesuada nulla a mi.
Duis sapien sem, aliquet nec, commodo eget, consequat quis, neque.
Aliquam faucibus, elit ut dictum aliquet, felis nisl adipiscing sapien.
Sed malesuada diam lacus eget erat.
Cras mollis scelerisque nunc. Nullam arcu.
Aliquam consequat. Curabitur augue lorem, dapibus quis, laoreet et, pretium ac, nisi.
Aenean magna nisl, mollis quis, molestie eu, feugiat in, orci.
In hac habitasse platea dictumst.";

/// Fixed in-memory lines. Always exhausted once drained; replays on
/// rewind.
#[derive(Debug, Clone, Default)]
pub struct StaticLines {
    lines: Vec<String>,
    cursor: usize,
}

impl StaticLines {
    pub fn new<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            lines: lines.into_iter().map(Into::into).collect(),
            cursor: 0,
        }
    }

    /// One entry per line of `text`.
    pub fn from_text(text: &str) -> Self {
        Self::new(text.lines())
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

impl LineSource for StaticLines {
    fn pop_next_line(&mut self) -> Option<String> {
        let line = self.lines.get(self.cursor)?.clone();
        self.cursor += 1;
        Some(line)
    }

    fn is_exhausted(&self) -> bool {
        self.cursor >= self.lines.len()
    }

    fn rewind(&mut self) -> bool {
        self.cursor = 0;
        true
    }
}

#[derive(Debug, Default)]
struct Shared {
    /// Every line read so far, kept for replay.
    lines: Vec<String>,
    eof: bool,
}

/// Reads lines on a background thread. The simulation pops them from a
/// shared cache; a rewind replays the cache from the start while the
/// worker keeps appending.
#[derive(Debug)]
pub struct LineReader {
    shared: Arc<Mutex<Shared>>,
    running: Arc<AtomicBool>,
    cursor: usize,
    worker: Option<JoinHandle<()>>,
}

impl LineReader {
    /// Spawn a worker draining `input` line by line.
    pub fn spawn<R>(input: R) -> std::io::Result<Self>
    where
        R: BufRead + Send + 'static,
    {
        let shared = Arc::new(Mutex::new(Shared::default()));
        let running = Arc::new(AtomicBool::new(true));

        let worker = {
            let shared = Arc::clone(&shared);
            let running = Arc::clone(&running);
            std::thread::Builder::new()
                .name("line-reader".into())
                .spawn(move || read_lines(input, &shared, &running))?
        };

        Ok(Self {
            shared,
            running,
            cursor: 0,
            worker: Some(worker),
        })
    }

    fn lock(&self) -> MutexGuard<'_, Shared> {
        // A panicking worker leaves complete lines behind; keep using them.
        self.shared.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Lines read by the worker so far.
    pub fn lines_read(&self) -> usize {
        self.lock().lines.len()
    }
}

fn read_lines<R: BufRead>(input: R, shared: &Mutex<Shared>, running: &AtomicBool) {
    let mut count = 0usize;
    for line in input.lines() {
        if !running.load(Ordering::Relaxed) {
            break;
        }
        match line {
            Ok(line) => {
                let mut guard = shared.lock().unwrap_or_else(|p| p.into_inner());
                guard.lines.push(line);
                count += 1;
            }
            Err(e) => {
                log::warn!("line reader stopped: {e}");
                break;
            }
        }
    }
    shared.lock().unwrap_or_else(|p| p.into_inner()).eof = true;
    log::debug!("line reader finished after {count} lines");
}

impl LineSource for LineReader {
    fn pop_next_line(&mut self) -> Option<String> {
        let line = self.lock().lines.get(self.cursor).cloned()?;
        self.cursor += 1;
        Some(line)
    }

    fn is_exhausted(&self) -> bool {
        let shared = self.lock();
        shared.eof && self.cursor >= shared.lines.len()
    }

    fn rewind(&mut self) -> bool {
        self.cursor = 0;
        true
    }
}

impl Drop for LineReader {
    fn drop(&mut self) {
        self.running.store(false, Ordering::Relaxed);
        if let Some(worker) = self.worker.take() {
            // A worker blocked on stdin only notices at its next line;
            // don't hold up shutdown waiting for it.
            if worker.is_finished() {
                let _ = worker.join();
            }
        }
    }
}

/// Lines pushed by hand; the test double for a slow producer.
#[derive(Debug, Default)]
pub struct QueuedLines {
    pending: VecDeque<String>,
    closed: bool,
}

impl QueuedLines {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, line: impl Into<String>) {
        self.pending.push_back(line.into());
    }

    /// Mark end of input.
    pub fn close(&mut self) {
        self.closed = true;
    }
}

impl LineSource for QueuedLines {
    fn pop_next_line(&mut self) -> Option<String> {
        self.pending.pop_front()
    }

    fn is_exhausted(&self) -> bool {
        self.closed && self.pending.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use std::time::{Duration, Instant};

    fn drain(reader: &mut LineReader) -> Vec<String> {
        let deadline = Instant::now() + Duration::from_secs(5);
        let mut out = Vec::new();
        while !reader.is_exhausted() {
            match reader.pop_next_line() {
                Some(line) => out.push(line),
                None => {
                    assert!(Instant::now() < deadline, "reader never finished");
                    std::thread::sleep(Duration::from_millis(1));
                }
            }
        }
        out
    }

    #[test]
    fn static_lines_drain_and_rewind() {
        let mut source = StaticLines::new(["a", "b"]);
        assert!(!source.is_exhausted());
        assert_eq!(source.pop_next_line().as_deref(), Some("a"));
        assert_eq!(source.pop_next_line().as_deref(), Some("b"));
        assert_eq!(source.pop_next_line(), None);
        assert!(source.is_exhausted());
        assert!(source.rewind());
        assert_eq!(source.pop_next_line().as_deref(), Some("a"));
    }

    #[test]
    fn empty_static_source_is_exhausted() {
        let source = StaticLines::default();
        assert!(source.is_exhausted());
    }

    #[test]
    fn fallback_text_has_lines() {
        let source = StaticLines::from_text(FALLBACK_TEXT);
        assert!(source.len() > 20);
    }

    #[test]
    fn reader_delivers_lines_in_order() {
        let input = Cursor::new("first\n\nthird line\n");
        let mut reader = LineReader::spawn(input).unwrap();
        let lines = drain(&mut reader);
        assert_eq!(lines, vec!["first", "", "third line"]);
        assert_eq!(reader.lines_read(), 3);
    }

    #[test]
    fn reader_replays_after_rewind() {
        let mut reader = LineReader::spawn(Cursor::new("x\ny\n")).unwrap();
        let first = drain(&mut reader);
        assert!(reader.rewind());
        assert!(!reader.is_exhausted());
        let second = drain(&mut reader);
        assert_eq!(first, second);
    }

    #[test]
    fn queued_lines_wait_for_close() {
        let mut source = QueuedLines::new();
        assert_eq!(source.pop_next_line(), None);
        assert!(!source.is_exhausted());
        source.push("late");
        source.close();
        assert!(!source.is_exhausted());
        assert_eq!(source.pop_next_line().as_deref(), Some("late"));
        assert!(source.is_exhausted());
        assert!(!source.rewind());
    }
}
