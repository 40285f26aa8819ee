//! Load Session Module
//! Runs the record loader on a background thread and keeps only the newest result.

use crate::data::{LoadError, RecordLoader, Snapshot, Source};
use std::sync::mpsc::{channel, Receiver, TryRecvError};
use std::sync::Arc;
use std::thread;
use tracing::{debug, warn};

/// Loading result from background thread
struct LoadResult {
    generation: u64,
    result: Result<Snapshot, LoadError>,
}

#[derive(Debug)]
pub enum LoadState {
    Idle,
    Pending,
    Ready(Snapshot),
    Failed(LoadError),
}

impl LoadState {
    pub fn is_pending(&self) -> bool {
        matches!(self, LoadState::Pending)
    }

    pub fn snapshot(&self) -> Option<&Snapshot> {
        match self {
            LoadState::Ready(snapshot) => Some(snapshot),
            _ => None,
        }
    }
}

/// At most one load counts: starting a new one supersedes whatever is in
/// flight, and the superseded result is dropped when it arrives.
pub struct LoadSession {
    loader: Arc<RecordLoader>,
    generation: u64,
    load_rx: Option<Receiver<LoadResult>>,
    state: LoadState,
}

impl LoadSession {
    pub fn new(loader: RecordLoader) -> Self {
        Self {
            loader: Arc::new(loader),
            generation: 0,
            load_rx: None,
            state: LoadState::Idle,
        }
    }

    pub fn state(&self) -> &LoadState {
        &self.state
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Begin loading `source` in the background. Returns the load's generation.
    pub fn start(&mut self, source: Source) -> u64 {
        self.generation += 1;
        let generation = self.generation;

        let (tx, rx) = channel();
        if self.load_rx.replace(rx).is_some() {
            debug!(generation, "superseding in-flight load");
        }
        self.state = LoadState::Pending;

        let loader = Arc::clone(&self.loader);
        thread::spawn(move || {
            let result = loader.load(&source);
            // receiver is gone when this load was superseded
            let _ = tx.send(LoadResult { generation, result });
        });

        generation
    }

    /// Check for a finished load without blocking.
    pub fn poll(&mut self) -> &LoadState {
        if let Some(rx) = self.load_rx.take() {
            match rx.try_recv() {
                Ok(result) => self.apply(result),
                Err(TryRecvError::Empty) => self.load_rx = Some(rx),
                Err(TryRecvError::Disconnected) => self.interrupted(),
            }
        }
        &self.state
    }

    /// Block until the current load finishes.
    pub fn wait(&mut self) -> &LoadState {
        if let Some(rx) = self.load_rx.take() {
            match rx.recv() {
                Ok(result) => self.apply(result),
                Err(_) => self.interrupted(),
            }
        }
        &self.state
    }

    fn apply(&mut self, result: LoadResult) {
        if result.generation != self.generation {
            debug!(
                stale = result.generation,
                current = self.generation,
                "discarding superseded load"
            );
            return;
        }
        self.state = match result.result {
            Ok(snapshot) => LoadState::Ready(snapshot),
            Err(err) => {
                warn!(error = %err, "student records failed to load");
                LoadState::Failed(err)
            }
        };
    }

    fn interrupted(&mut self) {
        warn!(generation = self.generation, "load worker exited without a result");
        self.state = LoadState::Failed(LoadError::Interrupted);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn csv_file(contents: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn starts_idle_then_pending() {
        let file = csv_file("gender,age,code\nF,2000-01-01,1\n");
        let mut session = LoadSession::new(RecordLoader::default());
        assert!(matches!(session.state(), LoadState::Idle));

        session.start(Source::Path(file.path().to_path_buf()));
        assert!(session.state().is_pending());

        let snapshot = session.wait().snapshot().expect("loaded");
        assert_eq!(snapshot.len(), 1);
    }

    #[test]
    fn newer_load_wins() {
        let first = csv_file("gender,age,code\nF,2000-01-01,1\n");
        let second = csv_file("gender,age,code\nF,2000-01-01,2\nM,2000-01-01,3\n");
        let mut session = LoadSession::new(RecordLoader::default());

        session.start(Source::Path(first.path().to_path_buf()));
        let generation = session.start(Source::Path(second.path().to_path_buf()));
        assert_eq!(generation, 2);

        let snapshot = session.wait().snapshot().expect("loaded");
        assert_eq!(snapshot.codes(), vec![2, 3]);
    }

    #[test]
    fn stale_result_is_ignored() {
        let mut session = LoadSession::new(RecordLoader::default());
        session.generation = 3;
        session.state = LoadState::Pending;
        session.apply(LoadResult {
            generation: 2,
            result: Ok(Snapshot::new(Vec::new())),
        });
        assert!(session.state().is_pending());
    }

    #[test]
    fn failure_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = LoadSession::new(RecordLoader::default());
        session.start(Source::Path(dir.path().join("missing.csv")));
        assert!(matches!(
            session.wait(),
            LoadState::Failed(LoadError::Fetch(_))
        ));
    }

    #[test]
    fn poll_eventually_completes() {
        let file = csv_file("gender,age,code\nF,2000-01-01,1\n");
        let mut session = LoadSession::new(RecordLoader::default());
        session.start(Source::Path(file.path().to_path_buf()));
        for _ in 0..500 {
            if !session.poll().is_pending() {
                break;
            }
            thread::sleep(std::time::Duration::from_millis(10));
        }
        assert!(session.state().snapshot().is_some());
    }
}
