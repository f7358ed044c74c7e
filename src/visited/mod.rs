use std::collections::HashSet;
use std::sync::Mutex;

/// Targets already claimed by a worker during one run.
#[derive(Debug, Default)]
pub struct VisitedSet {
    seen: Mutex<HashSet<String>>,
}

impl VisitedSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records `target` and reports whether this call was the first to do so.
    pub fn try_mark(&self, target: &str) -> bool {
        let mut seen = match self.seen.lock() {
            Ok(seen) => seen,
            Err(poisoned) => poisoned.into_inner(),
        };
        if seen.contains(target) {
            return false;
        }
        seen.insert(target.to_string())
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        match self.seen.lock() {
            Ok(seen) => seen.len(),
            Err(poisoned) => poisoned.into_inner().len(),
        }
    }

    #[cfg(test)]
    pub(crate) fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use super::*;

    #[test]
    fn second_mark_is_rejected() {
        let visited = VisitedSet::new();
        assert!(visited.try_mark("http://x/admin"));
        assert!(!visited.try_mark("http://x/admin"));
        assert!(visited.try_mark("http://x/admin/"));
        assert_eq!(visited.len(), 2);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_marks_have_a_single_winner() {
        let visited = Arc::new(VisitedSet::new());
        let winners = Arc::new(AtomicUsize::new(0));
        let mut handles = Vec::new();
        for _ in 0..32 {
            let visited = visited.clone();
            let winners = winners.clone();
            handles.push(tokio::spawn(async move {
                for i in 0..50 {
                    if visited.try_mark(&format!("http://x/{i}")) {
                        winners.fetch_add(1, Ordering::SeqCst);
                    }
                }
            }));
        }
        for h in futures::future::join_all(handles).await {
            h.unwrap();
        }
        assert_eq!(winners.load(Ordering::SeqCst), 50);
        assert_eq!(visited.len(), 50);
    }
}
