// src/scrape.rs
//! Multi-page runs. Only fetching is spread over worker threads; each page
//! is parsed, extracted and cleaned on the calling thread.
use std::{
    sync::{
        atomic::{AtomicUsize, Ordering},
        mpsc,
    },
    thread,
};

use tracing::{debug, warn};

use crate::{
    config::consts::WORKERS,
    core::fetch::Fetch,
    engine::{self, Recipe, RunReport},
    error::Result,
    progress::Progress,
};

/// Fetch every address with up to `WORKERS` threads. Results come back in
/// input order, one per address.
pub fn fetch_all(
    addresses: &[String],
    fetcher: &dyn Fetch,
    mut progress: Option<&mut dyn Progress>,
) -> Vec<Result<String>> {
    if let Some(p) = progress.as_deref_mut() {
        p.begin(addresses.len());
        p.log("Fetching pages…");
    }

    let counter = AtomicUsize::new(0);
    let (res_tx, res_rx) = mpsc::channel::<(usize, Result<String>)>();
    let workers = WORKERS.min(addresses.len()).max(1);

    let mut slots: Vec<Option<Result<String>>> = addresses.iter().map(|_| None).collect();

    thread::scope(|scope| {
        for w in 0..workers {
            let idx = &counter;
            let tx = res_tx.clone();
            scope.spawn(move || {
                loop {
                    let i = idx.fetch_add(1, Ordering::Relaxed);
                    if i >= addresses.len() {
                        break;
                    }
                    debug!(worker = w, address = %addresses[i], "Fetch: start");
                    if tx.send((i, fetcher.fetch(&addresses[i]))).is_err() {
                        break; // receiver gone
                    }
                }
            });
        }
        drop(res_tx); // main thread is sole receiver now

        for (i, result) in res_rx.iter() {
            if let Some(p) = progress.as_deref_mut() {
                match &result {
                    Ok(_) => p.item_done(i),
                    Err(e) => p.log(&format!("{}: {e}", addresses[i])),
                }
            }
            slots[i] = Some(result);
        }
    });

    if let Some(p) = progress.as_deref_mut() {
        p.finish();
    }

    slots
        .into_iter()
        .zip(addresses)
        .map(|(slot, addr)| {
            // every index is claimed by exactly one worker
            slot.unwrap_or_else(|| Err(crate::error::Error::network(addr.as_str(), "worker exited early")))
        })
        .collect()
}

/// Run several recipes: concurrent fetch, sequential extraction.
pub fn run_all(
    recipes: &[Recipe],
    fetcher: &dyn Fetch,
    progress: Option<&mut dyn Progress>,
) -> Vec<Result<RunReport>> {
    let sources: Vec<String> = recipes.iter().map(|r| r.source.clone()).collect();
    let pages = fetch_all(&sources, fetcher, progress);

    recipes
        .iter()
        .zip(pages)
        .map(|(recipe, page)| {
            let report = page.and_then(|markup| engine::run_markup(recipe, &markup));
            if let Err(e) = &report {
                warn!(recipe = %recipe.name, "Run failed: {e}");
            }
            report
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use std::sync::Mutex;

    /// Serves `<p>{address}</p>`; addresses starting with `!` fail.
    struct Echo {
        calls: Mutex<Vec<String>>,
    }

    impl Fetch for Echo {
        fn fetch(&self, address: &str) -> Result<String> {
            self.calls.lock().unwrap().push(s!(address));
            if address.starts_with('!') {
                return Err(Error::network(address, "refused"));
            }
            Ok(format!("<p>{address}</p>"))
        }
    }

    #[derive(Default)]
    struct Count {
        total: usize,
        done: usize,
        logs: usize,
        finished: bool,
    }

    impl Progress for Count {
        fn begin(&mut self, total: usize) {
            self.total = total;
        }
        fn log(&mut self, _msg: &str) {
            self.logs += 1;
        }
        fn item_done(&mut self, _index: usize) {
            self.done += 1;
        }
        fn finish(&mut self) {
            self.finished = true;
        }
    }

    #[test]
    fn results_keep_input_order() {
        let fetcher = Echo { calls: Mutex::new(Vec::new()) };
        let addrs: Vec<String> = (0..11).map(|i| format!("page{i}")).chain([s!("!bad")]).collect();
        let mut count = Count::default();

        let out = fetch_all(&addrs, &fetcher, Some(&mut count));

        assert_eq!(out.len(), 12);
        for (i, r) in out.iter().take(11).enumerate() {
            assert_eq!(r.as_ref().unwrap(), &format!("<p>page{i}</p>"));
        }
        assert!(matches!(out[11], Err(Error::Network { .. })));
        assert_eq!(fetcher.calls.lock().unwrap().len(), 12);
        assert_eq!((count.total, count.done, count.finished), (12, 11, true));
        assert_eq!(count.logs, 2); // "Fetching pages…" + the failure
    }

    #[test]
    fn empty_input() {
        let fetcher = Echo { calls: Mutex::new(Vec::new()) };
        assert!(fetch_all(&[], &fetcher, None).is_empty());
    }
}
