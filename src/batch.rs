use std::sync::Arc;
use std::thread;

use crossbeam_utils::atomic::AtomicCell;
use tracing::{debug, info};

use crate::error::{PolyError, Result};
use crate::geom::{PolyFile, Ring};
use crate::simplify::simplify_cancellable;
use crate::statistics::SimplifyStats;

struct RingJob {
  index: usize,
  ring: Ring,
}

struct RingResult {
  index: usize,
  // None when the job saw the cancel flag
  ring: Option<Ring>,
}

/// Simplifies every ring of a [`PolyFile`] independently, spread over a pool
/// of worker threads.
pub struct BatchSimplifier {
  tolerance: f64,
  workers: usize,
  cancelled: Arc<AtomicCell<bool>>,
}

impl BatchSimplifier {
  /// `tolerance` is in fixed-point units.
  pub fn new(tolerance: f64) -> BatchSimplifier {
    BatchSimplifier {
      tolerance,
      workers: 0,
      cancelled: Arc::new(AtomicCell::new(false)),
    }
  }

  /// 0 sizes the pool from the CPU count.
  pub fn with_workers(mut self, workers: usize) -> BatchSimplifier {
    self.workers = workers;
    self
  }

  /// Setting the returned flag makes a running [`BatchSimplifier::run`] stop
  /// early with [`PolyError::Cancelled`].
  pub fn cancel_handle(&self) -> Arc<AtomicCell<bool>> {
    Arc::clone(&self.cancelled)
  }

  pub fn worker_count(&self) -> usize {
    if self.workers == 0 {
      std::cmp::max(num_cpus::get().saturating_sub(2), 2)
    } else {
      self.workers
    }
  }

  pub fn run(&self, poly: PolyFile) -> Result<(PolyFile, SimplifyStats)> {
    let PolyFile { name, outer, inner } = poly;
    let outer_count = outer.len();
    let rings: Vec<Ring> = outer.into_iter().chain(inner).collect();
    let points_before: Vec<usize> = rings.iter().map(|ring| ring.len()).collect();

    let workers = std::cmp::min(self.worker_count(), rings.len());
    info!(
      name = %name,
      rings = rings.len(),
      workers,
      tolerance = self.tolerance,
      "simplifying rings"
    );

    let mut simplified = if workers <= 1 {
      self.run_inline(rings)?
    } else {
      self.run_parallel(rings, workers)?
    };

    let mut stats = SimplifyStats::default();
    for (before, ring) in points_before.iter().zip(simplified.iter()) {
      stats.record(*before, ring.len());
    }
    info!(
      points_before = stats.points_before,
      points_after = stats.points_after,
      "simplification finished"
    );

    let inner = simplified.split_off(outer_count);
    Ok((
      PolyFile {
        name,
        outer: simplified,
        inner,
      },
      stats,
    ))
  }

  fn run_inline(&self, rings: Vec<Ring>) -> Result<Vec<Ring>> {
    rings
      .iter()
      .map(|ring| {
        simplify_cancellable(ring, self.tolerance, &self.cancelled)
          .map(Ring::from)
          .ok_or(PolyError::Cancelled)
      })
      .collect()
  }

  fn run_parallel(&self, rings: Vec<Ring>, workers: usize) -> Result<Vec<Ring>> {
    let ring_count = rings.len();
    let (job_tx, job_rx) = crossbeam_channel::unbounded::<RingJob>();
    let (result_tx, result_rx) = crossbeam_channel::unbounded::<RingResult>();

    let mut handles = Vec::with_capacity(workers);
    for worker_id in 0..workers {
      let thread_job_rx = job_rx.clone();
      let thread_result_tx = result_tx.clone();
      let thread_cancelled = Arc::clone(&self.cancelled);
      let tolerance = self.tolerance;
      handles.push(thread::spawn(move || {
        let mut done = 0;
        while let Ok(job) = thread_job_rx.recv() {
          let ring = simplify_cancellable(&job.ring, tolerance, &thread_cancelled).map(Ring::from);
          done += 1;
          let result = RingResult {
            index: job.index,
            ring,
          };
          if thread_result_tx.send(result).is_err() {
            break;
          }
        }
        debug!(worker_id, rings = done, "worker finished");
      }));
    }
    drop(result_tx);

    for (index, ring) in rings.into_iter().enumerate() {
      // workers hold receivers until the queue closes, so this only fails
      // if every one of them has died
      job_tx
        .send(RingJob { index, ring })
        .map_err(|_| PolyError::WorkerPanicked)?;
    }
    drop(job_tx);

    let mut slots: Vec<Option<Ring>> = vec![None; ring_count];
    let mut cancelled = false;
    for result in result_rx.iter() {
      match result.ring {
        Some(ring) => slots[result.index] = Some(ring),
        None => cancelled = true,
      }
    }

    for handle in handles {
      handle.join().map_err(|_| PolyError::WorkerPanicked)?;
    }
    if cancelled {
      return Err(PolyError::Cancelled);
    }

    slots
      .into_iter()
      .map(|slot| slot.ok_or(PolyError::WorkerPanicked))
      .collect()
  }
}
