//! Tree-shaped concatenation of chunk assets.
//!
//! Each round joins consecutive batches of at most `batch_size` assets, so no single
//! concatenation sees more than `batch_size` inputs and the final order equals the input
//! order.

use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::encode::concat::{Concatenator, write_manifest};
use crate::encode::ffmpeg::ensure_parent_dir;
use crate::foundation::cancel::CancelToken;
use crate::foundation::error::{HudError, HudResult};
use crate::pipeline::scheduler::remove_best_effort;

pub const DEFAULT_BATCH_SIZE: usize = 10;

/// Number of rounds needed to reduce `inputs` assets with `batch_size` fan-in.
pub fn merge_rounds(inputs: usize, batch_size: usize) -> usize {
    if batch_size < 2 {
        return 0;
    }
    let mut n = inputs;
    let mut rounds = 0;
    while n > 1 {
        n = n.div_ceil(batch_size);
        rounds += 1;
    }
    rounds
}

pub fn batch_file_name(round: usize, batch: usize, extension: &str) -> String {
    format!("merge_r{round}_b{batch:04}.{extension}")
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MergeReport {
    pub output: PathBuf,
    pub rounds: usize,
}

// `owned` marks intermediates this merger created and must delete.
struct Entry {
    path: PathBuf,
    owned: bool,
}

pub struct HierarchicalMerger<'a> {
    concat: &'a dyn Concatenator,
    work_dir: PathBuf,
    extension: String,
    batch_size: usize,
    consume_inputs: bool,
}

impl<'a> HierarchicalMerger<'a> {
    /// Merger writing `merge_r*_b*.{extension}` intermediates into `work_dir`.
    pub fn new(
        concat: &'a dyn Concatenator,
        work_dir: impl Into<PathBuf>,
        extension: impl Into<String>,
        batch_size: usize,
    ) -> HudResult<Self> {
        if batch_size < 2 {
            return Err(HudError::validation(format!(
                "merge batch size must be >= 2, got {batch_size}"
            )));
        }
        Ok(Self {
            concat,
            work_dir: work_dir.into(),
            extension: extension.into(),
            batch_size,
            consume_inputs: false,
        })
    }

    /// Delete the caller's input files once they have been merged.
    pub fn consume_inputs(mut self, yes: bool) -> Self {
        self.consume_inputs = yes;
        self
    }

    /// Reduce `inputs` (in order) into `output`.
    ///
    /// `on_round(done, total)` runs after each round. On failure every intermediate is
    /// removed (best effort) and the error names the failing round.
    #[tracing::instrument(skip_all, fields(inputs = inputs.len(), batch = self.batch_size))]
    pub fn merge(
        &self,
        inputs: &[PathBuf],
        output: &Path,
        cancel: &CancelToken,
        on_round: &mut dyn FnMut(usize, usize),
    ) -> HudResult<MergeReport> {
        if inputs.is_empty() {
            return Err(HudError::validation("nothing to merge"));
        }
        let total_rounds = merge_rounds(inputs.len(), self.batch_size);
        let mut live: Vec<Entry> = inputs
            .iter()
            .map(|p| Entry {
                path: p.clone(),
                owned: false,
            })
            .collect();

        let mut round = 0;
        while live.len() > 1 {
            round += 1;
            let step = cancel
                .check("merge")
                .and_then(|()| self.run_round(round, &mut live));
            match step {
                Ok(next) => live = next,
                Err(e) => {
                    self.discard(&live);
                    return Err(e);
                }
            }
            on_round(round, total_rounds);
        }

        let root = live.pop().ok_or_else(|| HudError::merge(round, "merge produced no output"))?;
        let moved = if root.owned || self.consume_inputs {
            move_file(&root.path, output)
        } else {
            copy_file(&root.path, output)
        };
        if let Err(e) = moved {
            if root.owned {
                remove_best_effort(&root.path);
            }
            return Err(HudError::merge(round, e.to_string()));
        }
        info!(rounds = round, output = %output.display(), "overlay merged");
        Ok(MergeReport {
            output: output.to_path_buf(),
            rounds: round,
        })
    }

    // Consumed entries are drained out of `live`; on error the remainder is left for cleanup.
    fn run_round(&self, round: usize, live: &mut Vec<Entry>) -> HudResult<Vec<Entry>> {
        let entries = std::mem::take(live);
        let mut batches: Vec<Vec<Entry>> = Vec::new();
        let mut it = entries.into_iter().peekable();
        while it.peek().is_some() {
            batches.push(it.by_ref().take(self.batch_size).collect());
        }
        debug!(round, batches = batches.len(), "merge round");

        let mut next: Vec<Entry> = Vec::with_capacity(batches.len());
        let mut pending = batches.into_iter().enumerate();
        while let Some((b, mut batch)) = pending.next() {
            if batch.len() == 1 {
                next.extend(batch.drain(..));
                continue;
            }
            match self.concat_batch(round, b, &batch) {
                Ok(out) => {
                    for e in &batch {
                        if e.owned || self.consume_inputs {
                            remove_best_effort(&e.path);
                        }
                    }
                    next.push(Entry {
                        path: out,
                        owned: true,
                    });
                }
                Err(e) => {
                    *live = next
                        .into_iter()
                        .chain(batch)
                        .chain(pending.flat_map(|(_, rest)| rest))
                        .collect();
                    return Err(e);
                }
            }
        }
        Ok(next)
    }

    fn concat_batch(&self, round: usize, batch: usize, entries: &[Entry]) -> HudResult<PathBuf> {
        let out = self
            .work_dir
            .join(batch_file_name(round, batch, &self.extension));
        let manifest = self.work_dir.join(batch_file_name(round, batch, "txt"));
        let paths: Vec<PathBuf> = entries.iter().map(|e| e.path.clone()).collect();
        let result = write_manifest(&manifest, &paths)
            .and_then(|()| self.concat.concat(&manifest, &paths, &out));
        remove_best_effort(&manifest);
        match result {
            Ok(()) => Ok(out),
            Err(e) => {
                remove_best_effort(&out);
                Err(HudError::merge(
                    round,
                    format!("batch {batch} ({} inputs): {e}", entries.len()),
                ))
            }
        }
    }

    fn discard(&self, live: &[Entry]) {
        for e in live {
            if e.owned {
                remove_best_effort(&e.path);
            }
        }
    }
}

fn move_file(from: &Path, to: &Path) -> HudResult<()> {
    ensure_parent_dir(to)?;
    if std::fs::rename(from, to).is_ok() {
        return Ok(());
    }
    // Different filesystem.
    copy_file(from, to)?;
    remove_best_effort(from);
    Ok(())
}

fn copy_file(from: &Path, to: &Path) -> HudResult<()> {
    ensure_parent_dir(to)?;
    std::fs::copy(from, to).map_err(|e| {
        HudError::encode(format!(
            "failed to copy '{}' to '{}': {e}",
            from.display(),
            to.display()
        ))
    })?;
    Ok(())
}

#[cfg(test)]
#[path = "../../tests/unit/pipeline/merge.rs"]
mod tests;
