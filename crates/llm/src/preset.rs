use cardsmith_common::{CardsmithError, Preset, PresetItem, Result};
use futures::StreamExt;
use tracing::{info, warn};

use crate::generator::{FlashcardGenerator, FragmentSink};
use crate::types::{FragmentStream, GenerationRequest, TextFragment};

/// Sequential execution of a preset
///
/// Items are dispatched one at a time: a batch borrows the run mutably, so
/// the next item cannot start while the previous batch is still alive. Any
/// failure, or dropping a batch before it is drained, aborts the rest.
pub struct PresetRun<'g> {
    generator: &'g FlashcardGenerator,
    preset: &'g Preset,
    base: GenerationRequest,
    next_index: usize,
    aborted: bool,
}

/// Totals of a completed preset run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PresetSummary {
    pub batches: usize,
    pub fragments: usize,
}

impl<'g> PresetRun<'g> {
    pub fn new(generator: &'g FlashcardGenerator, preset: &'g Preset, base: GenerationRequest) -> Self {
        info!(
            "Starting preset '{}' - {} items, {} cards",
            preset.name,
            preset.items.len(),
            preset.total_cards()
        );
        Self {
            generator,
            preset,
            base,
            next_index: 0,
            aborted: false,
        }
    }

    /// Items not yet dispatched
    pub fn remaining(&self) -> usize {
        if self.aborted {
            return 0;
        }
        self.preset.items.len() - self.next_index
    }

    pub fn is_aborted(&self) -> bool {
        self.aborted
    }

    /// Dispatch the next item
    ///
    /// Returns `None` once every item ran or the run was aborted.
    pub async fn next_batch(&mut self) -> Option<Result<PresetBatch<'_>>> {
        if self.aborted {
            return None;
        }
        let item = *self.preset.items.get(self.next_index)?;
        let index = self.next_index;
        self.next_index += 1;

        info!(
            "Preset '{}' item {}/{}: {}",
            self.preset.name,
            index + 1,
            self.preset.items.len(),
            item.label()
        );

        let request = self.base.for_item(item.flashcard_type, item.count);
        match self.generator.generate(&request).await {
            Ok(fragments) => Some(Ok(PresetBatch {
                index,
                item,
                fragments,
                drained: false,
                aborted: &mut self.aborted,
            })),
            Err(e) => {
                warn!("Preset item {} failed, skipping the rest: {}", index, e);
                self.aborted = true;
                Some(Err(CardsmithError::batch_abort(index, item.label(), e)))
            }
        }
    }

    /// Relay every item into a sink, in order
    pub async fn drain_into<S: FragmentSink + ?Sized>(&mut self, sink: &mut S) -> Result<PresetSummary> {
        let mut summary = PresetSummary::default();

        while let Some(batch) = self.next_batch().await {
            let mut batch = batch?;
            let label = batch.item.label();
            sink.begin_batch(batch.index, &label)
                .map_err(|e| batch.abort(e))?;

            while let Some(fragment) = batch.next_fragment().await {
                let fragment = fragment?;
                sink.fragment(&fragment).map_err(|e| batch.abort(e))?;
                summary.fragments += 1;
            }

            sink.end_batch(batch.index).map_err(|e| batch.abort(e))?;
            summary.batches += 1;
        }

        Ok(summary)
    }
}

/// Fragments of one preset item
pub struct PresetBatch<'r> {
    pub index: usize,
    pub item: PresetItem,
    fragments: FragmentStream,
    drained: bool,
    aborted: &'r mut bool,
}

impl PresetBatch<'_> {
    /// Next fragment of this item
    pub async fn next_fragment(&mut self) -> Option<Result<TextFragment>> {
        if self.drained {
            return None;
        }
        match self.fragments.next().await {
            Some(Ok(fragment)) => Some(Ok(fragment)),
            Some(Err(e)) => {
                warn!("Preset item {} failed mid-stream: {}", self.index, e);
                Some(Err(self.abort(e)))
            }
            None => {
                self.drained = true;
                None
            }
        }
    }

    /// Mark the run aborted, wrapping the cause
    fn abort(&mut self, cause: CardsmithError) -> CardsmithError {
        *self.aborted = true;
        self.drained = true;
        CardsmithError::batch_abort(self.index, self.item.label(), cause)
    }
}

impl Drop for PresetBatch<'_> {
    fn drop(&mut self) {
        if !self.drained {
            warn!("Preset item {} abandoned before completion", self.index);
            *self.aborted = true;
        }
    }
}
