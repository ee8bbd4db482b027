use cardsmith_common::{CardsmithError, Result, Settings};
use cardsmith_llm::{relay, FlashcardGenerator, FragmentSink, GenerationRequest};
use tracing::info;

use crate::note::{LineRange, NoteDocument, NoteRelay};

/// What a `generate` invocation should do with the note
#[derive(Debug, Clone, Default)]
pub struct GenerateJob {
    /// Preset id or name (single generation when unset)
    pub preset: Option<String>,

    /// Lines of the note to send (whole note when unset)
    pub lines: Option<LineRange>,

    /// Echo fragments to stdout while writing
    pub echo: bool,
}

/// Generate flashcards from a note and write them into it
///
/// Returns the number of fragments inserted. On failure, whatever was
/// inserted before the error stays in the note.
pub async fn generate_into_note(
    generator: &FlashcardGenerator,
    settings: &Settings,
    note: &mut NoteDocument,
    job: &GenerateJob,
) -> Result<usize> {
    let text = note.selection(job.lines)?;
    let base = GenerationRequest::from_settings(settings, text)?;
    let mut sink = NoteRelay::new(note, settings.tag.clone(), job.echo);

    match &job.preset {
        Some(key) => {
            let preset = settings.find_preset(key).ok_or_else(|| {
                CardsmithError::configuration(format!("Unknown preset: {}", key))
            })?;
            let mut run = generator.preset_run(preset, base);
            let result = run.drain_into(&mut sink).await;
            let inserted = sink.fragments();
            let summary = result?;
            info!(
                "Preset '{}' finished: {} batches, {} fragments",
                preset.name, summary.batches, inserted
            );
            Ok(inserted)
        }
        None => {
            let fragments = generator.generate(&base).await?;
            let label = format!("{} x{}", base.flashcard_type, base.count);
            sink.begin_batch(0, &label)?;
            let count = relay(fragments, &mut sink).await?;
            info!("Generation finished: {} fragments", count);
            Ok(count)
        }
    }
}
