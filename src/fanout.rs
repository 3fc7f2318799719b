//! Output fan-out
//!
//! Decides how many output documents a request yields and assembles them.

use crate::error::SpliceError;
use crate::pdf::{DocumentBuilder, Rotation, SourceDocument};
use crate::select::{select, Fanout, SplitMode, Unit, UnitLabel};
use tracing::debug;

/// A unit bound to the document its indices refer to.
pub struct SourcedUnit<'a> {
    pub source: &'a SourceDocument,
    pub rotation: Option<Rotation>,
    pub unit: Unit,
}

/// A finished output, ready for persistence.
#[derive(Debug, Clone)]
pub struct OutputDocument {
    pub label: UnitLabel,
    pub page_count: usize,
    pub bytes: Vec<u8>,
}

/// Assemble `units` into output documents, in unit order. Outputs that
/// would contain no pages are never produced.
pub fn fan_out(
    units: Vec<SourcedUnit<'_>>,
    fanout: &Fanout,
) -> Result<Vec<OutputDocument>, SpliceError> {
    match fanout {
        Fanout::Merged(label) => {
            let builder = units
                .iter()
                .try_fold(DocumentBuilder::new(), |builder, part| {
                    builder.append(part.source, &part.unit.indices, part.rotation)
                })?;
            Ok(finish(builder, label.clone())?.into_iter().collect())
        }
        Fanout::Separate => {
            let mut outputs = Vec::with_capacity(units.len());
            for part in units {
                let builder =
                    DocumentBuilder::new().append(part.source, &part.unit.indices, part.rotation)?;
                outputs.extend(finish(builder, part.unit.label)?);
            }
            Ok(outputs)
        }
    }
}

fn finish(
    builder: DocumentBuilder,
    label: UnitLabel,
) -> Result<Option<OutputDocument>, SpliceError> {
    let page_count = builder.page_count();
    if page_count == 0 {
        debug!(%label, "Discarding empty output");
        return Ok(None);
    }

    let bytes = builder.finish()?;
    debug!(%label, page_count, size = bytes.len(), "Assembled output");
    Ok(Some(OutputDocument {
        label,
        page_count,
        bytes,
    }))
}

/// The split operation: select pages of one document and fan them out.
/// Source rotation is kept as-is.
pub fn split_source(
    source: &SourceDocument,
    mode: &SplitMode,
) -> Result<Vec<OutputDocument>, SpliceError> {
    let selection = select(mode, source.page_count());
    let units = selection
        .units
        .into_iter()
        .map(|unit| SourcedUnit {
            source,
            rotation: None,
            unit,
        })
        .collect();
    fan_out(units, &selection.fanout)
}

/// The merge operation: every page of every source, in source order, with
/// each source's rotation applied to all of its pages.
pub fn merge_sources(
    sources: &[(SourceDocument, Rotation)],
) -> Result<Option<OutputDocument>, SpliceError> {
    let units = sources
        .iter()
        .map(|(source, rotation)| SourcedUnit {
            source,
            rotation: Some(*rotation),
            unit: Unit {
                indices: (0..source.page_count()).collect(),
                label: UnitLabel::Merged,
            },
        })
        .collect();
    let outputs = fan_out(units, &Fanout::Merged(UnitLabel::Merged))?;
    Ok(outputs.into_iter().next())
}
