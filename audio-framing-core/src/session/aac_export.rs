use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::models::aac::AdtsFrameConfig;
use crate::models::error::FramingError;
use crate::storage::adts_writer::AdtsFrameWriter;
use crate::storage::file_output;
use crate::traits::access_unit_source::AccessUnitSource;

/// Totals for one ADTS export.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AdtsExportSummary {
    pub frames: u64,
    /// Bytes written, ADTS headers included.
    pub bytes: u64,
}

/// Drain an encoder into `sink` as an ADTS stream.
///
/// Every access unit is written as header + payload before the next one is
/// requested. Stops at the first source or sink error; frames already written
/// stay valid.
pub fn export_adts_stream<A, W>(
    source: &mut A,
    sink: W,
    config: AdtsFrameConfig,
) -> Result<AdtsExportSummary, FramingError>
where
    A: AccessUnitSource + ?Sized,
    W: Write,
{
    let mut writer = AdtsFrameWriter::new(sink, config)?;
    while let Some(unit) = source.next_access_unit()? {
        writer.write_frame(&unit)?;
    }
    writer.flush()?;

    let summary = AdtsExportSummary {
        frames: writer.frames_written(),
        bytes: writer.bytes_written(),
    };
    log::info!("ADTS export complete: {} frames, {} bytes", summary.frames, summary.bytes);
    Ok(summary)
}

/// [`export_adts_stream`] into a freshly created `dir/name`.
pub fn export_adts_file<A>(
    source: &mut A,
    dir: &Path,
    name: &str,
    config: AdtsFrameConfig,
) -> Result<(PathBuf, AdtsExportSummary), FramingError>
where
    A: AccessUnitSource + ?Sized,
{
    let file = file_output::create_output_file(dir, name)?;
    let summary = export_adts_stream(source, BufWriter::new(file), config)?;
    Ok((dir.join(name), summary))
}
