//! Dump command implementation.

use anyhow::{Context, Result};
use mqhist_lib::{decrypt_archive, digest_from_path};
use std::path::Path;

/// Write the decompressed block stream of an archive to `output`.
pub(crate) fn dump(input: &Path, output: &Path, quiet: bool) -> Result<()> {
    let digest = digest_from_path(input)?;
    let data = std::fs::read(input).with_context(|| format!("Failed to read {}", input.display()))?;

    let stream = decrypt_archive(&data, &digest)
        .and_then(|archive| archive.block_stream())
        .with_context(|| format!("Failed to unpack {}", input.display()))?;

    std::fs::write(output, &stream)
        .with_context(|| format!("Failed to write {}", output.display()))?;

    if !quiet {
        println!("Wrote {} bytes to {}", stream.len(), output.display());
    }
    Ok(())
}
