use std::fs::File;
use std::io::{BufWriter, Write as _};
use std::path::{Path, PathBuf};

use anyhow::Context as _;

use crate::encode::ffmpeg::run_tool;
use crate::foundation::error::{HudError, HudResult};

/// Lossless concatenation of assets in the given order.
pub trait Concatenator: Send + Sync {
    /// Join `inputs` into `output`. `manifest` is the list file already written for `inputs`.
    fn concat(&self, manifest: &Path, inputs: &[PathBuf], output: &Path) -> HudResult<()>;
}

/// Quote a path for an ffmpeg concat list: `'` becomes `'\''`.
pub fn escape_concat_path(path: &Path) -> String {
    path.to_string_lossy().replace('\'', r"'\''")
}

/// Write an ffmpeg concat-demuxer list of `inputs`.
pub fn write_manifest(path: &Path, inputs: &[PathBuf]) -> HudResult<()> {
    let file = File::create(path)
        .with_context(|| format!("failed to create concat list '{}'", path.display()))?;
    let mut w = BufWriter::new(file);
    for input in inputs {
        let abs = std::path::absolute(input).unwrap_or_else(|_| input.clone());
        writeln!(w, "file '{}'", escape_concat_path(&abs))
            .with_context(|| format!("failed to write concat list '{}'", path.display()))?;
    }
    w.flush()
        .with_context(|| format!("failed to write concat list '{}'", path.display()))?;
    Ok(())
}

/// Stream-copy concatenation through `ffmpeg -f concat`.
#[derive(Clone, Copy, Debug, Default)]
pub struct FfmpegConcat;

impl Concatenator for FfmpegConcat {
    fn concat(&self, manifest: &Path, _inputs: &[PathBuf], output: &Path) -> HudResult<()> {
        let mut args: Vec<String> = ["-y", "-loglevel", "error", "-f", "concat", "-safe", "0"]
            .map(String::from)
            .to_vec();
        args.push("-i".into());
        args.push(manifest.to_string_lossy().into_owned());
        args.extend(["-c", "copy"].map(String::from));
        args.push(output.to_string_lossy().into_owned());
        run_tool("ffmpeg", &args, "concat").map(|_| ())
    }
}

/// Byte-level concatenation, valid for headerless assets such as raw frame files.
#[derive(Clone, Copy, Debug, Default)]
pub struct ByteConcat;

impl Concatenator for ByteConcat {
    fn concat(&self, _manifest: &Path, inputs: &[PathBuf], output: &Path) -> HudResult<()> {
        let file = File::create(output)
            .with_context(|| format!("failed to create '{}'", output.display()))?;
        let mut w = BufWriter::new(file);
        for input in inputs {
            let mut r = File::open(input)
                .map_err(|e| HudError::encode(format!("'{}': {e}", input.display())))?;
            std::io::copy(&mut r, &mut w)
                .with_context(|| format!("failed to append '{}'", input.display()))?;
        }
        w.flush()
            .with_context(|| format!("failed to flush '{}'", output.display()))?;
        Ok(())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/encode/concat.rs"]
mod tests;
