//! Compiling source files and directories to output files.
use std::{
    fs,
    io::{BufWriter, Write},
    path::{Path, PathBuf},
};

use log::{debug, info};

use crate::{
    compile::compile_str,
    constants::*,
    error::{JackError, JackResult},
    lex::{Lexer, TokenListing},
};

/// Driver configuration parameters.
#[derive(Debug, Clone)]
pub struct DriverConf {
    /// Extension of the files that are compiled.
    pub source_ext: String,
    /// Extension given to generated VM code.
    pub output_ext: String,
    /// Replaces the extension of a source file for its token listing.
    pub listing_suffix: String,
}

impl Default for DriverConf {
    fn default() -> Self {
        Self {
            source_ext: SOURCE_EXT.to_owned(),
            output_ext: VM_EXT.to_owned(),
            listing_suffix: LISTING_SUFFIX.to_owned(),
        }
    }
}

/// Source files to compile for the given path.
///
/// A file is compiled on its own. A directory has all its files with
/// the source extension compiled, in order of their names.
pub fn collect_sources(path: impl AsRef<Path>, conf: &DriverConf) -> JackResult<Vec<PathBuf>> {
    let path = path.as_ref();

    if path.is_dir() {
        let mut sources = vec![];
        for entry in fs::read_dir(path)? {
            let source = entry?.path();
            if source.is_file() && has_extension(&source, &conf.source_ext) {
                sources.push(source);
            }
        }
        sources.sort();

        if sources.is_empty() {
            return Err(JackError::Usage(format!(
                "no .{} files in directory {}",
                conf.source_ext,
                path.display()
            )));
        }

        Ok(sources)
    } else if path.is_file() {
        if !has_extension(path, &conf.source_ext) {
            return Err(JackError::Usage(format!(
                "{} is not a .{} file",
                path.display(),
                conf.source_ext
            )));
        }

        Ok(vec![path.to_path_buf()])
    } else {
        Err(JackError::Usage(format!("{} does not exist", path.display())))
    }
}

fn has_extension(path: &Path, ext: &str) -> bool {
    path.extension().map_or(false, |actual| actual == ext)
}

/// Output file for the given source, `Main.jack` -> `Main.vm`.
pub fn output_path(source: &Path, ext: &str) -> PathBuf {
    source.with_extension(ext)
}

/// Token listing file for the given source, `Main.jack` -> `MainT.xml`.
pub fn listing_path(source: &Path, suffix: &str) -> PathBuf {
    let stem = source.file_stem().unwrap_or_default().to_string_lossy();
    source.with_file_name(format!("{stem}{suffix}"))
}

/// File name shown in diagnostics.
fn display_name(path: &Path) -> String {
    path.file_name()
        .unwrap_or(path.as_os_str())
        .to_string_lossy()
        .into_owned()
}

fn read_source(path: &Path) -> JackResult<String> {
    let file_bytes = fs::read(path)?;
    Ok(String::from_utf8(file_bytes)?)
}

fn write_output(path: &Path, contents: &[u8]) -> JackResult<()> {
    let mut file = BufWriter::new(fs::File::create(path)?);
    file.write_all(contents)?;
    file.flush()?;
    Ok(())
}

/// Compile one source file, and write the VM code next to it.
///
/// The source is compiled in memory, so nothing is written
/// when compilation fails.
///
/// Returns the path of the written file.
pub fn compile_file(path: impl AsRef<Path>, conf: &DriverConf) -> JackResult<PathBuf> {
    let path = path.as_ref();
    debug!("reading {}", path.display());

    let source_code = read_source(path)?;
    let vm_code = compile_str(&display_name(path), source_code)?;

    let out_path = output_path(path, &conf.output_ext);
    write_output(&out_path, vm_code.as_bytes())?;
    info!("compiled {} -> {}", path.display(), out_path.display());

    Ok(out_path)
}

/// Compile a source file, or every source file in a directory.
///
/// Files are compiled one after the other. Stops at the first failure.
pub fn compile_path(path: impl AsRef<Path>, conf: &DriverConf) -> JackResult<Vec<PathBuf>> {
    collect_sources(path, conf)?
        .iter()
        .map(|source| compile_file(source, conf))
        .collect()
}

/// Write the token listing of one source file next to it.
///
/// Returns the path of the written file.
pub fn tokenize_file(path: impl AsRef<Path>, conf: &DriverConf) -> JackResult<PathBuf> {
    let path = path.as_ref();
    debug!("reading {}", path.display());

    let source_code = read_source(path)?;
    let lexer = Lexer::new(display_name(path), source_code.as_str());
    let listing = TokenListing::new(Vec::new()).write_tokens(lexer)?;

    let out_path = listing_path(path, &conf.listing_suffix);
    write_output(&out_path, &listing)?;
    info!("tokenized {} -> {}", path.display(), out_path.display());

    Ok(out_path)
}

/// Write token listings for a source file, or every source file in a directory.
pub fn tokenize_path(path: impl AsRef<Path>, conf: &DriverConf) -> JackResult<Vec<PathBuf>> {
    collect_sources(path, conf)?
        .iter()
        .map(|source| tokenize_file(source, conf))
        .collect()
}
