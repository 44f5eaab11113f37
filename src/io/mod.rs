pub mod output;
pub mod records;

pub use output::{create_writer, OutputFormat, RecordWriter};
pub use records::{
    natural_from_value, parse_natural, read_jsonl, JsonlInput, Numbered, ReportedRecord,
    SeedRequest, SequenceRecord, RECORD_COLUMNS,
};

use crate::aliquotmap_error::AliquotError;
use anyhow::Result;
use std::fs;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

/// Path that stands for stdin on input.
pub const STDIN_PATH: &str = "-";

/// Open an input file, or stdin for `-`.
pub fn open_input(path: &Path) -> Result<Box<dyn BufRead>> {
    if path.as_os_str() == STDIN_PATH {
        return Ok(Box::new(BufReader::new(std::io::stdin())));
    }
    let file = fs::File::open(path)
        .map_err(|e| AliquotError::from_io_error(e, Some(path.to_path_buf())))?;
    Ok(Box::new(BufReader::new(file)))
}

/// Open the output file, or stdout when no path is given.
pub fn open_output(path: Option<&Path>) -> Result<Box<dyn Write>> {
    match path {
        Some(path) => {
            let file = fs::File::create(path)
                .map_err(|e| AliquotError::from_io_error(e, Some(path.to_path_buf())))?;
            Ok(Box::new(BufWriter::new(file)))
        }
        None => Ok(Box::new(BufWriter::new(std::io::stdout()))),
    }
}

pub fn write_file(path: &Path, content: &str) -> Result<()> {
    fs::write(path, content).map_err(|e| AliquotError::from_io_error(e, Some(path.to_path_buf())))?;
    Ok(())
}
