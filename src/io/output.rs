use super::records::{SequenceRecord, RECORD_COLUMNS};
use comfy_table::presets::UTF8_FULL;
use comfy_table::Table;
use std::io::Write;

/// Digits of a peak shown in the table view before it is elided.
const TABLE_PEAK_DIGITS: usize = 24;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// One JSON object per line
    #[default]
    Jsonl,
    Csv,
    Tsv,
    /// Human-readable table, written when the writer finishes
    Table,
}

pub trait RecordWriter {
    fn write_record(&mut self, record: &SequenceRecord) -> anyhow::Result<()>;

    /// Flush anything buffered. Must be called once after the last record.
    fn finish(&mut self) -> anyhow::Result<()>;
}

pub struct JsonlWriter<W: Write> {
    writer: W,
}

impl<W: Write> JsonlWriter<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }
}

impl<W: Write> RecordWriter for JsonlWriter<W> {
    fn write_record(&mut self, record: &SequenceRecord) -> anyhow::Result<()> {
        serde_json::to_writer(&mut self.writer, record)?;
        self.writer.write_all(b"\n")?;
        Ok(())
    }

    fn finish(&mut self) -> anyhow::Result<()> {
        self.writer.flush()?;
        Ok(())
    }
}

/// CSV or TSV with a header row.
pub struct DelimitedWriter<W: Write> {
    writer: csv::Writer<W>,
    wrote_header: bool,
}

impl<W: Write> DelimitedWriter<W> {
    pub fn new(writer: W, delimiter: u8) -> Self {
        Self {
            writer: csv::WriterBuilder::new()
                .delimiter(delimiter)
                .from_writer(writer),
            wrote_header: false,
        }
    }

    fn ensure_header(&mut self) -> anyhow::Result<()> {
        if !self.wrote_header {
            self.writer.write_record(RECORD_COLUMNS)?;
            self.wrote_header = true;
        }
        Ok(())
    }
}

impl<W: Write> RecordWriter for DelimitedWriter<W> {
    fn write_record(&mut self, record: &SequenceRecord) -> anyhow::Result<()> {
        self.ensure_header()?;
        self.writer.write_record(record.to_row())?;
        Ok(())
    }

    fn finish(&mut self) -> anyhow::Result<()> {
        self.ensure_header()?;
        self.writer.flush()?;
        Ok(())
    }
}

pub struct TableWriter<W: Write> {
    writer: W,
    table: Table,
}

impl<W: Write> TableWriter<W> {
    pub fn new(writer: W) -> Self {
        let mut table = Table::new();
        table
            .load_preset(UTF8_FULL)
            .set_header(vec![
                "seed", "steps", "ended", "status", "final", "peak", "peak_step", "peak_bits",
            ]);
        Self { writer, table }
    }
}

fn elide(digits: &str, keep: usize) -> String {
    if digits.len() <= keep {
        digits.to_string()
    } else {
        format!("{}…({} digits)", &digits[..keep], digits.len())
    }
}

impl<W: Write> RecordWriter for TableWriter<W> {
    fn write_record(&mut self, record: &SequenceRecord) -> anyhow::Result<()> {
        self.table.add_row(vec![
            elide(&record.seed, TABLE_PEAK_DIGITS),
            record.steps.to_string(),
            record.ended.to_string(),
            record.status.clone(),
            elide(&record.final_value, TABLE_PEAK_DIGITS),
            elide(&record.peak, TABLE_PEAK_DIGITS),
            record.peak_step.to_string(),
            record.peak_bits.to_string(),
        ]);
        Ok(())
    }

    fn finish(&mut self) -> anyhow::Result<()> {
        writeln!(self.writer, "{}", self.table)?;
        self.writer.flush()?;
        Ok(())
    }
}

pub fn create_writer<'a>(
    format: OutputFormat,
    writer: Box<dyn Write + 'a>,
) -> Box<dyn RecordWriter + 'a> {
    match format {
        OutputFormat::Jsonl => Box::new(JsonlWriter::new(writer)),
        OutputFormat::Csv => Box::new(DelimitedWriter::new(writer, b',')),
        OutputFormat::Tsv => Box::new(DelimitedWriter::new(writer, b'\t')),
        OutputFormat::Table => Box::new(TableWriter::new(writer)),
    }
}
