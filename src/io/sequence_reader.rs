// Read loader using bio::io::fasta and bio::io::fastq
//
// The format is taken from the first record marker ('>' or '@'), so the
// same entry point serves FASTA and FASTQ. Files ending in .gz are
// decompressed with noodles-bgzf when they carry BGZF blocks and with
// flate2 otherwise.

use bio::io::{fasta, fastq};
use flate2::read::MultiGzDecoder;
use noodles_bgzf as bgzf;
use std::fs::File;
use std::io::{self, BufRead, BufReader, Read};
use std::path::Path;

use crate::sequence::ReadSequence;

const BUFFER_SIZE: usize = 4 * 1024 * 1024; // 4MB buffer

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SequenceFormat {
    Fasta,
    Fastq,
}

/// Detect if a gzipped file is BGZF by its extra field ('BC' subfield)
fn is_bgzip_format(path: &Path) -> io::Result<bool> {
    let mut file = File::open(path)?;
    let mut header = [0u8; 18];
    let mut filled = 0;
    while filled < header.len() {
        let n = file.read(&mut header[filled..])?;
        if n == 0 {
            return Ok(false);
        }
        filled += n;
    }
    if header[0] != 0x1f || header[1] != 0x8b {
        return Ok(false);
    }
    // FEXTRA flag
    if header[3] & 0x04 == 0 {
        return Ok(false);
    }
    Ok(header[12] == b'B' && header[13] == b'C')
}

/// Open a possibly compressed file as a plain byte stream.
pub fn open_input(path: &Path) -> io::Result<Box<dyn Read>> {
    let file = File::open(path)?;
    let is_gz = path.extension().is_some_and(|ext| ext == "gz");
    let reader: Box<dyn Read> = if is_gz {
        if is_bgzip_format(path)? {
            log::debug!("Detected BGZF input {}, using multithreaded decompression", path.display());
            Box::new(bgzf::MultithreadedReader::new(file))
        } else {
            log::debug!("Detected gzip input {}", path.display());
            Box::new(MultiGzDecoder::new(file))
        }
    } else {
        Box::new(file)
    };
    Ok(reader)
}

fn invalid_data<E>(err: E) -> io::Error
where
    E: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    io::Error::new(io::ErrorKind::InvalidData, err)
}

/// Format of a stream, from its first non-blank byte. `None` for empty input.
pub fn detect_format<R: BufRead>(reader: &mut R) -> io::Result<Option<SequenceFormat>> {
    loop {
        let buf = reader.fill_buf()?;
        if buf.is_empty() {
            return Ok(None);
        }
        match buf.iter().position(|b| !b.is_ascii_whitespace()) {
            Some(pos) => {
                let marker = buf[pos];
                reader.consume(pos);
                return match marker {
                    b'>' => Ok(Some(SequenceFormat::Fasta)),
                    b'@' => Ok(Some(SequenceFormat::Fastq)),
                    other => Err(invalid_data(format!(
                        "unrecognized sequence format, first character '{}'",
                        other as char
                    ))),
                };
            }
            None => {
                let len = buf.len();
                reader.consume(len);
            }
        }
    }
}

/// Load every read of a FASTA or FASTQ stream, in file order.
pub fn read_sequences_from<R: Read>(reader: R) -> io::Result<Vec<ReadSequence>> {
    let mut reader = BufReader::with_capacity(BUFFER_SIZE, reader);
    let Some(format) = detect_format(&mut reader)? else {
        return Ok(Vec::new());
    };
    let mut sequences = Vec::new();
    match format {
        SequenceFormat::Fasta => {
            for record in fasta::Reader::new(reader).records() {
                let record = record.map_err(invalid_data)?;
                sequences.push(ReadSequence::new(record.id(), record.seq()));
            }
        }
        SequenceFormat::Fastq => {
            for record in fastq::Reader::new(reader).records() {
                let record = record.map_err(invalid_data)?;
                sequences.push(ReadSequence::new(record.id(), record.seq()));
            }
        }
    }
    Ok(sequences)
}

/// Load every read of a FASTA or FASTQ file (optionally gzip/BGZF compressed).
pub fn read_sequences(path: impl AsRef<Path>) -> io::Result<Vec<ReadSequence>> {
    let path = path.as_ref();
    let sequences = read_sequences_from(open_input(path)?)?;
    let total: usize = sequences.iter().map(ReadSequence::len).sum();
    log::info!(
        "Loaded {} sequences ({} bp) from {}",
        sequences.len(),
        total,
        path.display()
    );
    Ok(sequences)
}
