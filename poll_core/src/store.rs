//! The poll file format.
//!
//! A poll is stored as a fixed sequence of fields, with no header and no
//! version number:
//!
//! 1. the question (string)
//! 2. the number of options (`u32`, little-endian)
//! 3. for each option, in authoring order: id (string), text (string) and
//!    number of votes (`u64`, little-endian)
//!
//! Strings are UTF-8 bytes preceded by their byte length, written as an
//! unsigned LEB128 integer of at most 5 bytes (7 bits per byte, high bit set
//! when more bytes follow).
//!
//! Nothing may follow the last option record.

use std::collections::HashSet;
use std::fs;
use std::io::{Read, Write};
use std::path::Path;

use snafu::{ensure, OptionExt, ResultExt};

use crate::model::*;
use crate::Poll;

const MAX_LENGTH_PREFIX_BYTES: usize = 5;

/// Encodes the poll into its file representation.
pub fn to_bytes(poll: &Poll) -> PollResult<Vec<u8>> {
    let mut buf: Vec<u8> = Vec::new();
    write_string(&mut buf, poll.question(), "question")?;
    let num_options = u32::try_from(poll.len())
        .ok()
        .context(OversizedSnafu { field: "option count" })?;
    buf.extend_from_slice(&num_options.to_le_bytes());
    for (option, votes) in poll.options() {
        write_string(&mut buf, option.id(), "option id")?;
        write_string(&mut buf, option.text(), "option text")?;
        buf.extend_from_slice(&votes.to_le_bytes());
    }
    Ok(buf)
}

/// Decodes a poll from its file representation.
///
/// Fails with `PollError::CorruptData` unless `bytes` holds exactly one
/// well-formed poll.
pub fn from_bytes(bytes: &[u8]) -> PollResult<Poll> {
    let mut reader = ByteReader { bytes, pos: 0 };

    let question = reader.read_string("question")?;
    ensure!(
        !question.is_empty(),
        CorruptDataSnafu {
            reason: "empty question"
        }
    );

    let num_options = reader.read_u32("option count")?;
    let mut records: Vec<(PollOption, u64)> = Vec::new();
    let mut seen_ids: HashSet<String> = HashSet::new();
    let mut total_votes: u64 = 0;
    for idx in 0..num_options {
        let id = reader.read_string("option id")?;
        let text = reader.read_string("option text")?;
        let votes = reader.read_u64("vote count")?;
        ensure!(
            !id.is_empty() && !text.is_empty(),
            CorruptDataSnafu {
                reason: format!("option {} has an empty id or text", idx + 1)
            }
        );
        ensure!(
            seen_ids.insert(id.clone()),
            CorruptDataSnafu {
                reason: format!("duplicate option id {:?}", id)
            }
        );
        total_votes = total_votes.checked_add(votes).context(CorruptDataSnafu {
            reason: "vote counts overflow",
        })?;
        records.push((PollOption::new(id, text), votes));
    }

    let trailing = reader.remaining();
    ensure!(
        trailing == 0,
        CorruptDataSnafu {
            reason: format!(
                "{} unexpected bytes after the {} declared options",
                trailing, num_options
            )
        }
    );

    Ok(Poll::from_records(question, records, total_votes))
}

/// Writes the poll to `writer`. The poll is not modified, whatever the outcome.
pub fn save<W: Write>(poll: &Poll, writer: &mut W) -> PollResult<()> {
    let bytes = to_bytes(poll)?;
    writer
        .write_all(&bytes)
        .and_then(|_| writer.flush())
        .context(IoSnafu { target: "stream" })
}

/// Reads a full poll from `reader`.
pub fn load<R: Read>(reader: &mut R) -> PollResult<Poll> {
    let mut bytes: Vec<u8> = Vec::new();
    reader
        .read_to_end(&mut bytes)
        .context(IoSnafu { target: "stream" })?;
    from_bytes(&bytes)
}

/// Writes the poll to the file at `path`, replacing any previous content.
pub fn save_to_file(poll: &Poll, path: impl AsRef<Path>) -> PollResult<()> {
    let path = path.as_ref();
    let bytes = to_bytes(poll)?;
    fs::write(path, bytes).context(IoSnafu {
        target: path.display().to_string(),
    })
}

/// Reads the poll stored in the file at `path`.
pub fn load_from_file(path: impl AsRef<Path>) -> PollResult<Poll> {
    let path = path.as_ref();
    let bytes = fs::read(path).context(IoSnafu {
        target: path.display().to_string(),
    })?;
    from_bytes(&bytes)
}

fn write_string(buf: &mut Vec<u8>, s: &str, field: &'static str) -> PollResult<()> {
    let mut len = u32::try_from(s.len())
        .ok()
        .context(OversizedSnafu { field })?;
    while len >= 0x80 {
        buf.push((len as u8) | 0x80);
        len >>= 7;
    }
    buf.push(len as u8);
    buf.extend_from_slice(s.as_bytes());
    Ok(())
}

struct ByteReader<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> ByteReader<'a> {
    fn remaining(&self) -> usize {
        self.bytes.len() - self.pos
    }

    fn take(&mut self, n: usize, field: &str) -> PollResult<&'a [u8]> {
        ensure!(
            n <= self.remaining(),
            CorruptDataSnafu {
                reason: format!(
                    "truncated {}: needs {} bytes, {} left",
                    field,
                    n,
                    self.remaining()
                )
            }
        );
        let res = &self.bytes[self.pos..self.pos + n];
        self.pos += n;
        Ok(res)
    }

    fn read_array<const N: usize>(&mut self, field: &str) -> PollResult<[u8; N]> {
        let mut res = [0u8; N];
        res.copy_from_slice(self.take(N, field)?);
        Ok(res)
    }

    fn read_u32(&mut self, field: &str) -> PollResult<u32> {
        Ok(u32::from_le_bytes(self.read_array(field)?))
    }

    fn read_u64(&mut self, field: &str) -> PollResult<u64> {
        Ok(u64::from_le_bytes(self.read_array(field)?))
    }

    fn read_length(&mut self, field: &str) -> PollResult<usize> {
        let mut value: u64 = 0;
        for idx in 0..MAX_LENGTH_PREFIX_BYTES {
            let [byte] = self.read_array::<1>(field)?;
            value |= u64::from(byte & 0x7f) << (7 * idx);
            if byte & 0x80 == 0 {
                ensure!(
                    value <= u64::from(u32::MAX),
                    CorruptDataSnafu {
                        reason: format!("length of {} overflows 32 bits", field)
                    }
                );
                return Ok(value as usize);
            }
        }
        CorruptDataSnafu {
            reason: format!("length prefix of {} is too long", field),
        }
        .fail()
    }

    fn read_string(&mut self, field: &str) -> PollResult<String> {
        let len = self.read_length(field)?;
        let raw = self.take(len, field)?;
        let s = std::str::from_utf8(raw).ok().context(CorruptDataSnafu {
            reason: format!("{} is not valid UTF-8", field),
        })?;
        Ok(s.to_string())
    }
}
