/*!
 * Job File Parser
 *
 * Line-oriented text commands:
 *
 * ```text
 * CREATE <event_id> <num_rows> <num_cols>
 * RESERVE <event_id> [(<row>,<col>) (<row>,<col>) ...]
 * SHOW <event_id>
 * LIST
 * WAIT <delay_ms> [worker_id]
 * BARRIER
 * HELP
 * # comment
 * ```
 */

use crate::core::limits::MAX_RESERVATION_SIZE;
use crate::core::types::SeatCoord;
use crate::core::SchedulerError;
use crate::scheduler::{Command, CommandSource};
use std::io::BufRead;
use std::str::FromStr;
use tracing::debug;

/// Parse one line into a command
///
/// Blank lines and `#` comments are `Empty`; anything malformed is
/// `Invalid`. Keywords are upper case.
pub fn parse_line(line: &str) -> Command {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return Command::Empty;
    }

    let (keyword, rest) = match line.split_once(char::is_whitespace) {
        Some((keyword, rest)) => (keyword, rest.trim()),
        None => (line, ""),
    };

    let parsed = match keyword {
        "CREATE" => parse_create(rest),
        "RESERVE" => parse_reserve(rest),
        "SHOW" => parse_show(rest),
        "LIST" if rest.is_empty() => Some(Command::ListEvents),
        "WAIT" => parse_wait(rest),
        "BARRIER" if rest.is_empty() => Some(Command::Barrier),
        "HELP" if rest.is_empty() => Some(Command::Help),
        _ => None,
    };

    parsed.unwrap_or_else(|| {
        debug!(line, "Unparseable command");
        Command::Invalid
    })
}

fn parse_create(rest: &str) -> Option<Command> {
    let mut fields = rest.split_whitespace();
    let event_id = parse_number(fields.next()?)?;
    let rows = parse_number(fields.next()?)?;
    let cols = parse_number(fields.next()?)?;
    if fields.next().is_some() {
        return None;
    }
    Some(Command::Create {
        event_id,
        rows,
        cols,
    })
}

fn parse_reserve(rest: &str) -> Option<Command> {
    let (id, seats) = rest.split_once(char::is_whitespace)?;
    let event_id = parse_number(id)?;
    let inner = seats.trim().strip_prefix('[')?.strip_suffix(']')?;

    let mut coords = Vec::new();
    let mut remaining = inner.trim_start();
    while !remaining.is_empty() {
        let (pair, tail) = remaining.strip_prefix('(')?.split_once(')')?;
        // A second '(' means the previous pair was never closed
        if pair.contains('(') {
            return None;
        }
        let (row, col) = pair.split_once(',')?;
        coords.push(SeatCoord::new(parse_number(row)?, parse_number(col)?));
        if coords.len() > MAX_RESERVATION_SIZE {
            return None;
        }
        remaining = tail.trim_start();
    }

    if coords.is_empty() {
        return None;
    }
    Some(Command::Reserve {
        event_id,
        seats: coords,
    })
}

fn parse_show(rest: &str) -> Option<Command> {
    let mut fields = rest.split_whitespace();
    let event_id = parse_number(fields.next()?)?;
    fields.next().is_none().then_some(Command::Show { event_id })
}

fn parse_wait(rest: &str) -> Option<Command> {
    let mut fields = rest.split_whitespace();
    let delay_ms = parse_number(fields.next()?)?;
    let target_worker = match fields.next() {
        Some(raw) => parse_number(raw)?,
        None => 0,
    };
    if fields.next().is_some() {
        return None;
    }
    Some(Command::Wait {
        delay_ms,
        target_worker,
    })
}

fn parse_number<T: FromStr>(raw: &str) -> Option<T> {
    let raw = raw.trim();
    // Digits only, no signs
    if raw.is_empty() || !raw.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    raw.parse().ok()
}

/// Command source over a text job stream
///
/// A line that is not valid UTF-8 is an `Invalid` command. A read error
/// ends the stream for every reader: the error is returned once, then
/// `EndOfCommands` forever.
pub struct JobReader<R> {
    reader: R,
    line: Vec<u8>,
    line_no: usize,
    exhausted: bool,
}

impl<R: BufRead> JobReader<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            line: Vec::new(),
            line_no: 0,
            exhausted: false,
        }
    }

    /// Lines consumed so far
    pub fn line_no(&self) -> usize {
        self.line_no
    }
}

impl<R: BufRead + Send> CommandSource for JobReader<R> {
    fn next_command(&mut self) -> Result<Command, SchedulerError> {
        if self.exhausted {
            return Ok(Command::EndOfCommands);
        }

        self.line.clear();
        let read = match self.reader.read_until(b'\n', &mut self.line) {
            Ok(read) => read,
            Err(e) => {
                self.exhausted = true;
                return Err(SchedulerError::Source(format!(
                    "line {}: {}",
                    self.line_no + 1,
                    e
                )));
            }
        };

        if read == 0 {
            self.exhausted = true;
            return Ok(Command::EndOfCommands);
        }

        self.line_no += 1;
        match std::str::from_utf8(&self.line) {
            Ok(line) => Ok(parse_line(line)),
            Err(_) => {
                debug!(line_no = self.line_no, "Line is not valid UTF-8");
                Ok(Command::Invalid)
            }
        }
    }
}
