/*!
 * Text Rendering
 * Human-readable output for job files
 */

use crate::core::types::WorkerId;
use crate::scheduler::{Response, ResponseSink};
use crate::store::GridSnapshot;
use parking_lot::Mutex;
use std::io::{self, Write};

/// Command summary printed for HELP
pub const HELP_TEXT: &str = concat!(
    "Available commands:\n",
    "  CREATE <event_id> <num_rows> <num_columns>\n",
    "  RESERVE <event_id> [(<x1>,<y1>) (<x2>,<y2>) ...]\n",
    "  SHOW <event_id>\n",
    "  LIST\n",
    "  WAIT <delay_ms> [thread_id]\n",
    "  BARRIER\n",
    "  HELP\n",
);

/// Write the text form of a response
///
/// Successful CREATE/RESERVE and all failures print nothing: failures are
/// reported through tracing instead of the output stream.
pub fn render_text<W: Write + ?Sized>(response: &Response, out: &mut W) -> io::Result<()> {
    match response {
        Response::Grid(grid) => render_grid(grid, out),
        Response::Events { ids } if ids.is_empty() => out.write_all(b"No events\n"),
        Response::Events { ids } => {
            for id in ids {
                writeln!(out, "Event: {}", id)?;
            }
            Ok(())
        }
        Response::Waiting { .. } => out.write_all(b"Waiting...\n"),
        Response::Help => out.write_all(HELP_TEXT.as_bytes()),
        Response::Created { .. }
        | Response::Reserved { .. }
        | Response::Invalid
        | Response::Failed { .. } => Ok(()),
    }
}

/// Rows on separate lines, seats separated by one space
pub fn render_grid<W: Write + ?Sized>(grid: &GridSnapshot, out: &mut W) -> io::Result<()> {
    let mut line = String::with_capacity(grid.cols * 4);
    for row in grid.row_iter() {
        line.clear();
        for (i, seat) in row.iter().enumerate() {
            if i > 0 {
                line.push(' ');
            }
            line.push_str(&seat.to_string());
        }
        line.push('\n');
        out.write_all(line.as_bytes())?;
    }
    Ok(())
}

/// Render a grid to a string
pub fn grid_to_string(grid: &GridSnapshot) -> String {
    let mut out = Vec::new();
    // Writing into a Vec cannot fail
    let _ = render_grid(grid, &mut out);
    String::from_utf8_lossy(&out).into_owned()
}

/// Sink writing the text form of each response
///
/// One response is written and flushed under the sink lock, so output of
/// concurrent workers never interleaves mid-response.
pub struct TextSink<W> {
    out: Mutex<W>,
}

impl<W: Write + Send> TextSink<W> {
    pub fn new(out: W) -> Self {
        Self {
            out: Mutex::new(out),
        }
    }

    pub fn into_inner(self) -> W {
        self.out.into_inner()
    }
}

impl<W: Write + Send> ResponseSink for TextSink<W> {
    fn deliver(&self, _worker: WorkerId, response: Response) -> io::Result<()> {
        let mut out = self.out.lock();
        render_text(&response, &mut *out)?;
        out.flush()
    }
}
