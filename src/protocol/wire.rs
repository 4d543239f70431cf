/*!
 * Binary Wire Layout
 *
 * Fixed little-endian response frames:
 *
 * ```text
 * status: i32                          every response, 0 = ok, 1 = failed
 * SHOW:   rows: u64, cols: u64, seats: [u32; rows * cols]
 * LIST:   count: u64, ids: [u32; count]
 * ```
 *
 * Failed responses (including LIST on an empty store) carry no body.
 */

use crate::core::limits::{WIRE_STATUS_ERR, WIRE_STATUS_OK};
use crate::core::types::{EventId, WorkerId};
use crate::scheduler::{Response, ResponseSink};
use crate::store::GridSnapshot;
use bytes::{Buf, BufMut, Bytes, BytesMut};
use parking_lot::Mutex;
use std::io::{self, Write};
use thiserror::Error;

/// Wire decoding errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WireError {
    #[error("Frame truncated: needed {needed} bytes, {available} left")]
    Truncated { needed: usize, available: usize },

    #[error("Command failed (status {0})")]
    Failed(i32),

    #[error("Frame too large: {0}")]
    TooLarge(u64),
}

/// Encode a response frame; `None` for responses with no wire form
pub fn encode_response(response: &Response) -> Option<Bytes> {
    let mut buf = BytesMut::new();
    match response {
        Response::Created { .. } | Response::Reserved { .. } => buf.put_i32_le(WIRE_STATUS_OK),
        Response::Failed { .. } | Response::Invalid => buf.put_i32_le(WIRE_STATUS_ERR),
        Response::Events { ids } if ids.is_empty() => buf.put_i32_le(WIRE_STATUS_ERR),
        Response::Events { ids } => {
            buf.reserve(4 + 8 + ids.len() * 4);
            buf.put_i32_le(WIRE_STATUS_OK);
            buf.put_u64_le(ids.len() as u64);
            for id in ids {
                buf.put_u32_le(*id);
            }
        }
        Response::Grid(grid) => {
            buf.reserve(4 + 16 + grid.seats.len() * 4);
            buf.put_i32_le(WIRE_STATUS_OK);
            buf.put_u64_le(grid.rows as u64);
            buf.put_u64_le(grid.cols as u64);
            for seat in &grid.seats {
                buf.put_u32_le(*seat);
            }
        }
        Response::Waiting { .. } | Response::Help => return None,
    }
    Some(buf.freeze())
}

fn ensure(buf: &impl Buf, needed: usize) -> Result<(), WireError> {
    if buf.remaining() < needed {
        return Err(WireError::Truncated {
            needed,
            available: buf.remaining(),
        });
    }
    Ok(())
}

/// Read the status word, failing on a non-zero status
pub fn decode_status(buf: &mut impl Buf) -> Result<(), WireError> {
    ensure(buf, 4)?;
    match buf.get_i32_le() {
        WIRE_STATUS_OK => Ok(()),
        status => Err(WireError::Failed(status)),
    }
}

fn decode_len(buf: &mut impl Buf, width: usize) -> Result<usize, WireError> {
    ensure(buf, 8)?;
    let len = buf.get_u64_le();
    let count = usize::try_from(len).map_err(|_| WireError::TooLarge(len))?;
    let bytes = count.checked_mul(width).ok_or(WireError::TooLarge(len))?;
    ensure(buf, bytes)?;
    Ok(count)
}

/// Decode a SHOW frame for `event_id`
pub fn decode_show(mut buf: impl Buf, event_id: EventId) -> Result<GridSnapshot, WireError> {
    decode_status(&mut buf)?;
    ensure(&buf, 16)?;
    let rows = buf.get_u64_le();
    let cols = buf.get_u64_le();
    let len = rows.checked_mul(cols).ok_or(WireError::TooLarge(rows))?;
    let len = usize::try_from(len).map_err(|_| WireError::TooLarge(len))?;
    ensure(&buf, len.checked_mul(4).ok_or(WireError::TooLarge(len as u64))?)?;

    let seats = (0..len).map(|_| buf.get_u32_le()).collect();
    Ok(GridSnapshot {
        event_id,
        rows: rows as usize,
        cols: cols as usize,
        seats,
    })
}

/// Decode a LIST frame
pub fn decode_list(mut buf: impl Buf) -> Result<Vec<EventId>, WireError> {
    decode_status(&mut buf)?;
    let count = decode_len(&mut buf, 4)?;
    Ok((0..count).map(|_| buf.get_u32_le()).collect())
}

/// Sink writing binary frames
pub struct WireSink<W> {
    out: Mutex<W>,
}

impl<W: Write + Send> WireSink<W> {
    pub fn new(out: W) -> Self {
        Self {
            out: Mutex::new(out),
        }
    }

    pub fn into_inner(self) -> W {
        self.out.into_inner()
    }
}

impl<W: Write + Send> ResponseSink for WireSink<W> {
    fn deliver(&self, _worker: WorkerId, response: Response) -> io::Result<()> {
        let Some(frame) = encode_response(&response) else {
            return Ok(());
        };
        let mut out = self.out.lock();
        out.write_all(&frame)?;
        out.flush()
    }
}
