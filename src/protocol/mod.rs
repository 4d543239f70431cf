/*!
 * Protocol Module
 *
 * Job file input and the two output encodings:
 * - Text: human-readable grids and listings
 * - Wire: fixed little-endian binary frames
 */

mod parser;
mod render;
mod wire;

pub use parser::{parse_line, JobReader};
pub use render::{grid_to_string, render_grid, render_text, TextSink, HELP_TEXT};
pub use wire::{decode_list, decode_show, decode_status, encode_response, WireError, WireSink};
