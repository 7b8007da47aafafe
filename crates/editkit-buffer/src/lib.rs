//! # editkit Buffer
//!
//! Split-buffer byte storage for the editkit editor core.
//!
//! ## Core Components
//!
//! ### Text Storage
//! - **TextBuffer**: two stacks of fixed-size pages split at the cursor
//! - O(1) amortized single-byte insert and delete at the cursor
//! - Random byte reads with a `'\n'` sentinel outside the buffer
//! - Line counting and forward/backward line-offset traversal
//!
//! ### Stream Adapters
//! - **read_into**: block-wise bulk fill with progress/cancel callback
//! - **write_stream**: line-break translating output (`as-is`, Unix,
//!   Windows, Mac)
//!
//! ## Architecture
//!
//! ```text
//! TextBuffer
//!   ├── side1 (pages before the cursor, file order)
//!   ├── side2 (pages after the cursor, reversed)
//!   └── counters (curs1, curs2, lines, curs_line)
//! ```

mod buffer;
pub mod error;
mod io;

pub use buffer::{Offset, TextBuffer, PAGE_SIZE};
pub use error::{BufferError, BufferResult};
pub use io::{read_into, write_stream, LineBreaks, TEMP_BUF_LEN};
