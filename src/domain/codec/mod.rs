//! Low-level byte handling shared by every record layout

mod cursor;
mod unpack;

pub use cursor::ByteCursor;
pub use unpack::{unpack_nibbles, NIBBLE_SCALE};
