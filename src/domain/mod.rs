pub mod media;
pub mod record;
pub mod slot;
pub mod title;

/// Which way a cursor, the browse preview or the rolodex page moves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Prev,
    Next,
}
