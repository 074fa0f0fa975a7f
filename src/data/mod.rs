//! Static data shipped with the binary.

pub mod prices;

pub use prices::*;
