//! Input/output helpers.
//!
//! - raw cell grids read from CSV / XLSX (`grid`)
//! - per-row load outcomes (`rows`)
//! - positional adapters turning grids into observations (`production`, `rail`)
//! - CSV dumps of the working tables (`export`)
//! - JSON results summary (`summary`)

pub mod export;
pub mod grid;
pub mod production;
pub mod rail;
pub mod rows;
pub mod summary;

pub use export::*;
pub use grid::*;
pub use production::*;
pub use rail::*;
pub use rows::*;
pub use summary::*;
