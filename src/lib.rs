//! Emission line atlas: a canonical catalog of UV/optical emission lines
//! with vacuum/air wavelength conversion and a search/sort query engine.

pub mod data;

pub use data::model::{EmissionLine, LineCatalog};
pub use data::query::{run_query, LineView, QueryResult, QuerySpec, SortDirection, SortKey, SortSpec};
pub use data::wavelength::{air_to_vacuum, display_wavelength, vacuum_to_air, ConversionError, Medium};
