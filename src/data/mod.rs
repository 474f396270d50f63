/// Data layer: conversion, normalization, loading, and querying.
///
/// Architecture:
/// ```text
///  .html / .csv / .tsv / raw .json
///        │
///        ▼
///   ┌──────────┐
///   │  ingest   │  scrape table → Vec<RawRow>
///   └──────────┘
///        │
///        ▼
///   ┌───────────┐
///   │ normalize  │  RawRow → EmissionLine, sort, ids 1..N
///   └───────────┘      ▲
///        │             │ .parquet / canonical .json
///        ▼             │
///   ┌─────────────┐  ┌──────────┐
///   │ LineCatalog  │◄─│  loader   │
///   └─────────────┘  └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  query    │  medium + QuerySpec → filtered, sorted LineViews
///   └──────────┘
///        ▲
///   ┌────────────┐
///   │ wavelength  │  vacuum ⇄ air
///   └────────────┘
/// ```

pub mod ingest;
pub mod loader;
pub mod model;
pub mod normalize;
pub mod query;
pub mod text;
pub mod wavelength;
