/// Data layer: core types, loading, and filtering.
///
/// Architecture:
/// ```text
///  .parquet / .json / .csv
///        │
///        ▼
///   ┌──────────────────┐
///   │ source + cache   │  load → Dataset (TTL + LRU cache, failures → empty)
///   └──────────────────┘
///        │  asymmetries          exercises
///        ▼                          │
///   ┌──────────┐                    │
///   │  filter  │  PredicateSet      │
///   └──────────┘                    │
///        │ scenario labels          ▼
///        └──────────────►  ┌──────────────┐
///                          │   scenario   │  substring cross-reference
///                          └──────────────┘
///                                  │
///                                  ▼
///                          ┌──────────┐
///                          │  filter  │  categorical exercise filters → export
///                          └──────────┘
/// ```
/// `pipeline` runs the whole chain for one request.

pub mod cache;
pub mod error;
pub mod export;
pub mod filter;
pub mod loader;
pub mod model;
pub mod pipeline;
pub mod scenario;
pub mod source;
