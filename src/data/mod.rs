/// Data layer: resolution, loading, filtering and aggregation.
///
/// Architecture:
/// ```text
///   dataset filename × base-dir strategies
///        │
///        ▼
///   ┌──────────┐
///   │ resolver │  candidate paths → first existing file
///   └──────────┘
///        │            (or an upload / remote URL)
///        ▼
///   ┌──────────┐
///   │  loader  │  parse CSV → TabularDataset
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐   ┌───────────┐
///   │  filter  │ → │ aggregate │  views → sums, series, group means/counts
///   └──────────┘   └───────────┘
/// ```

pub mod aggregate;
pub mod filter;
pub mod loader;
pub mod model;
pub mod resolver;
