pub mod dispersion;
pub mod divergence;
pub mod relativize;
pub mod ties;
pub mod types;

pub use dispersion::ControversyIndex;
pub use divergence::{DivergenceMatrix, DivergenceReport};
pub use relativize::relativize;
pub use ties::resolve_ties;
pub use types::{ItemId, Rank, RankMap, RankedSubmission};
