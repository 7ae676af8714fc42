pub mod artists;
pub mod settings;

pub use artists::{ArtistConfig, artists_for, get_artists};
pub use settings::AppConfig;
