/// Artist/character mapping used by the oshi bias analysis
///
/// Each entry ties an artist (a solo singer or a unit) to the group whose
/// item set holds that artist's songs. Solo entries also name the character
/// the singer voices. Subunit groups missing from this table still count as
/// artists without a character.
#[derive(Debug, Clone, PartialEq)]
pub struct ArtistConfig {
    pub collection: &'static str,
    pub name: &'static str,
    pub group_name: &'static str,
    pub character: Option<&'static str>,
}

impl ArtistConfig {
    pub fn solo(collection: &'static str, name: &'static str, group_name: &'static str, character: &'static str) -> Self {
        Self {
            collection,
            name,
            group_name,
            character: Some(character),
        }
    }

    pub fn unit(collection: &'static str, name: &'static str, group_name: &'static str) -> Self {
        Self {
            collection,
            name,
            group_name,
            character: None,
        }
    }
}

/// Get the artist mapping for every known collection
pub fn get_artists() -> Vec<ArtistConfig> {
    vec![
        ArtistConfig::solo("liella", "Kanon", "Kanon Solos", "Shibuya Kanon"),
        ArtistConfig::solo("liella", "Keke", "Keke Solos", "Tang Keke"),
        ArtistConfig::solo("liella", "Chisato", "Chisato Solos", "Arashi Chisato"),
        ArtistConfig::solo("liella", "Sumire", "Sumire Solos", "Heanna Sumire"),
        ArtistConfig::solo("liella", "Ren", "Ren Solos", "Hazuki Ren"),
        ArtistConfig::solo("liella", "Kinako", "Kinako Solos", "Sakurakoji Kinako"),
        ArtistConfig::solo("liella", "Mei", "Mei Solos", "Yoneme Mei"),
        ArtistConfig::solo("liella", "Shiki", "Shiki Solos", "Wakana Shiki"),
        ArtistConfig::solo("liella", "Natsumi", "Natsumi Solos", "Onitsuka Natsumi"),
        ArtistConfig::solo("liella", "Wien", "Wien Solos", "Wien Margarete"),
        ArtistConfig::unit("liella", "CatChu!", "CatChu!"),
        ArtistConfig::unit("liella", "KALEIDOSCORE", "KALEIDOSCORE"),
        ArtistConfig::unit("liella", "5yncri5e!", "5yncri5e!"),
    ]
}

/// Artists registered for one collection
pub fn artists_for(collection: &str) -> Vec<ArtistConfig> {
    get_artists()
        .into_iter()
        .filter(|a| a.collection == collection)
        .collect()
}
