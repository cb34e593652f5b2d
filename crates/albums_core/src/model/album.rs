//! Album domain model.
//!
//! # Responsibility
//! - Define the canonical album record exposed over HTTP and stored in SQLite.
//! - Define create/patch inputs and the merge rules between them.
//!
//! # Invariants
//! - `id` is assigned exactly once, by the store, at creation.
//! - `id < 1` never identifies a persisted album.
//! - Prices are kept at cent precision.
//! - Patch fields are applied only when present; `Some("")` and `Some(0.0)`
//!   are real values, not "missing".

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Store-assigned row identifier.
pub type AlbumId = i64;

/// Maximum title length accepted by the `album.title` column.
pub const TITLE_MAX_CHARS: usize = 128;
/// Maximum artist length accepted by the `album.artist` column.
pub const ARTIST_MAX_CHARS: usize = 255;
/// Largest absolute value representable by `DECIMAL(5,2)`.
pub const PRICE_MAX_ABS: f64 = 999.99;

/// Canonical album record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Album {
    /// Zero until the store assigns an id on insert.
    pub id: AlbumId,
    pub title: String,
    pub artist: String,
    pub price: f64,
    /// Legacy row version. Not persisted, not serialized, not read by any
    /// operation.
    #[serde(skip)]
    pub version: i32,
}

impl Album {
    /// Creates an unsaved album (`id == 0`) with a cent-rounded price.
    pub fn new(title: impl Into<String>, artist: impl Into<String>, price: f64) -> Self {
        Self {
            id: 0,
            title: title.into(),
            artist: artist.into(),
            price: round_price(price),
            version: 0,
        }
    }

    /// Returns whether this album has been assigned a store id.
    pub fn is_persisted(&self) -> bool {
        self.id >= 1
    }

    /// Validates fields against the column constraints of the `album` table.
    ///
    /// Empty titles and artists are accepted; only length and price range are
    /// checked.
    pub fn validate(&self) -> Result<(), AlbumValidationError> {
        let title_chars = self.title.chars().count();
        if title_chars > TITLE_MAX_CHARS {
            return Err(AlbumValidationError::TitleTooLong {
                chars: title_chars,
                max: TITLE_MAX_CHARS,
            });
        }

        let artist_chars = self.artist.chars().count();
        if artist_chars > ARTIST_MAX_CHARS {
            return Err(AlbumValidationError::ArtistTooLong {
                chars: artist_chars,
                max: ARTIST_MAX_CHARS,
            });
        }

        if !self.price.is_finite() || self.price.abs() > PRICE_MAX_ABS {
            return Err(AlbumValidationError::PriceOutOfRange(self.price));
        }

        Ok(())
    }
}

/// Validation failures for album writes.
#[derive(Debug, Clone, PartialEq)]
pub enum AlbumValidationError {
    TitleTooLong { chars: usize, max: usize },
    ArtistTooLong { chars: usize, max: usize },
    PriceOutOfRange(f64),
}

impl Display for AlbumValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::TitleTooLong { chars, max } => {
                write!(f, "title must be at most {max} characters, got {chars}")
            }
            Self::ArtistTooLong { chars, max } => {
                write!(f, "artist must be at most {max} characters, got {chars}")
            }
            Self::PriceOutOfRange(price) => {
                write!(f, "price must be a finite value within ±{PRICE_MAX_ABS}, got {price}")
            }
        }
    }
}

impl Error for AlbumValidationError {}

/// Create input. Every field is required.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NewAlbum {
    pub title: String,
    pub artist: String,
    pub price: f64,
}

impl NewAlbum {
    /// Converts create input into an unsaved album.
    pub fn into_album(self) -> Album {
        Album::new(self.title, self.artist, self.price)
    }
}

/// Partial update input.
///
/// `None` means "not provided". Any `Some` value, including an empty string
/// or a zero price, replaces the stored value.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AlbumPatch {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub artist: Option<String>,
    #[serde(default)]
    pub price: Option<f64>,
}

impl AlbumPatch {
    /// Returns whether no field was provided.
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.artist.is_none() && self.price.is_none()
    }

    /// Overlays provided fields onto `album`. `id` is never touched.
    pub fn apply_to(&self, album: &mut Album) {
        if let Some(title) = &self.title {
            album.title = title.clone();
        }
        if let Some(artist) = &self.artist {
            album.artist = artist.clone();
        }
        if let Some(price) = self.price {
            album.price = round_price(price);
        }
    }
}

/// Rounds a price to cent precision, half away from zero.
pub fn round_price(price: f64) -> f64 {
    (price * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::{round_price, Album, AlbumPatch};

    #[test]
    fn round_price_keeps_two_fraction_digits() {
        assert_eq!(round_price(9.994), 9.99);
        assert_eq!(round_price(9.996), 10.0);
        assert_eq!(round_price(-4.251), -4.25);
        assert_eq!(round_price(0.0), 0.0);
    }

    #[test]
    fn empty_patch_leaves_album_unchanged() {
        let mut album = Album::new("Kid A", "Radiohead", 11.5);
        let before = album.clone();
        let patch = AlbumPatch::default();

        assert!(patch.is_empty());
        patch.apply_to(&mut album);
        assert_eq!(album, before);
    }
}
