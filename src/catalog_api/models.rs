//! Track models, both the upstream wire shape and the trimmed form we serve.

use serde::{Deserialize, Serialize};

/// A catalog track, reduced to what the front-end renders.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Track {
    pub id: String,
    pub name: String,
    pub artists: Vec<String>,
    pub album: String,
    pub album_image_url: Option<String>,
    pub preview_url: Option<String>,
    pub external_url: Option<String>,
    pub duration_ms: u64,
}

#[derive(Deserialize)]
pub(super) struct SearchResponse {
    pub tracks: Option<TrackPage>,
}

#[derive(Deserialize)]
pub(super) struct TrackPage {
    #[serde(default)]
    pub items: Vec<ApiTrack>,
}

#[derive(Deserialize)]
pub(super) struct RecommendationsResponse {
    #[serde(default)]
    pub tracks: Vec<ApiTrack>,
}

#[derive(Deserialize)]
pub(super) struct ApiTrack {
    /// Local files carry no id.
    pub id: Option<String>,
    pub name: String,
    #[serde(default)]
    pub artists: Vec<ApiArtist>,
    pub album: Option<ApiAlbum>,
    pub preview_url: Option<String>,
    pub external_urls: Option<ExternalUrls>,
    #[serde(default)]
    pub duration_ms: u64,
}

#[derive(Deserialize)]
pub(super) struct ApiArtist {
    pub name: String,
}

#[derive(Deserialize)]
pub(super) struct ApiAlbum {
    pub name: String,
    #[serde(default)]
    pub images: Vec<ApiImage>,
}

#[derive(Deserialize)]
pub(super) struct ApiImage {
    pub url: String,
}

#[derive(Deserialize)]
pub(super) struct ExternalUrls {
    pub spotify: Option<String>,
}

impl ApiTrack {
    pub fn into_track(self) -> Option<Track> {
        let id = self.id?;
        let (album, album_image_url) = match self.album {
            Some(album) => {
                // Images come largest first.
                let image = album.images.into_iter().next().map(|i| i.url);
                (album.name, image)
            }
            None => (String::new(), None),
        };
        Some(Track {
            id,
            name: self.name,
            artists: self.artists.into_iter().map(|a| a.name).collect(),
            album,
            album_image_url,
            preview_url: self.preview_url,
            external_url: self.external_urls.and_then(|u| u.spotify),
            duration_ms: self.duration_ms,
        })
    }
}

pub(super) fn into_tracks(items: Vec<ApiTrack>) -> Vec<Track> {
    items.into_iter().filter_map(ApiTrack::into_track).collect()
}
