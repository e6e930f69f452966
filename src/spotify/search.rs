use reqwest::Method;
use tracing::debug;

use crate::{
    error::Result,
    spotify::{SpotifyClient, decode::decode_search_response, validate_limit},
    types::{AlbumArt, Song},
};

impl SpotifyClient {
    /// Searches tracks matching `query`. `limit` must be within 1..=50.
    pub async fn search(&self, query: &str, limit: u32) -> Result<Vec<Song>> {
        validate_limit(limit)?;

        let res = self
            .request(
                Method::GET,
                "/search",
                &[
                    ("q", query.to_string()),
                    ("type", "track".to_string()),
                    ("limit", limit.to_string()),
                ],
                None,
            )
            .await?
            .into_result()?;

        let songs = decode_search_response(&res.body)?;
        debug!(query, hits = songs.len(), "search finished");
        Ok(songs)
    }

    /// Downloads a cover image. Image CDN urls need no authorization.
    pub async fn load_album_art(&self, url: &str) -> Result<AlbumArt> {
        let bytes = self
            .http()
            .get(url)
            .send()
            .await?
            .error_for_status()?
            .bytes()
            .await?;
        Ok(AlbumArt::new(bytes.to_vec()))
    }
}
