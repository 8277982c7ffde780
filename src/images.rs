use serde::Deserialize;
use tracing::warn;

pub const DEFAULT_TRIP_IMAGE: &str =
    "https://images.unsplash.com/photo-1502602898657-3e91760cbb34?q=80&w=2073&auto=format&fit=crop";

/// Unsplash cover-image lookup for freshly created trips. The key is
/// optional; without one every trip gets the default cover.
#[derive(Clone)]
pub struct ImageSearch {
    client: reqwest::Client,
    access_key: Option<String>,
}

#[derive(Deserialize)]
struct SearchResponse {
    results: Vec<SearchHit>,
}

#[derive(Deserialize)]
struct SearchHit {
    urls: HitUrls,
}

#[derive(Deserialize)]
struct HitUrls {
    regular: String,
}

impl ImageSearch {
    pub fn new(access_key: Option<String>) -> Self {
        ImageSearch {
            client: reqwest::Client::new(),
            access_key,
        }
    }

    /// Cover image for a trip title. Lookup failures fall back to the
    /// default cover; trip creation never fails on this.
    pub async fn image_for(&self, query: &str) -> String {
        let Some(key) = &self.access_key else {
            return DEFAULT_TRIP_IMAGE.to_string();
        };
        match self.search(query, key).await {
            Ok(Some(url)) => url,
            Ok(None) => DEFAULT_TRIP_IMAGE.to_string(),
            Err(err) => {
                warn!("image search for {query:?} failed: {err}");
                DEFAULT_TRIP_IMAGE.to_string()
            }
        }
    }

    async fn search(&self, query: &str, key: &str) -> Result<Option<String>, reqwest::Error> {
        let response = self
            .client
            .get("https://api.unsplash.com/search/photos")
            .query(&[
                ("query", query),
                ("orientation", "landscape"),
                ("per_page", "1"),
                ("client_id", key),
            ])
            .send()
            .await?
            .error_for_status()?
            .json::<SearchResponse>()
            .await?;
        Ok(response
            .results
            .into_iter()
            .next()
            .map(|hit| hit.urls.regular))
    }
}
