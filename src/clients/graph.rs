use reqwest::header::{CONTENT_TYPE, HeaderValue};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, error, info};

use crate::config::GraphConfig;
use crate::constants::fields;
use crate::error::{HarvestError, Result};
use crate::models::hashtag::HashtagLookup;
use crate::models::post::MediaResponse;

#[derive(Debug, Deserialize)]
struct HashtagSearchResponse {
    #[serde(default)]
    data: Vec<HashtagHit>,
}

#[derive(Debug, Deserialize)]
struct HashtagHit {
    id: String,
}

/// Read-only client for the three Graph API calls the harvester makes.
///
/// Request URLs are assembled by plain concatenation: the field lists in
/// [`fields`] are already percent-encoded and go into the query string as-is.
#[derive(Clone)]
pub struct GraphClient {
    client: Client,
    base_url: String,
    access_token: String,
    business_account_id: String,
}

impl GraphClient {
    pub fn new(config: &GraphConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("hashtag-harvest/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(config.request_timeout_seconds))
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            access_token: config.access_token.clone(),
            business_account_id: config.business_account_id.clone(),
        })
    }

    #[must_use]
    pub fn hashtag_search_url(&self, query: &str) -> String {
        format!(
            "{}/ig_hashtag_search?user_id={}&q={}&access_token={}",
            self.base_url,
            self.business_account_id,
            urlencoding::encode(query),
            self.access_token
        )
    }

    #[must_use]
    pub fn recent_media_url(&self, hashtag_id: &str, limit: u32) -> String {
        format!(
            "{}/{}/recent_media?fields={}&limit={}&transport=cors&user_id={}&access_token={}",
            self.base_url,
            hashtag_id,
            fields::RECENT_MEDIA,
            limit,
            self.business_account_id,
            self.access_token
        )
    }

    #[must_use]
    pub fn business_discovery_url(&self, username: &str, limit: u32) -> String {
        format!(
            "{}/{}?fields=business_discovery.username({})%7Bmedia.limit({})%7B{}%7D%7D&access_token={}",
            self.base_url,
            self.business_account_id,
            username,
            limit,
            fields::BUSINESS_DISCOVERY_MEDIA,
            self.access_token
        )
    }

    /// Resolves a hashtag name to its platform id.
    ///
    /// An empty result set is reported as [`HarvestError::NotFound`].
    pub async fn resolve_hashtag_id(&self, query: &str) -> Result<HashtagLookup> {
        let url = self.hashtag_search_url(query);
        let response: HashtagSearchResponse = self.get_json("ig_hashtag_search", &url).await?;

        let hit = response.data.into_iter().next().ok_or_else(|| {
            HarvestError::NotFound(format!("hashtag search returned no id for '{query}'"))
        })?;

        let lookup = HashtagLookup {
            query: query.to_string(),
            id: hit.id,
        };
        info!(query = %lookup.query, id = %lookup.id, "Resolved hashtag id");
        Ok(lookup)
    }

    pub async fn fetch_recent_media(&self, hashtag_id: &str, limit: u32) -> Result<MediaResponse> {
        let url = self.recent_media_url(hashtag_id, limit);
        self.get_json("recent_media", &url).await
    }

    /// Fetches up to `limit` media items of another business account.
    /// Only the nested `business_discovery.media` object is returned.
    pub async fn fetch_business_discovery(
        &self,
        username: &str,
        limit: u32,
    ) -> Result<MediaResponse> {
        let url = self.business_discovery_url(username, limit);
        let mut body: serde_json::Value = self.get_json("business_discovery", &url).await?;
        debug!(username, "business discovery payload: {}", body);

        body.pointer_mut("/business_discovery/media")
            .map(serde_json::Value::take)
            .ok_or_else(|| {
                HarvestError::NotFound(format!("no business discovery media for '{username}'"))
            })
    }

    async fn get_json<T: DeserializeOwned>(&self, endpoint: &'static str, url: &str) -> Result<T> {
        let response = self
            .client
            .get(url)
            .header(CONTENT_TYPE, HeaderValue::from_static("application/json"))
            .send()
            .await?;

        let status = response.status();
        info!(endpoint, status = status.as_u16(), "Graph API response");

        if !status.is_success() {
            return Err(Self::failure(endpoint, status, response.text().await.unwrap_or_default()));
        }

        Ok(response.json().await?)
    }

    fn failure(endpoint: &'static str, status: StatusCode, body: String) -> HarvestError {
        error!(endpoint, status = status.as_u16(), body = %body, "Graph API request failed");
        HarvestError::HttpFailure {
            endpoint,
            status,
            body,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> GraphClient {
        let config = GraphConfig {
            base_url: "https://graph.facebook.com/v18.0/".to_string(),
            access_token: "TOKEN".to_string(),
            business_account_id: "17841400000000000".to_string(),
            request_timeout_seconds: 5,
        };
        GraphClient::new(&config).unwrap()
    }

    #[test]
    fn test_hashtag_search_url() {
        assert_eq!(
            client().hashtag_search_url("bluebottle"),
            "https://graph.facebook.com/v18.0/ig_hashtag_search?user_id=17841400000000000&q=bluebottle&access_token=TOKEN"
        );
    }

    #[test]
    fn test_recent_media_url_embeds_field_list_and_limit() {
        let url = client().recent_media_url("17843826142012701", 50);
        assert!(url.starts_with(
            "https://graph.facebook.com/v18.0/17843826142012701/recent_media?fields=id%2Cmedia_type%2C"
        ));
        assert!(url.contains("%2Cchildren{id%2Ctimestamp%2Cmedia_url}"));
        assert!(url.contains("&limit=50&transport=cors&user_id=17841400000000000"));
        assert!(url.ends_with("&access_token=TOKEN"));
    }

    #[test]
    fn test_business_discovery_url() {
        let url = client().business_discovery_url("bluebottle", 10);
        assert!(url.starts_with(
            "https://graph.facebook.com/v18.0/17841400000000000?fields=business_discovery.username(bluebottle)%7Bmedia.limit(10)%7Bid%2Cusername%2C"
        ));
        assert!(url.ends_with("%7D%7D&access_token=TOKEN"));
    }
}
