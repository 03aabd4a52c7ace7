use super::*;
use serde::Deserialize;

const SEARCH_ENDPOINT: &str = "https://www.googleapis.com/youtube/v3/search";
const MUSIC_CATEGORY_ID: &str = "10";

#[derive(Debug, Deserialize)]
struct SearchListResponse {
    #[serde(default)]
    items: Vec<SearchResult>,
}

#[derive(Debug, Deserialize)]
struct SearchResult {
    id: ResourceId,
}

#[derive(Debug, Deserialize)]
struct ResourceId {
    #[serde(rename = "videoId")]
    video_id: Option<String>,
}

impl SearchListResponse {
    fn first_video_url(self) -> Option<String> {
        self.items
            .into_iter()
            .find_map(|item| item.id.video_id)
            .map(|video_id| format!("https://www.youtube.com/watch?v={}", video_id))
    }
}

pub struct YoutubeSearch {
    client: reqwest::Client,
    api_key: String,
    endpoint: String,
}

impl YoutubeSearch {
    pub fn new(api_key: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key,
            endpoint: SEARCH_ENDPOINT.to_string(),
        }
    }
}

#[async_trait]
impl TrackSearch for YoutubeSearch {
    async fn resolve(&self, title: &str) -> Result<String, SearchError> {
        let title = title.trim();
        if title.is_empty() {
            return Err(SearchError::NotFound);
        }
        let response = self
            .client
            .get(&self.endpoint)
            .query(&[
                ("part", "id"),
                ("q", title),
                ("type", "video"),
                ("videoCategoryId", MUSIC_CATEGORY_ID),
                ("maxResults", "1"),
                ("key", self.api_key.as_str()),
            ])
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            return Err(SearchError::Rejected {
                status: status.as_u16(),
            });
        }
        let body: SearchListResponse = response.json().await?;
        body.first_video_url().ok_or(SearchError::NotFound)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(json: &str) -> SearchListResponse {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn builds_watch_url_from_first_video() {
        let body = parse(
            r#"{"kind":"youtube#searchListResponse","items":[
                {"kind":"youtube#searchResult","id":{"kind":"youtube#video","videoId":"dQw4w9WgXcQ"}}
            ]}"#,
        );
        assert_eq!(
            body.first_video_url().as_deref(),
            Some("https://www.youtube.com/watch?v=dQw4w9WgXcQ")
        );
    }

    #[test]
    fn empty_result_is_not_found() {
        assert!(parse(r#"{"items":[]}"#).first_video_url().is_none());
        assert!(parse(r#"{"pageInfo":{"totalResults":0}}"#)
            .first_video_url()
            .is_none());
        assert!(parse(r#"{"items":[{"id":{"kind":"youtube#channel"}}]}"#)
            .first_video_url()
            .is_none());
    }

    #[tokio::test]
    async fn blank_title_is_not_searched() {
        let search = YoutubeSearch::new("key".to_string());
        assert!(matches!(
            search.resolve("   ").await,
            Err(SearchError::NotFound)
        ));
    }
}
