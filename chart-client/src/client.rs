use url::Url;

use crate::error::LookupError;
use crate::index::{ChartRecord, HelmIndex};

/// HTTP(S) chart repository client.
#[derive(Debug, Clone)]
pub struct ChartClient {
    http_client: reqwest::Client,
}

impl ChartClient {
    pub fn new() -> Result<Self, LookupError> {
        let http_client = reqwest::Client::builder().build()?;
        Ok(ChartClient { http_client })
    }

    /// The underlying transport, shared with the registry client.
    pub fn http_client(&self) -> reqwest::Client {
        self.http_client.clone()
    }

    /// Fetch `index_url` and normalize the YAML manifest into chart records.
    ///
    /// A non-success status surfaces the upstream status text; anything wrong
    /// with the body itself collapses into [`LookupError::InvalidData`].
    pub async fn http_index(&self, index_url: &Url) -> Result<Vec<ChartRecord>, LookupError> {
        let resp = self.http_client.get(index_url.clone()).send().await?;
        if !resp.status().is_success() {
            let reason = resp.status().canonical_reason().unwrap_or("Chart not found");
            return Err(LookupError::Upstream(reason.to_string()));
        }

        let text = resp.text().await.map_err(LookupError::invalid_data)?;
        let index: HelmIndex = serde_yaml::from_str(&text).map_err(LookupError::invalid_data)?;
        Ok(index.charts())
    }
}
