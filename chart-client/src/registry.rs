use serde::Deserialize;
use tokio::sync::OnceCell;
use tracing::debug;
use url::Url;

use crate::error::LookupError;
use crate::index::ChartRecord;

/// Chart listing for a registry-backed repository.
///
/// Tag enumeration works, but nothing maps a tag onto chart metadata yet.
/// `NotImplemented` keeps that distinct from a repository that really has no
/// charts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistryListing {
    Charts(Vec<ChartRecord>),
    NotImplemented(TagList),
}

/// `GET /v2/<name>/tags/list` response.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TagList {
    pub name: String,
    #[serde(default)]
    pub tags: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct RegistryErrors {
    #[serde(default)]
    errors: Vec<RegistryError>,
}

#[derive(Debug, Deserialize)]
struct RegistryError {
    message: String,
}

/// Anonymous client for one repository of an OCI-distribution registry.
#[derive(Debug)]
pub struct RegistryClient {
    http_client: reqwest::Client,
    registry_url: Url,
    name: String,
    session: OnceCell<()>,
}

impl RegistryClient {
    /// `oci://registry.example.com/my/charts` becomes registry
    /// `https://registry.example.com` with repository name `my/charts`.
    pub fn new(http_client: reqwest::Client, repo_url: &Url) -> Result<Self, LookupError> {
        let rewritten = repo_url.as_str().replacen("oci:", "https:", 1);
        let registry_url = Url::parse(&rewritten).map_err(LookupError::invalid_data)?;
        let name = registry_url.path().trim_start_matches('/').to_string();
        Ok(RegistryClient {
            http_client,
            registry_url,
            name,
            session: OnceCell::new(),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Anonymous reachability check against the registry API root.
    pub async fn ping(&self) -> Result<reqwest::Response, LookupError> {
        let mut url = self.registry_url.clone();
        url.set_path("/v2/");
        url.set_query(None);
        Ok(self.http_client.get(url).send().await?)
    }

    fn make_scope(resource: &str, name: &str, actions: &[&str]) -> String {
        format!("{}:{}:{}", resource, name, actions.join(","))
    }

    /// Token scope for pulling this repository. Built for the login flow but
    /// not sent anywhere while only anonymous access is supported.
    pub fn pull_scope(&self) -> String {
        Self::make_scope("repository", &self.name, &["pull"])
    }

    /// Establish the anonymous session once per client.
    async fn login(&self) -> Result<(), LookupError> {
        self.session
            .get_or_try_init(|| async {
                let scope = self.pull_scope();
                debug!(%scope, name = %self.name, "Anonymous registry login");
                self.ping().await?;
                Ok::<_, LookupError>(())
            })
            .await?;
        Ok(())
    }

    fn tags_url(&self) -> Url {
        let mut url = self.registry_url.clone();
        url.set_query(None);
        url.path_segments_mut()
            .expect("Base url")
            .clear()
            .push("v2")
            .extend(self.name.split('/'))
            .extend(["tags", "list"]);
        url
    }

    /// List the repository's tags.
    ///
    /// Registry errors come back as a JSON payload with one message per
    /// error; those are joined into the upstream error message.
    pub async fn list_tags(&self) -> Result<TagList, LookupError> {
        self.login().await?;

        let resp = self.http_client.get(self.tags_url()).send().await?;
        if !resp.status().is_success() {
            let message = match resp.json::<RegistryErrors>().await {
                Ok(payload) if !payload.errors.is_empty() => payload
                    .errors
                    .into_iter()
                    .map(|e| e.message)
                    .collect::<Vec<_>>()
                    .join("\n"),
                _ => "unknown".to_string(),
            };
            return Err(LookupError::Upstream(message));
        }

        resp.json().await.map_err(LookupError::invalid_data)
    }

    /// Chart listing for this repository.
    ///
    /// Tags are enumerated but not resolved into chart records.
    // TODO: fetch each tag's manifest and map it onto a ChartRecord once the
    // metadata layout is settled.
    pub async fn charts(&self) -> Result<RegistryListing, LookupError> {
        let tags = self.list_tags().await?;
        debug!(name = %tags.name, tags = ?tags.tags, "Registry tags without chart mapping");
        Ok(RegistryListing::NotImplemented(tags))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(repo: &str) -> RegistryClient {
        RegistryClient::new(reqwest::Client::new(), &Url::parse(repo).unwrap()).unwrap()
    }

    #[test]
    fn oci_url_splits_into_registry_and_name() {
        let registry = client("oci://registry.example.com/suse-edge/charts");
        assert_eq!(registry.name(), "suse-edge/charts");
        assert_eq!(registry.registry_url.as_str(), "https://registry.example.com/suse-edge/charts");
    }

    #[test]
    fn tags_url_keeps_nested_repository_segments() {
        let registry = client("oci://registry.example.com/suse-edge/charts");
        assert_eq!(
            registry.tags_url().as_str(),
            "https://registry.example.com/v2/suse-edge/charts/tags/list"
        );
    }

    #[test]
    fn tags_url_drops_caller_query() {
        let registry = client("oci://registry.example.com/charts?plain=1");
        assert_eq!(
            registry.tags_url().as_str(),
            "https://registry.example.com/v2/charts/tags/list"
        );
    }

    #[test]
    fn pull_scope_names_the_repository() {
        let registry = client("oci://registry.example.com/suse-edge/charts");
        assert_eq!(registry.pull_scope(), "repository:suse-edge/charts:pull");
    }

    #[test]
    fn error_payload_messages_are_joined() {
        let payload: RegistryErrors = serde_json::from_str(
            r#"{"errors":[
                {"code":"NAME_UNKNOWN","message":"repository name not known to registry"},
                {"code":"UNAUTHORIZED","message":"authentication required"}
            ]}"#,
        )
        .unwrap();
        let message = payload
            .errors
            .into_iter()
            .map(|e| e.message)
            .collect::<Vec<_>>()
            .join("\n");
        assert_eq!(
            message,
            "repository name not known to registry\nauthentication required"
        );
    }
}
