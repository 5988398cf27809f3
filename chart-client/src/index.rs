use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;

/// One chart from a repository index, normalized for the lookup response.
///
/// Summary fields come from the first version entry that carries a non-empty
/// value for them; `versions` always mirrors the full entry list in document
/// order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChartRecord {
    pub chart: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub home: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    pub sources: Vec<String>,
    pub versions: Vec<VersionRecord>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VersionRecord {
    pub version: String,
    /// `None` when the manifest date is not RFC 3339; serialized as `null`
    /// instead of being defaulted away.
    #[serde(with = "time::serde::rfc3339::option")]
    pub created: Option<OffsetDateTime>,
}

/// Raw `index.yaml` document. The map keeps document order, which is also
/// the order of the normalized output.
#[derive(Debug, Deserialize)]
pub struct HelmIndex {
    pub entries: IndexMap<String, Vec<HelmEntry>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HelmEntry {
    #[serde(default)]
    pub home: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub icon: Option<String>,
    #[serde(default)]
    pub sources: Vec<String>,
    pub version: String,
    pub created: String,
}

impl HelmIndex {
    pub fn charts(self) -> Vec<ChartRecord> {
        self.entries
            .into_iter()
            .map(|(chart, entries)| ChartRecord::from_entries(chart, entries))
            .collect()
    }
}

impl ChartRecord {
    fn from_entries(chart: String, entries: Vec<HelmEntry>) -> Self {
        ChartRecord {
            home: lookup(&entries, |e| e.home.as_deref()),
            description: lookup(&entries, |e| e.description.as_deref()),
            icon: lookup(&entries, |e| e.icon.as_deref()),
            sources: entries
                .iter()
                .find(|e| !e.sources.is_empty())
                .map(|e| e.sources.clone())
                .unwrap_or_default(),
            versions: entries.into_iter().map(VersionRecord::from).collect(),
            chart,
        }
    }
}

/// First non-empty value for one summary field. Each field is scanned on its
/// own, so different entries may supply different fields.
fn lookup<'a>(
    entries: &'a [HelmEntry],
    field: impl Fn(&'a HelmEntry) -> Option<&'a str>,
) -> Option<String> {
    entries
        .iter()
        .filter_map(field)
        .find(|value| !value.is_empty())
        .map(str::to_string)
}

impl From<HelmEntry> for VersionRecord {
    fn from(entry: HelmEntry) -> Self {
        VersionRecord {
            created: OffsetDateTime::parse(&entry.created, &Rfc3339).ok(),
            version: entry.version,
        }
    }
}
