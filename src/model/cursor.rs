//! Search pagination cursor

use std::collections::BTreeMap;
use url::Url;

/// Opaque continuation for a paginated search
///
/// Built from the query string of the service's `next_url`. Only the first value of
/// each key is kept; ordering is by key so two cursors with the same pairs compare
/// equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SearchCursor {
    params: BTreeMap<String, String>,
}

impl SearchCursor {
    /// Extracts a cursor from a next-page URL
    ///
    /// Returns `None` for a missing, unparseable or query-less URL, which the
    /// aggregator treats as the end of pagination.
    ///
    /// # Example
    ///
    /// ```
    /// use pixiv_crawler::SearchCursor;
    ///
    /// let cursor = SearchCursor::from_next_url(
    ///     "https://app-api.pixiv.net/v1/search/illust?word=cat&offset=30",
    /// )
    /// .unwrap();
    /// assert_eq!(cursor.get("offset"), Some("30"));
    /// ```
    pub fn from_next_url(next_url: &str) -> Option<Self> {
        let url = Url::parse(next_url).ok()?;

        let mut params = BTreeMap::new();
        for (key, value) in url.query_pairs() {
            params
                .entry(key.into_owned())
                .or_insert_with(|| value.into_owned());
        }

        if params.is_empty() {
            None
        } else {
            Some(Self { params })
        }
    }

    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            params: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.params.get(key).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.params.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Overlays the cursor's pairs onto `base`, replacing keys that are present in both
    pub fn merge_into(&self, base: &mut BTreeMap<String, String>) {
        for (key, value) in &self.params {
            base.insert(key.clone(), value.clone());
        }
    }
}
