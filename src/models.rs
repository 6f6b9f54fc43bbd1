use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// Account owning sessions, keys and bookmarks
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub created_at: DateTime<Utc>,
}

/// Input for creating a user; the id is generated when absent
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NewUser {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
}

/// Authentication session. Expiry values are epoch milliseconds written by
/// the authenticator and stored verbatim.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub id: String,
    pub user_id: String,
    pub active_expires: i64,
    pub idle_expires: i64,
}

/// Renewal payload for a session
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SessionUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub active_expires: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub idle_expires: Option<i64>,
}

impl SessionUpdate {
    pub fn is_empty(&self) -> bool {
        self.active_expires.is_none() && self.idle_expires.is_none()
    }
}

/// Credential record, id is usually `<provider>:<identifier>`
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Key {
    pub id: String,
    pub user_id: String,
    #[serde(default)]
    pub hashed_password: Option<String>,
}

impl Key {
    pub fn new(provider: &str, identifier: &str, user_id: &str) -> Self {
        Self {
            id: format!("{}:{}", provider, identifier),
            user_id: user_id.to_string(),
            hashed_password: None,
        }
    }

    pub fn with_hashed_password(mut self, hashed_password: String) -> Self {
        self.hashed_password = Some(hashed_password);
        self
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Bookmark {
    pub id: String,
    pub url: String,
    pub tags: Option<Vec<String>>,
    pub collection: Option<String>,
    pub user_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Insert payload. `url` stays optional here so that a missing url is
/// reported as a constraint violation rather than a decode failure.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NewBookmark {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub tags: Option<Vec<String>>,
    #[serde(default)]
    pub collection: Option<String>,
    #[serde(default)]
    pub user_id: Option<String>,
}

impl NewBookmark {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: Some(url.into()),
            ..Self::default()
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = Some(tags.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_collection(mut self, collection: impl Into<String>) -> Self {
        self.collection = Some(collection.into());
        self
    }

    pub fn with_user_id(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = Some(user_id.into());
        self
    }
}

/// Partial update for a bookmark. Outer `None` leaves the column untouched,
/// `Some(None)` clears a nullable column. `id` and `createdAt` are immutable.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BookmarkPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(
        default,
        deserialize_with = "deserialize_present",
        skip_serializing_if = "Option::is_none"
    )]
    pub tags: Option<Option<Vec<String>>>,
    #[serde(
        default,
        deserialize_with = "deserialize_present",
        skip_serializing_if = "Option::is_none"
    )]
    pub collection: Option<Option<String>>,
    #[serde(
        default,
        deserialize_with = "deserialize_present",
        skip_serializing_if = "Option::is_none"
    )]
    pub user_id: Option<Option<String>>,
}

impl BookmarkPatch {
    pub fn url(url: impl Into<String>) -> Self {
        Self {
            url: Some(url.into()),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.url.is_none()
            && self.tags.is_none()
            && self.collection.is_none()
            && self.user_id.is_none()
    }
}

/// Maps a present JSON field (including `null`) to `Some(..)`
fn deserialize_present<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Tag catalog entry. Defined in the schema, not reachable through CRUD yet.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Tag {
    pub id: String,
    pub name: String,
}

/// Bookmark/tag junction row, inert like [`Tag`]
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct BookmarkTag {
    pub bookmark_id: String,
    pub tag_id: String,
}

/// Result descriptor of an UPDATE or DELETE
#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct WriteResult {
    pub rows_affected: u64,
}

impl WriteResult {
    pub fn new(rows_affected: u64) -> Self {
        Self { rows_affected }
    }
}

/// Result descriptor of an INSERT, carrying the (possibly generated) id
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct InsertResult {
    pub id: String,
    pub rows_affected: u64,
}

/// Optional window over the bookmark listing
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub limit: u32,
    pub offset: u32,
}
