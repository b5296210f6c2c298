use crate::config::EnvConfig;
use crate::models::{
    Bookmark, BookmarkPatch, Dashboard, Group, GroupPatch, NewBookmark, UserProfile,
};
use crate::storage::{clear_token, load_token, save_token};
use crate::store::DashboardStore;
use crate::sync::reconcile::ReorderBatch;
use reqwest::Method;
use serde::{Deserialize, Serialize};
use tracing::debug;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ApiErrorKind {
    Unauthorized,
    NotFound,
    /// Rejected input (400).
    Invalid,
    Network,
    Http,
    Parse,
}

#[derive(Clone, Debug, thiserror::Error)]
#[error("{message}")]
pub struct ApiError {
    pub kind: ApiErrorKind,
    pub message: String,
}

impl ApiError {
    pub fn new(kind: ApiErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    fn network(e: reqwest::Error) -> Self {
        Self::new(ApiErrorKind::Network, e.to_string())
    }

    fn parse(e: impl std::fmt::Display) -> Self {
        Self::new(ApiErrorKind::Parse, e.to_string())
    }

    pub fn unauthorized() -> Self {
        Self::new(ApiErrorKind::Unauthorized, "Unauthorized")
    }

    pub fn not_found(what: &str) -> Self {
        Self::new(ApiErrorKind::NotFound, format!("{what} not found"))
    }

    pub fn invalid(message: impl Into<String>) -> Self {
        Self::new(ApiErrorKind::Invalid, message)
    }

    /// Map a non-2xx status to an error kind.
    pub(crate) fn from_status(status: u16, body: String, ctx: &str) -> Self {
        match status {
            401 | 403 => Self::unauthorized(),
            404 => Self::new(ApiErrorKind::NotFound, format!("{ctx} (404): {body}")),
            400 => Self::new(ApiErrorKind::Invalid, format!("{ctx} (400): {body}")),
            _ => Self::new(ApiErrorKind::Http, format!("{ctx} ({status}): {body}")),
        }
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

#[derive(Serialize, Deserialize, Clone, Debug)]
pub(crate) struct CreateGroupRequest {
    pub name: String,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub(crate) struct ToggleAllRequest {
    pub collapsed: bool,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub(crate) struct UpdateUserRequest {
    pub dashboard_title: String,
}

#[derive(Clone, Debug)]
pub struct ApiClient {
    pub(crate) base_url: String,
    pub(crate) token: Option<String>,
}

impl ApiClient {
    pub fn new(base_url: String) -> Self {
        Self {
            base_url,
            token: None,
        }
    }

    pub fn load_from_storage() -> Self {
        Self {
            base_url: EnvConfig::new().api_url,
            token: load_token(),
        }
    }

    pub fn save_to_storage(&self) {
        if let Some(token) = &self.token {
            save_token(token);
        }
    }

    pub fn set_token(&mut self, token: String) {
        self.token = Some(token);
    }

    pub fn get_token(&self) -> Option<&String> {
        self.token.as_ref()
    }

    pub fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }

    pub fn logout(&mut self) {
        self.token = None;
        clear_token();
    }

    fn get_auth_header(&self) -> Option<String> {
        self.token.as_ref().map(|t| format!("Bearer {t}"))
    }

    pub(crate) fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub(crate) fn group_path(id: &str) -> String {
        format!("/api/groups/{}", urlencoding::encode(id))
    }

    pub(crate) fn bookmark_path(id: &str) -> String {
        format!("/api/bookmarks/{}", urlencoding::encode(id))
    }

    async fn send(
        &self,
        method: Method,
        path: &str,
        body: Option<&impl Serialize>,
    ) -> ApiResult<reqwest::Response> {
        let client = reqwest::Client::new();
        let mut req = client.request(method.clone(), self.url(path));
        if let Some(auth) = self.get_auth_header() {
            req = req.header("Authorization", auth);
        }
        if let Some(b) = body {
            req = req.json(b);
        }

        debug!(%method, path, "api request");
        let res = req.send().await.map_err(ApiError::network)?;

        if res.status().is_success() {
            Ok(res)
        } else {
            let status = res.status().as_u16();
            let body = res.text().await.unwrap_or_default();
            Err(ApiError::from_status(status, body, &format!("{method} {path}")))
        }
    }

    async fn request_json<T: serde::de::DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: Option<&impl Serialize>,
    ) -> ApiResult<T> {
        let res = self.send(method, path, body).await?;
        res.json().await.map_err(ApiError::parse)
    }

    /// For endpoints that answer `204` or a plain-text `OK`.
    async fn request_unit(
        &self,
        method: Method,
        path: &str,
        body: Option<&impl Serialize>,
    ) -> ApiResult<()> {
        self.send(method, path, body).await.map(|_| ())
    }

    pub async fn get_profile(&self) -> ApiResult<UserProfile> {
        self.request_json(Method::GET, "/api/user", None::<&()>).await
    }

    pub async fn get_groups(&self) -> ApiResult<Vec<Group>> {
        self.request_json(Method::GET, "/api/groups", None::<&()>).await
    }
}

impl DashboardStore for ApiClient {
    async fn fetch_dashboard(&self) -> ApiResult<Dashboard> {
        let groups = self.get_groups().await?;
        let profile = self.get_profile().await?;
        Ok(Dashboard::from_groups(profile.dashboard_title, groups))
    }

    async fn create_group(&self, name: &str) -> ApiResult<Group> {
        self.request_json(
            Method::POST,
            "/api/groups",
            Some(&CreateGroupRequest {
                name: name.to_string(),
            }),
        )
        .await
    }

    async fn update_group(&self, id: &str, patch: &GroupPatch) -> ApiResult<Group> {
        self.request_json(Method::PUT, &Self::group_path(id), Some(patch))
            .await
    }

    async fn delete_group(&self, id: &str) -> ApiResult<()> {
        self.request_unit(Method::DELETE, &Self::group_path(id), None::<&()>)
            .await
    }

    async fn set_all_collapsed(&self, collapsed: bool) -> ApiResult<()> {
        self.request_unit(
            Method::POST,
            "/api/groups/toggle-all",
            Some(&ToggleAllRequest { collapsed }),
        )
        .await
    }

    async fn create_bookmark(&self, new: &NewBookmark) -> ApiResult<Bookmark> {
        self.request_json(Method::POST, "/api/bookmarks", Some(new))
            .await
    }

    async fn update_bookmark(&self, id: &str, patch: &BookmarkPatch) -> ApiResult<Bookmark> {
        self.request_json(Method::PUT, &Self::bookmark_path(id), Some(patch))
            .await
    }

    async fn delete_bookmark(&self, id: &str) -> ApiResult<()> {
        self.request_unit(Method::DELETE, &Self::bookmark_path(id), None::<&()>)
            .await
    }

    async fn reorder(&self, batch: &ReorderBatch) -> ApiResult<()> {
        self.request_unit(Method::POST, "/api/reorder", Some(batch))
            .await
    }

    async fn update_title(&self, title: &str) -> ApiResult<()> {
        self.request_unit(
            Method::PUT,
            "/api/user",
            Some(&UpdateUserRequest {
                dashboard_title: title.to_string(),
            }),
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_client_new() {
        let client = ApiClient::new("http://localhost:3000".to_string());
        assert_eq!(client.base_url, "http://localhost:3000");
        assert!(client.token.is_none());
        assert!(!client.is_authenticated());
    }

    #[test]
    fn test_api_client_get_auth_header_with_token() {
        let mut client = ApiClient::new("http://localhost:3000".to_string());
        assert!(client.get_auth_header().is_none());
        client.set_token("my-jwt-token".to_string());
        let header = client.get_auth_header().expect("Should have auth header");
        assert_eq!(header, "Bearer my-jwt-token");
    }

    #[test]
    fn test_item_paths_are_encoded() {
        let client = ApiClient::new("https://board.example".to_string());
        assert_eq!(
            client.url(&ApiClient::group_path("g 1/x")),
            "https://board.example/api/groups/g%201%2Fx"
        );
        assert_eq!(ApiClient::bookmark_path("ckx9"), "/api/bookmarks/ckx9");
    }

    #[test]
    fn test_status_mapping() {
        let ctx = "POST /api/reorder";
        assert_eq!(
            ApiError::from_status(401, String::new(), ctx).kind,
            ApiErrorKind::Unauthorized
        );
        assert_eq!(
            ApiError::from_status(404, "Not Found".to_string(), ctx).kind,
            ApiErrorKind::NotFound
        );
        assert_eq!(
            ApiError::from_status(400, "Invalid items".to_string(), ctx).kind,
            ApiErrorKind::Invalid
        );
        let e = ApiError::from_status(500, "Internal Error".to_string(), ctx);
        assert_eq!(e.kind, ApiErrorKind::Http);
        assert_eq!(e.to_string(), "POST /api/reorder (500): Internal Error");
    }

    #[test]
    fn test_request_bodies_contract() {
        let v = serde_json::to_value(UpdateUserRequest {
            dashboard_title: "Start".to_string(),
        })
        .expect("should serialize");
        assert_eq!(v, serde_json::json!({ "dashboardTitle": "Start" }));

        let v = serde_json::to_value(NewBookmark {
            title: "Rust".to_string(),
            url: "https://rust-lang.org".to_string(),
            group_id: "g1".to_string(),
        })
        .expect("should serialize");
        assert_eq!(v["groupId"], "g1");
    }
}
