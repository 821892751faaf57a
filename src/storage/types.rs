use serde::{Deserialize, Serialize};

pub const DEFAULT_CATEGORY: &str = "Uncategorized";
pub const DEFAULT_SEASON: &str = "All";

/// A stored garment as returned by the listing endpoint.
///
/// Server-assigned and never mutated by the client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Garment {
    pub id: i64,
    pub image_url: String,
    pub category: String,
    pub season: String,
}

/// Body of `POST /clothes`; built once per capture, never persisted
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadRequest {
    pub user_id: String,
    pub image_base64: String,
    #[serde(default = "default_category")]
    pub category: String,
    #[serde(default = "default_season")]
    pub season: String,
}

impl UploadRequest {
    pub fn new<U: Into<String>>(user_id: U, image_base64: String) -> Self {
        Self {
            user_id: user_id.into(),
            image_base64,
            category: default_category(),
            season: default_season(),
        }
    }

    pub fn with_category<S: Into<String>>(mut self, category: Option<S>) -> Self {
        if let Some(category) = category {
            self.category = category.into();
        }
        self
    }

    pub fn with_season<S: Into<String>>(mut self, season: Option<S>) -> Self {
        if let Some(season) = season {
            self.season = season.into();
        }
        self
    }
}

/// Body of a successful upload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct UploadResponse {
    #[serde(default)]
    pub message: String,
    pub url: Option<String>,
}

fn default_category() -> String {
    DEFAULT_CATEGORY.to_string()
}

fn default_season() -> String {
    DEFAULT_SEASON.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upload_request_defaults() {
        let request = UploadRequest::new("u1", "AAAA".to_string())
            .with_category(None::<String>)
            .with_season(None::<String>);
        assert_eq!(request.category, "Uncategorized");
        assert_eq!(request.season, "All");

        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["user_id"], "u1");
        assert_eq!(json["image_base64"], "AAAA");
    }

    #[test]
    fn test_upload_request_overrides() {
        let request = UploadRequest::new("u1", String::new())
            .with_category(Some("Top"))
            .with_season(Some("Winter"));
        assert_eq!(request.category, "Top");
        assert_eq!(request.season, "Winter");
    }

    #[test]
    fn test_garment_wire_format() {
        let garments: Vec<Garment> = serde_json::from_str(
            r#"[{"id": 4, "image_url": "https://x/static/uploads/img_1.png", "category": "Top", "season": "All"}]"#,
        )
        .unwrap();
        assert_eq!(garments[0].id, 4);
        assert_eq!(garments[0].category, "Top");
    }

    #[test]
    fn test_upload_response_without_url() {
        let response: UploadResponse = serde_json::from_str(r#"{"message": "saved"}"#).unwrap();
        assert_eq!(response.message, "saved");
        assert!(response.url.is_none());
    }
}
