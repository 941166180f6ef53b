use serde::Serialize;

use super::repo::{Document, User};

/// Public part of a user returned to clients. The document summary is
/// name and type only; raw bytes are served exclusively by the document
/// endpoint.
#[derive(Debug, Serialize)]
pub struct PublicUser {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub phone_number: i64,
    pub roles: serde_json::Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub document: Option<DocumentSummary>,
}

#[derive(Debug, Serialize)]
pub struct DocumentSummary {
    pub id: i64,
    pub name: String,
    #[serde(rename = "type")]
    pub mime_type: String,
}

impl PublicUser {
    pub fn from_user(user: User) -> Self {
        Self {
            id: user.id,
            name: user.name,
            email: user.email,
            phone_number: user.phone_number,
            roles: user.roles,
            document: None,
        }
    }

    pub fn with_document(user: User, document: Option<Document>) -> Self {
        let summary = document.map(|d| DocumentSummary {
            id: d.id,
            name: d.name,
            mime_type: d.mime_type,
        });
        let mut public = Self::from_user(user);
        public.document = summary;
        public
    }
}

/// Minimal user summary embedded in service responses.
#[derive(Debug, Serialize)]
pub struct UserSummary {
    pub id: i64,
    pub name: String,
    pub email: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::OffsetDateTime;

    fn sample_user() -> User {
        User {
            id: 1,
            name: "Ana".into(),
            email: "ana@example.com".into(),
            phone_number: 11988887777,
            password_hash: "$argon2id$secret".into(),
            roles: serde_json::json!(["user"]),
            created_at: OffsetDateTime::UNIX_EPOCH,
        }
    }

    #[test]
    fn public_user_never_serializes_password_hash() {
        let json = serde_json::to_string(&PublicUser::from_user(sample_user())).unwrap();
        assert!(!json.contains("argon2"));
        assert!(!json.contains("password"));
    }

    #[test]
    fn document_field_is_omitted_when_absent() {
        let json = serde_json::to_string(&PublicUser::from_user(sample_user())).unwrap();
        assert!(!json.contains("document"));
    }

    #[test]
    fn document_summary_carries_name_and_type_only() {
        let doc = Document {
            id: 3,
            name: "foto.png".into(),
            mime_type: "image/png".into(),
            data: vec![1, 2, 3],
            user_id: 1,
        };
        let json =
            serde_json::to_value(PublicUser::with_document(sample_user(), Some(doc))).unwrap();
        assert_eq!(json["document"]["name"], "foto.png");
        assert_eq!(json["document"]["type"], "image/png");
        assert!(json["document"].get("data").is_none());
    }
}
