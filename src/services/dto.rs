use serde::{Deserialize, Serialize};

use crate::{media::encode_base64, users::dto::UserSummary};

use super::repo::{Category, ServiceDetails};

#[derive(Debug, Deserialize)]
pub struct CreateServiceRequest {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(rename = "timeChronos")]
    pub time_chronos: Option<i32>,
    #[serde(default, rename = "serviceImage")]
    pub service_image: String,
    #[serde(default, rename = "categoryEntities")]
    pub category_entities: Vec<CategoryEntity>,
}

#[derive(Debug, Deserialize)]
pub struct CategoryEntity {
    #[serde(default)]
    pub name: String,
}

/// Full service representation: the image travels as base64 and the owner
/// as a nested summary.
#[derive(Debug, Serialize)]
pub struct ServiceResponse {
    pub id: i64,
    pub title: String,
    pub description: String,
    #[serde(rename = "timeChronos")]
    pub time_chronos: i32,
    #[serde(rename = "serviceImage")]
    pub service_image: String,
    #[serde(rename = "userEntity")]
    pub user_entity: UserSummary,
    #[serde(rename = "categoryEntities")]
    pub category_entities: Vec<Category>,
}

impl ServiceResponse {
    pub fn from_details(details: ServiceDetails) -> Self {
        let ServiceDetails {
            service,
            owner,
            categories,
        } = details;
        Self {
            id: service.id,
            title: service.title,
            description: service.description,
            time_chronos: service.time_chronos,
            service_image: encode_base64(&service.image),
            user_entity: UserSummary {
                id: owner.id,
                name: owner.name,
                email: owner.email,
            },
            category_entities: categories,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{services::repo::Service, users::repo::User};
    use time::OffsetDateTime;

    fn sample_details() -> ServiceDetails {
        ServiceDetails {
            service: Service {
                id: 5,
                title: "Dog walking".into(),
                description: "One hour around the park".into(),
                time_chronos: 2,
                image: vec![0xde, 0xad, 0xbe, 0xef],
                user_id: 1,
                created_at: OffsetDateTime::UNIX_EPOCH,
            },
            owner: User {
                id: 1,
                name: "Ana".into(),
                email: "ana@example.com".into(),
                phone_number: 11988887777,
                password_hash: "$argon2id$secret".into(),
                roles: serde_json::json!(["user"]),
                created_at: OffsetDateTime::UNIX_EPOCH,
            },
            categories: vec![Category {
                id: 3,
                name: "Pets".into(),
            }],
        }
    }

    #[test]
    fn response_uses_camel_case_wire_names() {
        let json = serde_json::to_value(ServiceResponse::from_details(sample_details())).unwrap();
        assert_eq!(json["timeChronos"], 2);
        assert!(json["serviceImage"].is_string());
        assert_eq!(json["userEntity"]["email"], "ana@example.com");
        assert_eq!(json["categoryEntities"][0]["name"], "Pets");
    }

    #[test]
    fn image_is_base64_of_stored_bytes() {
        let resp = ServiceResponse::from_details(sample_details());
        assert_eq!(resp.service_image, "3q2+7w==");
    }

    #[test]
    fn owner_summary_excludes_credentials() {
        let json = serde_json::to_string(&ServiceResponse::from_details(sample_details())).unwrap();
        assert!(!json.contains("argon2"));
        assert!(!json.contains("phone_number"));
    }

    #[test]
    fn create_request_parses_category_entities() {
        let req: CreateServiceRequest = serde_json::from_str(
            r#"{"title":"t","description":"d","timeChronos":3,
                "serviceImage":"aGk=","categoryEntities":[{"name":"Cleaning"}]}"#,
        )
        .unwrap();
        assert_eq!(req.time_chronos, Some(3));
        assert_eq!(req.category_entities[0].name, "Cleaning");
    }

    #[test]
    fn create_request_defaults_optional_parts() {
        let req: CreateServiceRequest =
            serde_json::from_str(r#"{"title":"t","description":"d"}"#).unwrap();
        assert!(req.time_chronos.is_none());
        assert!(req.category_entities.is_empty());
        assert!(req.service_image.is_empty());
    }
}
