//! Transport and domain shapes for the domain resource.

use serde::{Deserialize, Serialize};

/// An entity as the rest of the crate sees it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DomainEntity {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// An entity as the server sends it. Unknown fields are ignored.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DomainApiResponse {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

/// Payload for `POST /api/domain`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewDomainEntity {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl NewDomainEntity {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// Partial update. `None` fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DomainChanges {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl DomainChanges {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.description.is_none()
    }

    /// Apply to a local copy of an entity.
    pub fn apply_to(&self, entity: &DomainEntity) -> DomainEntity {
        DomainEntity {
            id: entity.id.clone(),
            name: self.name.clone().unwrap_or_else(|| entity.name.clone()),
            description: self
                .description
                .clone()
                .or_else(|| entity.description.clone()),
        }
    }
}

impl From<DomainApiResponse> for DomainEntity {
    fn from(response: DomainApiResponse) -> Self {
        to_domain_entity(response)
    }
}

/// Map the transport shape to the domain shape.
pub fn to_domain_entity(response: DomainApiResponse) -> DomainEntity {
    DomainEntity {
        id: response.id,
        name: response.name,
        description: response.description,
    }
}
