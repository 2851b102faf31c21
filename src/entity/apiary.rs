//! Apiaries - named bee-yard locations

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::core::types::ApiaryId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ApiaryStatus {
    #[default]
    Active,
    Inactive,
}

impl fmt::Display for ApiaryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiaryStatus::Active => f.write_str("Active"),
            ApiaryStatus::Inactive => f.write_str("Inactive"),
        }
    }
}

/// A bee yard; deactivated rather than deleted
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Apiary {
    pub id: ApiaryId,
    pub name: String,
    #[serde(default)]
    pub area: String,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub status: ApiaryStatus,
}

impl Apiary {
    pub fn is_active(&self) -> bool {
        self.status == ApiaryStatus::Active
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct NewApiary {
    pub name: String,
    pub area: String,
    pub location: String,
}

impl NewApiary {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiaryUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub area: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<ApiaryStatus>,
}

impl ApiaryUpdate {
    pub fn status(status: ApiaryStatus) -> Self {
        Self {
            status: Some(status),
            ..Self::default()
        }
    }

    pub fn apply_to(&self, apiary: &mut Apiary) {
        if let Some(name) = &self.name {
            apiary.name = name.clone();
        }
        if let Some(area) = &self.area {
            apiary.area = area.clone();
        }
        if let Some(location) = &self.location {
            apiary.location = location.clone();
        }
        if let Some(status) = self.status {
            apiary.status = status;
        }
    }

    /// Audit text for the update; a status change outranks a rename
    pub fn describe(&self, apiary: &Apiary) -> String {
        match self.status.filter(|s| *s != apiary.status) {
            Some(ApiaryStatus::Inactive) => "Deactivated apiary".to_string(),
            Some(ApiaryStatus::Active) => "Activated apiary".to_string(),
            None => match self.name.as_ref().filter(|n| **n != apiary.name) {
                Some(name) => format!("Renamed apiary to {}", name),
                None => "Updated apiary details".to_string(),
            },
        }
    }
}
