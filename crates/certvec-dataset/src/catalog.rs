//! Certification and service catalog types

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;

/// Top level of `certifications.json`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CertificationCatalog {
    pub certifications: Vec<Certification>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Certification {
    #[serde(alias = "name")]
    pub certification_name: String,
    #[serde(default)]
    pub skills: Vec<Skill>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Skill {
    pub skill_name: String,
    #[serde(default)]
    pub sub_skills: Vec<String>,
    #[serde(default)]
    pub services: Vec<ServiceRef>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A service as listed under a skill: a bare title before enrichment,
/// title plus description after
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ServiceRef {
    Name(String),
    Detailed(ServiceDetail),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceDetail {
    pub service_name: String,
    pub service_description: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ServiceRef {
    pub fn name(&self) -> &str {
        match self {
            ServiceRef::Name(name) => name,
            ServiceRef::Detailed(detail) => &detail.service_name,
        }
    }

    pub fn description(&self) -> Option<&str> {
        match self {
            ServiceRef::Name(_) => None,
            ServiceRef::Detailed(detail) => detail.service_description.as_deref(),
        }
    }
}

/// One entry of `azure-services.json`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AzureService {
    pub title: String,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Services indexed by exact title
///
/// When titles repeat, the first entry wins.
pub struct ServiceCatalog<'a> {
    by_title: HashMap<&'a str, &'a AzureService>,
}

impl<'a> ServiceCatalog<'a> {
    pub fn new(services: &'a [AzureService]) -> Self {
        let mut by_title = HashMap::with_capacity(services.len());
        for service in services {
            by_title.entry(service.title.as_str()).or_insert(service);
        }
        Self { by_title }
    }

    pub fn lookup(&self, title: &str) -> Option<&'a AzureService> {
        self.by_title.get(title).copied()
    }

    pub fn len(&self) -> usize {
        self.by_title.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_title.is_empty()
    }
}
