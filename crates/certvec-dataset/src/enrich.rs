//! Join the services catalog into the certifications catalog

use serde::Serialize;
use serde_json::{Map, Value};
use tracing::{info, warn};

use crate::catalog::{AzureService, CertificationCatalog, ServiceCatalog, ServiceDetail, ServiceRef};
use certvec_core::Record;

/// Counts from one enrichment pass
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct EnrichReport {
    pub matched: usize,
    /// Service titles with no catalog entry, in first-seen order
    pub unmatched: Vec<String>,
}

/// Replace every service reference with its title and description.
///
/// Matching is by exact title. A reference without a match gets a `null`
/// description. Detailed references are matched again by name, so running
/// this twice gives the same catalog as running it once.
pub fn enrich(catalog: &mut CertificationCatalog, services: &[AzureService]) -> EnrichReport {
    let lookup = ServiceCatalog::new(services);
    let mut report = EnrichReport::default();

    for certification in &mut catalog.certifications {
        for skill in &mut certification.skills {
            for service in &mut skill.services {
                let name = service.name().to_string();
                let description = match lookup.lookup(&name) {
                    Some(found) => {
                        report.matched += 1;
                        Some(found.content.clone())
                    }
                    None => {
                        if !report.unmatched.contains(&name) {
                            warn!(service = %name, "no catalog entry for service");
                            report.unmatched.push(name.clone());
                        }
                        None
                    }
                };
                let extra = match service {
                    ServiceRef::Detailed(detail) => std::mem::take(&mut detail.extra),
                    ServiceRef::Name(_) => Map::new(),
                };
                *service = ServiceRef::Detailed(ServiceDetail {
                    service_name: name,
                    service_description: description,
                    extra,
                });
            }
        }
    }

    info!(
        matched = report.matched,
        unmatched = report.unmatched.len(),
        "enriched certifications catalog"
    );
    report
}

/// One record per (certification, skill, service).
///
/// Descriptions come from the services catalog, falling back to the one
/// already on the reference; categories come from the services catalog.
pub fn flatten(catalog: &CertificationCatalog, services: &[AzureService]) -> Vec<Record> {
    let lookup = ServiceCatalog::new(services);
    let mut records = Vec::new();

    for certification in &catalog.certifications {
        for skill in &certification.skills {
            for service in &skill.services {
                let found = lookup.lookup(service.name());
                let description = found
                    .map(|s| s.content.as_str())
                    .or_else(|| service.description());
                let category = found.and_then(|s| s.category.as_deref());

                let mut record = Record::new();
                record.insert("certification_name", certification.certification_name.as_str());
                record.insert("skill_name", skill.skill_name.as_str());
                record.insert("service_name", service.name());
                record.insert("service_description", optional(description));
                record.insert("category", optional(category));
                records.push(record);
            }
        }
    }

    info!(records = records.len(), "flattened certifications catalog");
    records
}

fn optional(value: Option<&str>) -> Value {
    value.map_or(Value::Null, Value::from)
}
