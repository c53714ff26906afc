use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use sustaingraph_core::{GlobalEntity, LocalEntity, StandardCatalog};

/// Entities to lay out: local regulations plus the standard catalog,
/// keyed by family.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    #[serde(default)]
    pub locals: Vec<LocalEntity>,
    #[serde(default)]
    pub standards: StandardCatalog,
}

pub fn load_from_path(path: &Path) -> Result<Dataset> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading dataset {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("parsing dataset {}", path.display()))
}

pub fn load_or_demo(path: Option<&Path>) -> Result<Dataset> {
    match path {
        Some(path) => load_from_path(path),
        None => Ok(demo()),
    }
}

/// Four Indonesian regulations against the GRI, ISSB and SASB topics.
pub fn demo() -> Dataset {
    let locals = vec![
        local("KLHK-001", "Peraturan Emisi 2021", &["emisi", "carbon", "udara"]),
        local("LIM-004", "Limbah B3 2022", &["limbah", "b3", "waste"]),
        local("K3-003", "Keselamatan Kerja 2019", &["k3", "safety", "health"]),
        local("ESDM-002", "Permen Energi 2020", &["energi", "energy", "efisiensi"]),
    ];

    let mut standards = StandardCatalog::new();
    standards.insert(
        "GRI".to_string(),
        vec![
            global("GRI 305", "Emissions"),
            global("GRI 306", "Waste"),
            global("GRI 403", "Occupational Health & Safety"),
            global("GRI 302", "Energy"),
        ],
    );
    standards.insert(
        "ISSB".to_string(),
        vec![
            global("ISSB S2", "Climate-related disclosures"),
            global("ISSB S1", "General Sustainability"),
        ],
    );
    standards.insert(
        "SASB".to_string(),
        vec![
            global("SASB EM-ENERGY", "Energy management"),
            global("SASB WST-MGMT", "Waste management"),
        ],
    );

    Dataset { locals, standards }
}

fn local(id: &str, title: &str, keywords: &[&str]) -> LocalEntity {
    LocalEntity {
        id: id.to_string(),
        title: title.to_string(),
        keywords: keywords.iter().map(|k| k.to_string()).collect(),
    }
}

fn global(id: &str, topic: &str) -> GlobalEntity {
    GlobalEntity {
        id: id.to_string(),
        topic: topic.to_string(),
    }
}
