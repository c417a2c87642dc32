use serde::{Deserialize, Serialize};
use sysinfo::System;

/// Static information about a model available for install.
/// Replaced wholesale on each catalog refresh, never mutated.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ModelDescriptor {
    /// Unique identifier within the catalog (e.g. "llama3.2:1b")
    pub id: String,
    pub size_mb: u32,
    /// Qualitative speed label shown in the picker
    pub speed: String,
    /// Qualitative quality label shown in the picker
    pub quality: String,
    pub notes: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SystemInfo {
    pub total_ram_gb: f64,
    pub available_ram_gb: f64,
    pub cpu_cores: usize,
    pub os: String,
}

pub fn system_info() -> SystemInfo {
    let mut sys = System::new_all();
    sys.refresh_all();

    let total_ram = sys.total_memory() as f64 / 1_073_741_824.0;
    let available_ram = sys.available_memory() as f64 / 1_073_741_824.0;

    SystemInfo {
        // Round to 1 decimal
        total_ram_gb: (total_ram * 10.0).round() / 10.0,
        available_ram_gb: (available_ram * 10.0).round() / 10.0,
        cpu_cores: sys.cpus().len(),
        os: std::env::consts::OS.to_string(),
    }
}

/// Pick a catalog model for this machine based on RAM headroom.
pub fn recommend_model(info: &SystemInfo) -> &'static str {
    if info.total_ram_gb < 8.0 {
        // Low RAM systems
        if info.available_ram_gb > 2.0 {
            "gemma2:2b"
        } else {
            "qwen2.5:0.5b"
        }
    } else if info.total_ram_gb < 16.0 {
        // Mid-range systems (8-16GB) - DEFAULT
        "llama3.2:1b"
    } else {
        // High-end systems get the best quality model
        "qwen2.5:1.5b"
    }
}

/// Hardcoded catalog of enhancement models the daemon can pull.
pub fn model_catalog() -> Vec<ModelDescriptor> {
    vec![
        ModelDescriptor {
            id: "gemma2:2b".to_string(),
            size_mb: 270,
            speed: "Fastest".to_string(),
            quality: "Good".to_string(),
            notes: "Best for low RAM systems (< 8GB)".to_string(),
        },
        ModelDescriptor {
            id: "qwen2.5:0.5b".to_string(),
            size_mb: 500,
            speed: "Very Fast".to_string(),
            quality: "Good".to_string(),
            notes: "Ultra lightweight option".to_string(),
        },
        ModelDescriptor {
            id: "llama3.2:1b".to_string(),
            size_mb: 1000,
            speed: "Fast".to_string(),
            quality: "Excellent".to_string(),
            notes: "Recommended default - best balance".to_string(),
        },
        ModelDescriptor {
            id: "gemma2:1b".to_string(),
            size_mb: 1000,
            speed: "Fast".to_string(),
            quality: "Very Good".to_string(),
            notes: "Alternative 1B model".to_string(),
        },
        ModelDescriptor {
            id: "qwen2.5:1.5b".to_string(),
            size_mb: 1500,
            speed: "Moderate".to_string(),
            quality: "Best".to_string(),
            notes: "Highest quality (16GB+ RAM recommended)".to_string(),
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn info(total: f64, available: f64) -> SystemInfo {
        SystemInfo {
            total_ram_gb: total,
            available_ram_gb: available,
            cpu_cores: 8,
            os: "macos".to_string(),
        }
    }

    #[test]
    fn test_catalog_ids_are_unique() {
        let catalog = model_catalog();
        for (i, entry) in catalog.iter().enumerate() {
            assert!(
                !catalog[i + 1..].iter().any(|other| other.id == entry.id),
                "duplicate catalog id: {}",
                entry.id
            );
        }
    }

    #[test]
    fn test_recommendations_are_in_catalog() {
        let catalog = model_catalog();
        for (total, available) in [(4.0, 3.0), (4.0, 1.0), (8.0, 4.0), (16.0, 8.0), (32.0, 20.0)]
        {
            let id = recommend_model(&info(total, available));
            assert!(
                catalog.iter().any(|m| m.id == id),
                "recommended '{}' not in catalog",
                id
            );
        }
    }

    #[test]
    fn test_recommendation_ram_thresholds() {
        assert_eq!(recommend_model(&info(4.0, 3.0)), "gemma2:2b");
        assert_eq!(recommend_model(&info(4.0, 1.5)), "qwen2.5:0.5b");
        assert_eq!(recommend_model(&info(8.0, 4.0)), "llama3.2:1b");
        assert_eq!(recommend_model(&info(15.9, 8.0)), "llama3.2:1b");
        assert_eq!(recommend_model(&info(16.0, 8.0)), "qwen2.5:1.5b");
    }
}
