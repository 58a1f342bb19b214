use serde::Serialize;
use utoipa::ToSchema;

/// A medical specialty from the backend-managed registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
pub struct Specialty {
    /// Stable snake_case key stored on prompts and reports (e.g. "emergency_medicine")
    pub key: &'static str,
    /// Human-readable name used in prompts and titles
    pub name: &'static str,
}

/// All valid specialties. This is the single source of truth.
const SPECIALTY_REGISTRY: &[Specialty] = &[
    Specialty {
        key: "general",
        name: "General Medicine",
    },
    Specialty {
        key: "cardiology",
        name: "Cardiology",
    },
    Specialty {
        key: "radiology",
        name: "Radiology",
    },
    Specialty {
        key: "neurology",
        name: "Neurology",
    },
    Specialty {
        key: "oncology",
        name: "Oncology",
    },
    Specialty {
        key: "pediatrics",
        name: "Pediatrics",
    },
    Specialty {
        key: "orthopedics",
        name: "Orthopedics",
    },
    Specialty {
        key: "gastroenterology",
        name: "Gastroenterology",
    },
    Specialty {
        key: "pulmonology",
        name: "Pulmonology",
    },
    Specialty {
        key: "dermatology",
        name: "Dermatology",
    },
    Specialty {
        key: "emergency_medicine",
        name: "Emergency Medicine",
    },
    Specialty {
        key: "psychiatry",
        name: "Psychiatry",
    },
];

/// Look up a specialty by key.
pub fn find(key: &str) -> Option<Specialty> {
    SPECIALTY_REGISTRY.iter().copied().find(|s| s.key == key)
}

/// Check whether the given key is in the registry.
pub fn is_known(key: &str) -> bool {
    find(key).is_some()
}

/// Display name for a key, falling back to the key itself
pub fn display_name(key: &str) -> &str {
    find(key).map(|s| s.name).unwrap_or(key)
}

/// Return all registered specialties.
pub fn all() -> Vec<Specialty> {
    SPECIALTY_REGISTRY.to_vec()
}
