// 🏷️ Category Registry - Versioned, append-only enumerations
// Origins, materials and outtake types accepted by the entry forms.
//
// The registry only gates NEW submissions. Stored events keep whatever
// value was observed at entry, and the aggregation engine groups by that
// observed value - a category removed from the active list never
// invalidates the historical records that carry it.

use serde::{Deserialize, Serialize};

use crate::store::OuttakeType;

// ============================================================================
// CATEGORY REGISTRY
// ============================================================================

/// Read-only lists backing entry-form validation and multiselect filters
/// (which default to "all current values selected").
///
/// Evolution is append-only: adding a category bumps `version`, nothing is
/// ever removed in-session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryRegistry {
    /// Bumped on every append, for consumers that cache the lists
    version: u32,

    /// Collection origins (routes, direct delivery, partner associations)
    origins: Vec<String>,

    /// Material categories accepted at weigh-in/weigh-out
    materials: Vec<String>,

    /// Outtake destination classes
    outtake_types: Vec<OuttakeType>,
}

impl CategoryRegistry {
    /// Empty registry (accepts nothing until categories are added).
    pub fn new() -> Self {
        CategoryRegistry {
            version: 1,
            origins: Vec::new(),
            materials: Vec::new(),
            outtake_types: OuttakeType::all().to_vec(),
        }
    }

    /// Registry seeded with the association's category sets.
    pub fn with_defaults() -> Self {
        let mut registry = CategoryRegistry::new();
        for origin in ["Ruta Selectiva Ibagué", "Entrega Directa", "Otra Asociación"] {
            registry.origins.push(origin.to_string());
        }
        for material in ["PET", "Cartón", "Vidrio", "Archivo", "Metales", "Plegadiza"] {
            registry.materials.push(material.to_string());
        }
        registry
    }

    pub fn version(&self) -> u32 {
        self.version
    }

    pub fn origins(&self) -> &[String] {
        &self.origins
    }

    pub fn materials(&self) -> &[String] {
        &self.materials
    }

    pub fn outtake_types(&self) -> &[OuttakeType] {
        &self.outtake_types
    }

    /// Append a new origin. No-op (and no version bump) if already listed.
    pub fn add_origin(&mut self, origin: impl Into<String>) {
        let origin = origin.into();
        if !self.origins.contains(&origin) {
            self.origins.push(origin);
            self.version += 1;
        }
    }

    /// Append a new material. No-op if already listed.
    pub fn add_material(&mut self, material: impl Into<String>) {
        let material = material.into();
        if !self.materials.contains(&material) {
            self.materials.push(material);
            self.version += 1;
        }
    }

    pub fn is_known_origin(&self, origin: &str) -> bool {
        self.origins.iter().any(|o| o == origin)
    }

    pub fn is_known_material(&self, material: &str) -> bool {
        self.materials.iter().any(|m| m == material)
    }
}

impl Default for CategoryRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

// ============================================================================
// TESTS
// ============================================================================
