// 📐 Entry Validation - Submission checks
// Validates intake/outtake submissions before they reach the Event Store.
// Every error is recovered at the point of submission and surfaced as a
// rejected entry with a description; nothing here is fatal to the process.

use serde::{Deserialize, Serialize};

use crate::registry::CategoryRegistry;

// ============================================================================
// VALIDATION ERROR
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationError {
    pub field: String,
    pub message: String,
    pub context: String,
}

impl ValidationError {
    pub fn new(field: &str, message: impl Into<String>, context: &str) -> Self {
        ValidationError {
            field: field.to_string(),
            message: message.into(),
            context: context.to_string(),
        }
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}: {}", self.context, self.field, self.message)
    }
}

impl std::error::Error for ValidationError {}

pub type ValidationResult = Result<(), Vec<ValidationError>>;

// ============================================================================
// FIELD CHECKS
// ============================================================================

/// Weight must be strictly positive and finite. Rejected at entry; a
/// stored event never carries a non-positive weight.
pub fn check_positive_weight(field: &str, context: &str, weight_kg: f64) -> Option<ValidationError> {
    if !weight_kg.is_finite() {
        return Some(ValidationError::new(
            field,
            format!("Weight must be a finite number, got {}", weight_kg),
            context,
        ));
    }
    if weight_kg <= 0.0 {
        return Some(ValidationError::new(
            field,
            format!("Weight must be greater than zero, got {}", weight_kg),
            context,
        ));
    }
    None
}

/// Required text field: non-empty after trimming.
pub fn check_required_text(field: &str, context: &str, value: &str) -> Option<ValidationError> {
    if value.trim().is_empty() {
        Some(ValidationError::new(
            field,
            "Required field is empty",
            context,
        ))
    } else {
        None
    }
}

// ============================================================================
// SUBMISSION VALIDATOR
// ============================================================================

/// Entry-form validation against the current Category Registry.
///
/// Registry membership is checked HERE, at submission time only. Events
/// already stored are never re-checked: the registry can grow without
/// invalidating history.
pub struct SubmissionValidator<'a> {
    registry: &'a CategoryRegistry,
}

impl<'a> SubmissionValidator<'a> {
    pub fn new(registry: &'a CategoryRegistry) -> Self {
        SubmissionValidator { registry }
    }

    /// Validate an intake submission, collecting every failure.
    pub fn validate_intake(
        &self,
        recycler: &str,
        origin: &str,
        material: &str,
        weight_kg: f64,
    ) -> ValidationResult {
        let mut errors = Vec::new();

        if let Some(err) = check_positive_weight("Peso_Kg", "Ingreso", weight_kg) {
            errors.push(err);
        }
        if let Some(err) = check_required_text("Reciclador", "Ingreso", recycler) {
            errors.push(err);
        }
        if let Some(err) = check_required_text("Origen", "Ingreso", origin) {
            errors.push(err);
        } else if !self.registry.is_known_origin(origin) {
            errors.push(ValidationError::new(
                "Origen",
                format!("'{}' is not in the accepted origin list", origin),
                "Ingreso",
            ));
        }
        if let Some(err) = check_required_text("Material", "Ingreso", material) {
            errors.push(err);
        } else if !self.registry.is_known_material(material) {
            errors.push(ValidationError::new(
                "Material",
                format!("'{}' is not in the accepted material list", material),
                "Ingreso",
            ));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// Validate an outtake submission, collecting every failure.
    /// The outtake type is already a closed enum, nothing to check there.
    pub fn validate_outtake(&self, buyer: &str, material: &str, weight_kg: f64) -> ValidationResult {
        let mut errors = Vec::new();

        if let Some(err) = check_positive_weight("Peso_Kg", "Salida", weight_kg) {
            errors.push(err);
        }
        if let Some(err) = check_required_text("Comprador", "Salida", buyer) {
            errors.push(err);
        }
        if let Some(err) = check_required_text("Material", "Salida", material) {
            errors.push(err);
        } else if !self.registry.is_known_material(material) {
            errors.push(ValidationError::new(
                "Material",
                format!("'{}' is not in the accepted material list", material),
                "Salida",
            ));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_intake_passes() {
        let registry = CategoryRegistry::with_defaults();
        let validator = SubmissionValidator::new(&registry);

        assert!(validator
            .validate_intake("María", "Entrega Directa", "PET", 12.5)
            .is_ok());
    }

    #[test]
    fn test_bad_weights_rejected() {
        let registry = CategoryRegistry::with_defaults();
        let validator = SubmissionValidator::new(&registry);

        for weight in [0.0, -1.0, f64::NAN, f64::INFINITY] {
            let errors = validator
                .validate_intake("María", "Entrega Directa", "PET", weight)
                .unwrap_err();
            assert_eq!(errors[0].field, "Peso_Kg", "weight {} must fail", weight);
        }
    }

    #[test]
    fn test_unknown_category_rejected_at_entry() {
        let registry = CategoryRegistry::with_defaults();
        let validator = SubmissionValidator::new(&registry);

        let errors = validator
            .validate_intake("María", "Entrega Directa", "Icopor", 5.0)
            .unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field, "Material");

        // Once the registry grows, the same submission passes
        let mut registry = CategoryRegistry::with_defaults();
        registry.add_material("Icopor");
        let validator = SubmissionValidator::new(&registry);
        assert!(validator
            .validate_intake("María", "Entrega Directa", "Icopor", 5.0)
            .is_ok());
    }

    #[test]
    fn test_all_failures_collected() {
        let registry = CategoryRegistry::with_defaults();
        let validator = SubmissionValidator::new(&registry);

        let errors = validator.validate_intake("", "", "", -2.0).unwrap_err();
        // weight + recycler + origin + material
        assert_eq!(errors.len(), 4);

        let display = errors[0].to_string();
        assert!(display.contains("[Ingreso]"));
        assert!(display.contains("Peso_Kg"));
    }

    #[test]
    fn test_outtake_validation() {
        let registry = CategoryRegistry::with_defaults();
        let validator = SubmissionValidator::new(&registry);

        assert!(validator.validate_outtake("EcoCompra SAS", "PET", 80.0).is_ok());

        let errors = validator.validate_outtake("  ", "PET", 80.0).unwrap_err();
        assert_eq!(errors[0].field, "Comprador");
    }
}
