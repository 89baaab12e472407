//! Policy inspection.

use std::path::Path;

use keepsake_core::policy::CustomizationPolicy;
use tracing::info;

use super::{CommandError, read_yaml};

/// Load a policy file, or the default policy when no path is given.
///
/// # Errors
///
/// Returns an error if the file cannot be read, parsed, or validated.
pub fn load(path: Option<&Path>) -> Result<CustomizationPolicy, CommandError> {
    let policy = match path {
        Some(path) => read_yaml(path)?,
        None => CustomizationPolicy::default(),
    };
    policy.validate()?;
    Ok(policy)
}

/// Validate a policy file.
///
/// # Errors
///
/// Returns the first problem found in the file.
pub fn validate(path: &Path) -> Result<(), CommandError> {
    info!(path = %path.display(), "Validating policy");

    let policy = load(Some(path))?;
    info!(
        max_image_bytes = policy.images.max_bytes,
        max_images = policy.images.max_count,
        free_delivery_threshold = ?policy.pricing.delivery.free_threshold,
        "Policy is valid"
    );
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn test_partial_policy_keeps_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"images:\n  max_count: 3\n").unwrap();

        let policy = load(Some(file.path())).unwrap();
        assert_eq!(policy.images.max_count, 3);
        assert_eq!(
            policy.pricing.delivery.standard,
            CustomizationPolicy::default().pricing.delivery.standard
        );
    }

    #[test]
    fn test_negative_gift_wrap_fails() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"pricing:\n  surcharges:\n    gift_wrap: -5\n")
            .unwrap();

        assert!(matches!(
            validate(file.path()),
            Err(CommandError::Policy(_))
        ));
    }
}
