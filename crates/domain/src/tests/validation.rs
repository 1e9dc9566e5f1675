// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use crate::{BypassType, DomainError, ValidationResult, validate_case_title, validate_multiple};

#[test]
fn test_validate_multiple_of_nothing_is_valid() {
    let combined: ValidationResult = validate_multiple(Vec::new());

    assert!(combined.valid);
    assert!(combined.errors.is_empty());
    assert!(!combined.bypass_available);
    assert_eq!(combined.bypass_type, None);
}

#[test]
fn test_validate_multiple_surfaces_bypass_from_second_result() {
    let a: ValidationResult = ValidationResult::success();
    let b: ValidationResult =
        ValidationResult::failure("Role limit reached").with_bypass(BypassType::GuildOwner);

    let combined: ValidationResult = validate_multiple([a, b.clone()]);

    assert!(!combined.valid);
    assert_eq!(combined.errors, b.errors);
    assert!(combined.bypass_available);
    assert_eq!(combined.bypass_type, Some(BypassType::GuildOwner));
}

#[test]
fn test_validate_multiple_preserves_error_and_warning_order() {
    let mut first: ValidationResult = ValidationResult::failure("first error");
    first.add_warning("first warning");
    let mut second: ValidationResult = ValidationResult::failure("second error");
    second.add_warning("second warning");

    let combined: ValidationResult = validate_multiple([first, second]);

    assert_eq!(combined.errors, vec!["first error", "second error"]);
    assert_eq!(combined.warnings, vec!["first warning", "second warning"]);
}

#[test]
fn test_validate_multiple_reports_guild_owner_even_for_admin_bypass() {
    let admin_bypass: ValidationResult =
        ValidationResult::failure("denied").with_bypass(BypassType::Admin);

    let combined: ValidationResult = validate_multiple([admin_bypass]);

    assert_eq!(combined.bypass_type, Some(BypassType::GuildOwner));
}

#[test]
fn test_warnings_alone_do_not_invalidate() {
    let mut result: ValidationResult = ValidationResult::success();
    result.add_warning("approaching limit");

    let combined: ValidationResult = validate_multiple([result]);

    assert!(combined.valid);
    assert_eq!(combined.warnings.len(), 1);
}

#[test]
fn test_validate_case_title_rejects_blank() {
    assert!(matches!(
        validate_case_title("   "),
        Err(DomainError::InvalidCaseTitle(_))
    ));
}

#[test]
fn test_validate_case_title_rejects_overlong() {
    let title: String = "x".repeat(201);
    assert!(validate_case_title(&title).is_err());
    assert!(validate_case_title(&"x".repeat(200)).is_ok());
}
