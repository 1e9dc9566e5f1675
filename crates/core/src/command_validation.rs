// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Per-command rule pipelines.
//!
//! A command handler builds a [`ValidationPipeline`] listing the rules it
//! needs in order, runs it, and stops unless the outcome is
//! [`ValidationOutcome::Proceed`]. Failing rules that offer a bypass turn
//! into a confirmation request when the caller owns the guild.

use crate::business_rules::BusinessRuleValidationService;
use crate::cross_entity::{CrossEntityValidationService, EntityPayload, EntityType, Operation};
use anarchy_domain::{
    BypassType, GuildId, PermissionContext, ValidationResult, validate_multiple,
};
use tracing::debug;

/// A single named check a command must pass.
pub trait ValidationRule {
    fn name(&self) -> &str;
    fn validate(&self, context: &PermissionContext) -> ValidationResult;
}

/// A rule built from a closure.
pub struct NamedRule<'a> {
    name: String,
    check: Box<dyn Fn(&PermissionContext) -> ValidationResult + 'a>,
}

impl<'a> NamedRule<'a> {
    pub fn new(
        name: impl Into<String>,
        check: impl Fn(&PermissionContext) -> ValidationResult + 'a,
    ) -> Self {
        Self {
            name: name.into(),
            check: Box::new(check),
        }
    }
}

impl ValidationRule for NamedRule<'_> {
    fn name(&self) -> &str {
        &self.name
    }

    fn validate(&self, context: &PermissionContext) -> ValidationResult {
        (self.check)(context)
    }
}

/// A failing rule the guild owner may override.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BypassRequest {
    pub rule_name: String,
    pub bypass_type: BypassType,
    pub errors: Vec<String>,
}

/// The folded result of every rule a command declared.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandValidationResult {
    pub is_valid: bool,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
    pub requires_confirmation: bool,
    pub bypass_requests: Vec<BypassRequest>,
}

/// What a command handler should do next.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationOutcome {
    Proceed { warnings: Vec<String> },
    RequiresConfirmation {
        errors: Vec<String>,
        bypass_requests: Vec<BypassRequest>,
    },
    Denied { errors: Vec<String> },
}

impl CommandValidationResult {
    #[must_use]
    pub fn outcome(self) -> ValidationOutcome {
        if self.is_valid {
            ValidationOutcome::Proceed {
                warnings: self.warnings,
            }
        } else if self.requires_confirmation {
            ValidationOutcome::RequiresConfirmation {
                errors: self.errors,
                bypass_requests: self.bypass_requests,
            }
        } else {
            ValidationOutcome::Denied {
                errors: self.errors,
            }
        }
    }
}

#[derive(Debug, Default)]
pub struct CommandValidationService;

impl CommandValidationService {
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Runs every rule in declared order and folds the results.
    ///
    /// When the combined result fails, any failing rule offers a bypass, and
    /// the caller is the guild owner, the result asks for confirmation
    /// instead of denying. With `accept_bypass` set (the owner already
    /// confirmed) bypassable failures are dropped and only the remaining
    /// failures count.
    pub fn validate_command(
        &self,
        context: &PermissionContext,
        rules: &[Box<dyn ValidationRule + '_>],
        accept_bypass: bool,
    ) -> CommandValidationResult {
        let mut results: Vec<ValidationResult> = Vec::with_capacity(rules.len());
        let mut bypass_requests: Vec<BypassRequest> = Vec::new();

        for rule in rules {
            let result: ValidationResult = rule.validate(context);
            debug!(
                guild_id = %context.guild_id,
                rule = rule.name(),
                valid = result.valid,
                "Evaluated validation rule"
            );
            if !result.valid && result.bypass_available && context.is_guild_owner {
                bypass_requests.push(BypassRequest {
                    rule_name: rule.name().to_string(),
                    bypass_type: result.bypass_type.unwrap_or(BypassType::GuildOwner),
                    errors: result.errors.clone(),
                });
                if accept_bypass {
                    let mut accepted: ValidationResult = ValidationResult::success();
                    accepted.warnings = result.warnings;
                    results.push(accepted);
                    continue;
                }
            }
            results.push(result);
        }

        let combined: ValidationResult = validate_multiple(results);
        let requires_confirmation: bool = !combined.valid
            && !accept_bypass
            && context.is_guild_owner
            && !bypass_requests.is_empty();

        CommandValidationResult {
            is_valid: combined.valid,
            errors: combined.errors,
            warnings: combined.warnings,
            requires_confirmation,
            bypass_requests,
        }
    }
}

/// An ordered list of rules declared by one command.
#[derive(Default)]
pub struct ValidationPipeline<'a> {
    rules: Vec<Box<dyn ValidationRule + 'a>>,
}

impl<'a> ValidationPipeline<'a> {
    #[must_use]
    pub fn new() -> Self {
        Self { rules: Vec::new() }
    }

    #[must_use]
    pub fn rule(mut self, rule: impl ValidationRule + 'a) -> Self {
        self.rules.push(Box::new(rule));
        self
    }

    /// Requires a named permission.
    #[must_use]
    pub fn require_permission(
        self,
        business_rules: &'a BusinessRuleValidationService,
        permission: &'a str,
    ) -> Self {
        self.rule(NamedRule::new(format!("permission:{permission}"), move |ctx| {
            business_rules.validate_permission(ctx, permission).into()
        }))
    }

    /// Requires the cross-entity constraints of an operation to hold.
    #[must_use]
    pub fn require_entity(
        self,
        cross_entity: &'a CrossEntityValidationService,
        entity_type: EntityType,
        operation: Operation,
        payload: EntityPayload,
    ) -> Self {
        self.rule(NamedRule::new(
            format!("entity:{entity_type}:{operation}"),
            move |ctx| {
                let guild_id: &GuildId = &ctx.guild_id;
                cross_entity.validate_before_operation(entity_type, operation, guild_id, &payload)
            },
        ))
    }

    /// Requires an arbitrary business rule.
    #[must_use]
    pub fn require_business_rule(
        self,
        name: &str,
        check: impl Fn(&PermissionContext) -> ValidationResult + 'a,
    ) -> Self {
        self.rule(NamedRule::new(format!("business:{name}"), check))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn run(
        &self,
        service: &CommandValidationService,
        context: &PermissionContext,
        accept_bypass: bool,
    ) -> CommandValidationResult {
        service.validate_command(context, &self.rules, accept_bypass)
    }
}
