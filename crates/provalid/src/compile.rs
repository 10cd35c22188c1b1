//! Schema compilation.
//!
//! `compile` turns a [`SchemaSet`] into an immutable [`CompiledSchema`]:
//! built-in rules are checked for kind compatibility, `pattern` regexes
//! are precompiled, and every custom expression rule is parsed and bound
//! against the schema's types. All schema errors surface here; a
//! compiled schema validates instances without ever failing on rule
//! configuration.
//!
//! Compilation happens once per schema version. The compiled value is
//! safe for concurrent use: validation only reads it.

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use regex::Regex;

use provalid_cel::bind::bind_predicate;
use provalid_cel::ext::{format_registry, FORMAT_DECLARATIONS};
use provalid_cel::stdlib::{standard_registry, STANDARD_DECLARATIONS};
use provalid_cel::{
    parse, Expr, ExprType, FunctionDecl, FunctionRegistry, MessageValue, Program, SpannedExpr,
    Timestamp,
};
use provalid_schema::{FieldKind, FieldRules, MessageDescriptor, Rule, SchemaSet};

use crate::error::{SchemaError, ValidateError};
use crate::validator::Validator;
use crate::violations::ValidationResult;

/// A schema compiled for validation.
///
/// Immutable and safe for concurrent read-only use; share it with `Arc`
/// across as many parallel validation calls as needed.
pub struct CompiledSchema {
    schema: SchemaSet,
    messages: HashMap<Arc<str>, CompiledMessage>,
    patterns: HashMap<String, Regex>,
    functions: Arc<FunctionRegistry>,
}

/// A message with its compiled rule programs.
pub(crate) struct CompiledMessage {
    pub(crate) descriptor: Arc<MessageDescriptor>,
    /// Per-field custom rule programs, parallel to `descriptor.fields`.
    pub(crate) field_rules: Vec<Vec<CompiledRule>>,
    /// Message-level rule programs.
    pub(crate) message_rules: Vec<CompiledRule>,
}

/// A bound custom rule ready for evaluation.
pub(crate) struct CompiledRule {
    pub(crate) id: Arc<str>,
    pub(crate) message: Arc<str>,
    pub(crate) program: Program,
    /// Fields the expression reads without a `has()` guard. The rule is
    /// skipped while any of them is absent.
    pub(crate) unguarded: Vec<Arc<str>>,
}

impl CompiledSchema {
    /// Validate a message instance against this schema.
    ///
    /// Fails only when the instance's type is not part of the schema.
    /// Well-formed-but-invalid instances produce non-empty results,
    /// never errors.
    pub fn validate(&self, instance: &MessageValue) -> Result<ValidationResult, ValidateError> {
        self.validate_at(instance, provalid_cel::eval::time::now())
    }

    /// Validate with an explicit evaluation timestamp.
    ///
    /// `now` is what the time-relative rules (`lt_now`, `within`, the
    /// expression binding `now`) compare against; [`validate`] reads the
    /// wall clock once per call. With a fixed `now`, validation is a
    /// pure function of (schema, instance, now).
    ///
    /// [`validate`]: CompiledSchema::validate
    pub fn validate_at(
        &self,
        instance: &MessageValue,
        now: Timestamp,
    ) -> Result<ValidationResult, ValidateError> {
        let compiled = self
            .messages
            .get(instance.type_name())
            .ok_or_else(|| ValidateError::UnknownType(instance.type_name().to_string()))?;

        Ok(Validator::new(self, now).validate_message(compiled, instance))
    }

    /// Whether the schema contains the given message type.
    pub fn contains_type(&self, full_name: &str) -> bool {
        self.messages.contains_key(full_name)
    }

    /// The underlying schema set.
    pub fn schema(&self) -> &SchemaSet {
        &self.schema
    }

    pub(crate) fn compiled_message(&self, full_name: &str) -> Option<&CompiledMessage> {
        self.messages.get(full_name)
    }

    /// A precompiled `pattern` regex. Present for every pattern the
    /// schema mentions; compilation rejected the schema otherwise.
    pub(crate) fn pattern(&self, pattern: &str) -> Option<&Regex> {
        self.patterns.get(pattern)
    }

    /// The function registry threaded through this schema.
    ///
    /// Every compiled rule program dispatches against this registry;
    /// there is no global registry to mutate.
    pub fn functions(&self) -> &Arc<FunctionRegistry> {
        &self.functions
    }
}

impl std::fmt::Debug for CompiledSchema {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompiledSchema")
            .field("messages", &self.messages.len())
            .field("patterns", &self.patterns.len())
            .finish()
    }
}

/// Compile a schema set with the built-in function libraries.
pub fn compile(schema: SchemaSet) -> Result<CompiledSchema, SchemaError> {
    compile_with_functions(schema, HashMap::new(), FunctionRegistry::new())
}

/// Compile a schema set with additional custom functions available to
/// rule expressions, merged over the standard and format libraries.
///
/// Custom functions bind like built-ins: declarations drive the binder,
/// implementations drive evaluation, and both live in the compiled
/// schema value rather than any global registry.
pub fn compile_with_functions(
    schema: SchemaSet,
    extra_declarations: HashMap<String, FunctionDecl>,
    extra_functions: FunctionRegistry,
) -> Result<CompiledSchema, SchemaError> {
    let mut registry = build_registry();
    registry.merge(extra_functions);
    let functions = Arc::new(registry);

    let mut declarations = build_declarations();
    declarations.extend(extra_declarations);

    let mut messages = HashMap::new();
    let mut patterns = HashMap::new();

    for descriptor in schema.messages() {
        let compiled = compile_message(descriptor, &schema, &declarations, &functions, &mut patterns)?;
        messages.insert(descriptor.full_name.clone(), compiled);
    }

    Ok(CompiledSchema {
        schema,
        messages,
        patterns,
        functions,
    })
}

/// The evaluation registry: standard library plus format predicates,
/// threaded through the compiled schema rather than held globally.
fn build_registry() -> FunctionRegistry {
    let mut registry = standard_registry();
    registry.merge(format_registry());
    registry
}

fn build_declarations() -> HashMap<String, FunctionDecl> {
    let mut declarations = STANDARD_DECLARATIONS.clone();
    declarations.extend(
        FORMAT_DECLARATIONS
            .iter()
            .map(|(name, decl)| (name.to_string(), decl.clone())),
    );
    declarations
}

fn compile_message(
    descriptor: &Arc<MessageDescriptor>,
    schema: &SchemaSet,
    declarations: &HashMap<String, FunctionDecl>,
    functions: &Arc<FunctionRegistry>,
    patterns: &mut HashMap<String, Regex>,
) -> Result<CompiledMessage, SchemaError> {
    let message_name = descriptor.full_name.to_string();

    let mut field_rules = Vec::with_capacity(descriptor.fields.len());

    for field in &descriptor.fields {
        check_kind_resolution(&message_name, &field.name, &field.kind, schema)?;

        if let Some(rules) = &field.rules {
            check_rules(&message_name, &field.name, &field.kind, rules, patterns)?;
        }

        let compiled = compile_rules(
            &message_name,
            &field.name,
            &field.cel_rules,
            field.kind.expr_type(),
            schema,
            declarations,
            functions,
            // Field rules only run on set fields; no unguarded analysis
            None,
        )?;
        field_rules.push(compiled);
    }

    let message_rules = compile_rules(
        &message_name,
        "message",
        &descriptor.cel_rules,
        ExprType::Message(descriptor.full_name.clone()),
        schema,
        declarations,
        functions,
        Some(descriptor.as_ref()),
    )?;

    Ok(CompiledMessage {
        descriptor: descriptor.clone(),
        field_rules,
        message_rules,
    })
}

/// Verify that message- and enum-typed references resolve in the schema.
fn check_kind_resolution(
    message: &str,
    field: &str,
    kind: &FieldKind,
    schema: &SchemaSet,
) -> Result<(), SchemaError> {
    match kind {
        FieldKind::Message(name) => {
            if schema.message(name).is_none() {
                return Err(SchemaError::UnknownMessageType {
                    message: message.to_string(),
                    field: field.to_string(),
                    name: name.to_string(),
                });
            }
        }
        FieldKind::Enum(name) => {
            if schema.get_enum(name).is_none() {
                return Err(SchemaError::UnknownEnumType {
                    message: message.to_string(),
                    field: field.to_string(),
                    name: name.to_string(),
                });
            }
        }
        FieldKind::Repeated(elem) => check_kind_resolution(message, field, elem, schema)?,
        FieldKind::Map(_, value) => check_kind_resolution(message, field, value, schema)?,
        _ => {}
    }
    Ok(())
}

/// Check built-in rule/kind compatibility and precompile patterns.
fn check_rules(
    message: &str,
    field: &str,
    kind: &FieldKind,
    rules: &FieldRules,
    patterns: &mut HashMap<String, Regex>,
) -> Result<(), SchemaError> {
    let mismatch = |rules: &'static str| SchemaError::RuleTypeMismatch {
        message: message.to_string(),
        field: field.to_string(),
        rules,
        kind: kind.expr_type().display_name(),
    };

    match (rules, kind) {
        (FieldRules::None, _) => Ok(()),
        (FieldRules::Bool(_), FieldKind::Bool) => Ok(()),
        (FieldRules::Int(_), FieldKind::Int) => Ok(()),
        (FieldRules::UInt(_), FieldKind::UInt) => Ok(()),
        (FieldRules::Double(_), FieldKind::Double) => Ok(()),
        (FieldRules::String(string_rules), FieldKind::String) => {
            if let Some(pattern) = &string_rules.pattern {
                compile_pattern(message, field, pattern, patterns)?;
            }
            Ok(())
        }
        (FieldRules::Bytes(bytes_rules), FieldKind::Bytes) => {
            if let Some(pattern) = &bytes_rules.pattern {
                compile_pattern(message, field, pattern, patterns)?;
            }
            Ok(())
        }
        (FieldRules::Enum(_), FieldKind::Enum(_)) => Ok(()),
        (FieldRules::Timestamp(_), FieldKind::Timestamp) => Ok(()),
        (FieldRules::Duration(_), FieldKind::Duration) => Ok(()),
        (FieldRules::Any(_), FieldKind::Any) => Ok(()),
        (FieldRules::Repeated(repeated), FieldKind::Repeated(elem)) => {
            if repeated.unique && !elem.is_scalar() {
                return Err(SchemaError::UniqueOnMessageItems {
                    message: message.to_string(),
                    field: field.to_string(),
                });
            }
            if let Some(items) = &repeated.items {
                check_rules(message, field, elem, items, patterns)?;
            }
            Ok(())
        }
        (FieldRules::Map(map), FieldKind::Map(key, value)) => {
            if let Some(keys) = &map.keys {
                check_rules(message, field, &key.field_kind(), keys, patterns)?;
            }
            if let Some(values) = &map.values {
                check_rules(message, field, value, values, patterns)?;
            }
            Ok(())
        }
        (FieldRules::Bool(_), _) => Err(mismatch("bool")),
        (FieldRules::Int(_), _) => Err(mismatch("int64")),
        (FieldRules::UInt(_), _) => Err(mismatch("uint64")),
        (FieldRules::Double(_), _) => Err(mismatch("double")),
        (FieldRules::String(_), _) => Err(mismatch("string")),
        (FieldRules::Bytes(_), _) => Err(mismatch("bytes")),
        (FieldRules::Enum(_), _) => Err(mismatch("enum")),
        (FieldRules::Repeated(_), _) => Err(mismatch("repeated")),
        (FieldRules::Map(_), _) => Err(mismatch("map")),
        (FieldRules::Timestamp(_), _) => Err(mismatch("timestamp")),
        (FieldRules::Duration(_), _) => Err(mismatch("duration")),
        (FieldRules::Any(_), _) => Err(mismatch("any")),
    }
}

fn compile_pattern(
    message: &str,
    field: &str,
    pattern: &str,
    patterns: &mut HashMap<String, Regex>,
) -> Result<(), SchemaError> {
    if patterns.contains_key(pattern) {
        return Ok(());
    }
    let regex = Regex::new(pattern).map_err(|source| SchemaError::InvalidPattern {
        message: message.to_string(),
        field: field.to_string(),
        source,
    })?;
    patterns.insert(pattern.to_string(), regex);
    Ok(())
}

/// Parse and bind a rule set. `unguarded_against` is the enclosing
/// message for message-level rules; field-level rules pass `None`.
#[allow(clippy::too_many_arguments)]
fn compile_rules(
    message: &str,
    target: &str,
    rules: &[Rule],
    this_type: ExprType,
    schema: &SchemaSet,
    declarations: &HashMap<String, FunctionDecl>,
    functions: &Arc<FunctionRegistry>,
    unguarded_against: Option<&MessageDescriptor>,
) -> Result<Vec<CompiledRule>, SchemaError> {
    let mut seen_ids = BTreeSet::new();
    let mut compiled = Vec::with_capacity(rules.len());

    let mut variables = HashMap::new();
    variables.insert("this".to_string(), this_type);
    variables.insert("now".to_string(), ExprType::Timestamp);

    for rule in rules {
        if !seen_ids.insert(rule.id.as_str()) {
            return Err(SchemaError::DuplicateRuleId {
                message: message.to_string(),
                target: target.to_string(),
                id: rule.id.clone(),
            });
        }

        let expr = parse(&rule.expression).map_err(|e| SchemaError::ExpressionParse {
            message: message.to_string(),
            id: rule.id.clone(),
            detail: e.to_string(),
        })?;

        let bound = bind_predicate(&expr, &variables, declarations, schema);
        if !bound.is_ok() {
            return Err(SchemaError::ExpressionBind {
                message: message.to_string(),
                id: rule.id.clone(),
                detail: bound
                    .errors
                    .iter()
                    .map(|e| e.to_string())
                    .collect::<Vec<_>>()
                    .join("; "),
            });
        }

        let unguarded = match unguarded_against {
            Some(descriptor) => unguarded_reads(&expr, descriptor),
            None => Vec::new(),
        };

        compiled.push(CompiledRule {
            id: Arc::from(rule.id.as_str()),
            message: Arc::from(rule.message.as_str()),
            program: Program::new(Arc::new(expr), functions.clone()),
            unguarded,
        });
    }

    Ok(compiled)
}

/// Fields a message-level rule reads via `this.f` without any
/// `has(this.f)` test in the same expression. The validator skips the
/// rule while any of them is absent, so reading an absent field never
/// turns into a spurious violation.
fn unguarded_reads(expr: &SpannedExpr, descriptor: &MessageDescriptor) -> Vec<Arc<str>> {
    let mut reads = BTreeSet::new();
    let mut guards = BTreeSet::new();
    collect_this_accesses(expr, &mut reads, &mut guards);

    descriptor
        .fields
        .iter()
        .filter(|f| reads.contains(f.name.as_ref()) && !guards.contains(f.name.as_ref()))
        .map(|f| f.name.clone())
        .collect()
}

fn collect_this_accesses(
    expr: &SpannedExpr,
    reads: &mut BTreeSet<String>,
    guards: &mut BTreeSet<String>,
) {
    match &expr.node {
        Expr::Member { expr: base, field } => {
            if is_this(base) {
                reads.insert(field.clone());
            }
            collect_this_accesses(base, reads, guards);
        }
        Expr::Has { expr: base, field } => {
            if is_this(base) {
                guards.insert(field.clone());
            }
            collect_this_accesses(base, reads, guards);
        }
        Expr::List(elements) => {
            for elem in elements {
                collect_this_accesses(elem, reads, guards);
            }
        }
        Expr::Map(entries) => {
            for (key, value) in entries {
                collect_this_accesses(key, reads, guards);
                collect_this_accesses(value, reads, guards);
            }
        }
        Expr::Unary { expr: operand, .. } => collect_this_accesses(operand, reads, guards),
        Expr::Binary { left, right, .. } => {
            collect_this_accesses(left, reads, guards);
            collect_this_accesses(right, reads, guards);
        }
        Expr::Ternary {
            cond,
            then_expr,
            else_expr,
        } => {
            collect_this_accesses(cond, reads, guards);
            collect_this_accesses(then_expr, reads, guards);
            collect_this_accesses(else_expr, reads, guards);
        }
        Expr::Index { expr: base, index } => {
            collect_this_accesses(base, reads, guards);
            collect_this_accesses(index, reads, guards);
        }
        Expr::Call { target, args, .. } => {
            if let Some(target) = target {
                collect_this_accesses(target, reads, guards);
            }
            for arg in args {
                collect_this_accesses(arg, reads, guards);
            }
        }
        _ => {}
    }
}

fn is_this(expr: &SpannedExpr) -> bool {
    matches!(&expr.node, Expr::Ident(name) if name == "this")
}
