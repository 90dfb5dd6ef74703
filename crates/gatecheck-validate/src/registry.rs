//! A table-driven [`ExecutableValidator`].
//!
//! Constraints are registered per bean type and per executable. Nested
//! values are only descended into when a [`Cascade`] is registered for them.

use crate::constraint::Constraint;
use crate::engine::ExecutableValidator;
use crate::executable::ExecutableId;
use crate::path::{ContainerPosition, PathNode, PropertyPath};
use crate::violation::{ConstraintViolation, ViolationSet};
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};

static NULL: Value = Value::Null;

/// How to descend into a nested value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Cascade {
    /// The value is a bean of the named type.
    Bean(String),
    /// The value is a list (or map) whose items are beans of the named type.
    Elements(String),
}

impl Cascade {
    pub fn bean(type_name: impl Into<String>) -> Self {
        Cascade::Bean(type_name.into())
    }

    pub fn elements(type_name: impl Into<String>) -> Self {
        Cascade::Elements(type_name.into())
    }
}

#[derive(Debug, Clone)]
struct PropertyConstraints {
    name: String,
    rules: Vec<Constraint>,
    cascade: Option<Cascade>,
}

/// Constraints declared on a bean type.
#[derive(Debug, Clone, Default)]
pub struct BeanConstraints {
    class_level: Vec<Constraint>,
    properties: Vec<PropertyConstraints>,
}

impl BeanConstraints {
    pub fn new() -> Self {
        Self::default()
    }

    /// Constraints checked against the whole bean.
    pub fn class_level(mut self, rules: impl IntoIterator<Item = Constraint>) -> Self {
        self.class_level.extend(rules);
        self
    }

    pub fn property(
        mut self,
        name: impl Into<String>,
        rules: impl IntoIterator<Item = Constraint>,
    ) -> Self {
        let name = name.into();
        let rules: Vec<_> = rules.into_iter().collect();
        match self.properties.iter_mut().find(|p| p.name == name) {
            Some(existing) => existing.rules.extend(rules),
            None => self.properties.push(PropertyConstraints {
                name,
                rules,
                cascade: None,
            }),
        }
        self
    }

    pub fn cascade(mut self, name: impl Into<String>, cascade: Cascade) -> Self {
        let name = name.into();
        match self.properties.iter_mut().find(|p| p.name == name) {
            Some(existing) => existing.cascade = Some(cascade),
            None => self.properties.push(PropertyConstraints {
                name,
                rules: Vec::new(),
                cascade: Some(cascade),
            }),
        }
        self
    }
}

#[derive(Debug, Clone, Default)]
struct ParameterConstraints {
    name: Option<String>,
    rules: Vec<Constraint>,
    element_rules: Vec<Constraint>,
    cascade: Option<Cascade>,
}

/// Constraints declared on a method or constructor.
#[derive(Debug, Clone, Default)]
pub struct ExecutableConstraints {
    parameters: BTreeMap<usize, ParameterConstraints>,
    cross_parameter: Vec<Constraint>,
    return_value: Vec<Constraint>,
    return_cascade: Option<Cascade>,
}

impl ExecutableConstraints {
    pub fn new() -> Self {
        Self::default()
    }

    /// Constraints on the parameter at `index`, reported under `name`.
    pub fn parameter(
        mut self,
        index: usize,
        name: impl Into<String>,
        rules: impl IntoIterator<Item = Constraint>,
    ) -> Self {
        let slot = self.parameters.entry(index).or_default();
        slot.name = Some(name.into());
        slot.rules.extend(rules);
        self
    }

    /// Constraints on each element of a list (or map) parameter.
    pub fn parameter_elements(
        mut self,
        index: usize,
        rules: impl IntoIterator<Item = Constraint>,
    ) -> Self {
        self.parameters
            .entry(index)
            .or_default()
            .element_rules
            .extend(rules);
        self
    }

    pub fn cascade_parameter(mut self, index: usize, cascade: Cascade) -> Self {
        self.parameters.entry(index).or_default().cascade = Some(cascade);
        self
    }

    /// Constraints checked against the whole argument list.
    pub fn cross_parameter(mut self, rules: impl IntoIterator<Item = Constraint>) -> Self {
        self.cross_parameter.extend(rules);
        self
    }

    pub fn return_value(mut self, rules: impl IntoIterator<Item = Constraint>) -> Self {
        self.return_value.extend(rules);
        self
    }

    pub fn cascade_return_value(mut self, cascade: Cascade) -> Self {
        self.return_cascade = Some(cascade);
        self
    }
}

/// Reference validation engine backed by registered constraint tables.
///
/// ```rust,ignore
/// let transfer = ExecutableId::method("Bank", "transfer").param("i64");
/// let registry = ConstraintRegistry::new().executable(
///     transfer.clone(),
///     ExecutableConstraints::new().parameter(0, "amount", [Constraint::positive()]),
/// );
///
/// let violations = registry.validate_parameters(&json!({}), &transfer, &[json!(-5)]);
/// assert_eq!(violations.len(), 1);
/// ```
#[derive(Debug, Clone, Default)]
pub struct ConstraintRegistry {
    beans: HashMap<String, BeanConstraints>,
    executables: HashMap<ExecutableId, ExecutableConstraints>,
}

impl ConstraintRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bean(mut self, type_name: impl Into<String>, constraints: BeanConstraints) -> Self {
        self.beans.insert(type_name.into(), constraints);
        self
    }

    pub fn executable(mut self, id: ExecutableId, constraints: ExecutableConstraints) -> Self {
        self.executables.insert(id, constraints);
        self
    }

    pub fn bean_constraints(&self, type_name: &str) -> Option<&BeanConstraints> {
        self.beans.get(type_name)
    }

    pub fn executable_constraints(&self, id: &ExecutableId) -> Option<&ExecutableConstraints> {
        self.executables.get(id)
    }

    /// Validate a standalone bean against its type's constraints.
    pub fn validate_bean(&self, type_name: &str, bean: &Value) -> ViolationSet {
        let mut pass = Pass::new(self, Some(bean));
        pass.bean(type_name, bean, &PropertyPath::from_nodes(vec![PathNode::bean()]));
        pass.finish()
    }

    fn executable_root(id: &ExecutableId) -> PropertyPath {
        let node = if id.is_constructor() {
            PathNode::constructor(id.declaring_type())
        } else {
            PathNode::method(id.name())
        };
        PropertyPath::from_nodes(vec![node])
    }

    fn parameters(
        &self,
        root: Option<&Value>,
        executable: &ExecutableId,
        arguments: &[Value],
    ) -> ViolationSet {
        let Some(constraints) = self.executables.get(executable) else {
            return ViolationSet::new();
        };
        let base = Self::executable_root(executable);
        let mut pass = Pass::new(self, root);

        for (&index, parameter) in &constraints.parameters {
            let value = arguments.get(index).unwrap_or(&NULL);
            let name = parameter
                .name
                .clone()
                .unwrap_or_else(|| format!("arg{}", index));
            let path = base.child(PathNode::parameter(name, index));

            pass.rules(&parameter.rules, value, &path);
            if !parameter.element_rules.is_empty() {
                pass.elements(&parameter.element_rules, value, &path);
            }
            if let Some(cascade) = &parameter.cascade {
                pass.cascade(cascade, value, &path);
            }
        }

        if !constraints.cross_parameter.is_empty() {
            let all = Value::Array(arguments.to_vec());
            pass.rules(
                &constraints.cross_parameter,
                &all,
                &base.child(PathNode::cross_parameter()),
            );
        }

        pass.finish()
    }

    fn return_value_of(
        &self,
        root: Option<&Value>,
        executable: &ExecutableId,
        value: &Value,
    ) -> ViolationSet {
        let path = Self::executable_root(executable).child(PathNode::return_value());
        let mut pass = Pass::new(self, root);

        if let Some(constraints) = self.executables.get(executable) {
            pass.rules(&constraints.return_value, value, &path);
            if let Some(cascade) = &constraints.return_cascade {
                pass.cascade(cascade, value, &path);
            }
        }

        pass.finish()
    }
}

impl ExecutableValidator for ConstraintRegistry {
    fn validate_parameters(
        &self,
        target: &Value,
        method: &ExecutableId,
        arguments: &[Value],
    ) -> ViolationSet {
        self.parameters(Some(target), method, arguments)
    }

    fn validate_return_value(
        &self,
        target: &Value,
        method: &ExecutableId,
        return_value: &Value,
    ) -> ViolationSet {
        self.return_value_of(Some(target), method, return_value)
    }

    fn validate_constructor_parameters(
        &self,
        constructor: &ExecutableId,
        arguments: &[Value],
    ) -> ViolationSet {
        self.parameters(None, constructor, arguments)
    }

    fn validate_constructor_return_value(
        &self,
        constructor: &ExecutableId,
        instance: &Value,
    ) -> ViolationSet {
        let mut violations = self.return_value_of(Some(instance), constructor, instance);

        // The constructed instance always carries its own type's invariants.
        let explicit = self
            .executables
            .get(constructor)
            .and_then(|c| c.return_cascade.as_ref())
            .is_some();
        if !explicit {
            let path = Self::executable_root(constructor).child(PathNode::return_value());
            let mut pass = Pass::new(self, Some(instance));
            pass.bean(constructor.declaring_type(), instance, &path);
            violations.merge(pass.finish());
        }

        violations
    }
}

/// State of one validation call.
struct Pass<'a> {
    registry: &'a ConstraintRegistry,
    root: Option<&'a Value>,
    violations: ViolationSet,
}

impl<'a> Pass<'a> {
    fn new(registry: &'a ConstraintRegistry, root: Option<&'a Value>) -> Self {
        Self {
            registry,
            root,
            violations: ViolationSet::new(),
        }
    }

    fn finish(self) -> ViolationSet {
        self.violations
    }

    fn rules(&mut self, rules: &[Constraint], value: &Value, path: &PropertyPath) {
        for rule in rules {
            if let Err(error) = rule.check(value) {
                self.violations.insert(ConstraintViolation::from_rule_error(
                    &error,
                    rule,
                    path.clone(),
                    self.root.cloned(),
                    value.clone(),
                ));
            }
        }
    }

    fn elements(&mut self, rules: &[Constraint], container: &Value, path: &PropertyPath) {
        for (position, item) in entries(container) {
            let item_path = path.child(PathNode::container_element().at(position));
            self.rules(rules, item, &item_path);
        }
    }

    fn cascade(&mut self, cascade: &Cascade, value: &Value, path: &PropertyPath) {
        match cascade {
            Cascade::Bean(type_name) => self.bean(type_name, value, path),
            Cascade::Elements(type_name) => {
                for (position, item) in entries(value) {
                    self.bean_at(type_name, item, path, Some(position));
                }
            }
        }
    }

    fn bean(&mut self, type_name: &str, value: &Value, path: &PropertyPath) {
        self.bean_at(type_name, value, path, None);
    }

    /// Validate `value` as a bean; `position` locates it inside the
    /// container at `path`.
    fn bean_at(
        &mut self,
        type_name: &str,
        value: &Value,
        path: &PropertyPath,
        position: Option<ContainerPosition>,
    ) {
        let registry = self.registry;
        let Some(constraints) = registry.beans.get(type_name) else {
            return;
        };
        let Value::Object(fields) = value else {
            return;
        };

        let locate = |node: PathNode| match &position {
            Some(position) => node.at(position.clone()),
            None => node,
        };

        if !constraints.class_level.is_empty() {
            let bean_path = path.child(locate(PathNode::bean()));
            self.rules(&constraints.class_level, value, &bean_path);
        }

        for property in &constraints.properties {
            let field = fields.get(&property.name).unwrap_or(&NULL);
            let property_path = path.child(locate(PathNode::property(property.name.clone())));
            self.rules(&property.rules, field, &property_path);
            if let Some(cascade) = &property.cascade {
                self.cascade(cascade, field, &property_path);
            }
        }
    }
}

/// Items of a list (by index) or map (by key); nothing for other values.
fn entries(container: &Value) -> Vec<(ContainerPosition, &Value)> {
    match container {
        Value::Array(items) => items
            .iter()
            .enumerate()
            .map(|(i, item)| (ContainerPosition::Index(i), item))
            .collect(),
        Value::Object(map) => map
            .iter()
            .map(|(k, item)| (ContainerPosition::Key(k.clone()), item))
            .collect(),
        _ => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::path::ElementKind;
    use serde_json::json;

    fn transfer() -> ExecutableId {
        ExecutableId::method("Bank", "transfer")
            .param("i64")
            .returns("Receipt")
    }

    fn registry() -> ConstraintRegistry {
        ConstraintRegistry::new()
            .bean(
                "Order",
                BeanConstraints::new()
                    .property("customer", [Constraint::required()])
                    .cascade("lines", Cascade::elements("Line")),
            )
            .bean(
                "Line",
                BeanConstraints::new().property("quantity", [Constraint::positive()]),
            )
            .bean(
                "Account",
                BeanConstraints::new().property("name", [Constraint::required()]),
            )
            .executable(
                transfer(),
                ExecutableConstraints::new()
                    .parameter(0, "amount", [Constraint::positive()])
                    .return_value([Constraint::not_null()]),
            )
    }

    #[test]
    fn parameter_violation_carries_index_and_root() {
        let target = json!({"id": 7});
        let violations = registry().validate_parameters(&target, &transfer(), &[json!(-5)]);

        assert_eq!(violations.len(), 1);
        let violation = violations.iter().next().unwrap();
        let leaf = violation.leaf().unwrap();
        assert_eq!(leaf.kind(), ElementKind::Parameter);
        assert_eq!(leaf.parameter_index(), Some(0));
        assert_eq!(violation.property_path.to_string(), "transfer.amount");
        assert_eq!(violation.root_bean, Some(target));
        assert_eq!(violation.invalid_value, json!(-5));
    }

    #[test]
    fn valid_arguments_yield_empty_set() {
        let violations = registry().validate_parameters(&json!({}), &transfer(), &[json!(10)]);
        assert!(violations.is_empty());
    }

    #[test]
    fn unknown_executable_is_unconstrained() {
        let other = ExecutableId::method("Bank", "audit");
        assert!(registry()
            .validate_parameters(&json!({}), &other, &[json!(null)])
            .is_empty());
    }

    #[test]
    fn return_value_violation() {
        let violations = registry().validate_return_value(&json!({}), &transfer(), &Value::Null);
        let leaf = violations.iter().next().unwrap().leaf().unwrap().clone();
        assert_eq!(leaf.kind(), ElementKind::ReturnValue);
        assert_eq!(leaf.parameter_index(), None);
    }

    #[test]
    fn cascaded_list_elements_are_located_by_index() {
        let place = ExecutableId::method("Shop", "place").param("Order");
        let registry = registry().executable(
            place.clone(),
            ExecutableConstraints::new()
                .parameter(0, "order", [Constraint::not_null()])
                .cascade_parameter(0, Cascade::bean("Order")),
        );
        let order = json!({
            "customer": "ada",
            "lines": [{"quantity": 1}, {"quantity": 2}, {"quantity": 0}]
        });

        let violations = registry.validate_parameters(&json!({}), &place, &[order]);
        assert_eq!(violations.len(), 1);
        let violation = violations.iter().next().unwrap();
        assert_eq!(violation.property_path.to_string(), "place.order.lines[2].quantity");
        assert_eq!(violation.leaf().unwrap().kind(), ElementKind::Property);
    }

    #[test]
    fn element_rules_on_list_parameter() {
        let tag = ExecutableId::method("Post", "tag").param("Vec<String>");
        let registry = ConstraintRegistry::new().executable(
            tag.clone(),
            ExecutableConstraints::new().parameter_elements(0, [Constraint::required()]),
        );

        let violations =
            registry.validate_parameters(&json!({}), &tag, &[json!(["rust", "", "serde"])]);
        assert_eq!(violations.len(), 1);
        let violation = violations.iter().next().unwrap();
        assert_eq!(violation.property_path.to_string(), "tag.arg0[1].<list element>");
        assert_eq!(violation.leaf().unwrap().kind(), ElementKind::ContainerElement);
    }

    #[test]
    fn constructor_parameters_have_no_root() {
        let ctor = ExecutableId::constructor("Account").param("String");
        let registry = registry().executable(
            ctor.clone(),
            ExecutableConstraints::new().parameter(0, "name", [Constraint::required()]),
        );

        let violations = registry.validate_constructor_parameters(&ctor, &[json!("")]);
        let violation = violations.iter().next().unwrap();
        assert!(violation.root_bean.is_none());
        assert_eq!(violation.property_path.to_string(), "Account.name");
    }

    #[test]
    fn constructed_instance_checked_against_its_type() {
        let ctor = ExecutableId::constructor("Account").param("String");
        let instance = json!({"name": " "});

        let violations = registry().validate_constructor_return_value(&ctor, &instance);
        assert_eq!(violations.len(), 1);
        let violation = violations.iter().next().unwrap();
        assert_eq!(violation.property_path.to_string(), "Account.<return value>.name");
        assert_eq!(violation.root_bean, Some(instance));
    }

    #[test]
    fn cross_parameter_rules_see_all_arguments() {
        let swap = ExecutableId::method("Pair", "swap").params(["i32", "i32"]);
        let registry = ConstraintRegistry::new().executable(
            swap.clone(),
            ExecutableConstraints::new().cross_parameter([Constraint::length(2, 2)]),
        );

        let violations = registry.validate_parameters(&json!({}), &swap, &[json!(1)]);
        let leaf = violations.iter().next().unwrap().leaf().unwrap().clone();
        assert_eq!(leaf.kind(), ElementKind::CrossParameter);
    }

    #[test]
    fn standalone_bean_validation() {
        let violations = registry().validate_bean("Account", &json!({}));
        assert_eq!(violations.len(), 1);
        assert_eq!(violations.iter().next().unwrap().property_path.to_string(), "name");
    }
}
