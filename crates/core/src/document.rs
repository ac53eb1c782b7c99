//! Employee context assembly and `{{placeholder}}` rendering for generated documents.

use std::collections::BTreeMap;

use crate::types::{Department, Employee};

/// Placeholder values keyed by name. `None` renders as an empty string.
pub type TemplateContext = BTreeMap<String, Option<String>>;

/// Keys always present in an employee context.
pub const CONTEXT_KEYS: [&str; 10] = [
    "first_name",
    "last_name",
    "full_name",
    "email",
    "position",
    "employment_type",
    "department",
    "manager",
    "status",
    "location",
];

/// Builds the templating context for an employee.
///
/// `department` and `manager` are the records referenced by the employee, if
/// they could be resolved. Missing values stay in the map as `None`.
pub fn employee_context(
    employee: &Employee,
    department: Option<&Department>,
    manager: Option<&Employee>,
) -> TemplateContext {
    let mut context = TemplateContext::new();
    context.insert("first_name".into(), Some(employee.first_name.clone()));
    context.insert("last_name".into(), Some(employee.last_name.clone()));
    context.insert("full_name".into(), Some(employee.full_name()));
    context.insert("email".into(), Some(employee.email.clone()));
    context.insert("position".into(), employee.position.clone());
    context.insert(
        "employment_type".into(),
        Some(employee.employment_type.clone()),
    );
    context.insert(
        "department".into(),
        department.map(|department| department.name.clone()),
    );
    context.insert("manager".into(), manager.map(Employee::full_name));
    context.insert("status".into(), Some(employee.status.clone()));
    context.insert("location".into(), employee.location.clone());
    context
}

/// Overlays caller supplied values on top of a context. Existing keys are replaced.
pub fn merge_extra_context(context: &mut TemplateContext, extra: BTreeMap<String, String>) {
    for (key, value) in extra {
        context.insert(key, Some(value));
    }
}

/// Replaces every `{{key}}` in `template` with its context value.
///
/// Placeholders without a matching key are left untouched.
pub fn render_template(template: &str, context: &TemplateContext) -> String {
    let mut output = template.to_string();
    for (key, value) in context {
        let placeholder = format!("{{{{{key}}}}}");
        if output.contains(&placeholder) {
            output = output.replace(&placeholder, value.as_deref().unwrap_or(""));
        }
    }
    output
}
