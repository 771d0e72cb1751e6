use indexmap::IndexMap;
use log::debug;

use crate::cluster::types::Template;
use crate::error::PipelineError;

/// Caller-supplied parameter values, applied in insertion order.
pub type ParameterSet = IndexMap<String, String>;

/// Applies `values` onto the parameters declared by `template`.
///
/// Each entry is validated independently: an empty or undeclared name is
/// reported and skipped, leaving the template untouched for that entry.
/// Matched parameters take the supplied value and lose their generator, so
/// the store cannot replace the explicit value during expansion.
pub fn substitute_parameters(template: &mut Template, values: &ParameterSet) -> Vec<PipelineError> {
    let mut errors = Vec::new();

    for (name, value) in values {
        if name.is_empty() {
            errors.push(PipelineError::EmptyParameterName {
                value: value.clone(),
            });
            continue;
        }

        let Some(mut parameter) = template.parameter(name).cloned() else {
            errors.push(PipelineError::UnknownParameter(name.clone()));
            continue;
        };

        debug!("Setting template parameter {name}");
        parameter.value = value.clone();
        parameter.generate.clear();
        template.set_parameter(parameter);
    }

    errors
}

/// Parses a `NAME=VALUE` pair. Only the first `=` separates; the value may
/// contain further `=` characters.
pub fn parse_assignment(input: &str) -> Result<(String, String), String> {
    input
        .split_once('=')
        .map(|(name, value)| (name.trim().to_string(), value.to_string()))
        .ok_or_else(|| format!("invalid parameter {input:?}, expected NAME=VALUE"))
}
