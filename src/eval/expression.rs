use crate::error::EvalError;

/// A single step invocation parsed from an evaluate request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepCall {
    pub name: String,
    pub args: Vec<String>,
}

/// Bare name of a `${name}`, `@{name}` or `&{name}` reference.
pub fn variable_name(expression: &str) -> Option<&str> {
    let text = expression.trim();
    let rest = text
        .strip_prefix("${")
        .or_else(|| text.strip_prefix("@{"))
        .or_else(|| text.strip_prefix("&{"))?;
    let name = rest.strip_suffix('}')?;
    if name.is_empty() || name.contains(['{', '}']) {
        return None;
    }
    Some(name)
}

/// Split off the first cell. Cells are separated by a tab or two or more
/// spaces, so step names may contain single spaces.
fn split_first_cell(text: &str) -> (&str, &str) {
    let end = [text.find('\t'), text.find("  ")]
        .into_iter()
        .flatten()
        .min();
    match end {
        Some(idx) => (&text[..idx], text[idx..].trim_start()),
        None => (text, ""),
    }
}

pub fn parse_step_call(expression: &str) -> Result<StepCall, EvalError> {
    let unable = || EvalError::UnableToEvaluate(format!("Unable to evaluate: {}", expression));

    let text = expression.trim();
    if text.is_empty() || text.contains(['\n', '\r']) {
        return Err(unable());
    }

    let (name, rest) = split_first_cell(text);
    if variable_name(name).is_some() {
        return Err(unable());
    }
    let args = shlex::split(rest).ok_or_else(unable)?;

    Ok(StepCall {
        name: name.to_string(),
        args,
    })
}
