//! Rendering of host values for display. Never fails: anything that can't be
//! rendered becomes a placeholder string.

use log::warn;
use serde_json::Value;

use super::frames::Variable;
use crate::debugger::{StepInfo, VariableStore};

const ELLIPSIS: &str = "...";

pub fn render_value(value: &Value, max_len: usize) -> String {
    match serde_json::to_string(value) {
        Ok(text) => truncate(text, max_len),
        Err(e) => format!("<Unable to render value: {}>", e),
    }
}

fn truncate(mut text: String, max_len: usize) -> String {
    if text.chars().count() <= max_len {
        return text;
    }
    let keep = max_len.saturating_sub(ELLIPSIS.len());
    let cut = text
        .char_indices()
        .nth(keep)
        .map_or(text.len(), |(idx, _)| idx);
    text.truncate(cut);
    text.push_str(ELLIPSIS);
    text
}

pub fn render_args(step: &dyn StepInfo, max_len: usize) -> Vec<Variable> {
    match step.args() {
        Ok(args) => args
            .iter()
            .enumerate()
            .map(|(i, arg)| Variable::new(format!("Arg {}", i), render_value(arg, max_len)))
            .collect(),
        Err(e) => {
            warn!("Unable to get arguments for step: {:#}", e);
            vec![Variable::new(
                "<error>",
                format!("<Unable to get arguments: {}>", e),
            )]
        }
    }
}

pub fn render_variables(store: &dyn VariableStore, max_len: usize) -> Vec<Variable> {
    match store.entries() {
        Ok(entries) => entries
            .iter()
            .map(|(name, value)| Variable::new(name.clone(), render_value(value, max_len)))
            .collect(),
        Err(e) => {
            warn!("Unable to get variables: {:#}", e);
            vec![Variable::new(
                "<error>",
                format!("<Unable to get variables: {}>", e),
            )]
        }
    }
}
