//! Interactive option collection.
//!
//! Each field runs through a small state machine until it is bound:
//!
//! ```text
//! Prompt -> Coerce -> Validate -> Bound
//!    ^        |          |
//!    +--------+----------+   (constraint violated: report and re-prompt)
//! ```
//!
//! Fields are visited once, in declared order. There is no retry cap; the
//! operator leaves a session by typing the quit line or closing input.

use std::collections::HashMap;
use std::io::{self, Write};

use thiserror::Error;
use tracing::debug;

use crate::console::{Console, ReadLine};
use crate::fields::{FieldKind, FieldSpec, OptionValue};

// ------------------------------------------------------------------ //
//  Errors                                                             //
// ------------------------------------------------------------------ //

#[derive(Debug, Error)]
pub enum CollectError {
    #[error("input cancelled")]
    Cancelled,
    #[error("terminal I/O error: {0}")]
    Io(#[from] io::Error),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OptionsError {
    #[error("option '{0}' was not collected")]
    Missing(String),
    #[error("option '{key}' is not of type {expected}")]
    WrongType { key: String, expected: &'static str },
}

// ------------------------------------------------------------------ //
//  CollectedOptions                                                   //
// ------------------------------------------------------------------ //

/// Field identifier → typed value, one entry per collected field.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CollectedOptions {
    values: HashMap<&'static str, OptionValue>,
}

impl CollectedOptions {
    pub fn get(&self, key: &str) -> Option<&OptionValue> {
        self.values.get(key)
    }

    pub fn str(&self, key: &str) -> Result<&str, OptionsError> {
        match self.values.get(key) {
            Some(OptionValue::Str(s)) => Ok(s),
            Some(OptionValue::Int(_)) => Err(OptionsError::WrongType {
                key: key.to_string(),
                expected: FieldKind::Str.as_str(),
            }),
            None => Err(OptionsError::Missing(key.to_string())),
        }
    }

    pub fn int(&self, key: &str) -> Result<i64, OptionsError> {
        match self.values.get(key) {
            Some(OptionValue::Int(i)) => Ok(*i),
            Some(OptionValue::Str(_)) => Err(OptionsError::WrongType {
                key: key.to_string(),
                expected: FieldKind::Int.as_str(),
            }),
            None => Err(OptionsError::Missing(key.to_string())),
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

// ------------------------------------------------------------------ //
//  Collection                                                         //
// ------------------------------------------------------------------ //

enum FieldState {
    Prompt,
    Coerce(String),
    Validate(OptionValue),
    Bound(OptionValue),
}

/// Prompt for every field in `specs`, re-prompting a field until its value
/// satisfies the declared constraints.
pub fn collect<R: ReadLine, W: Write>(
    console: &mut Console<R, W>,
    specs: &[FieldSpec],
) -> Result<CollectedOptions, CollectError> {
    let mut collected = CollectedOptions::default();

    for spec in specs {
        let value = collect_field(console, spec)?;
        debug!(key = spec.key, value = %value, "option bound");
        collected.values.insert(spec.key, value);
    }

    Ok(collected)
}

fn collect_field<R: ReadLine, W: Write>(
    console: &mut Console<R, W>,
    spec: &FieldSpec,
) -> Result<OptionValue, CollectError> {
    let mut state = FieldState::Prompt;

    loop {
        state = match state {
            FieldState::Prompt => {
                let text = format!("Enter value for \"{}\"{} : ", spec.label, spec.default_hint());
                match console.prompt(&text)? {
                    Some(line) => FieldState::Coerce(line),
                    None => return Err(CollectError::Cancelled),
                }
            }
            FieldState::Coerce(line) => match coerce(spec, line) {
                Ok(value) => FieldState::Validate(value),
                Err(message) => {
                    console.say(message)?;
                    FieldState::Prompt
                }
            },
            FieldState::Validate(value) => match validate(spec, &value) {
                Ok(()) => FieldState::Bound(value),
                Err(message) => {
                    console.say(message)?;
                    console.say("Please try again")?;
                    FieldState::Prompt
                }
            },
            FieldState::Bound(value) => return Ok(value),
        };
    }
}

/// Resolve empty input to the default, then enforce nullability and type.
fn coerce(spec: &FieldSpec, line: String) -> Result<OptionValue, String> {
    let resolved = if line.is_empty() {
        spec.default.clone().unwrap_or_else(|| OptionValue::Str(String::new()))
    } else {
        OptionValue::Str(line)
    };

    if !spec.nullable && resolved.is_empty() {
        return Err("value cannot be null, try again".to_string());
    }

    match (spec.kind, resolved) {
        (FieldKind::Int, OptionValue::Str(text)) => text.parse::<i64>().map(OptionValue::Int).map_err(|e| {
            format!(
                "Error: type of value is expected to be {} - {e}\nPlease try again",
                spec.kind.as_str()
            )
        }),
        (FieldKind::Str, OptionValue::Int(i)) => Ok(OptionValue::Str(i.to_string())),
        (_, value) => Ok(value),
    }
}

fn validate(spec: &FieldSpec, value: &OptionValue) -> Result<(), String> {
    if spec.valid.is_empty() || spec.valid.contains(value) {
        return Ok(());
    }
    let allowed: Vec<String> = spec.valid.iter().map(|v| format!("\"{v}\"")).collect();
    Err(format!(
        "Error - value \"{value}\" is not among valid values [{}]",
        allowed.join(", ")
    ))
}

// ------------------------------------------------------------------ //
//  Tests                                                              //
// ------------------------------------------------------------------ //

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;

    type ScriptedConsole = Console<Cursor<Vec<u8>>, Vec<u8>>;

    fn console(input: &str) -> ScriptedConsole {
        Console::new(Cursor::new(input.as_bytes().to_vec()), Vec::new())
    }

    fn transcript(c: &ScriptedConsole) -> String {
        String::from_utf8_lossy(c.output()).into_owned()
    }

    fn prompts(c: &ScriptedConsole) -> usize {
        transcript(c).matches("Enter value for").count()
    }

    #[test]
    fn value_outside_valid_set_is_reprompted() {
        let specs = [FieldSpec::string("choice", "Choice").valid(["a", "b"])];
        let mut c = console("c\nb\n");

        let opts = collect(&mut c, &specs).unwrap();

        assert_eq!(opts.str("choice").unwrap(), "b");
        assert_eq!(prompts(&c), 2);
        assert!(transcript(&c).contains("Error - value \"c\" is not among valid values [\"a\", \"b\"]"));
    }

    #[test]
    fn required_field_without_default_reprompts_until_non_empty() {
        let specs = [FieldSpec::string("root_id", "Project Name").required()];
        let mut c = console("\n\n\nproj\n");

        let opts = collect(&mut c, &specs).unwrap();

        assert_eq!(opts.str("root_id").unwrap(), "proj");
        assert_eq!(prompts(&c), 4);
        assert_eq!(transcript(&c).matches("value cannot be null").count(), 3);
    }

    #[test]
    fn empty_input_takes_default() {
        let specs = [FieldSpec::string("log_level", "Log Level").default("debug")];
        let mut c = console("\n");

        let opts = collect(&mut c, &specs).unwrap();

        assert_eq!(opts.str("log_level").unwrap(), "debug");
        assert!(transcript(&c).contains("Enter value for \"Log Level\" [debug] : "));
    }

    #[test]
    fn default_is_checked_against_valid_set() {
        let specs = [FieldSpec::string("runtime", "Runtime").default("v8").valid(["wamr"])];
        let mut c = console("\nwamr\n");

        let opts = collect(&mut c, &specs).unwrap();

        assert_eq!(opts.str("runtime").unwrap(), "wamr");
        assert_eq!(prompts(&c), 2);
    }

    #[test]
    fn nullable_field_binds_empty_text() {
        let specs = [FieldSpec::string("vm_name", "Vm Name").default("")];
        let mut c = console("\n");

        let opts = collect(&mut c, &specs).unwrap();

        assert_eq!(opts.str("vm_name").unwrap(), "");
    }

    #[test]
    fn integer_field_rejects_non_numeric_text() {
        let specs = [FieldSpec::int("delay", "Delay")];
        let mut c = console("soon\n25\n");

        let opts = collect(&mut c, &specs).unwrap();

        assert_eq!(opts.int("delay").unwrap(), 25);
        assert!(transcript(&c).contains("Error: type of value is expected to be int"));
        assert_eq!(prompts(&c), 2);
    }

    #[test]
    fn integer_default_is_bound_as_integer() {
        let specs = [FieldSpec::int("port", "Port").default(8080_i64)];
        let mut c = console("\n");

        let opts = collect(&mut c, &specs).unwrap();

        assert_eq!(opts.int("port").unwrap(), 8080);
    }

    #[test]
    fn integer_valid_set_compares_typed_values() {
        let specs = [FieldSpec::int("level", "Level").valid([1_i64, 2])];
        let mut c = console("3\n02\n");

        let opts = collect(&mut c, &specs).unwrap();

        assert_eq!(opts.int("level").unwrap(), 2);
    }

    #[test]
    fn fields_are_bound_in_declared_order() {
        let specs = [
            FieldSpec::string("project", "Project Name").required(),
            FieldSpec::string("vm_name", "Vm Name").default(""),
            FieldSpec::string("data_file", "Data").required().default("data/x.json"),
        ];
        let mut c = console("\nproj\nvm1\n\n");

        let opts = collect(&mut c, &specs).unwrap();

        assert_eq!(opts.len(), 3);
        assert_eq!(opts.str("project").unwrap(), "proj");
        assert_eq!(opts.str("vm_name").unwrap(), "vm1");
        assert_eq!(opts.str("data_file").unwrap(), "data/x.json");
        let t = transcript(&c);
        let first = t.find("Project Name").unwrap();
        let second = t.find("Vm Name").unwrap();
        let third = t.find("Data").unwrap();
        assert!(first < second && second < third);
    }

    #[test]
    fn quit_cancels_collection() {
        let specs = [
            FieldSpec::string("a", "A"),
            FieldSpec::string("b", "B"),
        ];
        let mut c = console("x\n:q\n");

        assert!(matches!(collect(&mut c, &specs), Err(CollectError::Cancelled)));
    }

    #[test]
    fn end_of_input_cancels_collection() {
        let specs = [FieldSpec::string("a", "A").required()];
        let mut c = console("\n");

        assert!(matches!(collect(&mut c, &specs), Err(CollectError::Cancelled)));
    }

    #[test]
    fn typed_lookups_report_mismatches() {
        let specs = [FieldSpec::string("name", "Name").default("vm")];
        let opts = collect(&mut console("\n"), &specs).unwrap();

        assert_eq!(
            opts.int("name"),
            Err(OptionsError::WrongType { key: "name".into(), expected: "int" })
        );
        assert_eq!(opts.str("other"), Err(OptionsError::Missing("other".into())));
    }
}
