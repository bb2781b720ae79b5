//! Option collection and parsing.
//!
//! The registry owns the option descriptors for one run. Descriptors come
//! from explicit registrations (orchestrator meta options) or from the specs
//! collected off the step list. Parsing matches `-name=value` tokens and
//! environment variables against them, resolves `${NAME}`/`$(NAME)`
//! indirection, converts values to the declared parameter types and invokes
//! the bound setter.

use std::env;

use super::descriptor::OptionSpec;
use super::value::OptionValue;
use super::OptionsError;
use crate::step::BuildStep;

/// Audit record for one applied option: the option name and its value with
/// secrets masked. The ordered record list is the observable output of a
/// parsing pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppliedOption {
    pub name: String,
    pub value: String,
}

type Handler = Box<dyn FnMut(&[OptionValue]) -> Result<(), OptionsError>>;

enum Binding {
    /// Index into the step slice handed to the process calls
    Step(usize),
    /// Free-standing registered handler
    Handler(Handler),
}

struct Descriptor {
    spec: OptionSpec,
    binding: Binding,
}

/// Collects option descriptors and parses supplied values against them.
///
/// Name matching is case-insensitive and the first registered descriptor
/// wins; a later descriptor with a colliding name is unreachable rather than
/// an error.
#[derive(Default)]
pub struct OptionsRegistry {
    descriptors: Vec<Descriptor>,
}

impl OptionsRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an option handled by a closure instead of a step. Used for
    /// the orchestrator's own meta options.
    pub fn register(
        &mut self,
        spec: OptionSpec,
        handler: impl FnMut(&[OptionValue]) -> Result<(), OptionsError> + 'static,
    ) {
        self.descriptors.push(Descriptor { spec, binding: Binding::Handler(Box::new(handler)) });
    }

    /// Collect and validate option specs from every step. Fails on the first
    /// schema violation, before any value parsing happens.
    pub fn collect(&mut self, steps: &[Box<dyn BuildStep>]) -> Result<(), OptionsError> {
        for (index, step) in steps.iter().enumerate() {
            for spec in step.options() {
                validate_spec(step.as_ref(), &spec)?;
                self.descriptors.push(Descriptor { spec, binding: Binding::Step(index) });
            }
        }
        Ok(())
    }

    /// Declared specs, in registration order.
    pub fn specs(&self) -> impl Iterator<Item = &OptionSpec> {
        self.descriptors.iter().map(|d| &d.spec)
    }

    /// Parse command-line style tokens against the registry.
    ///
    /// Tokens that match no registered option are ignored; tokens that match
    /// an option name but are not exactly `-name=value` are reported on
    /// stderr and skipped. `steps` must be the same slice `collect` ran over.
    pub fn process_options(
        &mut self,
        steps: &mut [Box<dyn BuildStep>],
        tokens: &[String],
    ) -> Result<Vec<AppliedOption>, OptionsError> {
        let mut applied = Vec::new();

        for token in tokens {
            let Some(index) = self.match_token(token) else {
                continue;
            };

            let parts: Vec<&str> = token.split('=').collect();
            if parts.len() != 2 {
                eprintln!("warning: wrong option format: '{}'", token);
                continue;
            }

            let value = parts[1].trim_matches('"');
            let Descriptor { spec, binding } = &mut self.descriptors[index];
            apply_value(spec, binding, steps, value, &mut applied)?;
        }

        Ok(applied)
    }

    /// Read option values from environment variables named exactly like each
    /// registered option and apply them the same way as parsed tokens.
    pub fn process_environment(
        &mut self,
        steps: &mut [Box<dyn BuildStep>],
    ) -> Result<Vec<AppliedOption>, OptionsError> {
        let mut applied = Vec::new();

        for index in 0..self.descriptors.len() {
            let Ok(value) = env::var(&self.descriptors[index].spec.name) else {
                continue;
            };
            let Descriptor { spec, binding } = &mut self.descriptors[index];
            apply_value(spec, binding, steps, &value, &mut applied)?;
        }

        Ok(applied)
    }

    /// First descriptor whose `-name=` prefix matches the token,
    /// case-insensitively.
    fn match_token(&self, token: &str) -> Option<usize> {
        let lower = token.to_lowercase();
        self.descriptors
            .iter()
            .position(|d| lower.starts_with(&format!("-{}=", d.spec.name.to_lowercase())))
    }
}

fn validate_spec(step: &dyn BuildStep, spec: &OptionSpec) -> Result<(), OptionsError> {
    if spec.params.is_empty() {
        return Err(OptionsError::NoParameters {
            step: step.kind().id(),
            option: spec.name.clone(),
        });
    }
    for param in &spec.params[1..] {
        if param.default.is_none() {
            return Err(OptionsError::MissingDefault {
                step: step.kind().id(),
                option: spec.name.clone(),
                param: param.name.clone(),
            });
        }
    }
    Ok(())
}

/// Resolve indirection, convert, dispatch to the setter and record the audit
/// entry. Any failure past this point is wrapped with the option name and
/// the masked value.
fn apply_value(
    spec: &OptionSpec,
    binding: &mut Binding,
    steps: &mut [Box<dyn BuildStep>],
    raw: &str,
    applied: &mut Vec<AppliedOption>,
) -> Result<(), OptionsError> {
    let entries = resolve_indirection(raw);
    let secret = spec.is_secret();
    let masked = mask_secret(secret, &entries.join(","));
    applied.push(AppliedOption { name: spec.name.clone(), value: masked.clone() });

    let wrap = |source: OptionsError| OptionsError::Apply {
        option: spec.name.clone(),
        value: masked.clone(),
        source: Box::new(source),
    };

    let values = convert_entries(spec, secret, &entries).map_err(&wrap)?;

    match binding {
        Binding::Step(index) => steps[*index].apply_option(&spec.name, &values).map_err(wrap),
        Binding::Handler(handler) => handler(&values).map_err(wrap),
    }
}

/// Split a value on commas and substitute environment variables for entries
/// written as `${NAME}` or `$(NAME)`. An unset variable leaves the wrapped
/// entry in place verbatim; no further substitution happens.
fn resolve_indirection(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|entry| {
            let trimmed = entry.trim();
            let name = if (trimmed.starts_with("${") && trimmed.ends_with('}'))
                || (trimmed.starts_with("$(") && trimmed.ends_with(')'))
            {
                &trimmed[2..trimmed.len() - 1]
            } else {
                return entry.to_string();
            };
            env::var(name).unwrap_or_else(|_| entry.to_string())
        })
        .collect()
}

/// Convert entries positionally and fill missing trailing parameters from
/// their declared defaults.
fn convert_entries(
    spec: &OptionSpec,
    secret: bool,
    entries: &[String],
) -> Result<Vec<OptionValue>, OptionsError> {
    if entries.len() > spec.params.len() {
        return Err(OptionsError::TooManyValues {
            option: spec.name.clone(),
            given: entries.len(),
            declared: spec.params.len(),
        });
    }

    let mut values = Vec::with_capacity(spec.params.len());
    for (param, entry) in spec.params.iter().zip(entries) {
        let value = param.ty.convert(&param.name, entry).map_err(|e| mask_conversion(secret, e))?;
        values.push(value);
    }
    for param in &spec.params[entries.len()..] {
        match &param.default {
            Some(default) => values.push(default.clone()),
            // Unreachable for validated specs; registered specs with missing
            // defaults surface here.
            None => {
                return Err(OptionsError::Conversion {
                    param: param.name.clone(),
                    expected: param.ty.name(),
                    value: "<missing>".to_string(),
                })
            }
        }
    }
    Ok(values)
}

fn mask_secret(secret: bool, value: &str) -> String {
    if secret && !value.is_empty() {
        "*".repeat(value.chars().count())
    } else {
        value.to_string()
    }
}

fn mask_conversion(secret: bool, err: OptionsError) -> OptionsError {
    match err {
        OptionsError::Conversion { param, expected, value } if secret => OptionsError::Conversion {
            param,
            expected,
            value: mask_secret(true, &value),
        },
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::{OptionSpec, ParamType};
    use crate::step::Kind;
    use serial_test::serial;
    use std::any::Any;

    /// Step with a string field, a bool field, a secret and a
    /// three-parameter list option.
    #[derive(Default)]
    struct ProbeStep {
        str_value: String,
        flag: bool,
        password: String,
        multi: Vec<(String, i64, String)>,
    }

    impl ProbeStep {
        const KIND: Kind = Kind::root("ProbeStep");
    }

    impl BuildStep for ProbeStep {
        fn kind(&self) -> &'static Kind {
            &Self::KIND
        }

        fn options(&self) -> Vec<OptionSpec> {
            vec![
                OptionSpec::new("str", ParamType::Str),
                OptionSpec::new("flag", ParamType::Bool),
                OptionSpec::new("probePassword", ParamType::Str),
                OptionSpec::new("mlt", ParamType::Str)
                    .param("count", ParamType::Int, OptionValue::Int(0))
                    .param("tag", ParamType::Str, OptionValue::Str("x".into())),
            ]
        }

        fn apply_option(&mut self, name: &str, values: &[OptionValue]) -> Result<(), OptionsError> {
            let args = crate::options::Args(values);
            match name {
                "str" => self.str_value = args.str(0)?.to_string(),
                "flag" => self.flag = args.bool(0)?,
                "probePassword" => self.password = args.str(0)?.to_string(),
                "mlt" => self.multi.push((
                    args.str(0)?.to_string(),
                    args.int(1)?,
                    args.str(2)?.to_string(),
                )),
                other => {
                    return Err(OptionsError::UnknownBinding {
                        step: Self::KIND.id(),
                        binding: other.to_string(),
                    })
                }
            }
            Ok(())
        }

        fn as_any(&self) -> &dyn Any {
            self
        }
    }

    fn probe_registry() -> (OptionsRegistry, Vec<Box<dyn BuildStep>>) {
        let steps: Vec<Box<dyn BuildStep>> = vec![Box::new(ProbeStep::default())];
        let mut registry = OptionsRegistry::new();
        registry.collect(&steps).unwrap();
        (registry, steps)
    }

    fn probe(steps: &[Box<dyn BuildStep>]) -> &ProbeStep {
        steps[0].as_any().downcast_ref().unwrap()
    }

    fn tokens(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_string_option_sets_field() {
        let (mut registry, mut steps) = probe_registry();
        let applied = registry.process_options(&mut steps, &tokens(&["-str=value"])).unwrap();
        assert_eq!(probe(&steps).str_value, "value");
        assert_eq!(applied, vec![AppliedOption { name: "str".into(), value: "value".into() }]);
    }

    #[test]
    fn test_option_name_match_is_case_insensitive() {
        let (mut registry, mut steps) = probe_registry();
        registry.process_options(&mut steps, &tokens(&["-STR=shouty"])).unwrap();
        assert_eq!(probe(&steps).str_value, "shouty");
    }

    #[test]
    fn test_quoted_value_is_unwrapped() {
        let (mut registry, mut steps) = probe_registry();
        registry.process_options(&mut steps, &tokens(&["-str=\"two words\""])).unwrap();
        assert_eq!(probe(&steps).str_value, "two words");
    }

    #[test]
    fn test_unrecognized_token_is_ignored() {
        let (mut registry, mut steps) = probe_registry();
        let applied = registry
            .process_options(&mut steps, &tokens(&["-quit", "-batchmode", "-str=ok"]))
            .unwrap();
        assert_eq!(applied.len(), 1);
        assert_eq!(probe(&steps).str_value, "ok");
    }

    #[test]
    fn test_malformed_token_is_skipped_without_mutation() {
        let (mut registry, mut steps) = probe_registry();
        let applied = registry
            .process_options(&mut steps, &tokens(&["-str=a=b", "-str"]))
            .unwrap();
        assert!(applied.is_empty());
        assert_eq!(probe(&steps).str_value, "");
    }

    #[test]
    fn test_multi_param_option_fills_trailing_defaults() {
        let (mut registry, mut steps) = probe_registry();
        registry.process_options(&mut steps, &tokens(&["-mlt=a,5"])).unwrap();
        assert_eq!(probe(&steps).multi, vec![("a".to_string(), 5, "x".to_string())]);
    }

    #[test]
    fn test_multi_param_option_with_all_values() {
        let (mut registry, mut steps) = probe_registry();
        registry.process_options(&mut steps, &tokens(&["-mlt=a,5,y"])).unwrap();
        assert_eq!(probe(&steps).multi, vec![("a".to_string(), 5, "y".to_string())]);
    }

    #[test]
    fn test_too_many_values_fails_with_option_context() {
        let (mut registry, mut steps) = probe_registry();
        let err = registry.process_options(&mut steps, &tokens(&["-mlt=a,5,y,z"])).unwrap_err();
        assert!(err.to_string().contains("mlt"));
    }

    #[test]
    fn test_conversion_failure_names_option_and_value() {
        let (mut registry, mut steps) = probe_registry();
        let err = registry.process_options(&mut steps, &tokens(&["-flag=maybe"])).unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("-flag=maybe"));
        assert!(msg.contains("bool"));
    }

    #[test]
    fn test_password_masked_in_audit_but_real_value_applied() {
        let (mut registry, mut steps) = probe_registry();
        let applied = registry
            .process_options(&mut steps, &tokens(&["-probePassword=hunter2"]))
            .unwrap();
        assert_eq!(applied[0].value, "*******");
        assert_eq!(probe(&steps).password, "hunter2");
    }

    #[test]
    fn test_first_registered_descriptor_wins_on_collision() {
        let mut steps: Vec<Box<dyn BuildStep>> = vec![Box::new(ProbeStep::default())];
        let mut registry = OptionsRegistry::new();
        registry.register(OptionSpec::new("str", ParamType::Str), |_| Ok(()));
        registry.collect(&steps).unwrap();
        registry.process_options(&mut steps, &tokens(&["-str=value"])).unwrap();
        // The handler registered first shadows the step binding.
        assert_eq!(probe(&steps).str_value, "");
    }

    #[test]
    fn test_zero_parameter_spec_is_a_schema_error() {
        struct BadStep;
        impl BadStep {
            const KIND: Kind = Kind::root("BadStep");
        }
        impl BuildStep for BadStep {
            fn kind(&self) -> &'static Kind {
                &Self::KIND
            }
            fn options(&self) -> Vec<OptionSpec> {
                vec![OptionSpec { name: "broken".into(), params: Vec::new() }]
            }
            fn as_any(&self) -> &dyn Any {
                self
            }
        }

        let steps: Vec<Box<dyn BuildStep>> = vec![Box::new(BadStep)];
        let err = OptionsRegistry::new().collect(&steps).unwrap_err();
        assert!(matches!(err, OptionsError::NoParameters { .. }));
    }

    #[test]
    fn test_non_first_parameter_without_default_is_a_schema_error() {
        struct BadStep;
        impl BadStep {
            const KIND: Kind = Kind::root("BadStep");
        }
        impl BuildStep for BadStep {
            fn kind(&self) -> &'static Kind {
                &Self::KIND
            }
            fn options(&self) -> Vec<OptionSpec> {
                let mut spec = OptionSpec::new("broken", ParamType::Str);
                spec.params.push(crate::options::OptionParam {
                    name: "second".into(),
                    ty: ParamType::Int,
                    default: None,
                });
                vec![spec]
            }
            fn as_any(&self) -> &dyn Any {
                self
            }
        }

        let steps: Vec<Box<dyn BuildStep>> = vec![Box::new(BadStep)];
        let err = OptionsRegistry::new().collect(&steps).unwrap_err();
        assert!(matches!(err, OptionsError::MissingDefault { .. }));
    }

    #[test]
    #[serial]
    fn test_env_indirection_resolves_set_variable() {
        env::set_var("BLINE_TEST_STR", "from-env");
        let (mut registry, mut steps) = probe_registry();
        registry
            .process_options(&mut steps, &tokens(&["-str=$(BLINE_TEST_STR)"]))
            .unwrap();
        assert_eq!(probe(&steps).str_value, "from-env");
        env::remove_var("BLINE_TEST_STR");
    }

    #[test]
    #[serial]
    fn test_env_indirection_unset_variable_keeps_literal() {
        env::remove_var("BLINE_TEST_UNSET");
        let (mut registry, mut steps) = probe_registry();
        registry
            .process_options(&mut steps, &tokens(&["-str=$(BLINE_TEST_UNSET)"]))
            .unwrap();
        assert_eq!(probe(&steps).str_value, "$(BLINE_TEST_UNSET)");
    }

    #[test]
    #[serial]
    fn test_env_indirection_per_entry_in_multi_value() {
        env::set_var("BLINE_TEST_SCENE", "menu");
        let (mut registry, mut steps) = probe_registry();
        registry
            .process_options(&mut steps, &tokens(&["-mlt=${BLINE_TEST_SCENE},7"]))
            .unwrap();
        assert_eq!(probe(&steps).multi, vec![("menu".to_string(), 7, "x".to_string())]);
        env::remove_var("BLINE_TEST_SCENE");
    }

    #[test]
    #[serial]
    fn test_process_environment_applies_matching_variable() {
        env::set_var("str", "env-value");
        let (mut registry, mut steps) = probe_registry();
        let applied = registry.process_environment(&mut steps).unwrap();
        assert_eq!(probe(&steps).str_value, "env-value");
        assert_eq!(applied.len(), 1);
        env::remove_var("str");
    }

    #[test]
    #[serial]
    fn test_process_environment_skips_unset_options() {
        env::remove_var("str");
        env::remove_var("flag");
        env::remove_var("probePassword");
        env::remove_var("mlt");
        let (mut registry, mut steps) = probe_registry();
        let applied = registry.process_environment(&mut steps).unwrap();
        assert!(applied.is_empty());
    }
}
