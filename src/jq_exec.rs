//! jq post-filter over emitted IR documents.
use anyhow::{anyhow, Result};
use jaq_core::{compile::Undefined, load, Compiler, Ctx, Filter, Native, RcIter};
use jaq_json::Val;
use serde_json::Value;

/// A jq program compiled once and applied to every IR document of a run.
pub struct JqFilter {
    filter: Filter<Native<Val>>,
}

impl JqFilter {
    pub fn compile(filter_src: &str) -> Result<Self> {
        let loader = load::Loader::new(jaq_std::defs().chain(jaq_json::defs()));
        let arena = load::Arena::default();
        let program = load::File { code: filter_src, path: () };

        let modules = loader.load(&arena, program).map_err(|errs| {
            let lines: Vec<_> = errs.iter().map(|(_, err)| format!("{err:?}")).collect();
            anyhow!("cannot parse jq filter `{filter_src}`: {}", lines.join("; "))
        })?;

        let filter = Compiler::default()
            .with_funs(jaq_std::funs().chain(jaq_json::funs()))
            .compile(modules)
            .map_err(|errs| {
                let names: Vec<_> = errs
                    .iter()
                    .flat_map(|(_, list)| list.iter().map(describe_undefined))
                    .collect();
                anyhow!("jq filter `{filter_src}` uses undefined {}", names.join(", "))
            })?;

        Ok(Self { filter })
    }

    /// Every output of the filter on `document`, in order.
    pub fn apply(&self, document: &Value) -> Result<Vec<Value>> {
        let inputs = RcIter::new(core::iter::empty());
        let outputs = self
            .filter
            .run((Ctx::new([], &inputs), Val::from(document.clone())))
            .map(|item| item.map(Value::from).map_err(|e| anyhow!("jq: {e:?}")))
            .collect();
        outputs
    }
}

fn describe_undefined((name, undef): &(&str, Undefined)) -> String {
    format!("`{name}` ({undef:?})")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn selects_struct_names() {
        let filter = JqFilter::compile(".structs[].name").unwrap();
        let doc = json!({"structs": [{"name": "A"}, {"name": "B"}]});
        assert_eq!(filter.apply(&doc).unwrap(), vec![json!("A"), json!("B")]);
    }

    #[test]
    fn one_filter_serves_many_documents() {
        let filter = JqFilter::compile("[.constants[].value]").unwrap();
        let big = json!({"constants": [{"value": 18446744073709551615u64}]});
        assert_eq!(filter.apply(&big).unwrap(), vec![json!([18446744073709551615u64])]);
        let small = json!({"constants": [{"value": 1}, {"value": "s"}]});
        assert_eq!(filter.apply(&small).unwrap(), vec![json!([1, "s"])]);
    }

    #[test]
    fn bad_filters_are_errors() {
        assert!(JqFilter::compile(".structs[").is_err());
        let err = JqFilter::compile("no_such_fn(1)").err().unwrap();
        assert!(err.to_string().contains("no_such_fn"), "{err}");
    }

    #[test]
    fn runtime_errors_surface() {
        let filter = JqFilter::compile(".name + 1").unwrap();
        assert!(filter.apply(&json!({"name": "x"})).is_err());
    }
}
