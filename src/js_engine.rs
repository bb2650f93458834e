//! JavaScript Engine Module (rquickjs)
//!
//! Script evaluation behind the default live-rendering handle.
//! Uses `QuickJS` via rquickjs bindings (ES2020, ~1MB). There is no layout
//! engine: the DOM shim answers style queries with empty values, so scripts
//! written for a real browser degrade to empty results instead of failing.

use anyhow::{Context as _, Result};
use rquickjs::{Context, Function, Runtime, Type};
use tracing::debug;

/// Minimal DOM and CSSOM surface expected by style-probing scripts.
const DOM_SHIM: &str = r"
    var document = {
        _elements: [],
        fonts: { _faces: [], forEach: function(fn) { this._faces.forEach(fn); } },
        styleSheets: [],
        documentElement: { tagName: 'HTML', children: [] },
        body: { tagName: 'BODY', children: [] },
        getElementById: function(id) { return null; },
        querySelector: function(selector) { return null; },
        querySelectorAll: function(selector) { return this._elements; },
        createElement: function(tag) {
            return { tagName: tag.toUpperCase(), children: [], attributes: {}, style: {} };
        }
    };

    var window = {
        document: document,
        location: { href: 'about:blank', hostname: '', pathname: '/' },
        navigator: { userAgent: 'stylescout', language: 'en-US' },
        innerWidth: 1280,
        innerHeight: 800,
        getComputedStyle: function(element) {
            var style = {};
            style.getPropertyValue = function(name) { return ''; };
            return style;
        }
    };

    var getComputedStyle = window.getComputedStyle;

    if (typeof console === 'undefined') {
        var console = { log: function() {}, warn: function() {}, error: function() {} };
    }
";

/// Isolated JavaScript context
pub struct JsEngine {
    context: Context,
    // Declared last so it drops after `context`.
    _runtime: Runtime,
}

impl JsEngine {
    /// Create a new JavaScript engine
    pub fn new() -> Result<Self> {
        let runtime = Runtime::new().context("failed to start QuickJS runtime")?;
        let context = Context::full(&runtime).context("failed to create QuickJS context")?;

        // Style scripts are small; 16MB is plenty
        runtime.set_memory_limit(16 * 1024 * 1024);
        runtime.set_max_stack_size(512 * 1024);

        Ok(Self {
            context,
            _runtime: runtime,
        })
    }

    /// Create an engine with the DOM shim already installed
    pub fn with_dom() -> Result<Self> {
        let engine = Self::new()?;
        engine.inject_dom()?;
        Ok(engine)
    }

    /// Execute JavaScript code and return the result as a string
    pub fn eval(&self, code: &str) -> Result<String> {
        debug!("Evaluating JS: {} chars", code.len());

        self.context.with(|ctx| {
            let result: rquickjs::Value = ctx.eval(code)?;

            let result_str = match result.type_of() {
                Type::Undefined => "undefined".to_string(),
                Type::Null => "null".to_string(),
                Type::Bool => result.get::<bool>()?.to_string(),
                Type::Int => result.get::<i32>()?.to_string(),
                Type::Float => result.get::<f64>()?.to_string(),
                Type::String => result.get::<String>()?,
                Type::Object | Type::Array => stringify(&ctx, result)?,
                other => format!("{other:?}"),
            };

            Ok(result_str)
        })
    }

    /// Execute JavaScript and return the result as JSON.
    ///
    /// `undefined`, functions and other non-serializable results map to
    /// `null`.
    pub fn eval_json(&self, code: &str) -> Result<serde_json::Value> {
        let json = self.context.with(|ctx| -> Result<String> {
            let result: rquickjs::Value = ctx.eval(code)?;
            if result.is_undefined() {
                return Ok("null".to_string());
            }
            stringify(&ctx, result)
        })?;

        if json.is_empty() || json == "undefined" {
            return Ok(serde_json::Value::Null);
        }
        serde_json::from_str(&json).context("script result is not valid JSON")
    }

    /// Install the DOM shim
    pub fn inject_dom(&self) -> Result<()> {
        self.context.with(|ctx| {
            ctx.eval::<(), _>(DOM_SHIM)?;
            Ok(())
        })
    }
}

fn stringify<'js>(ctx: &rquickjs::Ctx<'js>, value: rquickjs::Value<'js>) -> Result<String> {
    let json: rquickjs::Object = ctx.globals().get("JSON")?;
    let stringify: Function = json.get("stringify")?;
    let out: Option<String> = stringify.call((value,))?;
    Ok(out.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_eval() {
        let engine = JsEngine::new().unwrap();
        assert_eq!(engine.eval("1 + 2").unwrap(), "3");
        assert_eq!(engine.eval("'hello' + ' ' + 'world'").unwrap(), "hello world");
    }

    #[test]
    fn test_eval_json_array() {
        let engine = JsEngine::new().unwrap();
        let value = engine.eval_json("['#fff', 'rgb(0, 0, 0)']").unwrap();
        assert_eq!(value, serde_json::json!(["#fff", "rgb(0, 0, 0)"]));
    }

    #[test]
    fn test_eval_json_undefined_is_null() {
        let engine = JsEngine::new().unwrap();
        assert_eq!(engine.eval_json("undefined").unwrap(), serde_json::Value::Null);
    }

    #[test]
    fn test_dom_shim_computed_style() {
        let engine = JsEngine::with_dom().unwrap();
        let value = engine
            .eval_json(
                r"
            (function() {
                var out = [];
                var els = document.querySelectorAll('*');
                for (var i = 0; i < els.length; i++) {
                    out.push(window.getComputedStyle(els[i]).color);
                }
                return out;
            })()
        ",
            )
            .unwrap();
        assert_eq!(value, serde_json::json!([]));
    }

    #[test]
    fn test_syntax_error_is_reported() {
        let engine = JsEngine::new().unwrap();
        assert!(engine.eval("function (").is_err());
    }
}
