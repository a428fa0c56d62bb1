//! Script-facing surface
//!
//! Each submodule installs its functions into the environment's global
//! namespace:
//! - `globals` - `system`, `alert`/`message`, `buf_cnt`, `buf_nr`
//! - `buffer` - the `Buffer` proxy type and its methods

pub mod buffer;
pub mod globals;

use std::any::TypeId;
use std::rc::Rc;

use rhai::{
    Array, Dynamic, EvalAltResult, FnNamespace, FuncRegistration, Map, Module, NativeCallContext,
    RhaiFunc,
};

use super::bridge::Bridge;
use super::class::Arity;
use super::error::BridgeError;
use super::proxy::EntityProxy;

/// Most arguments (receiver included) a bridge function is registered for.
/// Rhai only matches untyped parameters in the first 16 positions.
pub const MAX_CALL_ARGS: usize = 16;

/// Register `f` under `name` for every count of untyped arguments up to
/// [`MAX_CALL_ARGS`]. Counts and types are checked by the bridge, not by
/// the engine, so a bad call raises a bridge error instead of "function not
/// found".
fn set_bridge_fn(
    module: &mut Module,
    name: &'static str,
    f: impl Fn(&mut [&mut Dynamic]) -> Result<Dynamic, BridgeError> + 'static,
) {
    let f = Rc::new(f);
    for count in 0..=MAX_CALL_ARGS {
        let f = Rc::clone(&f);
        FuncRegistration::new(name)
            .with_namespace(FnNamespace::Global)
            .set_into_module_raw(
                module,
                vec![TypeId::of::<Dynamic>(); count],
                RhaiFunc::Method {
                    func: Rc::new(
                        move |_ctx: Option<NativeCallContext>, args: &mut [&mut Dynamic]| {
                            f(args).map_err(Box::<EvalAltResult>::from)
                        },
                    ),
                    has_context: true,
                    is_pure: true,
                    is_volatile: true,
                },
            );
    }
}

fn check_arity(function: &'static str, arity: Arity, count: usize) -> Result<(), BridgeError> {
    if arity.accepts(count) {
        return Ok(());
    }
    let expected = match arity {
        Arity::Exact(1) => "1 argument".to_string(),
        Arity::Exact(n) => format!("{} arguments", n),
        Arity::UpTo(n) => format!("at most {} arguments", n),
    };
    Err(BridgeError::invalid_args(
        function,
        format!("expected {}, got {}", expected, count),
    ))
}

/// `value` is the script's `position`-th argument (1-based)
fn int_arg(
    value: &Dynamic,
    position: usize,
    function: &'static str,
) -> Result<i64, BridgeError> {
    value.as_int().map_err(|ty| {
        BridgeError::invalid_args(
            function,
            format!("argument {} must be an integer, not {}", position, ty),
        )
    })
}

fn string_arg(
    value: &Dynamic,
    position: usize,
    function: &'static str,
) -> Result<String, BridgeError> {
    value.clone().into_string().map_err(|ty| {
        BridgeError::invalid_args(
            function,
            format!("argument {} must be a string, not {}", position, ty),
        )
    })
}

/// Script value to display text. Proxies print as `Buffer(n)`, also inside
/// arrays and maps.
fn stringify(bridge: &Bridge, value: &Dynamic) -> String {
    if value.is_array() || value.is_map() {
        return nested(bridge, value);
    }
    match value.clone().try_cast::<EntityProxy>() {
        Some(proxy) => bridge.describe(&proxy),
        None => value.to_string(),
    }
}

/// Container element text, in the engine's debug layout
fn nested(bridge: &Bridge, value: &Dynamic) -> String {
    if let Some(items) = value.clone().try_cast::<Array>() {
        let items: Vec<String> = items.iter().map(|v| nested(bridge, v)).collect();
        return format!("[{}]", items.join(", "));
    }
    if let Some(map) = value.clone().try_cast::<Map>() {
        let entries: Vec<String> = map
            .iter()
            .map(|(k, v)| format!("{:?}: {}", k.as_str(), nested(bridge, v)))
            .collect();
        return format!("#{{{}}}", entries.join(", "));
    }
    match value.clone().try_cast::<EntityProxy>() {
        Some(proxy) => bridge.describe(&proxy),
        None => format!("{:?}", value),
    }
}

/// Proxy (or unit for None) as a script value
fn proxy_value(proxy: Option<EntityProxy>) -> Dynamic {
    proxy.map(Dynamic::from).unwrap_or(Dynamic::UNIT)
}
