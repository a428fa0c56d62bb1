//! Global bridge functions
//!
//! Usage in Rhai:
//! ```rhai
//! system("make");              // throws if make exits non-zero
//! message("buffers:", buf_cnt());
//! let b = buf_nr(1);
//! ```

use std::collections::HashSet;
use std::rc::Rc;

use rhai::{Dynamic, Module};

use super::{MAX_CALL_ARGS, check_arity, int_arg, set_bridge_fn, string_arg, stringify};
use crate::scripting::bridge::Bridge;
use crate::scripting::class::Arity;
use crate::scripting::error::BridgeError;


#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GlobalFn {
    System,
    Message,
    BufferCount,
    BufferByNumber,
}

#[derive(Debug)]
pub struct GlobalSpec {
    pub name: &'static str,
    pub arity: Arity,
    pub function: GlobalFn,
}

/// Installed into the global namespace in this order
pub static GLOBAL_FUNCTIONS: &[GlobalSpec] = &[
    GlobalSpec {
        name: "system",
        arity: Arity::Exact(1),
        function: GlobalFn::System,
    },
    GlobalSpec {
        name: "alert",
        arity: Arity::UpTo(MAX_CALL_ARGS),
        function: GlobalFn::Message,
    },
    GlobalSpec {
        name: "message",
        arity: Arity::UpTo(MAX_CALL_ARGS),
        function: GlobalFn::Message,
    },
    GlobalSpec {
        name: "buf_cnt",
        arity: Arity::Exact(0),
        function: GlobalFn::BufferCount,
    },
    GlobalSpec {
        name: "buf_nr",
        arity: Arity::Exact(1),
        function: GlobalFn::BufferByNumber,
    },
];

fn call(
    bridge: &Bridge,
    spec: &GlobalSpec,
    args: &mut [&mut Dynamic],
) -> Result<Dynamic, BridgeError> {
    check_arity(spec.name, spec.arity, args.len())?;
    match spec.function {
        GlobalFn::System => {
            let command = string_arg(&*args[0], 1, spec.name)?;
            bridge.system(&command)?;
            Ok(Dynamic::UNIT)
        }
        GlobalFn::Message => {
            let parts: Vec<String> = args.iter().map(|v| stringify(bridge, v)).collect();
            bridge.message(&parts);
            Ok(Dynamic::UNIT)
        }
        GlobalFn::BufferCount => Ok(Dynamic::from(bridge.buffer_count())),
        GlobalFn::BufferByNumber => {
            let number = int_arg(&*args[0], 1, spec.name)
                .map_err(|_| BridgeError::invalid_args(spec.name, "can't convert buffer number"))?;
            Ok(Dynamic::from(bridge.buffer_by_number(number)?))
        }
    }
}

/// Install the global function table. `taken` lists names already defined
/// in the namespace; a global may not shadow them.
pub fn install(
    module: &mut Module,
    bridge: &Rc<Bridge>,
    taken: &[&str],
) -> Result<(), String> {
    let mut seen: HashSet<&str> = taken.iter().copied().collect();
    for spec in GLOBAL_FUNCTIONS {
        if !seen.insert(spec.name) {
            return Err(format!("`{}` is already defined", spec.name));
        }
    }

    for spec in GLOBAL_FUNCTIONS {
        let bridge = Rc::clone(bridge);
        set_bridge_fn(module, spec.name, move |args| call(&bridge, spec, args));
    }
    Ok(())
}
