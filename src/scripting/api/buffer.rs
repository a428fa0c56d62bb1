//! The `Buffer` proxy type
//!
//! Usage in Rhai:
//! ```rhai
//! let b = buf_nr(2);
//! message(b.number(), b.fname());
//! let head = b.lines(1, 10);
//! let before = b.prev();   // () at the start of the list
//! ```

use std::rc::Rc;

use rhai::{Dynamic, Engine, Module};

use super::{check_arity, int_arg, proxy_value, set_bridge_fn};
use crate::scripting::bridge::{Bridge, NameField, Sibling};
use crate::scripting::class::{Arity, MethodSpec, ProxyClass};
use crate::scripting::error::BridgeError;
use crate::scripting::proxy::{EntityKind, EntityProxy};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BufferMethod {
    Number,
    WindowCount,
    Name(NameField),
    Line,
    Lines,
    Sibling(Sibling),
}

pub static BUFFER_CLASS: ProxyClass<BufferMethod> = ProxyClass {
    kind: EntityKind::Buffer,
    methods: &[
        MethodSpec {
            name: "number",
            args: 0,
            method: BufferMethod::Number,
        },
        MethodSpec {
            name: "window_number",
            args: 0,
            method: BufferMethod::WindowCount,
        },
        MethodSpec {
            name: "ffname",
            args: 0,
            method: BufferMethod::Name(NameField::Full),
        },
        MethodSpec {
            name: "sfname",
            args: 0,
            method: BufferMethod::Name(NameField::Short),
        },
        MethodSpec {
            name: "fname",
            args: 0,
            method: BufferMethod::Name(NameField::Display),
        },
        MethodSpec {
            name: "line",
            args: 1,
            method: BufferMethod::Line,
        },
        MethodSpec {
            name: "lines",
            args: 2,
            method: BufferMethod::Lines,
        },
        MethodSpec {
            name: "next",
            args: 0,
            method: BufferMethod::Sibling(Sibling::Next),
        },
        MethodSpec {
            name: "prev",
            args: 0,
            method: BufferMethod::Sibling(Sibling::Prev),
        },
    ],
};

/// Run one buffer method. `args[0]` is the receiver.
fn call(
    bridge: &Bridge,
    spec: &MethodSpec<BufferMethod>,
    args: &mut [&mut Dynamic],
) -> Result<Dynamic, BridgeError> {
    let Some(receiver) = args.first() else {
        return Err(BridgeError::NotABoundProxy {
            method: spec.name,
            class: BUFFER_CLASS.name(),
        });
    };
    let proxy = bridge.receiver(receiver, EntityKind::Buffer, spec.name)?;
    check_arity(spec.name, Arity::Exact(spec.args), args.len() - 1)?;

    let value = match spec.method {
        BufferMethod::Number => Dynamic::from(bridge.number(&proxy)?),
        BufferMethod::WindowCount => Dynamic::from(bridge.window_count(&proxy)?),
        BufferMethod::Name(field) => Dynamic::from(bridge.name_field(&proxy, field)?),
        BufferMethod::Line => {
            let lnum = int_arg(&*args[1], 1, spec.name)?;
            Dynamic::from(bridge.line(&proxy, lnum)?)
        }
        BufferMethod::Lines => {
            let start = int_arg(&*args[1], 1, spec.name)?;
            let end = int_arg(&*args[2], 2, spec.name)?;
            let lines: rhai::Array = bridge
                .lines(&proxy, start, end)?
                .into_iter()
                .map(Dynamic::from)
                .collect();
            Dynamic::from_array(lines)
        }
        BufferMethod::Sibling(direction) => proxy_value(bridge.sibling(&proxy, direction)?),
    };
    Ok(value)
}

/// Add every `Buffer` method to the global namespace
pub fn install_methods(module: &mut Module, bridge: &Rc<Bridge>) -> Result<(), String> {
    BUFFER_CLASS.validate()?;

    for spec in BUFFER_CLASS.methods {
        let bridge = Rc::clone(bridge);
        set_bridge_fn(module, spec.name, move |args| call(&bridge, spec, args));
    }
    Ok(())
}

/// Register the proxy type itself: name, identity comparison and printing
pub fn register_type(engine: &mut Engine, bridge: &Rc<Bridge>) {
    engine.register_type_with_name::<EntityProxy>(BUFFER_CLASS.name());

    engine.register_fn("==", |a: &mut EntityProxy, b: EntityProxy| a.same(&b));
    engine.register_fn("!=", |a: &mut EntityProxy, b: EntityProxy| !a.same(&b));

    {
        let bridge = Rc::clone(bridge);
        engine.register_fn("to_string", move |p: &mut EntityProxy| bridge.describe(p));
    }
    {
        let bridge = Rc::clone(bridge);
        engine.register_fn("to_debug", move |p: &mut EntityProxy| bridge.describe(p));
    }
}
