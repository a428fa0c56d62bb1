//! The script environment
//!
//! Owns one Rhai engine, its top-level scope (the execution context) and the
//! bridge into the editor. Everything is built in [`ScriptEnv::init`]; if a
//! step fails, whatever was built so far is dropped before the error returns.

use std::cell::Cell;
use std::fs;
use std::path::Path;
use std::rc::Rc;

use rhai::packages::{CorePackage, Package, StandardPackage};
use rhai::{Dynamic, Engine, Module, Scope};

use super::api::{self, buffer::BUFFER_CLASS};
use super::bridge::Bridge;
use super::diagnostics::DiagnosticsRelay;
use super::error::{InitError, ScriptError};
use crate::config::{self, BridgeSettings};
use crate::editor::Host;

thread_local! {
    static LIVE: Cell<bool> = const { Cell::new(false) };
}

/// Marks the thread's environment slot as taken until dropped
struct LiveGuard;

impl LiveGuard {
    fn acquire() -> Result<Self, InitError> {
        LIVE.with(|live| {
            if live.replace(true) {
                Err(InitError::AlreadyInitialized)
            } else {
                Ok(LiveGuard)
            }
        })
    }
}

impl Drop for LiveGuard {
    fn drop(&mut self) {
        LIVE.with(|live| live.set(false));
    }
}

/// The scripting environment for one editor session
pub struct ScriptEnv {
    // Fields drop in order: the scope (and any proxies in it) goes before
    // the engine.
    scope: Scope<'static>,
    engine: Engine,
    bridge: Rc<Bridge>,
    relay: DiagnosticsRelay,
    settings: BridgeSettings,
    _live: LiveGuard,
}

impl ScriptEnv {
    /// Build the environment. Only one may be live per thread.
    pub fn init(settings: BridgeSettings, host: Host) -> Result<Self, InitError> {
        let live = LiveGuard::acquire()?;
        let relay = DiagnosticsRelay::new(Rc::clone(&host.messages));
        let bridge = Rc::new(Bridge::new(host));

        let mut engine = Self::create_engine(&settings)?;
        let scope = Self::create_context(&mut engine, &settings, &relay)?;
        let mut global = Self::create_global(&bridge)?;
        Self::install_stdlib(&mut engine, &settings)?;
        Self::install_bridge(&mut engine, &mut global, &bridge)?;
        engine.register_global_module(global.into());

        tracing::info!(
            memory_budget = settings.memory_budget,
            stack_budget = settings.stack_budget,
            stdlib = %settings.stdlib,
            "script environment ready"
        );

        Ok(Self {
            scope,
            engine,
            bridge,
            relay,
            settings,
            _live: live,
        })
    }

    /// Raw engine with the memory ceiling applied
    fn create_engine(settings: &BridgeSettings) -> Result<Engine, InitError> {
        let cells = settings.memory_budget / std::mem::size_of::<Dynamic>();
        if cells == 0 {
            return Err(InitError::EngineAlloc(format!(
                "memory budget of {} bytes holds no values",
                settings.memory_budget
            )));
        }

        let mut engine = Engine::new_raw();
        engine.set_max_string_size(settings.memory_budget);
        engine.set_max_array_size(cells);
        engine.set_max_map_size(cells);
        engine.set_max_operations(settings.max_operations);
        Ok(engine)
    }

    /// Stack limits, output hooks and the top-level scope
    fn create_context(
        engine: &mut Engine,
        settings: &BridgeSettings,
        relay: &DiagnosticsRelay,
    ) -> Result<Scope<'static>, InitError> {
        let levels = settings.max_call_levels();
        if levels == 0 {
            return Err(InitError::ContextAlloc(format!(
                "stack budget of {} bytes holds no call frames",
                settings.stack_budget
            )));
        }
        engine.set_max_call_levels(levels);
        engine.set_max_expr_depths(levels, levels);

        {
            let relay = relay.clone();
            engine.on_print(move |text| relay.print(text));
        }
        {
            let relay = relay.clone();
            engine.on_debug(move |text, _source, _pos| relay.print(text));
        }

        Ok(Scope::new())
    }

    /// The global namespace, holding the proxy class methods
    fn create_global(bridge: &Rc<Bridge>) -> Result<Module, InitError> {
        let mut global = Module::new();
        api::buffer::install_methods(&mut global, bridge).map_err(InitError::GlobalAlloc)?;
        Ok(global)
    }

    fn install_stdlib(engine: &mut Engine, settings: &BridgeSettings) -> Result<(), InitError> {
        let package = match settings.stdlib.as_str() {
            "standard" => StandardPackage::new().as_shared_module(),
            "core" => CorePackage::new().as_shared_module(),
            other => {
                return Err(InitError::StdlibInstall(format!(
                    "unknown package `{}`",
                    other
                )));
            }
        };
        engine.register_global_module(package);
        Ok(())
    }

    fn install_bridge(
        engine: &mut Engine,
        global: &mut Module,
        bridge: &Rc<Bridge>,
    ) -> Result<(), InitError> {
        let taken: Vec<&str> = BUFFER_CLASS.method_names().collect();
        api::globals::install(global, bridge, &taken).map_err(InitError::BridgeInstall)?;
        api::buffer::register_type(engine, bridge);
        Ok(())
    }

    /// Compile and run a script file once.
    ///
    /// Failures are shown on the host's status line and also returned.
    pub fn execute_file(&mut self, path: &Path) -> Result<(), ScriptError> {
        let source = fs::read_to_string(path).map_err(|source| {
            let err = ScriptError::Read {
                path: path.to_path_buf(),
                source,
            };
            self.relay.report(&err);
            err
        })?;

        self.eval(&path.display().to_string(), &source)
    }

    /// Compile and run a script held in memory. `name` is used in error
    /// reports.
    pub fn eval(&mut self, name: &str, script: &str) -> Result<(), ScriptError> {
        let mut ast = self
            .engine
            .compile(script)
            .map_err(|e| self.relay.compile_error(name, &e))?;
        ast.set_source(name);

        if self.settings.compile_only {
            tracing::debug!(script = name, "compiled, not running");
            return Ok(());
        }

        self.engine
            .run_ast_with_scope(&mut self.scope, &ast)
            .map_err(|e| self.relay.runtime_error(name, *e))
    }

    /// Run the user init script if there is one
    pub fn load_default(&mut self) -> Result<(), ScriptError> {
        if let Some(init) = config::init_script() {
            if init.exists() {
                return self.execute_file(&init);
            }
        }
        Ok(()) // No init script is fine
    }

    /// Read a top-level script variable
    pub fn global<T: Clone + 'static>(&self, name: &str) -> Option<T> {
        self.scope.get_value(name)
    }

    pub fn bridge(&self) -> &Rc<Bridge> {
        &self.bridge
    }

    pub fn settings(&self) -> &BridgeSettings {
        &self.settings
    }

    /// Release the execution context, then the engine
    pub fn teardown(mut self) {
        self.scope.clear();
        tracing::info!(
            live_proxies = self.bridge.live_proxies(),
            "script environment torn down"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::editor::{Buffer, BufferList, MessageLog};
    use crate::scripting::bridge::tests::{FakeShell, three_buffers};
    use pretty_assertions::assert_eq;
    use std::cell::RefCell;
    use std::io::Write;

    struct Session {
        env: ScriptEnv,
        buffers: Rc<RefCell<BufferList>>,
        log: Rc<MessageLog>,
        shell: Rc<FakeShell>,
    }

    fn session_with(settings: BridgeSettings) -> Session {
        let buffers = Rc::new(RefCell::new(three_buffers()));
        let log = Rc::new(MessageLog::new());
        let shell = Rc::new(FakeShell::exiting(0));
        let host = Host::new(buffers.clone(), log.clone(), shell.clone());
        let env = ScriptEnv::init(settings, host).unwrap();
        Session {
            env,
            buffers,
            log,
            shell,
        }
    }

    fn session() -> Session {
        session_with(BridgeSettings::default())
    }

    fn host() -> Host {
        Host::new(
            Rc::new(RefCell::new(BufferList::new())),
            Rc::new(MessageLog::new()),
            Rc::new(FakeShell::exiting(0)),
        )
    }

    #[test]
    fn test_only_one_environment_per_thread() {
        let first = ScriptEnv::init(BridgeSettings::default(), host()).unwrap();
        assert!(matches!(
            ScriptEnv::init(BridgeSettings::default(), host()),
            Err(InitError::AlreadyInitialized)
        ));
        first.teardown();
        assert!(ScriptEnv::init(BridgeSettings::default(), host()).is_ok());
    }

    #[test]
    fn test_failed_init_releases_the_slot() {
        let settings = BridgeSettings {
            memory_budget: 0,
            ..BridgeSettings::default()
        };
        assert!(matches!(
            ScriptEnv::init(settings, host()),
            Err(InitError::EngineAlloc(_))
        ));
        assert!(ScriptEnv::init(BridgeSettings::default(), host()).is_ok());
    }

    #[test]
    fn test_init_reports_failing_stage() {
        let tiny_stack = BridgeSettings {
            stack_budget: 16,
            ..BridgeSettings::default()
        };
        assert!(matches!(
            ScriptEnv::init(tiny_stack, host()),
            Err(InitError::ContextAlloc(_))
        ));

        let bad_stdlib = BridgeSettings {
            stdlib: "everything".to_string(),
            ..BridgeSettings::default()
        };
        assert!(matches!(
            ScriptEnv::init(bad_stdlib, host()),
            Err(InitError::StdlibInstall(_))
        ));
    }

    #[test]
    fn test_core_stdlib_runs_bridge_calls() {
        let settings = BridgeSettings {
            stdlib: "core".to_string(),
            ..BridgeSettings::default()
        };
        let mut s = session_with(settings);
        s.env.eval("t", "let n = buf_cnt();").unwrap();
        assert_eq!(s.env.global::<i64>("n"), Some(3));
    }

    #[test]
    fn test_buf_cnt_counts_buffers() {
        let mut s = session();
        s.env.eval("t", "let n = buf_cnt();").unwrap();
        assert_eq!(s.env.global::<i64>("n"), Some(3));

        s.buffers.borrow_mut().add(Buffer::new());
        s.env.eval("t", "n = buf_cnt();").unwrap();
        assert_eq!(s.env.global::<i64>("n"), Some(4));
    }

    #[test]
    fn test_lookup_is_identity_preserving() {
        let mut s = session();
        s.env
            .eval(
                "t",
                r#"
                let a = buf_nr(2);
                let b = buf_nr(2);
                let same = a == b;
                let other = a != buf_nr(3);
                let via_prev = buf_nr(3).prev() == a;
            "#,
            )
            .unwrap();
        assert_eq!(s.env.global::<bool>("same"), Some(true));
        assert_eq!(s.env.global::<bool>("other"), Some(true));
        assert_eq!(s.env.global::<bool>("via_prev"), Some(true));
    }

    #[test]
    fn test_sibling_walk_scenario() {
        let mut s = session();
        s.env
            .eval(
                "t",
                r#"
                let two = buf_nr(2);
                let one = two.prev();
                let three = one.next().next();
                let past_end = three.next();
                let before_start = one.prev();

                let one_is_first = one == buf_nr(1);
                let three_number = three.number();
                let past_end_type = type_of(past_end);
                let before_start_type = type_of(before_start);
            "#,
            )
            .unwrap();
        assert_eq!(s.env.global::<bool>("one_is_first"), Some(true));
        assert_eq!(s.env.global::<i64>("three_number"), Some(3));
        assert_eq!(s.env.global::<String>("past_end_type").as_deref(), Some("()"));
        assert_eq!(s.env.global::<String>("before_start_type").as_deref(), Some("()"));
    }

    #[test]
    fn test_proxy_accessors() {
        let mut s = session();
        let first = s.buffers.borrow().first().unwrap();
        if let Some(b) = s.buffers.borrow_mut().get_mut(first) {
            b.open_window();
        }
        s.env
            .eval(
                "t",
                r#"
                let b = buf_nr(1);
                let kind = type_of(b);
                let ff = b.ffname();
                let sf = b.sfname();
                let f = b.fname();
                let windows = b.window_number();
                let second = b.line(2);
                let head = b.lines(1, 3);
            "#,
            )
            .unwrap();

        assert_eq!(s.env.global::<String>("kind").as_deref(), Some("Buffer"));
        assert_eq!(s.env.global::<String>("ff").as_deref(), Some("/home/me/one.txt"));
        assert_eq!(s.env.global::<String>("sf").as_deref(), Some("one.txt"));
        assert_eq!(s.env.global::<String>("f").as_deref(), Some("one.txt"));
        assert_eq!(s.env.global::<i64>("windows"), Some(1));
        assert_eq!(s.env.global::<String>("second").as_deref(), Some("beta"));

        let head: Vec<String> = s
            .env
            .global::<rhai::Array>("head")
            .unwrap()
            .into_iter()
            .map(|v| v.into_string().unwrap())
            .collect();
        assert_eq!(head, vec!["alpha", "beta", "gamma"]);
    }

    #[test]
    fn test_inverted_range_is_empty_not_an_error() {
        let mut s = session();
        s.env
            .eval("t", "let n = buf_nr(1).lines(5, 2).len();")
            .unwrap();
        assert_eq!(s.env.global::<i64>("n"), Some(0));
    }

    #[test]
    fn test_unbound_field_is_catchable_and_named() {
        let mut s = session();
        s.env
            .eval(
                "t",
                r#"
                let err = "";
                try { buf_nr(2).ffname(); } catch (e) { err = e; }
                let display = buf_nr(2).fname();
            "#,
            )
            .unwrap();
        assert_eq!(
            s.env.global::<String>("err").as_deref(),
            Some("buffer field 'ffname' is empty")
        );
        assert_eq!(s.env.global::<String>("display").as_deref(), Some("[Scratch]"));
    }

    #[test]
    fn test_missing_buffer_fails() {
        let mut s = session();
        s.env
            .eval(
                "t",
                r#"
                let err = "";
                try { buf_nr(99); } catch (e) { err = e; }
            "#,
            )
            .unwrap();
        assert_eq!(
            s.env.global::<String>("err").as_deref(),
            Some("no buffer with number 99")
        );

        let err = s.env.eval("lookup.rhai", "buf_nr(99);").unwrap_err();
        assert!(matches!(err, ScriptError::Runtime { line: 1, .. }));
        assert_eq!(
            s.log.last().as_deref(),
            Some("Script Error: lookup.rhai:1:no buffer with number 99")
        );
    }

    #[test]
    fn test_methods_reject_plain_receivers() {
        let mut s = session();
        let err = s.env.eval("t", "let x = 42; x.number();").unwrap_err();
        assert_eq!(err.message(), "number() called on something that is not a Buffer");
    }

    #[test]
    fn test_bad_arguments_are_reported() {
        let mut s = session();
        let err = s.env.eval("t", r#"buf_nr("two");"#).unwrap_err();
        assert_eq!(err.message(), "buf_nr(): can't convert buffer number");

        let err = s.env.eval("t", r#"buf_nr(1).line("x");"#).unwrap_err();
        assert_eq!(
            err.message(),
            "line(): argument 1 must be an integer, not string"
        );

        let err = s.env.eval("t", "system(5);").unwrap_err();
        assert_eq!(err.message(), "system(): argument 1 must be a string, not i64");
    }

    #[test]
    fn test_wrong_argument_counts_are_reported() {
        let mut s = session();
        let err = s.env.eval("t", "buf_nr();").unwrap_err();
        assert_eq!(err.message(), "buf_nr(): expected 1 argument, got 0");

        let err = s.env.eval("t", "buf_nr(1).line();").unwrap_err();
        assert_eq!(err.message(), "line(): expected 1 argument, got 0");

        let err = s.env.eval("t", "buf_nr(1).lines(1, 2, 3);").unwrap_err();
        assert_eq!(err.message(), "lines(): expected 2 arguments, got 3");

        let err = s.env.eval("t", "number();").unwrap_err();
        assert_eq!(err.message(), "number() called on something that is not a Buffer");

        s.env
            .eval(
                "t",
                r#"let caught = ""; try { system("a", "b"); } catch (e) { caught = e; }"#,
            )
            .unwrap();
        assert_eq!(
            s.env.global::<String>("caught").as_deref(),
            Some("system(): expected 1 argument, got 2")
        );
    }

    #[test]
    fn test_huge_line_ranges_stop_at_the_last_line() {
        let mut s = session();
        s.env
            .eval(
                "t",
                "let all = buf_nr(1).lines(1, 9223372036854775807); \
                 let many = buf_nr(1).lines(3, 50000000); \
                 let past = buf_nr(1).lines(100, 200);",
            )
            .unwrap();
        let len = |name: &str| s.env.global::<rhai::Array>(name).map(|a| a.len());
        assert_eq!(len("all"), Some(6));
        assert_eq!(len("many"), Some(4));
        assert_eq!(len("past"), Some(0));
    }

    #[test]
    fn test_message_describes_nested_proxies() {
        let mut s = session();
        s.env.eval("t", "message([buf_nr(1), 2]);").unwrap();
        assert_eq!(s.log.last().as_deref(), Some("[Buffer(1), 2]"));

        s.env.eval("t", "message(#{b: buf_nr(3)});").unwrap();
        assert_eq!(s.log.last().as_deref(), Some(r#"#{"b": Buffer(3)}"#));
    }

    #[test]
    fn test_message_joins_and_truncates() {
        let mut s = session();
        s.env
            .eval("t", r#"message("build", "failed\nretry");"#)
            .unwrap();
        assert_eq!(s.log.last().as_deref(), Some("build failed"));

        s.env.eval("t", "alert(1, true, buf_nr(3));").unwrap();
        assert_eq!(s.log.last().as_deref(), Some("1 true Buffer(3)"));
    }

    #[test]
    fn test_print_goes_to_status_line() {
        let mut s = session();
        s.env.eval("t", r#"print("hello\nthere");"#).unwrap();
        assert_eq!(s.log.last().as_deref(), Some("hello"));
    }

    #[test]
    fn test_proxies_interpolate() {
        let mut s = session();
        s.env.eval("t", "let text = `at ${buf_nr(2)}`;").unwrap();
        assert_eq!(s.env.global::<String>("text").as_deref(), Some("at Buffer(2)"));
    }

    #[test]
    fn test_system_failure_carries_status() {
        let mut s = session();
        s.shell.status.set(3);
        s.env
            .eval(
                "t",
                r#"
                let err = "";
                try { system("make"); } catch (e) { err = e; }
            "#,
            )
            .unwrap();
        assert_eq!(
            s.env.global::<String>("err").as_deref(),
            Some("command failed with exit code 3")
        );
        assert_eq!(*s.shell.commands.borrow(), vec!["make".to_string()]);
    }

    #[test]
    fn test_system_success_returns_unit() {
        let mut s = session();
        s.env
            .eval("t", r#"let r = type_of(system("true"));"#)
            .unwrap();
        assert_eq!(s.env.global::<String>("r").as_deref(), Some("()"));
    }

    #[test]
    fn test_closed_buffer_goes_stale() {
        let mut s = session();
        s.env.eval("t", "let b = buf_nr(2);").unwrap();

        let id = s.env.bridge().buffer_by_number(2).unwrap().buffer_id().unwrap();
        s.buffers.borrow_mut().remove(id);

        let err = s.env.eval("t", "b.number();").unwrap_err();
        assert_eq!(err.message(), "buffer was closed by the editor");
        s.env.eval("t", "let text = b.to_string();").unwrap();
        assert_eq!(
            s.env.global::<String>("text").as_deref(),
            Some("Buffer(<stale>)")
        );
    }

    #[test]
    fn test_top_level_variables_persist() {
        let mut s = session();
        s.env.eval("a", "let count = 1;").unwrap();
        s.env.eval("b", "count += 1;").unwrap();
        assert_eq!(s.env.global::<i64>("count"), Some(2));
    }

    #[test]
    fn test_compile_only_does_not_run() {
        let settings = BridgeSettings {
            compile_only: true,
            ..BridgeSettings::default()
        };
        let mut s = session_with(settings);
        s.env.eval("t", r#"message("ran");"#).unwrap();
        assert!(s.log.last().is_none());

        let err = s.env.eval("t", "let = ;").unwrap_err();
        assert!(matches!(err, ScriptError::Compile { .. }));
    }

    #[test]
    fn test_compile_error_is_relayed() {
        let mut s = session();
        let err = s.env.eval("bad.rhai", "let x = ;").unwrap_err();
        assert!(matches!(err, ScriptError::Compile { line: 1, .. }));
        assert!(s.log.last().unwrap().starts_with("Script Error: bad.rhai:1:"));
    }

    #[test]
    fn test_runaway_script_is_stopped() {
        let settings = BridgeSettings {
            max_operations: 1_000,
            ..BridgeSettings::default()
        };
        let mut s = session_with(settings);
        assert!(s.env.eval("t", "loop { }").is_err());
    }

    #[test]
    fn test_execute_file() {
        let mut s = session();
        let mut file = tempfile::Builder::new().suffix(".rhai").tempfile().unwrap();
        writeln!(file, "let first = buf_nr(1).line(1);").unwrap();
        writeln!(file, "message(first);").unwrap();

        s.env.execute_file(file.path()).unwrap();
        assert_eq!(s.log.last().as_deref(), Some("alpha"));
    }

    #[test]
    fn test_execute_missing_file() {
        let mut s = session();
        let err = s
            .env
            .execute_file(Path::new("/no/such/script.rhai"))
            .unwrap_err();
        assert!(matches!(err, ScriptError::Read { .. }));
        assert!(s.log.last().unwrap().starts_with("Script Error: failed to read script"));
    }
}
