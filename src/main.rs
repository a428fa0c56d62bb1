use std::env;
use std::path::PathBuf;
use std::process::ExitCode;

use tracing_subscriber::EnvFilter;

use bufbridge::config;
use bufbridge::editor::{BufferList, Host};
use bufbridge::scripting::ScriptEnv;

const USAGE: &str = "usage: bufbridge [--config FILE] [--compile-only] SCRIPT [FILE...]";

struct Args {
    config: Option<PathBuf>,
    compile_only: bool,
    script: PathBuf,
    files: Vec<PathBuf>,
}

fn parse_args() -> Result<Args, String> {
    let mut config = None;
    let mut compile_only = false;
    let mut positional = Vec::new();

    let mut args = env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--config" => {
                let path = args.next().ok_or("--config needs a file")?;
                config = Some(PathBuf::from(path));
            }
            "--compile-only" => compile_only = true,
            "-h" | "--help" => return Err(USAGE.to_string()),
            _ => positional.push(PathBuf::from(arg)),
        }
    }

    if positional.is_empty() {
        return Err(USAGE.to_string());
    }
    let script = positional.remove(0);
    Ok(Args {
        config,
        compile_only,
        script,
        files: positional,
    })
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = match parse_args() {
        Ok(args) => args,
        Err(msg) => {
            eprintln!("{}", msg);
            return ExitCode::FAILURE;
        }
    };

    let settings = match &args.config {
        Some(path) => config::load(path),
        None => config::load_default(),
    };
    let mut settings = match settings {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("{}", e);
            return ExitCode::FAILURE;
        }
    };
    settings.compile_only |= args.compile_only;

    // Open buffers
    let mut buffers = BufferList::new();
    for path in &args.files {
        match buffers.open(path) {
            Ok(id) => {
                if let Some(buffer) = buffers.get_mut(id) {
                    buffer.open_window();
                }
            }
            Err(e) => {
                eprintln!("{}: {}", path.display(), e);
                return ExitCode::FAILURE;
            }
        }
    }

    let mut env = match ScriptEnv::init(settings, Host::terminal(buffers)) {
        Ok(env) => env,
        Err(e) => {
            eprintln!("{}", e);
            return ExitCode::FAILURE;
        }
    };

    // Errors were already shown through the message sink
    let result = env
        .load_default()
        .and_then(|()| env.execute_file(&args.script));
    env.teardown();

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(_) => ExitCode::FAILURE,
    }
}
