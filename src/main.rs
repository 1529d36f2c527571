use anyhow::{Context, Result};
use argh::FromArgs;
use env_logger::Env;
use inter::source::EditorSource;
use inter::{Console, Environment, Registry, Session};
use std::path::PathBuf;

#[derive(FromArgs)]
/// Line-oriented command interpreter. Runs SCRIPT if given, otherwise reads commands
/// from the terminal.
struct Args {
    #[argh(positional)]
    /// script to run; its first line must be `#iNTER`.
    script: Option<PathBuf>,

    #[argh(option)]
    /// append the session log to this file instead of $INTER_LOG or ./Log.txt.
    log: Option<PathBuf>,

    #[argh(switch)]
    /// do not write a session log.
    no_log: bool,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("warn")).init();
    let args: Args = argh::from_env();

    let mut env = Environment::new();
    if args.no_log {
        env = env.with_log_path(None);
    } else if args.log.is_some() {
        env = env.with_log_path(args.log);
    }

    let interactive = args.script.is_none();
    let console = Console::stdout().with_prompt(!interactive);
    let session = Session::new(Registry::with_builtins(), env, console);

    let code = match args.script {
        Some(script) => session.execute_script(&script).unwrap_or(1),
        None => {
            let mut editor = EditorSource::new(">").context("can't start the line editor")?;
            session.interpret(&mut editor)
        }
    };
    std::process::exit(code)
}
