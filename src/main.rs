//! Binary entry point for the stagehand CLI.

use std::io::{self, Write};
use std::process;

use camino::{Utf8Path, Utf8PathBuf};
use cap_std::{ambient_authority, fs_utf8::Dir};
use clap::Parser;
use thiserror::Error;
use tracing::info;
use tracing_subscriber::EnvFilter;

use stagehand::{
    ConfigError, JsonInstanceStore, PipelineConfig, ScriptComposer, ScriptError, Stage, StoreError,
};

mod cli;

use cli::{Cli, StageArgs};

#[derive(Debug, Error)]
enum CliError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("instance store error: {0}")]
    Store(#[from] StoreError),
    #[error("script generation failed: {0}")]
    Script(#[from] ScriptError),
    #[error("failed to write {path}: {message}")]
    Io { path: Utf8PathBuf, message: String },
}

fn main() {
    init_tracing();
    let cli = Cli::parse();
    let exit_code = match dispatch(cli) {
        Ok(()) => 0,
        Err(err) => {
            report_error(&err);
            1
        }
    };

    process::exit(exit_code);
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init()
        .ok();
}

fn dispatch(cli: Cli) -> Result<(), CliError> {
    let (stage, args) = match cli {
        Cli::PrepareHost(args) => (Stage::PrepareHost, args),
        Cli::StartInstance(args) => (Stage::StartInstance, args),
        Cli::MonitorStartup(args) => (Stage::MonitorStartup, args),
    };
    let config = PipelineConfig::load_without_cli_args()?;
    generate(stage, &args, apply_overrides(config, &args))
}

fn apply_overrides(mut config: PipelineConfig, args: &StageArgs) -> PipelineConfig {
    if let Some(instance) = &args.instance {
        config.instance_uuid.clone_from(instance);
    }
    if let Some(store) = &args.store {
        config.store_path.clone_from(store);
    }
    if let Some(build_dir) = &args.build_dir {
        config.build_dir.clone_from(build_dir);
    }
    config
}

fn generate(stage: Stage, args: &StageArgs, config: PipelineConfig) -> Result<(), CliError> {
    config.validate()?;
    let store = JsonInstanceStore::from_file(&config.store_path())?;
    let composer = ScriptComposer::new(&store, config.change_flags(), config.artifacts_root());
    info!(%stage, flags = ?composer.flags(), "generating script");
    let script = composer.compose(stage, config.instance_uuid.trim())?.render();

    if args.stdout {
        let mut stdout = io::stdout();
        return stdout
            .write_all(script.as_bytes())
            .map_err(|err| CliError::Io {
                path: Utf8PathBuf::from("<stdout>"),
                message: err.to_string(),
            });
    }

    let path = persist_script(&config.build_dir(), config.script_name(stage).trim(), &script)?;
    info!(%stage, %path, "saved script");
    Ok(())
}

/// Writes `script` into `dir` and marks it executable.
fn persist_script(dir: &Utf8Path, file_name: &str, script: &str) -> Result<Utf8PathBuf, CliError> {
    let path = dir.join(file_name);
    let io_error = |target: &Utf8Path, err: io::Error| CliError::Io {
        path: target.to_path_buf(),
        message: err.to_string(),
    };

    Dir::create_ambient_dir_all(dir, ambient_authority()).map_err(|err| io_error(dir, err))?;
    let build = Dir::open_ambient_dir(dir, ambient_authority()).map_err(|err| io_error(dir, err))?;
    build
        .write(file_name, script)
        .map_err(|err| io_error(&path, err))?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;

        let executable = cap_std::fs::Permissions::from_std(std::fs::Permissions::from_mode(0o755));
        build
            .set_permissions(file_name, executable)
            .map_err(|err| io_error(&path, err))?;
    }

    Ok(path)
}

fn report_error(err: &CliError) {
    write_error(io::stderr(), err);
}

fn write_error(mut target: impl Write, err: &CliError) {
    writeln!(target, "{err}").ok();
}
