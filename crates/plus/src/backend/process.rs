use std::{env, process::Command};

use anyhow::Context;
use browser_plus_common::{
    cmdline::{self, PortableOptions},
    config::PortableConfig,
};
use tracing::debug;

/// Arguments of the current process, executable path first.
pub fn args() -> Vec<String> {
    env::args_os()
        .map(|arg| arg.to_string_lossy().into_owned())
        .collect()
}

/// Start the executable again with the portable arguments. The caller exits afterwards.
#[tracing::instrument(skip(args))]
pub fn relaunch_portable(args: &[String], config: &PortableConfig) -> anyhow::Result<()> {
    let exe = env::current_exe().context("cannot locate executable")?;
    let app_dir = exe
        .parent()
        .context("executable has no parent directory")?
        .to_string_lossy()
        .into_owned();

    let options = PortableOptions::from_config(config, &app_dir);
    let augmented = cmdline::augment(args, &options);
    debug!("relaunching with {augmented:?}");

    Command::new(&exe)
        .args(augmented.iter().skip(1))
        .spawn()
        .context("portable relaunch failed")?;

    Ok(())
}
