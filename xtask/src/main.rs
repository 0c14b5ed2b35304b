use std::{
    fs,
    io::BufReader,
    process::{Command, Stdio},
    thread,
};

use anyhow::{Context, anyhow};
use camino::Utf8PathBuf;
use cargo_metadata::Message;
use clap::Parser;

const DLL_PACKAGE: &str = "browser-plus-dll";
const DLL_TARGET_NAME: &str = "version";

/// Rust target triple and the suffix of its output file.
const TARGETS: [(&str, &str); 3] = [
    ("x86_64-pc-windows-msvc", "x64"),
    ("i686-pc-windows-msvc", "x86"),
    ("aarch64-pc-windows-msvc", "aarch64"),
];

#[derive(Parser, Clone, Copy)]
enum Action {
    #[command(about = "Build version.dll proxies for every architecture")]
    BuildDll,
}

fn main() -> anyhow::Result<()> {
    match Action::parse() {
        Action::BuildDll => build_dlls()?,
    }

    Ok(())
}

fn build_dlls() -> anyhow::Result<()> {
    let results = thread::scope(|scope| {
        let tasks = TARGETS.map(|(target, _)| {
            scope.spawn(move || cargo_artifact(DLL_PACKAGE, DLL_TARGET_NAME, target))
        });

        tasks.map(|task| task.join())
    });

    for ((target, suffix), result) in TARGETS.into_iter().zip(results) {
        let path = result
            .map_err(|_| anyhow!("{target} build panicked"))??
            .with_context(|| format!("{target} build has no output"))?;

        fs::copy(&path, format!("./version-{suffix}.dll"))
            .with_context(|| format!("cannot copy {path}"))?;
    }

    Ok(())
}

fn cargo_artifact(
    package: &str,
    target_name: &str,
    target: &str,
) -> anyhow::Result<Option<Utf8PathBuf>> {
    let mut command = Command::new("cargo")
        .args([
            "build",
            "--release",
            "-p",
            package,
            "--message-format=json-render-diagnostics",
            &format!("--target={target}"),
        ])
        .stdout(Stdio::piped())
        .spawn()
        .context("cannot spawn cargo")?;

    let mut dll = None;

    let stdout = command.stdout.take().context("cargo stdout unavailable")?;
    for message in Message::parse_stream(BufReader::new(stdout)) {
        if let Message::CompilerArtifact(artifact) = message? {
            if artifact.target.name != target_name {
                continue;
            }

            if dll.is_none() {
                dll = artifact
                    .filenames
                    .iter()
                    .find(|path| path.extension() == Some("dll"))
                    .cloned();
            }
        }
    }

    let status = command.wait()?;
    if !status.success() {
        return Err(anyhow!("cargo exited with {status}"));
    }

    Ok(dll)
}
