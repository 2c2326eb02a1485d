#![allow(dead_code)]

//! Synthetic analysis engines: small `sh` scripts standing in for the real
//! engine binary.
//!
//! With [`crate::builders::Project::config`] the script receives the
//! workflow arguments directly, so `$1` is the engine script path and the
//! rest follow the workflow template.

use std::path::{Path, PathBuf};

/// Write an executable `#!/bin/sh` script named `name` into `dir`.
pub fn write_engine(dir: &Path, name: &str, body: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, format!("#!/bin/sh\n{body}\n")).expect("write engine script");

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let mut perms = std::fs::metadata(&path)
            .expect("engine metadata")
            .permissions();
        perms.set_mode(0o755);
        std::fs::set_permissions(&path, perms).expect("chmod engine");
    }

    path
}

/// Engine that appends every argument, one per line, to `record` and exits 0.
pub fn recording_engine(dir: &Path, record: &Path) -> PathBuf {
    write_engine(
        dir,
        "recording_engine.sh",
        &format!(
            "printf '%s\\n' \"$@\" >> '{}'\necho run >> '{}.runs'",
            record.display(),
            record.display()
        ),
    )
}

/// Engine for the analysis workflow that writes deterministic data files for
/// the RMSD, RGYR and SASA kinds of selection `A` (and pair `A`/`A`).
///
/// Argument positions: `$9` is the output directory.
pub fn analysis_engine(dir: &Path) -> PathBuf {
    write_engine(
        dir,
        "analysis_engine.sh",
        r#"out="$9"
echo "engine start"
printf '0 1.0\n1 1.5\n2 1.7\n' > "$out/RMSD_A.dat"
printf '0 10.0\n1 10.2\n2 10.1\n' > "$out/RGYR_A.dat"
printf '0 500\n1 510\n2 505\n' > "$out/SASA_A_A.dat"
echo "engine done""#,
    )
}

/// Engine that prints `1` through `n` on stdout.
pub fn counting_engine(dir: &Path, n: usize) -> PathBuf {
    write_engine(
        dir,
        "counting_engine.sh",
        &format!("i=1\nwhile [ $i -le {n} ]; do\n  echo $i\n  i=$((i+1))\ndone"),
    )
}

/// Engine that prints a few lines and exits with `code`.
pub fn failing_engine(dir: &Path, code: i32) -> PathBuf {
    write_engine(
        dir,
        "failing_engine.sh",
        &format!(
            "echo 'loading trajectory'\necho 'atom selection failed' >&2\necho 'ERROR: bad selection' >&2\nexit {code}"
        ),
    )
}

/// Engine that runs for a long time and exits promptly on SIGTERM.
pub fn sleeping_engine(dir: &Path) -> PathBuf {
    write_engine(
        dir,
        "sleeping_engine.sh",
        "trap 'exit 143' TERM\necho started\nwhile true; do sleep 0.05; done",
    )
}

/// Engine that ignores SIGTERM, so a cancel has to escalate to SIGKILL.
pub fn stubborn_engine(dir: &Path) -> PathBuf {
    write_engine(
        dir,
        "stubborn_engine.sh",
        "trap '' TERM\necho started\nwhile true; do sleep 0.05; done",
    )
}
