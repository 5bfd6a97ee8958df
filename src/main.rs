use std::path::PathBuf;

use anyhow::{Context, bail};

use opusplay::{PlayerConfig, player};

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let mut path: Option<PathBuf> = None;
    let mut direct = false;
    for arg in std::env::args().skip(1) {
        if arg == "--direct" {
            direct = true;
        } else if path.is_none() {
            path = Some(PathBuf::from(arg));
        } else {
            bail!("unexpected argument: {arg}");
        }
    }
    let Some(path) = path else {
        bail!("usage: opusplay <file.opus> [--direct]");
    };

    let config = PlayerConfig::default();

    let stats = if direct {
        player::play_path(&path, &config)
            .with_context(|| format!("failed to play {}", path.display()))?
    } else {
        let data = std::fs::read(&path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        player::play_bytes(data, &config)
            .with_context(|| format!("failed to play {}", path.display()))?
    };

    log::info!(
        "playback finished: {} blocks, {} frames",
        stats.submissions,
        stats.frames
    );
    Ok(())
}
