use std::path::Path;

use smig_worker::MigrationConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    ensure_env_present(&["LIBRARYIDPROD", "ACCESSKEYPROD"])?;
    let config = MigrationConfig::from_env(true)?;

    println!(
        "smig-selfcheck: starting with root_dir={} output_dir={} workers={}",
        config.scan.root_dir.display(),
        config.worker.output_dir.display(),
        config.worker.max_workers
    );
    ensure_root_dir(&config.scan.root_dir).await?;
    ensure_output_dir(&config.worker.output_dir).await?;

    println!("smig-selfcheck: ok");
    Ok(())
}

async fn ensure_root_dir<P: AsRef<Path>>(path: P) -> anyhow::Result<()> {
    let path = path.as_ref();
    let meta = tokio::fs::metadata(path)
        .await
        .map_err(|e| anyhow::anyhow!("root dir {} not readable: {}", path.display(), e))?;

    if !meta.is_dir() {
        return Err(anyhow::anyhow!("root dir {} is not a directory", path.display()));
    }
    Ok(())
}

async fn ensure_output_dir<P: AsRef<Path>>(path: P) -> anyhow::Result<()> {
    let path = path.as_ref();
    tokio::fs::create_dir_all(path).await?;
    Ok(())
}

fn ensure_env_present(vars: &[&str]) -> anyhow::Result<()> {
    for var in vars {
        if std::env::var(var).is_err() {
            return Err(anyhow::anyhow!("missing required env var {}", var));
        }
    }
    Ok(())
}
