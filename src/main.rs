use anyhow::{bail, Context, Result};
use clap::Parser;
use std::io::Write;
use std::path::{Path, PathBuf};

use syndicate::config::SiteConfig;
use syndicate::content::{ContentProvider, JsonContentFile};
use syndicate::feed::{resolve_legacy, Assembler, FeedFormat, FeedRoute, FeedVariant};

/// Write `content` to `dst` via a temp file and rename, so a reader polling
/// the output directory never sees a half-written feed.
fn atomic_write(dst: &Path, content: &[u8]) -> Result<()> {
    // Unpredictable temp name plus create_new: never follows a planted symlink
    use std::time::{SystemTime, UNIX_EPOCH};
    let random_suffix = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or(0);
    let temp_path = dst.with_extension(format!("tmp.{:016x}", random_suffix));

    let mut temp_file = std::fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(&temp_path)
        .with_context(|| {
            format!(
                "Failed to create temporary file '{}': check directory permissions or disk space",
                temp_path.display()
            )
        })?;

    temp_file.write_all(content).with_context(|| {
        let _ = std::fs::remove_file(&temp_path);
        format!(
            "Failed to write to temporary file '{}': disk may be full",
            temp_path.display()
        )
    })?;

    temp_file.sync_all().with_context(|| {
        let _ = std::fs::remove_file(&temp_path);
        format!(
            "Failed to sync temporary file '{}' to disk",
            temp_path.display()
        )
    })?;
    drop(temp_file);

    // Windows rename does not replace an existing file
    #[cfg(windows)]
    if dst.exists() {
        std::fs::remove_file(dst).with_context(|| {
            let _ = std::fs::remove_file(&temp_path);
            format!("Failed to remove existing '{}' before replace", dst.display())
        })?;
    }

    std::fs::rename(&temp_path, dst).with_context(|| {
        let _ = std::fs::remove_file(&temp_path);
        format!(
            "Failed to rename '{}' to '{}': check permissions",
            temp_path.display(),
            dst.display()
        )
    })?;

    Ok(())
}

#[derive(Parser, Debug)]
#[command(
    name = "syndicate",
    about = "Render site content as RSS 2.0, Atom 1.0 and JSON Feed 1.1 documents"
)]
struct Args {
    /// Site configuration (TOML)
    #[arg(long, value_name = "FILE", default_value = "syndicate.toml")]
    config: PathBuf,

    /// Content file (JSON with `articles`, `projects` and `changelog` arrays)
    #[arg(long, value_name = "FILE", required_unless_present = "resolve")]
    content: Option<PathBuf>,

    /// Output directory; documents land under <DIR>/feeds/
    #[arg(long, value_name = "DIR", default_value = "dist")]
    out: PathBuf,

    /// Only build one variant (all, blog, projects, changelog, activity)
    #[arg(long)]
    variant: Option<FeedVariant>,

    /// Only build one format (rss, atom, json)
    #[arg(long)]
    format: Option<FeedFormat>,

    /// Print the canonical path for a deprecated feed path and exit
    #[arg(long, value_name = "PATH", conflicts_with_all = ["variant", "format"])]
    resolve: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args = Args::parse();

    if let Some(path) = &args.resolve {
        match resolve_legacy(path) {
            Some(canonical) => {
                println!("{canonical}");
                return Ok(());
            }
            None => bail!("'{path}' is not a known legacy feed path"),
        }
    }

    let content_path = args
        .content
        .as_deref()
        .context("--content is required")?;

    let site = SiteConfig::load(&args.config)
        .with_context(|| format!("Failed to load config '{}'", args.config.display()))?;
    let assembler = Assembler::new(site).with_context(|| {
        format!(
            "Invalid site configuration in '{}'",
            args.config.display()
        )
    })?;

    let entities = JsonContentFile::new(content_path)
        .entities()
        .with_context(|| format!("Failed to load content '{}'", content_path.display()))?;

    let feeds_dir = args.out.join("feeds");
    std::fs::create_dir_all(&feeds_dir)
        .with_context(|| format!("Failed to create output directory '{}'", feeds_dir.display()))?;

    let variants = match args.variant {
        Some(variant) => vec![variant],
        None => FeedVariant::ALL.to_vec(),
    };

    let mut written = 0usize;
    let mut failed = 0usize;

    for variant in variants {
        let documents = match args.format {
            Some(format) => {
                let route = FeedRoute::new(variant, format);
                vec![(route, assembler.assemble(route, &entities, None).await)]
            }
            None => assembler.assemble_all(variant, &entities, None).await,
        };

        for (route, document) in documents {
            let document = match document {
                Ok(document) => document,
                Err(e) => {
                    tracing::error!(route = %route, error = %e, "Feed generation failed");
                    eprintln!("Error: {route}: {e}");
                    failed += 1;
                    continue;
                }
            };

            let path = args.out.join(route.path().trim_start_matches('/'));
            atomic_write(&path, &document.body)?;
            tracing::info!(
                route = %route,
                bytes = document.body.len(),
                etag = %document.etag,
                "Wrote feed"
            );
            println!("Wrote {} ({} bytes)", path.display(), document.body.len());
            written += 1;
        }
    }

    if failed > 0 {
        bail!("{written} feeds written, {failed} failed");
    }

    println!("{written} feeds written to {}", feeds_dir.display());
    Ok(())
}
